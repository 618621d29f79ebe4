//! L3 routing tests: interface addressing, static routes, OSPF, access
//! lists and SVI administrative state.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::api::SwitchApi;
use crate::config::TestSettings;
use crate::error::{Error, Result};
use crate::report::TestResult;

use super::outcome;

static ROUTE_ROW_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[A-Z]\S*\s+.*").unwrap());

/// One route from `show ip route` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub code: String,
    pub network: String,
    pub detail: String,
}

/// Parses routing-table rows, identified by their leading route code.
pub fn parse_routing_table(output: &str) -> Vec<RouteEntry> {
    ROUTE_ROW_RE
        .find_iter(output)
        .filter_map(|m| {
            let parts: Vec<&str> = m.as_str().split_whitespace().collect();
            if parts.len() < 2 || parts[0] == "Codes:" || parts[0] == "Gateway" {
                return None;
            }
            Some(RouteEntry {
                code: parts[0].to_string(),
                network: parts[1].to_string(),
                detail: parts[2..].join(" "),
            })
        })
        .collect()
}

pub async fn run(api: &mut SwitchApi, settings: &TestSettings) -> Vec<TestResult> {
    let mut results = Vec::new();
    results.push(outcome("routing_interface_ip", interface_ip(api, settings).await));
    results.push(outcome("routing_static_route", static_route(api, settings).await));
    results.push(outcome("routing_ospf", ospf(api, settings).await));
    results.push(outcome("routing_acl", acl(api, settings).await));
    results.push(outcome("routing_svi_state", svi_state(api, settings).await));
    results
}

async fn interface_ip(api: &mut SwitchApi, settings: &TestSettings) -> Result<()> {
    let interface = settings.routing.interface.clone();
    let ip = settings.routing.ip_address.clone();
    let mask = settings.routing.subnet_mask.clone();
    api.configure_interface_ip(&interface, &ip, &mask).await?;

    let output = api.show_ip_interface_brief().await?;
    if !output.contains(&ip) {
        return Err(Error::Verification(format!("{ip} not listed in interface summary")));
    }
    Ok(())
}

async fn static_route(api: &mut SwitchApi, settings: &TestSettings) -> Result<()> {
    let network = settings.routing.network.clone();
    let mask = settings.routing.network_mask.clone();
    let next_hop = settings.routing.next_hop.clone();
    api.add_static_route(&network, &mask, &next_hop).await?;

    let output = api.show_ip_route().await?;
    if !output.contains(&network) {
        return Err(Error::Verification(format!(
            "static route to {network} not present in routing table"
        )));
    }
    Ok(())
}

async fn ospf(api: &mut SwitchApi, settings: &TestSettings) -> Result<()> {
    let process = settings.routing.ospf_process.clone();
    api.configure_ospf(
        &process,
        &settings.routing.ospf_network,
        &settings.routing.ospf_wildcard,
        &settings.routing.ospf_area,
    )
    .await?;
    api.verify_ospf(&process).await
}

async fn acl(api: &mut SwitchApi, settings: &TestSettings) -> Result<()> {
    let name = settings.routing.acl_name.clone();
    api.create_acl(
        &name,
        &settings.routing.acl_sequence,
        &settings.routing.acl_action,
        &settings.routing.acl_protocol,
        &settings.routing.acl_source,
        &settings.routing.acl_wildcard,
        &settings.routing.acl_destination,
    )
    .await?;
    api.verify_acl(&name).await
}

async fn svi_state(api: &mut SwitchApi, settings: &TestSettings) -> Result<()> {
    let vlan: u16 = settings
        .routing
        .svi_vlan
        .parse()
        .map_err(|_| Error::Verification(format!("invalid SVI VLAN: {}", settings.routing.svi_vlan)))?;
    api.shutdown_svi(vlan).await?;
    api.no_shutdown_svi(vlan).await
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHOW_ROUTE: &str = "\
Codes: C - connected, S - static, O - OSPF
Gateway of last resort is not set

C    192.168.1.0/24 is directly connected, FastEthernet0/0
S    10.0.0.0/24 [1/0] via 192.168.1.2
";

    #[test]
    fn parses_route_rows() {
        let routes = parse_routing_table(SHOW_ROUTE);
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].code, "C");
        assert_eq!(routes[0].network, "192.168.1.0/24");
        assert_eq!(routes[1].code, "S");
        assert!(routes[1].detail.contains("via 192.168.1.2"));
    }

    #[test]
    fn skips_banner_lines() {
        let routes = parse_routing_table("Codes: C - connected\nGateway of last resort\n");
        assert!(routes.is_empty());
    }
}
