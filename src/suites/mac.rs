//! MAC address table tests: clearing, learning, aging, static filtering,
//! port security and change notification.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::api::SwitchApi;
use crate::config::TestSettings;
use crate::error::{Error, Result};
use crate::report::TestResult;

use super::outcome;

static MAC_ENTRY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^\s*(\d+)\s+([0-9a-f]{4}\.[0-9a-f]{4}\.[0-9a-f]{4})\s+(\S+)\s+(\S+)").unwrap()
});

/// One row of `show mac address-table` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacEntry {
    pub vlan: String,
    pub address: String,
    pub kind: String,
    pub port: String,
}

pub fn parse_mac_table(output: &str) -> Vec<MacEntry> {
    MAC_ENTRY_RE
        .captures_iter(output)
        .map(|caps| MacEntry {
            vlan: caps[1].to_string(),
            address: caps[2].to_lowercase(),
            kind: caps[3].to_lowercase(),
            port: caps[4].to_string(),
        })
        .collect()
}

pub async fn run(api: &mut SwitchApi, settings: &TestSettings) -> Vec<TestResult> {
    let mut results = Vec::new();
    results.push(outcome("mac_table_clear", table_clear(api).await));
    results.push(outcome("mac_learning", learning(api, settings).await));
    results.push(outcome("mac_aging", aging(api, settings).await));
    results.push(outcome("mac_notification", notification(api).await));
    results.push(outcome("mac_filtering", filtering(api, settings).await));
    results.push(outcome("mac_port_security", port_security(api, settings).await));
    results
}

async fn table_clear(api: &mut SwitchApi) -> Result<()> {
    api.clear_mac_table().await?;
    let entries = parse_mac_table(&api.get_mac_table().await?);
    if entries.iter().any(|e| e.kind == "dynamic") {
        return Err(Error::Verification(
            "dynamic MAC entries remain after clearing".to_string(),
        ));
    }
    Ok(())
}

async fn learning(api: &mut SwitchApi, settings: &TestSettings) -> Result<()> {
    let port = settings.mac.port.clone();
    let vlan_id: u16 = settings
        .mac
        .vlan
        .parse()
        .map_err(|_| Error::Verification(format!("invalid MAC test VLAN: {}", settings.mac.vlan)))?;
    api.create_vlan(vlan_id, Some("mac_learning_test")).await?;
    api.configure_mac_learning_port(&port, vlan_id).await?;

    // The configured address is learned once the attached host sends a frame.
    if !api.mac_address_present(&settings.mac.mac_address, &settings.mac.vlan).await? {
        return Err(Error::Verification(format!(
            "MAC {} not learned on VLAN {}",
            settings.mac.mac_address, settings.mac.vlan
        )));
    }
    Ok(())
}

async fn aging(api: &mut SwitchApi, settings: &TestSettings) -> Result<()> {
    let seconds = settings.mac.aging_time;
    api.configure_mac_aging(seconds).await?;
    api.verify_mac_aging(seconds).await
}

async fn filtering(api: &mut SwitchApi, settings: &TestSettings) -> Result<()> {
    let mac = settings.mac.mac_address.clone();
    let vlan = settings.mac.vlan.clone();
    api.configure_mac_filtering(&mac, &vlan).await?;
    api.verify_mac_filtering(&mac, &vlan).await
}

async fn port_security(api: &mut SwitchApi, settings: &TestSettings) -> Result<()> {
    let port = settings.mac.port.clone();
    api.configure_port_security(&port).await?;
    api.verify_port_security(&port).await
}

async fn notification(api: &mut SwitchApi) -> Result<()> {
    api.enable_mac_notification().await?;
    api.verify_mac_notification().await
}
