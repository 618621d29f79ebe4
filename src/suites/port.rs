//! Port tests: operational status, speed/duplex configuration and link
//! aggregation.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::api::SwitchApi;
use crate::config::TestSettings;
use crate::error::{Error, Result};
use crate::report::TestResult;

use super::outcome;

static PORT_ROW_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^(?:Fa|Gi)\S+.*").unwrap());

/// One row of `show interfaces status` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortEntry {
    pub port: String,
    pub name: String,
    pub status: String,
    pub vlan: String,
    pub duplex: String,
    pub speed: String,
}

/// Parses `show interfaces status` output. Columns are fixed-width on IOS,
/// so fields are cut by position rather than whitespace; a short name field
/// would otherwise shift everything after it.
pub fn parse_port_status(output: &str) -> Vec<PortEntry> {
    PORT_ROW_RE
        .find_iter(output)
        .filter_map(|m| {
            let line = m.as_str();
            if line.len() < 42 {
                return None;
            }
            Some(PortEntry {
                port: slice(line, 0, 10),
                name: slice(line, 10, 29),
                status: slice(line, 29, 42),
                vlan: slice(line, 42, 53),
                duplex: slice(line, 53, 61),
                speed: slice(line, 61, 67),
            })
        })
        .collect()
}

fn slice(line: &str, start: usize, end: usize) -> String {
    line.get(start..end.min(line.len()))
        .unwrap_or_default()
        .trim()
        .to_string()
}

fn find_port<'a>(entries: &'a [PortEntry], interface: &str) -> Option<&'a PortEntry> {
    entries.iter().find(|e| e.port == interface)
}

pub async fn run(api: &mut SwitchApi, settings: &TestSettings) -> Vec<TestResult> {
    let mut results = Vec::new();
    results.push(outcome("port_status", status(api, settings).await));
    results.push(outcome("port_configuration", configuration(api, settings).await));
    results.push(outcome("port_channel", channel(api, settings).await));
    results
}

async fn status(api: &mut SwitchApi, settings: &TestSettings) -> Result<()> {
    let interface = settings.port.interface.clone();
    let output = api.show_port_status(&interface).await?;
    let entries = parse_port_status(&output);
    let Some(entry) = find_port(&entries, &interface) else {
        return Err(Error::Verification(format!("{interface} not found in status output")));
    };
    if entry.status.to_lowercase() != "connected" {
        return Err(Error::Verification(format!(
            "{interface} is {} rather than connected",
            entry.status
        )));
    }
    Ok(())
}

async fn configuration(api: &mut SwitchApi, settings: &TestSettings) -> Result<()> {
    let interface = settings.port.interface.clone();
    let speed = settings.port.speed.clone();
    let duplex = settings.port.duplex.clone();
    api.configure_port(&interface, Some(&speed), Some(&duplex)).await?;

    let output = api.show_port_status(&interface).await?;
    let entries = parse_port_status(&output);
    let Some(entry) = find_port(&entries, &interface) else {
        return Err(Error::Verification(format!("{interface} not found in status output")));
    };
    // Speed may be reported with an `a-` prefix when auto-negotiated.
    if !entry.speed.contains(&speed) || !entry.duplex.contains(&duplex) {
        return Err(Error::Verification(format!(
            "{interface} reports speed {} duplex {}, expected {speed}/{duplex}",
            entry.speed, entry.duplex
        )));
    }
    Ok(())
}

async fn channel(api: &mut SwitchApi, settings: &TestSettings) -> Result<()> {
    let interface = settings.port.interface.clone();
    let group = settings.port.channel_group.clone();
    let mode = settings.port.channel_mode.clone();
    api.configure_port_channel(&interface, &group, &mode).await?;
    api.verify_port_channel(&group).await
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHOW_STATUS: &str = "\
Port      Name               Status       Vlan       Duplex  Speed Type
Fa0/1     Server1            connected    1            full   1000 10/100/1000BaseTX
Fa0/4                        notconnect   10           auto    auto 10/100BaseTX
Gi0/1     Uplink             connected    trunk      a-full  a-1000 10/100/1000BaseTX
";

    #[test]
    fn parses_fixed_width_rows() {
        let entries = parse_port_status(SHOW_STATUS);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].port, "Fa0/1");
        assert_eq!(entries[0].name, "Server1");
        assert_eq!(entries[0].status, "connected");
        assert_eq!(entries[0].vlan, "1");
        assert_eq!(entries[0].duplex, "full");
        assert_eq!(entries[0].speed, "1000");
        assert_eq!(entries[1].port, "Fa0/4");
        assert_eq!(entries[1].name, "");
        assert_eq!(entries[1].status, "notconnect");
    }

    #[test]
    fn skips_header_and_short_lines() {
        let entries = parse_port_status("Port  Name  Status\nFa0/9\n");
        assert!(entries.is_empty());
    }

    #[test]
    fn finds_exact_port() {
        let entries = parse_port_status(SHOW_STATUS);
        assert!(find_port(&entries, "Gi0/1").is_some());
        assert!(find_port(&entries, "Fa0/10").is_none());
    }
}
