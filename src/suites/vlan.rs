//! VLAN feature tests: creation, deletion, port assignment, trunking and
//! SVI configuration.

use log::debug;

use crate::api::{PortMode, SwitchApi};
use crate::config::TestSettings;
use crate::error::{Error, Result};
use crate::report::TestResult;

use super::outcome;

/// One row of `show vlan brief` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VlanEntry {
    pub id: String,
    pub name: String,
    pub status: String,
    pub ports: String,
}

/// Parses `show vlan brief` output, skipping header and separator rows.
pub fn parse_vlan_brief(output: &str) -> Vec<VlanEntry> {
    output
        .lines()
        .filter(|line| {
            let line = line.trim_end();
            !line.is_empty() && !line.starts_with("VLAN") && !line.starts_with("----")
        })
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 2 {
                return None;
            }
            Some(VlanEntry {
                id: fields[0].to_string(),
                name: fields[1].to_string(),
                status: fields.get(2).copied().unwrap_or_default().to_string(),
                ports: fields.get(3..).map(|p| p.join(" ")).unwrap_or_default(),
            })
        })
        .collect()
}

fn vlan_exists(entries: &[VlanEntry], id: u16) -> bool {
    let id = id.to_string();
    entries.iter().any(|e| e.id == id)
}

/// Picks a scratch VLAN ID near `base` that stays inside the valid
/// 1..=4094 range and differs from `base`.
fn scratch_vlan_id(base: u16) -> u16 {
    if (1..4094).contains(&base) {
        base + 1
    } else {
        4093
    }
}

pub async fn run(api: &mut SwitchApi, settings: &TestSettings) -> Vec<TestResult> {
    let mut results = Vec::new();
    results.push(outcome("vlan_creation", creation(api, settings).await));
    results.push(outcome("vlan_deletion", deletion(api, settings).await));
    results.push(outcome("vlan_port_assignment", port_assignment(api, settings).await));
    results.push(outcome("vlan_trunk_configuration", trunk(api, settings).await));
    results.push(outcome("vlan_svi", svi(api, settings).await));
    results.push(outcome("vlan_voice", voice(api, settings).await));
    results.push(outcome("vlan_access_map", access_map(api, settings).await));
    results.push(outcome("vlan_private", private(api, settings).await));
    results
}

async fn creation(api: &mut SwitchApi, settings: &TestSettings) -> Result<()> {
    let id = settings.vlan.vlan_id;
    let name = &settings.vlan.vlan_name;
    api.create_vlan(id, Some(name)).await?;

    let entries = parse_vlan_brief(&api.show_vlans().await?);
    debug!("parsed {} VLAN rows", entries.len());
    if !vlan_exists(&entries, id) {
        return Err(Error::Verification(format!("VLAN {id} not listed after creation")));
    }
    if !entries.iter().any(|e| e.name == *name) {
        return Err(Error::Verification(format!("VLAN name {name} not listed after creation")));
    }
    Ok(())
}

async fn deletion(api: &mut SwitchApi, settings: &TestSettings) -> Result<()> {
    // A scratch VLAN near the configured one, so deleting it never
    // disturbs the VLAN the other tests use.
    let id = scratch_vlan_id(settings.vlan.vlan_id);
    api.create_vlan(id, Some("scratch_vlan")).await?;
    api.delete_vlan(id).await?;

    let entries = parse_vlan_brief(&api.show_vlans().await?);
    if vlan_exists(&entries, id) {
        return Err(Error::Verification(format!("VLAN {id} still listed after deletion")));
    }
    Ok(())
}

async fn port_assignment(api: &mut SwitchApi, settings: &TestSettings) -> Result<()> {
    let id = settings.vlan.vlan_id;
    let interface = settings.vlan.interface.clone();
    api.create_vlan(id, Some(&settings.vlan.vlan_name)).await?;
    api.assign_port_to_vlan(&interface, id, PortMode::Access).await?;

    let output = api
        .send_command(&format!("show running-config interface {interface}"))
        .await?;
    if !output.contains(&id.to_string()) {
        return Err(Error::Verification(format!(
            "VLAN {id} not present in {interface} configuration"
        )));
    }
    Ok(())
}

async fn trunk(api: &mut SwitchApi, settings: &TestSettings) -> Result<()> {
    let trunk_port = settings.vlan.trunk_port.clone();
    let native = settings.vlan.native_vlan.clone();
    let allowed = settings.vlan.allowed_vlans.clone();
    api.configure_trunk_port(&trunk_port, &native, &allowed).await
}

async fn svi(api: &mut SwitchApi, settings: &TestSettings) -> Result<()> {
    let vlan: u16 = settings
        .routing
        .svi_vlan
        .parse()
        .map_err(|_| Error::Verification(format!("invalid SVI VLAN: {}", settings.routing.svi_vlan)))?;
    let ip = settings.routing.svi_ip.clone();
    let mask = settings.routing.svi_mask.clone();
    api.create_vlan(vlan, Some("svi_test")).await?;
    api.configure_svi(vlan, &ip, &mask, Some("test SVI")).await?;
    api.verify_svi_configuration(vlan, Some(&ip), Some(&mask)).await
}

async fn voice(api: &mut SwitchApi, settings: &TestSettings) -> Result<()> {
    let voice_vlan = settings.vlan.voice_vlan;
    let data_vlan = settings.vlan.voice_data_vlan;
    let trust = settings.vlan.qos_trust.clone();
    let interface = settings.vlan.interface.clone();
    api.create_vlan(voice_vlan, Some("voice_test")).await?;
    api.create_vlan(data_vlan, Some("voice_data")).await?;
    api.configure_voice_vlan(&interface, voice_vlan, data_vlan, &trust).await?;
    api.verify_voice_vlan(&interface, voice_vlan, data_vlan, &trust).await
}

async fn access_map(api: &mut SwitchApi, settings: &TestSettings) -> Result<()> {
    let map = settings.vlan.access_map.clone();
    let acl = settings.vlan.access_map_acl.clone();
    let vlan = settings.vlan.access_map_vlan;
    api.create_vlan(vlan, Some("access_map_test")).await?;
    api.configure_vlan_access_map(&map, "10", "forward", &acl).await?;
    api.apply_vlan_access_map(vlan, &map).await
}

async fn private(api: &mut SwitchApi, settings: &TestSettings) -> Result<()> {
    let primary = settings.vlan.primary_vlan;
    let isolated = settings.vlan.isolated_vlan;
    let community = settings.vlan.community_vlan;
    api.configure_private_vlan(primary, isolated, community).await?;
    api.verify_private_vlan(primary, isolated, community).await
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHOW_VLAN: &str = "\
VLAN Name                             Status    Ports
---- -------------------------------- --------- -------------------------------
1    default                          active    Fa0/3, Fa0/4
10   LAB                              active    Fa0/1
100  test_vlan                        active
";

    #[test]
    fn parses_vlan_brief_rows() {
        let entries = parse_vlan_brief(SHOW_VLAN);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].id, "1");
        assert_eq!(entries[0].name, "default");
        assert_eq!(entries[0].status, "active");
        assert_eq!(entries[0].ports, "Fa0/3, Fa0/4");
        assert_eq!(entries[2].id, "100");
        assert_eq!(entries[2].ports, "");
    }

    #[test]
    fn scratch_vlan_id_stays_in_range() {
        assert_eq!(scratch_vlan_id(100), 101);
        assert_eq!(scratch_vlan_id(4093), 4094);
        // At or beyond the top of the range the scratch ID backs off
        // instead of overflowing or producing an invalid ID.
        assert_eq!(scratch_vlan_id(4094), 4093);
        assert_eq!(scratch_vlan_id(u16::MAX), 4093);
        assert_ne!(scratch_vlan_id(4094), 4094);
    }

    #[test]
    fn vlan_exists_checks_id_column() {
        let entries = parse_vlan_brief(SHOW_VLAN);
        assert!(vlan_exists(&entries, 10));
        assert!(!vlan_exists(&entries, 20));
        // "10" is a prefix of "100" but they are distinct IDs.
        assert!(vlan_exists(&entries, 100));
    }
}
