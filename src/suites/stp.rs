//! Spanning-tree tests: protocol mode, root bridge priority, port cost and
//! priority, and guard features.

use crate::api::{StpGuard, StpMode, SwitchApi};
use crate::config::TestSettings;
use crate::error::{Error, Result};
use crate::report::TestResult;

use super::outcome;

pub async fn run(api: &mut SwitchApi, settings: &TestSettings) -> Vec<TestResult> {
    let mut results = Vec::new();
    results.push(outcome("stp_mode", mode(api, settings).await));
    results.push(outcome("stp_root_bridge", root_bridge(api, settings).await));
    results.push(outcome("stp_port_cost", port_cost(api, settings).await));
    results.push(outcome("stp_port_priority", port_priority(api, settings).await));
    results.push(outcome("stp_guard", guard(api, settings).await));
    results
}

async fn mode(api: &mut SwitchApi, settings: &TestSettings) -> Result<()> {
    let mode = StpMode::parse(&settings.stp.mode)?;
    api.configure_stp_mode(mode).await?;
    api.verify_stp_mode(mode).await
}

async fn root_bridge(api: &mut SwitchApi, settings: &TestSettings) -> Result<()> {
    let vlan = settings.stp.vlan.clone();
    let priority = settings.stp.priority.clone();
    api.configure_root_bridge(&vlan).await?;
    api.verify_root_bridge(&vlan, &priority).await
}

async fn port_cost(api: &mut SwitchApi, settings: &TestSettings) -> Result<()> {
    let port = settings.stp.port.clone();
    let vlan = settings.stp.vlan.clone();
    let cost = settings.stp.cost.clone();
    api.configure_port_cost(&port, &vlan, &cost).await?;

    let output = api.send_command(&format!("show spanning-tree vlan {vlan}")).await?;
    if !output.contains(&cost) {
        return Err(Error::Verification(format!(
            "cost {cost} not visible for VLAN {vlan}"
        )));
    }
    Ok(())
}

async fn port_priority(api: &mut SwitchApi, settings: &TestSettings) -> Result<()> {
    let port = settings.stp.port.clone();
    let vlan = settings.stp.vlan.clone();
    let priority = settings.stp.port_priority.clone();
    api.configure_port_priority(&port, &vlan, &priority).await?;

    let output = api.send_command(&format!("show spanning-tree vlan {vlan}")).await?;
    if !output.contains(&priority) {
        return Err(Error::Verification(format!(
            "port priority {priority} not visible for VLAN {vlan}"
        )));
    }
    Ok(())
}

async fn guard(api: &mut SwitchApi, settings: &TestSettings) -> Result<()> {
    let port = settings.stp.port.clone();
    let guard = StpGuard::parse(&settings.stp.guard_type)?;
    api.configure_stp_guard(&port, guard).await?;
    api.verify_stp_guard(&port, guard).await
}
