//! High-level switch operations.
//!
//! [`SwitchApi`] wraps the connection manager and the command catalog with
//! typed operations for VLANs, trunks, SVIs, MAC features, spanning tree,
//! port settings and L3 routing. Configuration operations verify their own
//! effect where the device offers a `show` command to check against;
//! verification failures are reported as [`Error::Verification`] so suites
//! can distinguish a wrong device state from a broken session.

use log::{debug, info, warn};

use crate::catalog::CommandCatalog;
use crate::error::{Error, Result};
use crate::manager::ConnectionManager;

/// Switchport operating mode for [`SwitchApi::assign_port_to_vlan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortMode {
    Access,
    Trunk,
}

/// Spanning-tree protocol flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StpMode {
    Pvst,
    RapidPvst,
    Mst,
}

impl StpMode {
    pub fn as_str(self) -> &'static str {
        match self {
            StpMode::Pvst => "pvst",
            StpMode::RapidPvst => "rapid-pvst",
            StpMode::Mst => "mst",
        }
    }

    pub fn parse(s: &str) -> Result<StpMode> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pvst" => Ok(StpMode::Pvst),
            "rapid-pvst" => Ok(StpMode::RapidPvst),
            "mst" => Ok(StpMode::Mst),
            other => Err(Error::Verification(format!("invalid STP mode: {other}"))),
        }
    }

    /// Phrases `show spanning-tree summary` may use for this mode.
    fn output_variations(self) -> &'static [&'static str] {
        match self {
            StpMode::Pvst => &["pvst", "per-vlan spanning tree"],
            StpMode::RapidPvst => &["rapid-pvst", "rapid pvst", "rapid per-vlan spanning tree"],
            StpMode::Mst => &["mst", "multiple spanning tree"],
        }
    }
}

/// Spanning-tree guard feature for an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StpGuard {
    Root,
    Bpdu,
    Loop,
}

impl StpGuard {
    pub fn parse(s: &str) -> Result<StpGuard> {
        match s.trim().to_ascii_lowercase().as_str() {
            "root" => Ok(StpGuard::Root),
            "bpdu" => Ok(StpGuard::Bpdu),
            "loop" => Ok(StpGuard::Loop),
            other => Err(Error::Verification(format!("invalid guard type: {other}"))),
        }
    }

    fn command(self) -> &'static str {
        match self {
            StpGuard::Root => "spanning-tree guard root",
            StpGuard::Bpdu => "spanning-tree bpduguard enable",
            StpGuard::Loop => "spanning-tree guard loop",
        }
    }
}

/// Model and software version parsed from `show version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchInfo {
    pub model: String,
    pub version: String,
}

pub struct SwitchApi {
    manager: ConnectionManager,
    catalog: CommandCatalog,
}

impl SwitchApi {
    pub fn new(manager: ConnectionManager, catalog: CommandCatalog) -> SwitchApi {
        SwitchApi { manager, catalog }
    }

    pub fn catalog(&self) -> &CommandCatalog {
        &self.catalog
    }

    /// Runs one raw command, connecting first if needed.
    pub async fn send_command(&mut self, command: &str) -> Result<String> {
        debug!("sending command: {command}");
        let response = self.manager.send_command(command).await?;
        debug!("received response: {response:?}");
        Ok(response)
    }

    pub async fn disconnect(&mut self) {
        self.manager.disconnect().await;
    }

    pub fn is_connected(&self) -> bool {
        self.manager.is_connected()
    }

    /// Runs a command and rejects outputs the device flagged as errors.
    async fn send_checked(&mut self, command: &str) -> Result<String> {
        let output = self.send_command(command).await?;
        if output.contains("Invalid input") || output.contains("Error") {
            return Err(Error::command(command, output));
        }
        Ok(output)
    }

    /// Runs a command sequence inside configuration mode, always returning
    /// to the privileged prompt afterwards.
    async fn configure(&mut self, commands: &[String]) -> Result<()> {
        let config_cmd = self.catalog.format("system_commands", "configure_terminal", &[])?;
        self.send_command(&config_cmd).await?;
        let mut result = Ok(());
        for command in commands {
            if let Err(e) = self.send_checked(command).await {
                result = Err(e);
                break;
            }
        }
        let end_cmd = self.catalog.format("system_commands", "end", &[])?;
        self.send_command(&end_cmd).await?;
        result
    }

    // --- VLANs ---

    pub async fn create_vlan(&mut self, vlan_id: u16, name: Option<&str>) -> Result<()> {
        check_vlan_id(vlan_id)?;
        info!("creating VLAN {vlan_id}");
        let id = vlan_id.to_string();
        let mut commands =
            vec![self.catalog.format("vlan_commands", "create_vlan", &[("vlan_id", &id)])?];
        if let Some(name) = name {
            commands.push(self.catalog.format("vlan_commands", "name_vlan", &[("vlan_name", name)])?);
        }
        self.configure(&commands).await
    }

    pub async fn delete_vlan(&mut self, vlan_id: u16) -> Result<()> {
        check_vlan_id(vlan_id)?;
        info!("deleting VLAN {vlan_id}");
        let id = vlan_id.to_string();
        let command = self.catalog.format("vlan_commands", "delete_vlan", &[("vlan_id", &id)])?;
        self.configure(&[command]).await
    }

    pub async fn show_vlans(&mut self) -> Result<String> {
        let command = self.catalog.format("vlan_commands", "show_vlan", &[])?;
        self.send_checked(&command).await
    }

    /// Puts a port in the given VLAN. The VLAN must already exist.
    pub async fn assign_port_to_vlan(
        &mut self,
        port: &str,
        vlan_id: u16,
        mode: PortMode,
    ) -> Result<()> {
        check_vlan_id(vlan_id)?;
        let vlans = self.show_vlans().await?;
        if !vlan_listed(&vlans, vlan_id) {
            return Err(Error::Verification(format!("VLAN {vlan_id} does not exist")));
        }

        info!("assigning port {port} to VLAN {vlan_id}");
        let vlan_cmd = match mode {
            PortMode::Access => format!("switchport access vlan {vlan_id}"),
            PortMode::Trunk => format!("switchport trunk allowed vlan {vlan_id}"),
        };
        let mode_word = match mode {
            PortMode::Access => "access",
            PortMode::Trunk => "trunk",
        };
        self.configure(&[
            format!("interface {port}"),
            format!("switchport mode {mode_word}"),
            vlan_cmd,
            "no shutdown".to_string(),
        ])
        .await
    }

    // --- Trunks ---

    pub async fn configure_trunk_port(
        &mut self,
        port: &str,
        native_vlan: &str,
        allowed_vlans: &str,
    ) -> Result<()> {
        info!("configuring {port} as trunk (native {native_vlan}, allowed {allowed_vlans})");
        self.configure(&[
            format!("interface {port}"),
            "switchport mode trunk".to_string(),
            format!("switchport trunk native vlan {native_vlan}"),
            format!("switchport trunk allowed vlan {allowed_vlans}"),
            "no shutdown".to_string(),
        ])
        .await?;

        // A physically down port still accepts the configuration; skip the
        // trunk state check in that case.
        let status = self.send_command(&format!("show interfaces {port} status")).await?;
        let status_lower = status.to_lowercase();
        if status_lower.contains("notconnect") || status_lower.contains("disabled") {
            warn!("{port} is down; trunk configuration applied but not active");
            return Ok(());
        }
        self.verify_trunk_configuration(port, native_vlan, allowed_vlans).await
    }

    pub async fn verify_trunk_configuration(
        &mut self,
        port: &str,
        native_vlan: &str,
        allowed_vlans: &str,
    ) -> Result<()> {
        let output = self.send_command(&format!("show interfaces {port} trunk")).await?;
        if !output.to_lowercase().contains("trunking") {
            return Err(Error::Verification(format!("{port} is not in trunking mode")));
        }
        if !output.contains(native_vlan) {
            return Err(Error::Verification(format!(
                "native VLAN {native_vlan} not configured on {port}"
            )));
        }
        for vlan in allowed_vlans.split(',') {
            let vlan = vlan.trim();
            if !vlan.is_empty() && !output.contains(vlan) {
                return Err(Error::Verification(format!(
                    "VLAN {vlan} missing from allowed list on {port}"
                )));
            }
        }
        Ok(())
    }

    // --- Voice and private VLANs ---

    /// Configures a port with a data VLAN plus a voice VLAN and the given
    /// QoS trust mode.
    pub async fn configure_voice_vlan(
        &mut self,
        port: &str,
        voice_vlan: u16,
        data_vlan: u16,
        qos_trust: &str,
    ) -> Result<()> {
        check_vlan_id(voice_vlan)?;
        check_vlan_id(data_vlan)?;
        info!("configuring voice VLAN {voice_vlan} (data {data_vlan}) on {port}");
        self.configure(&[
            format!("interface {port}"),
            "switchport mode access".to_string(),
            format!("switchport access vlan {data_vlan}"),
            format!("switchport voice vlan {voice_vlan}"),
            format!("mls qos trust {qos_trust}"),
            "no shutdown".to_string(),
        ])
        .await
    }

    pub async fn verify_voice_vlan(
        &mut self,
        port: &str,
        voice_vlan: u16,
        data_vlan: u16,
        qos_trust: &str,
    ) -> Result<()> {
        // A physically down port cannot be verified; the configuration was
        // still accepted.
        let status = self.send_command(&format!("show interfaces {port} status")).await?;
        let status_lower = status.to_lowercase();
        if status_lower.contains("notconnect") || status_lower.contains("disabled") {
            warn!("{port} is down; voice VLAN configuration applied but not verified");
            return Ok(());
        }

        let mut output = self.send_command(&format!("show interfaces {port} switchport")).await?;
        output.push('\n');
        output.push_str(&self.send_command(&format!("show mls qos interface {port}")).await?);
        let problems = voice_vlan_problems(&output, voice_vlan, data_vlan, qos_trust);
        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::Verification(problems.join(" | ")))
        }
    }

    /// Builds a private VLAN trio: primary, isolated and community VLANs
    /// with the secondary VLANs associated to the primary.
    pub async fn configure_private_vlan(
        &mut self,
        primary: u16,
        isolated: u16,
        community: u16,
    ) -> Result<()> {
        check_vlan_id(primary)?;
        check_vlan_id(isolated)?;
        check_vlan_id(community)?;
        info!("configuring private VLANs: primary {primary}, isolated {isolated}, community {community}");
        self.configure(&[
            format!("vlan {primary}"),
            "private-vlan primary".to_string(),
            "exit".to_string(),
            format!("vlan {isolated}"),
            "private-vlan isolated".to_string(),
            "exit".to_string(),
            format!("vlan {community}"),
            "private-vlan community".to_string(),
            "exit".to_string(),
            format!("vlan {primary}"),
            format!("private-vlan association {isolated},{community}"),
        ])
        .await
    }

    pub async fn verify_private_vlan(
        &mut self,
        primary: u16,
        isolated: u16,
        community: u16,
    ) -> Result<()> {
        let output = self.send_command("show vlan private-vlan").await?;
        if !output.contains("Primary Secondary Type") {
            return Err(Error::Verification("no private VLANs configured".to_string()));
        }
        if !private_vlan_associated(&output, primary, isolated, "isolated") {
            return Err(Error::Verification(format!(
                "isolated VLAN {isolated} not associated with primary VLAN {primary}"
            )));
        }
        if !private_vlan_associated(&output, primary, community, "community") {
            return Err(Error::Verification(format!(
                "community VLAN {community} not associated with primary VLAN {primary}"
            )));
        }
        Ok(())
    }

    /// Creates a VLAN access-map entry matching an ACL with the given
    /// action.
    pub async fn configure_vlan_access_map(
        &mut self,
        map_name: &str,
        sequence: &str,
        action: &str,
        acl_name: &str,
    ) -> Result<()> {
        info!("configuring VLAN access-map {map_name} seq {sequence}");
        self.configure(&[
            format!("vlan access-map {map_name} {sequence}"),
            format!("match ip address {acl_name}"),
            format!("action {action}"),
        ])
        .await?;

        let output = self.send_command(&format!("show vlan access-map {map_name}")).await?;
        if !output.contains(map_name) {
            return Err(Error::Verification(format!("access-map {map_name} not configured")));
        }
        Ok(())
    }

    /// Applies an access-map as a VLAN filter.
    pub async fn apply_vlan_access_map(&mut self, vlan_id: u16, map_name: &str) -> Result<()> {
        check_vlan_id(vlan_id)?;
        self.configure(&[format!("vlan filter {map_name} vlan-list {vlan_id}")]).await?;

        let output = self.send_command("show vlan filter").await?;
        if !output.contains(map_name) && !output.contains(&vlan_id.to_string()) {
            return Err(Error::Verification(format!(
                "access-map {map_name} not applied to VLAN {vlan_id}"
            )));
        }
        Ok(())
    }

    // --- SVIs ---

    pub async fn configure_svi(
        &mut self,
        vlan_id: u16,
        ip_address: &str,
        subnet_mask: &str,
        description: Option<&str>,
    ) -> Result<()> {
        check_vlan_id(vlan_id)?;
        info!("configuring SVI for VLAN {vlan_id}: {ip_address} {subnet_mask}");
        let mut commands = vec![
            format!("interface vlan {vlan_id}"),
            format!("ip address {ip_address} {subnet_mask}"),
        ];
        if let Some(description) = description {
            commands.push(format!("description {description}"));
        }
        commands.push("no shutdown".to_string());
        self.configure(&commands).await?;
        self.verify_svi_configuration(vlan_id, Some(ip_address), Some(subnet_mask)).await
    }

    pub async fn shutdown_svi(&mut self, vlan_id: u16) -> Result<()> {
        check_vlan_id(vlan_id)?;
        self.configure(&[format!("interface vlan {vlan_id}"), "shutdown".to_string()]).await?;
        let output = self.send_command(&format!("show interfaces vlan {vlan_id}")).await?;
        if !output.to_lowercase().contains("administratively down") {
            return Err(Error::Verification(format!("SVI {vlan_id} was not shut down")));
        }
        Ok(())
    }

    pub async fn no_shutdown_svi(&mut self, vlan_id: u16) -> Result<()> {
        check_vlan_id(vlan_id)?;
        self.configure(&[format!("interface vlan {vlan_id}"), "no shutdown".to_string()]).await?;
        let output = self.send_command(&format!("show interfaces vlan {vlan_id}")).await?;
        if output.to_lowercase().contains("administratively down") {
            return Err(Error::Verification(format!("SVI {vlan_id} is still shut down")));
        }
        Ok(())
    }

    pub async fn verify_svi_configuration(
        &mut self,
        vlan_id: u16,
        ip_address: Option<&str>,
        subnet_mask: Option<&str>,
    ) -> Result<()> {
        let output = self.send_command(&format!("show interfaces vlan {vlan_id}")).await?;
        let mut problems = Vec::new();

        if !output.contains(&format!("Vlan{vlan_id}")) {
            return Err(Error::Verification(format!("SVI {vlan_id} does not exist")));
        }
        if output.to_lowercase().contains("administratively down") {
            problems.push("SVI is administratively down".to_string());
        }
        if let Some(ip) = ip_address
            && !output.contains(ip)
        {
            problems.push(format!("IP address {ip} not configured"));
        }
        if let Some(mask) = subnet_mask
            && !mask_present(&output, mask)
        {
            problems.push(format!("subnet mask {mask} not configured"));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::Verification(problems.join(" | ")))
        }
    }

    // --- MAC table and security ---

    pub async fn get_mac_table(&mut self) -> Result<String> {
        self.send_command("show mac address-table").await
    }

    pub async fn clear_mac_table(&mut self) -> Result<()> {
        self.send_command("clear mac address-table dynamic").await?;
        let output = self.get_mac_table().await?;
        if output.to_lowercase().contains("dynamic") {
            return Err(Error::Verification(
                "dynamic MAC entries remain after clear".to_string(),
            ));
        }
        Ok(())
    }

    /// Checks whether a MAC address is present in the table for the given
    /// VLAN.
    pub async fn mac_address_present(&mut self, mac_address: &str, vlan: &str) -> Result<bool> {
        let output = self.get_mac_table().await?;
        let mac = mac_address.to_lowercase();
        Ok(output.to_lowercase().lines().any(|line| {
            line.contains(&mac) && line.split_whitespace().next() == Some(vlan)
        }))
    }

    /// Prepares a port for MAC learning: access mode in the given VLAN,
    /// interface up.
    pub async fn configure_mac_learning_port(&mut self, port: &str, vlan: u16) -> Result<()> {
        check_vlan_id(vlan)?;
        self.configure(&[
            format!("interface {port}"),
            "switchport mode access".to_string(),
            format!("switchport access vlan {vlan}"),
            "no shutdown".to_string(),
        ])
        .await
    }

    /// Sets the dynamic MAC aging time in seconds.
    pub async fn configure_mac_aging(&mut self, seconds: u32) -> Result<()> {
        info!("setting MAC aging time to {seconds} seconds");
        self.configure(&[format!("mac address-table aging-time {seconds}")]).await
    }

    pub async fn verify_mac_aging(&mut self, seconds: u32) -> Result<()> {
        let output = self.send_command("show mac address-table aging-time").await?;
        if !output.contains(&seconds.to_string()) {
            return Err(Error::Verification(format!(
                "aging time {seconds} not reported by the device"
            )));
        }
        Ok(())
    }

    /// Installs a static drop entry so frames from the address are filtered.
    pub async fn configure_mac_filtering(&mut self, mac_address: &str, vlan: &str) -> Result<()> {
        self.configure(&[format!("mac address-table static {mac_address} vlan {vlan} drop")]).await
    }

    pub async fn verify_mac_filtering(&mut self, mac_address: &str, vlan: &str) -> Result<()> {
        let output = self.send_command("show mac address-table static").await?;
        if !output.contains(&format!("{mac_address} vlan {vlan} drop")) {
            return Err(Error::Verification(format!(
                "no drop entry for {mac_address} in VLAN {vlan}"
            )));
        }
        Ok(())
    }

    /// Enables port security with a single allowed address and restrict
    /// violation mode.
    pub async fn configure_port_security(&mut self, port: &str) -> Result<()> {
        self.configure(&[
            format!("interface {port}"),
            "switchport port-security".to_string(),
            "switchport port-security maximum 1".to_string(),
            "switchport port-security violation restrict".to_string(),
        ])
        .await
    }

    pub async fn verify_port_security(&mut self, port: &str) -> Result<()> {
        let output = self.send_command(&format!("show port-security interface {port}")).await?;
        if !output.contains("Port Security: Enabled") {
            return Err(Error::Verification(format!("port security not enabled on {port}")));
        }
        Ok(())
    }

    pub async fn enable_mac_notification(&mut self) -> Result<()> {
        self.configure(&["mac address-table notification".to_string()]).await
    }

    pub async fn verify_mac_notification(&mut self) -> Result<()> {
        let output = self.send_command("show mac address-table notification").await?;
        if !output.contains("MAC address notification is enabled") {
            return Err(Error::Verification("MAC notification is not enabled".to_string()));
        }
        Ok(())
    }

    // --- Spanning tree ---

    pub async fn configure_stp_mode(&mut self, mode: StpMode) -> Result<()> {
        info!("setting spanning-tree mode {}", mode.as_str());
        self.configure(&[format!("spanning-tree mode {}", mode.as_str())]).await
    }

    pub async fn verify_stp_mode(&mut self, mode: StpMode) -> Result<()> {
        let output = self.send_command("show spanning-tree summary").await?;
        let lower = output.to_lowercase();
        if !mode.output_variations().iter().any(|v| lower.contains(v)) {
            return Err(Error::Verification(format!(
                "STP mode mismatch, expected {}",
                mode.as_str()
            )));
        }
        Ok(())
    }

    pub async fn configure_root_bridge(&mut self, vlan: &str) -> Result<()> {
        self.configure(&[format!("spanning-tree vlan {vlan} root primary")]).await
    }

    pub async fn verify_root_bridge(&mut self, vlan: &str, priority: &str) -> Result<()> {
        let output = self.send_command(&format!("show spanning-tree vlan {vlan}")).await?;
        let patterns = [
            format!("Priority {priority}"),
            format!("Bridge Priority {priority}"),
            format!("Priority: {priority}"),
            format!("Bridge Priority: {priority}"),
        ];
        if !patterns.iter().any(|p| output.contains(p)) {
            return Err(Error::Verification(format!(
                "bridge priority {priority} not found for VLAN {vlan}"
            )));
        }
        Ok(())
    }

    pub async fn configure_port_cost(&mut self, port: &str, vlan: &str, cost: &str) -> Result<()> {
        self.configure(&[
            format!("interface {port}"),
            format!("spanning-tree vlan {vlan} cost {cost}"),
        ])
        .await
    }

    pub async fn configure_port_priority(
        &mut self,
        port: &str,
        vlan: &str,
        priority: &str,
    ) -> Result<()> {
        self.configure(&[
            format!("interface {port}"),
            format!("spanning-tree vlan {vlan} port-priority {priority}"),
        ])
        .await
    }

    pub async fn configure_stp_guard(&mut self, port: &str, guard: StpGuard) -> Result<()> {
        self.configure(&[format!("interface {port}"), guard.command().to_string()]).await
    }

    pub async fn verify_stp_guard(&mut self, port: &str, guard: StpGuard) -> Result<()> {
        let output = self
            .send_command(&format!("show spanning-tree interface {port} detail"))
            .await?;
        let lower = output.to_lowercase();
        let marker = match guard {
            StpGuard::Root => "root guard",
            StpGuard::Bpdu => "bpdu guard",
            StpGuard::Loop => "loop guard",
        };
        if !lower.contains(marker) {
            return Err(Error::Verification(format!("{marker} not active on {port}")));
        }
        Ok(())
    }

    // --- Port configuration ---

    pub async fn configure_port(
        &mut self,
        interface: &str,
        speed: Option<&str>,
        duplex: Option<&str>,
    ) -> Result<()> {
        let mut commands = vec![format!("interface {interface}")];
        if let Some(speed) = speed {
            commands.push(format!("speed {speed}"));
        }
        if let Some(duplex) = duplex {
            commands.push(format!("duplex {duplex}"));
        }
        commands.push("no shutdown".to_string());
        self.configure(&commands).await
    }

    pub async fn show_port_status(&mut self, interface: &str) -> Result<String> {
        self.send_checked(&format!("show interfaces {interface} status")).await
    }

    /// Adds a port to an EtherChannel group.
    pub async fn configure_port_channel(
        &mut self,
        interface: &str,
        channel_group: &str,
        mode: &str,
    ) -> Result<()> {
        info!("adding {interface} to channel group {channel_group} ({mode})");
        self.configure(&[
            format!("interface {interface}"),
            format!("channel-group {channel_group} mode {mode}"),
        ])
        .await
    }

    pub async fn verify_port_channel(&mut self, channel_group: &str) -> Result<()> {
        let output = self.send_command("show etherchannel summary").await?;
        if !output.contains(&format!("Po{channel_group}"))
            && !output.contains(&format!("Port-channel{channel_group}"))
        {
            return Err(Error::Verification(format!(
                "port channel {channel_group} not present"
            )));
        }
        Ok(())
    }

    // --- L3 routing ---

    pub async fn configure_interface_ip(
        &mut self,
        interface: &str,
        ip_address: &str,
        subnet_mask: &str,
    ) -> Result<()> {
        self.configure(&[
            format!("interface {interface}"),
            format!("ip address {ip_address} {subnet_mask}"),
            "no shutdown".to_string(),
        ])
        .await
    }

    pub async fn add_static_route(
        &mut self,
        network: &str,
        mask: &str,
        next_hop: &str,
    ) -> Result<()> {
        self.configure(&[format!("ip route {network} {mask} {next_hop}")]).await
    }

    pub async fn show_ip_route(&mut self) -> Result<String> {
        self.send_command("show ip route").await
    }

    pub async fn show_ip_interface_brief(&mut self) -> Result<String> {
        self.send_command("show ip interface brief").await
    }

    /// Starts an OSPF process and advertises one network into an area.
    pub async fn configure_ospf(
        &mut self,
        process_id: &str,
        network: &str,
        wildcard_mask: &str,
        area: &str,
    ) -> Result<()> {
        info!("configuring OSPF process {process_id}: {network} {wildcard_mask} area {area}");
        self.configure(&[
            format!("router ospf {process_id}"),
            format!("network {network} {wildcard_mask} area {area}"),
        ])
        .await
    }

    pub async fn verify_ospf(&mut self, process_id: &str) -> Result<()> {
        let output = self.send_command("show ip ospf").await?;
        // IOS reports the process as `Routing Process "ospf <id>"`.
        if !output.to_lowercase().contains(&format!("ospf {process_id}"))
            && !output.contains(&format!("Process {process_id}"))
        {
            return Err(Error::Verification(format!(
                "OSPF process {process_id} not running"
            )));
        }
        Ok(())
    }

    /// Creates a named extended ACL with a single rule.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_acl(
        &mut self,
        name: &str,
        sequence: &str,
        action: &str,
        protocol: &str,
        source: &str,
        source_wildcard: &str,
        destination: &str,
    ) -> Result<()> {
        info!("creating ACL {name}");
        self.configure(&[
            format!("ip access-list extended {name}"),
            format!("{sequence} {action} {protocol} {source} {source_wildcard} {destination}"),
        ])
        .await
    }

    pub async fn verify_acl(&mut self, name: &str) -> Result<()> {
        let output = self.send_command("show ip access-lists").await?;
        if !output.contains(name) {
            return Err(Error::Verification(format!("ACL {name} not present")));
        }
        Ok(())
    }

    // --- Device information ---

    /// Parses model and software version out of `show version`.
    pub async fn get_switch_info(&mut self) -> Result<SwitchInfo> {
        let output = self.send_command("show version").await?;
        parse_switch_info(&output)
    }
}

fn check_vlan_id(vlan_id: u16) -> Result<()> {
    if (1..=4094).contains(&vlan_id) {
        Ok(())
    } else {
        Err(Error::Verification(format!(
            "invalid VLAN ID: {vlan_id}, must be between 1 and 4094"
        )))
    }
}

/// Checks whether a VLAN ID appears as the leading column of any row in
/// `show vlan brief` output.
fn vlan_listed(output: &str, vlan_id: u16) -> bool {
    let id = vlan_id.to_string();
    output
        .lines()
        .any(|line| line.split_whitespace().next() == Some(id.as_str()))
}

/// Converts a dotted-decimal mask to its prefix length.
fn mask_to_cidr(mask: &str) -> Option<u32> {
    let octets: Vec<u8> = mask
        .split('.')
        .map(|o| o.parse().ok())
        .collect::<Option<Vec<u8>>>()?;
    if octets.len() != 4 {
        return None;
    }
    Some(octets.iter().map(|o| o.count_ones()).sum())
}

/// True if the mask appears in the output in either dotted or /CIDR form.
fn mask_present(output: &str, mask: &str) -> bool {
    if output.contains(mask) {
        return true;
    }
    match mask_to_cidr(mask) {
        Some(cidr) => output.contains(&format!("/{cidr}")),
        None => false,
    }
}

/// Collects mismatches between the combined switchport/QoS show output and
/// the expected voice VLAN setup.
fn voice_vlan_problems(
    output: &str,
    voice_vlan: u16,
    data_vlan: u16,
    qos_trust: &str,
) -> Vec<String> {
    let mut problems = Vec::new();
    let lower = output.to_lowercase();

    if !lower.contains("mode: access") && !lower.contains("mode: static access") {
        problems.push("port is not in access mode".to_string());
    }
    if !output.contains(&format!("Voice VLAN: {voice_vlan}")) {
        problems.push(format!("voice VLAN {voice_vlan} not configured"));
    }
    if !output.contains(&format!("Access Mode VLAN: {data_vlan}")) {
        problems.push(format!("data VLAN {data_vlan} not configured"));
    }
    // IOS prints either "Trust state: trust cos" or "Trust state: cos"
    // depending on the platform, so match the value anywhere on the line.
    let trust = qos_trust.to_lowercase();
    let trusted = lower
        .lines()
        .any(|line| line.contains("trust state:") && line.contains(&trust));
    if !trusted {
        problems.push(format!("QoS trust mode {qos_trust} not configured"));
    }
    problems
}

/// Checks `show vlan private-vlan` output for a primary/secondary
/// association row of the given type. Rows are column-aligned, so fields
/// are compared after whitespace splitting.
fn private_vlan_associated(output: &str, primary: u16, secondary: u16, kind: &str) -> bool {
    let primary = primary.to_string();
    let secondary = secondary.to_string();
    output.lines().any(|line| {
        let fields: Vec<&str> = line.split_whitespace().collect();
        fields.len() >= 3 && fields[0] == primary && fields[1] == secondary && fields[2] == kind
    })
}

fn parse_switch_info(output: &str) -> Result<SwitchInfo> {
    let lines: Vec<&str> = output.lines().collect();
    let mut model = None;
    let mut version = None;

    for (i, line) in lines.iter().enumerate() {
        if line.contains("Model number")
            && let Some(value) = line.split(':').nth(1)
        {
            model = Some(value.trim().to_string());
        }
        // The version table header is followed by a separator row, then the
        // data row with the version in the fourth column.
        if line.contains("SW Version")
            && let Some(data_row) = lines.get(i + 2)
        {
            let parts: Vec<&str> = data_row.split_whitespace().collect();
            if parts.len() >= 4 {
                version = Some(parts[3].to_string());
            }
        }
    }

    match (model, version) {
        (Some(model), Some(version)) => Ok(SwitchInfo { model, version }),
        _ => Err(Error::Verification(
            "could not parse model or software version from show version output".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vlan_id_bounds() {
        assert!(check_vlan_id(1).is_ok());
        assert!(check_vlan_id(4094).is_ok());
        assert!(check_vlan_id(0).is_err());
        assert!(check_vlan_id(4095).is_err());
    }

    #[test]
    fn vlan_listed_matches_leading_column_only() {
        let output = "VLAN Name     Status\n---- -------- ------\n1    default  active\n10   LAB      active";
        assert!(vlan_listed(output, 10));
        assert!(vlan_listed(output, 1));
        // "10" appears nowhere as a leading column for VLAN 100.
        assert!(!vlan_listed(output, 100));
    }

    #[test]
    fn mask_conversion() {
        assert_eq!(mask_to_cidr("255.255.255.0"), Some(24));
        assert_eq!(mask_to_cidr("255.255.0.0"), Some(16));
        assert_eq!(mask_to_cidr("bogus"), None);
        assert!(mask_present("ip is 10.0.0.1/24", "255.255.255.0"));
        assert!(mask_present("mask 255.255.255.0", "255.255.255.0"));
        assert!(!mask_present("ip is 10.0.0.1/16", "255.255.255.0"));
    }

    #[test]
    fn parses_show_version_output() {
        let output = "\
Cisco IOS Software, C2960 Software\n\
Switch Ports Model              SW Version            SW Image\n\
------ ----- -----              ----------            ----------\n\
     1 26    WS-C2960-24TT-L    12.2(55)SE5           C2960-LANBASEK9-M\n\
\n\
Model number                    : WS-C2960-24TT-L\n";
        let info = parse_switch_info(output).unwrap();
        assert_eq!(info.model, "WS-C2960-24TT-L");
        assert_eq!(info.version, "12.2(55)SE5");
    }

    #[test]
    fn voice_vlan_problem_collection() {
        let output = "\
Name: Gi0/5\n\
Administrative Mode: static access\n\
Operational Mode: static access\n\
Access Mode VLAN: 60 (DATA)\n\
Voice VLAN: 50 (VOICE)\n\
Trust state: trust cos\n";
        assert!(voice_vlan_problems(output, 50, 60, "cos").is_empty());

        let problems = voice_vlan_problems(output, 51, 60, "dscp");
        assert_eq!(problems.len(), 2);
        assert!(problems[0].contains("51"));
        assert!(problems[1].contains("dscp"));

        let trunk = "Administrative Mode: trunk\nOperational Mode: trunk\n";
        let problems = voice_vlan_problems(trunk, 50, 60, "cos");
        assert_eq!(problems.len(), 4);
    }

    #[test]
    fn private_vlan_association_rows() {
        let output = "\
Primary Secondary Type              Ports\n\
------- --------- ----------------- -----\n\
200     201       isolated\n\
200     202       community\n";
        assert!(private_vlan_associated(output, 200, 201, "isolated"));
        assert!(private_vlan_associated(output, 200, 202, "community"));
        assert!(!private_vlan_associated(output, 200, 201, "community"));
        assert!(!private_vlan_associated(output, 201, 202, "isolated"));
    }

    #[test]
    fn stp_mode_parsing_and_variations() {
        assert_eq!(StpMode::parse("Rapid-PVST").unwrap(), StpMode::RapidPvst);
        assert!(StpMode::parse("stp").is_err());
        assert!(StpMode::Pvst.output_variations().contains(&"per-vlan spanning tree"));
    }
}
