//! Typed harness configuration.
//!
//! The configuration is a single YAML document loaded once at startup into
//! an [`AppConfig`] and passed by reference into every component that needs
//! it; there is no ambient global. Per-transport connection parameters are
//! typed structs validated here rather than free-form maps inspected at
//! first use.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which wire protocol carries the CLI session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Ssh,
    Telnet,
    Serial,
}

impl TransportKind {
    /// Lowercase tag as it appears in configuration files.
    pub fn as_str(self) -> &'static str {
        match self {
            TransportKind::Ssh => "ssh",
            TransportKind::Telnet => "telnet",
            TransportKind::Serial => "serial",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ssh" => Ok(TransportKind::Ssh),
            "telnet" => Ok(TransportKind::Telnet),
            "serial" => Ok(TransportKind::Serial),
            other => Err(Error::UnsupportedTransport(other.to_string())),
        }
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub switch: SwitchConfig,
    #[serde(default)]
    pub test: TestSettings,
}

impl AppConfig {
    /// Loads and validates the configuration from a YAML file. Failure here
    /// is fatal to startup.
    pub fn load(path: impl AsRef<Path>) -> Result<AppConfig> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_yaml(&raw)
    }

    /// Parses a YAML document; used by [`AppConfig::load`] and tests.
    pub fn from_yaml(raw: &str) -> Result<AppConfig> {
        let config: AppConfig = serde_yaml::from_str(raw)
            .map_err(|e| Error::Config(format!("invalid configuration: {e}")))?;
        config.switch.validate()?;
        Ok(config)
    }
}

/// Connection parameters for the device under test.
#[derive(Debug, Clone, Deserialize)]
pub struct SwitchConfig {
    pub connection_type: TransportKind,
    #[serde(default)]
    pub ssh: Option<SshConfig>,
    #[serde(default)]
    pub telnet: Option<TelnetConfig>,
    #[serde(default)]
    pub serial: Option<SerialConfig>,
}

impl SwitchConfig {
    /// Validates whichever per-transport sections are present. Invalid
    /// parameters fail here, before any I/O is attempted.
    pub fn validate(&self) -> Result<()> {
        if let Some(ssh) = &self.ssh {
            ssh.validate()?;
        }
        if let Some(telnet) = &self.telnet {
            telnet.validate()?;
        }
        if let Some(serial) = &self.serial {
            serial.validate()?;
        }
        Ok(())
    }
}

fn default_ssh_port() -> u16 {
    22
}

fn default_telnet_port() -> u16 {
    23
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_baud_rate() -> u32 {
    9600
}

fn default_stop_bits() -> u8 {
    1
}

fn default_data_bits() -> u8 {
    8
}

/// SSH connection parameters. Username and password are both required.
#[derive(Debug, Clone, Deserialize)]
pub struct SshConfig {
    pub host: String,
    pub username: String,
    pub password: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    #[serde(default = "default_timeout_secs")]
    pub timeout: u64,
}

impl SshConfig {
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(invalid("ssh", "host cannot be empty"));
        }
        if self.username.is_empty() {
            return Err(invalid("ssh", "username cannot be empty"));
        }
        if self.password.is_empty() {
            return Err(invalid("ssh", "password cannot be empty"));
        }
        if self.timeout == 0 {
            return Err(invalid("ssh", "timeout must be a positive number"));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

/// Telnet connection parameters. Credentials are optional; many lab devices
/// have no line authentication configured.
#[derive(Debug, Clone, Deserialize)]
pub struct TelnetConfig {
    pub host: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_telnet_port")]
    pub port: u16,
    #[serde(default = "default_timeout_secs")]
    pub timeout: u64,
}

impl TelnetConfig {
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(invalid("telnet", "host cannot be empty"));
        }
        if self.timeout == 0 {
            return Err(invalid("telnet", "timeout must be a positive number"));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

/// Serial parity setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParitySetting {
    #[default]
    None,
    Even,
    Odd,
}

/// Serial (console) connection parameters with explicit physical-layer
/// settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SerialConfig {
    /// Device node, e.g. `/dev/ttyUSB0` (or `COM3` on Windows).
    pub port: String,
    #[serde(default = "default_baud_rate")]
    pub baudrate: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout: u64,
    #[serde(default)]
    pub parity: ParitySetting,
    #[serde(default = "default_stop_bits")]
    pub stopbits: u8,
    #[serde(default = "default_data_bits")]
    pub bytesize: u8,
    /// Software (XON/XOFF) flow control.
    #[serde(default)]
    pub xonxoff: bool,
    /// Hardware (RTS/CTS) flow control.
    #[serde(default)]
    pub rtscts: bool,
}

impl SerialConfig {
    /// Validates the physical-layer parameter combination eagerly; an
    /// invalid value fails before the port is ever opened.
    pub fn validate(&self) -> Result<()> {
        if self.port.is_empty() {
            return Err(invalid("serial", "port cannot be empty"));
        }
        if self.baudrate == 0 {
            return Err(invalid("serial", "baudrate must be a positive integer"));
        }
        if self.timeout == 0 {
            return Err(invalid("serial", "timeout must be a positive number"));
        }
        if !matches!(self.stopbits, 1 | 2) {
            return Err(invalid("serial", "invalid stopbits value"));
        }
        if !matches!(self.bytesize, 5..=8) {
            return Err(invalid("serial", "invalid bytesize value"));
        }
        if self.xonxoff && self.rtscts {
            return Err(invalid(
                "serial",
                "xonxoff and rtscts flow control are mutually exclusive",
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

fn invalid(transport: &'static str, reason: &str) -> Error {
    Error::InvalidTransportConfig {
        transport,
        reason: reason.to_string(),
    }
}

/// Per-suite test parameters under the `test:` section. Every field has a
/// default so a minimal configuration still runs.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TestSettings {
    #[serde(default)]
    pub vlan: VlanTestParams,
    #[serde(default)]
    pub mac: MacTestParams,
    #[serde(default)]
    pub stp: StpTestParams,
    #[serde(default)]
    pub port: PortTestParams,
    #[serde(default)]
    pub routing: RoutingTestParams,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VlanTestParams {
    pub vlan_id: u16,
    pub vlan_name: String,
    pub interface: String,
    pub trunk_port: String,
    pub native_vlan: String,
    pub allowed_vlans: String,
    pub voice_vlan: u16,
    pub voice_data_vlan: u16,
    pub qos_trust: String,
    pub primary_vlan: u16,
    pub isolated_vlan: u16,
    pub community_vlan: u16,
    pub access_map: String,
    pub access_map_acl: String,
    pub access_map_vlan: u16,
}

impl Default for VlanTestParams {
    fn default() -> Self {
        VlanTestParams {
            vlan_id: 100,
            vlan_name: "test_vlan".to_string(),
            interface: "FastEthernet0/1".to_string(),
            trunk_port: "FastEthernet0/24".to_string(),
            native_vlan: "1".to_string(),
            allowed_vlans: "1,10,20,30".to_string(),
            voice_vlan: 50,
            voice_data_vlan: 60,
            qos_trust: "cos".to_string(),
            primary_vlan: 200,
            isolated_vlan: 201,
            community_vlan: 202,
            access_map: "VLAN_ACL".to_string(),
            access_map_acl: "VLAN_ACL_LIST".to_string(),
            access_map_vlan: 70,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MacTestParams {
    pub port: String,
    pub mac_address: String,
    pub vlan: String,
    pub aging_time: u32,
}

impl Default for MacTestParams {
    fn default() -> Self {
        MacTestParams {
            port: "FastEthernet0/2".to_string(),
            mac_address: "0011.2233.4455".to_string(),
            vlan: "10".to_string(),
            aging_time: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StpTestParams {
    pub mode: String,
    pub vlan: String,
    pub priority: String,
    pub port: String,
    pub cost: String,
    pub port_priority: String,
    pub guard_type: String,
}

impl Default for StpTestParams {
    fn default() -> Self {
        StpTestParams {
            mode: "pvst".to_string(),
            vlan: "1".to_string(),
            priority: "4096".to_string(),
            port: "FastEthernet0/3".to_string(),
            cost: "100".to_string(),
            port_priority: "64".to_string(),
            guard_type: "root".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PortTestParams {
    pub interface: String,
    pub speed: String,
    pub duplex: String,
    pub channel_group: String,
    pub channel_mode: String,
}

impl Default for PortTestParams {
    fn default() -> Self {
        PortTestParams {
            interface: "FastEthernet0/4".to_string(),
            speed: "100".to_string(),
            duplex: "full".to_string(),
            channel_group: "1".to_string(),
            channel_mode: "active".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RoutingTestParams {
    pub interface: String,
    pub ip_address: String,
    pub subnet_mask: String,
    pub network: String,
    pub network_mask: String,
    pub next_hop: String,
    pub svi_vlan: String,
    pub svi_ip: String,
    pub svi_mask: String,
    pub ospf_process: String,
    pub ospf_network: String,
    pub ospf_wildcard: String,
    pub ospf_area: String,
    pub acl_name: String,
    pub acl_sequence: String,
    pub acl_action: String,
    pub acl_protocol: String,
    pub acl_source: String,
    pub acl_wildcard: String,
    pub acl_destination: String,
}

impl Default for RoutingTestParams {
    fn default() -> Self {
        RoutingTestParams {
            interface: "FastEthernet0/0".to_string(),
            ip_address: "192.168.1.1".to_string(),
            subnet_mask: "255.255.255.0".to_string(),
            network: "10.0.0.0".to_string(),
            network_mask: "255.255.255.0".to_string(),
            next_hop: "192.168.1.2".to_string(),
            svi_vlan: "100".to_string(),
            svi_ip: "192.168.100.1".to_string(),
            svi_mask: "255.255.255.0".to_string(),
            ospf_process: "1".to_string(),
            ospf_network: "192.168.1.0".to_string(),
            ospf_wildcard: "0.0.0.255".to_string(),
            ospf_area: "0".to_string(),
            acl_name: "TEST_ACL".to_string(),
            acl_sequence: "10".to_string(),
            acl_action: "permit".to_string(),
            acl_protocol: "ip".to_string(),
            acl_source: "192.168.1.0".to_string(),
            acl_wildcard: "0.0.0.255".to_string(),
            acl_destination: "any".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
switch:
  connection_type: telnet
  telnet:
    host: 192.168.1.10
    username: admin
    password: cisco
  serial:
    port: /dev/ttyUSB0
test:
  vlan:
    vlan_id: 200
    vlan_name: lab_vlan
"#;

    #[test]
    fn parses_yaml_with_defaults() {
        let config = AppConfig::from_yaml(SAMPLE).expect("sample config should parse");
        assert_eq!(config.switch.connection_type, TransportKind::Telnet);

        let telnet = config.switch.telnet.as_ref().expect("telnet section");
        assert_eq!(telnet.port, 23);
        assert_eq!(telnet.timeout, 10);

        let serial = config.switch.serial.as_ref().expect("serial section");
        assert_eq!(serial.baudrate, 9600);
        assert_eq!(serial.parity, ParitySetting::None);

        assert_eq!(config.test.vlan.vlan_id, 200);
        assert_eq!(config.test.vlan.vlan_name, "lab_vlan");
        // Untouched sections keep their defaults.
        assert_eq!(config.test.stp.mode, "pvst");
    }

    #[test]
    fn unknown_connection_type_is_rejected() {
        let raw = "switch:\n  connection_type: xbee\n";
        let err = AppConfig::from_yaml(raw).expect_err("xbee is not a transport");
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn transport_kind_from_str_rejects_unknown_tag() {
        assert_eq!("ssh".parse::<TransportKind>().unwrap(), TransportKind::Ssh);
        assert_eq!(
            "Telnet".parse::<TransportKind>().unwrap(),
            TransportKind::Telnet
        );
        let err = "xbee".parse::<TransportKind>().expect_err("unsupported tag");
        assert!(matches!(err, Error::UnsupportedTransport(tag) if tag == "xbee"));
    }

    #[test]
    fn serial_zero_baud_fails_validation() {
        let raw = r#"
switch:
  connection_type: serial
  serial:
    port: /dev/ttyUSB0
    baudrate: 0
"#;
        let err = AppConfig::from_yaml(raw).expect_err("zero baud must fail");
        assert!(matches!(
            err,
            Error::InvalidTransportConfig { transport: "serial", .. }
        ));
    }

    #[test]
    fn serial_rejects_conflicting_flow_control() {
        let config = SerialConfig {
            port: "/dev/ttyS0".to_string(),
            baudrate: 9600,
            timeout: 10,
            parity: ParitySetting::None,
            stopbits: 1,
            bytesize: 8,
            xonxoff: true,
            rtscts: true,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn ssh_requires_credentials() {
        let config = SshConfig {
            host: "10.0.0.1".to_string(),
            username: "admin".to_string(),
            password: String::new(),
            port: 22,
            timeout: 10,
        };
        assert!(config.validate().is_err());
    }
}
