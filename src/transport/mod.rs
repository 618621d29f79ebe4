//! Transport implementations for CLI sessions.
//!
//! Each transport owns its wire connection and exposes the same
//! prompt-driven [`ShellSession`] behavior through the [`Transport`] trait,
//! so callers never care whether a command travels over SSH, Telnet or a
//! console cable.

pub mod algo;
pub mod serial;
pub mod shell;
pub mod ssh;
pub mod telnet;

use std::time::Duration;

use async_trait::async_trait;

use crate::config::{SwitchConfig, TransportKind};
use crate::error::{Error, Result};

pub use shell::{DeviceMode, ShellLink, ShellSession};

/// A CLI session over some wire protocol.
#[async_trait]
pub trait Transport: Send {
    /// Establishes the connection and brings the session to a usable CLI
    /// prompt.
    async fn connect(&mut self) -> Result<()>;

    /// Tears the session down. Best effort; a transport that was never
    /// connected disconnects trivially.
    async fn disconnect(&mut self);

    /// Runs one command and returns its cleaned output.
    async fn send_command(&mut self, command: &str) -> Result<String>;

    /// Same as [`Transport::send_command`] with a per-command deadline.
    async fn send_command_with_timeout(
        &mut self,
        command: &str,
        timeout: Duration,
    ) -> Result<String>;

    fn is_connected(&self) -> bool;

    /// Current CLI mode, if a session is up.
    fn mode(&self) -> Option<DeviceMode>;

    fn kind(&self) -> TransportKind;
}

/// Builds the transport selected by `kind` from its configuration section.
/// A missing section for the selected transport is a configuration error.
pub fn build_transport(kind: TransportKind, config: &SwitchConfig) -> Result<Box<dyn Transport>> {
    match kind {
        TransportKind::Ssh => {
            let ssh = config
                .ssh
                .clone()
                .ok_or_else(|| missing_section("ssh"))?;
            ssh.validate()?;
            Ok(Box::new(ssh::SshTransport::new(ssh)))
        }
        TransportKind::Telnet => {
            let telnet = config
                .telnet
                .clone()
                .ok_or_else(|| missing_section("telnet"))?;
            telnet.validate()?;
            Ok(Box::new(telnet::TelnetTransport::new(telnet)))
        }
        TransportKind::Serial => {
            let serial = config
                .serial
                .clone()
                .ok_or_else(|| missing_section("serial"))?;
            serial.validate()?;
            Ok(Box::new(serial::SerialTransport::new(serial)))
        }
    }
}

fn missing_section(name: &str) -> Error {
    Error::Config(format!(
        "connection_type is `{name}` but the configuration has no `{name}` section"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn factory_requires_matching_section() {
        let config = AppConfig::from_yaml(
            "switch:\n  connection_type: ssh\n  telnet:\n    host: 10.0.0.1\n",
        )
        .unwrap();
        let err = build_transport(TransportKind::Ssh, &config.switch)
            .err()
            .expect("no ssh section present");
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn factory_builds_selected_transport() {
        let config = AppConfig::from_yaml(
            "switch:\n  connection_type: telnet\n  telnet:\n    host: 10.0.0.1\n",
        )
        .unwrap();
        let transport = build_transport(TransportKind::Telnet, &config.switch).unwrap();
        assert_eq!(transport.kind(), TransportKind::Telnet);
        assert!(!transport.is_connected());
    }
}
