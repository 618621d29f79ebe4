//! Connection lifecycle management.
//!
//! [`ConnectionManager`] owns at most one live transport, built lazily from
//! the configuration. Switching transport kinds tears the previous session
//! down completely before the new one is created, so a device is never
//! driven over two lines at once.

use std::time::Duration;

use log::{debug, info};

use crate::config::{SwitchConfig, TransportKind};
use crate::error::{Error, Result};
use crate::transport::{self, DeviceMode, Transport};

pub struct ConnectionManager {
    config: SwitchConfig,
    kind: TransportKind,
    transport: Option<Box<dyn Transport>>,
}

impl ConnectionManager {
    /// Creates a manager using the transport kind selected in the
    /// configuration.
    pub fn new(config: SwitchConfig) -> ConnectionManager {
        let kind = config.connection_type;
        ConnectionManager {
            config,
            kind,
            transport: None,
        }
    }

    /// Creates a manager with an explicit transport kind, overriding the
    /// configuration's `connection_type`.
    pub fn with_kind(config: SwitchConfig, kind: TransportKind) -> ConnectionManager {
        ConnectionManager {
            config,
            kind,
            transport: None,
        }
    }

    pub fn kind(&self) -> TransportKind {
        self.kind
    }

    /// Returns the live transport, building and optionally connecting it
    /// first. With `auto_connect` false the caller gets a built but
    /// unconnected transport.
    pub async fn get_connection(
        &mut self,
        auto_connect: bool,
    ) -> Result<&mut Box<dyn Transport>> {
        if self.transport.is_none() {
            debug!("building {} transport", self.kind);
            self.transport = Some(transport::build_transport(self.kind, &self.config)?);
        }
        let t = self.transport.as_mut().ok_or(Error::NotConnected)?;
        if auto_connect && !t.is_connected() {
            t.connect().await?;
        }
        Ok(t)
    }

    /// Switches to a different transport kind. Any existing session is torn
    /// down first; the new transport connects on next use.
    pub async fn switch_kind(&mut self, kind: TransportKind) -> Result<()> {
        if kind == self.kind && self.transport.is_some() {
            return Ok(());
        }
        if let Some(mut old) = self.transport.take() {
            old.disconnect().await;
            info!("closed {} session before switching to {kind}", old.kind());
        }
        // Validate the new kind's section exists before committing.
        transport::build_transport(kind, &self.config)?;
        self.kind = kind;
        Ok(())
    }

    pub async fn connect(&mut self) -> Result<()> {
        self.get_connection(true).await.map(|_| ())
    }

    /// Disconnects the current session if any. Never fails; disconnecting a
    /// manager that never connected is a no-op.
    pub async fn disconnect(&mut self) {
        if let Some(transport) = self.transport.as_mut() {
            transport.disconnect().await;
        }
        self.transport = None;
    }

    pub fn is_connected(&self) -> bool {
        self.transport.as_ref().is_some_and(|t| t.is_connected())
    }

    pub fn mode(&self) -> Option<DeviceMode> {
        self.transport.as_ref().and_then(|t| t.mode())
    }

    /// Runs a command over the managed session, connecting first if needed.
    pub async fn send_command(&mut self, command: &str) -> Result<String> {
        self.get_connection(true).await?.send_command(command).await
    }

    pub async fn send_command_with_timeout(
        &mut self,
        command: &str,
        timeout: Duration,
    ) -> Result<String> {
        self.get_connection(true)
            .await?
            .send_command_with_timeout(command, timeout)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn sample_config() -> SwitchConfig {
        AppConfig::from_yaml(
            "switch:\n  connection_type: telnet\n  telnet:\n    host: 192.0.2.1\n",
        )
        .unwrap()
        .switch
    }

    #[tokio::test]
    async fn builds_without_connecting() {
        let mut manager = ConnectionManager::new(sample_config());
        let transport = manager.get_connection(false).await.unwrap();
        assert!(!transport.is_connected());
        assert!(!manager.is_connected());
    }

    #[tokio::test]
    async fn disconnect_without_connection_is_a_no_op() {
        let mut manager = ConnectionManager::new(sample_config());
        manager.disconnect().await;
        assert!(!manager.is_connected());
    }

    #[tokio::test]
    async fn switch_kind_requires_configured_section() {
        let mut manager = ConnectionManager::new(sample_config());
        let err = manager
            .switch_kind(TransportKind::Serial)
            .await
            .expect_err("no serial section configured");
        assert!(matches!(err, Error::Config(_)));
        // The original kind is kept on failure.
        assert_eq!(manager.kind(), TransportKind::Telnet);
    }
}
