//! Telnet transport.
//!
//! Lab switches expose their VTY lines over plain TCP; no Telnet option
//! negotiation is performed. Credentials are optional: a line with only a
//! password configured is answered at the `Password:` prompt, and a fully
//! open line logs straight in.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::net::TcpStream;

use crate::config::{TelnetConfig, TransportKind};
use crate::error::{Error, Result};
use crate::transport::shell::{DeviceMode, ShellLink, ShellSession};
use crate::transport::Transport;

pub struct TelnetTransport {
    config: TelnetConfig,
    session: Option<ShellSession>,
}

impl TelnetTransport {
    pub fn new(config: TelnetConfig) -> TelnetTransport {
        TelnetTransport {
            config,
            session: None,
        }
    }

    fn session_mut(&mut self) -> Result<&mut ShellSession> {
        self.session.as_mut().ok_or(Error::NotConnected)
    }
}

#[async_trait]
impl Transport for TelnetTransport {
    async fn connect(&mut self) -> Result<()> {
        let addr = (self.config.host.as_str(), self.config.port);
        debug!("opening telnet session to {}:{}", addr.0, addr.1);

        let stream = tokio::time::timeout(self.config.timeout(), TcpStream::connect(addr))
            .await
            .map_err(|_| {
                Error::Connect(format!(
                    "timed out connecting to {}:{}",
                    self.config.host, self.config.port
                ))
            })?
            .map_err(|e| {
                Error::Connect(format!(
                    "failed to connect to {}:{}: {e}",
                    self.config.host, self.config.port
                ))
            })?;
        let _ = stream.set_nodelay(true);

        let link = ShellLink::spawn(stream);
        let mut session = ShellSession::new(link, self.config.timeout())
            .with_enable_password(self.config.password.clone());

        // Nudge the line so the device prints its first prompt.
        session.link().send_line("").await?;
        session
            .login(
                self.config.username.as_deref(),
                self.config.password.as_deref(),
            )
            .await?;

        // Privileged mode is attempted but not required over telnet; a
        // session stuck in user mode can still run show commands.
        if let Err(e) = session.enter_enable().await {
            warn!("telnet session stays in user mode: {e}");
        }
        if let Err(e) = session.prepare_terminal().await {
            warn!("could not disable pagination: {e}");
        }

        info!(
            "telnet session to {}:{} established",
            self.config.host, self.config.port
        );
        self.session = Some(session);
        Ok(())
    }

    async fn disconnect(&mut self) {
        if let Some(session) = self.session.take() {
            session.close().await;
            debug!("telnet session to {} closed", self.config.host);
        }
    }

    async fn send_command(&mut self, command: &str) -> Result<String> {
        self.session_mut()?.run_command(command).await
    }

    async fn send_command_with_timeout(
        &mut self,
        command: &str,
        timeout: Duration,
    ) -> Result<String> {
        self.session_mut()?
            .run_command_with_timeout(command, timeout)
            .await
    }

    fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    fn mode(&self) -> Option<DeviceMode> {
        self.session.as_ref().map(ShellSession::mode)
    }

    fn kind(&self) -> TransportKind {
        TransportKind::Telnet
    }
}
