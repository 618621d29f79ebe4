//! SSH transport.
//!
//! Authentication happens at the SSH layer, after which a PTY-backed shell
//! channel is bridged onto a [`ShellLink`] and driven like any other CLI
//! session. Host keys are accepted without verification and the algorithm
//! preferences include legacy options, matching what lab switches offer.

use std::time::Duration;

use async_ssh2_tokio::client::{AuthMethod, Client};
use async_ssh2_tokio::{Config, ServerCheckMethod};
use async_trait::async_trait;
use log::{debug, info, warn};
use russh::ChannelMsg;
use tokio::sync::mpsc;

use crate::config::{SshConfig, TransportKind};
use crate::error::{Error, Result};
use crate::transport::algo;
use crate::transport::shell::{DeviceMode, ShellLink, ShellSession};
use crate::transport::Transport;

pub struct SshTransport {
    config: SshConfig,
    client: Option<Client>,
    session: Option<ShellSession>,
}

impl SshTransport {
    pub fn new(config: SshConfig) -> SshTransport {
        SshTransport {
            config,
            client: None,
            session: None,
        }
    }

    fn session_mut(&mut self) -> Result<&mut ShellSession> {
        self.session.as_mut().ok_or(Error::NotConnected)
    }
}

#[async_trait]
impl Transport for SshTransport {
    async fn connect(&mut self) -> Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        debug!("opening ssh session to {addr}");

        let ssh_config = Config {
            preferred: algo::compat_preferred(),
            inactivity_timeout: Some(Duration::from_secs(60)),
            ..Default::default()
        };
        let client = Client::connect_with_config(
            (self.config.host.clone(), self.config.port),
            &self.config.username,
            AuthMethod::with_password(&self.config.password),
            ServerCheckMethod::NoCheck,
            ssh_config,
        )
        .await?;
        debug!("{addr} authenticated");

        let mut channel = client.get_channel().await?;
        channel.request_pty(false, "xterm", 800, 600, 0, 0, &[]).await?;
        channel.request_shell(false).await?;
        debug!("{addr} shell requested");

        let (to_device, mut from_user) = mpsc::channel::<String>(256);
        let (to_user, from_device) = mpsc::channel::<String>(256);
        let task_addr = addr.clone();
        let io_task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    outbound = from_user.recv() => {
                        let Some(data) = outbound else { break };
                        if let Err(e) = channel.data(data.as_bytes()).await {
                            debug!("{task_addr} failed to write to shell: {e:?}");
                            break;
                        }
                    }
                    inbound = channel.wait() => {
                        match inbound {
                            Some(ChannelMsg::Data { ref data }) => {
                                if let Ok(s) = std::str::from_utf8(data)
                                    && to_user.send(s.to_string()).await.is_err()
                                {
                                    break;
                                }
                            }
                            Some(ChannelMsg::ExitStatus { exit_status }) => {
                                debug!("{task_addr} shell exited with status {exit_status}");
                                let _ = channel.eof().await;
                                break;
                            }
                            Some(ChannelMsg::Eof) | None => break,
                            Some(_) => {}
                        }
                    }
                }
            }
            debug!("{task_addr} ssh I/O task ended");
        });

        let link = ShellLink::from_parts(to_device, from_device, io_task);
        let mut session = ShellSession::new(link, self.config.timeout())
            .with_enable_password(Some(self.config.password.clone()));

        session.link().send_line("").await?;
        session
            .login(Some(&self.config.username), Some(&self.config.password))
            .await?;

        if let Err(e) = session.enter_enable().await {
            warn!("ssh session stays in user mode: {e}");
        }
        if let Err(e) = session.prepare_terminal().await {
            warn!("could not disable pagination: {e}");
        }

        info!("ssh session to {addr} established");
        self.client = Some(client);
        self.session = Some(session);
        Ok(())
    }

    async fn disconnect(&mut self) {
        if let Some(session) = self.session.take() {
            session.close().await;
        }
        // The client closes its connection on drop.
        if self.client.take().is_some() {
            debug!("ssh session to {} closed", self.config.host);
        }
    }

    async fn send_command(&mut self, command: &str) -> Result<String> {
        self.send_command_with_timeout(command, self.config.timeout())
            .await
    }

    async fn send_command_with_timeout(
        &mut self,
        command: &str,
        timeout: Duration,
    ) -> Result<String> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        self.session_mut()?
            .run_command_with_timeout(command, timeout)
            .await
    }

    fn is_connected(&self) -> bool {
        self.session.is_some() && self.client.as_ref().is_some_and(|c| !c.is_closed())
    }

    fn mode(&self) -> Option<DeviceMode> {
        self.session.as_ref().map(ShellSession::mode)
    }

    fn kind(&self) -> TransportKind {
        TransportKind::Ssh
    }
}
