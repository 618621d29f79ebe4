//! Prompt-driven interactive shell session shared by every transport.
//!
//! A transport hands its byte stream to a [`ShellLink`], which bridges it to
//! a pair of mpsc channels through a background I/O task. [`ShellSession`]
//! then drives the CLI on top of that link: login negotiation, privilege
//! escalation, mode tracking, and per-command prompt waits all live here so
//! SSH, Telnet and serial sessions behave identically.

use std::time::Duration;

use log::{debug, trace, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::error::{Error, Result};
use crate::prompt::{self, Prompt, INITIAL_PROMPTS};

/// CLI privilege mode, as tracked from the prompts the device shows us.
/// Interface and VLAN sub-configuration prompts are folded into `Config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceMode {
    User,
    Enable,
    Config,
}

/// Channel bridge over a transport's byte stream. The background task owns
/// the stream; the session side only sees strings.
pub struct ShellLink {
    to_device: Sender<String>,
    from_device: Receiver<String>,
    io_task: JoinHandle<()>,
}

impl ShellLink {
    /// Spawns the I/O task over any duplex byte stream. Used by the serial
    /// and Telnet transports; SSH builds its link from the russh channel
    /// via [`ShellLink::from_parts`].
    pub fn spawn<S>(stream: S) -> ShellLink
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let (to_device, mut from_user) = mpsc::channel::<String>(256);
        let (to_user, from_device) = mpsc::channel::<String>(256);

        let io_task = tokio::spawn(async move {
            let (mut reader, mut writer) = tokio::io::split(stream);
            let mut buf = [0u8; 1024];
            loop {
                tokio::select! {
                    outbound = from_user.recv() => {
                        let Some(data) = outbound else { break };
                        if writer.write_all(data.as_bytes()).await.is_err() {
                            break;
                        }
                        let _ = writer.flush().await;
                    }
                    inbound = reader.read(&mut buf) => {
                        match inbound {
                            Ok(0) | Err(_) => break,
                            Ok(n) => {
                                let chunk = String::from_utf8_lossy(&buf[..n]).into_owned();
                                if to_user.send(chunk).await.is_err() {
                                    break;
                                }
                            }
                        }
                    }
                }
            }
            debug!("shell I/O task ended");
        });

        ShellLink {
            to_device,
            from_device,
            io_task,
        }
    }

    /// Wraps an externally spawned bridge task and its channel pair.
    pub fn from_parts(
        to_device: Sender<String>,
        from_device: Receiver<String>,
        io_task: JoinHandle<()>,
    ) -> ShellLink {
        ShellLink {
            to_device,
            from_device,
            io_task,
        }
    }

    /// Sends a line of input followed by a newline.
    pub async fn send_line(&self, text: &str) -> Result<()> {
        self.send_raw(&format!("{text}\n")).await
    }

    /// Sends bytes exactly as given.
    pub async fn send_raw(&self, text: &str) -> Result<()> {
        self.to_device
            .send(text.to_string())
            .await
            .map_err(|_| Error::NotConnected)
    }

    /// Discards everything already buffered from the device, returning it
    /// for tracing.
    pub fn drain(&mut self) -> String {
        let mut stale = String::new();
        while let Ok(chunk) = self.from_device.try_recv() {
            stale.push_str(&chunk);
        }
        if !stale.is_empty() {
            trace!("drained stale output: {stale:?}");
        }
        stale
    }

    /// Accumulates device output until one of `wanted` prompts appears, or
    /// the deadline passes. Returns the collected output and the prompt
    /// that ended the wait.
    pub async fn read_until(
        &mut self,
        wanted: &[Prompt],
        timeout: Duration,
    ) -> Result<(String, Prompt)> {
        let deadline = Instant::now() + timeout;
        let mut buffer = String::new();
        loop {
            if let Some(found) = prompt::find_first(&buffer, wanted) {
                trace!("matched {found:?} in {buffer:?}");
                return Ok((buffer, found));
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(Error::PromptTimeout { partial: buffer });
            }
            match tokio::time::timeout(remaining, self.from_device.recv()).await {
                Ok(Some(chunk)) => buffer.push_str(&chunk),
                Ok(None) => return Err(Error::NotConnected),
                Err(_) => return Err(Error::PromptTimeout { partial: buffer }),
            }
        }
    }

    /// Stops the background I/O task, dropping the underlying stream.
    pub fn close(&self) {
        self.io_task.abort();
    }
}

impl Drop for ShellLink {
    fn drop(&mut self) {
        self.io_task.abort();
    }
}

/// Interactive CLI session layered over a [`ShellLink`].
pub struct ShellSession {
    link: ShellLink,
    mode: DeviceMode,
    timeout: Duration,
    /// Sent when the device asks `Password:` during `enable`. A session
    /// without one answers with a bare newline.
    enable_password: Option<String>,
    /// When set, a command that cannot reach privileged mode fails instead
    /// of falling back to user mode.
    enable_required: bool,
    /// Remembers a failed escalation so user-mode commands do not retry
    /// `enable` before every command.
    enable_failed: bool,
}

impl ShellSession {
    pub fn new(link: ShellLink, timeout: Duration) -> ShellSession {
        ShellSession {
            link,
            mode: DeviceMode::User,
            timeout,
            enable_password: None,
            enable_required: false,
            enable_failed: false,
        }
    }

    pub fn with_enable_password(mut self, password: Option<String>) -> ShellSession {
        self.enable_password = password;
        self
    }

    pub fn require_enable(mut self) -> ShellSession {
        self.enable_required = true;
        self
    }

    pub fn mode(&self) -> DeviceMode {
        self.mode
    }

    pub fn link(&mut self) -> &mut ShellLink {
        &mut self.link
    }

    /// Steps through the device's login sequence until a CLI prompt is
    /// reached: banners, the initial configuration dialog, and username or
    /// password prompts are each answered in turn.
    pub async fn login(&mut self, username: Option<&str>, password: Option<&str>) -> Result<()> {
        for _ in 0..8 {
            let (_, found) = self.link.read_until(INITIAL_PROMPTS, self.timeout).await?;
            match found {
                Prompt::PressReturn => self.link.send_line("").await?,
                Prompt::InitialDialog => self.link.send_line("no").await?,
                Prompt::Username => {
                    let Some(user) = username else {
                        return Err(Error::Connect(
                            "device requested a username but none is configured".to_string(),
                        ));
                    };
                    self.link.send_line(user).await?;
                }
                Prompt::Password => {
                    // A bare newline covers lines with no password set.
                    self.link.send_line(password.unwrap_or("")).await?;
                }
                Prompt::User => {
                    self.mode = DeviceMode::User;
                    return Ok(());
                }
                Prompt::Enable => {
                    self.mode = DeviceMode::Enable;
                    return Ok(());
                }
                other => {
                    warn!("unexpected prompt during login: {other:?}");
                }
            }
        }
        Err(Error::Connect(
            "login did not reach a CLI prompt".to_string(),
        ))
    }

    /// Escalates from user to privileged mode. A failure is remembered so
    /// later commands do not retry `enable` every time.
    pub async fn enter_enable(&mut self) -> Result<()> {
        if self.mode != DeviceMode::User {
            return Ok(());
        }
        match self.escalate().await {
            Ok(()) => {
                self.mode = DeviceMode::Enable;
                debug!("entered privileged mode");
                Ok(())
            }
            Err(e) => {
                self.enable_failed = true;
                Err(e)
            }
        }
    }

    async fn escalate(&mut self) -> Result<()> {
        self.link.drain();
        self.link.send_line("enable").await?;
        let (_, found) = self
            .link
            .read_until(&[Prompt::Enable, Prompt::Password], self.timeout)
            .await
            .map_err(|e| match e {
                Error::PromptTimeout { .. } => Error::EnableModeFailed,
                other => other,
            })?;
        if found == Prompt::Password {
            let secret = self.enable_password.clone().unwrap_or_default();
            self.link.send_line(&secret).await?;
            self.link
                .read_until(&[Prompt::Enable], self.timeout)
                .await
                .map_err(|e| match e {
                    Error::PromptTimeout { .. } => Error::EnableModeFailed,
                    other => other,
                })?;
        }
        Ok(())
    }

    /// Disables pagination so `show` output arrives in one piece.
    pub async fn prepare_terminal(&mut self) -> Result<()> {
        self.run_command("terminal length 0").await?;
        self.run_command("terminal width 0").await?;
        Ok(())
    }

    /// Runs one CLI command and returns its output with the echoed command
    /// line and the trailing prompt stripped.
    pub async fn run_command(&mut self, command: &str) -> Result<String> {
        self.run_command_with_timeout(command, self.timeout).await
    }

    pub async fn run_command_with_timeout(
        &mut self,
        command: &str,
        timeout: Duration,
    ) -> Result<String> {
        let command = command.trim_end();

        if self.mode == DeviceMode::User && !self.enable_failed && !matches!(command, "quit" | "exit")
        {
            if let Err(e) = self.enter_enable().await {
                if self.enable_required {
                    return Err(e);
                }
                warn!("could not enter privileged mode, running in user mode: {e}");
            }
        }

        if command == "configure terminal" || command == "conf t" {
            return self.enter_config(timeout).await.map(|_| String::new());
        }

        self.link.drain();
        self.link.send_line(command).await?;

        let wanted: &[Prompt] = match self.mode {
            DeviceMode::User => &[Prompt::User, Prompt::Enable],
            DeviceMode::Enable => &[Prompt::Enable],
            DeviceMode::Config => &[
                Prompt::InterfaceConfig,
                Prompt::VlanConfig,
                Prompt::Config,
                Prompt::SubConfig,
                Prompt::Enable,
            ],
        };
        let (output, found) = self
            .link
            .read_until(wanted, timeout)
            .await
            .map_err(|e| match e {
                Error::PromptTimeout { partial } => Error::command(
                    command,
                    format!("timed out waiting for prompt; partial output: {partial:?}"),
                ),
                other => other,
            })?;

        // `end` and `exit` land back at the privileged prompt.
        if self.mode == DeviceMode::Config && found == Prompt::Enable {
            self.mode = DeviceMode::Enable;
        }
        if self.mode == DeviceMode::User && found == Prompt::Enable {
            self.mode = DeviceMode::Enable;
        }

        Ok(clean_output(command, &output))
    }

    async fn enter_config(&mut self, timeout: Duration) -> Result<()> {
        if self.mode == DeviceMode::Config {
            return Ok(());
        }
        self.link.drain();
        self.link.send_line("configure terminal").await?;
        self.link
            .read_until(&[Prompt::Config], timeout)
            .await
            .map_err(|e| match e {
                Error::PromptTimeout { .. } => Error::ConfigModeFailed,
                other => other,
            })?;
        self.mode = DeviceMode::Config;
        debug!("entered configuration mode");
        Ok(())
    }

    /// Best-effort teardown: leave configuration mode, restore pagination,
    /// then stop the I/O task. Never fails.
    pub async fn close(self) {
        if self.mode == DeviceMode::Config {
            let _ = self.link.send_line("end").await;
        }
        let _ = self.link.send_line("terminal length 24").await;
        // Give the writes a moment to flush before the task is dropped.
        tokio::time::sleep(Duration::from_millis(100)).await;
        self.link.close();
    }
}

/// Strips the echoed command line and the trailing prompt line from raw
/// session output.
fn clean_output(command: &str, raw: &str) -> String {
    let mut lines: Vec<&str> = raw.lines().collect();

    if lines.first().is_some_and(|first| first.trim() == command.trim()) {
        lines.remove(0);
    }
    while let Some(last) = lines.last().copied() {
        let trimmed = last.trim();
        if trimmed.is_empty() || prompt::is_mode_prompt(trimmed) {
            lines.pop();
        } else {
            break;
        }
    }
    lines.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[test]
    fn clean_output_strips_echo_and_prompt() {
        let raw = "show vlan brief\r\nVLAN Name    Status\n1    default  active\nSwitch#";
        assert_eq!(
            clean_output("show vlan brief", raw),
            "VLAN Name    Status\n1    default  active"
        );
    }

    #[test]
    fn clean_output_keeps_plain_output() {
        let raw = "some output without a prompt";
        assert_eq!(clean_output("other", raw), "some output without a prompt");
    }

    #[test]
    fn clean_output_handles_config_prompt() {
        let raw = "vlan 10\nSwitch(config-vlan)#";
        assert_eq!(clean_output("vlan 10", raw), "");
    }

    #[tokio::test]
    async fn read_until_waits_for_prompt_across_chunks() {
        let (ours, theirs) = duplex(1024);
        let mut link = ShellLink::spawn(ours);

        let (mut device_read, mut device_write) = tokio::io::split(theirs);
        tokio::spawn(async move {
            device_write.write_all(b"partial out").await.unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
            device_write.write_all(b"put\nSwitch#").await.unwrap();
            // Keep the device side open while the test reads.
            let mut sink = [0u8; 64];
            let _ = device_read.read(&mut sink).await;
        });

        let (output, found) = link
            .read_until(&[Prompt::Enable], Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(found, Prompt::Enable);
        assert!(output.contains("partial output"));
    }

    #[tokio::test]
    async fn read_until_times_out_with_partial_output() {
        let (ours, theirs) = duplex(1024);
        let mut link = ShellLink::spawn(ours);

        let (_device_read, mut device_write) = tokio::io::split(theirs);
        device_write.write_all(b"no prompt here").await.unwrap();

        let err = link
            .read_until(&[Prompt::Enable], Duration::from_millis(100))
            .await
            .expect_err("no prompt ever arrives");
        match err {
            Error::PromptTimeout { partial } => assert!(partial.contains("no prompt here")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn drain_discards_buffered_output() {
        let (ours, theirs) = duplex(1024);
        let mut link = ShellLink::spawn(ours);

        let (_device_read, mut device_write) = tokio::io::split(theirs);
        device_write.write_all(b"stale banner text\n").await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let stale = link.drain();
        assert!(stale.contains("stale banner"));
        assert!(link.drain().is_empty());
    }
}
