//! Serial console transport.
//!
//! The console is the one transport expected to reach privileged mode:
//! console sessions are used for recovery and initial bring-up, so a
//! connection that cannot escalate is treated as failed. On connect the
//! driver flushes the port, pulses a break to wake the line, then walks the
//! usual login prompts.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use tokio_serial::{
    ClearBuffer, DataBits, FlowControl, Parity, SerialPort, SerialStream, StopBits,
};

use crate::config::{ParitySetting, SerialConfig, TransportKind};
use crate::error::{Error, Result};
use crate::transport::shell::{DeviceMode, ShellLink, ShellSession};
use crate::transport::Transport;

pub struct SerialTransport {
    config: SerialConfig,
    session: Option<ShellSession>,
}

impl SerialTransport {
    pub fn new(config: SerialConfig) -> SerialTransport {
        SerialTransport {
            config,
            session: None,
        }
    }

    fn session_mut(&mut self) -> Result<&mut ShellSession> {
        self.session.as_mut().ok_or(Error::NotConnected)
    }

    fn data_bits(&self) -> DataBits {
        match self.config.bytesize {
            5 => DataBits::Five,
            6 => DataBits::Six,
            7 => DataBits::Seven,
            _ => DataBits::Eight,
        }
    }

    fn parity(&self) -> Parity {
        match self.config.parity {
            ParitySetting::None => Parity::None,
            ParitySetting::Even => Parity::Even,
            ParitySetting::Odd => Parity::Odd,
        }
    }

    fn stop_bits(&self) -> StopBits {
        match self.config.stopbits {
            2 => StopBits::Two,
            _ => StopBits::One,
        }
    }

    fn flow_control(&self) -> FlowControl {
        if self.config.xonxoff {
            FlowControl::Software
        } else if self.config.rtscts {
            FlowControl::Hardware
        } else {
            FlowControl::None
        }
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn connect(&mut self) -> Result<()> {
        self.config.validate()?;
        debug!(
            "opening serial console on {} at {} baud",
            self.config.port, self.config.baudrate
        );

        let builder = tokio_serial::new(&self.config.port, self.config.baudrate)
            .data_bits(self.data_bits())
            .parity(self.parity())
            .stop_bits(self.stop_bits())
            .flow_control(self.flow_control())
            .timeout(Duration::from_millis(100));
        let stream = SerialStream::open(&builder)?;

        // Flush whatever the line accumulated, then pulse a break so an
        // idle console wakes up and reprints its prompt.
        stream.clear(ClearBuffer::All)?;
        stream.set_break()?;
        tokio::time::sleep(Duration::from_millis(300)).await;
        stream.clear_break()?;

        let link = ShellLink::spawn(stream);
        let mut session = ShellSession::new(link, self.config.timeout()).require_enable();

        session.link().send_raw("\r\n\r\n").await?;
        session.login(None, None).await?;

        // Privileged mode is mandatory on the console.
        session.enter_enable().await?;
        session.prepare_terminal().await?;

        info!("serial console on {} ready", self.config.port);
        self.session = Some(session);
        Ok(())
    }

    async fn disconnect(&mut self) {
        if let Some(session) = self.session.take() {
            session.close().await;
            debug!("serial console on {} closed", self.config.port);
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
        TransportKind::Serial
    }
}
