//! Error types for transport, session and catalog operations.
//!
//! The whole session/command API surface reports failures through a single
//! [`Error`] enum instead of mixing exceptions with `(success, message)`
//! tuples. The taxonomy follows where the failure originates: configuration,
//! connection establishment, single-command execution, or catalog lookups.

use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring, connecting to, or driving a
/// switch CLI session.
#[derive(Error, Debug)]
pub enum Error {
    /// A configuration document could not be read or parsed.
    ///
    /// Raised at startup; fatal to the run.
    #[error("configuration error: {0}")]
    Config(String),

    /// A required field is missing or invalid for the selected transport.
    #[error("invalid {transport} configuration: {reason}")]
    InvalidTransportConfig {
        transport: &'static str,
        reason: String,
    },

    /// The configured connection-type tag does not name a known transport.
    #[error("unsupported connection type: {0}")]
    UnsupportedTransport(String),

    /// The transport failed to open or authenticate the session.
    #[error("connection error: {0}")]
    Connect(String),

    /// An operation was attempted on a transport that is not connected.
    #[error("not connected to switch")]
    NotConnected,

    /// No recognized prompt appeared within the deadline.
    ///
    /// Carries whatever partial output was collected before the timeout so
    /// callers can log or inspect it.
    #[error("timeout waiting for prompt; partial output: {partial:?}")]
    PromptTimeout { partial: String },

    /// A single command failed to send, decode, or reach the expected
    /// prompt. Not fatal to the session.
    #[error("command '{command}' failed: {reason}")]
    Command { command: String, reason: String },

    /// The device refused to enter privileged (enable) mode.
    #[error("failed to enter enable mode")]
    EnableModeFailed,

    /// The device refused to enter global configuration mode.
    #[error("failed to enter configuration mode")]
    ConfigModeFailed,

    /// A (category, name) pair is absent from the command catalog.
    #[error("command {category}.{name} not found in catalog")]
    CommandNotFound { category: String, name: String },

    /// A command template references a parameter the caller did not supply.
    #[error("missing required parameter '{0}'")]
    MissingParameter(String),

    /// The catalog file could not be loaded or persisted.
    #[error("catalog error: {0}")]
    Catalog(String),

    /// A regex stored in the catalog failed to compile.
    #[error("invalid parse pattern for {category}.{name}: {source}")]
    InvalidParsePattern {
        category: String,
        name: String,
        source: regex::Error,
    },

    /// A feature-level check on device output did not hold.
    #[error("verification failed: {0}")]
    Verification(String),

    /// An error surfaced by the SSH client library.
    #[error("ssh error: {0}")]
    Ssh(#[from] async_ssh2_tokio::Error),

    /// An error surfaced by the underlying russh channel.
    #[error("russh error: {0}")]
    Russh(#[from] russh::Error),

    /// An error surfaced by the serial port layer.
    #[error("serial error: {0}")]
    Serial(#[from] tokio_serial::Error),

    /// A socket-level I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wraps a failure of a specific command, keeping the command text for
    /// diagnostics.
    pub fn command(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Command {
            command: command.into(),
            reason: reason.into(),
        }
    }
}
