//! # l2probe - L2/L3 switch feature test harness
//!
//! `l2probe` drives the interactive CLI of Cisco-IOS-style switches over
//! SSH, Telnet or a serial console and runs feature test suites against
//! them: VLANs, trunking, MAC table behavior, spanning tree, port settings
//! and basic L3 routing.
//!
//! ## Features
//!
//! - **Unified session driver**: all three transports share the same
//!   prompt-driven shell engine, so command semantics never depend on the
//!   wire protocol
//! - **Mode tracking**: user, privileged and configuration prompts are
//!   recognized and transitions handled automatically
//! - **Command catalog**: CLI command templates live in a JSON catalog with
//!   placeholder substitution, response verification and output parsing
//! - **Typed configuration**: per-transport connection parameters are
//!   validated before any I/O happens
//! - **Async/Await**: built on Tokio
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use l2probe::api::SwitchApi;
//! use l2probe::catalog::CommandCatalog;
//! use l2probe::config::AppConfig;
//! use l2probe::manager::ConnectionManager;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load("config/config.yaml")?;
//!     let catalog = CommandCatalog::load("config/switch_commands.json")?;
//!
//!     let manager = ConnectionManager::new(config.switch.clone());
//!     let mut api = SwitchApi::new(manager, catalog);
//!
//!     let info = api.get_switch_info().await?;
//!     println!("{} running {}", info.model, info.version);
//!
//!     api.create_vlan(100, Some("lab")).await?;
//!     api.disconnect().await;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod manager;
pub mod prompt;
pub mod report;
pub mod suites;
pub mod transport;

pub use error::{Error, Result};
