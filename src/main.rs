use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use flexi_logger::{Cleanup, Criterion, Duplicate, FileSpec, Logger, Naming};
use log::{error, info, warn};

use l2probe::api::SwitchApi;
use l2probe::catalog::CommandCatalog;
use l2probe::config::{AppConfig, TransportKind};
use l2probe::manager::ConnectionManager;
use l2probe::suites::{self, Suite};

/// Runs L2/L3 feature test suites against a switch over SSH, Telnet or a
/// serial console.
#[derive(Debug, Parser)]
#[command(name = "l2probe", version, about)]
struct Args {
    /// Path to the YAML configuration file.
    #[arg(long, default_value = "config/config.yaml")]
    config: PathBuf,

    /// Path to the JSON command catalog.
    #[arg(long, default_value = "config/switch_commands.json")]
    catalog: PathBuf,

    /// Override the configured connection type (ssh, telnet or serial).
    #[arg(long)]
    connection_type: Option<String>,

    /// Suite to run; repeatable. All suites run when omitted.
    #[arg(long = "suite", value_enum)]
    suites: Vec<Suite>,

    /// Log at debug level instead of info.
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) -> anyhow::Result<flexi_logger::LoggerHandle> {
    let level = if verbose { "debug" } else { "info" };
    let handle = Logger::try_with_env_or_str(level)?
        .log_to_file(FileSpec::default().directory("logs").basename("l2probe"))
        .rotate(
            Criterion::Size(10 * 1024 * 1024),
            Naming::Timestamps,
            Cleanup::KeepLogFiles(5),
        )
        .duplicate_to_stderr(Duplicate::Info)
        .start()
        .context("failed to initialize logging")?;
    Ok(handle)
}

async fn run(args: &Args) -> anyhow::Result<bool> {
    let config = AppConfig::load(&args.config)?;
    let catalog = CommandCatalog::load(&args.catalog)?;

    let manager = match &args.connection_type {
        Some(kind) => {
            let kind: TransportKind = kind.parse()?;
            ConnectionManager::with_kind(config.switch.clone(), kind)
        }
        None => ConnectionManager::new(config.switch.clone()),
    };
    info!("using {} transport", manager.kind());

    let mut api = SwitchApi::new(manager, catalog);
    let outcome = drive(&mut api, &config, args).await;
    api.disconnect().await;
    outcome
}

async fn drive(api: &mut SwitchApi, config: &AppConfig, args: &Args) -> anyhow::Result<bool> {
    match api.get_switch_info().await {
        Ok(info) => info!("device under test: {} running {}", info.model, info.version),
        Err(e) => warn!("could not read device information: {e}"),
    }

    suites::setup_test_environment(api)
        .await
        .context("test environment setup failed")?;

    let selected: Vec<Suite> = if args.suites.is_empty() {
        Suite::ALL.to_vec()
    } else {
        args.suites.clone()
    };

    let mut all_passed = true;
    for suite in selected {
        let report = suite.run(api, &config.test).await;
        print!("{report}");
        if !report.all_passed() {
            all_passed = false;
        }
    }
    Ok(all_passed)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let _logger = match init_logging(args.verbose) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("{e:#}");
            return ExitCode::FAILURE;
        }
    };

    match run(&args).await {
        Ok(true) => {
            info!("all suites passed");
            ExitCode::SUCCESS
        }
        Ok(false) => {
            error!("one or more tests failed");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("test run aborted: {e:#}");
            ExitCode::FAILURE
        }
    }
}
