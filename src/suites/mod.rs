//! Feature test suites.
//!
//! Each suite exercises one switch feature area through [`SwitchApi`] and
//! reports per-test results. A failing test never aborts its suite; the
//! remaining tests still run so one broken feature does not hide the state
//! of the others.

pub mod mac;
pub mod port;
pub mod routing;
pub mod stp;
pub mod vlan;

use std::time::Duration;

use clap::ValueEnum;
use log::{info, warn};

use crate::api::SwitchApi;
use crate::config::TestSettings;
use crate::error::{Error, Result};
use crate::report::{SuiteReport, TestResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Suite {
    Vlan,
    Mac,
    Stp,
    Port,
    Routing,
}

impl Suite {
    pub const ALL: [Suite; 5] = [Suite::Vlan, Suite::Mac, Suite::Stp, Suite::Port, Suite::Routing];

    pub fn name(self) -> &'static str {
        match self {
            Suite::Vlan => "vlan",
            Suite::Mac => "mac",
            Suite::Stp => "stp",
            Suite::Port => "port",
            Suite::Routing => "routing",
        }
    }

    pub async fn run(self, api: &mut SwitchApi, settings: &TestSettings) -> SuiteReport {
        info!("running {} suite", self.name());
        let results = match self {
            Suite::Vlan => vlan::run(api, settings).await,
            Suite::Mac => mac::run(api, settings).await,
            Suite::Stp => stp::run(api, settings).await,
            Suite::Port => port::run(api, settings).await,
            Suite::Routing => routing::run(api, settings).await,
        };
        SuiteReport::new(self.name(), results)
    }
}

/// Checks the session can reach configuration mode and returns to the
/// privileged prompt, retrying a few times. Consoles fresh out of reload
/// often reject the first attempt.
pub async fn setup_test_environment(api: &mut SwitchApi) -> Result<()> {
    const MAX_ATTEMPTS: u32 = 3;
    let mut attempt = 1;
    loop {
        let result = async {
            api.send_command("configure terminal").await?;
            api.send_command("end").await?;
            Ok::<(), Error>(())
        }
        .await;

        match result {
            Ok(()) => {
                info!("test environment ready (attempt {attempt})");
                return Ok(());
            }
            Err(e) if attempt < MAX_ATTEMPTS => {
                warn!("setup attempt {attempt} failed: {e}");
                attempt += 1;
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Maps a test body's result onto a [`TestResult`]. A verification mismatch
/// is a failure; any other error means the test could not run.
fn outcome(name: &str, result: Result<()>) -> TestResult {
    match result {
        Ok(()) => {
            info!("[PASS] {name}");
            TestResult::pass(name)
        }
        Err(Error::Verification(message)) => {
            warn!("[FAIL] {name}: {message}");
            TestResult::fail(name, message)
        }
        Err(e) => {
            warn!("[ERROR] {name}: {e}");
            TestResult::error(name, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::TestStatus;

    #[test]
    fn outcome_distinguishes_failure_from_error() {
        assert_eq!(outcome("a", Ok(())).status, TestStatus::Pass);
        assert_eq!(
            outcome("b", Err(Error::Verification("mismatch".into()))).status,
            TestStatus::Fail
        );
        assert_eq!(
            outcome("c", Err(Error::NotConnected)).status,
            TestStatus::Error
        );
    }
}
