//! Test result types and suite-level aggregation.

use std::fmt;

use serde::Serialize;

/// Outcome of a single test case. `Error` marks a test that could not run
/// to a verdict, as opposed to one that ran and failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TestStatus {
    Pass,
    Fail,
    Error,
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TestStatus::Pass => "PASS",
            TestStatus::Fail => "FAIL",
            TestStatus::Error => "ERROR",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TestResult {
    pub name: String,
    pub status: TestStatus,
    pub message: String,
}

impl TestResult {
    pub fn pass(name: impl Into<String>) -> TestResult {
        TestResult {
            name: name.into(),
            status: TestStatus::Pass,
            message: String::new(),
        }
    }

    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> TestResult {
        TestResult {
            name: name.into(),
            status: TestStatus::Fail,
            message: message.into(),
        }
    }

    pub fn error(name: impl Into<String>, message: impl Into<String>) -> TestResult {
        TestResult {
            name: name.into(),
            status: TestStatus::Error,
            message: message.into(),
        }
    }
}

/// Results of one suite run.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub suite: String,
    pub results: Vec<TestResult>,
}

impl SuiteReport {
    pub fn new(suite: impl Into<String>, results: Vec<TestResult>) -> SuiteReport {
        SuiteReport {
            suite: suite.into(),
            results,
        }
    }

    pub fn passed(&self) -> usize {
        self.count(TestStatus::Pass)
    }

    pub fn failed(&self) -> usize {
        self.count(TestStatus::Fail)
    }

    pub fn errored(&self) -> usize {
        self.count(TestStatus::Error)
    }

    /// True when every test in the suite passed.
    pub fn all_passed(&self) -> bool {
        self.results
            .iter()
            .all(|r| r.status == TestStatus::Pass)
    }

    fn count(&self, status: TestStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {} passed, {} failed, {} errors",
            self.suite,
            self.passed(),
            self.failed(),
            self.errored()
        )?;
        for result in &self.results {
            if result.message.is_empty() {
                writeln!(f, "  [{}] {}", result.status, result.name)?;
            } else {
                writeln!(f, "  [{}] {}: {}", result.status, result.name, result.message)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_counts_statuses() {
        let report = SuiteReport::new(
            "vlan",
            vec![
                TestResult::pass("create"),
                TestResult::fail("assign", "port missing"),
                TestResult::error("trunk", "session dropped"),
            ],
        );
        assert_eq!(report.passed(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.errored(), 1);
        assert!(!report.all_passed());
    }

    #[test]
    fn display_includes_messages() {
        let report = SuiteReport::new("mac", vec![TestResult::fail("filter", "not applied")]);
        let text = report.to_string();
        assert!(text.contains("[FAIL] filter: not applied"));
        assert!(text.contains("0 passed, 1 failed"));
    }
}
