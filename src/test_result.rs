//! Result of a complete property run.

use std::fmt;
use std::time::Duration;

use crate::prop_result::PropResult;

/// Terminal status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestStatus {
    /// The success quota was reached
    Passed,
    /// The property was proved for all inputs
    Proved,
    /// A falsifying input was found (check returned false, an error, or panicked)
    Failed,
    /// Too many discards to reach the success quota
    Exhausted,
    /// The property could not be run at all
    Error,
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TestStatus::Passed => "PASSED",
            TestStatus::Proved => "PROVED",
            TestStatus::Failed => "FAILED",
            TestStatus::Exhausted => "EXHAUSTED",
            TestStatus::Error => "ERROR",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct TestResult {
    pub status: TestStatus,
    pub succeeded: usize,
    pub discarded: usize,
    /// Outcome of the falsifying evaluation, with shrunk and original arguments
    pub prop_result: Option<PropResult>,
    pub error: Option<String>,
    pub error_stack: Option<String>,
    /// Successful iterations of the failing worker before it falsified the property
    pub passed_before_failure: usize,
    pub time: Duration,
    pub seed: u64,
}

impl TestResult {
    pub(crate) fn new(status: TestStatus, seed: u64) -> Self {
        Self {
            status,
            succeeded: 0,
            discarded: 0,
            prop_result: None,
            error: None,
            error_stack: None,
            passed_before_failure: 0,
            time: Duration::ZERO,
            seed,
        }
    }

    /// Passed or proved
    pub fn passed(&self) -> bool {
        matches!(self.status, TestStatus::Passed | TestStatus::Proved)
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            TestStatus::Passed => write!(f, "+ OK, passed {} tests.", self.succeeded),
            TestStatus::Proved => write!(f, "+ OK, proved property."),
            TestStatus::Exhausted => write!(
                f,
                "! Gave up after only {} passed tests. {} tests were discarded.",
                self.succeeded, self.discarded
            ),
            TestStatus::Failed => {
                write!(
                    f,
                    "! Falsified after {} passed tests.",
                    self.passed_before_failure
                )?;
                if let Some(result) = &self.prop_result {
                    write!(f, "\n{}", result)?;
                }
                Ok(())
            }
            TestStatus::Error => write!(
                f,
                "! Error: {}",
                self.error.as_deref().unwrap_or("unknown error")
            ),
        }?;
        write!(f, " (seed {})", self.seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let mut result = TestResult::new(TestStatus::Passed, 9);
        result.succeeded = 100;
        assert_eq!(result.to_string(), "+ OK, passed 100 tests. (seed 9)");
        assert!(result.passed());

        let mut result = TestResult::new(TestStatus::Failed, 9);
        result.passed_before_failure = 3;
        assert!(result.to_string().starts_with("! Falsified after 3 passed tests."));
        assert!(!result.passed());
    }
}
