//! Core types for recorded test outcomes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Final status of one test execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
}

impl TestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Passed => "passed",
            TestStatus::Failed => "failed",
            TestStatus::Skipped => "skipped",
        }
    }
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TestStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "passed" | "pass" => Ok(TestStatus::Passed),
            "failed" | "fail" => Ok(TestStatus::Failed),
            "skipped" | "skip" => Ok(TestStatus::Skipped),
            other => Err(format!("unknown test status: {}", other)),
        }
    }
}

/// Immutable result of one completed test execution.
///
/// Serialized with the field names used by `test-metrics.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestOutcome {
    pub test_name: String,
    pub status: TestStatus,
    #[serde(rename = "duration")]
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,
}

impl TestOutcome {
    /// Create an outcome stamped with the current time
    pub fn new(test_name: impl Into<String>, status: TestStatus, duration_ms: u64) -> Self {
        Self {
            test_name: test_name.into(),
            status,
            duration_ms,
            error: None,
            timestamp: Utc::now(),
            retries: None,
        }
    }

    pub fn passed(test_name: impl Into<String>, duration_ms: u64) -> Self {
        Self::new(test_name, TestStatus::Passed, duration_ms)
    }

    pub fn failed(test_name: impl Into<String>, duration_ms: u64, error: impl Into<String>) -> Self {
        Self::new(test_name, TestStatus::Failed, duration_ms).with_error(error)
    }

    pub fn skipped(test_name: impl Into<String>) -> Self {
        Self::new(test_name, TestStatus::Skipped, 0)
    }

    /// Attach an error message. Ignored unless the outcome is a failure.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        if self.status == TestStatus::Failed {
            self.error = Some(error.into());
        }
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Running tally of passed/failed executions for one test name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlakinessCounter {
    pub total: u64,
    pub failures: u64,
}

impl FlakinessCounter {
    /// Count one execution. Skipped outcomes are not counted.
    pub fn observe(&mut self, status: TestStatus) {
        match status {
            TestStatus::Passed => self.total += 1,
            TestStatus::Failed => {
                self.total += 1;
                self.failures += 1;
            }
            TestStatus::Skipped => {}
        }
    }

    pub fn failure_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.failures as f64 / self.total as f64
        }
    }
}

/// Aggregate counts over every recorded outcome
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total: usize,
    pub average_duration_ms: f64,
    /// Percentage in `0.0..=100.0`
    pub pass_rate: f64,
}

/// A test whose failure rate marks it as flaky
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlakyTest {
    pub name: String,
    pub rate: f64,
    pub total_runs: u64,
}

/// A passing execution ranked by duration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlowTest {
    pub name: String,
    pub duration_ms: u64,
}
