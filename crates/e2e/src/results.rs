//! Playwright JSON reporter output
//!
//! Only the fields needed to build outcome records are modelled; everything
//! else in the report is ignored.

use std::path::Path;

use bankqa_metrics::{TestOutcome, TestStatus};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{E2eError, E2eResult};

/// Separator Playwright uses between title path segments
pub const TITLE_SEPARATOR: &str = " › ";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaywrightReport {
    pub suites: Vec<ReportSuite>,

    #[serde(default)]
    pub errors: Vec<ReportError>,

    #[serde(default)]
    pub stats: Option<ReportStats>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportSuite {
    pub title: String,

    #[serde(default)]
    pub specs: Vec<ReportSpec>,

    #[serde(default)]
    pub suites: Vec<ReportSuite>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportSpec {
    pub title: String,

    #[serde(default)]
    pub tests: Vec<ReportTest>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTest {
    #[serde(default)]
    pub project_name: String,

    /// What the test declared it would do; `failed` for `test.fail()`
    #[serde(default)]
    pub expected_status: ResultStatus,

    #[serde(default)]
    pub results: Vec<ReportResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResult {
    pub status: ResultStatus,

    #[serde(default)]
    pub duration: f64,

    #[serde(default)]
    pub retry: u32,

    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub error: Option<ReportError>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResultStatus {
    #[default]
    Passed,
    Failed,
    TimedOut,
    Skipped,
    Interrupted,
    #[serde(other)]
    Unknown,
}

impl From<ResultStatus> for TestStatus {
    fn from(status: ResultStatus) -> Self {
        match status {
            ResultStatus::Passed => TestStatus::Passed,
            ResultStatus::Skipped => TestStatus::Skipped,
            ResultStatus::Failed
            | ResultStatus::TimedOut
            | ResultStatus::Interrupted
            | ResultStatus::Unknown => TestStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportError {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportStats {
    #[serde(default)]
    pub flaky: usize,
}

impl PlaywrightReport {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content).map_err(|e| E2eError::ReportParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// One outcome per test, taken from its final attempt, in report order
    pub fn outcomes(&self) -> Vec<TestOutcome> {
        let mut outcomes = Vec::new();
        let mut titles = Vec::new();
        for suite in &self.suites {
            collect_suite(suite, &mut titles, &mut outcomes);
        }
        outcomes
    }

    /// Tests that failed first and passed on a retry
    pub fn flaky_count(&self) -> usize {
        self.stats.as_ref().map(|s| s.flaky).unwrap_or(0)
    }
}

fn collect_suite<'a>(suite: &'a ReportSuite, titles: &mut Vec<&'a str>, out: &mut Vec<TestOutcome>) {
    let pushed = !suite.title.is_empty();
    if pushed {
        titles.push(&suite.title);
    }

    for spec in &suite.specs {
        for test in &spec.tests {
            out.push(test_outcome(titles, &spec.title, test));
        }
    }
    for child in &suite.suites {
        collect_suite(child, titles, out);
    }

    if pushed {
        titles.pop();
    }
}

fn test_outcome(titles: &[&str], spec_title: &str, test: &ReportTest) -> TestOutcome {
    let mut name = titles
        .iter()
        .copied()
        .chain(std::iter::once(spec_title))
        .collect::<Vec<_>>()
        .join(TITLE_SEPARATOR);
    if !test.project_name.is_empty() {
        name.push_str(&format!(" [{}]", test.project_name));
    }

    let Some(last) = test.results.last() else {
        // Never started, e.g. cut off by --max-failures
        return TestOutcome::skipped(name);
    };

    let duration_ms = last.duration.max(0.0).round() as u64;
    let status = final_status(test.expected_status, last.status);
    let mut outcome = TestOutcome::new(name, status, duration_ms);
    if let Some(message) = last.error.as_ref().and_then(|e| e.message.as_deref()) {
        outcome = outcome.with_error(message);
    } else if last.status == ResultStatus::TimedOut {
        outcome = outcome.with_error("Test timed out");
    } else if test.expected_status == ResultStatus::Failed && last.status == ResultStatus::Passed {
        outcome = outcome.with_error("Expected to fail, but passed");
    }
    if last.retry > 0 {
        outcome = outcome.with_retries(last.retry);
    }
    if let Some(finished) = last.start_time.and_then(|start| finished_at(start, duration_ms)) {
        outcome = outcome.with_timestamp(finished);
    }
    outcome
}

/// A result that matches the declared expectation counts as passed, so a
/// `test.fail()` that fails is green; a skip stays a skip.
fn final_status(expected: ResultStatus, actual: ResultStatus) -> TestStatus {
    match (expected, actual) {
        (_, ResultStatus::Skipped) => TestStatus::Skipped,
        (ResultStatus::Unknown, actual) => actual.into(),
        (expected, actual) if expected == actual => TestStatus::Passed,
        (ResultStatus::Passed, actual) => actual.into(),
        _ => TestStatus::Failed,
    }
}

/// `None` when the end time is outside chrono's range; the outcome then
/// keeps its ingestion timestamp.
fn finished_at(start: DateTime<Utc>, duration_ms: u64) -> Option<DateTime<Utc>> {
    let millis = i64::try_from(duration_ms).ok()?;
    start.checked_add_signed(TimeDelta::try_milliseconds(millis)?)
}
