//! Metrics configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const RECORDS_FILE: &str = "test-metrics.json";
pub const COUNTERS_FILE: &str = "flakiness.json";

/// Where metrics live and how the dashboard is rendered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Directory holding the persisted record log and counters
    pub dir: PathBuf,

    /// Output path of the HTML dashboard
    pub report_path: PathBuf,

    /// Failure rate a test must exceed to be listed as flaky
    pub flaky_threshold: f64,

    /// Minimum passed/failed executions before a test can be flaky
    pub min_runs: u64,

    /// Slowest passing tests shown on the dashboard
    pub report_slowest: usize,

    /// Most recent outcomes shown on the dashboard
    pub report_recent: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("metrics"),
            report_path: PathBuf::from("reports/metrics-dashboard.html"),
            flaky_threshold: 0.1,
            min_runs: 3,
            report_slowest: 5,
            report_recent: 10,
        }
    }
}

impl MetricsConfig {
    /// Defaults rooted at another metrics directory
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }

    pub fn records_path(&self) -> PathBuf {
        self.dir.join(RECORDS_FILE)
    }

    pub fn counters_path(&self) -> PathBuf {
        self.dir.join(COUNTERS_FILE)
    }
}
