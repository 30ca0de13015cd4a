//! Suite runner: health check, Playwright run, outcome recording

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use bankqa_metrics::{RunRecorder, TestOutcome, TestStatus};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::{E2eError, E2eResult};
use crate::playwright::{PlaywrightConfig, PlaywrightHandle};
use crate::results::PlaywrightReport;
use crate::target::TargetProbe;

/// Summary of one suite run or report ingestion
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub flaky: usize,
    pub duration_ms: u64,
    /// Outcomes that could not be persisted to the metrics store
    pub unrecorded: usize,
    pub outcomes: Vec<TestOutcome>,
}

impl SuiteResult {
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// Configuration for the suite runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub playwright: PlaywrightConfig,

    /// Path appended to the base URL for the pre-run health check
    pub health_path: String,

    /// How long to wait for the target to become healthy
    pub startup_timeout: Duration,

    /// Skip the health check entirely
    pub skip_health_check: bool,

    /// Output directory for run summaries
    pub output_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            playwright: PlaywrightConfig::default(),
            health_path: "/index.htm".to_string(),
            startup_timeout: Duration::from_secs(30),
            skip_health_check: false,
            output_dir: PathBuf::from("test-results"),
        }
    }
}

/// Runs the browser suite and feeds every outcome to a [`RunRecorder`]
pub struct SuiteRunner {
    config: RunnerConfig,
}

impl SuiteRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Check the target, run Playwright and record the results
    pub async fn run(&self, recorder: &mut RunRecorder) -> E2eResult<SuiteResult> {
        let start = Instant::now();

        if !self.config.skip_health_check {
            TargetProbe::new(
                &self.config.playwright.base_url,
                &self.config.health_path,
                self.config.startup_timeout,
            )
            .wait_until_healthy()
            .await?;
        }

        let playwright = PlaywrightHandle::new(self.config.playwright.clone()).await?;
        let run = playwright.run().await?;
        if !run.success && !run.stderr.trim().is_empty() {
            warn!("Playwright stderr:\n{}", run.stderr.trim_end());
        }

        let mut result = record_report(&run.report, recorder);
        result.duration_ms = start.elapsed().as_millis() as u64;
        log_summary(&result);
        Ok(result)
    }

    /// Record outcomes from Playwright JSON reports already on disk.
    ///
    /// `path` is a report file or a directory searched for `*.json` reports.
    /// Every report is parsed before anything is recorded. A single file that
    /// is not a report is an error; inside a directory such files are skipped.
    pub fn ingest(&self, path: &Path, recorder: &mut RunRecorder) -> E2eResult<SuiteResult> {
        let start = Instant::now();
        let reports = load_reports(path)?;

        let mut result = SuiteResult::default();
        for (report_path, report) in &reports {
            info!("Ingesting {}", report_path.display());
            merge(&mut result, record_report(report, recorder));
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        log_summary(&result);
        Ok(result)
    }

    /// Write a run summary to `<output_dir>/suite-results.json`
    pub fn write_results(&self, results: &SuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("suite-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

/// Record every outcome in `report`. Metrics write failures are logged and
/// counted but never abort the run.
pub fn record_report(report: &PlaywrightReport, recorder: &mut RunRecorder) -> SuiteResult {
    let mut result = SuiteResult {
        flaky: report.flaky_count(),
        ..SuiteResult::default()
    };

    for outcome in report.outcomes() {
        match outcome.status {
            TestStatus::Passed => result.passed += 1,
            TestStatus::Failed => result.failed += 1,
            TestStatus::Skipped => result.skipped += 1,
        }
        result.total += 1;

        if let Err(e) = recorder.record_outcome(outcome.clone()) {
            error!(test_name = %outcome.test_name, "Failed to record outcome: {}", e);
            result.unrecorded += 1;
        }
        result.outcomes.push(outcome);
    }
    result
}

fn merge(into: &mut SuiteResult, from: SuiteResult) {
    into.total += from.total;
    into.passed += from.passed;
    into.failed += from.failed;
    into.skipped += from.skipped;
    into.flaky += from.flaky;
    into.unrecorded += from.unrecorded;
    into.outcomes.extend(from.outcomes);
}

fn load_reports(path: &Path) -> E2eResult<Vec<(PathBuf, PlaywrightReport)>> {
    if path.is_file() {
        let report = PlaywrightReport::from_file(path)?;
        return Ok(vec![(path.to_path_buf(), report)]);
    }
    if !path.exists() {
        return Err(E2eError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )));
    }

    let mut candidates: Vec<PathBuf> = walkdir::WalkDir::new(path)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().map(|ext| ext == "json").unwrap_or(false))
        .map(|e| e.into_path())
        .collect();
    candidates.sort();

    let mut reports = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        match PlaywrightReport::from_file(&candidate) {
            Ok(report) => reports.push((candidate, report)),
            Err(e) => warn!("Skipping {}: {}", candidate.display(), e),
        }
    }

    if reports.is_empty() {
        return Err(E2eError::NoReports(path.to_path_buf()));
    }
    Ok(reports)
}

/// Dependency trees and hidden directories never hold reports
fn is_skipped_dir(entry: &walkdir::DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| name == "node_modules" || name.starts_with('.'))
            .unwrap_or(false)
}

fn log_summary(result: &SuiteResult) {
    info!(
        "Test Results: {} passed, {} failed, {} skipped, {} flaky ({} ms)",
        result.passed, result.failed, result.skipped, result.flaky, result.duration_ms
    );
    if result.unrecorded > 0 {
        error!("{} outcome(s) could not be written to the metrics store", result.unrecorded);
    }
}
