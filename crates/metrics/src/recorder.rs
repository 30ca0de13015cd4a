//! Run recorder and flakiness aggregator

use std::cmp::Ordering;
use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::config::MetricsConfig;
use crate::error::Result;
use crate::report::DashboardReport;
use crate::store::{LoadOutcome, MetricsState, MetricsStore};
use crate::types::{FlakinessCounter, FlakyTest, RunStats, SlowTest, TestOutcome, TestStatus};

/// Default failure rate a test must exceed to count as flaky
pub const DEFAULT_FLAKY_THRESHOLD: f64 = 0.1;

/// Default number of entries returned by [`RunRecorder::slowest_tests`]
pub const DEFAULT_SLOWEST_COUNT: usize = 10;

/// Owns the outcome log and per-test counters for one process.
///
/// Construct once at startup and hand out `&mut` to whatever records
/// outcomes. Every mutation is persisted before it returns.
pub struct RunRecorder {
    config: MetricsConfig,
    store: MetricsStore,
    state: MetricsState,
}

impl RunRecorder {
    /// Open the recorder, loading persisted state if any.
    ///
    /// Unreadable or malformed state is logged and replaced by an empty log.
    pub fn open(config: MetricsConfig) -> Self {
        let store = MetricsStore::new(&config);
        let state = load_or_empty(&store);
        Self { config, store, state }
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Replace in-memory state with whatever is persisted now
    pub fn reload(&mut self) {
        self.state = load_or_empty(&self.store);
    }

    /// Append one outcome, update its counter and persist.
    pub fn record_outcome(&mut self, outcome: TestOutcome) -> Result<()> {
        match outcome.status {
            TestStatus::Failed => error!(
                test_name = %outcome.test_name,
                duration_ms = outcome.duration_ms,
                status = %outcome.status,
                error = outcome.error.as_deref().unwrap_or(""),
                "Test failed"
            ),
            TestStatus::Passed | TestStatus::Skipped => info!(
                test_name = %outcome.test_name,
                duration_ms = outcome.duration_ms,
                status = %outcome.status,
                "Test {}", outcome.status
            ),
        }

        if outcome.status != TestStatus::Skipped {
            self.state
                .counters
                .entry(outcome.test_name.clone())
                .or_default()
                .observe(outcome.status);
        }
        self.state.records.push(outcome);

        self.store.save(&self.state)
    }

    /// Start timing a test for the direct-call API
    #[deprecated(note = "record outcomes with `record_outcome` from the suite runner")]
    pub fn start_test(&self, test_name: impl Into<String>) -> TestTimer {
        TestTimer {
            test_name: test_name.into(),
            started: Instant::now(),
        }
    }

    /// Tests whose failure rate lies strictly between `threshold` and 1.0
    /// over at least `min_runs` passed/failed executions.
    ///
    /// Ordered by rate, then run count (both descending), then name.
    pub fn flaky_tests(&self, threshold: f64) -> Vec<FlakyTest> {
        let min_runs = self.config.min_runs;
        let mut flaky: Vec<FlakyTest> = self
            .state
            .counters
            .iter()
            .filter_map(|(name, counter)| {
                let rate = counter.failure_rate();
                (rate > threshold && rate < 1.0 && counter.total >= min_runs).then(|| FlakyTest {
                    name: name.clone(),
                    rate,
                    total_runs: counter.total,
                })
            })
            .collect();

        flaky.sort_by(|a, b| {
            b.rate
                .partial_cmp(&a.rate)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.total_runs.cmp(&a.total_runs))
                .then_with(|| a.name.cmp(&b.name))
        });
        flaky
    }

    pub fn stats(&self) -> RunStats {
        let records = &self.state.records;
        let total = records.len();
        if total == 0 {
            return RunStats::default();
        }

        let mut stats = RunStats {
            total,
            ..RunStats::default()
        };
        let mut duration_sum: u128 = 0;
        for record in records {
            match record.status {
                TestStatus::Passed => stats.passed += 1,
                TestStatus::Failed => stats.failed += 1,
                TestStatus::Skipped => stats.skipped += 1,
            }
            duration_sum += u128::from(record.duration_ms);
        }

        stats.average_duration_ms = duration_sum as f64 / total as f64;
        stats.pass_rate = stats.passed as f64 / total as f64 * 100.0;
        stats
    }

    /// Longest passing executions, longest first. Ties keep recording order.
    pub fn slowest_tests(&self, count: usize) -> Vec<SlowTest> {
        if count == 0 {
            return Vec::new();
        }

        let mut passed: Vec<&TestOutcome> = self
            .state
            .records
            .iter()
            .filter(|r| r.status == TestStatus::Passed)
            .collect();
        passed.sort_by(|a, b| b.duration_ms.cmp(&a.duration_ms));

        passed
            .into_iter()
            .take(count)
            .map(|r| SlowTest {
                name: r.test_name.clone(),
                duration_ms: r.duration_ms,
            })
            .collect()
    }

    /// The `count` most recently recorded outcomes, newest first
    pub fn recent(&self, count: usize) -> Vec<&TestOutcome> {
        self.state.records.iter().rev().take(count).collect()
    }

    pub fn records(&self) -> &[TestOutcome] {
        &self.state.records
    }

    pub fn counter(&self, test_name: &str) -> Option<&FlakinessCounter> {
        self.state.counters.get(test_name)
    }

    /// Drop every record and counter and persist the empty state
    pub fn clear_all(&mut self) -> Result<()> {
        warn!(
            records = self.state.records.len(),
            tests = self.state.counters.len(),
            "Clearing all recorded metrics"
        );
        self.state = MetricsState::default();
        self.store.save(&self.state)
    }

    /// Render the HTML dashboard to the configured report path
    pub fn generate_report(&self) -> Result<PathBuf> {
        let report = DashboardReport {
            generated_at: chrono::Utc::now(),
            stats: self.stats(),
            flaky: self.flaky_tests(self.config.flaky_threshold),
            slowest: self.slowest_tests(self.config.report_slowest),
            recent: self.recent(self.config.report_recent),
        };

        let path = self.config.report_path.clone();
        report.write_to(&path)?;
        info!("Metrics dashboard written to: {}", path.display());
        Ok(path)
    }
}

fn load_or_empty(store: &MetricsStore) -> MetricsState {
    match store.load() {
        LoadOutcome::Loaded(state) => {
            debug!(
                records = state.records.len(),
                tests = state.counters.len(),
                "Loaded persisted metrics"
            );
            state
        }
        LoadOutcome::Missing => {
            debug!("No persisted metrics at {}", store.records_path().display());
            MetricsState::default()
        }
        LoadOutcome::ParseError(reason) => {
            warn!("Ignoring malformed metrics, starting empty: {}", reason);
            MetricsState::default()
        }
        LoadOutcome::IoError(reason) => {
            warn!("Could not read metrics, starting empty: {}", reason);
            MetricsState::default()
        }
    }
}

/// Wall-clock timer handed out by the direct-call API
#[derive(Debug)]
pub struct TestTimer {
    test_name: String,
    started: Instant,
}

impl TestTimer {
    /// Record the timed execution with the elapsed duration
    pub fn finish(
        self,
        recorder: &mut RunRecorder,
        status: TestStatus,
        error: Option<String>,
    ) -> Result<()> {
        let duration_ms = self.started.elapsed().as_millis() as u64;
        let mut outcome = TestOutcome::new(self.test_name, status, duration_ms);
        if let Some(error) = error {
            outcome = outcome.with_error(error);
        }
        recorder.record_outcome(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use test_case::test_case;

    fn recorder(tmp: &TempDir) -> RunRecorder {
        RunRecorder::open(MetricsConfig {
            report_path: tmp.path().join("reports/metrics-dashboard.html"),
            ..MetricsConfig::in_dir(tmp.path().join("metrics"))
        })
    }

    fn record(rec: &mut RunRecorder, name: &str, status: TestStatus, duration_ms: u64) {
        let outcome = match status {
            TestStatus::Failed => TestOutcome::failed(name, duration_ms, "assertion failed"),
            _ => TestOutcome::new(name, status, duration_ms),
        };
        rec.record_outcome(outcome).unwrap();
    }

    #[test]
    fn test_total_matches_calls() {
        let tmp = TempDir::new().unwrap();
        let mut rec = recorder(&tmp);
        for i in 0..7u64 {
            let status = match i % 3 {
                0 => TestStatus::Passed,
                1 => TestStatus::Failed,
                _ => TestStatus::Skipped,
            };
            record(&mut rec, &format!("t{}", i % 2), status, i * 10);
        }

        let stats = rec.stats();
        assert_eq!(stats.total, 7);
        assert_eq!(stats.passed + stats.failed + stats.skipped, 7);
    }

    #[test]
    fn test_empty_stats_are_zero() {
        let tmp = TempDir::new().unwrap();
        let stats = recorder(&tmp).stats();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.pass_rate, 0.0);
        assert_eq!(stats.average_duration_ms, 0.0);
    }

    #[test]
    fn test_average_includes_every_status() {
        let tmp = TempDir::new().unwrap();
        let mut rec = recorder(&tmp);
        record(&mut rec, "a", TestStatus::Passed, 100);
        record(&mut rec, "b", TestStatus::Failed, 200);
        record(&mut rec, "c", TestStatus::Skipped, 300);
        record(&mut rec, "d", TestStatus::Passed, 400);

        let stats = rec.stats();
        assert_eq!(stats.average_duration_ms, 250.0);
        assert_eq!(stats.pass_rate, 50.0);
    }

    #[test]
    fn test_flaky_lifecycle() {
        let tmp = TempDir::new().unwrap();
        let mut rec = recorder(&tmp);
        record(&mut rec, "account-overview", TestStatus::Failed, 10);
        record(&mut rec, "account-overview", TestStatus::Passed, 10);
        record(&mut rec, "account-overview", TestStatus::Passed, 10);

        let flaky = rec.flaky_tests(DEFAULT_FLAKY_THRESHOLD);
        assert_eq!(flaky.len(), 1);
        assert!((flaky[0].rate - 1.0 / 3.0).abs() < 1e-9);

        record(&mut rec, "account-overview", TestStatus::Failed, 10);
        let flaky = rec.flaky_tests(DEFAULT_FLAKY_THRESHOLD);
        assert_eq!(flaky[0].rate, 0.5);
        assert_eq!(flaky[0].total_runs, 4);
    }

    #[test]
    fn test_always_failing_is_not_flaky() {
        let tmp = TempDir::new().unwrap();
        let mut rec = recorder(&tmp);
        for _ in 0..4 {
            record(&mut rec, "find-transactions", TestStatus::Failed, 10);
        }
        assert!(rec.flaky_tests(DEFAULT_FLAKY_THRESHOLD).is_empty());
    }

    #[test_case(TestStatus::Failed, TestStatus::Passed; "one failure")]
    #[test_case(TestStatus::Failed, TestStatus::Failed; "two failures")]
    #[test_case(TestStatus::Passed, TestStatus::Failed; "late failure")]
    fn test_two_runs_never_flaky(first: TestStatus, second: TestStatus) {
        let tmp = TempDir::new().unwrap();
        let mut rec = recorder(&tmp);
        record(&mut rec, "update-profile", first, 10);
        record(&mut rec, "update-profile", second, 10);
        assert!(rec.flaky_tests(-1.0).is_empty());
    }

    #[test]
    fn test_skipped_does_not_count_toward_runs() {
        let tmp = TempDir::new().unwrap();
        let mut rec = recorder(&tmp);
        record(&mut rec, "request-loan", TestStatus::Failed, 10);
        record(&mut rec, "request-loan", TestStatus::Passed, 10);
        record(&mut rec, "request-loan", TestStatus::Skipped, 10);

        assert_eq!(rec.counter("request-loan"), Some(&FlakinessCounter { total: 2, failures: 1 }));
        assert!(rec.flaky_tests(DEFAULT_FLAKY_THRESHOLD).is_empty());
        assert_eq!(rec.stats().total, 3);
    }

    #[test]
    fn test_flaky_order_and_ties() {
        let tmp = TempDir::new().unwrap();
        let mut rec = recorder(&tmp);
        let pattern = |rec: &mut RunRecorder, name: &str, fails: usize, passes: usize| {
            for _ in 0..fails {
                record(rec, name, TestStatus::Failed, 1);
            }
            for _ in 0..passes {
                record(rec, name, TestStatus::Passed, 1);
            }
        };
        pattern(&mut rec, "zeta", 1, 2);
        pattern(&mut rec, "alpha", 1, 2);
        pattern(&mut rec, "beta", 2, 4);
        pattern(&mut rec, "gamma", 3, 1);

        let names: Vec<String> = rec
            .flaky_tests(DEFAULT_FLAKY_THRESHOLD)
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["gamma", "beta", "alpha", "zeta"]);
    }

    #[test]
    fn test_threshold_extremes() {
        let tmp = TempDir::new().unwrap();
        let mut rec = recorder(&tmp);
        for status in [TestStatus::Passed, TestStatus::Passed, TestStatus::Passed] {
            record(&mut rec, "always-green", status, 1);
        }
        for status in [TestStatus::Failed, TestStatus::Passed, TestStatus::Passed] {
            record(&mut rec, "sometimes-red", status, 1);
        }

        // rate > threshold holds for a 0% rate once the threshold is negative
        let negative = rec.flaky_tests(-0.5);
        assert_eq!(negative.len(), 2);
        assert_eq!(negative[0].name, "sometimes-red");
        assert_eq!(negative[1].name, "always-green");
        assert_eq!(rec.flaky_tests(0.0).len(), 1);
        assert!(rec.flaky_tests(1.0).is_empty());
    }

    #[test]
    fn test_slowest_only_passed() {
        let tmp = TempDir::new().unwrap();
        let mut rec = recorder(&tmp);
        record(&mut rec, "slow-fail", TestStatus::Failed, 9000);
        record(&mut rec, "slow-skip", TestStatus::Skipped, 8000);
        record(&mut rec, "transfer", TestStatus::Passed, 300);
        record(&mut rec, "bill-pay", TestStatus::Passed, 700);
        record(&mut rec, "statements", TestStatus::Passed, 500);

        let slowest = rec.slowest_tests(2);
        assert_eq!(
            slowest,
            vec![
                SlowTest { name: "bill-pay".into(), duration_ms: 700 },
                SlowTest { name: "statements".into(), duration_ms: 500 },
            ]
        );
        assert_eq!(rec.slowest_tests(DEFAULT_SLOWEST_COUNT).len(), 3);
        assert!(rec.slowest_tests(0).is_empty());
    }

    #[test]
    fn test_slowest_ties_keep_recording_order() {
        let tmp = TempDir::new().unwrap();
        let mut rec = recorder(&tmp);
        record(&mut rec, "first", TestStatus::Passed, 100);
        record(&mut rec, "second", TestStatus::Passed, 100);

        let names: Vec<String> = rec.slowest_tests(2).into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn test_login_flow_scenario() {
        let tmp = TempDir::new().unwrap();
        let mut rec = recorder(&tmp);
        record(&mut rec, "login-flow", TestStatus::Failed, 1200);
        record(&mut rec, "login-flow", TestStatus::Passed, 900);
        record(&mut rec, "login-flow", TestStatus::Passed, 800);

        assert_eq!(rec.counter("login-flow"), Some(&FlakinessCounter { total: 3, failures: 1 }));
        let flaky = rec.flaky_tests(DEFAULT_FLAKY_THRESHOLD);
        assert_eq!(flaky.len(), 1);
        assert_eq!(flaky[0].name, "login-flow");
        assert_eq!(
            rec.slowest_tests(1),
            vec![SlowTest { name: "login-flow".into(), duration_ms: 900 }]
        );
    }

    #[test]
    fn test_clear_all_resets_everything() {
        let tmp = TempDir::new().unwrap();
        let mut rec = recorder(&tmp);
        for status in [TestStatus::Failed, TestStatus::Passed, TestStatus::Passed] {
            record(&mut rec, "open-account", status, 50);
        }

        rec.clear_all().unwrap();

        assert_eq!(rec.stats(), RunStats::default());
        assert!(rec.flaky_tests(DEFAULT_FLAKY_THRESHOLD).is_empty());
        assert!(rec.slowest_tests(DEFAULT_SLOWEST_COUNT).is_empty());

        let reopened = recorder(&tmp);
        assert!(reopened.records().is_empty());
    }

    #[test]
    fn test_recent_is_newest_first() {
        let tmp = TempDir::new().unwrap();
        let mut rec = recorder(&tmp);
        for i in 0..5 {
            record(&mut rec, &format!("t{}", i), TestStatus::Passed, i);
        }

        let names: Vec<&str> = rec.recent(3).iter().map(|r| r.test_name.as_str()).collect();
        assert_eq!(names, vec!["t4", "t3", "t2"]);
    }

    #[test]
    fn test_malformed_state_starts_empty() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("metrics");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("test-metrics.json"), "not json at all").unwrap();

        let mut rec = recorder(&tmp);
        assert!(rec.records().is_empty());

        record(&mut rec, "contact-form", TestStatus::Passed, 5);
        assert_eq!(recorder(&tmp).records().len(), 1);
    }

    #[test]
    fn test_unreadable_state_starts_empty() {
        let tmp = TempDir::new().unwrap();
        let mut seeded = recorder(&tmp);
        record(&mut seeded, "open-account", TestStatus::Passed, 5);

        let records_path = tmp.path().join("metrics").join("test-metrics.json");
        std::fs::remove_file(&records_path).unwrap();
        std::fs::create_dir(&records_path).unwrap();

        let rec = recorder(&tmp);
        assert!(matches!(rec.store.load(), LoadOutcome::IoError(_)));
        assert!(rec.records().is_empty());
        assert!(rec.counter("open-account").is_none());
        assert_eq!(rec.stats(), RunStats::default());
    }

    #[test]
    fn test_write_failure_propagates() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, "file, not a directory").unwrap();

        let mut rec = RunRecorder::open(MetricsConfig::in_dir(blocker.join("metrics")));
        let result = rec.record_outcome(TestOutcome::passed("login-flow", 1));
        assert!(result.is_err());
    }

    #[test]
    #[allow(deprecated)]
    fn test_direct_call_timer_records_outcome() {
        let tmp = TempDir::new().unwrap();
        let mut rec = recorder(&tmp);

        let timer = rec.start_test("customer-lookup");
        std::thread::sleep(std::time::Duration::from_millis(5));
        timer
            .finish(&mut rec, TestStatus::Failed, Some("no match".to_string()))
            .unwrap();

        let record = &rec.records()[0];
        assert_eq!(record.test_name, "customer-lookup");
        assert_eq!(record.error.as_deref(), Some("no match"));
        assert!(record.duration_ms >= 5);
        assert_eq!(rec.counter("customer-lookup").unwrap().failures, 1);
    }

    #[test]
    fn test_generate_report_overwrites_path() {
        let tmp = TempDir::new().unwrap();
        let mut rec = recorder(&tmp);
        record(&mut rec, "login-flow", TestStatus::Passed, 900);

        let path = rec.generate_report().unwrap();
        let first = std::fs::read_to_string(&path).unwrap();
        assert!(first.contains("login-flow"));

        rec.clear_all().unwrap();
        let again = rec.generate_report().unwrap();
        assert_eq!(path, again);
        let second = std::fs::read_to_string(&again).unwrap();
        assert!(!second.contains("login-flow"));
    }
}
