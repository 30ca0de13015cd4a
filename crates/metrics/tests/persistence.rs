use bankqa_metrics::{MetricsConfig, RunRecorder, TestOutcome, TestStatus};
use tempfile::TempDir;

fn config(tmp: &TempDir) -> MetricsConfig {
    MetricsConfig {
        report_path: tmp.path().join("reports").join("metrics-dashboard.html"),
        ..MetricsConfig::in_dir(tmp.path().join("metrics"))
    }
}

/// Reloading persisted state into a fresh recorder yields the same views.
#[test]
fn reload_preserves_derived_views() {
    let tmp = TempDir::new().expect("create temp dir");
    let mut recorder = RunRecorder::open(config(&tmp));

    let outcomes = [
        TestOutcome::failed("login-flow", 1200, "Timeout 5000ms exceeded"),
        TestOutcome::passed("login-flow", 900),
        TestOutcome::passed("login-flow", 800),
        TestOutcome::passed("transfer-funds", 2100),
        TestOutcome::failed("transfer-funds", 2500, "balance mismatch").with_retries(1),
        TestOutcome::passed("transfer-funds", 1900),
        TestOutcome::passed("transfer-funds", 2000),
        TestOutcome::skipped("download-statement"),
        TestOutcome::new("bill-pay", TestStatus::Passed, 450),
    ];
    for outcome in outcomes {
        recorder.record_outcome(outcome).expect("record outcome");
    }

    let reloaded = RunRecorder::open(config(&tmp));

    assert_eq!(recorder.stats(), reloaded.stats());
    assert_eq!(recorder.flaky_tests(0.1), reloaded.flaky_tests(0.1));
    assert_eq!(recorder.slowest_tests(10), reloaded.slowest_tests(10));
    assert_eq!(recorder.records(), reloaded.records());
}

/// Appending after a restart extends the persisted log instead of replacing it.
#[test]
fn restart_appends_to_existing_log() {
    let tmp = TempDir::new().expect("create temp dir");

    {
        let mut first = RunRecorder::open(config(&tmp));
        first.record_outcome(TestOutcome::passed("open-account", 300)).unwrap();
        first.record_outcome(TestOutcome::failed("open-account", 320, "404")).unwrap();
    }

    let mut second = RunRecorder::open(config(&tmp));
    second.record_outcome(TestOutcome::passed("open-account", 310)).unwrap();

    let counter = second.counter("open-account").copied().expect("counter exists");
    assert_eq!(counter.total, 3);
    assert_eq!(counter.failures, 1);
    assert_eq!(second.flaky_tests(0.1).len(), 1);
    assert_eq!(RunRecorder::open(config(&tmp)).stats().total, 3);
}

/// Two recorders over the same directory do not merge: the last save wins.
#[test]
fn last_writer_wins_across_recorders() {
    let tmp = TempDir::new().expect("create temp dir");
    let mut worker_a = RunRecorder::open(config(&tmp));
    let mut worker_b = RunRecorder::open(config(&tmp));

    worker_a.record_outcome(TestOutcome::passed("worker-a-test", 10)).unwrap();
    worker_b.record_outcome(TestOutcome::passed("worker-b-test", 10)).unwrap();

    let merged = RunRecorder::open(config(&tmp));
    let names: Vec<&str> = merged.records().iter().map(|r| r.test_name.as_str()).collect();
    assert_eq!(names, vec!["worker-b-test"]);

    worker_a.reload();
    assert_eq!(worker_a.records().len(), 1);
    assert_eq!(worker_a.records()[0].test_name, "worker-b-test");
}

#[test]
fn dashboard_is_written_under_report_path() {
    let tmp = TempDir::new().expect("create temp dir");
    let mut recorder = RunRecorder::open(config(&tmp));
    recorder.record_outcome(TestOutcome::passed("customer-lookup", 640)).unwrap();

    let path = recorder.generate_report().expect("render dashboard");

    assert_eq!(path, tmp.path().join("reports").join("metrics-dashboard.html"));
    let html = std::fs::read_to_string(path).unwrap();
    assert!(html.contains("customer-lookup"));
    assert!(html.contains("100.0%"));
}
