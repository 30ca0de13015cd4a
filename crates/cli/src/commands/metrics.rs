//! Metrics inspection commands

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use bankqa_metrics::{FlakyTest, RunRecorder, RunStats, SlowTest, TestOutcome, TestStatus};

use crate::output::{
    print_item, print_list, print_message, print_success, print_warning, OutputFormat, TableDisplay,
};

#[derive(Args, Debug)]
pub struct FlakyArgs {
    /// Failure rate a test must exceed (defaults to the configured threshold)
    #[arg(short, long)]
    pub threshold: Option<f64>,
}

#[derive(Args, Debug)]
pub struct CountArgs {
    /// Number of entries to show
    #[arg(short = 'n', long, default_value = "10")]
    pub count: usize,
}

#[derive(Args, Debug)]
pub struct ClearArgs {
    /// Confirm deleting every recorded outcome
    #[arg(long)]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct RecordArgs {
    /// Test name
    pub name: String,

    /// Outcome status (passed, failed, skipped)
    #[arg(short, long)]
    pub status: TestStatus,

    /// Wall-clock duration in milliseconds
    #[arg(short, long, default_value = "0")]
    pub duration: u64,

    /// Error message for failed outcomes
    #[arg(short, long)]
    pub error: Option<String>,

    /// Automatic re-executions before this outcome
    #[arg(short, long)]
    pub retries: Option<u32>,
}

/// Stats display wrapper
#[derive(Serialize)]
pub struct StatsDisplay(RunStats);

impl TableDisplay for StatsDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Total", "Passed", "Failed", "Skipped", "Pass Rate", "Avg Duration"]
    }

    fn row(&self) -> Vec<String> {
        let s = &self.0;
        vec![
            s.total.to_string(),
            s.passed.to_string(),
            s.failed.to_string(),
            s.skipped.to_string(),
            format!("{:.1}%", s.pass_rate),
            format!("{:.0}ms", s.average_duration_ms),
        ]
    }
}

impl TableDisplay for FlakyTest {
    fn headers() -> Vec<&'static str> {
        vec!["Test", "Failure Rate", "Runs"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            format!("{:.1}%", self.rate * 100.0),
            self.total_runs.to_string(),
        ]
    }
}

impl TableDisplay for SlowTest {
    fn headers() -> Vec<&'static str> {
        vec!["Test", "Duration"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.name.clone(), format!("{}ms", self.duration_ms)]
    }
}

/// Recorded outcome display wrapper
#[derive(Serialize)]
pub struct OutcomeDisplay<'a>(&'a TestOutcome);

impl TableDisplay for OutcomeDisplay<'_> {
    fn headers() -> Vec<&'static str> {
        vec!["Test", "Status", "Duration", "Retries", "Recorded", "Error"]
    }

    fn row(&self) -> Vec<String> {
        let o = self.0;
        let status = match o.status {
            TestStatus::Passed => "✓ passed".green().to_string(),
            TestStatus::Failed => "✗ failed".red().to_string(),
            TestStatus::Skipped => "○ skipped".dimmed().to_string(),
        };
        vec![
            o.test_name.clone(),
            status,
            format!("{}ms", o.duration_ms),
            o.retries.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string()),
            o.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            o.error.clone().unwrap_or_default(),
        ]
    }
}

pub fn stats(recorder: &RunRecorder, format: OutputFormat) -> Result<()> {
    print_item(&StatsDisplay(recorder.stats()), format);
    Ok(())
}

pub fn flaky(args: FlakyArgs, recorder: &RunRecorder, format: OutputFormat) -> Result<()> {
    let threshold = args.threshold.unwrap_or(recorder.config().flaky_threshold);
    let flaky = recorder.flaky_tests(threshold);
    print_list(&flaky, format, "No flaky tests detected.");
    Ok(())
}

pub fn slowest(args: CountArgs, recorder: &RunRecorder, format: OutputFormat) -> Result<()> {
    let slowest = recorder.slowest_tests(args.count);
    print_list(&slowest, format, "No passing tests recorded.");
    Ok(())
}

pub fn recent(args: CountArgs, recorder: &RunRecorder, format: OutputFormat) -> Result<()> {
    let recent: Vec<OutcomeDisplay> = recorder
        .recent(args.count)
        .into_iter()
        .map(OutcomeDisplay)
        .collect();
    print_list(&recent, format, "No results recorded.");
    Ok(())
}

pub fn report(recorder: &RunRecorder, format: OutputFormat) -> Result<()> {
    let path = recorder.generate_report()?;
    match format {
        OutputFormat::Table => print_success(&format!("Dashboard written to {}", path.display())),
        _ => print_message(&path.display().to_string(), format),
    }
    Ok(())
}

pub fn clear(args: ClearArgs, recorder: &mut RunRecorder) -> Result<()> {
    if !args.yes {
        print_warning("This deletes every recorded outcome and flakiness counter.");
        bail!("refusing to clear metrics without --yes");
    }
    let removed = recorder.records().len();
    recorder.clear_all()?;
    print_success(&format!("Cleared {} recorded outcome(s)", removed));
    Ok(())
}

pub fn record(args: RecordArgs, recorder: &mut RunRecorder) -> Result<()> {
    let mut outcome = TestOutcome::new(&args.name, args.status, args.duration);
    if let Some(error) = args.error {
        outcome = outcome.with_error(error);
    }
    if let Some(retries) = args.retries {
        outcome = outcome.with_retries(retries);
    }

    recorder.record_outcome(outcome)?;
    print_success(&format!("Recorded {} outcome for '{}'", args.status, args.name));
    Ok(())
}
