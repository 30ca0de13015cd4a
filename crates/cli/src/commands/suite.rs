//! Suite execution and report ingestion commands

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use bankqa_e2e::{SuiteResult, SuiteRunner};
use bankqa_metrics::{RunRecorder, TestOutcome, TestStatus};

use crate::config::SuiteConfig;
use crate::output::{print_error, print_item, print_success, OutputFormat, TableDisplay};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Only run tests whose title matches this pattern
    #[arg(short, long)]
    pub grep: Option<String>,

    /// Playwright project (browser) to run
    #[arg(short, long)]
    pub project: Option<String>,

    /// Base URL of the banking application
    #[arg(long, env = "BANKQA_BASE_URL")]
    pub base_url: Option<String>,

    /// Retries for failing tests
    #[arg(long)]
    pub retries: Option<u32>,

    /// Worker processes
    #[arg(long)]
    pub workers: Option<u32>,

    /// Run with a visible browser
    #[arg(long)]
    pub headed: bool,

    /// Skip the pre-run health check
    #[arg(long)]
    pub no_health_check: bool,

    /// Render the metrics dashboard after the run
    #[arg(long)]
    pub report: bool,
}

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Playwright JSON report, or a directory of reports
    pub path: PathBuf,

    /// Render the metrics dashboard after ingesting
    #[arg(long)]
    pub report: bool,
}

/// Suite summary display wrapper
#[derive(serde::Serialize)]
pub struct SuiteDisplay<'a>(&'a SuiteResult);

impl TableDisplay for SuiteDisplay<'_> {
    fn headers() -> Vec<&'static str> {
        vec!["Total", "Passed", "Failed", "Skipped", "Flaky", "Duration"]
    }

    fn row(&self) -> Vec<String> {
        let r = self.0;
        vec![
            r.total.to_string(),
            r.passed.to_string().green().to_string(),
            if r.failed > 0 {
                r.failed.to_string().red().to_string()
            } else {
                r.failed.to_string()
            },
            r.skipped.to_string(),
            r.flaky.to_string(),
            format!("{}ms", r.duration_ms),
        ]
    }
}

/// Run the suite; returns whether every test passed
pub async fn run(
    args: RunArgs,
    suite: &SuiteConfig,
    recorder: &mut RunRecorder,
    format: OutputFormat,
) -> Result<bool> {
    let mut config = suite.runner_config();
    if let Some(grep) = args.grep {
        config.playwright.grep = Some(grep);
    }
    if let Some(project) = args.project {
        config.playwright.project = project;
    }
    if let Some(base_url) = args.base_url {
        config.playwright.base_url = base_url;
    }
    if let Some(retries) = args.retries {
        config.playwright.retries = retries;
    }
    if let Some(workers) = args.workers {
        config.playwright.workers = workers;
    }
    config.playwright.headless = !args.headed;
    config.skip_health_check = args.no_health_check;

    let runner = SuiteRunner::new(config);
    let result = runner.run(recorder).await.context("suite run failed")?;
    runner.write_results(&result)?;

    finish(&result, recorder, args.report, format)
}

/// Record outcomes from saved reports; returns whether every test passed
pub fn ingest(
    args: IngestArgs,
    suite: &SuiteConfig,
    recorder: &mut RunRecorder,
    format: OutputFormat,
) -> Result<bool> {
    let runner = SuiteRunner::new(suite.runner_config());
    let result = runner
        .ingest(&args.path, recorder)
        .with_context(|| format!("ingesting {}", args.path.display()))?;

    finish(&result, recorder, args.report, format)
}

fn finish(
    result: &SuiteResult,
    recorder: &RunRecorder,
    render_report: bool,
    format: OutputFormat,
) -> Result<bool> {
    print_item(&SuiteDisplay(result), format);

    if format == OutputFormat::Table {
        for outcome in failures(&result.outcomes) {
            print_error(&format!(
                "{} - {}",
                outcome.test_name,
                outcome.error.as_deref().unwrap_or("unknown error")
            ));
        }
    }
    if result.unrecorded > 0 {
        print_error(&format!(
            "{} outcome(s) could not be written to {}",
            result.unrecorded,
            recorder.config().dir.display()
        ));
    }

    if render_report {
        let path = recorder.generate_report()?;
        print_success(&format!("Dashboard written to {}", path.display()));
    }

    Ok(result.success())
}

fn failures(outcomes: &[TestOutcome]) -> impl Iterator<Item = &TestOutcome> {
    outcomes.iter().filter(|o| o.status == TestStatus::Failed)
}
