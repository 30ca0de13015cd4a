//! Driving the Playwright test runner

use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{E2eError, E2eResult};
use crate::results::PlaywrightReport;

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    /// Directory holding `playwright.config.ts` and the browser specs
    pub project_dir: PathBuf,

    /// Base URL of the banking application, exported as `BASE_URL`
    pub base_url: String,

    /// Playwright project to run (empty = every configured project)
    pub project: String,

    /// Worker processes (0 = Playwright default)
    pub workers: u32,

    /// Retries for failing tests
    pub retries: u32,

    /// Only run tests whose title matches
    pub grep: Option<String>,

    pub headless: bool,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            project_dir: PathBuf::from("."),
            base_url: "https://parabank.parasoft.com/parabank".to_string(),
            project: String::new(),
            workers: 0,
            retries: 0,
            grep: None,
            headless: true,
        }
    }
}

/// Output of one `playwright test` invocation
#[derive(Debug, Clone)]
pub struct PlaywrightRun {
    pub report: PlaywrightReport,

    /// Whether Playwright exited zero (no unexpected results)
    pub success: bool,

    pub stderr: String,
}

/// Handle to the Playwright CLI inside the suite project
pub struct PlaywrightHandle {
    config: PlaywrightConfig,
}

impl PlaywrightHandle {
    /// Create a new Playwright handle
    pub async fn new(config: PlaywrightConfig) -> E2eResult<Self> {
        Self::check_playwright_installed(&config).await?;
        Ok(Self { config })
    }

    async fn check_playwright_installed(config: &PlaywrightConfig) -> E2eResult<()> {
        let status = Command::new("npx")
            .args(["playwright", "--version"])
            .current_dir(&config.project_dir)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    /// Arguments passed after `npx`
    pub fn test_args(&self) -> Vec<String> {
        let mut args = vec![
            "playwright".to_string(),
            "test".to_string(),
            "--reporter=json".to_string(),
        ];
        if !self.config.project.is_empty() {
            args.push(format!("--project={}", self.config.project));
        }
        if self.config.workers > 0 {
            args.push(format!("--workers={}", self.config.workers));
        }
        if self.config.retries > 0 {
            args.push(format!("--retries={}", self.config.retries));
        }
        if let Some(grep) = &self.config.grep {
            args.push(format!("--grep={}", grep));
        }
        if !self.config.headless {
            args.push("--headed".to_string());
        }
        args
    }

    /// Run the suite and parse the JSON report from stdout.
    ///
    /// Failing tests are not an error; only output that is not a report is.
    pub async fn run(&self) -> E2eResult<PlaywrightRun> {
        let args = self.test_args();
        info!("Running: npx {}", args.join(" "));

        let output = Command::new("npx")
            .args(&args)
            .current_dir(&self.config.project_dir)
            .env("BASE_URL", &self.config.base_url)
            .env("CI", "1")
            .stdin(Stdio::null())
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        debug!("Playwright exited with {}", output.status);

        let report = match PlaywrightReport::from_json(extract_json(&stdout)) {
            Ok(report) => report,
            Err(e) => {
                return Err(E2eError::Playwright(format!(
                    "could not parse JSON report ({}):\nstdout: {}\nstderr: {}",
                    e, stdout, stderr
                )));
            }
        };

        for error in &report.errors {
            if let Some(message) = &error.message {
                warn!("Playwright reported: {}", message);
            }
        }

        Ok(PlaywrightRun {
            report,
            success: output.status.success(),
            stderr,
        })
    }
}

/// Skip anything a global setup script printed before the report, which
/// starts on a line of its own
fn extract_json(stdout: &str) -> &str {
    let mut offset = 0;
    for line in stdout.split_inclusive('\n') {
        if line.starts_with('{') {
            return &stdout[offset..];
        }
        offset += line.len();
    }
    stdout
}
