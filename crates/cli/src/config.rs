//! CLI configuration (`bankqa.toml`)

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use bankqa_e2e::playwright::PlaywrightConfig;
use bankqa_e2e::RunnerConfig;
use bankqa_metrics::MetricsConfig;

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub metrics: MetricsConfig,
    pub suite: SuiteConfig,
}

/// How the Playwright suite is run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Directory holding `playwright.config.ts`
    pub project_dir: PathBuf,

    /// Deployed banking application
    pub base_url: String,

    /// Path polled before the run starts
    pub health_path: String,

    /// Playwright project to run (empty = all)
    pub browser_project: String,

    /// Worker processes (0 = Playwright default)
    pub workers: u32,

    pub retries: u32,

    pub startup_timeout_secs: u64,

    /// Where run summaries are written
    pub output_dir: PathBuf,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        let playwright = PlaywrightConfig::default();
        Self {
            project_dir: playwright.project_dir,
            base_url: playwright.base_url,
            health_path: "/index.htm".to_string(),
            browser_project: String::new(),
            workers: 0,
            retries: 0,
            startup_timeout_secs: 30,
            output_dir: PathBuf::from("test-results"),
        }
    }
}

impl Config {
    /// Load configuration from file, falling back to defaults when absent
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let config: Self = toml::from_str(&content)
                .with_context(|| format!("parsing {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }
}

impl SuiteConfig {
    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            playwright: PlaywrightConfig {
                project_dir: self.project_dir.clone(),
                base_url: self.base_url.clone(),
                project: self.browser_project.clone(),
                workers: self.workers,
                retries: self.retries,
                ..Default::default()
            },
            health_path: self.health_path.clone(),
            startup_timeout: Duration::from_secs(self.startup_timeout_secs),
            skip_health_check: false,
            output_dir: self.output_dir.clone(),
        }
    }
}
