//! Health checking the deployed banking application before a run

use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{E2eError, E2eResult};

/// Polls the application under test until it answers
#[derive(Debug, Clone)]
pub struct TargetProbe {
    health_url: String,
    timeout: Duration,
    interval: Duration,
}

impl TargetProbe {
    pub fn new(base_url: &str, health_path: &str, timeout: Duration) -> Self {
        Self {
            health_url: join_url(base_url, health_path),
            timeout,
            interval: Duration::from_millis(500),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn health_url(&self) -> &str {
        &self.health_url
    }

    /// Wait until the health URL returns a 2xx status
    pub async fn wait_until_healthy(&self) -> E2eResult<()> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;

        let start = Instant::now();
        let mut attempts = 0;

        loop {
            attempts += 1;

            match client.get(&self.health_url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    info!("Target is healthy at {}", self.health_url);
                    return Ok(());
                }
                Ok(resp) => {
                    warn!("Health check returned {}", resp.status());
                }
                Err(e) => {
                    if attempts == 1 {
                        info!("Waiting for {} to respond...", self.health_url);
                    }
                    if !e.is_connect() && !e.is_timeout() {
                        warn!("Health check error: {}", e);
                    }
                }
            }

            if start.elapsed() + self.interval >= self.timeout {
                break;
            }
            sleep(self.interval).await;
        }

        Err(E2eError::TargetHealthCheck {
            url: self.health_url.clone(),
            attempts,
        })
    }
}

fn join_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if path.is_empty() {
        return base.to_string();
    }
    format!("{}/{}", base, path.trim_start_matches('/'))
}
