//! BankQA E2E Suite Driver
//!
//! Runs the Playwright browser suite for the online banking application and
//! records every test outcome through [`bankqa_metrics::RunRecorder`]:
//! - Waits for the deployed application to answer a health check
//! - Runs `npx playwright test --reporter=json` in the suite project
//! - Flattens the JSON report into one outcome per test
//! - Records outcomes without letting metrics failures abort the run
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SuiteRunner (Rust)                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TargetProbe::wait_until_healthy()                          │
//! │  PlaywrightHandle::run() -> PlaywrightRun                   │
//! │  PlaywrightReport::outcomes() -> Vec<TestOutcome>           │
//! │  RunRecorder::record_outcome(outcome)                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Playwright JSON report                                     │
//! │    suites[] -> specs[] -> tests[] -> results[]              │
//! │    final attempt decides status, duration, retries          │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod playwright;
pub mod results;
pub mod runner;
pub mod target;

pub use error::{E2eError, E2eResult};
pub use results::PlaywrightReport;
pub use runner::{RunnerConfig, SuiteResult, SuiteRunner};
