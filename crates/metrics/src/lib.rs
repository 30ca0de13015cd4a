//! BankQA Metrics
//!
//! Records the outcome of every end-to-end test execution and derives
//! run statistics and flakiness rankings from the accumulated history.
//!
//! # Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        RunRecorder                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  records:  Vec<TestOutcome>          (append-only log)      │
//! │  counters: name -> FlakinessCounter  (passed/failed only)   │
//! │                                                             │
//! │  record_outcome() ──► MetricsStore::save()                  │
//! │  stats() / flaky_tests() / slowest_tests() / recent()       │
//! │  generate_report() ──► reports/metrics-dashboard.html       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  MetricsStore                                               │
//! │    metrics/test-metrics.json   metrics/flakiness.json       │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod recorder;
pub mod report;
pub mod store;
pub mod types;

pub use config::MetricsConfig;
pub use error::{MetricsError, Result};
pub use recorder::{RunRecorder, TestTimer};
pub use store::{LoadOutcome, MetricsState, MetricsStore};
pub use types::*;
