//! CLI Commands

pub mod metrics;
pub mod suite;
