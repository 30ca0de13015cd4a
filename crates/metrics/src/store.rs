//! JSON persistence for the record log and flakiness counters
//!
//! Both files are rewritten in full on every save. Each write goes to a
//! temporary sibling that is renamed over the target, so readers never see a
//! partially written file. Concurrent writers are not merged: whichever
//! process saves last wins.

use std::collections::BTreeMap;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::config::MetricsConfig;
use crate::error::{MetricsError, Result};
use crate::types::{FlakinessCounter, TestOutcome};

/// Everything the recorder persists
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsState {
    pub records: Vec<TestOutcome>,
    pub counters: BTreeMap<String, FlakinessCounter>,
}

impl MetricsState {
    /// Derive counters from a record log
    pub fn from_records(records: Vec<TestOutcome>) -> Self {
        let mut counters: BTreeMap<String, FlakinessCounter> = BTreeMap::new();
        for record in &records {
            if record.status != crate::TestStatus::Skipped {
                counters
                    .entry(record.test_name.clone())
                    .or_default()
                    .observe(record.status);
            }
        }
        Self { records, counters }
    }
}

/// Result of reading persisted state
#[derive(Debug)]
pub enum LoadOutcome {
    /// State was read (counters rebuilt if their file was absent)
    Loaded(MetricsState),
    /// No persisted state exists yet
    Missing,
    /// A file exists but is not valid JSON of the expected shape
    ParseError(String),
    /// A file exists but could not be read
    IoError(String),
}

enum FileRead<T> {
    Absent,
    Present(T),
}

/// Reads and writes `test-metrics.json` and `flakiness.json`
#[derive(Debug, Clone)]
pub struct MetricsStore {
    records_path: PathBuf,
    counters_path: PathBuf,
}

impl MetricsStore {
    pub fn new(config: &MetricsConfig) -> Self {
        Self {
            records_path: config.records_path(),
            counters_path: config.counters_path(),
        }
    }

    pub fn records_path(&self) -> &Path {
        &self.records_path
    }

    pub fn counters_path(&self) -> &Path {
        &self.counters_path
    }

    /// Read persisted state without failing
    pub fn load(&self) -> LoadOutcome {
        let records = match read_json::<Vec<TestOutcome>>(&self.records_path) {
            Ok(read) => read,
            Err(outcome) => return outcome,
        };
        let counters = match read_json::<BTreeMap<String, FlakinessCounter>>(&self.counters_path) {
            Ok(read) => read,
            Err(outcome) => return outcome,
        };

        match (records, counters) {
            (FileRead::Absent, FileRead::Absent) => LoadOutcome::Missing,
            (FileRead::Present(records), FileRead::Absent) => {
                debug!("No counters file, rebuilding from {} records", records.len());
                LoadOutcome::Loaded(MetricsState::from_records(records))
            }
            (records, FileRead::Present(counters)) => {
                let records = match records {
                    FileRead::Present(records) => records,
                    FileRead::Absent => Vec::new(),
                };
                LoadOutcome::Loaded(MetricsState { records, counters })
            }
        }
    }

    /// Overwrite both files with `state`
    pub fn save(&self, state: &MetricsState) -> Result<()> {
        write_json(&self.records_path, &state.records)?;
        write_json(&self.counters_path, &state.counters)?;
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> std::result::Result<FileRead<T>, LoadOutcome> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(FileRead::Absent),
        Err(e) => {
            return Err(LoadOutcome::IoError(format!("{}: {}", path.display(), e)));
        }
    };

    serde_json::from_str(&content)
        .map(FileRead::Present)
        .map_err(|e| LoadOutcome::ParseError(format!("{}: {}", path.display(), e)))
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    write_atomic(path, json.as_bytes())
}

/// Replace `path` with `contents`, creating the parent directory if needed
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent)?;

    let mut tmp = NamedTempFile::new_in(&parent)?;
    tmp.write_all(contents)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| MetricsError::Write {
        path: path.to_path_buf(),
        reason: e.error.to_string(),
    })?;
    Ok(())
}
