//! Per-iteration reporting.
//!
//! The runner emits one [`IterationRecord`] per evaluated iteration and a
//! final [`TestResult`]; rendering is left to a [`Reporter`].

use std::sync::Mutex;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{PropertyError, PropertyResult};
use crate::prop_result::{PropArg, PropResult, PropStatus};
use crate::test_result::{TestResult, TestStatus};

/// One argument of a reported iteration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgRecord {
    pub label: String,
    pub value: String,
    pub original: String,
    /// Accepted shrink steps that produced `value`
    pub shrinks: usize,
}

impl From<&PropArg> for ArgRecord {
    fn from(arg: &PropArg) -> Self {
        Self {
            label: arg.label.clone(),
            value: arg.arg.clone(),
            original: arg.orig_arg.clone(),
            shrinks: arg.shrinks,
        }
    }
}

/// Structured record of one evaluated iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    pub worker: usize,
    /// Iteration index within the worker
    pub iteration: usize,
    pub status: String,
    pub args: Vec<ArgRecord>,
    pub labels: Vec<String>,
    pub size: usize,
    pub elapsed_micros: u64,
    pub seed: u64,
}

impl IterationRecord {
    pub(crate) fn from_prop_result(
        worker: usize,
        iteration: usize,
        size: usize,
        elapsed_micros: u64,
        seed: u64,
        result: &PropResult,
    ) -> Self {
        Self {
            worker,
            iteration,
            status: result.status.to_string(),
            args: result.args.iter().map(ArgRecord::from).collect(),
            labels: result.labels.clone(),
            size,
            elapsed_micros,
            seed,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status == PropStatus::False.to_string() || self.status == PropStatus::Error.to_string()
    }

    pub fn to_json(&self) -> PropertyResult<String> {
        serde_json::to_string(self)
            .map_err(|e| PropertyError::Configuration(format!("Failed to serialize record: {}", e)))
    }
}

/// Receives iteration records and final results; shared across workers
pub trait Reporter: Send + Sync {
    fn report(&self, record: &IterationRecord);

    fn report_result(&self, _name: &str, _result: &TestResult) {}
}

/// Renders through the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, record: &IterationRecord) {
        if record.is_failure() {
            let args: Vec<String> = record
                .args
                .iter()
                .map(|arg| format!("{}={}", arg.label, arg.value))
                .collect();
            warn!(
                "worker {} iteration {} {} (size {}): {}",
                record.worker,
                record.iteration,
                record.status,
                record.size,
                args.join(", ")
            );
        } else {
            debug!(
                "worker {} iteration {} {} (size {}, {}us)",
                record.worker, record.iteration, record.status, record.size, record.elapsed_micros
            );
        }
    }

    fn report_result(&self, name: &str, result: &TestResult) {
        match result.status {
            TestStatus::Passed | TestStatus::Proved => info!("{}: {}", name, result),
            _ => warn!("{}: {}", name, result),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&self, _record: &IterationRecord) {}
}

/// Keeps every record, for inspection in tests
#[derive(Debug, Default)]
pub struct CollectingReporter {
    records: Mutex<Vec<IterationRecord>>,
    results: Mutex<Vec<(String, TestStatus)>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<IterationRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn results(&self) -> Vec<(String, TestStatus)> {
        match self.results.lock() {
            Ok(results) => results.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Reporter for CollectingReporter {
    fn report(&self, record: &IterationRecord) {
        let mut records = self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        records.push(record.clone());
    }

    fn report_result(&self, name: &str, result: &TestResult) {
        let mut results = self.results.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        results.push((name.to_string(), result.status));
    }
}
