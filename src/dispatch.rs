//! Population dispatcher for batch reserve runs
//!
//! Fans an extract out to one model run per record on the rayon pool. A failed or
//! panicking record becomes an [`ErrorRecord`]; the batch always completes.

use crate::error::ReserveError;
use crate::policy::RecordKey;
use crate::reserves::{ReserveModel, ReserveResult, TimeZeroRow};
use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

/// A record that produced no reserve, with the reason
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ErrorRecord {
    pub policy_id: String,
    pub claim_id: Option<String>,
    pub coverage_id: String,
    pub error_type: String,
    pub error_value: String,
    /// Step name then causes, outermost first, joined by " <- "
    pub error_trace: String,
}

impl ErrorRecord {
    pub fn from_error(key: RecordKey, err: &ReserveError) -> Self {
        Self {
            policy_id: key.policy_id,
            claim_id: key.claim_id,
            coverage_id: key.coverage_id,
            error_type: err.kind().to_string(),
            error_value: err.root().to_string(),
            error_trace: err.trace().join(" <- "),
        }
    }

    pub fn from_panic(key: RecordKey, payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Self {
            policy_id: key.policy_id,
            claim_id: key.claim_id,
            coverage_id: key.coverage_id,
            error_type: "Panic".to_string(),
            error_trace: format!("panicked: {}", message),
            error_value: message,
        }
    }
}

/// Successes, failures and time-zero summary of one batch
#[derive(Debug, Clone)]
pub struct BatchOutput<R> {
    pub results: Vec<ReserveResult<R>>,
    pub errors: Vec<ErrorRecord>,
    pub time_zero: Vec<TimeZeroRow>,
    pub elapsed: Duration,
}

impl<R> BatchOutput<R> {
    pub fn success_count(&self) -> usize {
        self.results.len()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Projected rows across every successful record
    pub fn row_count(&self) -> usize {
        self.results.iter().map(|r| r.rows.len()).sum()
    }
}

/// Runs one reserve model over a population of records
pub struct PopulationDispatcher<M> {
    model: M,
}

impl<M: ReserveModel> PopulationDispatcher<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Run a single record, converting errors and panics into an error record
    pub fn run_one(&self, record: &M::Record) -> Result<ReserveResult<M::Row>, ErrorRecord> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.model.run(record))) {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(err)) => {
                let key = self.model.key(record);
                warn!("{} {:?} {}: {}", key.policy_id, key.claim_id, key.coverage_id, err);
                Err(ErrorRecord::from_error(key, &err))
            }
            Err(payload) => {
                let key = self.model.key(record);
                warn!("{} {:?} {}: panicked", key.policy_id, key.claim_id, key.coverage_id);
                Err(ErrorRecord::from_panic(key, payload.as_ref()))
            }
        }
    }

    /// Run every record in parallel
    ///
    /// Rows within a result keep their duration order; results and errors come back in
    /// record order.
    pub fn run_batch(&self, records: &[M::Record]) -> BatchOutput<M::Row> {
        let start = Instant::now();
        let outcomes: Vec<_> = records.par_iter().map(|record| self.run_one(record)).collect();

        let mut results = Vec::with_capacity(outcomes.len());
        let mut errors = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(result) => results.push(result),
                Err(error) => errors.push(error),
            }
        }
        let time_zero = results.iter().map(|r| r.time_zero()).collect();
        let elapsed = start.elapsed();

        info!(
            "batch of {} records: {} succeeded, {} failed in {:?}",
            records.len(),
            results.len(),
            errors.len(),
            elapsed
        );
        BatchOutput { results, errors, time_zero, elapsed }
    }
}
