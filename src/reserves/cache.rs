//! Memoized nested claim costs
//!
//! An active policy's benefit cost needs the reserve of a hypothetical claim at every
//! policy duration. Riders on the same base policy share most of those claims, so the
//! claim reserve at incurral is cached by everything it depends on, including the run's
//! valuation basis. The cache is shared across worker threads; concurrent misses on one
//! key may both compute, and the first insert wins.

use super::ReserveContext;
use crate::assumptions::{AssumptionSet, ModelMode};
use crate::error::{ReserveError, Result};
use crate::policy::{BenefitPeriod, ClaimAttributes, Contract, CoverageId, DiagnosisGroup, Gender, OccupationClass};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// Everything a nested claim reserve depends on
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClaimCostKey {
    assumption_set: AssumptionSet,
    ctr_modifier: u64,
    interest_modifier: u64,
    sis_probability: u64,
    mode: ModelMode,
    coverage: CoverageId,
    gender: Gender,
    birth_dt: NaiveDate,
    incurred_dt: NaiveDate,
    termination_dt: NaiveDate,
    elimination_period: u32,
    contract: Contract,
    benefit_period: BenefitPeriod,
    diagnosis: DiagnosisGroup,
    occupation_class: OccupationClass,
    cola_percent: u64,
    benefit_amount: u64,
    residual_benefit_percent: Option<u64>,
}

impl ClaimCostKey {
    pub fn new(attrs: &ClaimAttributes, mode: ModelMode, ctx: &ReserveContext) -> Self {
        Self {
            assumption_set: ctx.assumption_set,
            ctr_modifier: ctx.modifiers.ctr_modifier.to_bits(),
            interest_modifier: ctx.modifiers.interest_modifier.to_bits(),
            sis_probability: ctx.sis_probability.to_bits(),
            mode,
            coverage: attrs.coverage,
            gender: attrs.gender,
            birth_dt: attrs.birth_dt,
            incurred_dt: attrs.incurred_dt,
            termination_dt: attrs.termination_dt,
            elimination_period: attrs.elimination_period,
            contract: attrs.contract,
            benefit_period: attrs.benefit_period,
            diagnosis: attrs.diagnosis,
            occupation_class: attrs.occupation_class,
            cola_percent: attrs.cola_percent.to_bits(),
            benefit_amount: attrs.benefit_amount.to_bits(),
            residual_benefit_percent: attrs.residual_benefit_percent.map(f64::to_bits),
        }
    }
}

/// Thread-safe get-or-compute cache of nested claim reserves
#[derive(Debug, Default)]
pub struct ClaimCostCache {
    entries: RwLock<HashMap<ClaimCostKey, f64>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ClaimCostCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value for `key`, computing and storing it on a miss
    ///
    /// Errors from `compute` are returned and not cached.
    pub fn get_or_try_insert_with<F>(&self, key: ClaimCostKey, compute: F) -> Result<f64>
    where
        F: FnOnce() -> Result<f64>,
    {
        {
            let entries = self
                .entries
                .read()
                .map_err(|_| ReserveError::LockPoisoned("claim cost cache"))?;
            if let Some(value) = entries.get(&key) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(*value);
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let value = compute()?;
        let mut entries = self
            .entries
            .write()
            .map_err(|_| ReserveError::LockPoisoned("claim cost cache"))?;
        Ok(*entries.entry(key).or_insert(value))
    }

    /// Number of cached claims
    ///
    /// A statistic only: reports 0 if a writer panicked and poisoned the lock, while
    /// lookups on the poisoned cache fail with `LockPoisoned`.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Get cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits();
        let total = hits + self.misses();
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    /// Clear all entries and statistics
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}
