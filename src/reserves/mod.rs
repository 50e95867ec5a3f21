//! Reserve calculation for disabled and active lives
//!
//! - **DLR**: open claims are projected monthly from the valuation date; the reserve is
//!   the present value of remaining benefits per surviving claimant.
//! - **ALR**: in-force policies are projected yearly from issue. The benefit cost of each
//!   policy year is the reserve of a claim incurred at the start of that year (a nested
//!   DLR run) times the incidence rate; the reserve is benefits less net premiums.
//!
//! # Example
//!
//! ```rust,ignore
//! use idi_reserves::reserves::{DisabledLifeModel, ReserveContext, ReserveModel};
//! use idi_reserves::RunConfig;
//!
//! let config = RunConfig::default();
//! let ctx = Arc::new(ReserveContext::from_config(&config, Arc::new(config.table_store()))?);
//! let model = DisabledLifeModel::new(ctx);
//! let result = model.run(&claim)?;
//! println!("DLR: {:.2}", result.time_zero().reserve);
//! ```

mod actuarial;
mod active;
mod benefits;
mod cache;
mod disabled;
mod discount;
mod types;

pub use actuarial::{reverse_cumsum, round_cents, shift_next, Continuance, Interpolation};
pub use active::ActiveLifeModel;
pub use benefits::BenefitCalculator;
pub use cache::{ClaimCostCache, ClaimCostKey};
pub use disabled::DisabledLifeModel;
pub use discount::{DiscountCurve, DiscountFactors};
pub use types::{
    model_name, ActiveReserveRow, DisabledReserveRow, NetBenefitMethod, ReserveResult, ReserveRow,
    RunMetadata, TimeZeroRow,
};

use crate::assumptions::{AssumptionResolver, AssumptionSet, RateTableStore};
use crate::config::{Modifiers, RunConfig};
use crate::error::Result;
use crate::policy::RecordKey;
use chrono::NaiveDate;
use std::sync::Arc;

/// Typed run parameters shared by every record of a batch
#[derive(Debug, Clone)]
pub struct ReserveContext {
    pub resolver: AssumptionResolver,
    pub valuation_dt: NaiveDate,
    pub assumption_set: AssumptionSet,
    pub net_benefit_method: NetBenefitMethod,
    pub mortality_table: String,
    pub lapse_table: String,
    pub withdraw_table: Option<String>,
    pub modifiers: Modifiers,
    pub sis_probability: f64,
    pub metadata: RunMetadata,
}

impl ReserveContext {
    /// Parse the selectors of a run configuration
    ///
    /// An unknown assumption set or net benefit method fails the whole run here.
    pub fn from_config(config: &RunConfig, store: Arc<RateTableStore>) -> Result<Self> {
        Ok(Self {
            resolver: AssumptionResolver::new(store),
            valuation_dt: config.valuation_dt,
            assumption_set: config.assumption_set.parse()?,
            net_benefit_method: config.net_benefit_method.parse()?,
            mortality_table: config.mortality_table.clone(),
            lapse_table: config.lapse_table.clone(),
            withdraw_table: config.withdraw_table.clone(),
            modifiers: config.modifiers,
            sis_probability: config.sis_probability,
            metadata: RunMetadata::new(config.source.clone(), chrono::Local::now().naive_local()),
        })
    }

    #[cfg(test)]
    pub(crate) fn for_tests(assumption_set: AssumptionSet, valuation_dt: NaiveDate) -> Self {
        let config = RunConfig { valuation_dt, ..RunConfig::default() };
        let mut ctx = Self::from_config(&config, Arc::new(RateTableStore::embedded()))
            .expect("default config parses");
        ctx.assumption_set = assumption_set;
        ctx
    }
}

/// A reserve model for one kind of record
///
/// Implementations are shared across worker threads, so `run` takes `&self`.
pub trait ReserveModel: Sync {
    type Record: Sync;
    type Row: ReserveRow + Send;

    /// Natural key of a record, available even when the record fails
    fn key(&self, record: &Self::Record) -> RecordKey;

    /// Full projected reserve schedule of one record
    fn run(&self, record: &Self::Record) -> Result<ReserveResult<Self::Row>>;

    /// Run several records sequentially
    fn run_all(&self, records: &[Self::Record]) -> Vec<Result<ReserveResult<Self::Row>>> {
        records.iter().map(|r| self.run(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReserveError;

    #[test]
    fn test_context_rejects_unknown_selectors() {
        let store = Arc::new(RateTableStore::embedded());
        let config = RunConfig { assumption_set: "tax".into(), ..RunConfig::default() };
        assert!(matches!(
            ReserveContext::from_config(&config, store.clone()),
            Err(ReserveError::UnknownAssumptionSet(_))
        ));

        let config = RunConfig { net_benefit_method: "FPT".into(), ..RunConfig::default() };
        assert!(matches!(
            ReserveContext::from_config(&config, store),
            Err(ReserveError::UnknownNetBenefitMethod(_))
        ));
    }

    #[test]
    fn test_best_estimate_parses_but_defers_failure() {
        let config = RunConfig { assumption_set: "best-estimate".into(), ..RunConfig::default() };
        let ctx = ReserveContext::from_config(&config, Arc::new(RateTableStore::embedded())).unwrap();
        assert_eq!(ctx.assumption_set, AssumptionSet::BestEstimate);
        assert_eq!(ctx.metadata.model_version, env!("CARGO_PKG_VERSION"));
    }
}
