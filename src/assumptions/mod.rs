//! Assumption resolution: claim termination, incidence, mortality, lapse and interest
//!
//! Each rate family joins one or more rate tables from the [`RateTableStore`], applies
//! modifiers and margins, and returns a [`RateSeries`] indexed by duration or age.

mod store;
mod termination;
mod incidence;
mod mortality;
mod lapse;
mod interest;

pub use store::{schema_for, RateTable, RateTableStore, TableSchema, TableSource, DEFAULT_TABLES_PATH};
pub use termination::TerminationAttributes;
pub use incidence::IncidenceAttributes;
pub use lapse::age_band;

use crate::error::{ReserveError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Valuation basis for the assumptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssumptionSet {
    /// Statutory: regulatory tables with margins
    Stat,
    /// GAAP: regulatory tables without margins
    Gaap,
    /// Company experience; not available
    BestEstimate,
}

impl AssumptionSet {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssumptionSet::Stat => "stat",
            AssumptionSet::Gaap => "gaap",
            AssumptionSet::BestEstimate => "best-estimate",
        }
    }

    /// Fail fast for bases that have no tables behind them
    pub fn ensure_implemented(&self) -> Result<()> {
        match self {
            AssumptionSet::BestEstimate => {
                Err(ReserveError::NotImplemented("best-estimate assumption set".to_string()))
            }
            _ => Ok(()),
        }
    }
}

impl FromStr for AssumptionSet {
    type Err = ReserveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stat" => Ok(AssumptionSet::Stat),
            "gaap" => Ok(AssumptionSet::Gaap),
            "best-estimate" | "best_estimate" => Ok(AssumptionSet::BestEstimate),
            other => Err(ReserveError::UnknownAssumptionSet(other.to_string())),
        }
    }
}

impl fmt::Display for AssumptionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which model a rate is being resolved for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelMode {
    /// Open claim
    Dlr,
    /// Open catastrophic rider claim
    DlrCat,
    /// Hypothetical claim of an active life
    Alr,
    /// Hypothetical catastrophic rider claim of an active life
    AlrCat,
}

impl ModelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelMode::Dlr => "DLR",
            ModelMode::DlrCat => "DLRCAT",
            ModelMode::Alr => "ALR",
            ModelMode::AlrCat => "ALRCAT",
        }
    }
}

impl FromStr for ModelMode {
    type Err = ReserveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "DLR" => Ok(ModelMode::Dlr),
            "DLRCAT" => Ok(ModelMode::DlrCat),
            "ALR" => Ok(ModelMode::Alr),
            "ALRCAT" => Ok(ModelMode::AlrCat),
            other => Err(ReserveError::UnknownMode(other.to_string())),
        }
    }
}

/// Every supported (assumption set, mode) pairing for claim termination rates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CtrBasis {
    StatDlr,
    StatDlrCat,
    StatAlr,
    StatAlrCat,
    GaapDlr,
    GaapDlrCat,
    GaapAlr,
    GaapAlrCat,
}

impl CtrBasis {
    pub fn select(set: AssumptionSet, mode: ModelMode) -> Result<Self> {
        match (set, mode) {
            (AssumptionSet::Stat, ModelMode::Dlr) => Ok(CtrBasis::StatDlr),
            (AssumptionSet::Stat, ModelMode::DlrCat) => Ok(CtrBasis::StatDlrCat),
            (AssumptionSet::Stat, ModelMode::Alr) => Ok(CtrBasis::StatAlr),
            (AssumptionSet::Stat, ModelMode::AlrCat) => Ok(CtrBasis::StatAlrCat),
            (AssumptionSet::Gaap, ModelMode::Dlr) => Ok(CtrBasis::GaapDlr),
            (AssumptionSet::Gaap, ModelMode::DlrCat) => Ok(CtrBasis::GaapDlrCat),
            (AssumptionSet::Gaap, ModelMode::Alr) => Ok(CtrBasis::GaapAlr),
            (AssumptionSet::Gaap, ModelMode::AlrCat) => Ok(CtrBasis::GaapAlrCat),
            (AssumptionSet::BestEstimate, _) => {
                Err(ReserveError::NotImplemented(format!("best-estimate {} termination rates", mode.as_str())))
            }
        }
    }

    pub fn applies_margin(&self) -> bool {
        matches!(self, CtrBasis::StatDlr | CtrBasis::StatDlrCat | CtrBasis::StatAlr | CtrBasis::StatAlrCat)
    }

    /// Hypothetical claims of active lives
    pub fn is_active(&self) -> bool {
        matches!(self, CtrBasis::StatAlr | CtrBasis::StatAlrCat | CtrBasis::GaapAlr | CtrBasis::GaapAlrCat)
    }

    pub fn is_catastrophic(&self) -> bool {
        matches!(self, CtrBasis::StatDlrCat | CtrBasis::StatAlrCat | CtrBasis::GaapDlrCat | CtrBasis::GaapAlrCat)
    }
}

/// Rates over a contiguous range of integer indices (duration month, duration year or age)
#[derive(Debug, Clone, PartialEq)]
pub struct RateSeries {
    start: u32,
    rates: Vec<f64>,
}

impl RateSeries {
    pub fn new(start: u32, rates: Vec<f64>) -> Self {
        Self { start, rates }
    }

    pub fn empty() -> Self {
        Self { start: 1, rates: Vec::new() }
    }

    /// First index covered
    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn get(&self, index: u32) -> Option<f64> {
        index
            .checked_sub(self.start)
            .and_then(|offset| self.rates.get(offset as usize))
            .copied()
    }

    /// Rate at an index that the caller expects to be covered
    pub fn require(&self, index: u32, what: &str) -> Result<f64> {
        self.get(index)
            .ok_or_else(|| ReserveError::lookup(what, format!("index {} outside {}..{}", index, self.start, self.start as usize + self.rates.len())))
    }

    pub fn rates(&self) -> &[f64] {
        &self.rates
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.rates.iter().enumerate().map(move |(i, r)| (self.start + i as u32, *r))
    }

    /// Multiply every rate by a sensitivity modifier
    pub fn scaled(mut self, modifier: f64) -> Self {
        for rate in &mut self.rates {
            *rate *= modifier;
        }
        self
    }
}

/// Convert an annual rate to the equivalent monthly rate
pub fn annual_to_monthly(annual: f64) -> f64 {
    1.0 - (1.0 - annual.clamp(0.0, 1.0)).powf(1.0 / 12.0)
}

/// Resolves rate series from the shared table store
#[derive(Debug, Clone)]
pub struct AssumptionResolver {
    store: Arc<RateTableStore>,
}

impl AssumptionResolver {
    pub fn new(store: Arc<RateTableStore>) -> Self {
        Self { store }
    }

    /// Resolver over the packaged tables
    pub fn embedded() -> Self {
        Self::new(Arc::new(RateTableStore::embedded()))
    }

    pub fn store(&self) -> &Arc<RateTableStore> {
        &self.store
    }

    fn table(&self, table_id: &str) -> Result<Arc<RateTable>> {
        self.store.load(table_id)
    }

    /// Margin load for a rate family and duration band
    fn margin(&self, family: &str, band: &str) -> Result<f64> {
        self.table("margin")?.rate(&[family, band])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selectors() {
        assert_eq!("stat".parse::<AssumptionSet>().unwrap(), AssumptionSet::Stat);
        assert_eq!("GAAP".parse::<AssumptionSet>().unwrap(), AssumptionSet::Gaap);
        assert!(matches!("tax".parse::<AssumptionSet>(), Err(ReserveError::UnknownAssumptionSet(_))));
        assert_eq!("ALRCAT".parse::<ModelMode>().unwrap(), ModelMode::AlrCat);
        assert!(matches!("XYZ".parse::<ModelMode>(), Err(ReserveError::UnknownMode(_))));
    }

    #[test]
    fn test_ctr_basis_dispatch() {
        let basis = CtrBasis::select(AssumptionSet::Stat, ModelMode::AlrCat).unwrap();
        assert!(basis.applies_margin() && basis.is_active() && basis.is_catastrophic());

        let basis = CtrBasis::select(AssumptionSet::Gaap, ModelMode::Dlr).unwrap();
        assert!(!basis.applies_margin() && !basis.is_active() && !basis.is_catastrophic());

        for mode in [ModelMode::Dlr, ModelMode::DlrCat, ModelMode::Alr, ModelMode::AlrCat] {
            let err = CtrBasis::select(AssumptionSet::BestEstimate, mode).unwrap_err();
            assert!(matches!(err, ReserveError::NotImplemented(_)));
        }
    }

    #[test]
    fn test_rate_series_indexing() {
        let series = RateSeries::new(18, vec![0.1, 0.2, 0.3]);
        assert_eq!(series.get(19), Some(0.2));
        assert_eq!(series.get(17), None);
        assert_eq!(series.get(21), None);
        assert!(series.require(40, "incidence").is_err());
        assert_eq!(series.iter().last(), Some((20, 0.3)));
    }

    #[test]
    fn test_annual_to_monthly() {
        let monthly = annual_to_monthly(0.2);
        assert!(((1.0 - monthly).powi(12) - 0.8).abs() < 1e-12);
        assert_eq!(annual_to_monthly(1.5), 1.0);
    }
}
