//! Core types for reserve calculations

use crate::error::{ReserveError, Result};
use crate::policy::{CoverageId, RecordKey};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Net benefit proration method for active reserves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetBenefitMethod {
    /// Net level premium: ratio set at duration 1
    Nlp,
    /// One-year preliminary term
    Pt1,
    /// Two-year preliminary term
    Pt2,
}

impl NetBenefitMethod {
    /// First policy duration at which premiums fund net benefits
    pub fn first_net_duration(&self) -> u32 {
        match self {
            NetBenefitMethod::Nlp => 1,
            NetBenefitMethod::Pt1 => 2,
            NetBenefitMethod::Pt2 => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NetBenefitMethod::Nlp => "NLP",
            NetBenefitMethod::Pt1 => "PT1",
            NetBenefitMethod::Pt2 => "PT2",
        }
    }
}

impl FromStr for NetBenefitMethod {
    type Err = ReserveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NLP" => Ok(NetBenefitMethod::Nlp),
            "PT1" => Ok(NetBenefitMethod::Pt1),
            "PT2" => Ok(NetBenefitMethod::Pt2),
            _ => Err(ReserveError::UnknownNetBenefitMethod(s.trim().to_string())),
        }
    }
}

impl fmt::Display for NetBenefitMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provenance stamped on every result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub model_version: String,
    pub run_date_time: NaiveDateTime,
    pub source: String,
}

impl RunMetadata {
    pub fn new(source: impl Into<String>, run_date_time: NaiveDateTime) -> Self {
        Self {
            model_version: env!("CARGO_PKG_VERSION").to_string(),
            run_date_time,
            source: source.into(),
        }
    }
}

/// Model name for a coverage, e.g. `DisabledBase` or `ActiveRop`
pub fn model_name(prefix: &str, coverage: CoverageId) -> String {
    let code = coverage.as_str();
    let mut name = String::with_capacity(prefix.len() + code.len());
    name.push_str(prefix);
    name.push_str(&code[..1]);
    name.push_str(&code[1..].to_ascii_lowercase());
    name
}

/// One projected month of a disabled claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisabledReserveRow {
    pub date_bd: NaiveDate,
    pub date_ed: NaiveDate,
    pub duration_year: u32,
    pub duration_month: u32,
    pub age_attained: u32,
    pub exposure: f64,
    pub ctr: f64,
    pub lives_bd: f64,
    pub lives_md: f64,
    pub lives_ed: f64,
    pub benefit_amount: f64,
    pub discount_bd: f64,
    pub discount_md: f64,
    pub discount_ed: f64,
    pub pvfb_bd: f64,
    pub pvfb_ed: f64,
    pub wt_bd: f64,
    pub wt_ed: f64,
    pub date_dlr: NaiveDate,
    pub dlr: f64,
}

/// One projected policy year of an active policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveReserveRow {
    pub date_bd: NaiveDate,
    pub date_ed: NaiveDate,
    pub duration_year: u32,
    pub age_attained: u32,
    pub termination_dt: NaiveDate,
    pub mortality_rate: f64,
    pub lapse_rate: f64,
    pub lives_bd: f64,
    pub lives_md: f64,
    pub lives_ed: f64,
    pub incidence_rate: f64,
    pub claim_cost: f64,
    pub benefit_cost: f64,
    pub premium: f64,
    pub discount_bd: f64,
    pub discount_md: f64,
    pub discount_ed: f64,
    pub pvfb: f64,
    pub pvfp: f64,
    pub pvfnb: f64,
    pub alr_bd: f64,
    pub alr_ed: f64,
    pub wt_bd: f64,
    pub wt_ed: f64,
    pub date_alr: NaiveDate,
    pub alr: f64,
}

/// A projected row that carries a reserve as of a date
pub trait ReserveRow {
    fn reserve_dt(&self) -> NaiveDate;
    fn reserve(&self) -> f64;
}

impl ReserveRow for DisabledReserveRow {
    fn reserve_dt(&self) -> NaiveDate {
        self.date_dlr
    }

    fn reserve(&self) -> f64 {
        self.dlr
    }
}

impl ReserveRow for ActiveReserveRow {
    fn reserve_dt(&self) -> NaiveDate {
        self.date_alr
    }

    fn reserve(&self) -> f64 {
        self.alr
    }
}

/// Full projected reserve schedule of one record
#[derive(Debug, Clone)]
pub struct ReserveResult<R> {
    pub key: RecordKey,
    pub model: String,
    pub metadata: RunMetadata,
    pub valuation_dt: NaiveDate,
    /// Ordered by duration
    pub rows: Vec<R>,
}

impl<R: ReserveRow> ReserveResult<R> {
    /// Reserve at the first row on or after the valuation date; zero for an empty schedule
    pub fn time_zero(&self) -> TimeZeroRow {
        let (reserve_dt, reserve) = self
            .rows
            .first()
            .map(|row| (row.reserve_dt(), row.reserve()))
            .unwrap_or((self.valuation_dt, 0.0));
        TimeZeroRow {
            policy_id: self.key.policy_id.clone(),
            claim_id: self.key.claim_id.clone(),
            coverage_id: self.key.coverage_id.clone(),
            model: self.model.clone(),
            valuation_dt: self.valuation_dt,
            reserve_dt,
            reserve,
        }
    }
}

/// First-duration summary of one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct TimeZeroRow {
    pub policy_id: String,
    pub claim_id: Option<String>,
    pub coverage_id: String,
    pub model: String,
    pub valuation_dt: NaiveDate,
    pub reserve_dt: NaiveDate,
    pub reserve: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::fixtures::date;

    #[test]
    fn test_net_benefit_method_parse() {
        assert_eq!("nlp".parse::<NetBenefitMethod>().unwrap(), NetBenefitMethod::Nlp);
        assert_eq!("PT2".parse::<NetBenefitMethod>().unwrap().first_net_duration(), 3);
        assert!(matches!(
            "PT3".parse::<NetBenefitMethod>(),
            Err(ReserveError::UnknownNetBenefitMethod(_))
        ));
    }

    #[test]
    fn test_model_names() {
        assert_eq!(model_name("Disabled", CoverageId::Base), "DisabledBase");
        assert_eq!(model_name("Active", CoverageId::Rop), "ActiveRop");
    }

    #[test]
    fn test_empty_schedule_time_zero() {
        let result: ReserveResult<DisabledReserveRow> = ReserveResult {
            key: RecordKey { policy_id: "P1".into(), claim_id: Some("C1".into()), coverage_id: "BASE".into() },
            model: "DisabledBase".into(),
            metadata: RunMetadata::new("test", date(2020, 1, 1).and_hms_opt(0, 0, 0).unwrap()),
            valuation_dt: date(2020, 12, 31),
            rows: Vec::new(),
        };
        let t0 = result.time_zero();
        assert_eq!(t0.reserve, 0.0);
        assert_eq!(t0.reserve_dt, date(2020, 12, 31));
    }
}
