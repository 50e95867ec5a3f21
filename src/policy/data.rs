//! Policy and claim records in extract form, and their typed attributes

use super::codes::{
    BenefitPeriod, ColaFlag, Contract, CoverageId, DiagnosisGroup, Gender, Market,
    OccupationClass, PremiumFrequency, TobaccoUsage,
};
use crate::error::{ReserveError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Sparse rider attributes merged onto a base record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiderAttributes {
    pub residual_benefit_percent: Option<f64>,
    /// Return of premium interval in years
    pub rop_return_freq: Option<u32>,
    pub rop_return_percent: Option<f64>,
    pub rop_claims_paid: Option<f64>,
    pub rop_future_claims_start_dt: Option<NaiveDate>,
}

impl RiderAttributes {
    /// Set one attribute from its extract name and text value
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        let value = value.trim();
        let bad = || ReserveError::InvalidRecord(format!("bad value '{}' for rider attribute {}", value, name));
        match name.trim().to_ascii_lowercase().as_str() {
            "residual_benefit_percent" => {
                self.residual_benefit_percent = Some(value.parse().map_err(|_| bad())?)
            }
            "rop_return_freq" => self.rop_return_freq = Some(value.parse().map_err(|_| bad())?),
            "rop_return_percent" => self.rop_return_percent = Some(value.parse().map_err(|_| bad())?),
            "rop_claims_paid" => self.rop_claims_paid = Some(value.parse().map_err(|_| bad())?),
            "rop_future_claims_start_dt" => {
                self.rop_future_claims_start_dt =
                    Some(NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| bad())?)
            }
            other => {
                return Err(ReserveError::InvalidRecord(format!("unknown rider attribute: {}", other)))
            }
        }
        Ok(())
    }
}

/// Natural key of a record, carried onto results and error records
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub policy_id: String,
    pub claim_id: Option<String>,
    pub coverage_id: String,
}

/// An open claim as it appears in the disabled lives extract
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct DisabledClaim {
    pub policy_id: String,
    pub claim_id: String,
    pub coverage_id: String,
    pub gender: String,
    pub birth_dt: NaiveDate,
    pub incurred_dt: NaiveDate,
    pub termination_dt: NaiveDate,
    /// Elimination period in days
    pub elimination_period: u32,
    pub idi_contract: String,
    pub idi_benefit_period: String,
    pub idi_diagnosis_grp: String,
    pub idi_occupation_class: String,
    pub cola_percent: f64,
    /// Monthly benefit amount
    pub benefit_amount: f64,
    #[serde(skip)]
    pub riders: RiderAttributes,
}

/// An in-force policy as it appears in the active lives extract
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ActivePolicy {
    pub policy_id: String,
    pub coverage_id: String,
    pub gender: String,
    pub birth_dt: NaiveDate,
    pub tobacco_usage: String,
    pub policy_start_dt: NaiveDate,
    pub policy_end_dt: NaiveDate,
    pub premium_pay_to_dt: NaiveDate,
    pub elimination_period: u32,
    pub idi_market: String,
    pub idi_contract: String,
    pub idi_benefit_period: String,
    pub idi_occupation_class: String,
    pub cola_percent: f64,
    /// Modal gross premium
    pub gross_premium: f64,
    pub gross_premium_freq: String,
    /// Monthly benefit amount
    pub benefit_amount: f64,
    #[serde(skip)]
    pub riders: RiderAttributes,
}

/// Typed attributes of a disabled claim, real or hypothetical
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimAttributes {
    pub policy_id: String,
    pub claim_id: String,
    pub coverage: CoverageId,
    pub gender: Gender,
    pub birth_dt: NaiveDate,
    pub incurred_dt: NaiveDate,
    pub termination_dt: NaiveDate,
    pub elimination_period: u32,
    pub contract: Contract,
    pub benefit_period: BenefitPeriod,
    pub diagnosis: DiagnosisGroup,
    pub occupation_class: OccupationClass,
    pub cola_percent: f64,
    pub benefit_amount: f64,
    pub residual_benefit_percent: Option<f64>,
}

impl ClaimAttributes {
    pub fn cola_flag(&self) -> ColaFlag {
        ColaFlag::from_percent(self.cola_percent)
    }
}

/// Typed attributes of an in-force policy
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyAttributes {
    pub policy_id: String,
    pub coverage: CoverageId,
    pub gender: Gender,
    pub birth_dt: NaiveDate,
    pub tobacco_usage: TobaccoUsage,
    pub policy_start_dt: NaiveDate,
    pub policy_end_dt: NaiveDate,
    pub premium_pay_to_dt: NaiveDate,
    pub elimination_period: u32,
    pub market: Market,
    pub contract: Contract,
    pub benefit_period: BenefitPeriod,
    pub occupation_class: OccupationClass,
    pub cola_percent: f64,
    pub gross_premium: f64,
    pub premium_frequency: PremiumFrequency,
    pub benefit_amount: f64,
    pub riders: RiderAttributes,
}

impl PolicyAttributes {
    pub fn cola_flag(&self) -> ColaFlag {
        ColaFlag::from_percent(self.cola_percent)
    }

    /// Gross premium per policy year
    pub fn annualized_premium(&self) -> f64 {
        self.gross_premium * self.premium_frequency.payments_per_year()
    }
}

fn require<T>(value: Option<T>, coverage: CoverageId, name: &str) -> Result<T> {
    value.ok_or_else(|| {
        ReserveError::InvalidRecord(format!("{} coverage requires rider attribute {}", coverage.as_str(), name))
    })
}

impl DisabledClaim {
    pub fn key(&self) -> RecordKey {
        RecordKey {
            policy_id: self.policy_id.clone(),
            claim_id: Some(self.claim_id.clone()),
            coverage_id: self.coverage_id.clone(),
        }
    }

    /// Parse the extract codes into typed attributes
    pub fn attributes(&self) -> Result<ClaimAttributes> {
        let coverage: CoverageId = self.coverage_id.parse()?;
        let residual_benefit_percent = match coverage {
            CoverageId::Res => Some(require(self.riders.residual_benefit_percent, coverage, "residual_benefit_percent")?),
            CoverageId::Rop => {
                return Err(ReserveError::InvalidRecord("ROP is not a disabled life coverage".into()))
            }
            _ => None,
        };

        Ok(ClaimAttributes {
            policy_id: self.policy_id.clone(),
            claim_id: self.claim_id.clone(),
            coverage,
            gender: self.gender.parse()?,
            birth_dt: self.birth_dt,
            incurred_dt: self.incurred_dt,
            termination_dt: self.termination_dt,
            elimination_period: self.elimination_period,
            contract: self.idi_contract.parse()?,
            benefit_period: self.idi_benefit_period.parse()?,
            diagnosis: self.idi_diagnosis_grp.parse()?,
            occupation_class: self.idi_occupation_class.parse()?,
            cola_percent: self.cola_percent,
            benefit_amount: self.benefit_amount,
            residual_benefit_percent,
        })
    }
}

impl ActivePolicy {
    pub fn key(&self) -> RecordKey {
        RecordKey {
            policy_id: self.policy_id.clone(),
            claim_id: None,
            coverage_id: self.coverage_id.clone(),
        }
    }

    /// Parse the extract codes into typed attributes
    pub fn attributes(&self) -> Result<PolicyAttributes> {
        let coverage: CoverageId = self.coverage_id.parse()?;
        match coverage {
            CoverageId::Res => {
                require(self.riders.residual_benefit_percent, coverage, "residual_benefit_percent")?;
            }
            CoverageId::Rop => {
                require(self.riders.rop_return_freq, coverage, "rop_return_freq")?;
                require(self.riders.rop_return_percent, coverage, "rop_return_percent")?;
                if self.riders.rop_return_freq == Some(0) {
                    return Err(ReserveError::InvalidRecord("rop_return_freq must be positive".into()));
                }
            }
            _ => {}
        }

        Ok(PolicyAttributes {
            policy_id: self.policy_id.clone(),
            coverage,
            gender: self.gender.parse()?,
            birth_dt: self.birth_dt,
            tobacco_usage: self.tobacco_usage.parse()?,
            policy_start_dt: self.policy_start_dt,
            policy_end_dt: self.policy_end_dt,
            premium_pay_to_dt: self.premium_pay_to_dt,
            elimination_period: self.elimination_period,
            market: self.idi_market.parse()?,
            contract: self.idi_contract.parse()?,
            benefit_period: self.idi_benefit_period.parse()?,
            occupation_class: self.idi_occupation_class.parse()?,
            cola_percent: self.cola_percent,
            gross_premium: self.gross_premium,
            premium_frequency: self.gross_premium_freq.parse()?,
            benefit_amount: self.benefit_amount,
            riders: self.riders.clone(),
        })
    }
}
