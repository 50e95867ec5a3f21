//! Monthly benefit amounts by coverage variant
//!
//! - BASE and CAT pay the benefit amount for the exposed part of each month
//! - COLA pays the increase over the base benefit from cost-of-living compounding,
//!   frozen once the claimant reaches age 65
//! - RES pays the residual benefit percentage of the base benefit
//! - SIS pays the part of the benefit not replaced by social insurance

use crate::error::{ReserveError, Result};
use crate::policy::{ClaimAttributes, CoverageId};
use crate::projection::DurationRow;

/// Attained age after which COLA increases stop compounding
const COLA_CAP_AGE: u32 = 65;

/// Calculator for the benefit paid in each projected month of a claim
#[derive(Debug, Clone, PartialEq)]
pub struct BenefitCalculator {
    coverage: CoverageId,
    benefit_amount: f64,
    cola_percent: f64,
    residual_benefit_percent: f64,
    sis_probability: f64,
    /// Last duration year in which the COLA compounds
    cola_cap_year: u32,
}

impl BenefitCalculator {
    pub fn for_claim(attrs: &ClaimAttributes, age_incurred: u32, sis_probability: f64) -> Result<Self> {
        let residual_benefit_percent = match attrs.coverage {
            CoverageId::Res => attrs.residual_benefit_percent.ok_or_else(|| {
                ReserveError::InvalidRecord("RES coverage requires residual_benefit_percent".into())
            })?,
            CoverageId::Rop => {
                return Err(ReserveError::InvalidRecord("ROP benefits are not paid monthly".into()))
            }
            _ => 1.0,
        };
        Ok(Self {
            coverage: attrs.coverage,
            benefit_amount: attrs.benefit_amount,
            cola_percent: attrs.cola_percent,
            residual_benefit_percent,
            sis_probability,
            cola_cap_year: COLA_CAP_AGE.saturating_sub(age_incurred) + 1,
        })
    }

    /// Benefit payable over one projected month
    pub fn benefit(&self, row: &DurationRow) -> f64 {
        let base = row.exposure * self.benefit_amount;
        match self.coverage {
            CoverageId::Base | CoverageId::Cat => base,
            CoverageId::Cola => {
                let years = row.duration_year.min(self.cola_cap_year).saturating_sub(1);
                base * ((1.0 + self.cola_percent).powi(years as i32) - 1.0)
            }
            CoverageId::Res => base * self.residual_benefit_percent,
            CoverageId::Sis => base * (1.0 - self.sis_probability),
            CoverageId::Rop => 0.0,
        }
    }

    pub fn benefits(&self, rows: &[DurationRow]) -> Vec<f64> {
        rows.iter().map(|row| self.benefit(row)).collect()
    }
}
