//! Duration-indexed projection frames
//!
//! A disabled claim is laid out monthly from the incurred date and an active policy
//! yearly from the policy start date. Each row covers `[date_bd, date_ed)`. The first row
//! ending on or after the valuation date is the boundary row; its position of the
//! valuation date gives the interpolation weights used for every projected reserve.

use super::dates::{add_days, add_months, add_years, age_at, days_between, AgeMethod};
use crate::error::Result;
use crate::policy::BenefitPeriod;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Frame granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    Month,
    Year,
}

/// One modeled period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationRow {
    pub date_bd: NaiveDate,
    pub date_ed: NaiveDate,
    pub duration_year: u32,
    /// For yearly frames, the first claim month of the year
    pub duration_month: u32,
    pub age_attained: u32,
    /// Fraction of the period with benefits payable
    pub exposure: f64,
    /// Benefit termination date of a claim incurred at `date_bd` (active frames only)
    pub termination_dt: Option<NaiveDate>,
}

/// Ordered duration rows plus valuation-date weights
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionFrame {
    period: Period,
    valuation_dt: NaiveDate,
    rows: Vec<DurationRow>,
    boundary: Option<usize>,
    wt_bd: f64,
}

impl ProjectionFrame {
    fn new(period: Period, valuation_dt: NaiveDate, rows: Vec<DurationRow>) -> Self {
        let boundary = rows.iter().position(|r| r.date_ed >= valuation_dt);
        let wt_bd = boundary
            .map(|idx| {
                let row = &rows[idx];
                let span = days_between(row.date_bd, row.date_ed);
                if span <= 0 {
                    1.0
                } else {
                    (days_between(valuation_dt, row.date_ed) as f64 / span as f64).clamp(0.0, 1.0)
                }
            })
            .unwrap_or(1.0);
        Self { period, valuation_dt, rows, boundary, wt_bd }
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn valuation_dt(&self) -> NaiveDate {
        self.valuation_dt
    }

    pub fn rows(&self) -> &[DurationRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first row ending on or after the valuation date
    pub fn boundary_index(&self) -> Option<usize> {
        self.boundary
    }

    /// Interpolation weights `(wt_bd, wt_ed)` toward the valuation date; they sum to 1
    pub fn weights(&self) -> (f64, f64) {
        (self.wt_bd, 1.0 - self.wt_bd)
    }

    /// Rows from the boundary row onward
    pub fn retained(&self) -> &[DurationRow] {
        match self.boundary {
            Some(idx) => &self.rows[idx..],
            None => &[],
        }
    }

    /// Drop rows that end before the valuation date
    pub fn truncate_to_valuation(&mut self) {
        match self.boundary {
            Some(idx) => {
                self.rows.drain(..idx);
                self.boundary = Some(0);
            }
            None => self.rows.clear(),
        }
    }
}

/// Dates that bound a disabled claim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimDates {
    pub birth_dt: NaiveDate,
    pub incurred_dt: NaiveDate,
    pub termination_dt: NaiveDate,
    /// Elimination period in days
    pub elimination_period: u32,
}

impl ClaimDates {
    /// First day benefits are payable
    pub fn benefit_start_dt(&self) -> Result<NaiveDate> {
        add_days(self.incurred_dt, self.elimination_period)
    }
}

/// Fraction of `[bd, ed)` that falls inside `[start, end)`
fn overlap_fraction(bd: NaiveDate, ed: NaiveDate, start: NaiveDate, end: NaiveDate) -> f64 {
    let span = days_between(bd, ed);
    if span <= 0 {
        return 0.0;
    }
    let lo = bd.max(start);
    let hi = ed.min(end);
    (days_between(lo, hi) as f64 / span as f64).clamp(0.0, 1.0)
}

/// Monthly frame from the incurred date to the termination date, truncated to the valuation date
pub fn build_disabled_frame(claim: &ClaimDates, valuation_dt: NaiveDate) -> Result<ProjectionFrame> {
    let benefit_start = claim.benefit_start_dt()?;
    let mut rows = Vec::new();
    let mut k = 0u32;
    loop {
        let date_bd = add_months(claim.incurred_dt, k)?;
        if date_bd >= claim.termination_dt {
            break;
        }
        let date_ed = add_months(claim.incurred_dt, k + 1)?;
        rows.push(DurationRow {
            date_bd,
            date_ed,
            duration_year: k / 12 + 1,
            duration_month: k + 1,
            age_attained: age_at(claim.birth_dt, date_bd, AgeMethod::NearestBirthday),
            exposure: overlap_fraction(date_bd, date_ed, benefit_start, claim.termination_dt),
            termination_dt: None,
        });
        k += 1;
    }

    let mut frame = ProjectionFrame::new(Period::Month, valuation_dt, rows);
    frame.truncate_to_valuation();
    Ok(frame)
}

/// Dates and terms that bound an active policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyDates {
    pub birth_dt: NaiveDate,
    pub policy_start_dt: NaiveDate,
    pub policy_end_dt: NaiveDate,
    pub elimination_period: u32,
    pub benefit_period: BenefitPeriod,
}

impl PolicyDates {
    /// Benefit termination date of a claim incurred on `incurred_dt`
    pub fn claim_termination_dt(&self, incurred_dt: NaiveDate) -> Result<NaiveDate> {
        match self.benefit_period {
            BenefitPeriod::Months(n) => add_months(add_days(incurred_dt, self.elimination_period)?, n),
            BenefitPeriod::ToAge(_) => Ok(self.policy_end_dt),
            BenefitPeriod::Life => add_years(self.birth_dt, 120),
        }
    }
}

/// Yearly frame from the policy start date to the policy end date
///
/// Rows before the valuation date are kept, since net premiums are set from issue.
pub fn build_active_frame(policy: &PolicyDates, valuation_dt: NaiveDate) -> Result<ProjectionFrame> {
    let mut rows = Vec::new();
    let mut k = 0u32;
    loop {
        let date_bd = add_years(policy.policy_start_dt, k)?;
        if date_bd >= policy.policy_end_dt {
            break;
        }
        rows.push(DurationRow {
            date_bd,
            date_ed: add_years(policy.policy_start_dt, k + 1)?,
            duration_year: k + 1,
            duration_month: k * 12 + 1,
            age_attained: age_at(policy.birth_dt, date_bd, AgeMethod::LastBirthday),
            exposure: 1.0,
            termination_dt: Some(policy.claim_termination_dt(date_bd)?),
        });
        k += 1;
    }
    Ok(ProjectionFrame::new(Period::Year, valuation_dt, rows))
}
