//! Disabled life reserve (DLR) model
//!
//! Projects an open claim month by month from the valuation date to benefit
//! termination, then values the remaining benefits per surviving claimant.

use super::actuarial::{reverse_cumsum, round_cents, shift_next, Continuance, Interpolation};
use super::benefits::BenefitCalculator;
use super::discount::DiscountCurve;
use super::types::{model_name, DisabledReserveRow, ReserveResult};
use super::{ReserveContext, ReserveModel};
use crate::assumptions::{ModelMode, TerminationAttributes};
use crate::error::{Result, StepExt};
use crate::policy::{ClaimAttributes, CoverageId, DisabledClaim, RecordKey};
use crate::projection::dates::{add_months, age_at};
use crate::projection::{build_disabled_frame, AgeMethod, ClaimDates};
use chrono::{Datelike, NaiveDate};
use log::debug;
use std::sync::Arc;

/// Disabled claimants: ACB ages, arithmetic midpoint survivorship, linear interpolation
const INTERPOLATION: Interpolation = Interpolation::Linear;

pub struct DisabledLifeModel {
    ctx: Arc<ReserveContext>,
}

impl DisabledLifeModel {
    pub fn new(ctx: Arc<ReserveContext>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &ReserveContext {
        &self.ctx
    }

    /// Projected reserve schedule of a claim valued at `valuation_dt`
    ///
    /// Row `j` carries the reserve as of `valuation_dt` plus `j` months. An empty
    /// frame yields an empty schedule.
    pub fn project(
        &self,
        attrs: &ClaimAttributes,
        mode: ModelMode,
        valuation_dt: NaiveDate,
    ) -> Result<Vec<DisabledReserveRow>> {
        let ctx = &*self.ctx;
        let age_incurred = age_at(attrs.birth_dt, attrs.incurred_dt, AgeMethod::NearestBirthday);

        let claim_dates = ClaimDates {
            birth_dt: attrs.birth_dt,
            incurred_dt: attrs.incurred_dt,
            termination_dt: attrs.termination_dt,
            elimination_period: attrs.elimination_period,
        };
        let frame = build_disabled_frame(&claim_dates, valuation_dt).step("Create Frame")?;
        let rows = frame.rows();
        let last_month = match rows.last() {
            Some(row) => row.duration_month,
            None => return Ok(Vec::new()),
        };

        let termination = TerminationAttributes {
            occupation_class: attrs.occupation_class,
            gender: attrs.gender,
            elimination_period: attrs.elimination_period,
            age_incurred,
            benefit_period: attrs.benefit_period,
            cola_flag: attrs.cola_flag(),
            contract: attrs.contract,
            diagnosis: attrs.diagnosis,
        };
        let ctr_series = ctx
            .resolver
            .resolve_termination(&termination, mode, ctx.assumption_set, last_month)
            .step("Get Claim Termination Rates")?
            .scaled(ctx.modifiers.ctr_modifier);
        let ctr = rows
            .iter()
            .map(|row| ctr_series.require(row.duration_month, "ctr").map(|q| q.clamp(0.0, 1.0)))
            .collect::<Result<Vec<f64>>>()
            .step("Get Claim Termination Rates")?;

        let lives = Continuance::from_decrements(&ctr, INTERPOLATION);

        let benefits = BenefitCalculator::for_claim(attrs, age_incurred, ctx.sis_probability)
            .step("Calculate Benefit Amount")?
            .benefits(rows);

        let rate = ctx
            .resolver
            .resolve_interest(attrs.incurred_dt.year(), ctx.assumption_set)
            .step("Get Interest Rate")?
            * ctx.modifiers.interest_modifier;
        let discount = DiscountCurve::monthly(rate).factors(rows.len());

        let pv: Vec<f64> = (0..rows.len())
            .map(|i| benefits[i] * lives.md[i] * discount.md[i])
            .collect();
        let pvfb_bd = reverse_cumsum(&pv);
        let pvfb_ed = shift_next(&pvfb_bd, 0.0);

        let (wt_bd, wt_ed) = frame.weights();
        let mut out = Vec::with_capacity(rows.len());
        for (j, row) in rows.iter().enumerate() {
            let pvfb = INTERPOLATION.blend(pvfb_bd[j], pvfb_ed[j], wt_bd, wt_ed);
            let disc = INTERPOLATION.blend(discount.bd[j], discount.ed[j], wt_bd, wt_ed);
            let alive = INTERPOLATION.blend(lives.bd[j], lives.ed[j], wt_bd, wt_ed);
            let dlr = if disc * alive > 0.0 { pvfb / disc / alive } else { 0.0 };

            out.push(DisabledReserveRow {
                date_bd: row.date_bd,
                date_ed: row.date_ed,
                duration_year: row.duration_year,
                duration_month: row.duration_month,
                age_attained: row.age_attained,
                exposure: row.exposure,
                ctr: ctr[j],
                lives_bd: lives.bd[j],
                lives_md: lives.md[j],
                lives_ed: lives.ed[j],
                benefit_amount: benefits[j],
                discount_bd: discount.bd[j],
                discount_md: discount.md[j],
                discount_ed: discount.ed[j],
                pvfb_bd: pvfb_bd[j],
                pvfb_ed: pvfb_ed[j],
                wt_bd,
                wt_ed,
                date_dlr: add_months(valuation_dt, j as u32)?,
                dlr: round_cents(dlr).max(0.0),
            });
        }
        Ok(out)
    }

    /// Reserve at incurral of a hypothetical claim
    pub fn claim_cost(&self, attrs: &ClaimAttributes, mode: ModelMode) -> Result<f64> {
        Ok(self
            .project(attrs, mode, attrs.incurred_dt)?
            .first()
            .map(|row| row.dlr)
            .unwrap_or(0.0))
    }
}

impl ReserveModel for DisabledLifeModel {
    type Record = DisabledClaim;
    type Row = DisabledReserveRow;

    fn key(&self, record: &DisabledClaim) -> RecordKey {
        record.key()
    }

    fn run(&self, record: &DisabledClaim) -> Result<ReserveResult<DisabledReserveRow>> {
        let attrs = record.attributes().step("Parse Record")?;
        let mode = match attrs.coverage {
            CoverageId::Cat => ModelMode::DlrCat,
            _ => ModelMode::Dlr,
        };
        let rows = self.project(&attrs, mode, self.ctx.valuation_dt)?;
        debug!("{} {} {}: {} projected months", record.policy_id, record.claim_id, mode.as_str(), rows.len());

        Ok(ReserveResult {
            key: record.key(),
            model: model_name("Disabled", attrs.coverage),
            metadata: self.ctx.metadata.clone(),
            valuation_dt: self.ctx.valuation_dt,
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::AssumptionSet;
    use crate::error::ReserveError;
    use crate::policy::fixtures::{date, sample_claim, short_tail_claim};
    use crate::projection::dates::{add_days, add_years};
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn model(set: AssumptionSet, valuation_dt: NaiveDate) -> DisabledLifeModel {
        DisabledLifeModel::new(Arc::new(ReserveContext::for_tests(set, valuation_dt)))
    }

    #[test]
    fn test_short_tail_claim_runs_off_to_zero() {
        let model = model(AssumptionSet::Stat, date(2017, 3, 15));
        let result = model.run(&short_tail_claim()).unwrap();
        let rows = &result.rows;

        assert_eq!(rows.len(), 37);
        assert_eq!(rows[0].date_dlr, date(2017, 3, 15));
        assert!(rows[0].dlr > 0.0);
        for pair in rows.windows(2) {
            assert!(pair[1].dlr < pair[0].dlr, "{} !< {}", pair[1].dlr, pair[0].dlr);
        }
        let last = rows.last().unwrap();
        assert_eq!(last.dlr, 0.0);
        assert!(last.date_dlr <= date(2020, 3, 15));
    }

    #[test]
    fn test_survivorship_bounded_and_non_increasing() {
        let model = model(AssumptionSet::Gaap, date(2010, 6, 30));
        let rows = model.run(&sample_claim()).unwrap().rows;
        for row in &rows {
            assert!((0.0..=1.0).contains(&row.lives_ed));
            assert!(row.lives_ed <= row.lives_md && row.lives_md <= row.lives_bd);
        }
        for pair in rows.windows(2) {
            assert_relative_eq!(pair[0].lives_ed, pair[1].lives_bd);
        }
    }

    #[test]
    fn test_pvfb_boundary_and_weights() {
        let model = model(AssumptionSet::Stat, date(2010, 6, 30));
        let rows = model.run(&sample_claim()).unwrap().rows;
        let last = rows.last().unwrap();
        assert_relative_eq!(last.pvfb_bd, last.benefit_amount * last.lives_md * last.discount_md, max_relative = 1e-12);
        assert_eq!(last.pvfb_ed, 0.0);
        assert_relative_eq!(rows[0].wt_bd + rows[0].wt_ed, 1.0, epsilon = 1e-15);
    }

    #[test]
    fn test_stat_reserve_exceeds_gaap() {
        let stat = model(AssumptionSet::Stat, date(2010, 6, 30)).run(&sample_claim()).unwrap();
        let gaap = model(AssumptionSet::Gaap, date(2010, 6, 30)).run(&sample_claim()).unwrap();
        assert!(stat.rows[0].dlr > gaap.rows[0].dlr);
    }

    #[test]
    fn test_closed_claim_is_zero_reserve() {
        let model = model(AssumptionSet::Stat, date(2021, 1, 1));
        let result = model.run(&short_tail_claim()).unwrap();
        assert!(result.rows.is_empty());
        assert_eq!(result.time_zero().reserve, 0.0);
    }

    #[test]
    fn test_claim_cost_at_incurral() {
        let model = model(AssumptionSet::Stat, date(2017, 3, 15));
        let attrs = short_tail_claim().attributes().unwrap();
        let cost = model.claim_cost(&attrs, ModelMode::Alr).unwrap();
        let rows = model.project(&attrs, ModelMode::Alr, attrs.incurred_dt).unwrap();
        assert_eq!(rows[0].wt_bd, 1.0);
        assert_relative_eq!(cost, round_cents(rows[0].pvfb_bd));
    }

    #[test]
    fn test_best_estimate_fails_per_record() {
        let model = model(AssumptionSet::BestEstimate, date(2017, 3, 15));
        let err = model.run(&short_tail_claim()).unwrap_err();
        assert!(matches!(err.root(), ReserveError::NotImplemented(_)));
        assert_eq!(err.kind(), "NotImplementedError");
    }

    #[test]
    fn test_bad_benefit_period_is_configuration_error() {
        let mut claim = short_tail_claim();
        claim.idi_benefit_period = "9Y".into();
        let err = model(AssumptionSet::Stat, date(2017, 3, 15)).run(&claim).unwrap_err();
        assert_eq!(err.kind(), "ConfigurationError");
        assert_eq!(err.trace()[0], "step 'Parse Record' failed");
    }

    prop_compose! {
        fn arb_open_claim()(
            birth_year in 1935i32..=1975,
            age_incurred in 18u32..=75,
            days_past_birthday in 0u32..=150,
            months_open in 1u32..=360,
            elimination_period in prop::sample::select(vec![0u32, 7, 14, 30, 60, 90, 180, 360, 720]),
            gender in prop::sample::select(vec!["M", "F"]),
            occupation_class in prop::sample::select(vec!["1", "2", "3", "4", "M"]),
            contract in prop::sample::select(vec!["AS", "AO", "SO"]),
            benefit_period in prop::sample::select(vec!["6M", "24M", "60M", "TO65", "TO67", "TO70", "LIFE"]),
            diagnosis in prop::sample::select(vec!["VERY_LOW", "LOW", "MID", "HIGH", "VERY_HIGH", "AG"]),
            coverage in prop::sample::select(vec!["BASE", "CAT", "COLA", "SIS"]),
            cola_percent in prop::sample::select(vec![0.0, 0.03]),
        ) -> DisabledClaim {
            let birth_dt = date(birth_year, 1 + (age_incurred % 12), 1);
            let incurred_dt = add_days(add_years(birth_dt, age_incurred).unwrap(), days_past_birthday).unwrap();
            DisabledClaim {
                gender: gender.into(),
                birth_dt,
                incurred_dt,
                termination_dt: add_months(incurred_dt, months_open).unwrap(),
                elimination_period,
                idi_contract: contract.into(),
                idi_benefit_period: benefit_period.into(),
                idi_diagnosis_grp: diagnosis.into(),
                idi_occupation_class: occupation_class.into(),
                coverage_id: coverage.into(),
                cola_percent,
                ..short_tail_claim()
            }
        }
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(32))]

        #[test]
        fn test_survivorship_bounded_for_any_claim(
            claim in arb_open_claim(),
            valuation_offset in 0u32..=12_000,
            gaap in any::<bool>(),
        ) {
            let set = if gaap { AssumptionSet::Gaap } else { AssumptionSet::Stat };
            let valuation_dt = add_days(claim.incurred_dt, valuation_offset).unwrap();
            let rows = model(set, valuation_dt).run(&claim).unwrap().rows;
            if let Some(first) = rows.first() {
                prop_assert_eq!(first.lives_bd, 1.0);
            }
            for row in &rows {
                prop_assert!((0.0..=1.0).contains(&row.lives_ed));
                prop_assert!(row.lives_ed <= row.lives_md && row.lives_md <= row.lives_bd);
                prop_assert!(row.dlr >= 0.0 && row.dlr.is_finite());
            }
            for pair in rows.windows(2) {
                prop_assert_eq!(pair[0].lives_ed, pair[1].lives_bd);
            }
        }
    }
}
