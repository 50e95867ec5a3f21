//! Active life reserve (ALR) model
//!
//! Projects an in-force policy yearly from issue. Each policy year's benefit cost is
//! the reserve at incurral of a claim starting that year, weighted by incidence. The
//! nested claims are valued in parallel and memoized in a [`ClaimCostCache`] shared by
//! every record of the batch.

use super::actuarial::{reverse_cumsum, round_cents, shift_next, Continuance, Interpolation};
use super::cache::{ClaimCostCache, ClaimCostKey};
use super::disabled::DisabledLifeModel;
use super::discount::DiscountCurve;
use super::types::{model_name, ActiveReserveRow, NetBenefitMethod, ReserveResult};
use super::{ReserveContext, ReserveModel};
use crate::assumptions::{IncidenceAttributes, ModelMode};
use crate::error::{ReserveError, Result, StepExt};
use crate::policy::{ActivePolicy, ClaimAttributes, CoverageId, DiagnosisGroup, PolicyAttributes, RecordKey};
use crate::projection::dates::{add_years, age_at};
use crate::projection::{build_active_frame, AgeMethod, DurationRow, PolicyDates};
use chrono::Datelike;
use log::debug;
use rayon::prelude::*;
use std::sync::Arc;

/// Active lives: ALB ages, geometric midpoint survivorship, log-linear interpolation
const INTERPOLATION: Interpolation = Interpolation::LogLinear;

pub struct ActiveLifeModel {
    ctx: Arc<ReserveContext>,
    claims: DisabledLifeModel,
    cache: Arc<ClaimCostCache>,
}

/// Per-year decrements of an in-force policy
struct Decrements {
    mortality: Vec<f64>,
    lapse: Vec<f64>,
}

impl ActiveLifeModel {
    pub fn new(ctx: Arc<ReserveContext>) -> Self {
        Self::with_cache(ctx, Arc::new(ClaimCostCache::new()))
    }

    /// Model sharing a claim cost cache with other models
    ///
    /// Keys carry the valuation basis, so contexts may differ; they must read the same
    /// rate tables.
    pub fn with_cache(ctx: Arc<ReserveContext>, cache: Arc<ClaimCostCache>) -> Self {
        Self { claims: DisabledLifeModel::new(ctx.clone()), ctx, cache }
    }

    pub fn cache(&self) -> &ClaimCostCache {
        &self.cache
    }

    /// Projected reserve schedule from the policy year containing the valuation date
    ///
    /// Row `j` carries the reserve as of the valuation date plus `j` years.
    pub fn project(&self, attrs: &PolicyAttributes) -> Result<Vec<ActiveReserveRow>> {
        let ctx = &*self.ctx;
        let issue_age = age_at(attrs.birth_dt, attrs.policy_start_dt, AgeMethod::LastBirthday);

        let dates = PolicyDates {
            birth_dt: attrs.birth_dt,
            policy_start_dt: attrs.policy_start_dt,
            policy_end_dt: attrs.policy_end_dt,
            elimination_period: attrs.elimination_period,
            benefit_period: attrs.benefit_period,
        };
        let frame = build_active_frame(&dates, ctx.valuation_dt).step("Create Frame")?;
        let start = match frame.boundary_index() {
            Some(idx) => idx,
            None => return Ok(Vec::new()),
        };
        let rows = frame.rows();
        let n = rows.len();

        let decrements = self.decrements(attrs, issue_age, rows)?;
        let combined: Vec<f64> = decrements
            .mortality
            .iter()
            .zip(&decrements.lapse)
            .map(|(q, w)| 1.0 - (1.0 - q) * (1.0 - w))
            .collect();
        let lives = Continuance::from_decrements(&combined, INTERPOLATION);

        let incidence = self.incidence(attrs, rows).step("Get Incidence Rates")?;

        let premium: Vec<f64> = rows
            .iter()
            .map(|row| {
                if row.date_bd < attrs.premium_pay_to_dt {
                    attrs.annualized_premium()
                } else {
                    0.0
                }
            })
            .collect();

        let (claim_cost, benefit_cost) = match attrs.coverage {
            CoverageId::Rop => self.rop_benefit_cost(attrs, rows, &incidence, &premium).step("Model ROP Benefit")?,
            _ => {
                let cost = self.claim_costs(attrs, rows).step("Model Claim Cost")?;
                let benefit = cost.iter().zip(&incidence).map(|(c, i)| c * i).collect();
                (cost, benefit)
            }
        };

        let rate = ctx
            .resolver
            .resolve_interest(attrs.policy_start_dt.year(), ctx.assumption_set)
            .step("Get Interest Rate")?
            * ctx.modifiers.interest_modifier;
        let discount = DiscountCurve::annual(rate).factors(n);

        let pvfb = reverse_cumsum(&(0..n).map(|i| benefit_cost[i] * lives.md[i] * discount.md[i]).collect::<Vec<_>>());
        let pvfp = reverse_cumsum(&(0..n).map(|i| premium[i] * lives.bd[i] * discount.bd[i]).collect::<Vec<_>>());
        let pvfnb = net_benefits(ctx.net_benefit_method, &pvfb, &pvfp);

        // Reserve per unit issued, rolled back to the start of each year
        let alr_bd: Vec<f64> = (0..n)
            .map(|i| {
                if discount.bd[i] > 0.0 {
                    ((pvfb[i] - pvfnb[i]) / discount.bd[i]).max(0.0)
                } else {
                    0.0
                }
            })
            .collect();
        let alr_ed = shift_next(&alr_bd, 0.0);

        let (wt_bd, wt_ed) = frame.weights();
        let mut out = Vec::with_capacity(n - start);
        for (j, i) in (start..n).enumerate() {
            let row = &rows[i];
            out.push(ActiveReserveRow {
                date_bd: row.date_bd,
                date_ed: row.date_ed,
                duration_year: row.duration_year,
                age_attained: row.age_attained,
                termination_dt: row.termination_dt.unwrap_or(attrs.policy_end_dt),
                mortality_rate: decrements.mortality[i],
                lapse_rate: decrements.lapse[i],
                lives_bd: lives.bd[i],
                lives_md: lives.md[i],
                lives_ed: lives.ed[i],
                incidence_rate: incidence[i],
                claim_cost: claim_cost[i],
                benefit_cost: benefit_cost[i],
                premium: premium[i],
                discount_bd: discount.bd[i],
                discount_md: discount.md[i],
                discount_ed: discount.ed[i],
                pvfb: pvfb[i],
                pvfp: pvfp[i],
                pvfnb: pvfnb[i],
                alr_bd: alr_bd[i],
                alr_ed: alr_ed[i],
                wt_bd,
                wt_ed,
                date_alr: add_years(ctx.valuation_dt, j as u32)?,
                alr: round_cents(INTERPOLATION.blend(alr_bd[i], alr_ed[i], wt_bd, wt_ed)).max(0.0),
            });
        }
        Ok(out)
    }

    /// Mortality and lapse, or a single withdraw decrement when configured
    fn decrements(&self, attrs: &PolicyAttributes, issue_age: u32, rows: &[DurationRow]) -> Result<Decrements> {
        let ctx = &*self.ctx;
        let first_age = rows.first().map(|r| r.age_attained).unwrap_or(issue_age);
        let last_age = rows.last().map(|r| r.age_attained).unwrap_or(issue_age);
        let ages = first_age..=last_age;

        match &ctx.withdraw_table {
            Some(table) => {
                let withdraw = ctx
                    .resolver
                    .resolve_withdraw(table, attrs.gender, ctx.modifiers.withdraw_modifier, ctx.assumption_set, ages)
                    .step("Get Withdraw Rates")?;
                let mortality = rows
                    .iter()
                    .map(|row| withdraw.require(row.age_attained, "withdraw"))
                    .collect::<Result<Vec<f64>>>()
                    .step("Get Withdraw Rates")?;
                Ok(Decrements { lapse: vec![0.0; mortality.len()], mortality })
            }
            None => {
                let q = ctx
                    .resolver
                    .resolve_mortality(&ctx.mortality_table, attrs.gender, ctx.modifiers.mortality_modifier, ctx.assumption_set, ages)
                    .step("Get Mortality Rates")?;
                let last_year = rows.last().map(|r| r.duration_year).unwrap_or(1);
                let lapse = ctx
                    .resolver
                    .resolve_lapse(&ctx.lapse_table, issue_age, ctx.modifiers.lapse_modifier, ctx.assumption_set, 1..=last_year)
                    .step("Get Lapse Rates")?;
                Ok(Decrements {
                    mortality: rows
                        .iter()
                        .map(|row| q.require(row.age_attained, "mortality"))
                        .collect::<Result<Vec<f64>>>()
                        .step("Get Mortality Rates")?,
                    lapse: rows
                        .iter()
                        .map(|row| lapse.require(row.duration_year, "lapse"))
                        .collect::<Result<Vec<f64>>>()
                        .step("Get Lapse Rates")?,
                })
            }
        }
    }

    fn incidence(&self, attrs: &PolicyAttributes, rows: &[DurationRow]) -> Result<Vec<f64>> {
        let ctx = &*self.ctx;
        let (first_age, last_age) = match (rows.first(), rows.last()) {
            (Some(first), Some(last)) => (first.age_attained, last.age_attained),
            _ => return Ok(Vec::new()),
        };
        let inc_attrs = IncidenceAttributes {
            occupation_class: attrs.occupation_class,
            gender: attrs.gender,
            elimination_period: attrs.elimination_period,
            benefit_period: attrs.benefit_period,
            contract: attrs.contract,
            market: attrs.market,
            tobacco_usage: attrs.tobacco_usage,
        };
        let series = ctx
            .resolver
            .resolve_incidence(&inc_attrs, ctx.assumption_set, first_age..=last_age)?
            .scaled(ctx.modifiers.incidence_modifier);
        rows.iter().map(|row| series.require(row.age_attained, "incidence")).collect()
    }

    /// Hypothetical claim incurred at the start of a policy year
    pub fn nested_claim(&self, attrs: &PolicyAttributes, row: &DurationRow) -> Result<ClaimAttributes> {
        let termination_dt = row.termination_dt.ok_or_else(|| {
            ReserveError::InvalidRecord(format!("policy year {} has no claim termination date", row.duration_year))
        })?;
        Ok(ClaimAttributes {
            policy_id: attrs.policy_id.clone(),
            claim_id: format!("{}-Y{}", attrs.policy_id, row.duration_year),
            coverage: match attrs.coverage {
                CoverageId::Rop => CoverageId::Base,
                other => other,
            },
            gender: attrs.gender,
            birth_dt: attrs.birth_dt,
            incurred_dt: row.date_bd,
            termination_dt,
            elimination_period: attrs.elimination_period,
            contract: attrs.contract,
            benefit_period: attrs.benefit_period,
            diagnosis: DiagnosisGroup::Aggregate,
            occupation_class: attrs.occupation_class,
            cola_percent: attrs.cola_percent,
            benefit_amount: attrs.benefit_amount,
            residual_benefit_percent: attrs.riders.residual_benefit_percent,
        })
    }

    /// Reserve at incurral of the claim starting each policy year
    fn claim_costs(&self, attrs: &PolicyAttributes, rows: &[DurationRow]) -> Result<Vec<f64>> {
        let mode = match attrs.coverage {
            CoverageId::Cat => ModelMode::AlrCat,
            _ => ModelMode::Alr,
        };
        rows.par_iter()
            .map(|row| {
                let claim = self.nested_claim(attrs, row)?;
                self.cache
                    .get_or_try_insert_with(ClaimCostKey::new(&claim, mode, &self.ctx), || self.claims.claim_cost(&claim, mode))
            })
            .collect()
    }

    /// Return of premium benefit
    ///
    /// At the last policy year of each complete return interval the rider refunds the
    /// return percentage of the interval's gross premium, less expected claim payments
    /// in the interval and claims already paid. Expected claim payments are returned as
    /// the claim cost of each year.
    fn rop_benefit_cost(
        &self,
        attrs: &PolicyAttributes,
        rows: &[DurationRow],
        incidence: &[f64],
        premium: &[f64],
    ) -> Result<(Vec<f64>, Vec<f64>)> {
        let riders = &attrs.riders;
        let freq = riders
            .rop_return_freq
            .filter(|f| *f > 0)
            .ok_or_else(|| ReserveError::InvalidRecord("ROP requires a positive rop_return_freq".into()))?;
        let percent = riders
            .rop_return_percent
            .ok_or_else(|| ReserveError::InvalidRecord("ROP requires rop_return_percent".into()))?;
        let claims_paid = riders.rop_claims_paid.unwrap_or(0.0);
        let future_start = riders.rop_future_claims_start_dt.unwrap_or(attrs.policy_start_dt);

        let expected = rows
            .par_iter()
            .zip(incidence.par_iter())
            .map(|(row, rate)| {
                let claim = self.nested_claim(attrs, row)?;
                let payments: f64 = self
                    .claims
                    .project(&claim, ModelMode::Alr, claim.incurred_dt)?
                    .iter()
                    .filter(|r| r.date_bd >= future_start)
                    .map(|r| r.benefit_amount * r.lives_md)
                    .sum();
                Ok(rate * payments)
            })
            .collect::<Result<Vec<f64>>>()?;

        let interval = |row: &DurationRow| (row.duration_year - 1) / freq;
        let paid_interval = rows
            .iter()
            .find(|r| r.date_bd <= future_start && future_start < r.date_ed)
            .map(interval);

        let mut benefit = vec![0.0; rows.len()];
        let mut begin = 0;
        while begin < rows.len() {
            let current = interval(&rows[begin]);
            let end = rows[begin..]
                .iter()
                .position(|r| interval(r) != current)
                .map_or(rows.len(), |p| begin + p);
            if end - begin == freq as usize {
                let returned = premium[begin..end].iter().sum::<f64>() * percent;
                let claims = expected[begin..end].iter().sum::<f64>();
                let paid = if paid_interval == Some(current) { claims_paid } else { 0.0 };
                benefit[end - 1] = (returned - claims - paid).max(0.0);
            }
            begin = end;
        }
        Ok((expected, benefit))
    }
}

/// Present value of future net benefits under a proration method
///
/// Before the method's first net duration the full PVFB is recognised; from it on,
/// PVFNB is PVFP times the ratio of PVFB to PVFP at that duration.
pub fn net_benefits(method: NetBenefitMethod, pvfb: &[f64], pvfp: &[f64]) -> Vec<f64> {
    let first = method.first_net_duration() as usize - 1;
    let ratio = match (pvfb.get(first), pvfp.get(first)) {
        (Some(b), Some(p)) if *p > 0.0 => b / p,
        _ => 0.0,
    };
    (0..pvfb.len())
        .map(|i| if i >= first { pvfp[i] * ratio } else { pvfb[i] })
        .collect()
}

impl ReserveModel for ActiveLifeModel {
    type Record = ActivePolicy;
    type Row = ActiveReserveRow;

    fn key(&self, record: &ActivePolicy) -> RecordKey {
        record.key()
    }

    fn run(&self, record: &ActivePolicy) -> Result<ReserveResult<ActiveReserveRow>> {
        let attrs = record.attributes().step("Parse Record")?;
        let rows = self.project(&attrs)?;
        debug!("{} {}: {} projected years", record.policy_id, record.coverage_id, rows.len());

        Ok(ReserveResult {
            key: record.key(),
            model: model_name("Active", attrs.coverage),
            metadata: self.ctx.metadata.clone(),
            valuation_dt: self.ctx.valuation_dt,
            rows,
        })
    }
}
