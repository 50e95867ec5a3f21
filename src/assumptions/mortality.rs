//! Mortality and withdraw rates from the CSO tables

use super::{AssumptionResolver, AssumptionSet, RateSeries};
use crate::error::Result;
use crate::policy::Gender;
use std::ops::RangeInclusive;

impl AssumptionResolver {
    /// Annual mortality rates by attained age from a named CSO table (e.g. "01CSO")
    pub fn resolve_mortality(
        &self,
        table_name: &str,
        gender: Gender,
        modifier: f64,
        assumption_set: AssumptionSet,
        ages: RangeInclusive<u32>,
    ) -> Result<RateSeries> {
        assumption_set.ensure_implemented()?;
        let table = self.table(&format!("mortality-{}", table_name))?;
        let start = *ages.start();
        let rates = ages
            .map(|age| {
                let q = table.rate(&[gender.as_str(), &age.to_string()])?;
                Ok((q * modifier).clamp(0.0, 1.0))
            })
            .collect::<Result<Vec<f64>>>()?;
        Ok(RateSeries::new(start, rates))
    }

    /// Withdraw rates: a CSO table used as a single combined decrement
    pub fn resolve_withdraw(
        &self,
        table_name: &str,
        gender: Gender,
        modifier: f64,
        assumption_set: AssumptionSet,
        ages: RangeInclusive<u32>,
    ) -> Result<RateSeries> {
        self.resolve_mortality(table_name, gender, modifier, assumption_set, ages)
    }
}
