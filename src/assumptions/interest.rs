//! Valuation interest rates by calendar year bracket

use super::{AssumptionResolver, AssumptionSet};
use crate::error::{ReserveError, Result};

impl AssumptionResolver {
    /// Annual valuation interest rate for the bracket containing `reference_year`
    pub fn resolve_interest(&self, reference_year: i32, assumption_set: AssumptionSet) -> Result<f64> {
        assumption_set.ensure_implemented()?;
        let table = self.table("interest")?;
        for (key, values) in table.rows() {
            let bounds = (key[0].parse::<i32>(), key[1].parse::<i32>());
            let (min_year, max_year) = match bounds {
                (Ok(lo), Ok(hi)) => (lo, hi),
                _ => return Err(ReserveError::table_format("interest", format!("bad year bracket {:?}", key))),
            };
            if (min_year..=max_year).contains(&reference_year) {
                return Ok(values[0]);
            }
        }
        Err(ReserveError::lookup("interest", reference_year.to_string()))
    }
}
