//! Voluntary lapse rates by issue age band and policy duration

use super::{AssumptionResolver, AssumptionSet, RateSeries};
use crate::error::{ReserveError, Result};
use std::ops::RangeInclusive;

/// Issue age band used to key lapse tables
pub fn age_band(issue_age: u32) -> Result<&'static str> {
    let band = match issue_age {
        18..=25 => "18-25",
        26..=30 => "26-30",
        31..=35 => "31-35",
        36..=40 => "36-40",
        41..=45 => "41-45",
        46..=50 => "46-50",
        51..=55 => "51-55",
        56..=60 => "56-60",
        61.. => "61+",
        _ => return Err(ReserveError::lookup("lapse age band", issue_age.to_string())),
    };
    Ok(band)
}

impl AssumptionResolver {
    /// Annual lapse rates by duration year for a named lapse table (e.g. "standard")
    pub fn resolve_lapse(
        &self,
        table_name: &str,
        issue_age: u32,
        modifier: f64,
        assumption_set: AssumptionSet,
        durations: RangeInclusive<u32>,
    ) -> Result<RateSeries> {
        assumption_set.ensure_implemented()?;
        let table = self.table(&format!("lapse-{}", table_name))?;
        let band = age_band(issue_age)?;
        let start = *durations.start();
        let rates = durations
            .map(|year| Ok((table.rate(&[band, &year.to_string()])? * modifier).clamp(0.0, 1.0)))
            .collect::<Result<Vec<f64>>>()?;
        Ok(RateSeries::new(start, rates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_bands() {
        assert_eq!(age_band(18).unwrap(), "18-25");
        assert_eq!(age_band(45).unwrap(), "41-45");
        assert_eq!(age_band(72).unwrap(), "61+");
        assert!(age_band(16).is_err());
    }

    #[test]
    fn test_lapse_declines_by_duration() {
        let resolver = AssumptionResolver::embedded();
        let w = resolver.resolve_lapse("standard", 35, 1.0, AssumptionSet::Stat, 1..=30).unwrap();
        assert_eq!(w.len(), 30);
        assert!(w.get(1).unwrap() > w.get(10).unwrap());
    }

    #[test]
    fn test_best_estimate_not_implemented() {
        let resolver = AssumptionResolver::embedded();
        let err = resolver.resolve_lapse("standard", 35, 1.0, AssumptionSet::BestEstimate, 1..=2).unwrap_err();
        assert!(matches!(err, ReserveError::NotImplemented(_)));
    }
}
