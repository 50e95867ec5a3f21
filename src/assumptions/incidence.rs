//! Disability incidence rates

use super::{AssumptionResolver, AssumptionSet, RateSeries};
use crate::error::Result;
use crate::policy::{BenefitPeriod, Contract, Gender, Market, OccupationClass, TobaccoUsage};
use std::ops::RangeInclusive;

/// Attributes that key incidence rates
#[derive(Debug, Clone, PartialEq)]
pub struct IncidenceAttributes {
    pub occupation_class: OccupationClass,
    pub gender: Gender,
    pub elimination_period: u32,
    pub benefit_period: BenefitPeriod,
    pub contract: Contract,
    pub market: Market,
    pub tobacco_usage: TobaccoUsage,
}

impl AssumptionResolver {
    /// Annual incidence rates by attained age
    ///
    /// Accident-only contracts use accident incidence and sickness-only contracts use
    /// sickness incidence; everything else carries both.
    pub fn resolve_incidence(
        &self,
        attrs: &IncidenceAttributes,
        assumption_set: AssumptionSet,
        ages: RangeInclusive<u32>,
    ) -> Result<RateSeries> {
        assumption_set.ensure_implemented()?;

        let occ = attrs.occupation_class.as_str();
        let gender = attrs.gender.as_str();
        let ep = attrs.elimination_period.to_string();
        let benefit_period = attrs.benefit_period.code();

        let modifier = self.table("incidence-benefit-period-modifier")?.rate(&[occ, &benefit_period, &ep])?
            * self.table("incidence-contract-modifier")?.rate(&[attrs.contract.as_str()])?
            * self.table("incidence-market-modifier")?.rate(&[attrs.market.as_str()])?
            * self.table("incidence-tobacco-modifier")?.rate(&[occ, gender, attrs.tobacco_usage.as_str()])?
            * (1.0 + self.margin("INCIDENCE", "1+")?);

        let causes: &[&str] = match attrs.contract {
            Contract::AO => &["ACC"],
            Contract::SO => &["SCK"],
            _ => &["ACC", "SCK"],
        };

        let base = self.table("incidence-base")?;
        let start = *ages.start();
        let rates = ages
            .map(|age| {
                let age = age.to_string();
                let per_mille = causes
                    .iter()
                    .map(|cause| base.rate(&[cause, occ, gender, &ep, &age]))
                    .sum::<Result<f64>>()?;
                Ok(per_mille * modifier / 1000.0)
            })
            .collect::<Result<Vec<f64>>>()?;

        Ok(RateSeries::new(start, rates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReserveError;
    use approx::assert_relative_eq;

    fn attrs() -> IncidenceAttributes {
        IncidenceAttributes {
            occupation_class: OccupationClass::Class2,
            gender: Gender::Female,
            elimination_period: 90,
            benefit_period: BenefitPeriod::ToAge(65),
            contract: Contract::AS,
            market: Market::Individual,
            tobacco_usage: TobaccoUsage::No,
        }
    }

    #[test]
    fn test_combined_cause_is_sum_of_parts() {
        let resolver = AssumptionResolver::embedded();
        let all = resolver.resolve_incidence(&attrs(), AssumptionSet::Stat, 30..=60).unwrap();
        let acc = resolver
            .resolve_incidence(&IncidenceAttributes { contract: Contract::AO, ..attrs() }, AssumptionSet::Stat, 30..=60)
            .unwrap();
        let sck = resolver
            .resolve_incidence(&IncidenceAttributes { contract: Contract::SO, ..attrs() }, AssumptionSet::Stat, 30..=60)
            .unwrap();

        // Contract modifiers differ, so compare after removing them
        let age = 40;
        let expected = acc.get(age).unwrap() / 0.92 + sck.get(age).unwrap() / 0.96;
        assert_relative_eq!(all.get(age).unwrap(), expected, max_relative = 1e-12);
        assert_eq!(all.start(), 30);
        assert_eq!(all.len(), 31);
    }

    #[test]
    fn test_rates_are_per_unit_not_per_mille() {
        let resolver = AssumptionResolver::embedded();
        let series = resolver.resolve_incidence(&attrs(), AssumptionSet::Gaap, 18..=75).unwrap();
        assert!(series.rates().iter().all(|r| *r > 0.0 && *r < 0.1));
    }

    #[test]
    fn test_tobacco_loads_incidence() {
        let resolver = AssumptionResolver::embedded();
        let smoker = IncidenceAttributes { tobacco_usage: TobaccoUsage::Yes, ..attrs() };
        let a = resolver.resolve_incidence(&attrs(), AssumptionSet::Stat, 50..=50).unwrap();
        let b = resolver.resolve_incidence(&smoker, AssumptionSet::Stat, 50..=50).unwrap();
        assert!(b.get(50).unwrap() > a.get(50).unwrap());
    }

    #[test]
    fn test_age_outside_table() {
        let resolver = AssumptionResolver::embedded();
        let err = resolver.resolve_incidence(&attrs(), AssumptionSet::Stat, 70..=80).unwrap_err();
        assert!(matches!(err, ReserveError::Lookup { .. }));
    }

    #[test]
    fn test_best_estimate_not_implemented() {
        let resolver = AssumptionResolver::embedded();
        let err = resolver.resolve_incidence(&attrs(), AssumptionSet::BestEstimate, 40..=41).unwrap_err();
        assert!(matches!(err, ReserveError::NotImplemented(_)));
    }
}
