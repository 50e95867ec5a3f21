//! Claim termination rates (CTR)
//!
//! Select rates cover claim duration months 1-120 and are keyed by age at incurral.
//! Months 1-24 are tabulated as monthly rates, years 3-10 as annual rates. Ultimate
//! rates cover year 11 onward and are keyed by attained age. Select modifiers for
//! benefit period, contract, cause and diagnosis vary by duration year.

use super::{annual_to_monthly, AssumptionResolver, AssumptionSet, CtrBasis, ModelMode, RateSeries};
use crate::error::Result;
use crate::policy::{BenefitPeriod, ColaFlag, Contract, DiagnosisGroup, Gender, OccupationClass};

const SELECT_MONTHS: u32 = 120;
const MONTHLY_SELECT_MONTHS: u32 = 24;

/// Attributes that key claim termination rates
#[derive(Debug, Clone, PartialEq)]
pub struct TerminationAttributes {
    pub occupation_class: OccupationClass,
    pub gender: Gender,
    pub elimination_period: u32,
    pub age_incurred: u32,
    pub benefit_period: BenefitPeriod,
    pub cola_flag: ColaFlag,
    pub contract: Contract,
    pub diagnosis: DiagnosisGroup,
}

impl AssumptionResolver {
    /// Monthly claim termination rates for duration months `1..=max_duration_month`
    pub fn resolve_termination(
        &self,
        attrs: &TerminationAttributes,
        mode: ModelMode,
        assumption_set: AssumptionSet,
        max_duration_month: u32,
    ) -> Result<RateSeries> {
        let basis = CtrBasis::select(assumption_set, mode)?;
        let mut rates = self.select_ctr(attrs, basis, max_duration_month.min(SELECT_MONTHS))?;
        if max_duration_month > SELECT_MONTHS {
            rates.extend(self.ultimate_ctr(attrs, basis, SELECT_MONTHS + 1, max_duration_month)?);
        }
        Ok(RateSeries::new(1, rates))
    }

    fn select_ctr(&self, attrs: &TerminationAttributes, basis: CtrBasis, last_month: u32) -> Result<Vec<f64>> {
        if last_month == 0 {
            return Ok(Vec::new());
        }
        let select = self.table("ctr-select")?;
        let ep = attrs.elimination_period.to_string();
        let age = attrs.age_incurred.to_string();
        let base = select.get(&[attrs.occupation_class.as_str(), attrs.gender.as_str(), &ep, &age])?;

        let last_year = (last_month - 1) / 12 + 1;
        let year_factors = (1..=last_year)
            .map(|year| self.select_modifiers(attrs, basis, year))
            .collect::<Result<Vec<f64>>>()?;

        let rates = (1..=last_month)
            .map(|month| {
                let year = (month - 1) / 12 + 1;
                let factor = year_factors[(year - 1) as usize];
                if month <= MONTHLY_SELECT_MONTHS {
                    (base[(month - 1) as usize] * factor).clamp(0.0, 1.0)
                } else {
                    let column = MONTHLY_SELECT_MONTHS + (year - 3);
                    annual_to_monthly(base[column as usize] * factor)
                }
            })
            .collect();
        Ok(rates)
    }

    /// Product of the select modifiers and, for stat, the margin for one duration year
    fn select_modifiers(&self, attrs: &TerminationAttributes, basis: CtrBasis, year: u32) -> Result<f64> {
        let year_key = year.to_string();
        let benefit_period = attrs.benefit_period.code();

        let mut factor = self.table("ctr-benefit-period-modifier")?.rate(&[
            &benefit_period,
            attrs.cola_flag.as_str(),
            &year_key,
        ])?;
        factor *= self.table("ctr-contract-modifier")?.rate(&[attrs.contract.as_str(), &year_key])?;

        let cause = || -> Result<f64> {
            self.table("ctr-cause-modifier")?
                .rate(&[attrs.contract.as_str(), attrs.gender.as_str(), &year_key])
        };
        if basis.is_active() {
            // Hypothetical claims carry no diagnosis
            if matches!(attrs.contract, Contract::AO | Contract::SO) {
                factor *= cause()?;
            }
        } else if attrs.contract == Contract::AO {
            factor *= cause()?;
        } else {
            factor *= self
                .table("ctr-diagnosis-modifier")?
                .rate(&[attrs.diagnosis.as_str(), &year_key])?;
        }

        if basis.is_catastrophic() {
            factor *= self.table("ctr-catastrophic-modifier")?.rate(&[&year_key])?;
        }

        if basis.applies_margin() {
            let band = if year == 1 { "1" } else { "2+" };
            factor *= 1.0 - self.margin("CTR_SELECT", band)?;
        }
        Ok(factor)
    }

    fn ultimate_ctr(&self, attrs: &TerminationAttributes, basis: CtrBasis, first_month: u32, last_month: u32) -> Result<Vec<f64>> {
        let ultimate = self.table("ctr-ultimate")?;
        let margin = if basis.applies_margin() {
            1.0 - self.margin("CTR_ULTIMATE", "11+")?
        } else {
            1.0
        };

        let first_year = (first_month - 1) / 12 + 1;
        let last_year = (last_month - 1) / 12 + 1;
        let annual = (first_year..=last_year)
            .map(|year| {
                let age = (attrs.age_incurred + year - 1).to_string();
                ultimate.rate(&[attrs.occupation_class.as_str(), attrs.gender.as_str(), &age])
            })
            .collect::<Result<Vec<f64>>>()?;

        Ok((first_month..=last_month)
            .map(|month| {
                let year = (month - 1) / 12 + 1;
                annual_to_monthly(annual[(year - first_year) as usize] * margin)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReserveError;
    use proptest::prelude::*;

    fn attrs() -> TerminationAttributes {
        TerminationAttributes {
            occupation_class: OccupationClass::Class1,
            gender: Gender::Male,
            elimination_period: 90,
            age_incurred: 45,
            benefit_period: BenefitPeriod::ToAge(65),
            cola_flag: ColaFlag::No,
            contract: Contract::AS,
            diagnosis: DiagnosisGroup::Mid,
        }
    }

    #[test]
    fn test_select_then_ultimate() {
        let resolver = AssumptionResolver::embedded();
        let ctr = resolver.resolve_termination(&attrs(), ModelMode::Dlr, AssumptionSet::Stat, 240).unwrap();
        assert_eq!(ctr.len(), 240);
        assert_eq!(ctr.start(), 1);
        assert!(ctr.rates().iter().all(|r| (0.0..=1.0).contains(r)));
        // Early claim months terminate much faster than the ultimate period
        assert!(ctr.get(1).unwrap() > ctr.get(200).unwrap());
    }

    #[test]
    fn test_stat_never_exceeds_gaap() {
        let resolver = AssumptionResolver::embedded();
        for mode in [ModelMode::Dlr, ModelMode::DlrCat, ModelMode::Alr, ModelMode::AlrCat] {
            for contract in [Contract::AS, Contract::AO, Contract::SO] {
                let a = TerminationAttributes { contract, ..attrs() };
                let stat = resolver.resolve_termination(&a, mode, AssumptionSet::Stat, 360).unwrap();
                let gaap = resolver.resolve_termination(&a, mode, AssumptionSet::Gaap, 360).unwrap();
                for ((_, s), (_, g)) in stat.iter().zip(gaap.iter()) {
                    assert!(s <= g, "stat {} above gaap {} for {:?}", s, g, mode);
                }
            }
        }
    }

    prop_compose! {
        fn arb_termination_attributes()(
            occupation_class in prop::sample::select(vec![
                OccupationClass::Class1,
                OccupationClass::Class2,
                OccupationClass::Class3,
                OccupationClass::Class4,
                OccupationClass::Medical,
            ]),
            gender in prop::sample::select(vec![Gender::Male, Gender::Female]),
            elimination_period in prop::sample::select(vec![0u32, 7, 14, 30, 60, 90, 180, 360, 720]),
            age_incurred in 18u32..=75,
            benefit_period in prop::sample::select(vec![
                BenefitPeriod::Months(6),
                BenefitPeriod::Months(24),
                BenefitPeriod::Months(60),
                BenefitPeriod::ToAge(65),
                BenefitPeriod::ToAge(70),
                BenefitPeriod::Life,
            ]),
            cola_flag in prop::sample::select(vec![ColaFlag::Yes, ColaFlag::No]),
            contract in prop::sample::select(vec![Contract::AS, Contract::AO, Contract::SO]),
            diagnosis in prop::sample::select(vec![
                DiagnosisGroup::VeryLow,
                DiagnosisGroup::Low,
                DiagnosisGroup::Mid,
                DiagnosisGroup::High,
                DiagnosisGroup::VeryHigh,
                DiagnosisGroup::Aggregate,
            ]),
        ) -> TerminationAttributes {
            TerminationAttributes {
                occupation_class,
                gender,
                elimination_period,
                age_incurred,
                benefit_period,
                cola_flag,
                contract,
                diagnosis,
            }
        }
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn test_stat_never_exceeds_gaap_for_any_claim(
            attrs in arb_termination_attributes(),
            mode in prop::sample::select(vec![ModelMode::Dlr, ModelMode::DlrCat, ModelMode::Alr, ModelMode::AlrCat]),
            months in 1u32..=360,
        ) {
            let resolver = AssumptionResolver::embedded();
            let stat = resolver.resolve_termination(&attrs, mode, AssumptionSet::Stat, months).unwrap();
            let gaap = resolver.resolve_termination(&attrs, mode, AssumptionSet::Gaap, months).unwrap();
            prop_assert_eq!(stat.len(), months as usize);
            for ((month, s), (_, g)) in stat.iter().zip(gaap.iter()) {
                prop_assert!((0.0..=1.0).contains(&s));
                prop_assert!(s <= g, "month {}: stat {} above gaap {}", month, s, g);
            }
        }
    }

    #[test]
    fn test_stat_margin_by_duration_year() {
        let resolver = AssumptionResolver::embedded();
        let stat = resolver.resolve_termination(&attrs(), ModelMode::Dlr, AssumptionSet::Stat, 24).unwrap();
        let gaap = resolver.resolve_termination(&attrs(), ModelMode::Dlr, AssumptionSet::Gaap, 24).unwrap();
        // Monthly select rates carry the margin directly
        approx::assert_relative_eq!(stat.get(1).unwrap(), gaap.get(1).unwrap() * 0.95, max_relative = 1e-12);
        approx::assert_relative_eq!(stat.get(13).unwrap(), gaap.get(13).unwrap() * 0.85, max_relative = 1e-12);
    }

    #[test]
    fn test_cola_zero_matches_flag_n() {
        let resolver = AssumptionResolver::embedded();
        let from_percent = TerminationAttributes { cola_flag: ColaFlag::from_percent(0.0), ..attrs() };
        let explicit = TerminationAttributes { cola_flag: ColaFlag::No, ..attrs() };
        let a = resolver.resolve_termination(&from_percent, ModelMode::Alr, AssumptionSet::Stat, 300).unwrap();
        let b = resolver.resolve_termination(&explicit, ModelMode::Alr, AssumptionSet::Stat, 300).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_best_estimate_not_implemented() {
        let resolver = AssumptionResolver::embedded();
        let err = resolver
            .resolve_termination(&attrs(), ModelMode::Dlr, AssumptionSet::BestEstimate, 12)
            .unwrap_err();
        assert!(matches!(err, ReserveError::NotImplemented(_)));
    }

    #[test]
    fn test_unknown_benefit_period_key_is_lookup_error() {
        let resolver = AssumptionResolver::embedded();
        let a = TerminationAttributes { benefit_period: BenefitPeriod::Months(7), ..attrs() };
        let err = resolver.resolve_termination(&a, ModelMode::Dlr, AssumptionSet::Stat, 12).unwrap_err();
        assert_eq!(err.kind(), "LookupError");
    }

    #[test]
    fn test_catastrophic_mode_lowers_terminations() {
        let resolver = AssumptionResolver::embedded();
        let base = resolver.resolve_termination(&attrs(), ModelMode::Dlr, AssumptionSet::Gaap, 60).unwrap();
        let cat = resolver.resolve_termination(&attrs(), ModelMode::DlrCat, AssumptionSet::Gaap, 60).unwrap();
        assert!(cat.get(1).unwrap() < base.get(1).unwrap());
    }
}
