//! Categorical policy codes as they appear in the extracts and rate tables

use crate::error::{ReserveError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

fn unknown(field: &'static str, value: &str) -> ReserveError {
    ReserveError::UnknownCode { field, value: value.to_string() }
}

/// Gender of the insured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
        }
    }
}

impl FromStr for Gender {
    type Err = ReserveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "M" | "Male" => Ok(Gender::Male),
            "F" | "Female" => Ok(Gender::Female),
            other => Err(unknown("gender", other)),
        }
    }
}

/// IDI occupation class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OccupationClass {
    Class1,
    Class2,
    Class3,
    Class4,
    /// Medical professionals
    Medical,
}

impl OccupationClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            OccupationClass::Class1 => "1",
            OccupationClass::Class2 => "2",
            OccupationClass::Class3 => "3",
            OccupationClass::Class4 => "4",
            OccupationClass::Medical => "M",
        }
    }
}

impl FromStr for OccupationClass {
    type Err = ReserveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "1" => Ok(OccupationClass::Class1),
            "2" => Ok(OccupationClass::Class2),
            "3" => Ok(OccupationClass::Class3),
            "4" => Ok(OccupationClass::Class4),
            "M" => Ok(OccupationClass::Medical),
            other => Err(unknown("occupation class", other)),
        }
    }
}

/// Own-occupation contract definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Contract {
    /// Accident and sickness
    AS,
    /// Accident only
    AO,
    /// Sickness only
    SO,
    /// Overhead expense
    OE,
    /// Key person
    KP,
}

impl Contract {
    pub fn as_str(&self) -> &'static str {
        match self {
            Contract::AS => "AS",
            Contract::AO => "AO",
            Contract::SO => "SO",
            Contract::OE => "OE",
            Contract::KP => "KP",
        }
    }
}

impl FromStr for Contract {
    type Err = ReserveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "AS" => Ok(Contract::AS),
            "AO" => Ok(Contract::AO),
            "SO" => Ok(Contract::SO),
            "OE" => Ok(Contract::OE),
            "KP" => Ok(Contract::KP),
            other => Err(unknown("contract", other)),
        }
    }
}

/// Distribution market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Market {
    Individual,
    /// Employer sponsored, individually underwritten
    EmployerIndividual,
    /// Employer sponsored, voluntary guaranteed standard issue
    EmployerVoluntary,
    /// Employer sponsored, mandatory guaranteed standard issue
    EmployerMandatory,
}

impl Market {
    pub fn as_str(&self) -> &'static str {
        match self {
            Market::Individual => "INDV",
            Market::EmployerIndividual => "ES_IU",
            Market::EmployerVoluntary => "ES_VGSI",
            Market::EmployerMandatory => "ES_MGSI",
        }
    }
}

impl FromStr for Market {
    type Err = ReserveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "INDV" => Ok(Market::Individual),
            "ES_IU" => Ok(Market::EmployerIndividual),
            "ES_VGSI" => Ok(Market::EmployerVoluntary),
            "ES_MGSI" => Ok(Market::EmployerMandatory),
            other => Err(unknown("market", other)),
        }
    }
}

/// Diagnosis group of an open claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosisGroup {
    VeryLow,
    Low,
    Mid,
    High,
    VeryHigh,
    /// Aggregate, used for hypothetical claims
    Aggregate,
}

impl DiagnosisGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosisGroup::VeryLow => "VERY_LOW",
            DiagnosisGroup::Low => "LOW",
            DiagnosisGroup::Mid => "MID",
            DiagnosisGroup::High => "HIGH",
            DiagnosisGroup::VeryHigh => "VERY_HIGH",
            DiagnosisGroup::Aggregate => "AG",
        }
    }
}

impl FromStr for DiagnosisGroup {
    type Err = ReserveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "VERY_LOW" => Ok(DiagnosisGroup::VeryLow),
            "LOW" => Ok(DiagnosisGroup::Low),
            "MID" => Ok(DiagnosisGroup::Mid),
            "HIGH" => Ok(DiagnosisGroup::High),
            "VERY_HIGH" => Ok(DiagnosisGroup::VeryHigh),
            "AG" => Ok(DiagnosisGroup::Aggregate),
            other => Err(unknown("diagnosis group", other)),
        }
    }
}

/// Maximum benefit period of the coverage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BenefitPeriod {
    /// Benefits payable for a fixed number of months after elimination, e.g. "24M"
    Months(u32),
    /// Benefits payable to the coverage end date, e.g. "TO65"
    ToAge(u32),
    /// Benefits payable for life
    Life,
}

impl BenefitPeriod {
    pub fn code(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for BenefitPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BenefitPeriod::Months(n) => write!(f, "{}M", n),
            BenefitPeriod::ToAge(age) => write!(f, "TO{}", age),
            BenefitPeriod::Life => write!(f, "LIFE"),
        }
    }
}

impl FromStr for BenefitPeriod {
    type Err = ReserveError;

    fn from_str(s: &str) -> Result<Self> {
        let code = s.trim();
        let err = || ReserveError::UnknownBenefitPeriod(code.to_string());
        if code == "LIFE" {
            return Ok(BenefitPeriod::Life);
        }
        if let Some(age) = code.strip_prefix("TO") {
            return age.parse().map(BenefitPeriod::ToAge).map_err(|_| err());
        }
        if let Some(months) = code.strip_suffix('M') {
            return match months.parse() {
                Ok(n) if n > 0 => Ok(BenefitPeriod::Months(n)),
                _ => Err(err()),
            };
        }
        Err(err())
    }
}

/// Tobacco usage flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TobaccoUsage {
    Yes,
    No,
}

impl TobaccoUsage {
    pub fn as_str(&self) -> &'static str {
        match self {
            TobaccoUsage::Yes => "Y",
            TobaccoUsage::No => "N",
        }
    }
}

impl FromStr for TobaccoUsage {
    type Err = ReserveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "Y" | "true" | "True" => Ok(TobaccoUsage::Yes),
            "N" | "false" | "False" => Ok(TobaccoUsage::No),
            other => Err(unknown("tobacco usage", other)),
        }
    }
}

/// Whether a cost-of-living adjustment applies to the benefit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColaFlag {
    Yes,
    No,
}

impl ColaFlag {
    /// A zero COLA percent carries no adjustment
    pub fn from_percent(cola_percent: f64) -> Self {
        if cola_percent == 0.0 {
            ColaFlag::No
        } else {
            ColaFlag::Yes
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColaFlag::Yes => "Y",
            ColaFlag::No => "N",
        }
    }
}

/// Gross premium payment mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PremiumFrequency {
    Monthly,
    Quarterly,
    SemiAnnual,
    Annual,
}

impl PremiumFrequency {
    /// Number of modal premiums per policy year
    pub fn payments_per_year(&self) -> f64 {
        match self {
            PremiumFrequency::Monthly => 12.0,
            PremiumFrequency::Quarterly => 4.0,
            PremiumFrequency::SemiAnnual => 2.0,
            PremiumFrequency::Annual => 1.0,
        }
    }
}

impl FromStr for PremiumFrequency {
    type Err = ReserveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "MONTH" => Ok(PremiumFrequency::Monthly),
            "QUARTER" => Ok(PremiumFrequency::Quarterly),
            "SEMIANNUAL" => Ok(PremiumFrequency::SemiAnnual),
            "ANNUAL" => Ok(PremiumFrequency::Annual),
            other => Err(unknown("premium frequency", other)),
        }
    }
}

/// Coverage on the policy: the base coverage or one of its riders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoverageId {
    Base,
    /// Catastrophic disability rider
    Cat,
    /// Cost-of-living adjustment rider
    Cola,
    /// Residual disability rider
    Res,
    /// Social insurance substitute rider
    Sis,
    /// Return of premium rider
    Rop,
}

impl CoverageId {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoverageId::Base => "BASE",
            CoverageId::Cat => "CAT",
            CoverageId::Cola => "COLA",
            CoverageId::Res => "RES",
            CoverageId::Sis => "SIS",
            CoverageId::Rop => "ROP",
        }
    }
}

impl FromStr for CoverageId {
    type Err = ReserveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "BASE" => Ok(CoverageId::Base),
            "CAT" => Ok(CoverageId::Cat),
            "COLA" => Ok(CoverageId::Cola),
            "RES" => Ok(CoverageId::Res),
            "SIS" => Ok(CoverageId::Sis),
            "ROP" => Ok(CoverageId::Rop),
            other => Err(unknown("coverage id", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_benefit_period_codes() {
        assert_eq!("TO65".parse::<BenefitPeriod>().unwrap(), BenefitPeriod::ToAge(65));
        assert_eq!("24M".parse::<BenefitPeriod>().unwrap(), BenefitPeriod::Months(24));
        assert_eq!("LIFE".parse::<BenefitPeriod>().unwrap(), BenefitPeriod::Life);
        assert_eq!(BenefitPeriod::Months(60).code(), "60M");

        for bad in ["9Y", "TOXX", "0M", ""] {
            assert!(matches!(
                bad.parse::<BenefitPeriod>(),
                Err(ReserveError::UnknownBenefitPeriod(_))
            ));
        }
    }

    #[test]
    fn test_cola_flag_from_percent() {
        assert_eq!(ColaFlag::from_percent(0.0), ColaFlag::No);
        assert_eq!(ColaFlag::from_percent(0.03), ColaFlag::Yes);
    }

    #[test]
    fn test_unknown_codes_are_configuration_errors() {
        let err = "XX".parse::<Contract>().unwrap_err();
        assert_eq!(err.kind(), "ConfigurationError");
        assert!("Z".parse::<OccupationClass>().is_err());
        assert_eq!("M".parse::<OccupationClass>().unwrap().as_str(), "M");
    }
}
