//! Sample records shared by unit tests across modules

use super::{ActivePolicy, DisabledClaim, RiderAttributes};
use chrono::NaiveDate;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn sample_claim() -> DisabledClaim {
    DisabledClaim {
        policy_id: "M1".into(),
        claim_id: "M1C1".into(),
        coverage_id: "BASE".into(),
        gender: "M".into(),
        birth_dt: date(1970, 2, 10),
        incurred_dt: date(2005, 2, 10),
        termination_dt: date(2037, 2, 10),
        elimination_period: 90,
        idi_contract: "AS".into(),
        idi_benefit_period: "TO67".into(),
        idi_diagnosis_grp: "AG".into(),
        idi_occupation_class: "M".into(),
        cola_percent: 0.0,
        benefit_amount: 100.0,
        riders: RiderAttributes::default(),
    }
}

/// Male class 1 claimant age 60 at incurral, TO65, valued two years into the claim
pub fn short_tail_claim() -> DisabledClaim {
    DisabledClaim {
        policy_id: "P7".into(),
        claim_id: "P7C1".into(),
        coverage_id: "BASE".into(),
        gender: "M".into(),
        birth_dt: date(1955, 3, 15),
        incurred_dt: date(2015, 3, 15),
        termination_dt: date(2020, 3, 15),
        elimination_period: 90,
        idi_contract: "AS".into(),
        idi_benefit_period: "TO65".into(),
        idi_diagnosis_grp: "MID".into(),
        idi_occupation_class: "1".into(),
        cola_percent: 0.0,
        benefit_amount: 2500.0,
        riders: RiderAttributes::default(),
    }
}

pub fn sample_policy() -> ActivePolicy {
    ActivePolicy {
        policy_id: "A1".into(),
        coverage_id: "BASE".into(),
        gender: "F".into(),
        birth_dt: date(1975, 6, 1),
        tobacco_usage: "N".into(),
        policy_start_dt: date(2010, 1, 1),
        policy_end_dt: date(2040, 6, 1),
        premium_pay_to_dt: date(2040, 6, 1),
        elimination_period: 90,
        idi_market: "INDV".into(),
        idi_contract: "AS".into(),
        idi_benefit_period: "TO65".into(),
        idi_occupation_class: "2".into(),
        cola_percent: 0.0,
        gross_premium: 50.0,
        gross_premium_freq: "MONTH".into(),
        benefit_amount: 1000.0,
        riders: RiderAttributes::default(),
    }
}
