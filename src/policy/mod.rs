//! Policy and claim records, policy codes, and extract loading

mod codes;
mod data;
pub mod loader;
#[cfg(test)]
pub(crate) mod fixtures;

pub use codes::{
    BenefitPeriod, ColaFlag, Contract, CoverageId, DiagnosisGroup, Gender, Market,
    OccupationClass, PremiumFrequency, TobaccoUsage,
};
pub use data::{
    ActivePolicy, ClaimAttributes, DisabledClaim, PolicyAttributes, RecordKey, RiderAttributes,
};
pub use loader::{
    load_active_policies, load_disabled_claims, load_rider_attributes, merge_rider_attributes,
    RiderAttributeRow,
};
