//! IDI Reserves - Active and disabled life reserves for individual disability income
//!
//! This library provides:
//! - Rate table store and assumption resolution (claim termination, incidence,
//!   mortality, lapse, interest) under stat and GAAP bases
//! - Monthly claim and yearly policy projection frames
//! - Disabled life (DLR) and active life (ALR) reserve models, with nested claim costs
//! - Parallel batch dispatch with per-record error isolation and CSV output

pub mod error;
pub mod config;
pub mod policy;
pub mod assumptions;
pub mod projection;
pub mod reserves;
pub mod dispatch;
pub mod output;

// Re-export commonly used types
pub use error::{ReserveError, Result};
pub use config::{Modifiers, RunConfig};
pub use policy::{ActivePolicy, DisabledClaim, RecordKey};
pub use assumptions::{AssumptionResolver, AssumptionSet, ModelMode, RateTableStore};
pub use reserves::{ActiveLifeModel, DisabledLifeModel, NetBenefitMethod, ReserveContext, ReserveModel};
pub use dispatch::{BatchOutput, ErrorRecord, PopulationDispatcher};
