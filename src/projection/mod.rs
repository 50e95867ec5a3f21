//! Projection frames: duration timelines for disabled claims and active policies

pub mod dates;
mod frame;

pub use dates::AgeMethod;
pub use frame::{
    build_active_frame, build_disabled_frame, ClaimDates, DurationRow, Period, PolicyDates,
    ProjectionFrame,
};
