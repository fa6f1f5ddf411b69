//! hz-core: stable foundation for hydrozone.
//!
//! Contains:
//! - numeric (Real, clamp / slew / rounding helpers)
//! - filter (exponentially weighted moving average with explicit state)
//! - units (uom time type + constructors)
//! - ids (compact zone identifiers for arena storage)
//! - error (shared error types)

pub mod error;
pub mod filter;
pub mod ids;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use filter::Ewma;
pub use ids::*;
pub use numeric::*;
pub use units::*;
