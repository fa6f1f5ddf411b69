//! Error types for control engine construction.
//!
//! Nothing on the per-tick path returns these: unavailable inputs degrade
//! gracefully. Errors only arise when building controllers from parameters.

use thiserror::Error;

/// Result type for control engine operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur when constructing control engine parts.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Invalid argument provided to a control function.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Parameter outside its accepted range.
    #[error("Parameter {name} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Error bubbled up from the numeric foundation.
    #[error(transparent)]
    Core(#[from] hz_core::CoreError),
}

/// Check `value` is finite and inside `[min, max]`.
pub(crate) fn check_range(
    name: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> ControlResult<f64> {
    let value = hz_core::ensure_finite(value, name)?;
    if value < min || value > max {
        return Err(ControlError::OutOfRange {
            name,
            value,
            min,
            max,
        });
    }
    Ok(value)
}
