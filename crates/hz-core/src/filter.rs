//! Exponentially weighted moving average with explicit state.
//!
//! The filter keeps only its previous value, so memory stays bounded and the
//! response is deterministic under variable tick intervals:
//! `alpha = 1 - exp(-dt / tau)`.

use crate::numeric::Real;

/// First-order low-pass filter over irregular samples.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ewma {
    value: Option<Real>,
}

impl Ewma {
    pub fn new() -> Self {
        Self { value: None }
    }

    /// Current filtered value, `None` until the first sample.
    pub fn value(&self) -> Option<Real> {
        self.value
    }

    /// Feed one sample taken `dt` after the previous one.
    ///
    /// The first sample initializes the filter. `dt` and `tau` share a unit;
    /// `tau` is floored at a tiny positive value.
    pub fn update(&mut self, sample: Real, dt: Real, tau: Real) -> Real {
        let next = match self.value {
            None => sample,
            Some(previous) => {
                let alpha = 1.0 - (-dt.max(0.0) / tau.max(1e-6)).exp();
                previous + alpha * (sample - previous)
            }
        };
        self.value = Some(next);
        next
    }

    pub fn reset(&mut self) {
        self.value = None;
    }
}
