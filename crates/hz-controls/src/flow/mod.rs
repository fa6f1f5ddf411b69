//! Supply (flow) temperature calculation.
//!
//! Two interchangeable calculators share one base term:
//! - [`compute_simple`]: weather-compensated curve from the extreme target
//! - [`FlowSupervisor`]: demand-weighted, filtered, slew-limited supervisor
//!
//! Both return `None` when the plant is idle; the caller then writes nothing.

mod breakdown;
mod simple;
mod supervisor;

pub use breakdown::{FlowBreakdown, SupervisorTerms};
pub use simple::{BaseTerm, SimpleFlowParams, base_term, compute_simple};
pub use supervisor::{
    FlowSupervisor, FlowSupervisorState, SupervisorConfig, WeatherInputs, ZoneFlowInput,
};

use hz_core::clamp;
use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};

/// Which calculator produces the flow temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowMode {
    #[default]
    Simple,
    Advanced,
}

/// Allowed flow temperature range in °C.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowBand {
    pub min: f64,
    pub max: f64,
}

impl FlowBand {
    pub fn new(min: f64, max: f64) -> ControlResult<Self> {
        let band = Self { min, max };
        band.validate()?;
        Ok(band)
    }

    pub fn validate(&self) -> ControlResult<()> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min >= self.max {
            return Err(ControlError::InvalidArg {
                what: "flow band needs finite min < max",
            });
        }
        Ok(())
    }

    pub fn clamp(&self, value: f64) -> f64 {
        clamp(value, self.min, self.max)
    }
}

/// A flow temperature together with how it was obtained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowOutput {
    /// Flow temperature in °C, rounded to 0.1.
    pub flow_temp: f64,
    pub breakdown: FlowBreakdown,
}
