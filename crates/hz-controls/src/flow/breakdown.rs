use serde::{Deserialize, Serialize};

use super::FlowMode;
use crate::mode::HvacMode;

/// Contributing terms of one flow computation, for observability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowBreakdown {
    pub effective_mode: HvacMode,
    pub flow_mode: FlowMode,
    pub outside_temp: Option<f64>,
    /// Extreme requested target the curve starts from.
    pub reference_target: f64,
    pub base_offset: f64,
    pub weather_comp: f64,
    pub curve_offset: f64,
    /// Supervisor terms, absent in simple mode.
    pub supervisor: Option<SupervisorTerms>,
    pub unclamped: f64,
    pub clamp_min: f64,
    pub clamp_max: f64,
    pub flow_temp: f64,
}

/// Supervisor-specific terms of a [`FlowBreakdown`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SupervisorTerms {
    pub di_slow: f64,
    pub di_fast: f64,
    pub demand_index: f64,
    pub trim_p: f64,
    pub integral: f64,
    pub fast_boost: f64,
    pub preheat_boost: f64,
    /// Value after slew limiting from the last emission, before the band clamp.
    pub slewed: f64,
}
