//! Weather-compensated flow temperature.

use hz_core::round_tenth;
use serde::{Deserialize, Serialize};

use super::{FlowBand, FlowBreakdown, FlowMode, FlowOutput};
use crate::error::{ControlResult, check_range};
use crate::mode::{Demand, HvacMode};

/// Curve parameters shared by both flow calculators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimpleFlowParams {
    pub heating_base_offset: f64,
    pub cooling_base_offset: f64,
    /// °C of flow per °C between indoor reference and outside.
    pub weather_slope: f64,
    pub curve_offset: f64,
    pub heating_band: FlowBand,
    pub cooling_band: FlowBand,
}

impl SimpleFlowParams {
    pub fn band(&self, mode: HvacMode) -> FlowBand {
        match mode {
            HvacMode::Heating => self.heating_band,
            HvacMode::Cooling => self.cooling_band,
        }
    }

    pub fn base_offset(&self, mode: HvacMode) -> f64 {
        match mode {
            HvacMode::Heating => self.heating_base_offset,
            HvacMode::Cooling => self.cooling_base_offset,
        }
    }

    pub fn validate(&self) -> ControlResult<()> {
        check_range("heating_base_offset", self.heating_base_offset, -10.0, 20.0)?;
        check_range("cooling_base_offset", self.cooling_base_offset, -10.0, 20.0)?;
        check_range("weather_slope", self.weather_slope, 0.0, 5.0)?;
        check_range("flow_curve_offset", self.curve_offset, -10.0, 10.0)?;
        self.heating_band.validate()?;
        self.cooling_band.validate()
    }
}

impl Default for SimpleFlowParams {
    fn default() -> Self {
        Self {
            heating_base_offset: 3.0,
            cooling_base_offset: 2.5,
            weather_slope: 0.25,
            curve_offset: 0.0,
            heating_band: FlowBand { min: 15.0, max: 35.0 },
            cooling_band: FlowBand { min: 15.0, max: 25.0 },
        }
    }
}

/// Unclamped curve value and its parts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseTerm {
    pub reference: f64,
    pub base_offset: f64,
    pub weather_comp: f64,
    pub curve_offset: f64,
    pub value: f64,
}

/// Reference target plus offset, weather compensation and curve offset.
///
/// The reference is the highest target when heating and the lowest when
/// cooling. Returns `None` for an empty target set.
pub fn base_term<I>(
    targets: I,
    mode: HvacMode,
    outside_temp: Option<f64>,
    params: &SimpleFlowParams,
) -> Option<BaseTerm>
where
    I: IntoIterator<Item = f64>,
{
    let targets = targets.into_iter().filter(|t| t.is_finite());
    let pick: fn(f64, f64) -> f64 = match mode {
        HvacMode::Heating => f64::max,
        HvacMode::Cooling => f64::min,
    };
    let reference = targets.reduce(pick)?;

    let base_offset = params.base_offset(mode);
    let weather_comp = outside_temp
        .filter(|t| t.is_finite())
        .map_or(0.0, |outside| params.weather_slope * (reference - outside));
    let value = reference + mode.sign() * base_offset + weather_comp + params.curve_offset;

    Some(BaseTerm {
        reference,
        base_offset,
        weather_comp,
        curve_offset: params.curve_offset,
        value,
    })
}

/// Simple-mode flow temperature for the demanding zones' targets.
///
/// `None` when `direction` is idle or no target is known.
pub fn compute_simple<I>(
    active_targets: I,
    direction: Demand,
    outside_temp: Option<f64>,
    params: &SimpleFlowParams,
) -> Option<FlowOutput>
where
    I: IntoIterator<Item = f64>,
{
    let mode = direction.hvac_mode()?;
    let base = base_term(active_targets, mode, outside_temp, params)?;
    let band = params.band(mode);
    let flow_temp = round_tenth(band.clamp(base.value));

    Some(FlowOutput {
        flow_temp,
        breakdown: FlowBreakdown {
            effective_mode: mode,
            flow_mode: FlowMode::Simple,
            outside_temp,
            reference_target: base.reference,
            base_offset: base.base_offset,
            weather_comp: base.weather_comp,
            curve_offset: base.curve_offset,
            supervisor: None,
            unclamped: base.value,
            clamp_min: band.min,
            clamp_max: band.max,
            flow_temp,
        },
    })
}
