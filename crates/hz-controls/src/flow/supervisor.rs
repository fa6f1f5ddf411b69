//! Demand-weighted flow temperature supervisor.
//!
//! Per tick the supervisor:
//! 1. Scores each demanding zone from its normalized error (and duty, when
//!    the zone reports one), then averages the scores by flow weight into a
//!    slow and a fast raw index.
//! 2. Filters both indices through their own EWMA.
//! 3. Trims the weather curve by `kp * di` plus an optional clamped integral.
//! 4. Adds a capped boost for fast zones far from target and a capped
//!    forecast-based preheat boost.
//! 5. Clamps the goal to the band, rounds it to 0.1 °C and slew-limits the
//!    step from the last emission.
//!
//! A settled output sits on the 0.1 °C grid. While ramping, an emission may
//! fall between grid points so that no step exceeds the allowance of its tick.

use hz_core::{
    Ewma, Time, ZoneId, as_minutes, clamp, round_tenth, slew_limit, weighted_average,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::simple::{SimpleFlowParams, base_term};
use super::{FlowBreakdown, FlowMode, FlowOutput, SupervisorTerms};
use crate::error::{ControlResult, check_range};
use crate::mode::{Demand, HvacMode, Responsiveness};

/// Slew limits are expressed per this many minutes.
const SLEW_WINDOW_MINUTES: f64 = 5.0;
/// Floor on a zone's score when weighting its solar share.
const SOLAR_SCORE_FLOOR: f64 = 0.05;

/// Supervisor tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Error (°C) that maps to a full normalized demand.
    pub error_norm_max: f64,
    /// Time constant of the slow demand index.
    pub duty_ema_minutes: f64,
    /// Time constant of the fast demand index.
    pub fast_ema_minutes: f64,
    pub error_weight: f64,
    pub duty_weight: f64,
    pub slow_mix_weight: f64,
    pub fast_mix_weight: f64,
    pub kp: f64,
    pub use_integral: bool,
    pub ti_minutes: f64,
    pub i_max: f64,
    pub fast_error_deadband_c: f64,
    pub fast_boost_gain: f64,
    pub fast_boost_cap_c: f64,
    pub preheat_enabled: bool,
    pub preheat_gain: f64,
    pub preheat_solar_gain_per_w_m2: f64,
    pub preheat_cap_c: f64,
    pub preheat_min_slow_di: f64,
    pub slew_up_c_per_5m: f64,
    pub slew_down_c_per_5m: f64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            error_norm_max: 2.0,
            duty_ema_minutes: 20.0,
            fast_ema_minutes: 5.0,
            error_weight: 0.6,
            duty_weight: 0.4,
            slow_mix_weight: 0.8,
            fast_mix_weight: 0.2,
            kp: 1.0,
            use_integral: false,
            ti_minutes: 180.0,
            i_max: 1.5,
            fast_error_deadband_c: 0.4,
            fast_boost_gain: 1.2,
            fast_boost_cap_c: 1.2,
            preheat_enabled: false,
            preheat_gain: 0.35,
            preheat_solar_gain_per_w_m2: 0.0,
            preheat_cap_c: 1.2,
            preheat_min_slow_di: 0.25,
            slew_up_c_per_5m: 0.3,
            slew_down_c_per_5m: 0.2,
        }
    }
}

impl SupervisorConfig {
    pub fn validate(&self) -> ControlResult<()> {
        check_range("error_norm_max", self.error_norm_max, 0.1, 10.0)?;
        check_range("duty_ema_minutes", self.duty_ema_minutes, 1.0, 240.0)?;
        check_range("fast_ema_minutes", self.fast_ema_minutes, 1.0, 240.0)?;
        check_range("error_weight", self.error_weight, 0.0, 1.0)?;
        check_range("duty_weight", self.duty_weight, 0.0, 1.0)?;
        check_range("slow_mix_weight", self.slow_mix_weight, 0.0, 1.0)?;
        check_range("fast_mix_weight", self.fast_mix_weight, 0.0, 1.0)?;
        check_range("kp", self.kp, 0.0, 10.0)?;
        check_range("ti_minutes", self.ti_minutes, 1.0, 1440.0)?;
        check_range("i_max", self.i_max, 0.0, 10.0)?;
        check_range("fast_error_deadband_c", self.fast_error_deadband_c, 0.0, 5.0)?;
        check_range("fast_boost_gain", self.fast_boost_gain, 0.0, 10.0)?;
        check_range("fast_boost_cap_c", self.fast_boost_cap_c, 0.0, 10.0)?;
        check_range("preheat_gain", self.preheat_gain, 0.0, 5.0)?;
        check_range("preheat_solar_gain_per_w_m2", self.preheat_solar_gain_per_w_m2, -1.0, 1.0)?;
        check_range("preheat_cap_c", self.preheat_cap_c, 0.0, 10.0)?;
        check_range("preheat_min_slow_di", self.preheat_min_slow_di, 0.0, 1.0)?;
        check_range("slew_up_c_per_5m", self.slew_up_c_per_5m, 0.0, 10.0)?;
        check_range("slew_down_c_per_5m", self.slew_down_c_per_5m, 0.0, 10.0)?;
        Ok(())
    }

    /// Error and duty weights scaled to sum to one.
    fn score_weights(&self) -> (f64, f64) {
        let ew = self.error_weight.max(0.0);
        let dw = self.duty_weight.max(0.0);
        let total = ew + dw;
        if total <= 0.0 { (1.0, 0.0) } else { (ew / total, dw / total) }
    }
}

/// Read-only snapshot of one demanding zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneFlowInput {
    pub zone: ZoneId,
    pub target: f64,
    /// Control error in °C, positive when the zone needs the plant.
    pub error: f64,
    /// Duty percentage for PWM zones.
    pub duty: Option<f64>,
    pub weight: f64,
    pub responsiveness: Responsiveness,
    pub solar_weight: f64,
}

impl ZoneFlowInput {
    fn duty_fraction(&self) -> Option<f64> {
        self.duty.map(|d| clamp(d, 0.0, 100.0) / 100.0)
    }
}

/// Outdoor conditions; every field is optional.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WeatherInputs {
    pub outside_temp: Option<f64>,
    pub forecast_temp: Option<f64>,
    /// Forecast irradiance in W/m².
    pub solar_forecast: Option<f64>,
}

/// State the supervisor carries between computations.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FlowSupervisorState {
    pub slow: Ewma,
    pub fast: Ewma,
    /// Integral trim in °C.
    pub integral: f64,
    /// Last emitted flow temperature; the slew limit is measured from it.
    pub last_flow: Option<f64>,
    pub last_preheat_boost: f64,
    /// Mode of the last emission; a change restarts the supervisor.
    pub last_mode: Option<HvacMode>,
}

#[derive(Clone, Copy)]
struct Scored<'a> {
    zone: &'a ZoneFlowInput,
    score: f64,
}

/// Flow supervisor owning its tunables and state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlowSupervisor {
    config: SupervisorConfig,
    state: FlowSupervisorState,
}

impl FlowSupervisor {
    pub fn new(config: SupervisorConfig) -> Self {
        Self {
            config,
            state: FlowSupervisorState::default(),
        }
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    pub fn state(&self) -> &FlowSupervisorState {
        &self.state
    }

    /// Forget filters, integral and the last emission.
    pub fn reset(&mut self) {
        self.state = FlowSupervisorState::default();
    }

    /// Replace the tunables and start over.
    pub fn reconfigure(&mut self, config: SupervisorConfig) {
        self.config = config;
        self.reset();
    }

    /// Supervised flow temperature for this tick.
    ///
    /// Returns `None`, leaving the state untouched, when `direction` is idle
    /// or no zone is demanding.
    ///
    /// # Arguments
    ///
    /// * `zones` - Zones demanding in `direction`
    /// * `weather` - Outside, forecast and solar inputs; missing ones contribute nothing
    /// * `params` - Curve parameters shared with simple mode
    /// * `dt` - Time since the previous computation
    pub fn compute(
        &mut self,
        zones: &[ZoneFlowInput],
        direction: Demand,
        weather: &WeatherInputs,
        params: &SimpleFlowParams,
        dt: Time,
    ) -> Option<FlowOutput> {
        let mode = direction.hvac_mode()?;
        let base = base_term(zones.iter().map(|z| z.target), mode, weather.outside_temp, params)?;

        if self.state.last_mode.is_some_and(|last| last != mode) {
            debug!(to = %mode, "flow supervisor mode changed, resetting");
            self.reset();
        }

        let cfg = self.config;
        let dt_minutes = as_minutes(dt).max(0.0);
        let (error_weight, duty_weight) = cfg.score_weights();
        let norm_max = cfg.error_norm_max.max(0.1);

        let scored: Vec<Scored<'_>> = zones
            .iter()
            .map(|zone| {
                let norm = clamp(zone.error / norm_max, 0.0, 1.0);
                let score = match zone.duty_fraction() {
                    Some(duty) => error_weight * norm + duty_weight * duty,
                    None => norm,
                };
                Scored { zone, score }
            })
            .collect();

        let mut slow: Vec<Scored<'_>> = scored
            .iter()
            .copied()
            .filter(|s| s.zone.responsiveness == Responsiveness::Slow)
            .collect();
        let fast: Vec<Scored<'_>> = scored
            .iter()
            .copied()
            .filter(|s| s.zone.responsiveness == Responsiveness::Fast)
            .collect();
        if slow.is_empty() {
            slow = scored.clone();
        }

        let raw_slow = weighted_average(slow.iter().map(|s| (s.score, s.zone.weight)));
        let raw_fast = if fast.is_empty() {
            raw_slow
        } else {
            weighted_average(fast.iter().map(|s| (s.score, s.zone.weight)))
        };

        let state = &mut self.state;
        let di_slow = state.slow.update(raw_slow, dt_minutes, cfg.duty_ema_minutes.max(1.0));
        let di_fast = state.fast.update(raw_fast, dt_minutes, cfg.fast_ema_minutes.max(1.0));
        let demand_index = cfg.slow_mix_weight * di_slow + cfg.fast_mix_weight * di_fast;

        let trim_p = cfg.kp.max(0.0) * demand_index;
        if cfg.use_integral {
            let i_max = cfg.i_max.max(0.0);
            state.integral = clamp(
                state.integral + demand_index * dt_minutes / cfg.ti_minutes.max(1.0),
                -i_max,
                i_max,
            );
        } else {
            state.integral = 0.0;
        }

        let fast_boost = fast_boost(&fast, &cfg);
        let preheat_boost = if cfg.preheat_enabled && di_slow >= cfg.preheat_min_slow_di.max(0.0) {
            preheat_boost(&slow, mode, weather, &cfg)
        } else {
            0.0
        };
        state.last_preheat_boost = preheat_boost;

        let trim = trim_p + state.integral + fast_boost + preheat_boost;
        let unclamped = base.value + mode.sign() * trim;
        let band = params.band(mode);
        let goal = round_tenth(band.clamp(unclamped));
        let slewed = match state.last_flow {
            Some(last) => {
                let window = dt_minutes / SLEW_WINDOW_MINUTES;
                slew_limit(
                    last,
                    goal,
                    cfg.slew_up_c_per_5m * window,
                    cfg.slew_down_c_per_5m * window,
                )
            }
            None => goal,
        };
        let flow_temp = band.clamp(slewed);
        state.last_flow = Some(flow_temp);
        state.last_mode = Some(mode);

        let terms = SupervisorTerms {
            di_slow,
            di_fast,
            demand_index,
            trim_p,
            integral: state.integral,
            fast_boost,
            preheat_boost,
            slewed,
        };
        trace!(
            mode = %mode,
            di_slow,
            di_fast,
            trim_p,
            fast_boost,
            preheat_boost,
            unclamped,
            flow_temp,
            "flow supervisor tick"
        );

        Some(FlowOutput {
            flow_temp,
            breakdown: FlowBreakdown {
                effective_mode: mode,
                flow_mode: FlowMode::Advanced,
                outside_temp: weather.outside_temp,
                reference_target: base.reference,
                base_offset: base.base_offset,
                weather_comp: base.weather_comp,
                curve_offset: base.curve_offset,
                supervisor: Some(terms),
                unclamped,
                clamp_min: band.min,
                clamp_max: band.max,
                flow_temp,
            },
        })
    }
}

/// Largest weighted excess error over the fast zones, scaled and capped.
fn fast_boost(fast: &[Scored<'_>], cfg: &SupervisorConfig) -> f64 {
    let deadband = cfg.fast_error_deadband_c.max(0.0);
    let excess = fast
        .iter()
        .map(|s| {
            let z = s.zone;
            (z.error - deadband).max(0.0) * z.duty_fraction().unwrap_or(1.0) * z.weight.max(0.0)
        })
        .fold(0.0, f64::max);
    clamp(excess * cfg.fast_boost_gain.max(0.0), 0.0, cfg.fast_boost_cap_c.max(0.0))
}

/// Forecast temperature term plus solar term, capped to `[0, preheat_cap_c]`.
///
/// The temperature term only counts a forecast moving toward more demand.
fn preheat_boost(
    slow: &[Scored<'_>],
    mode: HvacMode,
    weather: &WeatherInputs,
    cfg: &SupervisorConfig,
) -> f64 {
    let temperature = match (weather.outside_temp, weather.forecast_temp) {
        (Some(outside), Some(forecast)) if outside.is_finite() && forecast.is_finite() => {
            cfg.preheat_gain.max(0.0) * (mode.sign() * (outside - forecast)).max(0.0)
        }
        _ => 0.0,
    };
    let solar = weather
        .solar_forecast
        .filter(|s| s.is_finite())
        .map_or(0.0, |irradiance| {
            let solar_factor = weighted_average(slow.iter().map(|s| {
                let weight = s.zone.weight.max(0.0) * s.score.max(SOLAR_SCORE_FLOOR);
                (s.zone.solar_weight.max(0.0), weight)
            }));
            cfg.preheat_solar_gain_per_w_m2 * irradiance.max(0.0) * solar_factor
        });
    clamp(temperature + solar, 0.0, cfg.preheat_cap_c.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hz_core::minutes;

    fn zone(i: u32, target: f64, error: f64, responsiveness: Responsiveness) -> ZoneFlowInput {
        ZoneFlowInput {
            zone: ZoneId::from_index(i),
            target,
            error,
            duty: None,
            weight: 1.0,
            responsiveness,
            solar_weight: 1.0,
        }
    }

    fn slow_zone(target: f64, error: f64) -> [ZoneFlowInput; 1] {
        [zone(0, target, error, Responsiveness::Slow)]
    }

    fn weather(outside: f64) -> WeatherInputs {
        WeatherInputs {
            outside_temp: Some(outside),
            ..WeatherInputs::default()
        }
    }

    fn preheat_config() -> SupervisorConfig {
        SupervisorConfig {
            preheat_enabled: true,
            ..SupervisorConfig::default()
        }
    }

    #[test]
    fn first_emission_is_base_plus_trim() {
        let mut sup = FlowSupervisor::default();
        let params = SimpleFlowParams::default();
        let out = sup
            .compute(&slow_zone(21.0, 1.0), Demand::Heat, &weather(5.0), &params, minutes(1.0))
            .unwrap();
        // base 28.0, di = 0.8 * 0.5 + 0.2 * 0.5 = 0.5, trim 0.5
        let terms = out.breakdown.supervisor.unwrap();
        assert!((terms.demand_index - 0.5).abs() < 1e-12);
        assert!((out.flow_temp - 28.5).abs() < 1e-9);
        assert_eq!(sup.state().last_flow, Some(out.flow_temp));
    }

    #[test]
    fn idle_leaves_state_untouched() {
        let mut sup = FlowSupervisor::default();
        let zones = slow_zone(21.0, 1.0);
        let params = SimpleFlowParams::default();
        sup.compute(&zones, Demand::Heat, &weather(5.0), &params, minutes(1.0));
        let before = *sup.state();
        assert!(
            sup.compute(&zones, Demand::Idle, &weather(5.0), &params, minutes(1.0))
                .is_none()
        );
        assert!(
            sup.compute(&[], Demand::Heat, &weather(5.0), &params, minutes(1.0))
                .is_none()
        );
        assert_eq!(*sup.state(), before);
    }

    #[test]
    fn slew_limits_upward_jump() {
        let mut sup = FlowSupervisor::default();
        let params = SimpleFlowParams::default();
        let w = weather(16.0);
        let first = sup
            .compute(&slow_zone(20.0, 0.0), Demand::Heat, &w, &params, minutes(5.0))
            .unwrap();
        assert!((first.flow_temp - 24.0).abs() < 1e-9);

        // target jumps by 3 °C: only 0.3 °C per 5 minutes may pass
        let hot = slow_zone(23.0, 3.0);
        let second = sup.compute(&hot, Demand::Heat, &w, &params, minutes(5.0)).unwrap();
        assert!((second.flow_temp - 24.3).abs() < 1e-9);
        assert!(second.breakdown.unclamped > 28.0);

        // half the window, half the step
        let third = sup.compute(&hot, Demand::Heat, &w, &params, minutes(2.5)).unwrap();
        assert!((third.flow_temp - second.flow_temp - 0.15).abs() < 1e-9);
    }

    #[test]
    fn short_ticks_ramp_within_their_allowance() {
        let mut sup = FlowSupervisor::default();
        let params = SimpleFlowParams::default();
        let w = weather(16.0);
        sup.compute(&slow_zone(20.0, 0.0), Demand::Heat, &w, &params, minutes(1.0));

        // 0.06 °C per one-minute tick, below the 0.1 °C grid
        let hot = slow_zone(23.0, 0.0);
        let mut emitted = vec![24.0];
        for _ in 0..5 {
            let out = sup.compute(&hot, Demand::Heat, &w, &params, minutes(1.0)).unwrap();
            emitted.push(out.flow_temp);
        }
        for step in emitted.windows(2).map(|w| w[1] - w[0]) {
            assert!(step > 0.0 && step <= 0.06 + 1e-9, "step {step}");
        }
        assert!((emitted[5] - 24.3).abs() < 1e-9);
    }

    #[test]
    fn ramp_settles_on_the_tenth_grid() {
        let mut sup = FlowSupervisor::default();
        let params = SimpleFlowParams::default();
        let w = weather(16.0);
        sup.compute(&slow_zone(20.0, 0.0), Demand::Heat, &w, &params, minutes(5.0));

        // 20.4 + 3 + 0.25 * 4.4 = 24.5
        let warmer = slow_zone(20.4, 0.0);
        let mut last = 0.0;
        for _ in 0..4 {
            last = sup
                .compute(&warmer, Demand::Heat, &w, &params, minutes(1.5))
                .unwrap()
                .flow_temp;
        }
        assert!((last - 24.36).abs() < 1e-9);
        let settled = sup
            .compute(&warmer, Demand::Heat, &w, &params, minutes(5.0))
            .unwrap()
            .flow_temp;
        assert!((settled - 24.5).abs() < 1e-9);
    }

    #[test]
    fn zero_dt_holds_the_last_emission() {
        let mut sup = FlowSupervisor::default();
        let params = SimpleFlowParams::default();
        let w = weather(16.0);
        let first = sup
            .compute(&slow_zone(20.0, 0.0), Demand::Heat, &w, &params, minutes(5.0))
            .unwrap();
        let held = sup
            .compute(&slow_zone(23.0, 3.0), Demand::Heat, &w, &params, minutes(0.0))
            .unwrap();
        assert_eq!(held.flow_temp, first.flow_temp);
    }

    #[test]
    fn fast_zone_boost_is_capped() {
        let mut sup = FlowSupervisor::default();
        let zones = [
            zone(0, 21.0, 0.0, Responsiveness::Slow),
            zone(1, 21.0, 3.0, Responsiveness::Fast),
        ];
        let params = SimpleFlowParams::default();
        let out = sup
            .compute(&zones, Demand::Heat, &weather(5.0), &params, minutes(1.0))
            .unwrap();
        let terms = out.breakdown.supervisor.unwrap();
        // (3.0 - 0.4) * 1.2 = 3.12, capped at 1.2
        assert!((terms.fast_boost - 1.2).abs() < 1e-12);
    }

    #[test]
    fn fast_boost_scales_with_duty() {
        let mut sup = FlowSupervisor::default();
        let mut fast = zone(1, 21.0, 0.9, Responsiveness::Fast);
        fast.duty = Some(50.0);
        let params = SimpleFlowParams::default();
        let out = sup
            .compute(&[fast], Demand::Heat, &weather(5.0), &params, minutes(1.0))
            .unwrap();
        // (0.9 - 0.4) * 0.5 * 1.2
        assert!((out.breakdown.supervisor.unwrap().fast_boost - 0.3).abs() < 1e-9);
    }

    #[test]
    fn preheat_from_colder_forecast() {
        let mut sup = FlowSupervisor::new(preheat_config());
        let w = WeatherInputs {
            outside_temp: Some(5.0),
            forecast_temp: Some(3.0),
            solar_forecast: None,
        };
        let params = SimpleFlowParams::default();
        let out = sup
            .compute(&slow_zone(21.0, 2.0), Demand::Heat, &w, &params, minutes(1.0))
            .unwrap();
        let terms = out.breakdown.supervisor.unwrap();
        assert!((terms.preheat_boost - 0.7).abs() < 1e-9);
        assert!((sup.state().last_preheat_boost - 0.7).abs() < 1e-9);
    }

    #[test]
    fn preheat_needs_slow_demand_and_forecast() {
        let params = SimpleFlowParams::default();
        let w = WeatherInputs {
            outside_temp: Some(5.0),
            forecast_temp: Some(0.0),
            solar_forecast: Some(400.0),
        };

        // slow index 0.1 < 0.25
        let mut sup = FlowSupervisor::new(preheat_config());
        let out = sup
            .compute(&slow_zone(21.0, 0.2), Demand::Heat, &w, &params, minutes(1.0))
            .unwrap();
        assert_eq!(out.breakdown.supervisor.unwrap().preheat_boost, 0.0);

        // no forecast: temperature term is neutral
        let mut sup = FlowSupervisor::new(preheat_config());
        let out = sup
            .compute(&slow_zone(21.0, 2.0), Demand::Heat, &weather(5.0), &params, minutes(1.0))
            .unwrap();
        assert_eq!(out.breakdown.supervisor.unwrap().preheat_boost, 0.0);
    }

    #[test]
    fn negative_solar_gain_softens_preheat() {
        let cfg = SupervisorConfig {
            preheat_solar_gain_per_w_m2: -0.001,
            ..preheat_config()
        };
        let mut sup = FlowSupervisor::new(cfg);
        let w = WeatherInputs {
            outside_temp: Some(5.0),
            forecast_temp: Some(3.0),
            solar_forecast: Some(300.0),
        };
        let params = SimpleFlowParams::default();
        let out = sup
            .compute(&slow_zone(21.0, 2.0), Demand::Heat, &w, &params, minutes(1.0))
            .unwrap();
        // 0.35 * 2 - 0.001 * 300 * 1.0
        assert!((out.breakdown.supervisor.unwrap().preheat_boost - 0.4).abs() < 1e-9);
    }

    #[test]
    fn warmer_forecast_does_not_cancel_solar_gain() {
        let cfg = SupervisorConfig {
            preheat_solar_gain_per_w_m2: 0.001,
            ..preheat_config()
        };
        let mut sup = FlowSupervisor::new(cfg);
        let w = WeatherInputs {
            outside_temp: Some(5.0),
            forecast_temp: Some(8.0),
            solar_forecast: Some(300.0),
        };
        let params = SimpleFlowParams::default();
        let out = sup
            .compute(&slow_zone(21.0, 2.0), Demand::Heat, &w, &params, minutes(1.0))
            .unwrap();
        assert!((out.breakdown.supervisor.unwrap().preheat_boost - 0.3).abs() < 1e-9);
    }

    #[test]
    fn integral_trim_is_clamped() {
        let cfg = SupervisorConfig {
            use_integral: true,
            ti_minutes: 1.0,
            ..SupervisorConfig::default()
        };
        let mut sup = FlowSupervisor::new(cfg);
        let zones = slow_zone(21.0, 2.0);
        let params = SimpleFlowParams::default();
        for _ in 0..10 {
            sup.compute(&zones, Demand::Heat, &weather(5.0), &params, minutes(5.0));
        }
        assert!((sup.state().integral - 1.5).abs() < 1e-12);
    }

    #[test]
    fn cooling_trim_lowers_flow() {
        let mut sup = FlowSupervisor::default();
        let params = SimpleFlowParams {
            weather_slope: 0.0,
            ..SimpleFlowParams::default()
        };
        let out = sup
            .compute(&slow_zone(24.0, 2.0), Demand::Cool, &weather(30.0), &params, minutes(1.0))
            .unwrap();
        // 24 - 2.5 - 1.0
        assert!((out.flow_temp - 20.5).abs() < 1e-9);
    }

    #[test]
    fn mode_change_restarts_slew() {
        let mut sup = FlowSupervisor::default();
        let params = SimpleFlowParams::default();
        sup.compute(&slow_zone(21.0, 1.0), Demand::Heat, &weather(5.0), &params, minutes(1.0));
        let out = sup
            .compute(&slow_zone(24.0, 1.0), Demand::Cool, &weather(30.0), &params, minutes(1.0))
            .unwrap();
        assert!(out.flow_temp <= 25.0);
        assert_eq!(sup.state().last_mode, Some(HvacMode::Cooling));
    }

    #[test]
    fn reset_clears_everything() {
        let mut sup = FlowSupervisor::default();
        sup.compute(
            &slow_zone(21.0, 1.0),
            Demand::Heat,
            &weather(5.0),
            &SimpleFlowParams::default(),
            minutes(1.0),
        );
        sup.reset();
        assert_eq!(*sup.state(), FlowSupervisorState::default());
    }

    #[test]
    fn config_validation() {
        assert!(SupervisorConfig::default().validate().is_ok());
        let bad = SupervisorConfig {
            error_norm_max: 0.0,
            ..SupervisorConfig::default()
        };
        assert!(bad.validate().is_err());
    }
}
