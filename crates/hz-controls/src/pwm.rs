//! Time-proportioning (PWM) execution for duty-cycle controlled zones.
//!
//! A duty percentage is realized as one on-segment followed by one
//! off-segment per cycle. The pulse plan is latched at each cycle start and
//! held until the next boundary (zero-order hold), so a duty change never
//! tears a pulse in half.

use hz_core::clamp;
use serde::{Deserialize, Serialize};

use crate::controller::{DUTY_MAX, DUTY_MIN};
use crate::error::{ControlResult, check_range};

const EPS: f64 = 1e-9;

/// Cycle configuration for a PWM zone, all times in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PwmConfig {
    /// Cycle length.
    pub cycle_minutes: f64,
    /// Shortest on-segment the actuators tolerate.
    pub min_on_minutes: f64,
    /// Shortest off-segment the actuators tolerate.
    pub min_off_minutes: f64,
    /// Valve opening time added to every non-empty on-segment.
    pub actuator_delay_minutes: f64,
}

impl PwmConfig {
    /// Create a cycle configuration.
    ///
    /// # Arguments
    ///
    /// * `cycle_minutes` - Cycle length, within `[5, 30]`
    /// * `min_on_minutes` - Minimum on-segment, within `[1, 10]`
    /// * `min_off_minutes` - Minimum off-segment, within `[1, 10]`
    pub fn new(
        cycle_minutes: f64,
        min_on_minutes: f64,
        min_off_minutes: f64,
    ) -> ControlResult<Self> {
        Ok(Self {
            cycle_minutes: check_range("cycle_minutes", cycle_minutes, 5.0, 30.0)?,
            min_on_minutes: check_range("min_on_minutes", min_on_minutes, 1.0, 10.0)?,
            min_off_minutes: check_range("min_off_minutes", min_off_minutes, 1.0, 10.0)?,
            actuator_delay_minutes: 0.0,
        })
    }

    /// Set the actuator opening delay.
    pub fn with_actuator_delay(mut self, delay_minutes: f64) -> ControlResult<Self> {
        self.actuator_delay_minutes =
            check_range("actuator_delay_minutes", delay_minutes, 0.0, self.cycle_minutes)?;
        Ok(self)
    }
}

impl Default for PwmConfig {
    fn default() -> Self {
        Self {
            cycle_minutes: 15.0,
            min_on_minutes: 3.0,
            min_off_minutes: 3.0,
            actuator_delay_minutes: 0.0,
        }
    }
}

/// On/off split of one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PulsePlan {
    /// Duty the plan was computed from.
    pub duty: f64,
    pub on_minutes: f64,
    pub cycle_minutes: f64,
}

impl PulsePlan {
    pub fn off_minutes(&self) -> f64 {
        (self.cycle_minutes - self.on_minutes).max(0.0)
    }

    pub fn is_always_off(&self) -> bool {
        self.on_minutes <= EPS
    }

    pub fn is_always_on(&self) -> bool {
        self.off_minutes() <= EPS
    }
}

/// Split a cycle into on/off segments for `duty`.
///
/// Segments shorter than their configured minimum are stretched to it; when
/// both minimums cannot hold at once the whole cycle goes on or off,
/// whichever the duty is closer to.
pub fn plan_pulse(duty: f64, config: &PwmConfig) -> PulsePlan {
    let cycle = config.cycle_minutes.max(EPS);
    let duty = clamp(duty, DUTY_MIN, DUTY_MAX);
    let min_on = config.min_on_minutes.max(0.0);
    let min_off = config.min_off_minutes.max(0.0);

    let mut on = cycle * duty / DUTY_MAX;
    if on > EPS && on < min_on - EPS {
        on = min_on;
    }
    let off = cycle - on;
    if off > EPS && off < min_off - EPS {
        on = cycle - min_off;
    }

    let off = cycle - on;
    let on_ok = on.abs() <= EPS || on >= min_on - EPS;
    let off_ok = off <= EPS || off >= min_off - EPS;
    if !(on_ok && off_ok) {
        on = if duty >= DUTY_MAX / 2.0 { cycle } else { 0.0 };
    }

    if on <= EPS {
        on = 0.0;
    } else if cycle - on <= EPS {
        on = cycle;
    }

    if on > 0.0 && config.actuator_delay_minutes > 0.0 {
        on = (on + config.actuator_delay_minutes).min(cycle);
        let off = cycle - on;
        if off > EPS && off < min_off - EPS {
            on = cycle;
        }
    }

    PulsePlan {
        duty,
        on_minutes: on,
        cycle_minutes: cycle,
    }
}

/// Where a zone is inside its current PWM cycle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PwmPhase {
    /// Minutes elapsed since the current cycle started.
    elapsed_minutes: f64,
    /// Plan latched at the current cycle start, `None` before the first cycle.
    plan: Option<PulsePlan>,
    /// Offset applied when the first cycle starts (cycle staggering).
    initial_elapsed_minutes: f64,
}

impl PwmPhase {
    /// A phase whose first cycle starts `initial_elapsed_minutes` into a cycle.
    pub fn staggered(initial_elapsed_minutes: f64) -> Self {
        Self {
            initial_elapsed_minutes: initial_elapsed_minutes.max(0.0),
            ..Self::default()
        }
    }

    pub fn elapsed_minutes(&self) -> f64 {
        self.elapsed_minutes
    }

    pub fn plan(&self) -> Option<&PulsePlan> {
        self.plan.as_ref()
    }

    /// Duty latched for the current cycle, 0 before the first cycle.
    pub fn cycle_duty(&self) -> f64 {
        self.plan.map_or(0.0, |p| p.duty)
    }

    /// Advance the phase by `dt_minutes`.
    ///
    /// A new plan is computed from `duty` only when a cycle boundary is
    /// crossed (or on the very first call). Returns `true` when a new cycle
    /// started.
    pub fn advance(&mut self, dt_minutes: f64, config: &PwmConfig, duty: f64) -> bool {
        let cycle = config.cycle_minutes.max(EPS);
        if self.plan.is_none() {
            self.elapsed_minutes = self.initial_elapsed_minutes % cycle;
            self.plan = Some(plan_pulse(duty, config));
            return true;
        }

        self.elapsed_minutes += dt_minutes.max(0.0);
        let cycles = ((self.elapsed_minutes + EPS) / cycle).floor();
        if cycles < 1.0 {
            return false;
        }
        self.elapsed_minutes = (self.elapsed_minutes - cycles * cycle).max(0.0);
        self.plan = Some(plan_pulse(duty, config));
        true
    }

    /// Whether the actuators are inside the on-segment.
    pub fn is_on(&self) -> bool {
        self.plan
            .is_some_and(|p| p.on_minutes > 0.0 && self.elapsed_minutes < p.on_minutes)
    }

    /// Drop the current cycle; the next advance starts a fresh one.
    pub fn rebaseline(&mut self) {
        self.elapsed_minutes = 0.0;
        self.plan = None;
    }
}

/// Minutes into its current cycle a zone is at `timestamp_s`, when cycles are
/// aligned to wall-clock multiples of the cycle and offset per zone by
/// `zone_index * cycle / zone_count`.
pub fn staggered_elapsed_minutes(
    timestamp_s: i64,
    cycle_minutes: f64,
    zone_index: usize,
    zone_count: usize,
) -> f64 {
    let cycle_s = ((cycle_minutes * 60.0).round() as i64).max(60);
    let offset_s = if zone_count > 1 {
        (zone_index as i64 * cycle_s) / zone_count as i64
    } else {
        0
    };
    let elapsed_s = (timestamp_s - offset_s).rem_euclid(cycle_s);
    elapsed_s as f64 / 60.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(cycle: f64, min_on: f64, min_off: f64) -> PwmConfig {
        PwmConfig::new(cycle, min_on, min_off).unwrap()
    }

    #[test]
    fn pwm_config_ranges() {
        assert!(PwmConfig::new(4.0, 3.0, 3.0).is_err());
        assert!(PwmConfig::new(31.0, 3.0, 3.0).is_err());
        assert!(PwmConfig::new(15.0, 0.5, 3.0).is_err());
        assert!(PwmConfig::new(15.0, 3.0, 11.0).is_err());
        assert!(PwmConfig::new(15.0, 3.0, 3.0).is_ok());
        assert!(config(15.0, 3.0, 3.0).with_actuator_delay(16.0).is_err());
    }

    #[test]
    fn plain_split() {
        let plan = plan_pulse(40.0, &config(15.0, 3.0, 3.0));
        assert!((plan.on_minutes - 6.0).abs() < 1e-12);
        assert!((plan.off_minutes() - 9.0).abs() < 1e-12);
    }

    #[test]
    fn short_on_segment_rounds_up() {
        let plan = plan_pulse(10.0, &config(15.0, 3.0, 3.0));
        assert!((plan.on_minutes - 3.0).abs() < 1e-12);
    }

    #[test]
    fn short_off_segment_rounds_up() {
        let plan = plan_pulse(90.0, &config(15.0, 3.0, 3.0));
        assert!((plan.off_minutes() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn zero_and_full_duty() {
        let cfg = config(15.0, 3.0, 3.0);
        assert!(plan_pulse(0.0, &cfg).is_always_off());
        assert!(plan_pulse(100.0, &cfg).is_always_on());
        assert!(plan_pulse(-5.0, &cfg).is_always_off());
        assert!(plan_pulse(150.0, &cfg).is_always_on());
    }

    #[test]
    fn infeasible_minimums_degrade_to_nearest_extreme() {
        // 4 + 4 > 5: no split can satisfy both minimums
        let cfg = config(5.0, 4.0, 4.0);
        assert!(plan_pulse(60.0, &cfg).is_always_on());
        assert!(plan_pulse(30.0, &cfg).is_always_off());
    }

    #[test]
    fn actuator_delay_extends_on_segment() {
        let cfg = config(15.0, 3.0, 3.0).with_actuator_delay(2.0).unwrap();
        assert!((plan_pulse(40.0, &cfg).on_minutes - 8.0).abs() < 1e-12);
        // 11 + 2 leaves a 2-minute off segment, shorter than the minimum
        assert!(plan_pulse(73.4, &cfg).is_always_on());
        assert!(plan_pulse(0.0, &cfg).is_always_off());
    }

    #[test]
    fn phase_latches_plan_until_boundary() {
        let cfg = config(15.0, 3.0, 3.0);
        let mut phase = PwmPhase::default();
        assert!(phase.advance(1.0, &cfg, 40.0));
        assert!(phase.is_on());
        assert_eq!(phase.cycle_duty(), 40.0);

        // duty changes mid-cycle, plan stays
        for _ in 0..5 {
            assert!(!phase.advance(1.0, &cfg, 100.0));
        }
        assert_eq!(phase.cycle_duty(), 40.0);
        assert!(phase.is_on()); // elapsed 5 < 6
        phase.advance(1.0, &cfg, 100.0);
        assert!(!phase.is_on()); // elapsed 6

        // boundary at 15 minutes picks up the new duty
        for _ in 0..8 {
            phase.advance(1.0, &cfg, 100.0);
        }
        assert_eq!(phase.elapsed_minutes(), 14.0);
        assert!(phase.advance(1.0, &cfg, 100.0));
        assert_eq!(phase.cycle_duty(), 100.0);
        assert!(phase.is_on());
    }

    #[test]
    fn large_dt_wraps_into_cycle() {
        let cfg = config(10.0, 2.0, 2.0);
        let mut phase = PwmPhase::default();
        phase.advance(0.0, &cfg, 50.0);
        assert!(phase.advance(27.0, &cfg, 50.0));
        assert!((phase.elapsed_minutes() - 7.0).abs() < 1e-9);
        assert!(!phase.is_on());
    }

    #[test]
    fn rebaseline_restarts_cycle() {
        let cfg = config(10.0, 2.0, 2.0);
        let mut phase = PwmPhase::staggered(4.0);
        phase.advance(0.0, &cfg, 50.0);
        assert_eq!(phase.elapsed_minutes(), 4.0);
        phase.rebaseline();
        assert!(phase.plan().is_none());
        assert!(!phase.is_on());
    }

    #[test]
    fn staggered_offsets_spread_zones() {
        // 15-minute cycle, 3 zones, at an aligned boundary
        let ts = 15 * 60 * 1000;
        assert_eq!(staggered_elapsed_minutes(ts, 15.0, 0, 3), 0.0);
        assert_eq!(staggered_elapsed_minutes(ts, 15.0, 1, 3), 10.0);
        assert_eq!(staggered_elapsed_minutes(ts, 15.0, 2, 3), 5.0);
        assert_eq!(staggered_elapsed_minutes(ts + 60, 15.0, 0, 1), 1.0);
    }
}
