//! Per-zone controller: readings in, demand and actuator command out.
//!
//! A zone runs one of two strategies selected by configuration:
//! - bang-bang: hysteresis switch, binary demand
//! - pwm: PI duty cycle realized as timed pulses within a fixed cycle
//!
//! All mutable state lives in [`ZoneState`] and is written only by
//! [`update_zone`] / [`hold_off`]. Unavailable readings never fail the
//! caller: the previous demand and command are kept and a warning returned.

use hz_core::{Time, as_minutes};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::actuator::ActuatorCommand;
use crate::controller::{DutyPi, PiState};
use crate::error::{ControlResult, check_range};
use crate::hysteresis::{Hysteresis, SwitchState};
use crate::mode::{Demand, HvacMode, Responsiveness};
use crate::pwm::{PwmConfig, PwmPhase, plan_pulse};

/// How a zone turns readings into actuation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ControlStrategy {
    #[default]
    BangBang,
    Pwm { pi: DutyPi, pwm: PwmConfig },
}

/// Immutable per-load configuration of one zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneConfig {
    pub name: String,
    /// Sensor reference for the zone temperature.
    pub temp_sensor: String,
    /// Reference for the target temperature.
    pub target_source: String,
    pub hysteresis: Hysteresis,
    pub strategy: ControlStrategy,
    pub responsiveness: Responsiveness,
    /// Share of this zone in the supervisor's demand index.
    pub flow_weight: f64,
    /// Share of this zone in the supervisor's solar preheat term.
    pub solar_weight: f64,
}

impl ZoneConfig {
    pub fn new(
        name: impl Into<String>,
        temp_sensor: impl Into<String>,
        target_source: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            temp_sensor: temp_sensor.into(),
            target_source: target_source.into(),
            hysteresis: Hysteresis::default(),
            strategy: ControlStrategy::BangBang,
            responsiveness: Responsiveness::Slow,
            flow_weight: 1.0,
            solar_weight: 1.0,
        }
    }

    pub fn with_strategy(mut self, strategy: ControlStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_responsiveness(mut self, responsiveness: Responsiveness) -> Self {
        self.responsiveness = responsiveness;
        self
    }

    /// Re-check ranges of a config that may have been built field by field.
    pub fn validate(&self) -> ControlResult<()> {
        Hysteresis::new(self.hysteresis.band)?;
        check_range("flow_weight", self.flow_weight, 0.0, f64::MAX)?;
        check_range("solar_weight", self.solar_weight, 0.0, f64::MAX)?;
        if let ControlStrategy::Pwm { pi, pwm } = &self.strategy {
            DutyPi::new(pi.kp, pi.ki)?;
            PwmConfig::new(pwm.cycle_minutes, pwm.min_on_minutes, pwm.min_off_minutes)?
                .with_actuator_delay(pwm.actuator_delay_minutes)?;
        }
        Ok(())
    }
}

/// Mutable state of one zone.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ZoneState {
    pub last_current: Option<f64>,
    pub last_target: Option<f64>,
    /// Mode the zone was last controlled in.
    pub mode: Option<HvacMode>,
    pub demand: Demand,
    pub command: ActuatorCommand,
    pub switch: SwitchState,
    pub pwm: PwmPhase,
    pub pi: PiState,
    /// Most recent PI duty, before cycle latching.
    pub duty: f64,
}

impl ZoneState {
    /// Fresh state whose first PWM cycle starts `elapsed_minutes` in.
    pub fn staggered(elapsed_minutes: f64) -> Self {
        Self {
            pwm: PwmPhase::staggered(elapsed_minutes),
            ..Self::default()
        }
    }

    /// Reset PWM phase and PI integral to neutral, keeping readings and the
    /// last demand.
    pub fn rebaseline(&mut self) {
        self.pwm.rebaseline();
        self.pi = PiState::default();
        self.duty = 0.0;
    }
}

/// Degraded-input condition reported alongside an unchanged result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneWarning {
    SensorUnavailable,
    TargetUnavailable,
}

/// Result of one zone update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneUpdate {
    pub demand: Demand,
    pub command: ActuatorCommand,
    pub warning: Option<ZoneWarning>,
}

/// Advance one zone by one tick.
///
/// # Arguments
///
/// * `current` - Zone temperature, `None` when the sensor is unavailable
/// * `target` - Target temperature, `None` when its source is unavailable
/// * `mode` - Effective heating/cooling mode for this tick
/// * `dt` - Time since the previous update of this zone
pub fn update_zone(
    state: &mut ZoneState,
    config: &ZoneConfig,
    current: Option<f64>,
    target: Option<f64>,
    mode: HvacMode,
    dt: Time,
) -> ZoneUpdate {
    let Some(current) = current.filter(|v| v.is_finite()) else {
        warn!(
            zone = %config.name,
            sensor = %config.temp_sensor,
            "zone temperature unavailable, keeping previous command"
        );
        return unchanged(state, ZoneWarning::SensorUnavailable);
    };
    let Some(target) = target.filter(|v| v.is_finite()) else {
        warn!(
            zone = %config.name,
            source = %config.target_source,
            "zone target unavailable, keeping previous command"
        );
        return unchanged(state, ZoneWarning::TargetUnavailable);
    };

    if state.mode != Some(mode) {
        if let Some(previous) = state.mode {
            debug!(
                zone = %config.name,
                from = %previous,
                to = %mode,
                "zone mode changed, resetting controller"
            );
        }
        state.switch = SwitchState::Off;
        state.pi = PiState::default();
        state.pwm.rebaseline();
        state.mode = Some(mode);
    }
    state.last_current = Some(current);
    state.last_target = Some(target);

    let (demand, command) = match &config.strategy {
        ControlStrategy::BangBang => {
            let next = config.hysteresis.next(state.switch, current, target, mode);
            if next != state.switch {
                debug!(zone = %config.name, current, target, on = next.is_on(), "zone switched");
            }
            state.switch = next;
            let demand = if next.is_on() { mode.demand() } else { Demand::Idle };
            (demand, ActuatorCommand::Switch { on: next.is_on() })
        }
        ControlStrategy::Pwm { pi, pwm } => {
            let dt_minutes = as_minutes(dt).max(0.0);
            let error = mode.error(target, current);
            let (pi_state, out) = pi.update(&state.pi, error, dt_minutes);
            state.pi = pi_state;
            state.duty = out.duty;

            if state.pwm.advance(dt_minutes, pwm, out.duty) {
                debug!(zone = %config.name, duty = state.pwm.cycle_duty(), "new pwm cycle");
            }

            let idle = plan_pulse(out.duty, pwm).is_always_off() && error <= 0.0;
            let demand = if idle { Demand::Idle } else { mode.demand() };
            let command = ActuatorCommand::Pulse {
                duty: state.pwm.cycle_duty(),
                on: state.pwm.is_on(),
            };
            (demand, command)
        }
    };

    state.demand = demand;
    state.command = command;
    ZoneUpdate {
        demand,
        command,
        warning: None,
    }
}

/// Hold a zone idle with closed valves (zone disabled or plant off).
///
/// PI and PWM state are left untouched so control resumes where it was.
pub fn hold_off(state: &mut ZoneState) -> ZoneUpdate {
    state.demand = Demand::Idle;
    state.command = state.command.closed();
    state.switch = SwitchState::Off;
    ZoneUpdate {
        demand: state.demand,
        command: state.command,
        warning: None,
    }
}

fn unchanged(state: &ZoneState, warning: ZoneWarning) -> ZoneUpdate {
    ZoneUpdate {
        demand: state.demand,
        command: state.command,
        warning: Some(warning),
    }
}

/// A zone's configuration together with the state it exclusively owns.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneController {
    config: ZoneConfig,
    state: ZoneState,
}

impl ZoneController {
    pub fn new(config: ZoneConfig) -> Self {
        Self::with_state(config, ZoneState::default())
    }

    pub fn with_state(config: ZoneConfig, state: ZoneState) -> Self {
        Self { config, state }
    }

    pub fn config(&self) -> &ZoneConfig {
        &self.config
    }

    pub fn state(&self) -> &ZoneState {
        &self.state
    }

    pub fn update(
        &mut self,
        current: Option<f64>,
        target: Option<f64>,
        mode: HvacMode,
        dt: Time,
    ) -> ZoneUpdate {
        update_zone(&mut self.state, &self.config, current, target, mode, dt)
    }

    pub fn hold_off(&mut self) -> ZoneUpdate {
        hold_off(&mut self.state)
    }

    /// Swap in a reloaded configuration and re-baseline the state.
    pub fn reconfigure(&mut self, config: ZoneConfig) {
        self.config = config;
        self.state.rebaseline();
    }

    pub fn demand(&self) -> Demand {
        self.state.demand
    }

    pub fn command(&self) -> ActuatorCommand {
        self.state.command
    }
}
