//! Actuator commands handed to the layer that drives valves and pumps.
//!
//! Commands are plain values; applying them to hardware is someone else's
//! job. A bang-bang zone emits a switch position, a PWM zone emits the duty
//! of its current cycle together with the instantaneous valve position.

use serde::{Deserialize, Serialize};

/// Command for a zone's circuit actuators.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActuatorCommand {
    /// Binary valve position.
    Switch { on: bool },
    /// Time-proportioned valve: `duty` latched for the current cycle, `on`
    /// is where the cycle currently is.
    Pulse { duty: f64, on: bool },
}

impl ActuatorCommand {
    pub const OFF: Self = ActuatorCommand::Switch { on: false };

    /// Whether the valves should be open right now.
    pub fn is_on(&self) -> bool {
        match *self {
            ActuatorCommand::Switch { on } | ActuatorCommand::Pulse { on, .. } => on,
        }
    }

    /// Duty percentage, `None` for switched actuators.
    pub fn duty(&self) -> Option<f64> {
        match *self {
            ActuatorCommand::Switch { .. } => None,
            ActuatorCommand::Pulse { duty, .. } => Some(duty),
        }
    }

    /// Same command kind with the valves closed.
    pub fn closed(&self) -> Self {
        match *self {
            ActuatorCommand::Switch { .. } => ActuatorCommand::OFF,
            ActuatorCommand::Pulse { .. } => ActuatorCommand::Pulse {
                duty: 0.0,
                on: false,
            },
        }
    }
}

impl Default for ActuatorCommand {
    fn default() -> Self {
        Self::OFF
    }
}
