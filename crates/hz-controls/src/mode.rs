//! Demand directions and operating modes shared by every controller.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Direction a zone (or the whole plant) is asking for.
///
/// A single enum makes "heat and cool at once" unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Demand {
    Heat,
    Cool,
    #[default]
    Idle,
}

impl Demand {
    pub fn as_str(self) -> &'static str {
        match self {
            Demand::Heat => "heat",
            Demand::Cool => "cool",
            Demand::Idle => "idle",
        }
    }

    pub fn is_idle(self) -> bool {
        self == Demand::Idle
    }

    /// Mode that serves this demand, `None` when idle.
    pub fn hvac_mode(self) -> Option<HvacMode> {
        match self {
            Demand::Heat => Some(HvacMode::Heating),
            Demand::Cool => Some(HvacMode::Cooling),
            Demand::Idle => None,
        }
    }
}

impl fmt::Display for Demand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effective mode a zone is controlled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HvacMode {
    Heating,
    Cooling,
}

impl HvacMode {
    /// Demand emitted by an active zone in this mode.
    pub fn demand(self) -> Demand {
        match self {
            HvacMode::Heating => Demand::Heat,
            HvacMode::Cooling => Demand::Cool,
        }
    }

    /// Control error, positive when the zone needs the plant.
    pub fn error(self, target: f64, current: f64) -> f64 {
        match self {
            HvacMode::Heating => target - current,
            HvacMode::Cooling => current - target,
        }
    }

    /// +1 when more demand means warmer water, -1 when it means colder.
    pub fn sign(self) -> f64 {
        match self {
            HvacMode::Heating => 1.0,
            HvacMode::Cooling => -1.0,
        }
    }
}

impl fmt::Display for HvacMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HvacMode::Heating => "heating",
            HvacMode::Cooling => "cooling",
        })
    }
}

/// How quickly a zone's emitters respond to flow temperature changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Responsiveness {
    #[default]
    Slow,
    Fast,
}
