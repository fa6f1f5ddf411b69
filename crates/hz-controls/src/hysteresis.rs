//! Bang-bang switching with a symmetric hysteresis band around the target.

use serde::{Deserialize, Serialize};

use crate::error::{ControlResult, check_range};
use crate::mode::HvacMode;

/// Latched switch position of a bang-bang zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchState {
    #[default]
    Off,
    On,
}

impl SwitchState {
    pub fn is_on(self) -> bool {
        self == SwitchState::On
    }
}

/// Two-threshold switch.
///
/// Heating turns on at or below `target - band/2` and off at or above
/// `target + band/2`; cooling mirrors this. Inside the band the previous
/// state is kept.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hysteresis {
    /// Full band width in °C.
    pub band: f64,
}

impl Hysteresis {
    pub const DEFAULT_BAND: f64 = 0.3;

    pub fn new(band: f64) -> ControlResult<Self> {
        Ok(Self {
            band: check_range("hysteresis", band, 0.0, 5.0)?,
        })
    }

    /// Next switch position for one reading.
    pub fn next(
        &self,
        state: SwitchState,
        current: f64,
        target: f64,
        mode: HvacMode,
    ) -> SwitchState {
        let half = self.band / 2.0;
        let (on, off) = match mode {
            HvacMode::Heating => (current <= target - half, current >= target + half),
            HvacMode::Cooling => (current >= target + half, current <= target - half),
        };
        if on {
            SwitchState::On
        } else if off {
            SwitchState::Off
        } else {
            state
        }
    }
}

impl Default for Hysteresis {
    fn default() -> Self {
        Self {
            band: Self::DEFAULT_BAND,
        }
    }
}
