//! Plant-wide demand: aggregation of zone demands and operation mode selection.

use std::fmt;

use hz_core::ZoneId;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::mode::{Demand, HvacMode};

/// One zone's contribution to aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneDemand {
    pub zone: ZoneId,
    pub demand: Demand,
    pub target: Option<f64>,
}

/// A zone demanding in the plant's direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DemandingZone {
    pub zone: ZoneId,
    pub target: Option<f64>,
}

/// Plant direction and the zones asking for it, recomputed every tick.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlantStatus {
    pub direction: Demand,
    pub zones: Vec<DemandingZone>,
}

impl PlantStatus {
    /// Targets of demanding zones that have one.
    pub fn active_targets(&self) -> impl Iterator<Item = f64> + '_ {
        self.zones.iter().filter_map(|z| z.target)
    }

    pub fn is_demanding(&self, zone: ZoneId) -> bool {
        self.zones.iter().any(|z| z.zone == zone)
    }
}

/// Folds zone demands into one plant direction.
///
/// Heat wins over cool, cool wins over idle. Only zones demanding the
/// winning direction are listed.
pub struct DemandAggregator;

impl DemandAggregator {
    pub fn aggregate<I>(zone_demands: I) -> PlantStatus
    where
        I: IntoIterator<Item = ZoneDemand>,
    {
        let demands: Vec<ZoneDemand> = zone_demands.into_iter().collect();

        #[cfg(debug_assertions)]
        {
            let mut seen: Vec<ZoneId> = demands.iter().map(|d| d.zone).collect();
            seen.sort_unstable();
            let before = seen.len();
            seen.dedup();
            assert_eq!(before, seen.len(), "zone reported more than one demand in a tick");
        }

        let direction = if demands.iter().any(|d| d.demand == Demand::Heat) {
            Demand::Heat
        } else if demands.iter().any(|d| d.demand == Demand::Cool) {
            Demand::Cool
        } else {
            Demand::Idle
        };

        let zones = if direction.is_idle() {
            Vec::new()
        } else {
            demands
                .iter()
                .filter(|d| d.demand == direction)
                .map(|d| DemandingZone {
                    zone: d.zone,
                    target: d.target,
                })
                .collect()
        };

        PlantStatus { direction, zones }
    }
}

/// Plant operation mode chosen by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationMode {
    /// Pick heating or cooling from the zones' deviation.
    #[default]
    Auto,
    Heat,
    Cool,
    /// Everything idle, valves closed, no flow output.
    Off,
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OperationMode::Auto => "auto",
            OperationMode::Heat => "heat",
            OperationMode::Cool => "cool",
            OperationMode::Off => "off",
        })
    }
}

/// Chooses heating or cooling in auto mode from the average zone deviation.
///
/// Average `current - target` above `+deadband` selects cooling, below
/// `-deadband` heating; in between the previous choice holds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutoModeSelector {
    last: HvacMode,
    deadband: f64,
}

impl AutoModeSelector {
    pub const DEFAULT_DEADBAND: f64 = 0.2;

    pub fn new(deadband: f64) -> Self {
        Self {
            last: HvacMode::Heating,
            deadband: deadband.abs(),
        }
    }

    pub fn last(&self) -> HvacMode {
        self.last
    }

    /// Change the deadband, keeping the remembered mode.
    pub fn set_deadband(&mut self, deadband: f64) {
        self.deadband = deadband.abs();
    }

    /// Effective mode for this tick, `None` when the plant is off.
    ///
    /// `readings` yields `(current, target)` per zone with both available.
    pub fn effective_mode<I>(&mut self, operation: OperationMode, readings: I) -> Option<HvacMode>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        match operation {
            OperationMode::Off => None,
            OperationMode::Heat => Some(HvacMode::Heating),
            OperationMode::Cool => Some(HvacMode::Cooling),
            OperationMode::Auto => {
                let (sum, count) = readings
                    .into_iter()
                    .filter(|(c, t)| c.is_finite() && t.is_finite())
                    .fold((0.0, 0usize), |(sum, n), (c, t)| (sum + (c - t), n + 1));
                if count > 0 {
                    let avg = sum / count as f64;
                    let next = if avg > self.deadband {
                        HvacMode::Cooling
                    } else if avg < -self.deadband {
                        HvacMode::Heating
                    } else {
                        self.last
                    };
                    if next != self.last {
                        debug!(
                            from = %self.last,
                            to = %next,
                            avg_deviation = avg,
                            "auto mode changed"
                        );
                    }
                    self.last = next;
                }
                Some(self.last)
            }
        }
    }
}

impl Default for AutoModeSelector {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DEADBAND)
    }
}
