//! Plant runtime: the zone arena and one tick of the whole control loop.
//!
//! Within a tick every zone is updated first. Aggregation and the flow
//! calculation only run afterwards, on the finished zone results.

use std::collections::HashMap;

use hz_controls::{
    ActuatorCommand, AutoModeSelector, ControlStrategy, Demand, DemandAggregator, FlowMode,
    FlowOutput, FlowSupervisor, HvacMode, OperationMode, PlantStatus, ReadingProvider,
    SimpleFlowParams, WeatherInputs, ZoneController, ZoneDemand, ZoneFlowInput, ZoneState,
    ZoneWarning, compute_simple, staggered_elapsed_minutes,
};
use hz_core::{Time, ZoneId};
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::error::{AppError, AppResult};
use crate::runtime_compile::{CompiledProject, CompiledZone, PlantSettings};

/// One registered zone and the controller that owns its state.
#[derive(Debug, Clone)]
struct ZoneSlot {
    id: String,
    circuits: Vec<String>,
    enabled: bool,
    controller: ZoneController,
}

impl ZoneSlot {
    fn register(zone: CompiledZone, timestamp_s: i64, index: usize, count: usize) -> Self {
        let state = match &zone.config.strategy {
            ControlStrategy::Pwm { pwm, .. } => ZoneState::staggered(staggered_elapsed_minutes(
                timestamp_s,
                pwm.cycle_minutes,
                index,
                count,
            )),
            ControlStrategy::BangBang => ZoneState::default(),
        };
        Self {
            id: zone.id,
            circuits: zone.circuits,
            enabled: zone.enabled,
            controller: ZoneController::with_state(zone.config, state),
        }
    }
}

/// Per-zone outcome of a tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneReport {
    pub id: String,
    pub zone: ZoneId,
    pub enabled: bool,
    pub current: Option<f64>,
    pub target: Option<f64>,
    pub demand: Demand,
    pub command: ActuatorCommand,
    pub circuits: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<ZoneWarning>,
}

/// Everything one tick decided.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickReport {
    /// `None` when the plant is off.
    pub effective_mode: Option<HvacMode>,
    pub direction: Demand,
    pub zones: Vec<ZoneReport>,
    /// `None` when the plant is idle; nothing should be written then.
    pub flow: Option<FlowOutput>,
}

impl TickReport {
    pub fn flow_temp(&self) -> Option<f64> {
        self.flow.as_ref().map(|f| f.flow_temp)
    }

    pub fn zone(&self, id: &str) -> Option<&ZoneReport> {
        self.zones.iter().find(|z| z.id == id)
    }
}

/// The running plant: zones, auto mode memory and the flow supervisor.
#[derive(Debug, Clone)]
pub struct PlantRuntime {
    name: String,
    settings: PlantSettings,
    slots: Vec<ZoneSlot>,
    index: HashMap<String, ZoneId>,
    selector: AutoModeSelector,
    supervisor: FlowSupervisor,
    curve_offset_override: Option<f64>,
}

impl PlantRuntime {
    /// Register every compiled zone.
    ///
    /// PWM zones start with cycles aligned to `start_timestamp_s` (Unix
    /// seconds) and staggered by their position in the project.
    pub fn new(compiled: CompiledProject, start_timestamp_s: i64) -> Self {
        let count = compiled.zones.len();
        let slots: Vec<ZoneSlot> = compiled
            .zones
            .into_iter()
            .enumerate()
            .map(|(i, zone)| ZoneSlot::register(zone, start_timestamp_s, i, count))
            .collect();

        Self {
            name: compiled.name,
            index: index_of(&slots),
            selector: AutoModeSelector::new(compiled.plant.auto_mode_deadband),
            supervisor: FlowSupervisor::new(compiled.plant.supervisor),
            settings: compiled.plant,
            slots,
            curve_offset_override: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> &PlantSettings {
        &self.settings
    }

    pub fn supervisor(&self) -> &FlowSupervisor {
        &self.supervisor
    }

    pub fn zone_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.slots.iter().map(|s| s.id.as_str())
    }

    pub fn zone(&self, id: &str) -> Option<&ZoneController> {
        self.slot(id).map(|s| &s.controller)
    }

    fn slot(&self, id: &str) -> Option<&ZoneSlot> {
        self.index.get(id).map(|zid| &self.slots[zid.slot()])
    }

    pub fn operation_mode(&self) -> OperationMode {
        self.settings.operation_mode
    }

    pub fn set_operation_mode(&mut self, mode: OperationMode) {
        if mode != self.settings.operation_mode {
            debug!(from = %self.settings.operation_mode, to = %mode, "operation mode changed");
            self.settings.operation_mode = mode;
        }
    }

    pub fn flow_mode(&self) -> FlowMode {
        self.settings.flow_mode
    }

    /// Switch between simple and supervised flow; the supervisor starts over.
    pub fn set_flow_mode(&mut self, mode: FlowMode) {
        if mode != self.settings.flow_mode {
            debug!(?mode, "flow mode changed, resetting supervisor");
            self.settings.flow_mode = mode;
            self.supervisor.reset();
        }
    }

    /// Curve offset in effect, the override if one is set.
    pub fn curve_offset(&self) -> f64 {
        self.curve_offset_override
            .unwrap_or(self.settings.flow_params.curve_offset)
    }

    pub fn set_curve_offset(&mut self, offset: f64) -> AppResult<()> {
        if !offset.is_finite() || !(-10.0..=10.0).contains(&offset) {
            return Err(AppError::InvalidInput(format!(
                "flow curve offset {offset} outside [-10, 10]"
            )));
        }
        self.curve_offset_override = Some(offset);
        Ok(())
    }

    /// Drop the override and go back to the configured curve offset.
    pub fn reset_curve_offset(&mut self) {
        self.curve_offset_override = None;
    }

    /// Enable or disable a zone. A disabled zone is held idle with closed
    /// actuators; its PI and PWM state are kept for when it comes back.
    pub fn set_zone_enabled(&mut self, id: &str, enabled: bool) -> AppResult<()> {
        let zid = *self
            .index
            .get(id)
            .ok_or_else(|| AppError::ZoneNotFound(id.to_string()))?;
        let slot = &mut self.slots[zid.slot()];
        if slot.enabled != enabled {
            debug!(zone = %id, enabled, "zone enable changed");
            slot.enabled = enabled;
        }
        Ok(())
    }

    /// Apply a reloaded configuration.
    ///
    /// Zones that survive keep their readings and demand but have PWM phase
    /// and PI integral re-baselined. New zones are registered staggered at
    /// `timestamp_s`, removed ones are dropped and the supervisor starts
    /// over. A runtime curve offset override survives the reload.
    pub fn reload(&mut self, compiled: CompiledProject, timestamp_s: i64) {
        let mut previous: HashMap<String, ZoneSlot> =
            self.slots.drain(..).map(|slot| (slot.id.clone(), slot)).collect();

        let count = compiled.zones.len();
        let mut slots = Vec::with_capacity(count);
        for (i, zone) in compiled.zones.into_iter().enumerate() {
            let slot = match previous.remove(&zone.id) {
                Some(mut slot) => {
                    slot.controller.reconfigure(zone.config);
                    slot.circuits = zone.circuits;
                    slot.enabled = zone.enabled;
                    slot
                }
                None => {
                    debug!(zone = %zone.id, "zone added on reload");
                    ZoneSlot::register(zone, timestamp_s, i, count)
                }
            };
            slots.push(slot);
        }
        for id in previous.keys() {
            debug!(zone = %id, "zone removed on reload");
        }

        self.slots = slots;
        self.index = index_of(&self.slots);
        self.name = compiled.name;
        self.selector.set_deadband(compiled.plant.auto_mode_deadband);
        self.supervisor.reconfigure(compiled.plant.supervisor);
        self.settings = compiled.plant;
    }

    /// Run one control tick.
    ///
    /// # Arguments
    ///
    /// * `readings` - Current sensor values keyed by reference
    /// * `dt` - Time since the previous tick
    pub fn tick<R: ReadingProvider + ?Sized>(&mut self, readings: &R, dt: Time) -> TickReport {
        let samples: Vec<(Option<f64>, Option<f64>)> = self
            .slots
            .iter()
            .map(|slot| {
                let config = slot.controller.config();
                (
                    readings.reading(&config.temp_sensor),
                    readings.reading(&config.target_source),
                )
            })
            .collect();

        let effective_mode = self.selector.effective_mode(
            self.settings.operation_mode,
            self.slots
                .iter()
                .zip(&samples)
                .filter(|(slot, _)| slot.enabled)
                .filter_map(|(_, &(current, target))| Some((current?, target?))),
        );

        let mut zones = Vec::with_capacity(self.slots.len());
        for (i, (slot, (current, target))) in self.slots.iter_mut().zip(samples).enumerate() {
            let update = match effective_mode {
                Some(mode) if slot.enabled => slot.controller.update(current, target, mode, dt),
                _ => slot.controller.hold_off(),
            };
            zones.push(ZoneReport {
                id: slot.id.clone(),
                zone: ZoneId::from_index(i as u32),
                enabled: slot.enabled,
                current,
                target,
                demand: update.demand,
                command: update.command,
                circuits: slot.circuits.clone(),
                warning: update.warning,
            });
        }

        let status = DemandAggregator::aggregate(zones.iter().map(|z| ZoneDemand {
            zone: z.zone,
            demand: z.demand,
            target: self.slots[z.zone.slot()].controller.state().last_target,
        }));

        let weather = self.weather(readings);
        let flow = self.compute_flow(&status, &weather, dt);
        if let Some(flow) = &flow {
            trace!(
                direction = status.direction.as_str(),
                flow_temp = flow.flow_temp,
                unclamped = flow.breakdown.unclamped,
                "flow computed"
            );
        }

        TickReport {
            effective_mode,
            direction: status.direction,
            zones,
            flow,
        }
    }

    fn weather<R: ReadingProvider + ?Sized>(&self, readings: &R) -> WeatherInputs {
        let read = |source: &Option<String>, what: &str| {
            let source = source.as_deref()?;
            let value = readings.reading(source);
            if value.is_none() {
                warn!(sensor = %source, what, "weather input unavailable, contributing nothing");
            }
            value
        };
        let sources = &self.settings.weather;
        WeatherInputs {
            outside_temp: read(&sources.outside_temp, "outside"),
            forecast_temp: read(&sources.forecast_temp, "forecast"),
            solar_forecast: read(&sources.solar_forecast, "solar"),
        }
    }

    fn flow_params(&self) -> SimpleFlowParams {
        SimpleFlowParams {
            curve_offset: self.curve_offset(),
            ..self.settings.flow_params
        }
    }

    fn compute_flow(
        &mut self,
        status: &PlantStatus,
        weather: &WeatherInputs,
        dt: Time,
    ) -> Option<FlowOutput> {
        let params = self.flow_params();
        match self.settings.flow_mode {
            FlowMode::Simple => compute_simple(
                status.active_targets(),
                status.direction,
                weather.outside_temp,
                &params,
            ),
            FlowMode::Advanced => {
                let mode = status.direction.hvac_mode()?;
                let inputs: Vec<ZoneFlowInput> = status
                    .zones
                    .iter()
                    .filter_map(|demanding| {
                        let controller = &self.slots[demanding.zone.slot()].controller;
                        let config = controller.config();
                        let state = controller.state();
                        let target = demanding.target?;
                        let current = state.last_current?;
                        let is_pwm = matches!(config.strategy, ControlStrategy::Pwm { .. });
                        Some(ZoneFlowInput {
                            zone: demanding.zone,
                            target,
                            error: mode.error(target, current),
                            duty: is_pwm.then_some(state.duty),
                            weight: config.flow_weight,
                            responsiveness: config.responsiveness,
                            solar_weight: config.solar_weight,
                        })
                    })
                    .collect();
                self.supervisor.compute(&inputs, status.direction, weather, &params, dt)
            }
        }
    }
}

fn index_of(slots: &[ZoneSlot]) -> HashMap<String, ZoneId> {
    slots
        .iter()
        .enumerate()
        .map(|(i, slot)| (slot.id.clone(), ZoneId::from_index(i as u32)))
        .collect()
}
