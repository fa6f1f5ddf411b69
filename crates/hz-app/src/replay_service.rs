//! Replay of recorded sensor traces through the plant runtime.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use hz_controls::OperationMode;
use hz_core::minutes;
use hz_project::schema::Project;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::plant::{PlantRuntime, TickReport};
use crate::runtime_compile::compile_project;

/// A recorded sequence of sensor snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    /// Wall-clock time of the first step; aligns PWM cycles.
    pub start: DateTime<Utc>,
    pub steps: Vec<TraceStep>,
}

/// One tick's worth of inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceStep {
    /// Minutes since the previous step.
    #[serde(default = "default_dt_min")]
    pub dt_min: f64,
    #[serde(default)]
    pub outside: Option<f64>,
    #[serde(default)]
    pub forecast: Option<f64>,
    /// Forecast irradiance in W/m².
    #[serde(default)]
    pub solar: Option<f64>,
    /// Switch the plant's operation mode before this step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_mode: Option<OperationMode>,
    /// Samples keyed by zone id; zones left out read as unavailable.
    #[serde(default)]
    pub zones: BTreeMap<String, ZoneSample>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ZoneSample {
    #[serde(default)]
    pub current: Option<f64>,
    #[serde(default)]
    pub target: Option<f64>,
}

/// Longest gap a single trace step may cover.
const MAX_STEP_MINUTES: f64 = 24.0 * 60.0;

fn default_dt_min() -> f64 {
    5.0
}

/// One replayed tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayTick {
    pub step: usize,
    pub time: DateTime<Utc>,
    #[serde(flatten)]
    pub report: TickReport,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayReport {
    pub project: String,
    pub ticks: Vec<ReplayTick>,
}

impl ReplayReport {
    /// Flow temperatures per tick, `None` where the plant was idle.
    pub fn flow_series(&self) -> Vec<Option<f64>> {
        self.ticks.iter().map(|t| t.report.flow_temp()).collect()
    }
}

/// Load a trace, picking JSON or YAML from the file extension.
pub fn load_trace(path: &Path) -> AppResult<Trace> {
    let content = std::fs::read_to_string(path).map_err(|e| AppError::TraceFileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let trace: Trace = if is_json {
        serde_json::from_str(&content)
            .map_err(|e| AppError::Trace(format!("Failed to parse trace JSON: {}", e)))?
    } else {
        serde_yaml::from_str(&content)
            .map_err(|e| AppError::Trace(format!("Failed to parse trace YAML: {}", e)))?
    };

    Ok(trace)
}

/// Run every trace step through a fresh runtime built from `project`.
pub fn replay(project: &Project, trace: &Trace) -> AppResult<ReplayReport> {
    let compiled = compile_project(project)?;
    let mut runtime = PlantRuntime::new(compiled, trace.start.timestamp());
    warn_unmapped_weather(&runtime, trace);

    let mut time = trace.start;
    let mut ticks = Vec::with_capacity(trace.steps.len());
    for (step, input) in trace.steps.iter().enumerate() {
        if !(0.0..=MAX_STEP_MINUTES).contains(&input.dt_min) {
            return Err(AppError::Trace(format!(
                "Step {} has invalid dt_min {} (expected 0 to {})",
                step, input.dt_min, MAX_STEP_MINUTES
            )));
        }
        if let Some(mode) = input.operation_mode {
            runtime.set_operation_mode(mode);
        }

        let readings = step_readings(&runtime, step, input)?;
        let step_length = Duration::milliseconds((input.dt_min * 60_000.0).round() as i64);
        time = time.checked_add_signed(step_length).ok_or_else(|| {
            AppError::Trace(format!("Step {} runs past the end of the calendar", step))
        })?;
        let report = runtime.tick(&readings, minutes(input.dt_min));
        ticks.push(ReplayTick { step, time, report });
    }

    info!(
        project = %project.name,
        steps = ticks.len(),
        "trace replayed"
    );

    Ok(ReplayReport {
        project: project.name.clone(),
        ticks,
    })
}

fn step_readings(
    runtime: &PlantRuntime,
    step: usize,
    input: &TraceStep,
) -> AppResult<HashMap<String, f64>> {
    let mut readings = HashMap::new();

    for (zone_id, sample) in &input.zones {
        let zone = runtime.zone(zone_id).ok_or_else(|| {
            AppError::Trace(format!("Step {} references unknown zone '{}'", step, zone_id))
        })?;
        let config = zone.config();
        if let Some(current) = sample.current {
            readings.insert(config.temp_sensor.clone(), current);
        }
        if let Some(target) = sample.target {
            readings.insert(config.target_source.clone(), target);
        }
    }

    let sources = &runtime.settings().weather;
    for (source, value) in [
        (&sources.outside_temp, input.outside),
        (&sources.forecast_temp, input.forecast),
        (&sources.solar_forecast, input.solar),
    ] {
        if let (Some(source), Some(value)) = (source, value) {
            readings.insert(source.clone(), value);
        }
    }

    Ok(readings)
}

fn warn_unmapped_weather(runtime: &PlantRuntime, trace: &Trace) {
    let sources = &runtime.settings().weather;
    let any_step = |has: fn(&TraceStep) -> bool| trace.steps.iter().any(has);
    let checks = [
        ("outside", sources.outside_temp.is_none(), any_step(|s| s.outside.is_some())),
        ("forecast", sources.forecast_temp.is_none(), any_step(|s| s.forecast.is_some())),
        ("solar", sources.solar_forecast.is_none(), any_step(|s| s.solar.is_some())),
    ];
    for (what, unmapped, present) in checks {
        if unmapped && present {
            warn!(what, "trace carries a weather input the project has no sensor for, ignoring it");
        }
    }
}
