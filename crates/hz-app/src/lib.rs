//! Application service layer for hydrozone.
//!
//! Loads and validates projects, compiles them into control engine types,
//! runs the plant tick by tick and replays recorded sensor traces. The CLI
//! is a thin shell over this crate.

pub mod error;
pub mod plant;
pub mod project_service;
pub mod replay_service;
pub mod runtime_compile;

pub use error::{AppError, AppResult};
pub use plant::{PlantRuntime, TickReport, ZoneReport};
pub use project_service::{
    ZoneSummary, get_zone, list_zones, load_project, save_project, validate_project,
};
pub use replay_service::{
    ReplayReport, ReplayTick, Trace, TraceStep, ZoneSample, load_trace, replay,
};
pub use runtime_compile::{
    CompiledProject, CompiledZone, PlantSettings, WeatherSources, compile_plant, compile_project,
    compile_zone,
};
