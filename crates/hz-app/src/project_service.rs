//! Project loading, saving, validation, and introspection.

use std::path::Path;

use hz_project::schema::{ControlDef, Project, ResponsivenessDef, ZoneDef};

use crate::error::{AppError, AppResult};

/// Summary of a zone for listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneSummary {
    pub id: String,
    pub name: String,
    pub control: &'static str,
    pub responsiveness: &'static str,
    pub circuit_count: usize,
    pub enabled: bool,
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Load a project, picking JSON or YAML from the file extension.
///
/// The file is migrated to the latest schema version and validated.
pub fn load_project(path: &Path) -> AppResult<Project> {
    let loaded = if is_json(path) {
        hz_project::load_json(path)
    } else {
        hz_project::load_yaml(path)
    };
    loaded.map_err(|e| match e {
        hz_project::ProjectError::Io(source) => AppError::ProjectFileRead {
            path: path.to_path_buf(),
            source,
        },
        other => other.into(),
    })
}

/// Save a project, picking JSON or YAML from the file extension.
pub fn save_project(path: &Path, project: &Project) -> AppResult<()> {
    if is_json(path) {
        hz_project::save_json(path, project)?;
    } else {
        hz_project::save_yaml(path, project)?;
    }
    Ok(())
}

/// Checks beyond schema validation that a runnable plant needs.
pub fn validate_project(project: &Project) -> AppResult<()> {
    hz_project::validate_project(project).map_err(|e| AppError::Validation(e.to_string()))?;

    if project.zones.is_empty() {
        return Err(AppError::Validation("Project must have at least one zone".to_string()));
    }

    if !project.zones.iter().any(|z| z.enabled) {
        tracing::warn!(project = %project.name, "every zone is disabled, the plant will stay idle");
    }

    Ok(())
}

/// List all zones in the project with summaries.
pub fn list_zones(project: &Project) -> Vec<ZoneSummary> {
    project.zones.iter().map(summarize).collect()
}

/// Get a specific zone by ID.
pub fn get_zone<'a>(project: &'a Project, zone_id: &str) -> AppResult<&'a ZoneDef> {
    project
        .zones
        .iter()
        .find(|z| z.id == zone_id)
        .ok_or_else(|| AppError::ZoneNotFound(zone_id.to_string()))
}

fn summarize(zone: &ZoneDef) -> ZoneSummary {
    ZoneSummary {
        id: zone.id.clone(),
        name: zone.name.clone(),
        control: match zone.control {
            ControlDef::BangBang => "bang_bang",
            ControlDef::Pwm { .. } => "pwm",
        },
        responsiveness: match zone.responsiveness {
            ResponsivenessDef::Slow => "slow",
            ResponsivenessDef::Fast => "fast",
        },
        circuit_count: zone.circuits.len(),
        enabled: zone.enabled,
    }
}
