//! Schema migration framework.

use crate::ProjectError;
use crate::schema::Project;

pub const LATEST_VERSION: u32 = 1;

pub fn migrate_to_latest(mut project: Project) -> Result<Project, ProjectError> {
    while project.version < LATEST_VERSION {
        project = migrate_one_version(project)?;
    }
    Ok(project)
}

fn migrate_one_version(project: Project) -> Result<Project, ProjectError> {
    match project.version {
        0 => migrate_v0_to_v1(project),
        v => Err(ProjectError::Migration {
            what: format!("No migration path from version {}", v),
        }),
    }
}

/// Version 0 listed a zone's circuits under `groups`.
fn migrate_v0_to_v1(mut project: Project) -> Result<Project, ProjectError> {
    for zone in &mut project.zones {
        let legacy = std::mem::take(&mut zone.groups);
        for circuit in legacy {
            if !zone.circuits.contains(&circuit) {
                zone.circuits.push(circuit);
            }
        }
    }

    project.version = 1;
    Ok(project)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{PlantDef, ZoneDef};

    fn zone(circuits: &[&str], groups: &[&str]) -> ZoneDef {
        ZoneDef {
            id: "z1".to_string(),
            name: "Zone".to_string(),
            circuits: circuits.iter().map(|s| s.to_string()).collect(),
            groups: groups.iter().map(|s| s.to_string()).collect(),
            temp_sensor: "sensor.z1".to_string(),
            target_source: "number.z1".to_string(),
            hysteresis: 0.3,
            control: Default::default(),
            responsiveness: Default::default(),
            flow_weight: 1.0,
            solar_weight: 1.0,
            enabled: true,
        }
    }

    #[test]
    fn migrate_latest_is_noop() {
        let project = Project {
            version: LATEST_VERSION,
            name: "test".to_string(),
            plant: PlantDef::default(),
            zones: vec![zone(&["switch.a"], &[])],
        };

        let migrated = migrate_to_latest(project.clone()).unwrap();
        assert_eq!(migrated, project);
    }

    #[test]
    fn migrate_groups_into_circuits() {
        let project = Project {
            version: 0,
            name: "legacy".to_string(),
            plant: PlantDef::default(),
            zones: vec![zone(&["switch.a"], &["switch.a", "switch.b"]), zone(&[], &["switch.c"])],
        };

        let migrated = migrate_to_latest(project).unwrap();
        assert_eq!(migrated.version, LATEST_VERSION);
        assert_eq!(migrated.zones[0].circuits, vec!["switch.a", "switch.b"]);
        assert_eq!(migrated.zones[1].circuits, vec!["switch.c"]);
        assert!(migrated.zones.iter().all(|z| z.groups.is_empty()));
    }
}
