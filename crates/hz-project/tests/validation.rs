use hz_project::schema::*;
use hz_project::{ProjectError, ValidationError, from_yaml_str, validate_project};

const BASE: &str = r#"
version: 1
name: Validation
zones:
  - id: a
    name: A
    circuits: [switch.a]
    temp_sensor: sensor.a
    target_source: number.a
  - id: b
    name: B
    circuits: [switch.b]
    temp_sensor: sensor.b
    target_source: number.b
"#;

fn base() -> Project {
    from_yaml_str(BASE).unwrap()
}

#[test]
fn base_project_is_valid() {
    validate_project(&base()).unwrap();
}

#[test]
fn duplicate_zone_id_rejected() {
    let mut project = base();
    project.zones[1].id = "a".to_string();
    assert!(matches!(
        validate_project(&project),
        Err(ValidationError::DuplicateId { .. })
    ));
}

#[test]
fn shared_circuit_rejected() {
    let mut project = base();
    project.zones[1].circuits = vec!["switch.a".to_string()];
    assert!(matches!(
        validate_project(&project),
        Err(ValidationError::DuplicateId { .. })
    ));
}

#[test]
fn zone_without_circuits_rejected() {
    let mut project = base();
    project.zones[0].circuits.clear();
    assert!(matches!(
        validate_project(&project),
        Err(ValidationError::MissingReference { .. })
    ));
}

#[test]
fn pwm_ranges_enforced() {
    let mut project = base();
    project.zones[0].control = ControlDef::Pwm {
        cycle_time_min: 40.0,
        min_on_time_min: 3.0,
        min_off_time_min: 3.0,
        kp: 30.0,
        ki: 2.0,
        actuator_delay_min: 0.0,
    };
    let err = validate_project(&project).unwrap_err();
    assert!(err.to_string().contains("cycle_time_min"), "{err}");

    project.zones[0].control = ControlDef::Pwm {
        cycle_time_min: 15.0,
        min_on_time_min: 0.5,
        min_off_time_min: 3.0,
        kp: 30.0,
        ki: 2.0,
        actuator_delay_min: 0.0,
    };
    assert!(validate_project(&project).is_err());
}

#[test]
fn hysteresis_and_weights_enforced() {
    let mut project = base();
    project.zones[0].hysteresis = 6.0;
    assert!(validate_project(&project).is_err());

    let mut project = base();
    project.zones[0].flow_weight = -0.5;
    assert!(validate_project(&project).is_err());

    let mut project = base();
    project.zones[0].solar_weight = f64::NAN;
    assert!(validate_project(&project).is_err());
}

#[test]
fn inverted_flow_band_rejected() {
    let mut project = base();
    project.plant.cooling_flow = FlowBandDef { min: 25.0, max: 15.0 };
    let err = validate_project(&project).unwrap_err();
    assert!(err.to_string().contains("cooling_flow"), "{err}");
}

#[test]
fn supervisor_ranges_enforced() {
    let mut project = base();
    project.plant.supervisor.error_norm_max = 0.0;
    assert!(validate_project(&project).is_err());
}

#[test]
fn groups_in_current_version_unsupported() {
    let mut project = base();
    project.zones[0].groups = vec!["switch.x".to_string()];
    assert!(matches!(
        validate_project(&project),
        Err(ValidationError::Unsupported { .. })
    ));
}

#[test]
fn future_version_rejected() {
    let yaml = BASE.replace("version: 1", "version: 9");
    assert!(matches!(
        from_yaml_str(&yaml),
        Err(ProjectError::Validation(ValidationError::UnsupportedVersion { version: 9 }))
    ));
}
