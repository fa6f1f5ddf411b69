//! Project validation logic.

use crate::schema::{ControlDef, FlowBandDef, PlantDef, Project, SupervisorDef, ZoneDef};
use std::collections::HashSet;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported feature: {feature} - {reason}")]
    Unsupported { feature: String, reason: String },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_project(project: &Project) -> Result<(), ValidationError> {
    if project.version > crate::migrate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }

    validate_plant(&project.plant)?;

    let mut zone_ids = HashSet::new();
    let mut circuits = HashSet::new();
    for zone in &project.zones {
        if !zone_ids.insert(&zone.id) {
            return Err(ValidationError::DuplicateId {
                id: zone.id.clone(),
                context: "zones".to_string(),
            });
        }
        validate_zone(zone)?;
        for circuit in &zone.circuits {
            if !circuits.insert(circuit) {
                return Err(ValidationError::DuplicateId {
                    id: circuit.clone(),
                    context: format!("zone '{}' circuits (already used by another zone)", zone.id),
                });
            }
        }
    }

    Ok(())
}

fn validate_plant(plant: &PlantDef) -> Result<(), ValidationError> {
    let ctx = "plant";
    validate_range("heating_base_offset", plant.heating_base_offset, -10.0, 20.0, ctx)?;
    validate_range("cooling_base_offset", plant.cooling_base_offset, -10.0, 20.0, ctx)?;
    validate_range("weather_slope", plant.weather_slope, 0.0, 5.0, ctx)?;
    validate_range("flow_curve_offset", plant.flow_curve_offset, -10.0, 10.0, ctx)?;
    validate_range("auto_mode_deadband", plant.auto_mode_deadband, 0.0, 5.0, ctx)?;
    validate_band("heating_flow", &plant.heating_flow)?;
    validate_band("cooling_flow", &plant.cooling_flow)?;
    validate_supervisor(&plant.supervisor)?;

    for (field, sensor) in [
        ("outside_temp_sensor", &plant.outside_temp_sensor),
        ("forecast_temp_sensor", &plant.forecast_temp_sensor),
        ("solar_forecast_sensor", &plant.solar_forecast_sensor),
    ] {
        if let Some(sensor) = sensor
            && sensor.trim().is_empty()
        {
            return Err(ValidationError::InvalidValue {
                field: format!("plant {}", field),
                value: sensor.clone(),
                reason: "must not be empty when given".to_string(),
            });
        }
    }

    Ok(())
}

fn validate_band(field: &str, band: &FlowBandDef) -> Result<(), ValidationError> {
    validate_range("min", band.min, 0.0, 80.0, field)?;
    validate_range("max", band.max, 0.0, 80.0, field)?;
    if band.min >= band.max {
        return Err(ValidationError::InvalidValue {
            field: format!("plant {}", field),
            value: format!("{}..{}", band.min, band.max),
            reason: "min must be below max".to_string(),
        });
    }
    Ok(())
}

fn validate_supervisor(sup: &SupervisorDef) -> Result<(), ValidationError> {
    let ctx = "plant supervisor";
    validate_range("error_norm_max", sup.error_norm_max, 0.1, 10.0, ctx)?;
    validate_range("duty_ema_minutes", sup.duty_ema_minutes, 1.0, 240.0, ctx)?;
    validate_range("fast_ema_minutes", sup.fast_ema_minutes, 1.0, 240.0, ctx)?;
    validate_range("error_weight", sup.error_weight, 0.0, 1.0, ctx)?;
    validate_range("duty_weight", sup.duty_weight, 0.0, 1.0, ctx)?;
    validate_range("slow_mix_weight", sup.slow_mix_weight, 0.0, 1.0, ctx)?;
    validate_range("fast_mix_weight", sup.fast_mix_weight, 0.0, 1.0, ctx)?;
    validate_range("kp", sup.kp, 0.0, 10.0, ctx)?;
    validate_range("ti_minutes", sup.ti_minutes, 1.0, 1440.0, ctx)?;
    validate_range("i_max", sup.i_max, 0.0, 10.0, ctx)?;
    validate_range("fast_error_deadband_c", sup.fast_error_deadband_c, 0.0, 5.0, ctx)?;
    validate_range("fast_boost_gain", sup.fast_boost_gain, 0.0, 10.0, ctx)?;
    validate_range("fast_boost_cap_c", sup.fast_boost_cap_c, 0.0, 10.0, ctx)?;
    validate_range("preheat_gain", sup.preheat_gain, 0.0, 5.0, ctx)?;
    validate_range("preheat_solar_gain_per_w_m2", sup.preheat_solar_gain_per_w_m2, -1.0, 1.0, ctx)?;
    validate_range("preheat_cap_c", sup.preheat_cap_c, 0.0, 10.0, ctx)?;
    validate_range("preheat_min_slow_di", sup.preheat_min_slow_di, 0.0, 1.0, ctx)?;
    validate_range("slew_up_c_per_5m", sup.slew_up_c_per_5m, 0.0, 10.0, ctx)?;
    validate_range("slew_down_c_per_5m", sup.slew_down_c_per_5m, 0.0, 10.0, ctx)?;
    Ok(())
}

fn validate_zone(zone: &ZoneDef) -> Result<(), ValidationError> {
    let ctx = format!("zone '{}'", zone.id);

    if zone.id.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "zone id".to_string(),
            value: zone.id.clone(),
            reason: "must not be empty".to_string(),
        });
    }

    if !zone.groups.is_empty() {
        return Err(ValidationError::Unsupported {
            feature: format!("{} groups", ctx),
            reason: "'groups' was renamed to 'circuits' in version 1".to_string(),
        });
    }

    if zone.circuits.is_empty() {
        return Err(ValidationError::MissingReference {
            id: "circuits".to_string(),
            context: format!("{} needs at least one circuit", ctx),
        });
    }

    let references = [
        ("temp_sensor", &zone.temp_sensor),
        ("target_source", &zone.target_source),
    ];
    for (field, reference) in references {
        if reference.trim().is_empty() {
            return Err(ValidationError::MissingReference {
                id: field.to_string(),
                context: ctx.clone(),
            });
        }
    }

    validate_range("hysteresis", zone.hysteresis, 0.0, 5.0, &ctx)?;
    validate_range("flow_weight", zone.flow_weight, 0.0, f64::MAX, &ctx)?;
    validate_range("solar_weight", zone.solar_weight, 0.0, f64::MAX, &ctx)?;

    if let ControlDef::Pwm {
        cycle_time_min,
        min_on_time_min,
        min_off_time_min,
        kp,
        ki,
        actuator_delay_min,
    } = zone.control
    {
        validate_range("cycle_time_min", cycle_time_min, 5.0, 30.0, &ctx)?;
        validate_range("min_on_time_min", min_on_time_min, 1.0, 10.0, &ctx)?;
        validate_range("min_off_time_min", min_off_time_min, 1.0, 10.0, &ctx)?;
        validate_range("kp", kp, 0.0, f64::MAX, &ctx)?;
        validate_range("ki", ki, 0.0, f64::MAX, &ctx)?;
        validate_range("actuator_delay_min", actuator_delay_min, 0.0, cycle_time_min, &ctx)?;
    }

    Ok(())
}

fn validate_range(
    field: &str,
    value: f64,
    min: f64,
    max: f64,
    context: &str,
) -> Result<(), ValidationError> {
    if !value.is_finite() || value < min || value > max {
        let reason = if max == f64::MAX {
            format!("must be finite and >= {}", min)
        } else {
            format!("must be finite and within [{}, {}]", min, max)
        };
        return Err(ValidationError::InvalidValue {
            field: format!("{} {}", context, field),
            value: value.to_string(),
            reason,
        });
    }
    Ok(())
}
