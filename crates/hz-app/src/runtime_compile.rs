//! Runtime compilation of project definitions into control engine types.

use hz_controls::{
    ControlStrategy, DutyPi, FlowBand, FlowMode, Hysteresis, OperationMode, PwmConfig,
    Responsiveness, SimpleFlowParams, SupervisorConfig, ZoneConfig,
};
use hz_project::schema::{
    ControlDef, FlowBandDef, FlowModeDef, OperationModeDef, PlantDef, Project, ResponsivenessDef,
    SupervisorDef, ZoneDef,
};

use crate::error::{AppError, AppResult};

/// Sensor references the plant reads every tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherSources {
    pub outside_temp: Option<String>,
    pub forecast_temp: Option<String>,
    pub solar_forecast: Option<String>,
}

/// Plant-wide settings in engine form.
#[derive(Debug, Clone, PartialEq)]
pub struct PlantSettings {
    pub operation_mode: OperationMode,
    pub flow_mode: FlowMode,
    pub flow_params: SimpleFlowParams,
    pub supervisor: SupervisorConfig,
    pub auto_mode_deadband: f64,
    pub weather: WeatherSources,
}

/// One zone ready to be registered with the runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledZone {
    pub id: String,
    pub circuits: Vec<String>,
    pub enabled: bool,
    pub config: ZoneConfig,
}

/// Everything the plant runtime is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledProject {
    pub name: String,
    pub plant: PlantSettings,
    pub zones: Vec<CompiledZone>,
}

/// Compile a validated project.
pub fn compile_project(project: &Project) -> AppResult<CompiledProject> {
    let plant = compile_plant(&project.plant)?;
    let zones = project.zones.iter().map(compile_zone).collect::<AppResult<Vec<_>>>()?;
    Ok(CompiledProject {
        name: project.name.clone(),
        plant,
        zones,
    })
}

/// Compile plant-wide settings.
pub fn compile_plant(plant: &PlantDef) -> AppResult<PlantSettings> {
    let flow_params = SimpleFlowParams {
        heating_base_offset: plant.heating_base_offset,
        cooling_base_offset: plant.cooling_base_offset,
        weather_slope: plant.weather_slope,
        curve_offset: plant.flow_curve_offset,
        heating_band: band(&plant.heating_flow)?,
        cooling_band: band(&plant.cooling_flow)?,
    };
    flow_params.validate()?;

    let supervisor = supervisor_config(&plant.supervisor);
    supervisor.validate()?;

    Ok(PlantSettings {
        operation_mode: match plant.operation_mode {
            OperationModeDef::Auto => OperationMode::Auto,
            OperationModeDef::Heat => OperationMode::Heat,
            OperationModeDef::Cool => OperationMode::Cool,
            OperationModeDef::Off => OperationMode::Off,
        },
        flow_mode: match plant.flow_mode {
            FlowModeDef::Simple => FlowMode::Simple,
            FlowModeDef::Advanced => FlowMode::Advanced,
        },
        flow_params,
        supervisor,
        auto_mode_deadband: plant.auto_mode_deadband,
        weather: WeatherSources {
            outside_temp: plant.outside_temp_sensor.clone(),
            forecast_temp: plant.forecast_temp_sensor.clone(),
            solar_forecast: plant.solar_forecast_sensor.clone(),
        },
    })
}

/// Compile one zone definition into its controller configuration.
pub fn compile_zone(zone: &ZoneDef) -> AppResult<CompiledZone> {
    if zone.circuits.is_empty() {
        return Err(AppError::Compile(format!("Zone '{}' has no circuits", zone.id)));
    }

    let strategy = match zone.control {
        ControlDef::BangBang => ControlStrategy::BangBang,
        ControlDef::Pwm {
            cycle_time_min,
            min_on_time_min,
            min_off_time_min,
            kp,
            ki,
            actuator_delay_min,
        } => ControlStrategy::Pwm {
            pi: DutyPi::new(kp, ki)?,
            pwm: PwmConfig::new(cycle_time_min, min_on_time_min, min_off_time_min)?
                .with_actuator_delay(actuator_delay_min)?,
        },
    };

    let name = if zone.name.trim().is_empty() {
        zone.id.clone()
    } else {
        zone.name.clone()
    };

    let mut config = ZoneConfig::new(name, zone.temp_sensor.clone(), zone.target_source.clone())
        .with_strategy(strategy)
        .with_responsiveness(match zone.responsiveness {
            ResponsivenessDef::Slow => Responsiveness::Slow,
            ResponsivenessDef::Fast => Responsiveness::Fast,
        });
    config.hysteresis = Hysteresis::new(zone.hysteresis)?;
    config.flow_weight = zone.flow_weight;
    config.solar_weight = zone.solar_weight;
    config.validate()?;

    Ok(CompiledZone {
        id: zone.id.clone(),
        circuits: zone.circuits.clone(),
        enabled: zone.enabled,
        config,
    })
}

fn band(def: &FlowBandDef) -> AppResult<FlowBand> {
    Ok(FlowBand::new(def.min, def.max)?)
}

fn supervisor_config(def: &SupervisorDef) -> SupervisorConfig {
    SupervisorConfig {
        error_norm_max: def.error_norm_max,
        duty_ema_minutes: def.duty_ema_minutes,
        fast_ema_minutes: def.fast_ema_minutes,
        error_weight: def.error_weight,
        duty_weight: def.duty_weight,
        slow_mix_weight: def.slow_mix_weight,
        fast_mix_weight: def.fast_mix_weight,
        kp: def.kp,
        use_integral: def.use_integral,
        ti_minutes: def.ti_minutes,
        i_max: def.i_max,
        fast_error_deadband_c: def.fast_error_deadband_c,
        fast_boost_gain: def.fast_boost_gain,
        fast_boost_cap_c: def.fast_boost_cap_c,
        preheat_enabled: def.preheat_enabled,
        preheat_gain: def.preheat_gain,
        preheat_solar_gain_per_w_m2: def.preheat_solar_gain_per_w_m2,
        preheat_cap_c: def.preheat_cap_c,
        preheat_min_slow_di: def.preheat_min_slow_di,
        slew_up_c_per_5m: def.slew_up_c_per_5m,
        slew_down_c_per_5m: def.slew_down_c_per_5m,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone_def(control: ControlDef) -> ZoneDef {
        ZoneDef {
            id: "living".to_string(),
            name: String::new(),
            circuits: vec!["switch.living".to_string()],
            groups: Vec::new(),
            temp_sensor: "sensor.living".to_string(),
            target_source: "number.living".to_string(),
            hysteresis: 0.5,
            control,
            responsiveness: ResponsivenessDef::Fast,
            flow_weight: 2.0,
            solar_weight: 0.5,
            enabled: true,
        }
    }

    #[test]
    fn pwm_zone_compiles_with_delay() {
        let compiled = compile_zone(&zone_def(ControlDef::Pwm {
            cycle_time_min: 20.0,
            min_on_time_min: 2.0,
            min_off_time_min: 4.0,
            kp: 25.0,
            ki: 1.5,
            actuator_delay_min: 1.0,
        }))
        .unwrap();

        assert_eq!(compiled.config.name, "living");
        assert_eq!(compiled.config.hysteresis.band, 0.5);
        assert_eq!(compiled.config.responsiveness, Responsiveness::Fast);
        assert_eq!(compiled.config.flow_weight, 2.0);
        let ControlStrategy::Pwm { pi, pwm } = compiled.config.strategy else {
            panic!("expected pwm strategy");
        };
        assert_eq!((pi.kp, pi.ki), (25.0, 1.5));
        assert_eq!(pwm.cycle_minutes, 20.0);
        assert_eq!(pwm.actuator_delay_minutes, 1.0);
    }

    #[test]
    fn out_of_range_pwm_is_a_compile_error() {
        let err = compile_zone(&zone_def(ControlDef::Pwm {
            cycle_time_min: 45.0,
            min_on_time_min: 3.0,
            min_off_time_min: 3.0,
            kp: 30.0,
            ki: 2.0,
            actuator_delay_min: 0.0,
        }))
        .unwrap_err();
        assert!(matches!(err, AppError::Compile(_)));
    }

    #[test]
    fn plant_defaults_match_engine_defaults() {
        let plant = compile_plant(&PlantDef::default()).unwrap();
        assert_eq!(plant.operation_mode, OperationMode::Auto);
        assert_eq!(plant.flow_mode, FlowMode::Simple);
        assert_eq!(plant.flow_params, SimpleFlowParams::default());
        assert_eq!(plant.supervisor, SupervisorConfig::default());
        assert_eq!(plant.weather, WeatherSources::default());
    }
}
