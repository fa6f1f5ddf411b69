//! Project schema definitions.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub plant: PlantDef,
    #[serde(default)]
    pub zones: Vec<ZoneDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlantDef {
    #[serde(default)]
    pub operation_mode: OperationModeDef,
    #[serde(default)]
    pub flow_mode: FlowModeDef,
    #[serde(default = "default_heating_base_offset")]
    pub heating_base_offset: f64,
    #[serde(default = "default_cooling_base_offset")]
    pub cooling_base_offset: f64,
    #[serde(default = "default_weather_slope")]
    pub weather_slope: f64,
    #[serde(default)]
    pub flow_curve_offset: f64,
    #[serde(default = "FlowBandDef::heating")]
    pub heating_flow: FlowBandDef,
    #[serde(default = "FlowBandDef::cooling")]
    pub cooling_flow: FlowBandDef,
    /// Deviation (°C) auto mode needs before switching direction.
    #[serde(default = "default_auto_mode_deadband")]
    pub auto_mode_deadband: f64,
    #[serde(default)]
    pub supervisor: SupervisorDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outside_temp_sensor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast_temp_sensor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solar_forecast_sensor: Option<String>,
}

impl Default for PlantDef {
    fn default() -> Self {
        Self {
            operation_mode: OperationModeDef::default(),
            flow_mode: FlowModeDef::default(),
            heating_base_offset: default_heating_base_offset(),
            cooling_base_offset: default_cooling_base_offset(),
            weather_slope: default_weather_slope(),
            flow_curve_offset: 0.0,
            heating_flow: FlowBandDef::heating(),
            cooling_flow: FlowBandDef::cooling(),
            auto_mode_deadband: default_auto_mode_deadband(),
            supervisor: SupervisorDef::default(),
            outside_temp_sensor: None,
            forecast_temp_sensor: None,
            solar_forecast_sensor: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OperationModeDef {
    #[default]
    Auto,
    Heat,
    Cool,
    Off,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FlowModeDef {
    #[default]
    Simple,
    Advanced,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FlowBandDef {
    pub min: f64,
    pub max: f64,
}

impl FlowBandDef {
    pub fn heating() -> Self {
        Self { min: 15.0, max: 35.0 }
    }

    pub fn cooling() -> Self {
        Self { min: 15.0, max: 25.0 }
    }
}

/// Flow supervisor tunables; every field falls back to its default.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SupervisorDef {
    pub error_norm_max: f64,
    pub duty_ema_minutes: f64,
    pub fast_ema_minutes: f64,
    pub error_weight: f64,
    pub duty_weight: f64,
    pub slow_mix_weight: f64,
    pub fast_mix_weight: f64,
    pub kp: f64,
    pub use_integral: bool,
    pub ti_minutes: f64,
    pub i_max: f64,
    pub fast_error_deadband_c: f64,
    pub fast_boost_gain: f64,
    pub fast_boost_cap_c: f64,
    pub preheat_enabled: bool,
    pub preheat_gain: f64,
    pub preheat_solar_gain_per_w_m2: f64,
    pub preheat_cap_c: f64,
    pub preheat_min_slow_di: f64,
    pub slew_up_c_per_5m: f64,
    pub slew_down_c_per_5m: f64,
}

impl Default for SupervisorDef {
    fn default() -> Self {
        Self {
            error_norm_max: 2.0,
            duty_ema_minutes: 20.0,
            fast_ema_minutes: 5.0,
            error_weight: 0.6,
            duty_weight: 0.4,
            slow_mix_weight: 0.8,
            fast_mix_weight: 0.2,
            kp: 1.0,
            use_integral: false,
            ti_minutes: 180.0,
            i_max: 1.5,
            fast_error_deadband_c: 0.4,
            fast_boost_gain: 1.2,
            fast_boost_cap_c: 1.2,
            preheat_enabled: false,
            preheat_gain: 0.35,
            preheat_solar_gain_per_w_m2: 0.0,
            preheat_cap_c: 1.2,
            preheat_min_slow_di: 0.25,
            slew_up_c_per_5m: 0.3,
            slew_down_c_per_5m: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ZoneDef {
    pub id: String,
    pub name: String,
    /// Actuated circuit references (valves, switches).
    #[serde(default)]
    pub circuits: Vec<String>,
    /// Pre-v1 spelling of `circuits`, folded in by migration.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
    pub temp_sensor: String,
    pub target_source: String,
    #[serde(default = "default_hysteresis")]
    pub hysteresis: f64,
    #[serde(default)]
    pub control: ControlDef,
    #[serde(default)]
    pub responsiveness: ResponsivenessDef,
    #[serde(default = "default_weight")]
    pub flow_weight: f64,
    #[serde(default = "default_weight")]
    pub solar_weight: f64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlDef {
    #[default]
    BangBang,
    Pwm {
        #[serde(default = "default_cycle_time_min")]
        cycle_time_min: f64,
        #[serde(default = "default_min_segment_min")]
        min_on_time_min: f64,
        #[serde(default = "default_min_segment_min")]
        min_off_time_min: f64,
        #[serde(default = "default_pwm_kp")]
        kp: f64,
        #[serde(default = "default_pwm_ki")]
        ki: f64,
        #[serde(default)]
        actuator_delay_min: f64,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResponsivenessDef {
    #[default]
    Slow,
    Fast,
}

fn default_heating_base_offset() -> f64 {
    3.0
}

fn default_cooling_base_offset() -> f64 {
    2.5
}

fn default_weather_slope() -> f64 {
    0.25
}

fn default_auto_mode_deadband() -> f64 {
    0.2
}

fn default_hysteresis() -> f64 {
    0.3
}

fn default_weight() -> f64 {
    1.0
}

fn default_enabled() -> bool {
    true
}

fn default_cycle_time_min() -> f64 {
    15.0
}

fn default_min_segment_min() -> f64 {
    3.0
}

fn default_pwm_kp() -> f64 {
    30.0
}

fn default_pwm_ki() -> f64 {
    2.0
}
