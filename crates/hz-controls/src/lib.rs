//! Control engine for hydronic floor heating and cooling.
//!
//! Everything here is pure computation: readings and configuration go in,
//! demands, actuator commands and a flow temperature come out. Applying them
//! to hardware is left to the caller.
//!
//! # Architecture
//!
//! - [`zone`]: per-zone controller, bang-bang ([`hysteresis`]) or PI
//!   ([`controller`]) realized through time-proportioned pulses ([`pwm`])
//! - [`demand`]: plant-wide direction (heat wins over cool) and auto mode
//! - [`flow`]: simple weather curve and the demand-weighted supervisor
//!
//! Within one tick all zones are updated first; aggregation and flow
//! calculation only see completed zone results.

pub mod actuator;
pub mod controller;
pub mod demand;
pub mod error;
pub mod flow;
pub mod hysteresis;
pub mod mode;
pub mod pwm;
pub mod reading;
pub mod zone;

pub use actuator::ActuatorCommand;
pub use controller::{DUTY_MAX, DUTY_MIN, DutyPi, PiOutput, PiState};
pub use demand::{
    AutoModeSelector, DemandAggregator, DemandingZone, OperationMode, PlantStatus, ZoneDemand,
};
pub use error::{ControlError, ControlResult};
pub use flow::{
    FlowBand, FlowBreakdown, FlowMode, FlowOutput, FlowSupervisor, FlowSupervisorState,
    SimpleFlowParams, SupervisorConfig, SupervisorTerms, WeatherInputs, ZoneFlowInput,
    compute_simple,
};
pub use hysteresis::{Hysteresis, SwitchState};
pub use mode::{Demand, HvacMode, Responsiveness};
pub use pwm::{PulsePlan, PwmConfig, PwmPhase, plan_pulse, staggered_elapsed_minutes};
pub use reading::{ReadingProvider, parse_reading};
pub use zone::{
    ControlStrategy, ZoneConfig, ZoneController, ZoneState, ZoneUpdate, ZoneWarning, hold_off,
    update_zone,
};
