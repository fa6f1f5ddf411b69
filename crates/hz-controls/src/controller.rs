//! PI controller producing a PWM duty cycle.
//!
//! Output is a duty percentage in `[0, 100]`. The controller includes:
//! - Anti-windup by freezing: the integral does not move on a tick that
//!   follows a saturated output
//! - Integral clamping to the range that can still move the output
//! - Sampled operation with an explicit elapsed time per update

use hz_core::clamp;
use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};

/// Lowest duty the controller emits.
pub const DUTY_MIN: f64 = 0.0;
/// Highest duty the controller emits.
pub const DUTY_MAX: f64 = 100.0;

/// PI gains for duty-cycle control.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DutyPi {
    /// Proportional gain (% per °C).
    pub kp: f64,
    /// Integral gain (% per °C·minute).
    pub ki: f64,
}

impl DutyPi {
    /// Create a new duty controller.
    ///
    /// # Arguments
    ///
    /// * `kp` - Proportional gain, percent per °C
    /// * `ki` - Integral gain, percent per °C·minute
    pub fn new(kp: f64, ki: f64) -> ControlResult<Self> {
        if !kp.is_finite() || kp < 0.0 {
            return Err(ControlError::InvalidArg {
                what: "kp must be finite and non-negative",
            });
        }
        if !ki.is_finite() || ki < 0.0 {
            return Err(ControlError::InvalidArg {
                what: "ki must be finite and non-negative",
            });
        }
        Ok(Self { kp, ki })
    }

    /// Bound on the integral accumulator (°C·minute), `None` without integral action.
    ///
    /// Past this bound the integral alone saturates the output.
    pub fn integral_limit(&self) -> Option<f64> {
        (self.ki > 0.0).then(|| DUTY_MAX / self.ki)
    }

    /// Compute the duty given the control error.
    ///
    /// # Arguments
    ///
    /// * `state` - Controller state (integral and freeze flag)
    /// * `error` - Control error in °C, positive when the zone needs the plant
    /// * `dt_minutes` - Time since last update
    ///
    /// # Returns
    ///
    /// Updated state and the output terms.
    pub fn update(&self, state: &PiState, error: f64, dt_minutes: f64) -> (PiState, PiOutput) {
        let integral = if state.frozen {
            state.integral
        } else {
            let grown = state.integral + error * dt_minutes.max(0.0);
            match self.integral_limit() {
                Some(limit) => clamp(grown, -limit, limit),
                None => grown,
            }
        };
        let integral = if integral.is_finite() { integral } else { 0.0 };

        let p_term = self.kp * error;
        let i_term = self.ki * integral;
        let unclamped = p_term + i_term;
        let duty = clamp(unclamped, DUTY_MIN, DUTY_MAX);

        // Saturated now means the next tick must not integrate.
        let frozen = !(DUTY_MIN..=DUTY_MAX).contains(&unclamped);

        let new_state = PiState { integral, frozen };
        let output = PiOutput {
            p_term,
            i_term,
            unclamped,
            duty,
        };
        (new_state, output)
    }
}

/// PI controller state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PiState {
    /// Integral accumulator (°C·minute).
    pub integral: f64,
    /// Anti-windup freeze flag, set when the last output saturated.
    pub frozen: bool,
}

/// Terms of one PI evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PiOutput {
    pub p_term: f64,
    pub i_term: f64,
    pub unclamped: f64,
    /// Duty percentage in `[0, 100]`.
    pub duty: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duty_pi_creation() {
        let pi = DutyPi::new(30.0, 2.0).unwrap();
        assert_eq!(pi.kp, 30.0);
        assert_eq!(pi.integral_limit(), Some(50.0));
        assert_eq!(DutyPi::new(30.0, 0.0).unwrap().integral_limit(), None);
    }

    #[test]
    fn proportional_only() {
        let pi = DutyPi::new(30.0, 0.0).unwrap();
        let (_, out) = pi.update(&PiState::default(), 1.5, 1.0);
        assert!((out.duty - 45.0).abs() < 1e-12);
    }

    #[test]
    fn output_clamped_to_duty_range() {
        let pi = DutyPi::new(200.0, 0.0).unwrap();
        let (state, out) = pi.update(&PiState::default(), 1.0, 1.0);
        assert_eq!(out.duty, 100.0);
        assert!(state.frozen);

        let (state, out) = pi.update(&PiState::default(), -1.0, 1.0);
        assert_eq!(out.duty, 0.0);
        assert!(state.frozen);
    }

    #[test]
    fn constant_error_rises_then_saturates() {
        // kp=30, ki=2, 15-minute ticks, error held at 1.0 °C
        let pi = DutyPi::new(30.0, 2.0).unwrap();
        let mut state = PiState::default();
        let mut duties = Vec::new();
        for _ in 0..6 {
            let (next, out) = pi.update(&state, 1.0, 15.0);
            state = next;
            duties.push(out.duty);
        }
        assert!((duties[0] - 60.0).abs() < 1e-9);
        assert!((duties[1] - 90.0).abs() < 1e-9);
        assert!(duties.windows(2).all(|w| w[1] >= w[0]));
        assert_eq!(*duties.last().unwrap(), 100.0);
    }

    #[test]
    fn integral_freezes_after_saturation_and_resumes() {
        let pi = DutyPi::new(30.0, 2.0).unwrap();
        let mut state = PiState::default();
        // drive into saturation
        for _ in 0..3 {
            state = pi.update(&state, 1.0, 15.0).0;
        }
        assert!(state.frozen);
        let frozen_integral = state.integral;

        // still saturated: integral must not grow
        state = pi.update(&state, 1.0, 15.0).0;
        assert_eq!(state.integral, frozen_integral);

        // error drops, output leaves saturation, integration resumes next tick
        let (next, out) = pi.update(&state, -0.5, 15.0);
        assert!(out.unclamped < 100.0 && out.unclamped > 0.0);
        assert!(!next.frozen);
        assert_eq!(next.integral, frozen_integral);
        let (after, _) = pi.update(&next, -0.5, 15.0);
        assert!(after.integral < frozen_integral);
    }

    #[test]
    fn integral_respects_limit() {
        let pi = DutyPi::new(0.0, 2.0).unwrap();
        let state = PiState {
            integral: 49.0,
            frozen: false,
        };
        let (state, _) = pi.update(&state, 10.0, 30.0);
        assert_eq!(state.integral, 50.0);
    }

    #[test]
    fn invalid_controller_params() {
        assert!(DutyPi::new(-1.0, 1.0).is_err());
        assert!(DutyPi::new(1.0, -1.0).is_err());
        assert!(DutyPi::new(f64::NAN, 1.0).is_err());
    }
}
