pub mod coefficients;
pub mod rk4;
pub mod rkf45;

pub use rk4::Rk4;
pub use rkf45::AdaptiveRk45;

use crate::dynamics::Dynamics;
use crate::error::{Result, SolverError};
use crate::state::State;

// ---------------------------------------------------------------------------
// Integrator contract
// ---------------------------------------------------------------------------

/// A method that advances an initial value problem and reports the state
/// at caller-chosen times.
pub trait Integrator {
    /// Integrate up to `max(times)` and return one state per entry of
    /// `times`, in the same order.
    ///
    /// `times` must be non-decreasing and start at or after the initial
    /// time. `dt` is the nominal step, `eps` the per-step error tolerance
    /// (ignored by fixed-step methods).
    fn solve(&mut self, times: &[f64], dt: f64, eps: f64) -> Result<Vec<State>>;
}

// ---------------------------------------------------------------------------
// Initial value problem
// ---------------------------------------------------------------------------

/// Dynamics plus initial conditions. Every piece is optional until a run
/// starts, so integrators can be configured incrementally.
#[derive(Default)]
pub struct InitialValueProblem {
    func: Option<Box<dyn Dynamics>>,
    x0: Option<State>,
    t0: Option<f64>,
}

impl InitialValueProblem {
    pub fn new<F: Dynamics + 'static>(func: F, x0: State, t0: f64) -> Self {
        Self {
            func: Some(Box::new(func)),
            x0: Some(x0),
            t0: Some(t0),
        }
    }

    pub fn set_func<F: Dynamics + 'static>(&mut self, func: F) {
        self.func = Some(Box::new(func));
    }

    pub fn set_ic(&mut self, x0: State, t0: f64) {
        self.x0 = Some(x0);
        self.t0 = Some(t0);
    }

    pub fn func(&self) -> Option<&dyn Dynamics> {
        self.func.as_deref()
    }

    pub fn initial_conditions(&self) -> (Option<&State>, Option<f64>) {
        (self.x0.as_ref(), self.t0)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Everything needed to start a run, or the first missing piece.
    pub(crate) fn require(&self) -> Result<(&dyn Dynamics, &State, f64)> {
        let func = self
            .func
            .as_deref()
            .ok_or_else(|| SolverError::Configuration("no function to integrate".to_string()))?;
        let x0 = self
            .x0
            .as_ref()
            .ok_or_else(|| SolverError::Configuration("no starting state".to_string()))?;
        let t0 = self
            .t0
            .ok_or_else(|| SolverError::Configuration("no starting time".to_string()))?;
        if !t0.is_finite() || !crate::state::is_finite(x0) {
            return Err(SolverError::Configuration(
                "initial conditions must be finite".to_string(),
            ));
        }
        Ok((func, x0, t0))
    }
}

/// Checks shared by every `solve`: returns the final time to integrate to.
pub(crate) fn final_time(times: &[f64], t0: f64) -> Result<f64> {
    let tf = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !tf.is_finite() {
        return Err(SolverError::Range(
            "requested times must be finite and non-empty".to_string(),
        ));
    }
    if tf < t0 {
        return Err(SolverError::Range(format!(
            "final time {} is less than initial time {}",
            tf, t0
        )));
    }
    Ok(tf)
}

/// Preallocation hint for a run over `[t0, tf]` at nominal step `dt`.
/// Long runs grow the buffer instead; the step caps bound them.
pub(crate) fn initial_capacity(t0: f64, tf: f64, dt: f64) -> usize {
    ((tf - t0) / dt).min(100_000.0) as usize + 2
}

pub(crate) fn check_step(dt: f64) -> Result<()> {
    if !(dt.is_finite() && dt > 0.0) {
        return Err(SolverError::Configuration(format!(
            "nominal step must be positive and finite, got {}",
            dt
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Configuration and diagnostics
// ---------------------------------------------------------------------------

/// Step-control settings for the adaptive integrator.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    pub safety: f64,             // shrink safety factor
    pub shrink_exponent: f64,    // 1 / (order + 1) of the error estimate
    pub max_step_retries: usize, // rejected trials allowed per step
    pub max_steps: u64,          // attempted steps per run (also bounds Rk4)
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            safety: 0.9,
            shrink_exponent: 0.2,
            max_step_retries: 1_000,
            max_steps: 10_000_000,
        }
    }
}

/// Counters from the most recent run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stats {
    pub fn_evals: u64,
    pub accepted_steps: u64,
    pub rejected_steps: u64,
}
