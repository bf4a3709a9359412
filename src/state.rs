use nalgebra::DVector;

use crate::error::{Result, SolverError};

// ---------------------------------------------------------------------------
// State vector
// ---------------------------------------------------------------------------

/// Dynamical state. Length is fixed for the lifetime of one run; the
/// meaning of each slot belongs to the dynamics function.
pub type State = DVector<f64>;

/// True when every component is finite.
pub(crate) fn is_finite(x: &State) -> bool {
    x.iter().all(|v| v.is_finite())
}

/// Largest absolute component (infinity norm). Zero for an empty state.
pub(crate) fn max_abs(x: &State) -> f64 {
    x.iter().fold(0.0_f64, |m, v| m.max(v.abs()))
}

// ---------------------------------------------------------------------------
// Trajectory samples
// ---------------------------------------------------------------------------

/// A solved point: time, state, and the derivative evaluated there.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectorySample {
    pub t: f64,
    pub x: State,
    pub xdot: State,
}

impl TrajectorySample {
    pub fn new(t: f64, x: State, xdot: State) -> Self {
        Self { t, x, xdot }
    }
}

/// Append-only sequence of samples with strictly increasing time.
#[derive(Debug, Clone, Default)]
pub struct Trajectory {
    samples: Vec<TrajectorySample>,
}

impl Trajectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
        }
    }

    /// Append a sample. Fails if `t` does not advance past the last sample
    /// or the dimension differs from the first sample.
    pub fn push(&mut self, sample: TrajectorySample) -> Result<()> {
        if let Some(last) = self.samples.last() {
            if sample.t <= last.t {
                return Err(SolverError::Range(format!(
                    "sample time {} does not advance past {}",
                    sample.t, last.t
                )));
            }
            if sample.x.len() != last.x.len() || sample.xdot.len() != last.x.len() {
                return Err(SolverError::Configuration(format!(
                    "state dimension changed from {} to {}",
                    last.x.len(),
                    sample.x.len()
                )));
            }
        }
        self.samples.push(sample);
        Ok(())
    }

    pub fn samples(&self) -> &[TrajectorySample] {
        &self.samples
    }

    pub fn last(&self) -> Option<&TrajectorySample> {
        self.samples.last()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Split into parallel `(times, states)` vectors.
    pub fn to_series(&self) -> (Vec<f64>, Vec<State>) {
        self.samples.iter().map(|s| (s.t, s.x.clone())).unzip()
    }
}
