use nalgebra::Vector3;

use crate::dynamics::Dynamics;
use crate::state::State;

// ---------------------------------------------------------------------------
// Two-body point-mass gravity
// ---------------------------------------------------------------------------

/// Unperturbed two-body motion on a 6-state `[r, v]`.
///
///   r' = v
///   v' = -mu / |r|^3 * r
#[derive(Debug, Clone, Copy)]
pub struct TwoBody {
    pub mu: f64, // gravitational parameter
}

impl Default for TwoBody {
    fn default() -> Self {
        Self { mu: 1.0 }
    }
}

impl TwoBody {
    pub fn new(mu: f64) -> Self {
        Self { mu }
    }

    /// Point-mass gravitational acceleration at `pos`.
    pub fn acceleration(&self, pos: &Vector3<f64>) -> Vector3<f64> {
        let r = pos.norm();
        -self.mu / (r * r * r) * pos
    }

    /// Specific orbital energy of a 6-state.
    pub fn energy(&self, x: &State) -> f64 {
        let pos = x.fixed_rows::<3>(0).into_owned();
        let vel = x.fixed_rows::<3>(3).into_owned();
        0.5 * vel.norm_squared() - self.mu / pos.norm()
    }
}

impl Dynamics for TwoBody {
    fn derivative(&self, _t: f64, x: &State) -> State {
        let pos = x.fixed_rows::<3>(0).into_owned();
        let mut xdot = State::zeros(x.len());
        xdot.fixed_rows_mut::<3>(0).copy_from(&x.fixed_rows::<3>(3));
        xdot.fixed_rows_mut::<3>(3).copy_from(&self.acceleration(&pos));
        xdot
    }
}
