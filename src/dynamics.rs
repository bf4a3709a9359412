pub mod rotational;
pub mod translational;

pub use rotational::RigidBody;
pub use translational::TwoBody;

use crate::state::State;

// ---------------------------------------------------------------------------
// Right-hand side contract
// ---------------------------------------------------------------------------

/// Right-hand side of `dx/dt = f(t, x)`.
///
/// The returned derivative must have the same length as `x`. Integrators
/// treat the state as opaque and only ever call this method.
pub trait Dynamics {
    fn derivative(&self, t: f64, x: &State) -> State;
}

impl<F> Dynamics for F
where
    F: Fn(f64, &State) -> State,
{
    fn derivative(&self, t: f64, x: &State) -> State {
        self(t, x)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_dynamics() {
        let decay = |_t: f64, x: &State| -x;
        let x = State::from_vec(vec![2.0, -1.0]);
        let d = decay.derivative(0.0, &x);
        assert_eq!(d, State::from_vec(vec![-2.0, 1.0]));
    }

    #[test]
    fn boxed_dynamics_dispatch() {
        let f: Box<dyn Dynamics> = Box::new(|t: f64, x: &State| x * t);
        let d = f.derivative(3.0, &State::from_vec(vec![1.0]));
        assert_eq!(d[0], 3.0);
    }
}
