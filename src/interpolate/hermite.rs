use crate::error::{Result, SolverError};
use crate::interpolate::Interpolator;
use crate::state::{State, TrajectorySample};

/// Cubic Hermite segment between two solved samples.
///
/// Matches value and first derivative at both ends. Built once per
/// bracket and never mutated; a new bracket means a new spline.
#[derive(Debug, Clone)]
pub struct CubicHermiteSpline {
    t1: f64,
    t2: f64,
    y1: State,
    y2: State,
    a: State,
    b: State,
}

impl CubicHermiteSpline {
    /// Build from `(t1, y1, k1)` and `(t2, y2, k2)`; requires `t1 < t2`
    /// and matching dimensions.
    pub fn new(p1: &TrajectorySample, p2: &TrajectorySample) -> Result<Self> {
        if !(p1.t < p2.t) {
            return Err(SolverError::Range(format!(
                "spline bracket needs t1 < t2, got [{}, {}]",
                p1.t, p2.t
            )));
        }
        let n = p1.x.len();
        if p2.x.len() != n || p1.xdot.len() != n || p2.xdot.len() != n {
            return Err(SolverError::Configuration(
                "spline endpoints differ in dimension".to_string(),
            ));
        }

        let dt = p2.t - p1.t;
        let dy = &p2.x - &p1.x;
        let a = &p1.xdot * dt - &dy;
        let b = &dy - &p2.xdot * dt;

        Ok(Self {
            t1: p1.t,
            t2: p2.t,
            y1: p1.x.clone(),
            y2: p2.x.clone(),
            a,
            b,
        })
    }

    /// Bracket covered by this segment.
    pub fn bounds(&self) -> (f64, f64) {
        (self.t1, self.t2)
    }

    fn fraction(&self, t: f64) -> f64 {
        (t - self.t1) / (self.t2 - self.t1)
    }
}

impl Interpolator for CubicHermiteSpline {
    fn evaluate(&self, t: f64) -> State {
        let p = self.fraction(t);
        let q = 1.0 - p;
        State::from_iterator(
            self.y1.len(),
            self.y1
                .iter()
                .zip(self.y2.iter())
                .zip(self.a.iter().zip(self.b.iter()))
                .map(|((&y1, &y2), (&a, &b))| q * y1 + p * y2 + p * q * (q * a + p * b)),
        )
    }
}
