//! Numerical core for orbital and rigid-body propagation.
//!
//! - [`AdaptiveRk45`]: embedded Runge-Kutta-Fehlberg 4(5) integrator with
//!   error-controlled step size, resampled onto caller times with
//!   [`CubicHermiteSpline`] segments.
//! - [`Rk4`]: fixed-step classical Runge-Kutta behind the same
//!   [`Integrator`] trait.
//! - [`KeplerPropagator`]: closed-form two-body reference solution with a
//!   Newton-Raphson Kepler-equation solver.
//!
//! ```
//! use astro_ode::{AdaptiveRk45, Integrator, KeplerPropagator, OrbitalElements, TwoBody};
//!
//! let kepler = KeplerPropagator::new(OrbitalElements::circular(1.0)).unwrap();
//! let times: Vec<f64> = (0..=100).map(|i| 0.01 * i as f64).collect();
//! let reference = kepler.solve(&times, 1e-12).unwrap();
//!
//! let mut solver = AdaptiveRk45::with_problem(TwoBody::new(1.0), reference[0].clone(), 0.0);
//! let numeric = solver.solve(&times, 0.01, 1e-10).unwrap();
//! assert!((&numeric[100] - &reference[100]).amax() < 1e-8);
//! ```

pub mod dynamics;
pub mod error;
pub mod integrator;
pub mod interpolate;
pub mod orbital;
pub mod state;

pub use dynamics::{Dynamics, RigidBody, TwoBody};
pub use error::{Result, SolverError};
pub use integrator::{AdaptiveRk45, Integrator, Rk4, SolverConfig, Stats};
pub use interpolate::{resample, CubicHermiteSpline, Interpolator};
pub use orbital::{AnomalyType, KeplerConfig, KeplerPropagator, OrbitalElements};
pub use state::{State, Trajectory, TrajectorySample};
