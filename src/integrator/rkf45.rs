use log::{debug, trace, warn};

use crate::dynamics::Dynamics;
use crate::error::{Result, SolverError};
use crate::integrator::coefficients::{A, B, B_ERR, C, STAGES};
use crate::integrator::{
    check_step, final_time, initial_capacity, InitialValueProblem, Integrator, SolverConfig, Stats,
};
use crate::interpolate::resample;
use crate::state::{is_finite, max_abs, State, Trajectory, TrajectorySample};

// ---------------------------------------------------------------------------
// Single embedded RKF45 trial
// ---------------------------------------------------------------------------

/// Outcome of one trial step.
#[derive(Debug, Clone)]
pub struct StepTrial {
    /// 5th-order candidate state at `t + h`
    pub x: State,
    /// Largest component of the local error estimate
    pub error: f64,
}

/// One Runge-Kutta-Fehlberg trial of size `h` from `(t, x)`.
///
/// `xdot` is `f(t, x)`, already known from the previous accepted sample,
/// so a trial costs five further evaluations.
pub fn rkf45_step(f: &dyn Dynamics, t: f64, x: &State, xdot: &State, h: f64) -> StepTrial {
    let mut k: Vec<State> = Vec::with_capacity(STAGES);
    k.push(xdot.clone());

    for i in 1..STAGES {
        let mut y = x.clone();
        for (j, kj) in k.iter().enumerate() {
            y.axpy(h * A[i][j], kj, 1.0);
        }
        k.push(f.derivative(t + C[i] * h, &y));
    }

    let mut x_new = x.clone();
    let mut err = State::zeros(x.len());
    for (i, ki) in k.iter().enumerate() {
        x_new.axpy(h * B[i], ki, 1.0);
        err.axpy(h * B_ERR[i], ki, 1.0);
    }

    StepTrial {
        x: x_new,
        error: max_abs(&err),
    }
}

// ---------------------------------------------------------------------------
// Adaptive integrator
// ---------------------------------------------------------------------------

/// Adaptive Runge-Kutta-Fehlberg 4(5) integrator.
///
/// Every interval starts from the caller's nominal step. A trial whose
/// largest error component exceeds the tolerance is retried at the same
/// time with `h <- safety * h * (eps / err)^(1/5)`. Accepted samples are
/// kept with their derivatives so the trajectory can be resampled with
/// Hermite splines.
///
/// # Example
/// ```
/// use astro_ode::{AdaptiveRk45, Integrator, State};
///
/// let mut solver = AdaptiveRk45::with_problem(
///     |_t: f64, x: &State| -x,
///     State::from_vec(vec![1.0]),
///     0.0,
/// );
/// let out = solver.solve(&[0.0, 1.0, 2.0], 0.1, 1e-10).unwrap();
/// assert!((out[2][0] - (-2.0_f64).exp()).abs() < 1e-8);
/// ```
#[derive(Default)]
pub struct AdaptiveRk45 {
    problem: InitialValueProblem,
    config: SolverConfig,
    trajectory: Trajectory,
    /// Counters from the last run
    pub stats: Stats,
}

impl AdaptiveRk45 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_problem<F: Dynamics + 'static>(func: F, x0: State, t0: f64) -> Self {
        Self {
            problem: InitialValueProblem::new(func, x0, t0),
            ..Self::default()
        }
    }

    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn set_func<F: Dynamics + 'static>(&mut self, func: F) {
        self.problem.set_func(func);
    }

    pub fn set_ic(&mut self, x0: State, t0: f64) {
        self.problem.set_ic(x0, t0);
    }

    pub fn problem(&self) -> &InitialValueProblem {
        &self.problem
    }

    /// Internal samples from the last run.
    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    /// Internal `(times, states)` from the last run.
    pub fn output(&self) -> (Vec<f64>, Vec<State>) {
        self.trajectory.to_series()
    }

    /// Drop the dynamics, initial conditions and any stored trajectory.
    pub fn reset(&mut self) {
        self.problem.clear();
        self.trajectory.clear();
        self.stats = Stats::default();
    }

    /// Advance from the initial conditions to `tf` on the adaptive grid.
    /// The last internal sample lands on `tf`.
    pub fn integrate(&mut self, tf: f64, dt: f64, eps: f64) -> Result<&Trajectory> {
        check_step(dt)?;
        if !(eps.is_finite() && eps > 0.0) {
            return Err(SolverError::Configuration(format!(
                "tolerance must be positive and finite, got {}",
                eps
            )));
        }

        let (f, x0, t0) = self.problem.require()?;
        if !(tf >= t0) {
            return Err(SolverError::Range(format!(
                "final time {} is less than initial time {}",
                tf, t0
            )));
        }

        let config = &self.config;
        let mut stats = Stats::default();
        let mut trajectory = Trajectory::with_capacity(initial_capacity(t0, tf, dt));

        let mut t = t0;
        let mut x = x0.clone();
        let mut xdot = f.derivative(t, &x);
        stats.fn_evals += 1;
        if xdot.len() != x.len() {
            return Err(SolverError::Configuration(format!(
                "dynamics returned {} components for a {}-state",
                xdot.len(),
                x.len()
            )));
        }
        if !is_finite(&xdot) {
            return Err(SolverError::NonFiniteState { t });
        }
        trajectory.push(TrajectorySample::new(t, x.clone(), xdot.clone()))?;

        let mut steps = 0u64;
        while t < tf {
            steps += 1;
            if steps > config.max_steps {
                warn!("RKF45 hit the step limit ({}) at t = {}", config.max_steps, t);
                return Err(SolverError::Convergence {
                    what: "RKF45 integration",
                    iterations: config.max_steps as usize,
                });
            }

            // Nominal step, clamped so the run ends on tf
            let remaining = tf - t;
            let mut h = dt.min(remaining);
            let mut retries = 0usize;

            let trial = loop {
                let trial = rkf45_step(f, t, &x, &xdot, h);
                stats.fn_evals += (STAGES - 1) as u64;

                if !trial.error.is_finite() {
                    return Err(SolverError::NonFiniteState { t });
                }
                if trial.error <= eps {
                    break trial;
                }

                stats.rejected_steps += 1;
                retries += 1;
                if retries > config.max_step_retries {
                    warn!(
                        "RKF45 step control gave up at t = {} after {} retries (h = {:e}, err = {:e})",
                        t, retries - 1, h, trial.error
                    );
                    return Err(SolverError::Convergence {
                        what: "RKF45 step-size control",
                        iterations: config.max_step_retries,
                    });
                }

                h *= config.safety * (eps / trial.error).powf(config.shrink_exponent);
                trace!("RKF45 reject at t = {}: err = {:e}, retry with h = {:e}", t, trial.error, h);

                if t + h <= t {
                    warn!("RKF45 step size underflow at t = {}", t);
                    return Err(SolverError::Convergence {
                        what: "RKF45 step-size control",
                        iterations: retries,
                    });
                }
            };

            let t_next = if h >= remaining { tf } else { (t + h).min(tf) };
            if t_next <= t {
                warn!("RKF45 accepted step does not advance past t = {}", t);
                return Err(SolverError::Convergence {
                    what: "RKF45 step-size control",
                    iterations: retries,
                });
            }
            let x_next = trial.x;
            let xdot_next = f.derivative(t_next, &x_next);
            stats.fn_evals += 1;
            if !is_finite(&x_next) || !is_finite(&xdot_next) {
                return Err(SolverError::NonFiniteState { t: t_next });
            }

            trajectory.push(TrajectorySample::new(t_next, x_next.clone(), xdot_next.clone()))?;
            stats.accepted_steps += 1;

            t = t_next;
            x = x_next;
            xdot = xdot_next;
        }

        debug!(
            "RKF45 reached t = {} with {} accepted / {} rejected steps, {} evaluations",
            t, stats.accepted_steps, stats.rejected_steps, stats.fn_evals
        );

        self.stats = stats;
        self.trajectory = trajectory;
        Ok(&self.trajectory)
    }
}

impl Integrator for AdaptiveRk45 {
    fn solve(&mut self, times: &[f64], dt: f64, eps: f64) -> Result<Vec<State>> {
        let (_, _, t0) = self.problem.require()?;
        let tf = final_time(times, t0)?;
        self.integrate(tf, dt, eps)?;
        resample(self.trajectory.samples(), times)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
