use log::{debug, warn};

use crate::dynamics::Dynamics;
use crate::error::{Result, SolverError};
use crate::integrator::{
    check_step, final_time, initial_capacity, InitialValueProblem, Integrator, SolverConfig, Stats,
};
use crate::interpolate::resample;
use crate::state::{is_finite, State, Trajectory, TrajectorySample};

// ---------------------------------------------------------------------------
// Classical 4th-order Runge-Kutta
// ---------------------------------------------------------------------------

/// Single RK4 step: advance `x` by `dt`. `xdot` is `f(t, x)`.
pub fn rk4_step(f: &dyn Dynamics, t: f64, x: &State, xdot: &State, dt: f64) -> State {
    let k1 = xdot;
    let k2 = f.derivative(t + dt * 0.5, &(x + k1 * (dt * 0.5)));
    let k3 = f.derivative(t + dt * 0.5, &(x + &k2 * (dt * 0.5)));
    let k4 = f.derivative(t + dt, &(x + &k3 * dt));

    x + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (dt / 6.0)
}

/// Fixed-step RK4 integrator.
///
/// Steps at exactly `dt` (the last step is shortened to land on the final
/// time) and ignores the tolerance argument of [`Integrator::solve`].
/// Samples keep their derivatives so output goes through the same Hermite
/// resampling as the adaptive method. Of [`SolverConfig`] only `max_steps`
/// applies.
#[derive(Default)]
pub struct Rk4 {
    problem: InitialValueProblem,
    config: SolverConfig,
    trajectory: Trajectory,
    pub stats: Stats,
}

impl Rk4 {
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

    pub fn set_func<F: Dynamics + 'static>(&mut self, func: F) {
        self.problem.set_func(func);
    }

    pub fn set_ic(&mut self, x0: State, t0: f64) {
        self.problem.set_ic(x0, t0);
    }

    pub fn problem(&self) -> &InitialValueProblem {
        &self.problem
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    pub fn output(&self) -> (Vec<f64>, Vec<State>) {
        self.trajectory.to_series()
    }

    pub fn reset(&mut self) {
        self.problem.clear();
        self.trajectory.clear();
        self.stats = Stats::default();
    }

    /// Advance from the initial conditions to `tf` in steps of `dt`.
    pub fn integrate(&mut self, tf: f64, dt: f64) -> Result<&Trajectory> {
        check_step(dt)?;
        let (f, x0, t0) = self.problem.require()?;
        if !(tf >= t0) {
            return Err(SolverError::Range(format!(
                "final time {} is less than initial time {}",
                tf, t0
            )));
        }

        let max_steps = self.config.max_steps;
        let mut trajectory = Trajectory::with_capacity(initial_capacity(t0, tf, dt));
        let mut stats = Stats::default();

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
        trajectory.push(TrajectorySample::new(t, x.clone(), xdot.clone()))?;

        while t < tf {
            if stats.accepted_steps >= max_steps {
                warn!("RK4 hit the step limit ({}) at t = {}", max_steps, t);
                return Err(SolverError::Convergence {
                    what: "RK4 integration",
                    iterations: max_steps as usize,
                });
            }

            let remaining = tf - t;
            let h = dt.min(remaining);
            let t_next = if h >= remaining { tf } else { t + h };
            if t_next <= t {
                warn!("RK4 step {:e} is below the resolution of t = {}", h, t);
                return Err(SolverError::Convergence {
                    what: "RK4 integration",
                    iterations: stats.accepted_steps as usize,
                });
            }

            let x_next = rk4_step(f, t, &x, &xdot, h);
            let xdot_next = f.derivative(t_next, &x_next);
            stats.fn_evals += 4;
            if !is_finite(&x_next) || !is_finite(&xdot_next) {
                return Err(SolverError::NonFiniteState { t: t_next });
            }

            trajectory.push(TrajectorySample::new(t_next, x_next.clone(), xdot_next.clone()))?;
            stats.accepted_steps += 1;

            t = t_next;
            x = x_next;
            xdot = xdot_next;
        }

        debug!("RK4 reached t = {} in {} steps", t, stats.accepted_steps);

        self.stats = stats;
        self.trajectory = trajectory;
        Ok(&self.trajectory)
    }
}

impl Integrator for Rk4 {
    fn solve(&mut self, times: &[f64], dt: f64, _eps: f64) -> Result<Vec<State>> {
        let (_, _, t0) = self.problem.require()?;
        let tf = final_time(times, t0)?;
        self.integrate(tf, dt)?;
        resample(self.trajectory.samples(), times)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_step_is_fourth_order() {
        let f = |_t: f64, x: &State| x.clone();
        let x = State::from_vec(vec![1.0]);
        let next = rk4_step(&f, 0.0, &x, &x, 0.1);
        // Local error ~ h^5 / 120
        assert!((next[0] - 0.1_f64.exp()).abs() < 1e-6);
    }

    #[test]
    fn fixed_grid_lands_on_final_time() {
        let mut solver = Rk4::with_problem(
            |_t: f64, x: &State| -x,
            State::from_vec(vec![1.0]),
            0.0,
        );
        let traj = solver.integrate(1.0, 0.3).unwrap();
        let ts: Vec<f64> = traj.samples().iter().map(|s| s.t).collect();
        assert_eq!(ts.len(), 5);
        assert_eq!(*ts.last().unwrap(), 1.0);
        assert_eq!(solver.stats.accepted_steps, 4);
    }

    #[test]
    fn huge_span_hits_step_cap() {
        let mut solver = Rk4::with_problem(
            |_t: f64, x: &State| -x,
            State::from_vec(vec![1.0]),
            0.0,
        )
        .with_config(SolverConfig {
            max_steps: 1_000,
            ..SolverConfig::default()
        });
        assert!(matches!(
            solver.integrate(1e30, 1.0),
            Err(SolverError::Convergence { what: "RK4 integration", iterations: 1_000 })
        ));
    }

    #[test]
    fn step_below_time_resolution_reported() {
        let mut solver = Rk4::with_problem(
            |_t: f64, x: &State| -x,
            State::from_vec(vec![1.0]),
            1e20,
        );
        assert!(matches!(
            solver.integrate(2e20, 1.0),
            Err(SolverError::Convergence { .. })
        ));
    }

    #[test]
    fn interchangeable_with_adaptive() {
        use crate::integrator::AdaptiveRk45;

        let times: Vec<f64> = (0..=20).map(|i| 0.1 * i as f64).collect();
        let x0 = State::from_vec(vec![1.0, 0.0]);
        let osc = |_t: f64, x: &State| State::from_vec(vec![x[1], -x[0]]);

        let mut methods: Vec<Box<dyn Integrator>> = vec![
            Box::new(Rk4::with_problem(osc, x0.clone(), 0.0)),
            Box::new(AdaptiveRk45::with_problem(osc, x0.clone(), 0.0)),
        ];
        for m in methods.iter_mut() {
            let out = m.solve(&times, 0.01, 1e-10).unwrap();
            for (x, t) in out.iter().zip(times.iter()) {
                assert!((x[0] - t.cos()).abs() < 1e-7, "t = {}", t);
            }
        }
    }

    #[test]
    fn missing_configuration() {
        let mut solver = Rk4::new();
        assert!(matches!(
            solver.solve(&[0.0, 1.0], 0.1, 0.0),
            Err(SolverError::Configuration(_))
        ));
        solver.set_func(|_t: f64, x: &State| -x);
        solver.set_ic(State::from_vec(vec![1.0]), 0.0);
        assert!(solver.solve(&[0.0, 1.0], 0.1, 0.0).is_ok());
        solver.reset();
        assert!(solver.trajectory().is_empty());
    }
}
