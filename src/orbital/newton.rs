use std::f64::consts::PI;

use log::{trace, warn};

use crate::error::{Result, SolverError};

/// Corrections this many ulps (relative to `max(|x|, 1)`) or smaller are
/// noise from evaluating `f`.
const ROUNDING_FLOOR: f64 = 16.0 * f64::EPSILON;

// ---------------------------------------------------------------------------
// Newton-Raphson root finding
// ---------------------------------------------------------------------------

/// Newton-Raphson iteration on `f` with derivative `df`.
///
/// Applies `x += -f(x) / df(x)` until the correction falls below `tol`,
/// or below the rounding floor of `x` when `tol` is tighter than `x` can
/// resolve. The last correction is applied before returning. Fails after
/// `max_iter` corrections or on a non-finite correction.
pub fn newton_raphson<F, D>(
    f: F,
    df: D,
    x0: f64,
    tol: f64,
    max_iter: usize,
    what: &'static str,
) -> Result<f64>
where
    F: Fn(f64) -> f64,
    D: Fn(f64) -> f64,
{
    let mut x = x0;
    for iter in 1..=max_iter {
        let delta = -f(x) / df(x);
        if !delta.is_finite() {
            warn!("{}: non-finite Newton correction at x = {}", what, x);
            return Err(SolverError::Convergence { what, iterations: iter });
        }
        x += delta;
        trace!("{}: iteration {} x = {} delta = {:e}", what, iter, x, delta);
        if delta.abs() < tol || delta.abs() <= ROUNDING_FLOOR * x.abs().max(1.0) {
            return Ok(x);
        }
    }
    warn!("{}: no convergence in {} iterations (x = {})", what, max_iter, x);
    Err(SolverError::Convergence {
        what,
        iterations: max_iter,
    })
}

/// Solve Kepler's equation `E - e sin E = M` for the eccentric anomaly.
///
/// `M` is reduced to `[0, 2 pi)` for the iteration and the whole turns are
/// added back, so `E - e sin E` reproduces the caller's `M`.
///
/// The start value is `E = M` only for `e < 0.8`. For `e >= 0.8` the
/// iteration starts from `E = pi` instead of `E = M`: Kepler's equation is
/// convex on `[0, pi]` and concave on `[pi, 2 pi]`, so that start converges
/// monotonically where `E = M` can overshoot.
pub fn solve_kepler(mean_anom: f64, ecc: f64, tol: f64, max_iter: usize) -> Result<f64> {
    if !(ecc >= 0.0 && ecc < 1.0) {
        return Err(SolverError::Configuration(format!(
            "Kepler solver needs 0 <= e < 1, got {}",
            ecc
        )));
    }
    if !mean_anom.is_finite() {
        return Err(SolverError::Range(format!(
            "mean anomaly must be finite, got {}",
            mean_anom
        )));
    }
    if !(tol.is_finite() && tol > 0.0) {
        return Err(SolverError::Configuration(format!(
            "tolerance must be positive and finite, got {}",
            tol
        )));
    }

    let turns = mean_anom - mean_anom.rem_euclid(2.0 * PI);
    let m = mean_anom - turns;
    let guess = if ecc < 0.8 { m } else { PI };

    let ecc_anom = newton_raphson(
        |e_anom| e_anom - ecc * e_anom.sin() - m,
        |e_anom| 1.0 - ecc * e_anom.cos(),
        guess,
        tol,
        max_iter,
        "Kepler equation",
    )?;

    Ok(ecc_anom + turns)
}
