pub mod hermite;

pub use hermite::CubicHermiteSpline;

use log::trace;

use crate::error::{Result, SolverError};
use crate::state::{State, TrajectorySample};

/// Evaluates a model fitted to a bracket of solved samples.
pub trait Interpolator {
    fn evaluate(&self, t: f64) -> State;
}

// ---------------------------------------------------------------------------
// Resampling onto requested times
// ---------------------------------------------------------------------------

/// Map an ordered sample sequence onto `times`.
///
/// `times` must be non-decreasing and lie inside the sampled span. An exact
/// hit on a sample time returns that sample's state; anything else is
/// interpolated with a Hermite segment over the enclosing bracket. The
/// segment is only rebuilt when the bracket moves.
pub fn resample(samples: &[TrajectorySample], times: &[f64]) -> Result<Vec<State>> {
    let (out, segments) = resample_segments(samples, times)?;
    trace!(
        "resampled {} times from {} samples using {} spline segments",
        times.len(),
        samples.len(),
        segments.len()
    );
    Ok(out)
}

/// The resampling scan; also returns the bracket of every spline built,
/// in build order.
fn resample_segments(
    samples: &[TrajectorySample],
    times: &[f64],
) -> Result<(Vec<State>, Vec<(f64, f64)>)> {
    let (first, last) = match (samples.first(), samples.last()) {
        (Some(f), Some(l)) => (f, l),
        _ if times.is_empty() => return Ok((Vec::new(), Vec::new())),
        _ => {
            return Err(SolverError::Configuration(
                "no samples to resample".to_string(),
            ))
        }
    };

    if let Some(t) = times.iter().find(|t| !t.is_finite()) {
        return Err(SolverError::Range(format!("requested time {} is not finite", t)));
    }
    if let Some(w) = times.windows(2).find(|w| !(w[1] >= w[0])) {
        return Err(SolverError::Range(format!(
            "requested times must be non-decreasing ({} follows {})",
            w[1], w[0]
        )));
    }
    if let (Some(&lo), Some(&hi)) = (times.first(), times.last()) {
        if lo < first.t || hi > last.t {
            return Err(SolverError::Range(format!(
                "requested span [{}, {}] outside solved span [{}, {}]",
                lo, hi, first.t, last.t
            )));
        }
    }

    let mut out = Vec::with_capacity(times.len());
    let mut built = Vec::new();
    let mut j = 0usize;
    let mut segment: Option<(usize, CubicHermiteSpline)> = None;

    for &t in times {
        // Advance until samples[j] <= t <= samples[j + 1]
        while j + 1 < samples.len() && samples[j + 1].t < t {
            j += 1;
        }

        let lower = &samples[j];
        if t == lower.t {
            out.push(lower.x.clone());
            continue;
        }
        let upper = &samples[j + 1];
        if t == upper.t {
            out.push(upper.x.clone());
            continue;
        }

        if segment.as_ref().map_or(true, |(idx, _)| *idx != j) {
            let spline = CubicHermiteSpline::new(lower, upper)?;
            built.push(spline.bounds());
            segment = Some((j, spline));
        }
        if let Some((_, spline)) = &segment {
            out.push(spline.evaluate(t));
        }
    }

    Ok((out, built))
}
