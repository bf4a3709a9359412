use std::fmt;
use std::str::FromStr;

use log::debug;
use nalgebra::{Matrix3, Vector3};

use crate::error::{Result, SolverError};
use crate::orbital::elements::OrbitalElements;
use crate::orbital::newton::solve_kepler;
use crate::state::State;

// ---------------------------------------------------------------------------
// Anomaly selection
// ---------------------------------------------------------------------------

/// Which angle a position along the orbit is given in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnomalyType {
    True,
    Mean,
    Eccentric,
}

impl FromStr for AnomalyType {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(AnomalyType::True),
            "mean" => Ok(AnomalyType::Mean),
            "eccentric" => Ok(AnomalyType::Eccentric),
            other => Err(SolverError::UnsupportedOption(format!(
                "anomaly type '{}' (expected true, mean or eccentric)",
                other
            ))),
        }
    }
}

impl fmt::Display for AnomalyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnomalyType::True => "true",
            AnomalyType::Mean => "mean",
            AnomalyType::Eccentric => "eccentric",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Propagator
// ---------------------------------------------------------------------------

/// Settings for the embedded Kepler-equation solver.
#[derive(Debug, Clone)]
pub struct KeplerConfig {
    pub max_iterations: usize,
    /// Tolerance used by `get_state` for mean anomalies
    pub tolerance: f64,
}

impl Default for KeplerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            tolerance: 1e-6,
        }
    }
}

/// Closed-form two-body propagator.
///
/// Mean motion and the initial eccentric anomaly are computed once at
/// construction, together with the perifocal-to-inertial rotation.
#[derive(Debug, Clone)]
pub struct KeplerPropagator {
    elements: OrbitalElements,
    mean_motion: f64,
    ecc_anom0: f64,
    rotation: Matrix3<f64>,
    config: KeplerConfig,
}

impl KeplerPropagator {
    pub fn new(elements: OrbitalElements) -> Result<Self> {
        elements.validate()?;
        Ok(Self {
            mean_motion: elements.mean_motion(),
            ecc_anom0: elements.eccentric_from_true(elements.true_anom),
            rotation: elements.perifocal_to_inertial(),
            elements,
            config: KeplerConfig::default(),
        })
    }

    pub fn with_config(mut self, config: KeplerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn elements(&self) -> &OrbitalElements {
        &self.elements
    }

    pub fn mean_motion(&self) -> f64 {
        self.mean_motion
    }

    /// Eccentric anomaly at the initial true anomaly.
    pub fn initial_eccentric_anomaly(&self) -> f64 {
        self.ecc_anom0
    }

    /// State `[r, v]` (6 components) at the given anomaly.
    pub fn get_state(&self, anomaly: f64, kind: AnomalyType) -> Result<State> {
        let ecc_anom = match kind {
            AnomalyType::True => self.elements.eccentric_from_true(anomaly),
            AnomalyType::Mean => solve_kepler(
                anomaly,
                self.elements.ecc,
                self.config.tolerance,
                self.config.max_iterations,
            )?,
            AnomalyType::Eccentric => anomaly,
        };
        Ok(self.state_at_eccentric(ecc_anom))
    }

    /// Like [`get_state`](Self::get_state) with the anomaly type given by
    /// name ("true", "mean" or "eccentric").
    pub fn get_state_named(&self, anomaly: f64, kind: &str) -> Result<State> {
        self.get_state(anomaly, kind.parse()?)
    }

    /// States at `times`. The first entry is the state at the initial true
    /// anomaly; later entries advance the mean anomaly by `n * dt` between
    /// consecutive times and solve Kepler's equation to `eps`.
    pub fn solve(&self, times: &[f64], eps: f64) -> Result<Vec<State>> {
        if let Some(t) = times.iter().find(|t| !t.is_finite()) {
            return Err(SolverError::Range(format!("requested time {} is not finite", t)));
        }

        let mut out = Vec::with_capacity(times.len());
        if times.is_empty() {
            return Ok(out);
        }
        out.push(self.get_state(self.elements.true_anom, AnomalyType::True)?);

        let mut mean_anom = self.elements.mean_from_eccentric(self.ecc_anom0);
        for w in times.windows(2) {
            mean_anom += self.mean_motion * (w[1] - w[0]);
            let ecc_anom = solve_kepler(
                mean_anom,
                self.elements.ecc,
                eps,
                self.config.max_iterations,
            )?;
            out.push(self.state_at_eccentric(ecc_anom));
        }

        debug!(
            "Kepler propagation produced {} states (a = {}, e = {})",
            out.len(),
            self.elements.sma,
            self.elements.ecc
        );
        Ok(out)
    }

    fn state_at_eccentric(&self, ecc_anom: f64) -> State {
        let a = self.elements.sma;
        let e = self.elements.ecc;
        let (sin_e, cos_e) = ecc_anom.sin_cos();
        let b_over_a = (1.0 - e * e).sqrt();

        let r_pqw = Vector3::new(a * (cos_e - e), a * b_over_a * sin_e, 0.0);
        let speed = a * self.mean_motion / (1.0 - e * cos_e);
        let v_pqw = Vector3::new(-speed * sin_e, speed * b_over_a * cos_e, 0.0);

        let r = self.rotation * r_pqw;
        let v = self.rotation * v_pqw;
        State::from_iterator(6, r.iter().chain(v.iter()).copied())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn inclined() -> KeplerPropagator {
        KeplerPropagator::new(OrbitalElements::new(
            5.0,
            0.5,
            PI / 3.0,
            PI / 4.0,
            PI / 6.0,
            3.0 * PI / 4.0,
        ))
        .unwrap()
    }

    fn close(a: &State, b: &State, tol: f64) -> bool {
        (a - b).amax() < tol
    }

    #[test]
    fn invalid_elements_rejected() {
        let r = KeplerPropagator::new(OrbitalElements::new(1.0, 1.5, 0.0, 0.0, 0.0, 0.0));
        assert!(matches!(r, Err(SolverError::Configuration(_))));
    }

    #[test]
    fn anomaly_type_names() {
        assert_eq!("true".parse::<AnomalyType>().unwrap(), AnomalyType::True);
        assert_eq!(" Mean ".parse::<AnomalyType>().unwrap(), AnomalyType::Mean);
        assert_eq!(AnomalyType::Eccentric.to_string(), "eccentric");
        assert!(matches!(
            "parabolic".parse::<AnomalyType>(),
            Err(SolverError::UnsupportedOption(_))
        ));
    }

    #[test]
    fn unknown_anomaly_name_rejected() {
        let prop = inclined();
        assert!(matches!(
            prop.get_state_named(0.3, "hyperbolic"),
            Err(SolverError::UnsupportedOption(_))
        ));
        assert!(prop.get_state_named(0.3, "true").is_ok());
    }

    #[test]
    fn anomaly_paths_agree() {
        let prop = inclined();
        let elements = *prop.elements();
        let nu = 1.1;
        let ecc_anom = elements.eccentric_from_true(nu);
        let mean_anom = elements.mean_from_eccentric(ecc_anom);

        let from_true = prop.get_state(nu, AnomalyType::True).unwrap();
        let from_ecc = prop.get_state(ecc_anom, AnomalyType::Eccentric).unwrap();
        let from_mean = prop
            .with_config(KeplerConfig {
                tolerance: 1e-13,
                ..KeplerConfig::default()
            })
            .get_state(mean_anom, AnomalyType::Mean)
            .unwrap();

        assert!(close(&from_true, &from_ecc, 1e-14));
        assert!(close(&from_true, &from_mean, 1e-12));
    }

    #[test]
    fn matches_element_conversion() {
        let prop = inclined();
        let (r, v) = prop.elements().to_state_vector();
        let x = prop.get_state(prop.elements().true_anom, AnomalyType::True).unwrap();
        for i in 0..3 {
            assert!((x[i] - r[i]).abs() < 1e-12);
            assert!((x[3 + i] - v[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn circular_orbit_closed_form() {
        let prop = KeplerPropagator::new(OrbitalElements::circular(1.0)).unwrap();
        let times: Vec<f64> = (0..=8).map(|i| 0.25 * PI * i as f64).collect();
        let out = prop.solve(&times, 1e-12).unwrap();
        for (x, t) in out.iter().zip(times.iter()) {
            let expected = State::from_vec(vec![t.cos(), t.sin(), 0.0, -t.sin(), t.cos(), 0.0]);
            assert!(close(x, &expected, 1e-12), "t = {}", t);
        }
    }

    #[test]
    fn full_period_returns_to_start() {
        let prop = inclined();
        let period = prop.elements().period();
        let out = prop.solve(&[0.0, 0.5 * period, period], 1e-13).unwrap();
        assert!(close(&out[0], &out[2], 1e-10));
        assert!(!close(&out[0], &out[1], 1e-3));
    }

    #[test]
    fn energy_and_momentum_conserved() {
        let prop = inclined();
        let period = prop.elements().period();
        let times: Vec<f64> = (0..50).map(|i| period * i as f64 / 49.0).collect();
        let out = prop.solve(&times, 1e-12).unwrap();

        let invariants = |x: &State| {
            let r = Vector3::new(x[0], x[1], x[2]);
            let v = Vector3::new(x[3], x[4], x[5]);
            (0.5 * v.norm_squared() - 1.0 / r.norm(), r.cross(&v))
        };
        let (e0, h0) = invariants(&out[0]);
        assert!((e0 + 1.0 / (2.0 * 5.0)).abs() < 1e-12);
        for x in &out {
            let (e, h) = invariants(x);
            assert!((e - e0).abs() < 1e-12);
            assert!((h - h0).norm() < 1e-12);
        }
    }

    #[test]
    fn tolerance_tighter_than_rounding() {
        let prop = inclined();
        let period = prop.elements().period();
        let times: Vec<f64> = (0..10_000).map(|i| period * i as f64 / 9_999.0).collect();
        let tight = prop.solve(&times, 1e-15).unwrap();
        let loose = prop.solve(&times, 1e-12).unwrap();
        for (a, b) in tight.iter().zip(loose.iter()) {
            assert!(close(a, b, 1e-11));
        }
    }

    #[test]
    fn cached_initial_anomaly() {
        let prop = inclined();
        let ecc_anom0 = prop.initial_eccentric_anomaly();
        assert!((prop.elements().true_from_eccentric(ecc_anom0) - 3.0 * PI / 4.0).abs() < 1e-14);

        let from_cache = prop.get_state(ecc_anom0, AnomalyType::Eccentric).unwrap();
        let first = prop.solve(&[0.0, 1.0], 1e-12).unwrap();
        assert_eq!(from_cache, first[0]);
    }

    #[test]
    fn empty_request() {
        assert!(inclined().solve(&[], 1e-8).unwrap().is_empty());
    }

    #[test]
    fn single_request_is_initial_state() {
        let prop = inclined();
        let out = prop.solve(&[3.0], 1e-8).unwrap();
        let x0 = prop.get_state(3.0 * PI / 4.0, AnomalyType::True).unwrap();
        assert_eq!(out, vec![x0]);
    }
}
