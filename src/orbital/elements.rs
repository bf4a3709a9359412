use std::f64::consts::PI;

use nalgebra::{Matrix3, Rotation3, Vector3};

use crate::error::{Result, SolverError};

/// Classical Keplerian orbital elements with their gravitational parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitalElements {
    pub sma: f64,       // semi-major axis
    pub ecc: f64,       // eccentricity, [0, 1)
    pub inc: f64,       // inclination, rad
    pub raan: f64,      // right ascension of ascending node, rad
    pub argp: f64,      // argument of periapsis, rad
    pub true_anom: f64, // initial true anomaly, rad
    pub mu: f64,        // gravitational parameter
}

impl OrbitalElements {
    /// Elements in canonical units (`mu = 1`).
    pub fn new(sma: f64, ecc: f64, inc: f64, raan: f64, argp: f64, true_anom: f64) -> Self {
        Self {
            sma,
            ecc,
            inc,
            raan,
            argp,
            true_anom,
            mu: 1.0,
        }
    }

    pub fn with_mu(mut self, mu: f64) -> Self {
        self.mu = mu;
        self
    }

    /// Circular equatorial orbit of radius `sma` starting on the x-axis.
    pub fn circular(sma: f64) -> Self {
        Self::new(sma, 0.0, 0.0, 0.0, 0.0, 0.0)
    }

    /// Only closed orbits with positive size and mass are supported.
    pub fn validate(&self) -> Result<()> {
        let angles = [self.inc, self.raan, self.argp, self.true_anom];
        if !(self.sma.is_finite() && self.sma > 0.0) {
            return Err(SolverError::Configuration(format!(
                "semi-major axis must be positive, got {}",
                self.sma
            )));
        }
        if !(self.ecc >= 0.0 && self.ecc < 1.0) {
            return Err(SolverError::Configuration(format!(
                "eccentricity must lie in [0, 1), got {}",
                self.ecc
            )));
        }
        if !(self.mu.is_finite() && self.mu > 0.0) {
            return Err(SolverError::Configuration(format!(
                "gravitational parameter must be positive, got {}",
                self.mu
            )));
        }
        if angles.iter().any(|a| !a.is_finite()) {
            return Err(SolverError::Configuration(
                "orbital angles must be finite".to_string(),
            ));
        }
        Ok(())
    }

    /// Mean motion n = sqrt(mu / a^3).
    pub fn mean_motion(&self) -> f64 {
        (self.mu / self.sma.powi(3)).sqrt()
    }

    /// Orbital period 2 pi / n.
    pub fn period(&self) -> f64 {
        2.0 * PI / self.mean_motion()
    }

    /// Semi-latus rectum p = a (1 - e^2).
    pub fn semi_latus_rectum(&self) -> f64 {
        self.sma * (1.0 - self.ecc * self.ecc)
    }

    /// Eccentric anomaly for a true anomaly.
    /// tan(E/2) = sqrt((1 - e) / (1 + e)) tan(nu/2), quadrant-safe.
    pub fn eccentric_from_true(&self, nu: f64) -> f64 {
        let half = 0.5 * nu;
        2.0 * ((1.0 - self.ecc).sqrt() * half.sin()).atan2((1.0 + self.ecc).sqrt() * half.cos())
    }

    /// True anomaly for an eccentric anomaly.
    pub fn true_from_eccentric(&self, ecc_anom: f64) -> f64 {
        let half = 0.5 * ecc_anom;
        2.0 * ((1.0 + self.ecc).sqrt() * half.sin()).atan2((1.0 - self.ecc).sqrt() * half.cos())
    }

    /// Kepler's equation M = E - e sin E.
    pub fn mean_from_eccentric(&self, ecc_anom: f64) -> f64 {
        ecc_anom - self.ecc * ecc_anom.sin()
    }

    /// Perifocal (PQW) to reference frame: Rz(-raan) Rx(-inc) Rz(-argp)
    /// in passive-rotation notation, i.e. active rotations by the angles.
    pub fn perifocal_to_inertial(&self) -> Matrix3<f64> {
        let rz_raan = Rotation3::from_axis_angle(&Vector3::z_axis(), self.raan);
        let rx_inc = Rotation3::from_axis_angle(&Vector3::x_axis(), self.inc);
        let rz_argp = Rotation3::from_axis_angle(&Vector3::z_axis(), self.argp);
        (rz_raan * rx_inc * rz_argp).into_inner()
    }

    /// Position and velocity at the stored true anomaly.
    pub fn to_state_vector(&self) -> (Vector3<f64>, Vector3<f64>) {
        let nu = self.true_anom;
        let p = self.semi_latus_rectum();
        let r = p / (1.0 + self.ecc * nu.cos());

        let r_pqw = Vector3::new(r * nu.cos(), r * nu.sin(), 0.0);

        let sqrt_mu_p = (self.mu / p).sqrt();
        let v_pqw = Vector3::new(-sqrt_mu_p * nu.sin(), sqrt_mu_p * (self.ecc + nu.cos()), 0.0);

        let rot = self.perifocal_to_inertial();
        (rot * r_pqw, rot * v_pqw)
    }

    /// Recover elements from an inertial position and velocity.
    /// Only bound (elliptic) states are accepted.
    pub fn from_state_vector(pos: &Vector3<f64>, vel: &Vector3<f64>, mu: f64) -> Result<Self> {
        let r = pos.norm();
        let v = vel.norm();

        let energy = 0.5 * v * v - mu / r;
        if !(energy < 0.0) {
            return Err(SolverError::Configuration(format!(
                "state is not on a closed orbit (specific energy {})",
                energy
            )));
        }

        // Angular momentum
        let h = pos.cross(vel);
        let h_mag = h.norm();

        // Node vector
        let n = Vector3::new(-h.y, h.x, 0.0);
        let n_mag = n.norm();

        // Eccentricity vector
        let e_vec = ((v * v - mu / r) * pos - pos.dot(vel) * vel) / mu;
        let ecc = e_vec.norm();

        let sma = -mu / (2.0 * energy);
        let inc = (h.z / h_mag).clamp(-1.0, 1.0).acos();

        let raan = if n_mag > 1e-10 {
            let w = (n.x / n_mag).clamp(-1.0, 1.0).acos();
            if n.y < 0.0 { 2.0 * PI - w } else { w }
        } else {
            0.0
        };

        let argp = if ecc > 1e-10 {
            let w = if n_mag > 1e-10 {
                (n.dot(&e_vec) / (n_mag * ecc)).clamp(-1.0, 1.0).acos()
            } else {
                // Equatorial: measure from the x-axis in the orbit's sense
                e_vec.y.atan2(e_vec.x).rem_euclid(2.0 * PI)
            };
            if n_mag > 1e-10 && e_vec.z < 0.0 { 2.0 * PI - w } else { w }
        } else {
            0.0
        };

        let true_anom = if ecc > 1e-10 {
            let nu = (e_vec.dot(pos) / (ecc * r)).clamp(-1.0, 1.0).acos();
            if pos.dot(vel) < 0.0 { 2.0 * PI - nu } else { nu }
        } else if n_mag > 1e-10 {
            // Circular inclined: argument of latitude
            let u = (n.dot(pos) / (n_mag * r)).clamp(-1.0, 1.0).acos();
            if pos.z < 0.0 { 2.0 * PI - u } else { u }
        } else {
            // Circular equatorial: true longitude
            pos.y.atan2(pos.x).rem_euclid(2.0 * PI)
        };

        Ok(Self {
            sma,
            ecc,
            inc,
            raan,
            argp,
            true_anom,
            mu,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inclined() -> OrbitalElements {
        OrbitalElements::new(5.0, 0.5, PI / 3.0, PI / 4.0, PI / 6.0, 3.0 * PI / 4.0)
    }

    #[test]
    fn validation() {
        assert!(inclined().validate().is_ok());
        assert!(OrbitalElements::circular(-1.0).validate().is_err());
        assert!(OrbitalElements::new(1.0, 1.0, 0.0, 0.0, 0.0, 0.0).validate().is_err());
        assert!(OrbitalElements::circular(1.0).with_mu(0.0).validate().is_err());
    }

    #[test]
    fn unit_circle_period() {
        let orbit = OrbitalElements::circular(1.0);
        assert!((orbit.period() - 2.0 * PI).abs() < 1e-15);
        assert!((orbit.mean_motion() - 1.0).abs() < 1e-15);
    }

    #[test]
    fn anomaly_conversions_invert() {
        let orbit = inclined();
        for i in 0..12 {
            let nu = -PI + 0.5 * i as f64 + 0.1;
            let e = orbit.eccentric_from_true(nu);
            let back = orbit.true_from_eccentric(e);
            let diff = (back - nu).rem_euclid(2.0 * PI);
            assert!(diff < 1e-12 || (2.0 * PI - diff) < 1e-12, "nu = {}", nu);
        }
    }

    #[test]
    fn periapsis_and_apoapsis_radius() {
        let orbit = OrbitalElements { true_anom: 0.0, ..inclined() };
        let (r, _) = orbit.to_state_vector();
        assert!((r.norm() - 2.5).abs() < 1e-12);

        let orbit = OrbitalElements { true_anom: PI, ..inclined() };
        let (r, _) = orbit.to_state_vector();
        assert!((r.norm() - 7.5).abs() < 1e-12);
    }

    #[test]
    fn vis_viva_holds() {
        let orbit = inclined();
        let (r, v) = orbit.to_state_vector();
        let expected = orbit.mu * (2.0 / r.norm() - 1.0 / orbit.sma);
        assert!((v.norm_squared() - expected).abs() < 1e-12);
    }

    #[test]
    fn rotation_is_orthonormal() {
        let rot = inclined().perifocal_to_inertial();
        assert!((rot * rot.transpose() - Matrix3::identity()).norm() < 1e-14);
        // Orbit normal tilted by the inclination
        assert!((rot[(2, 2)] - (PI / 3.0).cos()).abs() < 1e-14);
    }

    #[test]
    fn state_vector_roundtrip() {
        let orbit = inclined();
        let (pos, vel) = orbit.to_state_vector();
        let back = OrbitalElements::from_state_vector(&pos, &vel, 1.0).unwrap();
        assert!((back.sma - orbit.sma).abs() < 1e-10);
        assert!((back.ecc - orbit.ecc).abs() < 1e-12);
        assert!((back.inc - orbit.inc).abs() < 1e-12);
        assert!((back.raan - orbit.raan).abs() < 1e-12);
        assert!((back.argp - orbit.argp).abs() < 1e-10);
        assert!((back.true_anom - orbit.true_anom).abs() < 1e-10);
    }

    #[test]
    fn escape_state_rejected() {
        let pos = Vector3::new(1.0, 0.0, 0.0);
        let vel = Vector3::new(0.0, 2.0, 0.0);
        assert!(OrbitalElements::from_state_vector(&pos, &vel, 1.0).is_err());
    }
}
