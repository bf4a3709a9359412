use nalgebra::{Matrix3, Quaternion, Vector3};

use crate::dynamics::Dynamics;
use crate::error::{Result, SolverError};
use crate::state::State;

// ---------------------------------------------------------------------------
// Rigid-body rotation: Euler's equations + quaternion kinematics
// ---------------------------------------------------------------------------

/// Rigid body under a constant body-frame torque.
///
/// State layout:
///   [0..3]  angular velocity, body frame (rad/s)
///   [3..7]  attitude quaternion, scalar first (optional)
///
/// A 3-state integrates the rates only; a 7-state also carries attitude.
#[derive(Debug, Clone)]
pub struct RigidBody {
    inertia: Matrix3<f64>,
    inertia_inv: Matrix3<f64>,
    pub torque: Vector3<f64>,
}

impl RigidBody {
    /// Build from a full inertia tensor. A singular tensor is rejected.
    pub fn new(inertia: Matrix3<f64>, torque: Vector3<f64>) -> Result<Self> {
        let inertia_inv = inertia.try_inverse().ok_or_else(|| {
            SolverError::Configuration("inertia tensor is singular".to_string())
        })?;
        Ok(Self {
            inertia,
            inertia_inv,
            torque,
        })
    }

    /// Torque-free body with principal moments on the diagonal.
    pub fn torque_free(principal: Vector3<f64>) -> Result<Self> {
        Self::new(Matrix3::from_diagonal(&principal), Vector3::zeros())
    }

    pub fn inertia(&self) -> &Matrix3<f64> {
        &self.inertia
    }

    /// Euler's equation: I * domega = M - omega x (I * omega)
    pub fn angular_acceleration(&self, omega: &Vector3<f64>) -> Vector3<f64> {
        let h = self.inertia * omega;
        self.inertia_inv * (self.torque - omega.cross(&h))
    }

    /// Rotational kinetic energy, 1/2 * omega' I omega.
    pub fn kinetic_energy(&self, omega: &Vector3<f64>) -> f64 {
        0.5 * omega.dot(&(self.inertia * omega))
    }

    /// Angular momentum magnitude |I * omega|.
    pub fn angular_momentum(&self, omega: &Vector3<f64>) -> f64 {
        (self.inertia * omega).norm()
    }
}

/// dq/dt = 0.5 * q * (0, omega), with q normalized first.
/// `q` is scalar first: [w, x, y, z].
pub fn quaternion_rates(q: &[f64; 4], omega: &Vector3<f64>) -> [f64; 4] {
    let q = Quaternion::new(q[0], q[1], q[2], q[3]);
    let norm = q.norm();
    let q = if norm > 0.0 { q / norm } else { q };
    let omega_quat = Quaternion::new(0.0, omega.x, omega.y, omega.z);
    let dq = q * omega_quat * 0.5;
    [dq.w, dq.i, dq.j, dq.k]
}

impl Dynamics for RigidBody {
    fn derivative(&self, _t: f64, x: &State) -> State {
        let omega = x.fixed_rows::<3>(0).into_owned();
        let mut xdot = State::zeros(x.len());
        xdot.fixed_rows_mut::<3>(0)
            .copy_from(&self.angular_acceleration(&omega));

        if x.len() >= 7 {
            let q = [x[3], x[4], x[5], x[6]];
            let dq = quaternion_rates(&q, &omega);
            for (i, v) in dq.iter().enumerate() {
                xdot[3 + i] = *v;
            }
        }
        xdot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singular_inertia_rejected() {
        let r = RigidBody::torque_free(Vector3::new(1.0, 0.0, 3.0));
        assert!(matches!(r, Err(SolverError::Configuration(_))));
    }

    #[test]
    fn spin_about_principal_axis_is_steady() {
        let body = RigidBody::torque_free(Vector3::new(1.0, 2.0, 3.0)).unwrap();
        let domega = body.angular_acceleration(&Vector3::new(0.0, 0.0, 2.0));
        assert!(domega.norm() < 1e-15);
    }

    #[test]
    fn torque_drives_spin_up() {
        let body = RigidBody::new(
            Matrix3::from_diagonal(&Vector3::new(2.0, 2.0, 4.0)),
            Vector3::new(0.0, 0.0, 8.0),
        )
        .unwrap();
        let domega = body.angular_acceleration(&Vector3::zeros());
        assert!((domega.z - 2.0).abs() < 1e-15);
    }

    #[test]
    fn quaternion_rate_identity_attitude() {
        // From identity, dq = 0.5 * (0, omega)
        let dq = quaternion_rates(&[1.0, 0.0, 0.0, 0.0], &Vector3::new(0.2, -0.4, 1.0));
        assert!(dq[0].abs() < 1e-15);
        assert!((dq[1] - 0.1).abs() < 1e-15);
        assert!((dq[2] + 0.2).abs() < 1e-15);
        assert!((dq[3] - 0.5).abs() < 1e-15);
    }

    #[test]
    fn quaternion_rate_preserves_norm() {
        // d/dt |q|^2 = 2 q . dq = 0 for unit q
        let q = [0.5, 0.5, 0.5, 0.5];
        let dq = quaternion_rates(&q, &Vector3::new(0.3, 1.1, -0.7));
        let dot: f64 = q.iter().zip(dq.iter()).map(|(a, b)| a * b).sum();
        assert!(dot.abs() < 1e-15);
    }

    #[test]
    fn seven_state_layout() {
        let body = RigidBody::torque_free(Vector3::new(1.0, 2.0, 3.0)).unwrap();
        let x = State::from_vec(vec![1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0]);
        let d = body.derivative(0.0, &x);
        assert_eq!(d.len(), 7);
        // (I2 - I3) w2 w3 / I1 = -1
        assert!((d[0] + 1.0).abs() < 1e-15);
        assert!((d[4] - 0.5).abs() < 1e-15);
    }
}
