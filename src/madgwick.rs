//! Gradient-descent attitude observer
//!
//! Based on the work of Sebastian Madgwick:
//!
//! Madgwick, Estimation of IMU and MARG orientation using a gradient
//! descent algorithm. 2011 IEEE International Conference on
//! Rehabilitation Robotics (ICORR), 2011.
//!
//! One gradient-descent iteration per sample minimizes the error between
//! the gravity/field directions predicted by the current quaternion and
//! the measured, normalized accelerometer and magnetometer vectors.

use nalgebra::{Matrix6x4, Quaternion, UnitQuaternion, Vector2, Vector6};

use crate::math::{QuaternionExt, Vector3Ext};
use crate::traits::MargObserver;
use crate::types::MargSample;

/// Gradient step size
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MadgwickSettings {
    /// Corrective step gain (rad/s of assumed gyroscope error)
    pub beta: f32,
}

impl Default for MadgwickSettings {
    fn default() -> Self {
        Self { beta: 0.02 }
    }
}

/// Gradient-descent observer state
#[derive(Debug)]
pub struct Madgwick {
    settings: MadgwickSettings,
    quaternion: UnitQuaternion<f32>,
}

impl Madgwick {
    pub fn new(settings: MadgwickSettings) -> Self {
        Self::with_orientation(settings, UnitQuaternion::identity())
    }

    pub fn with_orientation(settings: MadgwickSettings, orientation: UnitQuaternion<f32>) -> Self {
        Madgwick {
            settings,
            quaternion: orientation,
        }
    }

    pub fn settings(&self) -> MadgwickSettings {
        self.settings
    }
}

impl Default for Madgwick {
    fn default() -> Self {
        Madgwick::new(MadgwickSettings::default())
    }
}

impl MargObserver for Madgwick {
    fn orientation(&self) -> UnitQuaternion<f32> {
        self.quaternion
    }

    fn set_orientation(&mut self, quat: UnitQuaternion<f32>) {
        self.quaternion = quat;
    }

    fn update(&mut self, sample: &MargSample, delta_time: f32) -> UnitQuaternion<f32> {
        let q = *self.quaternion.as_ref();

        // A sensor reading all-zero stays raw; the filter keeps running on
        // the remaining information instead of dividing by zero.
        let accel = sample.accelerometer.safe_normalize();
        let mag = sample.magnetometer.safe_normalize();

        // Reference direction of Earth's magnetic field: measured field
        // rotated into the frame implied by q, with the east component
        // collapsed to zero.
        let h = q * <Quaternion<f32> as QuaternionExt>::from_vector(mag) * q.conjugate();
        let b_x = Vector2::new(h.i, h.j).norm();
        let b_z = h.k;

        // Objective: predicted gravity and field directions against the
        // measured ones.
        let f = Vector6::new(
            2.0 * (q.i * q.k - q.w * q.j) - accel.x,
            2.0 * (q.w * q.i + q.j * q.k) - accel.y,
            2.0 * (0.5 - q.i * q.i - q.j * q.j) - accel.z,
            2.0 * b_x * (0.5 - q.j * q.j - q.k * q.k) + 2.0 * b_z * (q.i * q.k - q.w * q.j)
                - mag.x,
            2.0 * b_x * (q.i * q.j - q.w * q.k) + 2.0 * b_z * (q.w * q.i + q.j * q.k) - mag.y,
            2.0 * b_x * (q.w * q.j + q.i * q.k) + 2.0 * b_z * (0.5 - q.i * q.i - q.j * q.j)
                - mag.z,
        );

        // Analytic Jacobian of the objective in the quaternion components
        // (w, x, y, z).
        #[rustfmt::skip]
        let j = Matrix6x4::new(
            -2.0 * q.j,                          2.0 * q.k,                          -2.0 * q.w,                          2.0 * q.i,
             2.0 * q.i,                          2.0 * q.w,                           2.0 * q.k,                          2.0 * q.j,
             0.0,                               -4.0 * q.i,                          -4.0 * q.j,                          0.0,
            -2.0 * b_z * q.j,                    2.0 * b_z * q.k,                    -4.0 * b_x * q.j - 2.0 * b_z * q.w, -4.0 * b_x * q.k + 2.0 * b_z * q.i,
            -2.0 * b_x * q.k + 2.0 * b_z * q.i,  2.0 * b_x * q.j + 2.0 * b_z * q.w,   2.0 * b_x * q.i + 2.0 * b_z * q.k, -2.0 * b_x * q.w + 2.0 * b_z * q.j,
             2.0 * b_x * q.j,                    2.0 * b_x * q.k - 4.0 * b_z * q.i,   2.0 * b_x * q.w - 4.0 * b_z * q.j,  2.0 * b_x * q.i,
        );

        let gradient = j.transpose() * f;
        let gyro_rate = q * <Quaternion<f32> as QuaternionExt>::from_vector(sample.gyroscope) * 0.5;

        // A zero gradient carries no correction; integrate the gyroscope
        // alone rather than normalizing a zero vector.
        let gradient_norm = gradient.norm();
        let q_dot = if gradient_norm > 0.0 {
            let step = gradient / gradient_norm;
            let step = Quaternion::new(step.x, step.y, step.z, step.w);
            gyro_rate - step * self.settings.beta
        } else {
            gyro_rate
        };

        let integrated = q + q_dot * delta_time;
        self.quaternion = crate::math::renormalize_or_keep(integrated, self.quaternion);
        self.quaternion
    }
}
