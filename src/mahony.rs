//! Complementary cross-product attitude observer
//!
//! Based on the work of Robert Mahony:
//!
//! Mahony, R., T. Hamel, and J.-M. Pflimlin, Nonlinear Complementary
//! Filters on the Special Orthogonal Group. IEEE Transactions on
//! Automatic Control, 2008. 53(5): p. 1203-1218.
//!
//! Proportional (plus optional integral) feedback built from cross
//! products between the measured and the estimated reference directions.
//! The accelerometer and magnetometer error terms contribute equally;
//! there is no relative weighting between the two.

use nalgebra::{Quaternion, UnitQuaternion, Vector2, Vector3};

use crate::math::{QuaternionExt, Vector3Ext};
use crate::traits::MargObserver;
use crate::types::MargSample;

/// Feedback gains
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MahonySettings {
    /// Proportional gain
    pub kp: f32,
    /// Integral gain; zero disables the integral term entirely
    pub ki: f32,
}

impl Default for MahonySettings {
    fn default() -> Self {
        Self { kp: 0.5, ki: 0.0 }
    }
}

/// Complementary observer state
///
/// The integral-error accumulator lives here, one per observer instance;
/// two sensor streams never share it.
#[derive(Debug)]
pub struct Mahony {
    settings: MahonySettings,
    quaternion: UnitQuaternion<f32>,
    integral_error: Vector3<f32>,
}

impl Mahony {
    pub fn new(settings: MahonySettings) -> Self {
        Self::with_orientation(settings, UnitQuaternion::identity())
    }

    pub fn with_orientation(settings: MahonySettings, orientation: UnitQuaternion<f32>) -> Self {
        Mahony {
            settings,
            quaternion: orientation,
            integral_error: Vector3::zeros(),
        }
    }

    pub fn settings(&self) -> MahonySettings {
        self.settings
    }

    /// Accumulated integral error (zero while `ki == 0`)
    pub fn integral_error(&self) -> Vector3<f32> {
        self.integral_error
    }
}

impl Default for Mahony {
    fn default() -> Self {
        Mahony::new(MahonySettings::default())
    }
}

impl MargObserver for Mahony {
    fn orientation(&self) -> UnitQuaternion<f32> {
        self.quaternion
    }

    fn set_orientation(&mut self, quat: UnitQuaternion<f32>) {
        self.integral_error = Vector3::zeros();
        self.quaternion = quat;
    }

    fn update(&mut self, sample: &MargSample, delta_time: f32) -> UnitQuaternion<f32> {
        let q = *self.quaternion.as_ref();

        let accel = sample.accelerometer.safe_normalize();
        let mag = sample.magnetometer.safe_normalize();

        // Reference direction of Earth's magnetic field, east collapsed
        let h = q * <Quaternion<f32> as QuaternionExt>::from_vector(mag) * q.conjugate();
        let b_x = Vector2::new(h.i, h.j).norm();
        let b_z = h.k;

        // Estimated direction of gravity and magnetic field
        let v = Vector3::new(
            2.0 * (q.i * q.k - q.w * q.j),
            2.0 * (q.w * q.i + q.j * q.k),
            q.w * q.w - q.i * q.i - q.j * q.j + q.k * q.k,
        );
        let w = Vector3::new(
            2.0 * b_x * (0.5 - q.j * q.j - q.k * q.k) + 2.0 * b_z * (q.i * q.k - q.w * q.j),
            2.0 * b_x * (q.i * q.j - q.w * q.k) + 2.0 * b_z * (q.w * q.i + q.j * q.k),
            2.0 * b_x * (q.w * q.j + q.i * q.k) + 2.0 * b_z * (0.5 - q.i * q.i - q.j * q.j),
        );

        // Error is the sum of cross products between the measured and the
        // estimated direction of each field.
        let error = accel.cross(&v) + mag.cross(&w);

        if self.settings.ki > 0.0 {
            self.integral_error += error * delta_time;
        }

        let corrected =
            sample.gyroscope + error * self.settings.kp + self.integral_error * self.settings.ki;

        let q_dot = q * <Quaternion<f32> as QuaternionExt>::from_vector(corrected) * 0.5;
        let integrated = q + q_dot * delta_time;
        self.quaternion = crate::math::renormalize_or_keep(integrated, self.quaternion);
        self.quaternion
    }
}
