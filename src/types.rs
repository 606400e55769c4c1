//! Core sample types and boundary validation

use nalgebra::Vector3;
use thiserror::Error;

/// A single calibrated magneto-inertial sample
///
/// Carries one simultaneous reading of all three sensors, already
/// calibrated (see [`crate::calibration`]): accelerometer in m/s²,
/// magnetometer in any consistent field unit, gyroscope in rad/s.
///
/// Samples are consumed read-only by the observers; an update never
/// mutates caller data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MargSample {
    /// Accelerometer reading in m/s²
    pub accelerometer: Vector3<f32>,
    /// Magnetometer reading, any consistent unit
    pub magnetometer: Vector3<f32>,
    /// Gyroscope reading in rad/s
    pub gyroscope: Vector3<f32>,
}

impl MargSample {
    pub fn new(
        accelerometer: Vector3<f32>,
        magnetometer: Vector3<f32>,
        gyroscope: Vector3<f32>,
    ) -> Self {
        Self {
            accelerometer,
            magnetometer,
            gyroscope,
        }
    }

    /// Build a sample from the flat `[ax, ay, az, mx, my, mz, gx, gy, gz]`
    /// layout used by log converters and acquisition front ends.
    pub fn from_array(z: [f32; 9]) -> Self {
        Self {
            accelerometer: Vector3::new(z[0], z[1], z[2]),
            magnetometer: Vector3::new(z[3], z[4], z[5]),
            gyroscope: Vector3::new(z[6], z[7], z[8]),
        }
    }

    /// Flatten back to the `[ax, ay, az, mx, my, mz, gx, gy, gz]` layout
    pub fn to_array(&self) -> [f32; 9] {
        [
            self.accelerometer.x,
            self.accelerometer.y,
            self.accelerometer.z,
            self.magnetometer.x,
            self.magnetometer.y,
            self.magnetometer.z,
            self.gyroscope.x,
            self.gyroscope.y,
            self.gyroscope.z,
        ]
    }

    /// Reject samples carrying NaN or infinite components
    ///
    /// The observers themselves never raise on noisy data; non-finite
    /// input is the one malformed case that must be caught here at the
    /// boundary before it propagates through the recursive state.
    pub fn validate(&self) -> Result<(), InvalidSample> {
        if !is_finite(self.accelerometer) {
            return Err(InvalidSample::Accelerometer);
        }
        if !is_finite(self.magnetometer) {
            return Err(InvalidSample::Magnetometer);
        }
        if !is_finite(self.gyroscope) {
            return Err(InvalidSample::Gyroscope);
        }
        Ok(())
    }
}

fn is_finite(v: Vector3<f32>) -> bool {
    v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
}

/// A sample was rejected at the input boundary
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InvalidSample {
    #[error("accelerometer reading contains a non-finite component")]
    Accelerometer,
    #[error("magnetometer reading contains a non-finite component")]
    Magnetometer,
    #[error("gyroscope reading contains a non-finite component")]
    Gyroscope,
}
