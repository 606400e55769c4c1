//! Sensor calibration application
//!
//! The observers expect calibrated input: every raw triaxial reading is
//! transformed as `scale_matrix * (raw - bias)` before it reaches an
//! update call. The scale matrices and bias vectors themselves come from
//! an external fitting procedure; this module only applies them.

use nalgebra::{Matrix3, Vector3};

use crate::types::MargSample;

/// Scale matrix and bias offset for one triaxial sensor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorCalibration {
    /// 3x3 scale / axis-alignment matrix
    pub scale: Matrix3<f32>,
    /// Bias subtracted before scaling
    pub bias: Vector3<f32>,
}

impl SensorCalibration {
    pub fn new(scale: Matrix3<f32>, bias: Vector3<f32>) -> Self {
        Self { scale, bias }
    }

    /// Pass-through calibration
    pub fn identity() -> Self {
        Self {
            scale: Matrix3::identity(),
            bias: Vector3::zeros(),
        }
    }

    /// Apply `scale * (raw - bias)`
    pub fn apply(&self, raw: Vector3<f32>) -> Vector3<f32> {
        self.scale * (raw - self.bias)
    }
}

impl Default for SensorCalibration {
    fn default() -> Self {
        Self::identity()
    }
}

/// Calibration parameters for a complete magneto-inertial unit
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MargCalibration {
    pub accelerometer: SensorCalibration,
    pub magnetometer: SensorCalibration,
    pub gyroscope: SensorCalibration,
}

impl MargCalibration {
    /// Calibrate all three sub-vectors of a raw sample
    pub fn apply(&self, raw: &MargSample) -> MargSample {
        MargSample {
            accelerometer: self.accelerometer.apply(raw.accelerometer),
            magnetometer: self.magnetometer.apply(raw.magnetometer),
            gyroscope: self.gyroscope.apply(raw.gyroscope),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vector3Ext;

    #[test]
    fn test_scale_and_bias_application() {
        let scale = Matrix3::from_diagonal(&Vector3::new(0.5, 0.5, 0.5));
        let bias = Vector3::new(0.1, 0.2, 0.3);
        let calibration = SensorCalibration::new(scale, bias);

        let calibrated = calibration.apply(Vector3::new(1.0, 2.0, 3.0));
        // (raw - bias) * 0.5
        let expected = Vector3::new(0.45, 0.9, 1.35);

        assert!((calibrated - expected).magnitude() < 1e-6);
    }

    #[test]
    fn test_identity_is_pass_through() {
        let raw = Vector3::new(-2.0, 7.0, 0.25);
        assert_eq!(SensorCalibration::identity().apply(raw), raw);
    }

    #[test]
    fn test_unit_calibration_applies_per_sensor() {
        let calibration = MargCalibration {
            accelerometer: SensorCalibration::new(
                Matrix3::identity() * 2.0,
                Vector3::new(1.0, 0.0, 0.0),
            ),
            magnetometer: SensorCalibration::new(
                Matrix3::identity(),
                Vector3::new(10.0, 20.0, 30.0),
            ),
            gyroscope: SensorCalibration::identity(),
        };

        let raw = MargSample::new(
            Vector3::new(2.0, 0.0, 5.0),
            Vector3::new(100.0, 200.0, 300.0),
            Vector3::new(0.1, 0.2, 0.3),
        );
        let calibrated = calibration.apply(&raw);

        assert!((calibrated.accelerometer - Vector3::new(2.0, 0.0, 10.0)).magnitude() < 1e-6);
        assert!((calibrated.magnetometer - Vector3::new(90.0, 180.0, 270.0)).magnitude() < 1e-6);
        assert_eq!(calibrated.gyroscope, raw.gyroscope);
    }
}
