//! Mathematical utilities and nalgebra extensions shared by every observer
//!
//! The Hamilton product, conjugation and the Euclidean norm come straight
//! from [`nalgebra::Quaternion`]. The extensions here cover what the
//! observers additionally rely on: pure-vector quaternion construction,
//! zero-guarded normalization and Euler angle conversions.
//!
//! Two norms are in play and must not be confused: `norm()` is Euclidean,
//! `norm_squared()` is the sum of squares. The Martin observer's stability
//! terms are defined on the squared norm; everything else uses the
//! Euclidean one.

use nalgebra::{Quaternion, UnitQuaternion, Vector3};

/// Mathematical constants
pub const DEG_TO_RAD: f32 = core::f32::consts::PI / 180.0;
pub const RAD_TO_DEG: f32 = 180.0 / core::f32::consts::PI;

/// Extension trait for Vector3 operations
pub trait Vector3Ext {
    /// Calculate the magnitude of the vector
    fn magnitude(&self) -> f32;

    /// Normalize the vector, returning the zero vector if magnitude is zero
    fn safe_normalize(&self) -> Vector3<f32>;

    /// Convert degrees to radians
    fn deg_to_rad(&self) -> Vector3<f32>;

    /// Convert radians to degrees
    fn rad_to_deg(&self) -> Vector3<f32>;
}

impl Vector3Ext for Vector3<f32> {
    fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    fn safe_normalize(&self) -> Vector3<f32> {
        let mag = self.magnitude();
        if mag > 0.0 {
            *self / mag
        } else {
            Vector3::zeros()
        }
    }

    fn deg_to_rad(&self) -> Vector3<f32> {
        *self * DEG_TO_RAD
    }

    fn rad_to_deg(&self) -> Vector3<f32> {
        *self * RAD_TO_DEG
    }
}

/// Extension trait for raw (not necessarily unit) quaternion operations
pub trait QuaternionExt {
    /// Pure quaternion (0, v) from a 3-vector
    fn from_vector(v: Vector3<f32>) -> Quaternion<f32>;

    /// Vector part of the quaternion
    fn vector_part(&self) -> Vector3<f32>;

    /// Copy with the scalar part zeroed
    fn with_zero_scalar(&self) -> Quaternion<f32>;

    /// Normalize, returning the input unchanged if the norm is zero
    fn safe_normalize(&self) -> Quaternion<f32>;
}

impl QuaternionExt for Quaternion<f32> {
    fn from_vector(v: Vector3<f32>) -> Quaternion<f32> {
        Quaternion::from_parts(0.0, v)
    }

    fn vector_part(&self) -> Vector3<f32> {
        self.imag()
    }

    fn with_zero_scalar(&self) -> Quaternion<f32> {
        Quaternion::from_parts(0.0, self.imag())
    }

    fn safe_normalize(&self) -> Quaternion<f32> {
        let norm = self.norm();
        if norm > 0.0 { *self * (1.0 / norm) } else { *self }
    }
}

/// Renormalize an integrated quaternion, keeping the previous estimate
/// when the norm has collapsed to zero
///
/// Pathological gains can drive the integrated norm to zero; dividing by
/// it would poison every subsequent step with NaN.
pub(crate) fn renormalize_or_keep(
    integrated: Quaternion<f32>,
    previous: UnitQuaternion<f32>,
) -> UnitQuaternion<f32> {
    if integrated.norm() <= f32::EPSILON {
        log::warn!("quaternion norm collapsed during integration, keeping previous estimate");
        return previous;
    }
    UnitQuaternion::from_quaternion(integrated)
}

/// Extension trait for UnitQuaternion operations
pub trait EulerExt {
    /// Convert quaternion to Euler angles (roll, pitch, yaw) in radians
    fn to_euler(&self) -> Vector3<f32>;

    /// Convert quaternion to Euler angles in degrees
    fn to_euler_degrees(&self) -> Vector3<f32>;

    /// Create quaternion from Euler angles in radians
    fn from_euler(roll: f32, pitch: f32, yaw: f32) -> UnitQuaternion<f32>;

    /// Create quaternion from Euler angles in degrees
    fn from_euler_degrees(roll: f32, pitch: f32, yaw: f32) -> UnitQuaternion<f32>;
}

impl EulerExt for UnitQuaternion<f32> {
    fn to_euler(&self) -> Vector3<f32> {
        let (roll, pitch, yaw) = self.euler_angles();
        Vector3::new(roll, pitch, yaw)
    }

    fn to_euler_degrees(&self) -> Vector3<f32> {
        self.to_euler().rad_to_deg()
    }

    fn from_euler(roll: f32, pitch: f32, yaw: f32) -> UnitQuaternion<f32> {
        UnitQuaternion::from_euler_angles(roll, pitch, yaw)
    }

    fn from_euler_degrees(roll: f32, pitch: f32, yaw: f32) -> UnitQuaternion<f32> {
        let euler_rad = Vector3::new(roll, pitch, yaw).deg_to_rad();
        Self::from_euler(euler_rad.x, euler_rad.y, euler_rad.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_extensions() {
        let v = Vector3::new(3.0f32, 4.0, 0.0);
        assert!((v.magnitude() - 5.0).abs() < 1e-6);

        let normalized = v.safe_normalize();
        assert!((normalized.magnitude() - 1.0).abs() < 1e-6);

        assert_eq!(Vector3::zeros().safe_normalize(), Vector3::zeros());
    }

    #[test]
    fn test_multiply_by_conjugate_is_identity() {
        let q = Quaternion::new(0.8f32, -0.3, 0.4, 0.33).safe_normalize();
        let product = q * q.conjugate();

        assert!((product.w - 1.0).abs() < 1e-6);
        assert!(product.imag().magnitude() < 1e-6);
    }

    #[test]
    fn test_safe_normalize_is_idempotent() {
        let q = Quaternion::new(2.0f32, -1.0, 0.5, 3.0);
        let once = q.safe_normalize();
        let twice = once.safe_normalize();

        assert!((once.norm() - 1.0).abs() < 1e-6);
        assert!((once - twice).norm() < 1e-6);
    }

    #[test]
    fn test_safe_normalize_zero_quaternion() {
        let zero = Quaternion::new(0.0f32, 0.0, 0.0, 0.0);
        assert_eq!(zero.safe_normalize(), zero);
    }

    #[test]
    fn test_pure_quaternion_round_trip() {
        let v = Vector3::new(1.0f32, -2.0, 3.0);
        let q = <Quaternion<f32> as QuaternionExt>::from_vector(v);

        assert_eq!(q.w, 0.0);
        assert_eq!(q.vector_part(), v);
    }

    #[test]
    fn test_hamilton_product_is_not_commutative() {
        let a = Quaternion::new(0.0f32, 1.0, 0.0, 0.0);
        let b = Quaternion::new(0.0f32, 0.0, 1.0, 0.0);

        assert!(((a * b) - (b * a)).norm() > 1.0);
    }

    #[test]
    fn test_quaternion_euler_conversion() {
        let euler = Vector3::new(30.0, 45.0, 60.0);
        let quat = UnitQuaternion::from_euler_degrees(euler.x, euler.y, euler.z);
        let recovered = quat.to_euler_degrees();

        // Allow for some numerical precision loss
        assert!((euler - recovered).magnitude() < 1e-4);
    }
}
