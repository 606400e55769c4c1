//! Closed-form two-vector attitude estimator
//!
//! Based on: L. Markley, Fast Quaternion Attitude Estimation from Two
//! Vector Measurements, NASA TechDoc, 2001.
//! <https://archive.org/details/nasa_techdoc_20010068636>
//!
//! Non-recursive: each call solves directly for the quaternion aligning
//! the measured accelerometer/magnetometer triad with the fixed inertial
//! reference triad. No state, no history, no iteration.
//!
//! The direct formula is singular when the measured and reference
//! cross-product directions oppose each other; the dominant-axis
//! relabeling below moves the solution away from that singularity and
//! maps the result back afterwards.

use nalgebra::{Quaternion, UnitQuaternion, Vector3};

use crate::math::Vector3Ext;

/// Gravity direction reference in the inertial frame
fn gravity_reference() -> Vector3<f32> {
    Vector3::new(0.0, 1.0, 0.0)
}

/// Magnetic field direction reference in the inertial frame
fn field_reference() -> Vector3<f32> {
    Vector3::new(0.0, 0.866, -0.5)
}

/// Default trust split between accelerometer and magnetometer
pub const DEFAULT_WEIGHTS: (f32, f32) = (0.5, 0.5);

/// Reference axis carrying the strongest cross-product alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DominantAxis {
    None,
    X,
    Y,
    Z,
}

impl DominantAxis {
    /// Pick the axis whose componentwise product beats the full dot
    /// product of the measured and reference cross directions.
    fn select(b3: Vector3<f32>, r3: Vector3<f32>) -> Self {
        let mut best = Self::None;
        let mut max = b3.dot(&r3);
        for (axis, product) in [
            (Self::X, b3.x * r3.x),
            (Self::Y, b3.y * r3.y),
            (Self::Z, b3.z * r3.z),
        ] {
            if max < product {
                best = axis;
                max = product;
            }
        }
        best
    }

    /// Negate the two components of `v` not on this axis
    fn fold(self, v: Vector3<f32>) -> Vector3<f32> {
        match self {
            Self::None => v,
            Self::X => Vector3::new(v.x, -v.y, -v.z),
            Self::Y => Vector3::new(-v.x, v.y, -v.z),
            Self::Z => Vector3::new(-v.x, -v.y, v.z),
        }
    }

    /// Map the solution computed in the folded frame back to the
    /// original coordinates.
    fn relabel(self, q0: f32, qv: Vector3<f32>) -> Quaternion<f32> {
        match self {
            Self::None => Quaternion::new(q0, qv.x, qv.y, qv.z),
            Self::X => Quaternion::new(-qv.x, q0, -qv.z, qv.y),
            Self::Y => Quaternion::new(-qv.y, qv.z, q0, -qv.x),
            Self::Z => Quaternion::new(-qv.z, -qv.y, qv.x, q0),
        }
    }
}

/// Estimate the attitude from one simultaneous accelerometer and
/// magnetometer reading
///
/// `weights` splits the trust between the two sensors and should sum to
/// one; [`DEFAULT_WEIGHTS`] is the usual choice. Returns `None` when the
/// two measured vectors are parallel or zero, in which case no
/// orientation is determined by the sample.
pub fn estimate(
    accel: Vector3<f32>,
    mag: Vector3<f32>,
    weights: (f32, f32),
) -> Option<UnitQuaternion<f32>> {
    let (a1, a2) = weights;

    let cross = accel.cross(&mag);
    if cross.magnitude() == 0.0 {
        log::warn!("markley: accelerometer and magnetometer are parallel, no attitude solution");
        return None;
    }
    let b3 = cross.safe_normalize();

    let mut g_ref = gravity_reference();
    let mut h_ref = field_reference();
    let mut r3 = g_ref.cross(&h_ref).safe_normalize();

    let axis = DominantAxis::select(b3, r3);
    r3 = axis.fold(r3);
    g_ref = axis.fold(g_ref);
    h_ref = axis.fold(h_ref);

    let cross_sum = accel.cross(&g_ref) * a1 + mag.cross(&h_ref) * a2;
    let one_plus_dot = 1.0 + b3.dot(&r3);

    let alpha = one_plus_dot * (a1 * accel.dot(&g_ref) + a2 * mag.dot(&h_ref))
        + b3.cross(&r3).dot(&cross_sum);
    let beta = (b3 + r3).dot(&cross_sum);
    let gamma = (alpha * alpha + beta * beta).sqrt();

    let (q0, qv) = if alpha > 0.0 {
        let denom = gamma * (gamma + alpha) * one_plus_dot;
        if denom <= 0.0 {
            log::warn!("markley: degenerate geometry, no attitude solution");
            return None;
        }
        let k = 1.0 / (2.0 * denom.sqrt());
        (
            k * (gamma + alpha) * one_plus_dot,
            (b3.cross(&r3) * (gamma + alpha) + (b3 + r3) * beta) * k,
        )
    } else {
        let denom = gamma * (gamma - alpha) * one_plus_dot;
        if denom <= 0.0 {
            log::warn!("markley: degenerate geometry, no attitude solution");
            return None;
        }
        let k = 1.0 / (2.0 * denom.sqrt());
        (
            k * beta * one_plus_dot,
            (b3.cross(&r3) * beta + (b3 + r3) * (gamma - alpha)) * k,
        )
    };

    Some(UnitQuaternion::from_quaternion(axis.relabel(q0, qv)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_measurements_give_identity() {
        let q = estimate(gravity_reference(), field_reference(), DEFAULT_WEIGHTS).unwrap();

        assert!((q.as_ref().w.abs() - 1.0).abs() < 1e-6);
        assert!(q.as_ref().imag().magnitude() < 1e-6);
    }

    #[test]
    fn test_parallel_measurements_have_no_solution() {
        let v = Vector3::new(0.0, 1.0, 0.0);
        assert!(estimate(v, v * 0.5, DEFAULT_WEIGHTS).is_none());
        assert!(estimate(Vector3::zeros(), v, DEFAULT_WEIGHTS).is_none());
    }

    #[test]
    fn test_known_rotation_is_recovered() {
        let q_true = UnitQuaternion::from_euler_angles(0.3, -0.2, 0.4);
        let g = q_true.inverse_transform_vector(&gravity_reference());
        let h = q_true.inverse_transform_vector(&field_reference());

        let q = estimate(g, h, DEFAULT_WEIGHTS).unwrap();

        // Recovery holds up to the q / -q sign ambiguity.
        let angle = q.angle_to(&q_true);
        assert!(angle < 1e-3, "recovered estimate off by {angle} rad");
    }

    #[test]
    fn test_relabel_branches_recover_large_rotations() {
        // Rotations far from identity exercise the dominant-axis folds.
        let cases = [
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 3.0),
            UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 2.9),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 3.1),
            UnitQuaternion::from_euler_angles(2.5, 1.0, -2.0),
        ];

        for q_true in cases {
            let g = q_true.inverse_transform_vector(&gravity_reference());
            let h = q_true.inverse_transform_vector(&field_reference());

            let q = estimate(g, h, DEFAULT_WEIGHTS).unwrap();
            let angle = q.angle_to(&q_true);
            assert!(angle < 1e-3, "recovered estimate off by {angle} rad");
        }
    }

    #[test]
    fn test_scaled_measurements_recover_same_attitude() {
        // The solution depends on directions, not magnitudes.
        let q_true = UnitQuaternion::from_euler_angles(-0.5, 0.1, 0.9);
        let g = q_true.inverse_transform_vector(&gravity_reference());
        let h = q_true.inverse_transform_vector(&field_reference());

        let plain = estimate(g, h, DEFAULT_WEIGHTS).unwrap();
        let scaled = estimate(g * 9.81, h * 47.0, DEFAULT_WEIGHTS).unwrap();

        assert!(plain.angle_to(&scaled) < 1e-3);
    }
}
