//! Relative rotation between two tracked body segments
//!
//! Each segment runs its own attitude observer; the angle between the
//! two quaternion streams, corrected by a fixed geometric offset
//! measured in a motionless calibration posture, gives the joint angle.

use nalgebra::{UnitQuaternion, Vector3};

use crate::martin::Martin;
use crate::types::MargSample;

/// Rotation angle and axis between two segment attitudes
///
/// The correction quaternion is `conj(q_a) ⊗ q_b ⊗ conj(q_offset)`;
/// the returned angle is twice the arccosine of its scalar part and the
/// axis is its raw (unnormalized) vector part. For a hinge joint tracked
/// along Z the axis stays close to `(0, 0, sin(angle/2))`.
pub fn relative_rotation(
    q_a: UnitQuaternion<f32>,
    q_b: UnitQuaternion<f32>,
    q_offset: UnitQuaternion<f32>,
) -> (f32, Vector3<f32>) {
    let q_corr = q_a.as_ref().conjugate() * q_b.as_ref() * q_offset.as_ref().conjugate();

    // Unit inputs keep the scalar part inside [-1, 1] up to float noise.
    let angle = q_corr.w.clamp(-1.0, 1.0).acos() * 2.0;
    let axis = q_corr.imag();

    (angle, axis)
}

/// Geometric offset between two segments from a motionless posture
///
/// Both samples must be window means taken while the segments rest in
/// the reference posture (see [`crate::statics`]). Each seeds its own
/// observer in closed form; the offset is `conj(q_0) ⊗ q_1` and is
/// computed once, then reused for every subsequent
/// [`relative_rotation`] call.
pub fn static_offset(sample_a: &MargSample, sample_b: &MargSample) -> UnitQuaternion<f32> {
    let mut observer_a = Martin::default();
    let mut observer_b = Martin::default();

    let q_a = observer_a.init(sample_a);
    let q_b = observer_b.init(sample_b);

    UnitQuaternion::from_quaternion(q_a.as_ref().conjugate() * q_b.as_ref())
}
