//! Common contract shared by the recursive observers

use nalgebra::UnitQuaternion;

use crate::types::MargSample;

/// A recursive attitude observer over calibrated MARG samples
///
/// Implementations are interchangeable strategies: each owns its own
/// recursive state, consumes one sample per call and yields the current
/// unit-quaternion attitude estimate. An update requires `&mut self`,
/// so exclusive access per observer instance is enforced by the borrow
/// checker; no further synchronization is needed.
pub trait MargObserver {
    /// Current attitude estimate
    fn orientation(&self) -> UnitQuaternion<f32>;

    /// Replace the attitude estimate, resetting any error accumulators
    fn set_orientation(&mut self, quat: UnitQuaternion<f32>);

    /// Fuse one sample, advancing the estimate by `delta_time` seconds
    fn update(&mut self, sample: &MargSample, delta_time: f32) -> UnitQuaternion<f32>;
}
