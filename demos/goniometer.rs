//! Joint angle between two tracked segments, e.g. thigh and shank.

use marg_ahrs::{MargObserver, MargSample, Martin, goniometer};
use nalgebra::Vector3;

const SAMPLE_PERIOD: f32 = 0.005; // 200 Hz

fn main() {
    // One observer per segment, both seeded in the calibration posture.
    let posture_a = MargSample::new(
        Vector3::new(0.5, 0.2, 9.79),
        Vector3::new(0.9, 0.1, -0.45),
        Vector3::zeros(),
    );
    let posture_b = MargSample::new(
        Vector3::new(0.1, 0.7, 9.78),
        Vector3::new(0.85, 0.2, -0.44),
        Vector3::zeros(),
    );

    let mut thigh = Martin::default();
    let mut shank = Martin::default();
    thigh.init(&posture_a);
    shank.init(&posture_b);

    // The geometric offset between the mountings, computed once.
    let offset = goniometer::static_offset(&posture_a, &posture_b);

    for _ in 0..10 {
        // replace with live calibrated samples for each segment
        let q_thigh = thigh.update(&posture_a, SAMPLE_PERIOD);
        let q_shank = shank.update(&posture_b, SAMPLE_PERIOD);

        let (angle, axis) = goniometer::relative_rotation(q_thigh, q_shank, offset);
        println!(
            "Knee angle: {:.2}°, axis: [{:.2}, {:.2}, {:.2}]",
            angle.to_degrees(),
            axis.x,
            axis.y,
            axis.z
        );
    }
}
