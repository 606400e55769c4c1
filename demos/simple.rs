use marg_ahrs::{MargObserver, MargSample, Martin};
use nalgebra::Vector3;

const SAMPLE_PERIOD: f32 = 0.005; // 200 Hz

fn main() {
    let mut observer = Martin::default();

    // Seed from a motionless reference; in a real pipeline this is the
    // mean of a detected static window.
    let reference = MargSample::new(
        Vector3::new(0.0, 0.0, 9.81), // replace with calibrated accelerometer data in m/s²
        Vector3::new(1.0, 0.0, -0.5), // replace with calibrated magnetometer data
        Vector3::zeros(),             // replace with calibrated gyroscope data in rad/s
    );
    observer.init(&reference);

    for _ in 0..10 {
        // this loop should repeat each time a new sample is available
        let quaternion = observer.update(&reference, SAMPLE_PERIOD);
        let (roll, pitch, yaw) = quaternion.euler_angles();

        println!(
            "Roll: {:.2}, Pitch: {:.2}, Yaw: {:.2}",
            roll.to_degrees(),
            pitch.to_degrees(),
            yaw.to_degrees()
        );
    }
}
