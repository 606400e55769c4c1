//! Static-period detection and window means
//!
//! Observers that need a motionless reference sample (the Martin
//! closed-form seed, the goniometer's posture offset) get it from here:
//! locate the windows where the gyroscope is quiet, then average the
//! samples inside one.

use core::ops::Range;

use nalgebra::Vector3;

use crate::types::MargSample;

/// Find the sample ranges where the body is motionless
///
/// A sample counts as static when all three gyroscope axes stay below
/// `threshold` (rad/s) in absolute value. Only runs of at least
/// `min_samples` consecutive static samples are reported, as half-open
/// index ranges into `gyroscope`.
pub fn find_static_periods(
    gyroscope: &[Vector3<f32>],
    threshold: f32,
    min_samples: usize,
) -> Vec<Range<usize>> {
    let mut periods = Vec::new();
    let mut start = None;

    for (i, sample) in gyroscope.iter().enumerate() {
        let is_static = sample.x.abs() < threshold
            && sample.y.abs() < threshold
            && sample.z.abs() < threshold;

        match (is_static, start) {
            (true, None) => start = Some(i),
            (false, Some(begin)) => {
                if i - begin >= min_samples {
                    periods.push(begin..i);
                }
                start = None;
            }
            _ => {}
        }
    }

    if let Some(begin) = start {
        if gyroscope.len() - begin >= min_samples {
            periods.push(begin..gyroscope.len());
        }
    }

    periods
}

/// Componentwise mean over a sample window, or `None` for an empty one
///
/// The mean of a static window is the canonical motionless reference
/// sample fed to [`crate::Martin::init`] and
/// [`crate::goniometer::static_offset`].
pub fn mean_sample(samples: &[MargSample]) -> Option<MargSample> {
    if samples.is_empty() {
        return None;
    }

    let mut accelerometer = Vector3::zeros();
    let mut magnetometer = Vector3::zeros();
    let mut gyroscope = Vector3::zeros();
    for sample in samples {
        accelerometer += sample.accelerometer;
        magnetometer += sample.magnetometer;
        gyroscope += sample.gyroscope;
    }

    let count = samples.len() as f32;
    Some(MargSample {
        accelerometer: accelerometer / count,
        magnetometer: magnetometer / count,
        gyroscope: gyroscope / count,
    })
}
