//! Nonlinear attitude observer with adaptive sensor scales
//!
//! Based on the work of Martin and Salaün:
//!
//! Martin, P. and E. Salaün, Design and implementation of a low-cost
//! observer-based attitude and heading reference system. Control
//! Engineering Practice, 2010. 18(7): p. 712-722.
//!
//! Unlike the gradient-descent and complementary observers this filter
//! never pre-normalizes its measurements: two adaptive scale factors
//! (effective gravity and magnetic field magnitudes) absorb amplitude
//! drift, so sensors need not be calibrated to exact physical units.
//! The price is a convergence transient of a few seconds after
//! initialization; output during the first few hundred samples should
//! not be trusted.
//!
//! The estimate is expressed in the NED (North East Down) frame.

use nalgebra::{Quaternion, UnitQuaternion};

use crate::math::QuaternionExt;
use crate::traits::MargObserver;
use crate::types::MargSample;

/// Observer gains
///
/// Defaults are the HikoB hardware tuning from the reference deployment.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MartinSettings {
    /// Proportional gain on the gravity error
    pub la: f32,
    /// Proportional gain on the field-cross error
    pub lc: f32,
    /// Proportional gain on the combined-triad error
    pub ld: f32,
    /// Adaptation rate of the gravity scale
    pub n: f32,
    /// Adaptation rate of the magnetic scale
    pub o: f32,
    /// Norm re-centering gain
    pub k: f32,
    /// Bias damping constant
    pub sigma: f32,
}

impl Default for MartinSettings {
    fn default() -> Self {
        Self {
            la: 0.7,
            lc: 0.1,
            ld: 0.01,
            n: 0.01,
            o: 0.01,
            k: 0.7,
            sigma: 0.002,
        }
    }
}

/// Initial effective gravity magnitude (m/s²); the magnetic scale starts
/// at the same value and both adapt from there.
const INITIAL_SCALE: f32 = 9.81;

/// Alignment guard for the closed-form initialization: components this
/// close to one are treated as exactly aligned with the reference axis.
const SINGULAR_TOLERANCE: f32 = 1e-6;

/// Fixed reference directors in the observer frame
fn director_a() -> Quaternion<f32> {
    Quaternion::new(0.0, 0.0, 0.0, 1.0)
}

fn director_c() -> Quaternion<f32> {
    Quaternion::new(0.0, 0.0, 1.0, 0.0)
}

fn director_d() -> Quaternion<f32> {
    Quaternion::new(0.0, 1.0, 0.0, 0.0)
}

/// Output frame relabeling, applied to every update result
fn output_relabel() -> Quaternion<f32> {
    Quaternion::new(0.0, 1.0, 0.0, 0.0)
}

/// Martin–Salaün observer state
#[derive(Debug)]
pub struct Martin {
    settings: MartinSettings,
    q: Quaternion<f32>,
    /// Conjugate of `q`, cached and kept consistent across the step
    qinv: Quaternion<f32>,
    /// Gyroscope bias estimate, quaternion-padded with a zero scalar
    gyro_bias: Quaternion<f32>,
    /// Effective gravity magnitude, self-tuned
    gravity_scale: f32,
    /// Effective magnetic field magnitude, self-tuned
    magnetic_scale: f32,
}

impl Martin {
    pub fn new(settings: MartinSettings) -> Self {
        Martin {
            settings,
            q: Quaternion::identity(),
            qinv: Quaternion::identity(),
            gyro_bias: Quaternion::new(0.0, 0.0, 0.0, 0.0),
            gravity_scale: INITIAL_SCALE,
            magnetic_scale: INITIAL_SCALE,
        }
    }

    pub fn settings(&self) -> MartinSettings {
        self.settings
    }

    /// Current gyroscope bias estimate
    pub fn gyro_bias(&self) -> nalgebra::Vector3<f32> {
        self.gyro_bias.vector_part()
    }

    /// Current adaptive scales (gravity, magnetic)
    pub fn scales(&self) -> (f32, f32) {
        (self.gravity_scale, self.magnetic_scale)
    }

    /// Seed the orientation from a motionless reference sample
    ///
    /// `sample` should be the mean of a static window (see
    /// [`crate::statics`]). The seed is derived in closed form: first a
    /// rotation aligning the measured gravity direction with the vertical
    /// director, then a refinement about the vertical from the
    /// accelerometer/magnetometer cross product.
    ///
    /// When the accelerometer already lies along the vertical director
    /// the aligning rotation is undefined and the identity is used; the
    /// same guard covers the refinement when the cross product is
    /// already in place.
    pub fn init(&mut self, sample: &MargSample) -> UnitQuaternion<f32> {
        let ya = <Quaternion<f32> as QuaternionExt>::from_vector(sample.accelerometer);
        let yb = <Quaternion<f32> as QuaternionExt>::from_vector(sample.magnetometer);

        let ya = ya.safe_normalize();
        let yc = (ya * yb).with_zero_scalar().safe_normalize();

        if ya.k >= 1.0 - SINGULAR_TOLERANCE {
            self.q = Quaternion::identity();
            self.qinv = Quaternion::identity();
        } else {
            self.qinv = Quaternion::new(-ya.j, 1.0 - ya.k, 0.0, ya.i).safe_normalize();
            self.q = self.qinv.conjugate();
        }

        let yc = self.q * yc * self.qinv;

        if yc.j < 1.0 - SINGULAR_TOLERANCE {
            let refine = Quaternion::new(-yc.i, 0.0, yc.k, 1.0 - yc.j);
            self.qinv = (self.qinv * refine).safe_normalize();
            self.q = self.qinv.conjugate();
        }

        UnitQuaternion::from_quaternion(self.q)
    }
}

impl Default for Martin {
    fn default() -> Self {
        Martin::new(MartinSettings::default())
    }
}

impl MargObserver for Martin {
    fn orientation(&self) -> UnitQuaternion<f32> {
        UnitQuaternion::from_quaternion(output_relabel() * self.q)
    }

    fn set_orientation(&mut self, quat: UnitQuaternion<f32>) {
        // Undo the output relabeling; the relabel quaternion is a unit
        // pure quaternion, so its conjugate is its inverse.
        self.q = output_relabel().conjugate() * quat.as_ref();
        self.qinv = self.q.conjugate();
        self.gyro_bias = Quaternion::new(0.0, 0.0, 0.0, 0.0);
    }

    fn update(&mut self, sample: &MargSample, delta_time: f32) -> UnitQuaternion<f32> {
        let s = self.settings;

        // Measurements as pure quaternions, deliberately unnormalized:
        // the adaptive scales take care of magnitude.
        let ya = <Quaternion<f32> as QuaternionExt>::from_vector(sample.accelerometer);
        let yb = <Quaternion<f32> as QuaternionExt>::from_vector(sample.magnetometer);
        let wm = <Quaternion<f32> as QuaternionExt>::from_vector(sample.gyroscope);

        // Second-order cross terms for the magnetic dip correction
        let yc = (ya * yb).with_zero_scalar();
        let yd = (yc * ya).with_zero_scalar();

        // Error between each director and the scaled body measurement
        // rotated into the observer frame; scalar parts zeroed for
        // numerical stabilization.
        let ea = (director_a() - (self.q * ya * self.qinv) * (1.0 / self.gravity_scale))
            .with_zero_scalar();
        let ec = (director_c() - (self.q * yc * self.qinv) * (1.0 / self.magnetic_scale))
            .with_zero_scalar();
        let ed = (director_d()
            - (self.q * yd * self.qinv) * (1.0 / (self.gravity_scale * self.magnetic_scale)))
        .with_zero_scalar();

        // Speed terms driving the adaptive scales:
        // sE = <E, E - director> = ||E||² - <E, director>
        let s_ea = ea.norm_squared() - ea.k;
        let s_ec = ec.norm_squared() - ec.j;
        let s_ed = ed.norm_squared() - ed.i;

        // Combined linear error feedback and its damping counterpart
        let le = ((director_a() * ea) * s.la
            + (director_c() * ec) * s.lc
            + (director_d() * ed) * s.ld)
            .with_zero_scalar();
        let me = le * -s.sigma;

        let ne = if s.la + s.ld != 0.0 {
            s.n / (s.la + s.ld) * (s.la * s_ea + s.ld * s_ed)
        } else {
            0.0
        };
        let oe = if s.lc + s.ld != 0.0 {
            s.o / (s.lc + s.ld) * (s.lc * s_ec + s.ld * s_ed)
        } else {
            0.0
        };

        // The k(1 - ||q||²) term re-centers the norm toward one
        // continuously; there is no post-hoc renormalization of the
        // internal state.
        let q_dot = self.q * (wm - self.gyro_bias) * 0.5
            + le * self.q
            + self.q * (s.k * (1.0 - self.q.norm_squared()));
        let bias_dot = self.qinv * me * self.q;
        let gravity_scale_dot = self.gravity_scale * ne;
        let magnetic_scale_dot = self.magnetic_scale * oe;

        // Forward Euler over all four state quantities
        self.q = self.q + q_dot * delta_time;
        self.gyro_bias = self.gyro_bias + bias_dot * delta_time;
        self.gravity_scale += gravity_scale_dot * delta_time;
        self.magnetic_scale += magnetic_scale_dot * delta_time;

        self.qinv = self.q.conjugate();

        UnitQuaternion::from_quaternion(output_relabel() * self.q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vector3Ext;
    use nalgebra::Vector3;

    fn rotated_direction(observer: &Martin, v: Vector3<f32>) -> Quaternion<f32> {
        let pure = <Quaternion<f32> as QuaternionExt>::from_vector(v.safe_normalize());
        observer.q * pure * observer.qinv
    }

    #[test]
    fn test_init_singular_accelerometer_falls_back_to_identity() {
        // Accelerometer exactly along the vertical director: the aligning
        // rotation is undefined and must resolve to the identity.
        let mut observer = Martin::default();
        let sample = MargSample::new(
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::zeros(),
        );

        let q0 = observer.init(&sample);
        assert!((observer.q.norm() - 1.0).abs() < 1e-6);
        assert!(q0.as_ref().w.is_finite());
        // Gravity already aligned, so the seed reduces to the magnetic
        // refinement about the vertical axis.
        let gravity = rotated_direction(&observer, Vector3::new(0.0, 0.0, 1.0));
        assert!((gravity.k - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_init_near_singular_accelerometer_stays_finite() {
        let mut observer = Martin::default();
        let sample = MargSample::new(
            Vector3::new(0.0, 0.0, 9.81),
            Vector3::new(1.0, 0.0, -0.5),
            Vector3::zeros(),
        );

        let q0 = observer.init(&sample);
        assert!(q0.as_ref().norm().is_finite());
        let gravity = rotated_direction(&observer, Vector3::new(0.0, 0.0, 9.81));
        assert!((gravity.k - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_init_aligns_gravity_with_vertical_director() {
        let mut observer = Martin::default();
        let sample = MargSample::new(
            Vector3::new(9.81, 0.0, 0.0),
            Vector3::new(0.2, 0.9, -0.4),
            Vector3::zeros(),
        );

        observer.init(&sample);

        // The measured gravity direction must map onto the vertical
        // director in the observer frame.
        let gravity = rotated_direction(&observer, sample.accelerometer);
        assert!(gravity.vector_part().z > 1.0 - 1e-5);
    }

    #[test]
    fn test_init_aligns_cross_product_with_lateral_director() {
        let mut observer = Martin::default();
        let sample = MargSample::new(
            Vector3::new(1.0, 2.0, 9.5),
            Vector3::new(0.8, 0.1, -0.45),
            Vector3::zeros(),
        );

        observer.init(&sample);

        let ya = <Quaternion<f32> as QuaternionExt>::from_vector(sample.accelerometer).safe_normalize();
        let yb = <Quaternion<f32> as QuaternionExt>::from_vector(sample.magnetometer);
        let yc = (ya * yb).with_zero_scalar().safe_normalize();
        let rotated = observer.q * yc * observer.qinv;
        assert!(rotated.j > 1.0 - 1e-4);
    }

    #[test]
    fn test_update_keeps_state_near_unit_norm() {
        let mut observer = Martin::default();
        let sample = MargSample::new(
            Vector3::new(0.0, 0.0, 9.81),
            Vector3::new(1.0, 0.0, -0.5),
            Vector3::zeros(),
        );
        observer.init(&sample);

        for _ in 0..1000 {
            let q = observer.update(&sample, 0.005);
            // Output is normalized; internal state is only re-centered.
            assert!((q.as_ref().norm() - 1.0).abs() < 1e-6);
            assert!((observer.q.norm() - 1.0).abs() < 1e-2);
        }
    }

    #[test]
    fn test_scales_adapt_toward_measured_magnitudes() {
        let mut observer = Martin::default();
        // Gravity deliberately off the assumed 9.81 magnitude.
        let sample = MargSample::new(
            Vector3::new(0.0, 0.0, 8.5),
            Vector3::new(1.0, 0.0, -0.5),
            Vector3::zeros(),
        );
        observer.init(&sample);

        let (initial_gravity, _) = observer.scales();
        for _ in 0..4000 {
            observer.update(&sample, 0.005);
        }
        let (adapted_gravity, adapted_magnetic) = observer.scales();

        assert!((adapted_gravity - 8.5).abs() < (initial_gravity - 8.5).abs());
        assert!(adapted_magnetic.is_finite() && adapted_magnetic > 0.0);
    }

    #[test]
    fn test_zero_gains_disable_adaptation() {
        let settings = MartinSettings {
            la: 0.0,
            lc: 0.0,
            ld: 0.0,
            ..MartinSettings::default()
        };
        let mut observer = Martin::new(settings);
        let sample = MargSample::new(
            Vector3::new(0.3, 0.1, 9.6),
            Vector3::new(0.9, 0.2, -0.4),
            Vector3::zeros(),
        );
        observer.init(&sample);

        // All weight sums are zero; the guarded derivatives must hold the
        // scales exactly.
        for _ in 0..100 {
            observer.update(&sample, 0.005);
        }
        let (gravity, magnetic) = observer.scales();
        assert_eq!(gravity, INITIAL_SCALE);
        assert_eq!(magnetic, INITIAL_SCALE);
    }
}
