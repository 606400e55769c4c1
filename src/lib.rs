//! marg-ahrs - attitude estimation from magneto-inertial sensor streams
//!
//! Estimates the 3D orientation of a rigid body carrying a MARG unit
//! (accelerometer, magnetometer, gyroscope), producing a continuously
//! updated unit quaternion from calibrated triaxial samples.
//!
//! Three recursive observers with distinct convergence and stability
//! trade-offs share one contract ([`MargObserver`]) and can be swapped
//! freely:
//!
//! - [`Madgwick`] - gradient descent on a gravity/field objective
//! - [`Mahony`] - complementary cross-product feedback
//! - [`Martin`] - nonlinear observer with adaptive sensor scales and
//!   gyroscope bias estimation (needs a closed-form seed and a few
//!   seconds to converge)
//!
//! plus two stateless building blocks:
//!
//! - [`markley`] - direct closed-form attitude from one accelerometer +
//!   magnetometer pair
//! - [`goniometer`] - joint angles between two tracked segments
//!
//! # Quick Start
//!
//! ```rust
//! use marg_ahrs::{MargObserver, MargSample, Martin};
//! use nalgebra::Vector3;
//!
//! let mut observer = Martin::default();
//!
//! // Seed from a motionless reference sample (typically the mean of a
//! // static window, see the `statics` module).
//! let reference = MargSample::new(
//!     Vector3::new(0.2, 0.1, 9.8),   // m/s²
//!     Vector3::new(0.9, 0.0, -0.4),  // any consistent field unit
//!     Vector3::zeros(),              // rad/s
//! );
//! observer.init(&reference);
//!
//! // Then feed the stream, one calibrated sample at a time.
//! let quaternion = observer.update(&reference, 0.005); // 200 Hz
//! let (roll, pitch, yaw) = quaternion.euler_angles();
//! # let _ = (roll, pitch, yaw);
//! ```
//!
//! Updates are synchronous and O(1); each observer instance owns its
//! state and must see one update at a time (`&mut self`).

pub mod calibration;
pub mod goniometer;
mod madgwick;
mod mahony;
pub mod markley;
mod martin;
mod math;
pub mod statics;
mod traits;
mod types;

// Re-export all public types and functions
pub use madgwick::{Madgwick, MadgwickSettings};
pub use mahony::{Mahony, MahonySettings};
pub use martin::{Martin, MartinSettings};
pub use math::{DEG_TO_RAD, EulerExt, QuaternionExt, RAD_TO_DEG, Vector3Ext};
pub use traits::MargObserver;
pub use types::{InvalidSample, MargSample};
