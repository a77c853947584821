#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(not(feature = "f32"), allow(clippy::unnecessary_cast))]
//! Attitude estimation from angular rate and reference-direction measurements.
//!
//! The crate provides unit-quaternion kinematics and two independent nonlinear observers:
//!
//! - [`Ecf`], an explicit complementary filter fusing gyroscope data with any fixed number `N` of
//!   reference-direction observations (gravity, magnetic field, sun vector, ...).
//! - [`Madgwick`], a gradient-descent filter specialized to accelerometer + magnetometer input.
//!
//! Both estimate a gyroscope bias alongside the orientation. Each `update` call is a bounded,
//! allocation-free computation over the filter's own state; the caller supplies the timestep.
//!
//! This crate optionally supports `no_std`; the `libm` (or `micromath`) crate feature is required
//! in `no_std` environments.

#[cfg(feature = "f32")]
/// Typedef for the floating-point data type used for all operations.
///
/// By default, all floating-point calculations are performed using `f64`. Enable the `f32` crate feature to
/// change this type to `f32`.
pub type Float = f32;
#[cfg(not(feature = "f32"))]
/// Typedef for the floating-point data type used for all operations.
///
/// By default, all floating-point calculations are performed using `f64`. Enable the `f32` crate feature to
/// change this type to `f32`.
pub type Float = f64;

#[cfg(not(any(feature = "std", feature = "libm", feature = "micromath")))]
compile_error!("one of the `std`, `libm` or `micromath` features must be enabled");

#[cfg(feature = "std")]
type Math<T> = T;
#[cfg(all(not(feature = "std"), feature = "libm"))]
type Math<T> = libm::Libm<T>;
#[cfg(all(not(feature = "std"), not(feature = "libm"), feature = "micromath"))]
type Math<T> = T;
#[cfg(all(not(feature = "std"), not(feature = "libm"), feature = "micromath"))]
#[allow(unused_imports)]
use micromath::F32Ext;

mod ecf;
mod error;
mod kinematics;
mod linalg;
mod madgwick;
mod quaternion;

pub use ecf::{Ecf, EcfGains};
pub use error::{Error, Quantity, Result};
pub use kinematics::{attitude_kinematics, Attitude, IntegrationMethod};
pub use linalg::{outer, skew, vex, Matrix, Matrix3, Vector3};
pub use madgwick::{Madgwick, MadgwickGains};
pub use quaternion::{EulerAngles, Quaternion, UnitQuaternion};

#[inline(always)]
pub(crate) fn square(t: Float) -> Float {
    t * t
}

#[inline(always)]
pub(crate) fn abs(t: Float) -> Float {
    #[cfg(all(not(feature = "std"), feature = "libm"))]
    return Math::<Float>::fabs(t);
    #[cfg(not(all(not(feature = "std"), feature = "libm")))]
    return t.abs();
}

#[inline(always)]
pub(crate) fn sqrt(t: Float) -> Float {
    Math::<Float>::sqrt(t)
}

#[inline(always)]
pub(crate) fn sin(t: Float) -> Float {
    Math::<Float>::sin(t)
}

#[inline(always)]
pub(crate) fn cos(t: Float) -> Float {
    Math::<Float>::cos(t)
}

#[inline(always)]
pub(crate) fn asin(t: Float) -> Float {
    Math::<Float>::asin(t)
}

#[inline(always)]
pub(crate) fn acos(t: Float) -> Float {
    Math::<Float>::acos(t)
}

#[inline(always)]
pub(crate) fn atan2(y: Float, x: Float) -> Float {
    Math::<Float>::atan2(y, x)
}
