//! Quaternion algebra and unit-quaternion orientations.
//!
//! [`Quaternion`] is a general element of the algebra with no norm constraint. [`UnitQuaternion`] can only be
//! obtained through a normalizing constructor, so every value of that type represents a rotation.

use core::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

use crate::{
    abs, acos, asin, atan2, cos, error::Quantity, sin, sqrt, square, Error, Float, Matrix3, Result,
    Vector3,
};

/// A general quaternion `w + xi + yj + zk`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Quaternion {
    pub w: Float,
    pub x: Float,
    pub y: Float,
    pub z: Float,
}

impl Mul for Quaternion {
    type Output = Quaternion;

    /// Hamilton product.
    fn mul(self, rhs: Self) -> Self::Output {
        let w = self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z;
        let x = self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y;
        let y = self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x;
        let z = self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w;
        Self { w, x, y, z }
    }
}

impl MulAssign for Quaternion {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl Mul<Float> for Quaternion {
    type Output = Quaternion;

    fn mul(self, rhs: Float) -> Self::Output {
        Self::new(self.w * rhs, self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Mul<Quaternion> for Float {
    type Output = Quaternion;

    fn mul(self, rhs: Quaternion) -> Self::Output {
        rhs * self
    }
}

impl MulAssign<Float> for Quaternion {
    fn mul_assign(&mut self, rhs: Float) {
        *self = *self * rhs;
    }
}

impl Div<Float> for Quaternion {
    type Output = Quaternion;

    fn div(self, rhs: Float) -> Self::Output {
        Self::new(self.w / rhs, self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Div for Quaternion {
    type Output = Quaternion;

    /// `p / q = p * conj(q)`; equals `p * q⁻¹` only when `q` has unit norm.
    fn div(self, rhs: Self) -> Self::Output {
        self * rhs.conjugate()
    }
}

impl Add for Quaternion {
    type Output = Quaternion;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(
            self.w + rhs.w,
            self.x + rhs.x,
            self.y + rhs.y,
            self.z + rhs.z,
        )
    }
}

impl AddAssign for Quaternion {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Quaternion {
    type Output = Quaternion;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(
            self.w - rhs.w,
            self.x - rhs.x,
            self.y - rhs.y,
            self.z - rhs.z,
        )
    }
}

impl SubAssign for Quaternion {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for Quaternion {
    type Output = Quaternion;

    fn neg(self) -> Self::Output {
        Self::new(-self.w, -self.x, -self.y, -self.z)
    }
}

impl From<[Float; 4]> for Quaternion {
    fn from(value: [Float; 4]) -> Self {
        Self::new(value[0], value[1], value[2], value[3])
    }
}

impl From<Vector3> for Quaternion {
    fn from(value: Vector3) -> Self {
        Self::pure(value)
    }
}

impl Quaternion {
    pub const fn new(w: Float, x: Float, y: Float, z: Float) -> Self {
        Self { w, x, y, z }
    }

    /// The pure quaternion `(0, v)`.
    pub const fn pure(v: Vector3) -> Self {
        Self::new(0.0, v.x, v.y, v.z)
    }

    pub fn scalar(&self) -> Float {
        self.w
    }

    pub fn vector(&self) -> Vector3 {
        Vector3::new(self.x, self.y, self.z)
    }

    /// Bounds-checked component access in `(w, x, y, z)` order.
    pub fn get(&self, index: usize) -> Result<Float> {
        match index {
            0 => Ok(self.w),
            1 => Ok(self.x),
            2 => Ok(self.y),
            3 => Ok(self.z),
            _ => Err(Error::IndexOutOfRange { index, len: 4 }),
        }
    }

    pub fn conjugate(&self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    pub fn dot(&self, rhs: &Self) -> Float {
        self.w * rhs.w + self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    pub fn norm_squared(&self) -> Float {
        self.dot(self)
    }

    pub fn norm(&self) -> Float {
        sqrt(self.norm_squared())
    }

    pub fn is_finite(&self) -> bool {
        self.w.is_finite() && self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Divides by the Euclidean norm, producing an orientation.
    ///
    /// Fails with [`Error::DegenerateVector`] if the norm is zero and [`Error::NonFinite`] on NaN/infinite input.
    pub fn normalize(&self) -> Result<UnitQuaternion> {
        if !self.is_finite() {
            return Err(Error::NonFinite(Quantity::Quaternion));
        }
        let n = self.norm();
        if n < Float::EPSILON {
            return Err(Error::DegenerateVector(Quantity::Quaternion));
        }
        Ok(UnitQuaternion(*self / n))
    }
}

/// Roll, pitch and yaw in radians (Z-Y-X convention: yaw applied first, roll last, in the body frame).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EulerAngles {
    pub roll: Float,
    pub pitch: Float,
    pub yaw: Float,
}

/// A quaternion of norm one, representing a rotation from the body frame to the reference frame.
///
/// `q.rotate(v)` maps a body-frame vector to the reference frame; `q.conjugate().rotate(v)` does the opposite.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitQuaternion(Quaternion);

impl Default for UnitQuaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl TryFrom<Quaternion> for UnitQuaternion {
    type Error = Error;

    fn try_from(value: Quaternion) -> Result<Self> {
        value.normalize()
    }
}

impl From<UnitQuaternion> for Quaternion {
    fn from(value: UnitQuaternion) -> Self {
        value.0
    }
}

impl Mul for UnitQuaternion {
    type Output = UnitQuaternion;

    fn mul(self, rhs: Self) -> Self::Output {
        // the product of unit quaternions has norm one up to rounding, which is removed here
        let q = self.0 * rhs.0;
        UnitQuaternion(q / q.norm())
    }
}

impl MulAssign for UnitQuaternion {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl Mul<Quaternion> for UnitQuaternion {
    type Output = Quaternion;

    fn mul(self, rhs: Quaternion) -> Self::Output {
        self.0 * rhs
    }
}

impl Mul<UnitQuaternion> for Quaternion {
    type Output = Quaternion;

    fn mul(self, rhs: UnitQuaternion) -> Self::Output {
        self * rhs.0
    }
}

impl UnitQuaternion {
    pub const IDENTITY: Self = Self(Quaternion::new(1.0, 0.0, 0.0, 0.0));

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    /// Normalizes the given components into an orientation.
    pub fn new(w: Float, x: Float, y: Float, z: Float) -> Result<Self> {
        Quaternion::new(w, x, y, z).normalize()
    }

    /// Rotation by `angle` radians around `axis`. The axis does not need to be normalized.
    pub fn from_axis_angle(angle: Float, axis: Vector3) -> Result<Self> {
        if !angle.is_finite() {
            return Err(Error::NonFinite(Quantity::Axis));
        }
        let axis = axis.try_normalize(Quantity::Axis)?;
        let s = sin(angle / 2.0);
        Quaternion::new(cos(angle / 2.0), s * axis.x, s * axis.y, s * axis.z).normalize()
    }

    /// Exponential map of the pure quaternion `(0, v)`: `(cos|v|, sin|v| v/|v|)`.
    ///
    /// This is a rotation by `2|v|` around `v`. A zero vector maps to the identity.
    pub fn exp(v: Vector3) -> Self {
        let n = v.magnitude();
        if n < Float::EPSILON {
            return Self::IDENTITY;
        }
        let s = sin(n) / n;
        let q = Quaternion::new(cos(n), s * v.x, s * v.y, s * v.z);
        Self(q / q.norm())
    }

    /// Builds `qz * qy * qx` from roll (x), pitch (y) and yaw (z) angles.
    pub fn from_euler(angles: EulerAngles) -> Result<Self> {
        if !(angles.roll.is_finite() && angles.pitch.is_finite() && angles.yaw.is_finite()) {
            return Err(Error::NonFinite(Quantity::EulerAngles));
        }
        let qx = Self(Quaternion::new(cos(angles.roll / 2.0), sin(angles.roll / 2.0), 0.0, 0.0));
        let qy = Self(Quaternion::new(cos(angles.pitch / 2.0), 0.0, sin(angles.pitch / 2.0), 0.0));
        let qz = Self(Quaternion::new(cos(angles.yaw / 2.0), 0.0, 0.0, sin(angles.yaw / 2.0)));
        Ok(qz * qy * qx)
    }

    /// Converts a rotation matrix (as returned by [`to_dcm`](Self::to_dcm)) back into a quaternion.
    pub fn from_dcm(m: Matrix3) -> Result<Self> {
        if !m.is_finite() {
            return Err(Error::NonFinite(Quantity::Matrix));
        }
        let m = &m.0;
        let trace = m[0][0] + m[1][1] + m[2][2];
        // pick the largest of w, x, y, z to divide by
        let q = if trace > 0.0 {
            let s = 2.0 * sqrt(trace + 1.0);
            Quaternion::new(
                s / 4.0,
                (m[2][1] - m[1][2]) / s,
                (m[0][2] - m[2][0]) / s,
                (m[1][0] - m[0][1]) / s,
            )
        } else if m[0][0] > m[1][1] && m[0][0] > m[2][2] {
            let s = 2.0 * sqrt((1.0 + m[0][0] - m[1][1] - m[2][2]).max(0.0));
            if s < Float::EPSILON {
                return Err(Error::DegenerateVector(Quantity::Matrix));
            }
            Quaternion::new(
                (m[2][1] - m[1][2]) / s,
                s / 4.0,
                (m[0][1] + m[1][0]) / s,
                (m[0][2] + m[2][0]) / s,
            )
        } else if m[1][1] > m[2][2] {
            let s = 2.0 * sqrt((1.0 + m[1][1] - m[0][0] - m[2][2]).max(0.0));
            if s < Float::EPSILON {
                return Err(Error::DegenerateVector(Quantity::Matrix));
            }
            Quaternion::new(
                (m[0][2] - m[2][0]) / s,
                (m[0][1] + m[1][0]) / s,
                s / 4.0,
                (m[1][2] + m[2][1]) / s,
            )
        } else {
            let s = 2.0 * sqrt((1.0 + m[2][2] - m[0][0] - m[1][1]).max(0.0));
            if s < Float::EPSILON {
                return Err(Error::DegenerateVector(Quantity::Matrix));
            }
            Quaternion::new(
                (m[1][0] - m[0][1]) / s,
                (m[0][2] + m[2][0]) / s,
                (m[1][2] + m[2][1]) / s,
                s / 4.0,
            )
        };
        q.normalize()
    }

    pub fn w(&self) -> Float {
        self.0.w
    }

    pub fn x(&self) -> Float {
        self.0.x
    }

    pub fn y(&self) -> Float {
        self.0.y
    }

    pub fn z(&self) -> Float {
        self.0.z
    }

    pub fn scalar(&self) -> Float {
        self.0.w
    }

    pub fn vector(&self) -> Vector3 {
        self.0.vector()
    }

    /// Bounds-checked component access in `(w, x, y, z)` order.
    pub fn get(&self, index: usize) -> Result<Float> {
        self.0.get(index)
    }

    pub fn quaternion(&self) -> Quaternion {
        self.0
    }

    /// The inverse rotation.
    pub fn conjugate(&self) -> Self {
        Self(self.0.conjugate())
    }

    /// Rotates `v` by this orientation, `q v q⁻¹`.
    pub fn rotate(&self, v: Vector3) -> Vector3 {
        let im = self.0.vector();
        let u = 2.0 * im.cross(&v);
        v + self.0.w * u + im.cross(&u)
    }

    /// Direction cosine matrix `R` with `R * v == self.rotate(v)`.
    pub fn to_dcm(&self) -> Matrix3 {
        let Quaternion { w, x, y, z } = self.0;
        [
            [
                1.0 - 2.0 * (square(y) + square(z)),
                2.0 * (x * y - w * z),
                2.0 * (x * z + w * y),
            ],
            [
                2.0 * (x * y + w * z),
                1.0 - 2.0 * (square(x) + square(z)),
                2.0 * (y * z - w * x),
            ],
            [
                2.0 * (x * z - w * y),
                2.0 * (y * z + w * x),
                1.0 - 2.0 * (square(x) + square(y)),
            ],
        ]
        .into()
    }

    /// Extracts roll, pitch and yaw.
    ///
    /// The pitch `asin` argument is clamped to `[-1, 1]` so that rounding at ±90° pitch yields ±π/2 instead of NaN.
    pub fn euler_angles(&self) -> EulerAngles {
        let Quaternion { w, x, y, z } = self.0;
        EulerAngles {
            roll: atan2(
                2.0 * (w * x + y * z),
                square(w) + square(z) - square(x) - square(y),
            ),
            pitch: asin((2.0 * (w * y - x * z)).clamp(-1.0, 1.0)),
            yaw: atan2(
                2.0 * (w * z + x * y),
                square(w) + square(x) - square(y) - square(z),
            ),
        }
    }

    /// Angle in radians of the smallest rotation taking `self` to `other`.
    pub fn angle_to(&self, other: &Self) -> Float {
        2.0 * acos(abs(self.0.dot(&other.0)).min(1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn samples() -> [UnitQuaternion; 4] {
        [
            UnitQuaternion::new(0.5, 0.5, 0.5, 0.5).unwrap(),
            UnitQuaternion::new(1.0, 2.0, 3.0, 4.0).unwrap(),
            UnitQuaternion::new(-0.3, 0.1, 0.9, -0.2).unwrap(),
            UnitQuaternion::from_axis_angle(1.2, Vector3::new(0.0, 1.0, 1.0)).unwrap(),
        ]
    }

    fn assert_quat_eq(a: Quaternion, b: Quaternion) {
        assert_abs_diff_eq!(a.w, b.w, epsilon = 1e-9);
        assert_abs_diff_eq!(a.x, b.x, epsilon = 1e-9);
        assert_abs_diff_eq!(a.y, b.y, epsilon = 1e-9);
        assert_abs_diff_eq!(a.z, b.z, epsilon = 1e-9);
    }

    fn assert_vec_eq(a: Vector3, b: Vector3) {
        assert_abs_diff_eq!(a.x, b.x, epsilon = 1e-9);
        assert_abs_diff_eq!(a.y, b.y, epsilon = 1e-9);
        assert_abs_diff_eq!(a.z, b.z, epsilon = 1e-9);
    }

    #[test]
    fn hamilton_product_is_associative_not_commutative() {
        let [p, q, r, _] = samples();
        assert_quat_eq(((p * q) * r).quaternion(), (p * (q * r)).quaternion());
        let pq = (p * q).quaternion();
        let qp = (q * p).quaternion();
        assert!((pq - qp).norm() > 1e-3);
    }

    #[test]
    fn identity_is_neutral() {
        for q in samples() {
            assert_quat_eq((UnitQuaternion::IDENTITY * q).quaternion(), q.quaternion());
            assert_quat_eq((q * UnitQuaternion::IDENTITY).quaternion(), q.quaternion());
        }
    }

    #[test]
    fn unit_norm_is_maintained() {
        let [p, q, r, s] = samples();
        for u in [p, q, r, s, p * q, q * r * s, p.conjugate()] {
            assert_abs_diff_eq!(u.quaternion().norm(), 1.0, epsilon = 1e-12);
        }
        let u = UnitQuaternion::new(2.0, 0.0, 0.0, 0.0).unwrap();
        assert_eq!(u, UnitQuaternion::IDENTITY);
    }

    #[test]
    fn conjugate_is_inverse() {
        for q in samples() {
            assert_quat_eq((q * q.conjugate()).quaternion(), UnitQuaternion::IDENTITY.quaternion());
        }
    }

    #[test]
    fn rotate_matches_sandwich_and_dcm() {
        let v = Vector3::new(1.0, 2.0, 3.0);
        for q in samples() {
            let sandwich = (q * Quaternion::pure(v) * q.conjugate()).vector();
            assert_vec_eq(q.rotate(v), sandwich);
            assert_vec_eq(q.rotate(v), q.to_dcm() * v);
            assert_vec_eq(q.conjugate().rotate(q.rotate(v)), v);
        }
    }

    #[test]
    fn quarter_turn_about_z() {
        let q = UnitQuaternion::from_axis_angle(core::f64::consts::FRAC_PI_2 as Float, Vector3::new(0.0, 0.0, 2.0))
            .unwrap();
        assert_vec_eq(q.rotate(Vector3::new(1.0, 0.0, 0.0)), Vector3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn exp_map() {
        assert_eq!(UnitQuaternion::exp(Vector3::ZERO), UnitQuaternion::IDENTITY);
        let v = Vector3::new(0.0, 0.0, 0.3);
        let q = UnitQuaternion::exp(v);
        assert_abs_diff_eq!(q.w(), cos(0.3), epsilon = 1e-12);
        assert_abs_diff_eq!(q.z(), sin(0.3), epsilon = 1e-12);
        // rotation angle is twice the vector magnitude
        let expected = UnitQuaternion::from_axis_angle(0.6, v).unwrap();
        assert_quat_eq(q.quaternion(), expected.quaternion());
    }

    #[test]
    fn euler_round_trip() {
        let angles = EulerAngles {
            roll: 0.3,
            pitch: -0.7,
            yaw: 2.1,
        };
        let q = UnitQuaternion::from_euler(angles).unwrap();
        let back = q.euler_angles();
        assert_abs_diff_eq!(back.roll, angles.roll, epsilon = 1e-9);
        assert_abs_diff_eq!(back.pitch, angles.pitch, epsilon = 1e-9);
        assert_abs_diff_eq!(back.yaw, angles.yaw, epsilon = 1e-9);
    }

    #[test]
    fn euler_pitch_is_clamped_at_gimbal_lock() {
        // slightly more than norm one in the pitch term before clamping
        let h = core::f64::consts::FRAC_1_SQRT_2 as Float;
        let q = UnitQuaternion(Quaternion::new(h + 1e-9, 0.0, h + 1e-9, 0.0));
        let angles = q.euler_angles();
        assert!(!angles.pitch.is_nan());
        assert_abs_diff_eq!(angles.pitch, core::f64::consts::FRAC_PI_2 as Float, epsilon = 1e-6);
    }

    #[test]
    fn dcm_round_trip() {
        for q in samples() {
            let back = UnitQuaternion::from_dcm(q.to_dcm()).unwrap();
            // q and -q are the same rotation
            assert!(q.angle_to(&back) < 1e-6);
        }
        let half_turn = UnitQuaternion::new(0.0, 1.0, 0.0, 0.0).unwrap();
        assert!(half_turn.angle_to(&UnitQuaternion::from_dcm(half_turn.to_dcm()).unwrap()) < 1e-6);
    }

    #[test]
    fn dcm_is_orthonormal() {
        for q in samples() {
            let r = q.to_dcm();
            let p = r * r.transpose();
            for i in 0..3 {
                for j in 0..3 {
                    let expected = if i == j { 1.0 } else { 0.0 };
                    assert_abs_diff_eq!(p.0[i][j], expected, epsilon = 1e-12);
                }
            }
        }
    }

    #[test]
    fn degenerate_construction_is_rejected() {
        assert_eq!(
            UnitQuaternion::new(0.0, 0.0, 0.0, 0.0),
            Err(Error::DegenerateVector(Quantity::Quaternion))
        );
        assert_eq!(
            UnitQuaternion::from_axis_angle(1.0, Vector3::ZERO),
            Err(Error::DegenerateVector(Quantity::Axis))
        );
        assert_eq!(
            UnitQuaternion::try_from(Quaternion::new(Float::NAN, 0.0, 0.0, 1.0)),
            Err(Error::NonFinite(Quantity::Quaternion))
        );
    }

    #[test]
    fn checked_component_access() {
        let q = Quaternion::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(q.get(3), Ok(4.0));
        assert_eq!(q.get(4), Err(Error::IndexOutOfRange { index: 4, len: 4 }));
    }

    #[test]
    fn general_quaternion_arithmetic() {
        let p = Quaternion::new(1.0, 2.0, 3.0, 4.0);
        let q = Quaternion::new(0.5, -1.0, 0.0, 2.0);
        assert_eq!(p + q - q, p);
        assert_eq!(2.0 * p, p * 2.0);
        assert_eq!((p * 2.0) / 2.0, p);
        assert_eq!(-p + p, Quaternion::default());
        assert_eq!(p / q, p * q.conjugate());
        assert_eq!(Quaternion::from(Vector3::new(1.0, 2.0, 3.0)).vector(), Vector3::new(1.0, 2.0, 3.0));
    }
}
