//! Fixed-size vector and matrix primitives.

use core::ops::{Add, AddAssign, Div, DivAssign, Index, Mul, MulAssign, Neg, Sub, SubAssign};

use crate::{error::Quantity, sqrt, square, Error, Float, Result};

/// A 3D vector: an angular rate, an inertial-frame reference direction or a body-frame
/// observation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vector3 {
    pub x: Float,
    pub y: Float,
    pub z: Float,
}

impl Vector3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: Float, y: Float, z: Float) -> Self {
        Self { x, y, z }
    }

    /// Bounds-checked component access, `0 => x`, `1 => y`, `2 => z`.
    pub fn get(&self, index: usize) -> Result<Float> {
        match index {
            0 => Ok(self.x),
            1 => Ok(self.y),
            2 => Ok(self.z),
            _ => Err(Error::IndexOutOfRange { index, len: 3 }),
        }
    }

    pub fn dot(&self, rhs: &Self) -> Float {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    pub fn cross(&self, rhs: &Self) -> Self {
        Self {
            x: self.y * rhs.z - rhs.y * self.z,
            y: rhs.x * self.z - self.x * rhs.z,
            z: self.x * rhs.y - rhs.x * self.y,
        }
    }

    pub fn magnitude_squared(&self) -> Float {
        square(self.x) + square(self.y) + square(self.z)
    }

    pub fn magnitude(&self) -> Float {
        sqrt(self.magnitude_squared())
    }

    /// Returns the unit vector pointing in the same direction.
    ///
    /// Fails with [`Error::DegenerateVector`] when the magnitude is zero, tagging the error with `what`.
    pub fn try_normalize(&self, what: Quantity) -> Result<Self> {
        if !self.is_finite() {
            return Err(Error::NonFinite(what));
        }
        let n = self.magnitude();
        if n < Float::EPSILON {
            return Err(Error::DegenerateVector(what));
        }
        Ok(*self / n)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub(crate) fn check_finite(&self, what: Quantity) -> Result<()> {
        if self.is_finite() {
            Ok(())
        } else {
            Err(Error::NonFinite(what))
        }
    }
}

impl From<[Float; 3]> for Vector3 {
    fn from(value: [Float; 3]) -> Self {
        Self::new(value[0], value[1], value[2])
    }
}

impl From<Vector3> for [Float; 3] {
    fn from(value: Vector3) -> Self {
        [value.x, value.y, value.z]
    }
}

impl Add for Vector3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vector3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vector3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for Vector3 {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for Vector3 {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<Float> for Vector3 {
    type Output = Self;

    fn mul(self, rhs: Float) -> Self::Output {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Mul<Vector3> for Float {
    type Output = Vector3;

    fn mul(self, rhs: Vector3) -> Self::Output {
        rhs * self
    }
}

impl MulAssign<Float> for Vector3 {
    fn mul_assign(&mut self, rhs: Float) {
        *self = *self * rhs;
    }
}

impl Div<Float> for Vector3 {
    type Output = Self;

    fn div(self, rhs: Float) -> Self::Output {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl DivAssign<Float> for Vector3 {
    fn div_assign(&mut self, rhs: Float) {
        *self = *self / rhs;
    }
}

/// A fixed-size, row-major matrix with `H` rows and `W` columns.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matrix<const W: usize, const H: usize>(pub [[Float; W]; H]);

/// A 3x3 matrix, used to hold direction cosine matrices.
pub type Matrix3 = Matrix<3, 3>;

impl<const W: usize, const H: usize> Default for Matrix<W, H> {
    fn default() -> Self {
        Self([[0.0; W]; H])
    }
}

impl<const W: usize, const H: usize> From<[[Float; W]; H]> for Matrix<W, H> {
    fn from(value: [[Float; W]; H]) -> Self {
        Self(value)
    }
}

impl<const W: usize, const H: usize> Index<(usize, usize)> for Matrix<W, H> {
    type Output = Float;

    /// Indexes by `(row, column)`. Panics when out of range; use [`Matrix::get`] for a checked access.
    fn index(&self, (row, col): (usize, usize)) -> &Self::Output {
        &self.0[row][col]
    }
}

impl<const M: usize, const N: usize, const P: usize> Mul<Matrix<P, N>> for Matrix<N, M> {
    type Output = Matrix<P, M>;

    fn mul(self, rhs: Matrix<P, N>) -> Self::Output {
        let mut out: Matrix<P, M> = Default::default();
        for i in 0..M {
            for j in 0..P {
                let mut val = 0.0;
                for k in 0..N {
                    val += self.0[i][k] * rhs.0[k][j];
                }
                out.0[i][j] = val;
            }
        }
        out
    }
}

impl<const X: usize> MulAssign for Matrix<X, X> {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl<const W: usize, const H: usize> Mul<Float> for Matrix<W, H> {
    type Output = Self;

    fn mul(mut self, rhs: Float) -> Self::Output {
        for row in self.0.iter_mut() {
            for val in row.iter_mut() {
                *val *= rhs;
            }
        }
        self
    }
}

impl<const W: usize, const H: usize> Add for Matrix<W, H> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        let mut out: Self = Default::default();
        for i in 0..W {
            for j in 0..H {
                out.0[j][i] = self.0[j][i] + rhs.0[j][i];
            }
        }
        out
    }
}

impl<const W: usize, const H: usize> AddAssign for Matrix<W, H> {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<const W: usize, const H: usize> Sub for Matrix<W, H> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        let mut out: Self = Default::default();
        for i in 0..W {
            for j in 0..H {
                out.0[j][i] = self.0[j][i] - rhs.0[j][i];
            }
        }
        out
    }
}

impl<const W: usize, const H: usize> SubAssign for Matrix<W, H> {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl<const W: usize, const H: usize> Matrix<W, H> {
    pub fn transpose(self) -> Matrix<H, W> {
        let mut out: Matrix<H, W> = Default::default();
        for i in 0..W {
            for j in 0..H {
                out.0[i][j] = self.0[j][i];
            }
        }
        out
    }

    /// Bounds-checked access by `(row, column)`.
    pub fn get(&self, row: usize, col: usize) -> Result<Float> {
        if row >= H {
            return Err(Error::IndexOutOfRange { index: row, len: H });
        }
        if col >= W {
            return Err(Error::IndexOutOfRange { index: col, len: W });
        }
        Ok(self.0[row][col])
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().flatten().all(|v| v.is_finite())
    }
}

impl<const X: usize> Matrix<X, X> {
    pub fn identity() -> Self {
        let mut out: Self = Default::default();
        for i in 0..X {
            out.0[i][i] = 1.0;
        }
        out
    }

    pub fn trace(&self) -> Float {
        (0..X).map(|i| self.0[i][i]).sum()
    }
}

impl Mul<Vector3> for Matrix3 {
    type Output = Vector3;

    fn mul(self, rhs: Vector3) -> Self::Output {
        let m = &self.0;
        Vector3::new(
            m[0][0] * rhs.x + m[0][1] * rhs.y + m[0][2] * rhs.z,
            m[1][0] * rhs.x + m[1][1] * rhs.y + m[1][2] * rhs.z,
            m[2][0] * rhs.x + m[2][1] * rhs.y + m[2][2] * rhs.z,
        )
    }
}

/// Outer product `u vᵀ`.
pub fn outer(u: Vector3, v: Vector3) -> Matrix3 {
    [
        [u.x * v.x, u.x * v.y, u.x * v.z],
        [u.y * v.x, u.y * v.y, u.y * v.z],
        [u.z * v.x, u.z * v.y, u.z * v.z],
    ]
    .into()
}

/// Skew-symmetric cross-product matrix, `skew(u) * v == u × v`.
pub fn skew(u: Vector3) -> Matrix3 {
    [[0.0, -u.z, u.y], [u.z, 0.0, -u.x], [-u.y, u.x, 0.0]].into()
}

/// Inverse of [`skew`]: extracts the vector from the off-diagonal part of a skew-symmetric matrix.
pub fn vex(m: Matrix3) -> Vector3 {
    Vector3::new(m.0[2][1], m.0[0][2], m.0[1][0])
}
