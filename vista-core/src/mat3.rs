/// 3x3 basis matrix stored as right/up/back columns
use approx::AbsDiffEq;
use std::fmt;
use std::ops;

use crate::error::MathError;
use crate::vec::{Vec3, EPSILON};

/// Relative size below which a determinant is treated as zero
const SINGULAR_TOLERANCE: f32 = 1e-6;

/// Column-major 3x3 matrix. Vectors are transformed as `v' = M * v`.
///
/// The columns are the images of the X, Y and Z axes, named after the local
/// frame they describe. Orthonormality is not maintained automatically; call
/// [`Mat3::orthonormalize`] when it is needed.
#[derive(Debug, Copy, Clone)]
pub struct Mat3 {
    pub right: Vec3,
    pub up: Vec3,
    pub back: Vec3,
}

impl Default for Mat3 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mat3 {
    pub const fn identity() -> Self {
        Self {
            right: Vec3::X,
            up: Vec3::Y,
            back: Vec3::Z,
        }
    }

    pub const fn zero() -> Self {
        Self {
            right: Vec3::zero(),
            up: Vec3::zero(),
            back: Vec3::zero(),
        }
    }

    /// Build from nine scalars in column order.
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        rx: f32,
        ry: f32,
        rz: f32,
        ux: f32,
        uy: f32,
        uz: f32,
        bx: f32,
        by: f32,
        bz: f32,
    ) -> Self {
        Self {
            right: Vec3::new(rx, ry, rz),
            up: Vec3::new(ux, uy, uz),
            back: Vec3::new(bx, by, bz),
        }
    }

    pub const fn from_cols(right: Vec3, up: Vec3, back: Vec3) -> Self {
        Self { right, up, back }
    }

    /// Build from right and up, with back = right x up.
    pub fn from_right_up(right: Vec3, up: Vec3) -> Self {
        Self {
            right,
            up,
            back: right.cross(&up),
        }
    }

    /// Like [`Mat3::from_right_up`], followed by [`Mat3::orthonormalize`].
    pub fn from_right_up_orthonormal(right: Vec3, up: Vec3) -> Result<Self, MathError> {
        let mut m = Self::from_right_up(right, up);
        m.orthonormalize()?;
        Ok(m)
    }

    pub fn set_to_identity(&mut self) {
        *self = Self::identity();
    }

    pub fn set_to_zero(&mut self) {
        *self = Self::zero();
    }

    /// The nine elements in column-major order.
    pub fn to_cols_array(&self) -> [f32; 9] {
        [
            self.right.x,
            self.right.y,
            self.right.z,
            self.up.x,
            self.up.y,
            self.up.z,
            self.back.x,
            self.back.y,
            self.back.z,
        ]
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn set_right(&mut self, right: Vec3) {
        self.right = right;
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn set_up(&mut self, up: Vec3) {
        self.up = up;
    }

    pub fn back(&self) -> Vec3 {
        self.back
    }

    pub fn set_back(&mut self, back: Vec3) {
        self.back = back;
    }

    /// The negated back vector.
    pub fn forward(&self) -> Vec3 {
        -self.back
    }

    pub fn set_forward(&mut self, forward: Vec3) {
        self.back = -forward;
    }

    /// Invert a pure rotation by transposing it.
    pub fn invert_rotation(&mut self) {
        self.transpose();
    }

    /// General inverse via the adjugate.
    ///
    /// Fails with [`MathError::SingularMatrix`] when the determinant is
    /// negligible relative to the product of the column lengths, leaving the
    /// matrix unchanged.
    pub fn invert(&mut self) -> Result<(), MathError> {
        let det = self.determinant();
        let scale = self.right.length() * self.up.length() * self.back.length();
        if !det.is_finite() || det.abs() <= SINGULAR_TOLERANCE * scale {
            return Err(MathError::SingularMatrix { determinant: det });
        }

        // Rows of the adjugate are the pairwise cross products of the columns.
        let r0 = self.up.cross(&self.back);
        let r1 = self.back.cross(&self.right);
        let r2 = self.right.cross(&self.up);
        let inv = 1.0 / det;
        *self = Self::new(
            r0.x * inv,
            r1.x * inv,
            r2.x * inv,
            r0.y * inv,
            r1.y * inv,
            r2.y * inv,
            r0.z * inv,
            r1.z * inv,
            r2.z * inv,
        );
        Ok(())
    }

    pub fn inverse(&self) -> Result<Self, MathError> {
        let mut m = *self;
        m.invert()?;
        Ok(m)
    }

    /// Cofactor expansion along the first row.
    pub fn determinant(&self) -> f32 {
        let (a, b, c) = (self.right, self.up, self.back);
        a.x * (b.y * c.z - c.y * b.z) - b.x * (a.y * c.z - c.y * a.z) + c.x * (a.y * b.z - b.y * a.z)
    }

    pub fn transpose(&mut self) {
        std::mem::swap(&mut self.right.y, &mut self.up.x);
        std::mem::swap(&mut self.right.z, &mut self.back.x);
        std::mem::swap(&mut self.up.z, &mut self.back.y);
    }

    pub fn transposed(&self) -> Self {
        let mut m = *self;
        m.transpose();
        m
    }

    /// Make the basis orthonormal, keeping the back direction.
    ///
    /// Back is normalized first, then right is rebuilt as up x back and up as
    /// back x right.
    pub fn orthonormalize(&mut self) -> Result<(), MathError> {
        self.back.normalize()?;
        self.right = self.up.cross(&self.back).normalized()?;
        self.up = self.back.cross(&self.right).normalized()?;
        Ok(())
    }

    pub fn set_to_scale(&mut self, scale: f32) {
        self.set_to_scale_nonuniform(scale, scale, scale);
    }

    pub fn set_to_scale_nonuniform(&mut self, sx: f32, sy: f32, sz: f32) {
        *self = Self::new(sx, 0.0, 0.0, 0.0, sy, 0.0, 0.0, 0.0, sz);
    }

    /// X gains `shear_y * y + shear_z * z`.
    pub fn set_to_shear_x_by_yz(&mut self, shear_y: f32, shear_z: f32) {
        *self = Self::new(1.0, 0.0, 0.0, shear_y, 1.0, 0.0, shear_z, 0.0, 1.0);
    }

    /// Y gains `shear_x * x + shear_z * z`.
    pub fn set_to_shear_y_by_xz(&mut self, shear_x: f32, shear_z: f32) {
        *self = Self::new(1.0, shear_x, 0.0, 0.0, 1.0, 0.0, 0.0, shear_z, 1.0);
    }

    /// Z gains `shear_x * x + shear_y * y`.
    pub fn set_to_shear_z_by_xy(&mut self, shear_x: f32, shear_y: f32) {
        *self = Self::new(1.0, 0.0, shear_x, 0.0, 1.0, shear_y, 0.0, 0.0, 1.0);
    }

    pub fn set_to_rotation_x(&mut self, angle_degrees: f32) {
        *self = Self::rodrigues(angle_degrees, Vec3::X);
    }

    pub fn set_to_rotation_y(&mut self, angle_degrees: f32) {
        *self = Self::rodrigues(angle_degrees, Vec3::Y);
    }

    pub fn set_to_rotation_z(&mut self, angle_degrees: f32) {
        *self = Self::rodrigues(angle_degrees, Vec3::Z);
    }

    /// Rotation of `angle_degrees` around `axis`, which need not be unit length.
    pub fn set_from_angle_axis(&mut self, angle_degrees: f32, axis: Vec3) -> Result<(), MathError> {
        *self = Self::rodrigues(angle_degrees, axis.normalized()?);
        Ok(())
    }

    pub fn from_angle_axis(angle_degrees: f32, axis: Vec3) -> Result<Self, MathError> {
        Ok(Self::rodrigues(angle_degrees, axis.normalized()?))
    }

    /// `I + W sin(t) + W^2 (1 - cos(t))` with W the cross-product matrix of `axis`
    fn rodrigues(angle_degrees: f32, axis: Vec3) -> Self {
        let (sin, cos) = angle_degrees.to_radians().sin_cos();
        let omega = Self::new(0.0, axis.z, -axis.y, -axis.z, 0.0, axis.x, axis.y, -axis.x, 0.0);
        Self::identity() + omega * sin + (omega * omega) * (1.0 - cos)
    }

    /// Scale every element by -1.
    pub fn negate(&mut self) {
        self.right.negate();
        self.up.negate();
        self.back.negate();
    }

    #[inline]
    pub fn transform(&self, v: Vec3) -> Vec3 {
        self.right * v.x + self.up * v.y + self.back * v.z
    }
}

impl ops::AddAssign for Mat3 {
    fn add_assign(&mut self, rhs: Mat3) {
        self.right += rhs.right;
        self.up += rhs.up;
        self.back += rhs.back;
    }
}

impl ops::SubAssign for Mat3 {
    fn sub_assign(&mut self, rhs: Mat3) {
        self.right -= rhs.right;
        self.up -= rhs.up;
        self.back -= rhs.back;
    }
}

impl ops::MulAssign<f32> for Mat3 {
    fn mul_assign(&mut self, scalar: f32) {
        self.right *= scalar;
        self.up *= scalar;
        self.back *= scalar;
    }
}

impl ops::MulAssign<Mat3> for Mat3 {
    /// `self = self * rhs`
    fn mul_assign(&mut self, rhs: Mat3) {
        *self = Self::from_cols(
            self.transform(rhs.right),
            self.transform(rhs.up),
            self.transform(rhs.back),
        );
    }
}

impl ops::Add for Mat3 {
    type Output = Mat3;

    fn add(mut self, rhs: Mat3) -> Mat3 {
        self += rhs;
        self
    }
}

impl ops::Sub for Mat3 {
    type Output = Mat3;

    fn sub(mut self, rhs: Mat3) -> Mat3 {
        self -= rhs;
        self
    }
}

impl ops::Neg for Mat3 {
    type Output = Mat3;

    fn neg(mut self) -> Mat3 {
        self.negate();
        self
    }
}

impl ops::Mul<f32> for Mat3 {
    type Output = Mat3;

    fn mul(mut self, scalar: f32) -> Mat3 {
        self *= scalar;
        self
    }
}

impl ops::Mul<Mat3> for f32 {
    type Output = Mat3;

    fn mul(self, m: Mat3) -> Mat3 {
        m * self
    }
}

impl ops::Mul for Mat3 {
    type Output = Mat3;

    fn mul(mut self, rhs: Mat3) -> Mat3 {
        self *= rhs;
        self
    }
}

impl ops::Mul<Vec3> for Mat3 {
    type Output = Vec3;

    fn mul(self, v: Vec3) -> Vec3 {
        self.transform(v)
    }
}

impl PartialEq for Mat3 {
    fn eq(&self, other: &Mat3) -> bool {
        self.right == other.right && self.up == other.up && self.back == other.back
    }
}

impl AbsDiffEq for Mat3 {
    type Epsilon = f32;

    fn default_epsilon() -> f32 {
        EPSILON
    }

    fn abs_diff_eq(&self, other: &Mat3, epsilon: f32) -> bool {
        self.right.abs_diff_eq(&other.right, epsilon)
            && self.up.abs_diff_eq(&other.up, epsilon)
            && self.back.abs_diff_eq(&other.back, epsilon)
    }
}

/// Printed in row order, one line per row.
impl fmt::Display for Mat3 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let t = self.transposed();
        writeln!(f, "{}", t.right)?;
        writeln!(f, "{}", t.up)?;
        writeln!(f, "{}", t.back)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sample() -> Mat3 {
        Mat3::new(4.3, 31415.0, -1.2, 4.5, 2.2, 1.0, -12345.0, 2.12, 23.0)
    }

    fn general() -> Mat3 {
        Mat3::new(2.0, -1.0, 0.5, 0.3, 3.0, 1.0, -1.5, 0.25, 4.0)
    }

    fn assert_orthonormal(m: &Mat3) {
        assert!((m.right.length() - 1.0).abs() < 1e-5);
        assert!((m.up.length() - 1.0).abs() < 1e-5);
        assert!((m.back.length() - 1.0).abs() < 1e-5);
        assert!(m.right.dot(&m.up).abs() < 1e-5);
        assert!(m.right.dot(&m.back).abs() < 1e-5);
        assert!(m.up.dot(&m.back).abs() < 1e-5);
    }

    #[test]
    fn test_default_is_identity() {
        let m = Mat3::default();
        assert_eq!(m.right, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(m.up, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(m.back, Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_column_major_data() {
        let m = sample();
        assert_eq!(
            m.to_cols_array(),
            [4.3, 31415.0, -1.2, 4.5, 2.2, 1.0, -12345.0, 2.12, 23.0]
        );
        assert_eq!(m.forward(), Vec3::new(12345.0, -2.12, -23.0));
    }

    #[test]
    fn test_from_right_up() {
        let m = Mat3::from_right_up(Vec3::X * 2.0, Vec3::Y);
        assert_eq!(m.back, Vec3::new(0.0, 0.0, 2.0));

        let m = Mat3::from_right_up_orthonormal(Vec3::new(1.0, 0.2, 0.0), Vec3::new(0.1, 1.0, 0.0)).unwrap();
        assert_orthonormal(&m);
        assert_eq!(m.back, Vec3::Z);
    }

    #[test]
    fn test_set_to_zero_and_identity() {
        let mut m = sample();
        m.set_to_zero();
        assert_eq!(m.to_cols_array(), [0.0; 9]);
        m.set_to_identity();
        assert_eq!(m, Mat3::identity());
    }

    #[test]
    fn test_determinant() {
        assert!((Mat3::identity().determinant() - 1.0).abs() < 1e-6);
        let mut s = Mat3::identity();
        s.set_to_scale_nonuniform(2.0, 3.0, 4.0);
        assert!((s.determinant() - 24.0).abs() < 1e-5);
        let m = Mat3::new(1.0, 4.0, 7.0, 2.0, 5.0, 8.0, 3.0, 6.0, 10.0);
        assert!((m.determinant() - -3.0).abs() < 1e-4);
    }

    #[test]
    fn test_invert_round_trip() {
        let original = general();
        let mut m = original;
        m.invert().unwrap();
        assert_abs_diff_eq!(original * m, Mat3::identity(), epsilon = 1e-5);
        m.invert().unwrap();
        assert_abs_diff_eq!(m, original, epsilon = 1e-4);
    }

    #[test]
    fn test_invert_singular() {
        let mut m = Mat3::new(1.0, 2.0, 3.0, 2.0, 4.0, 6.0, 0.0, 1.0, 1.0);
        let before = m;
        assert!(matches!(m.invert(), Err(MathError::SingularMatrix { .. })));
        assert_eq!(m, before);
        assert!(Mat3::zero().inverse().is_err());
    }

    #[test]
    fn test_invert_rotation_matches_invert() {
        let r = Mat3::from_angle_axis(37.0, Vec3::new(1.0, 2.0, -0.5)).unwrap();
        let mut transposed = r;
        transposed.invert_rotation();
        assert_abs_diff_eq!(transposed, r.inverse().unwrap(), epsilon = 1e-5);
    }

    #[test]
    fn test_transpose_twice() {
        let original = sample();
        let mut m = original;
        m.transpose();
        assert_eq!(m.right, Vec3::new(4.3, 4.5, -12345.0));
        m.transpose();
        assert_eq!(m, original);
    }

    #[test]
    fn test_orthonormalize_keeps_back() {
        let mut m = Mat3::from_cols(
            Vec3::new(1.0, 0.3, 0.0),
            Vec3::new(0.2, 1.0, 0.1),
            Vec3::new(0.0, 0.0, 3.0),
        );
        m.orthonormalize().unwrap();
        assert_orthonormal(&m);
        assert_eq!(m.back, Vec3::Z);

        let once = m;
        m.orthonormalize().unwrap();
        assert_eq!(m, once);
    }

    #[test]
    fn test_orthonormalize_degenerate() {
        let mut m = Mat3::from_cols(Vec3::X, Vec3::Z, Vec3::Z);
        assert_eq!(m.orthonormalize(), Err(MathError::DegenerateVector));
    }

    #[test]
    fn test_rotations() {
        let mut m = Mat3::identity();
        m.set_to_rotation_z(90.0);
        assert_eq!(m.transform(Vec3::X), Vec3::Y);
        m.set_to_rotation_x(90.0);
        assert_eq!(m.transform(Vec3::Y), Vec3::Z);
        m.set_to_rotation_y(90.0);
        assert_eq!(m.transform(Vec3::Z), Vec3::X);
    }

    #[test]
    fn test_angle_axis_is_orthonormal_and_fixes_axis() {
        let axis = Vec3::new(2.0, -3.0, 1.5);
        for angle in [0.0, 15.0, 90.0, 170.0, -260.0] {
            let mut m = Mat3::zero();
            m.set_from_angle_axis(angle, axis).unwrap();
            assert_orthonormal(&m);
            assert!((m.determinant() - 1.0).abs() < 1e-5);
            assert_abs_diff_eq!(m.transform(axis), axis, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_angle_axis_zero_axis() {
        let mut m = Mat3::identity();
        assert_eq!(m.set_from_angle_axis(30.0, Vec3::zero()), Err(MathError::DegenerateVector));
    }

    #[test]
    fn test_scale_and_shear() {
        let mut m = Mat3::identity();
        m.set_to_scale(3.0);
        assert_eq!(m.transform(Vec3::new(1.0, 2.0, 3.0)), Vec3::new(3.0, 6.0, 9.0));

        m.set_to_shear_x_by_yz(0.5, 2.0);
        assert_eq!(m.transform(Vec3::new(1.0, 2.0, 3.0)), Vec3::new(8.0, 2.0, 3.0));
        m.set_to_shear_y_by_xz(0.5, 2.0);
        assert_eq!(m.transform(Vec3::new(1.0, 2.0, 3.0)), Vec3::new(1.0, 8.5, 3.0));
        m.set_to_shear_z_by_xy(0.5, 2.0);
        assert_eq!(m.transform(Vec3::new(1.0, 2.0, 3.0)), Vec3::new(1.0, 2.0, 7.5));
    }

    #[test]
    fn test_negate_flips_all_elements() {
        let mut m = sample();
        m.negate();
        let expected: Vec<f32> = sample().to_cols_array().iter().map(|v| -v).collect();
        assert_eq!(m.to_cols_array().to_vec(), expected);
        assert_eq!(-sample(), m);
    }

    #[test]
    fn test_operators() {
        let a = general();
        let b = Mat3::from_angle_axis(45.0, Vec3::Y).unwrap();
        assert_eq!((a + b) - b, a);
        assert_eq!(a * 2.0, 2.0 * a);
        assert_eq!(a * 2.0, a + a);

        let ab = a * b;
        assert_eq!(ab.up, a * b.up);
        let v = Vec3::new(0.3, -1.0, 2.0);
        assert_abs_diff_eq!(ab * v, a * (b * v), epsilon = 1e-5);
    }

    #[test]
    fn test_display_in_row_order() {
        let text = format!("{}", sample());
        assert_eq!(
            text,
            "      4.30      4.50 -12345.00\n  31415.00      2.20      2.12\n     -1.20      1.00     23.00\n"
        );
    }
}
