/// 4x4 projection matrices
use approx::AbsDiffEq;
use std::fmt;
use std::ops;

use crate::vec::{Vec4, EPSILON};

/// Column-major 4x4 matrix with right/up/back/translation columns.
///
/// Used for projections, so the bottom row is not assumed to be `[0, 0, 0, 1]`.
/// The projection builders work in `f64` and only round to `f32` when storing.
#[derive(Debug, Copy, Clone)]
pub struct Mat4 {
    pub right: Vec4,
    pub up: Vec4,
    pub back: Vec4,
    pub translation: Vec4,
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mat4 {
    pub const fn identity() -> Self {
        Self {
            right: Vec4::new(1.0, 0.0, 0.0, 0.0),
            up: Vec4::new(0.0, 1.0, 0.0, 0.0),
            back: Vec4::new(0.0, 0.0, 1.0, 0.0),
            translation: Vec4::new(0.0, 0.0, 0.0, 1.0),
        }
    }

    pub const fn zero() -> Self {
        Self {
            right: Vec4::zero(),
            up: Vec4::zero(),
            back: Vec4::zero(),
            translation: Vec4::zero(),
        }
    }

    pub const fn from_cols(right: Vec4, up: Vec4, back: Vec4, translation: Vec4) -> Self {
        Self {
            right,
            up,
            back,
            translation,
        }
    }

    pub fn set_to_identity(&mut self) {
        *self = Self::identity();
    }

    pub fn set_to_zero(&mut self) {
        *self = Self::zero();
    }

    /// Symmetric perspective frustum from a vertical field of view in degrees.
    pub fn set_to_perspective_projection(
        &mut self,
        vertical_fov_degrees: f64,
        aspect_ratio: f64,
        near_plane_z: f64,
        far_plane_z: f64,
    ) {
        let tan_half = (vertical_fov_degrees.to_radians() / 2.0).tan();
        let depth = near_plane_z - far_plane_z;

        self.set_to_zero();
        self.right.x = (1.0 / (aspect_ratio * tan_half)) as f32;
        self.up.y = (1.0 / tan_half) as f32;
        self.back.z = ((near_plane_z + far_plane_z) / depth) as f32;
        self.back.w = -1.0;
        self.translation.z = (2.0 * far_plane_z * near_plane_z / depth) as f32;
    }

    /// Off-center perspective frustum given its clip planes.
    pub fn set_to_asymmetric_perspective_projection(
        &mut self,
        left: f64,
        right: f64,
        bottom: f64,
        top: f64,
        near_plane_z: f64,
        far_plane_z: f64,
    ) {
        let width = right - left;
        let height = top - bottom;
        let depth = near_plane_z - far_plane_z;

        self.set_to_zero();
        self.right.x = (2.0 * near_plane_z / width) as f32;
        self.up.y = (2.0 * near_plane_z / height) as f32;
        self.back.x = ((right + left) / width) as f32;
        self.back.y = ((top + bottom) / height) as f32;
        self.back.z = ((near_plane_z + far_plane_z) / depth) as f32;
        self.back.w = -1.0;
        self.translation.z = (2.0 * far_plane_z * near_plane_z / depth) as f32;
    }

    pub fn set_to_orthographic_projection(
        &mut self,
        left: f64,
        right: f64,
        bottom: f64,
        top: f64,
        near_plane_z: f64,
        far_plane_z: f64,
    ) {
        let width = right - left;
        let height = top - bottom;
        let depth = near_plane_z - far_plane_z;

        self.set_to_zero();
        self.right.x = (2.0 / width) as f32;
        self.up.y = (2.0 / height) as f32;
        self.back.z = (2.0 / depth) as f32;
        self.translation = Vec4::new(
            (-(right + left) / width) as f32,
            (-(top + bottom) / height) as f32,
            ((near_plane_z + far_plane_z) / depth) as f32,
            1.0,
        );
    }

    /// The sixteen elements in column-major order.
    pub fn to_cols_array(&self) -> [f32; 16] {
        let mut out = [0.0; 16];
        for (chunk, col) in out
            .chunks_exact_mut(4)
            .zip([self.right, self.up, self.back, self.translation])
        {
            chunk.copy_from_slice(&col.to_array());
        }
        out
    }

    /// Inverse of [`Mat4::to_cols_array`].
    pub fn from_cols_array(values: &[f32; 16]) -> Self {
        let col = |c: usize| Vec4::new(values[4 * c], values[4 * c + 1], values[4 * c + 2], values[4 * c + 3]);
        Self::from_cols(col(0), col(1), col(2), col(3))
    }

    pub fn transform(&self, v: Vec4) -> Vec4 {
        self.right * v.x + self.up * v.y + self.back * v.z + self.translation * v.w
    }

    fn row(&self, i: usize) -> Vec4 {
        let pick = |c: Vec4| c.to_array()[i];
        Vec4::new(
            pick(self.right),
            pick(self.up),
            pick(self.back),
            pick(self.translation),
        )
    }
}

impl ops::Mul<Vec4> for Mat4 {
    type Output = Vec4;

    fn mul(self, v: Vec4) -> Vec4 {
        self.transform(v)
    }
}

impl ops::Mul for Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: Mat4) -> Mat4 {
        Mat4::from_cols(
            self.transform(rhs.right),
            self.transform(rhs.up),
            self.transform(rhs.back),
            self.transform(rhs.translation),
        )
    }
}

impl PartialEq for Mat4 {
    fn eq(&self, other: &Mat4) -> bool {
        self.right == other.right
            && self.up == other.up
            && self.back == other.back
            && self.translation == other.translation
    }
}

impl AbsDiffEq for Mat4 {
    type Epsilon = f32;

    fn default_epsilon() -> f32 {
        EPSILON
    }

    fn abs_diff_eq(&self, other: &Mat4, epsilon: f32) -> bool {
        self.right.abs_diff_eq(&other.right, epsilon)
            && self.up.abs_diff_eq(&other.up, epsilon)
            && self.back.abs_diff_eq(&other.back, epsilon)
            && self.translation.abs_diff_eq(&other.translation, epsilon)
    }
}

/// Printed in row order, rows separated by newlines.
impl fmt::Display for Mat4 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}\n{}\n{}\n{}", self.row(0), self.row(1), self.row(2), self.row(3))
    }
}
