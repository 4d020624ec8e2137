/// Affine transforms built from a basis matrix and a position
use approx::AbsDiffEq;
use std::fmt;
use std::ops;

use crate::error::MathError;
use crate::mat3::Mat3;
use crate::mat4::Mat4;
use crate::vec::{Vec3, Vec4, EPSILON};

/// An affine map `p' = rot_scale * p + position`.
///
/// `rot_scale` carries rotation together with any scale or shear. The implicit
/// bottom row of the equivalent 4x4 matrix is always `[0, 0, 0, 1]`.
#[derive(Debug, Copy, Clone, Default)]
pub struct Transform {
    rot_scale: Mat3,
    position: Vec3,
}

impl Transform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(rot_scale: Mat3, position: Vec3) -> Self {
        Self {
            rot_scale,
            position,
        }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            rot_scale: Mat3::identity(),
            position,
        }
    }

    /// Back to identity orientation at the origin.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn orthonormalize(&mut self) -> Result<(), MathError> {
        self.rot_scale.orthonormalize()
    }

    /// The equivalent 4x4 matrix.
    pub fn transform(&self) -> Mat4 {
        Mat4::from_cols(
            self.rot_scale.right.extend(0.0),
            self.rot_scale.up.extend(0.0),
            self.rot_scale.back.extend(0.0),
            self.position.extend(1.0),
        )
    }

    /// The equivalent 4x4 matrix as sixteen column-major floats.
    pub fn to_cols_array(&self) -> [f32; 16] {
        self.transform().to_cols_array()
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn set_position_xyz(&mut self, x: f32, y: f32, z: f32) {
        self.position = Vec3::new(x, y, z);
    }

    pub fn right(&self) -> Vec3 {
        self.rot_scale.right
    }

    pub fn up(&self) -> Vec3 {
        self.rot_scale.up
    }

    pub fn back(&self) -> Vec3 {
        self.rot_scale.back
    }

    pub fn orientation(&self) -> Mat3 {
        self.rot_scale
    }

    pub fn set_orientation(&mut self, orientation: Mat3) {
        self.rot_scale = orientation;
    }

    pub fn set_orientation_basis(&mut self, right: Vec3, up: Vec3, back: Vec3) {
        self.rot_scale = Mat3::from_cols(right, up, back);
    }

    pub fn move_right(&mut self, distance: f32) {
        self.move_local(distance, self.rot_scale.right);
    }

    pub fn move_up(&mut self, distance: f32) {
        self.move_local(distance, self.rot_scale.up);
    }

    pub fn move_back(&mut self, distance: f32) {
        self.move_local(distance, self.rot_scale.back);
    }

    /// Move along `local_direction` as given; it is not renormalized, so
    /// scaled basis vectors move proportionally further.
    pub fn move_local(&mut self, distance: f32, local_direction: Vec3) {
        self.position += local_direction * distance;
    }

    /// Move by `rot_scale * (distance * direction)`.
    ///
    /// The direction is taken through the transform's own basis before it is
    /// applied.
    pub fn move_world(&mut self, distance: f32, world_direction: Vec3) {
        self.position += self.rot_scale * (world_direction * distance);
    }

    /// Rotate around the local X axis.
    pub fn pitch(&mut self, angle_degrees: f32) {
        let mut rot = Mat3::identity();
        rot.set_to_rotation_x(angle_degrees);
        self.rot_scale *= rot;
    }

    /// Rotate around the local Y axis.
    pub fn yaw(&mut self, angle_degrees: f32) {
        let mut rot = Mat3::identity();
        rot.set_to_rotation_y(angle_degrees);
        self.rot_scale *= rot;
    }

    /// Rotate around the local Z axis.
    pub fn roll(&mut self, angle_degrees: f32) {
        let mut rot = Mat3::identity();
        rot.set_to_rotation_z(angle_degrees);
        self.rot_scale *= rot;
    }

    pub fn rotate_local(&mut self, angle_degrees: f32, axis: Vec3) -> Result<(), MathError> {
        self.rot_scale *= Mat3::from_angle_axis(angle_degrees, axis)?;
        Ok(())
    }

    /// Rotate around a world axis through the origin; the position orbits too.
    pub fn rotate_world(&mut self, angle_degrees: f32, axis: Vec3) -> Result<(), MathError> {
        let rot = Mat3::from_angle_axis(angle_degrees, axis)?;
        self.rot_scale = rot * self.rot_scale;
        self.position = rot * self.position;
        Ok(())
    }

    /// Orthonormalize the basis around its back vector.
    pub fn align_with_world_y(&mut self) -> Result<(), MathError> {
        self.rot_scale.orthonormalize()
    }

    pub fn scale_local(&mut self, scale: f32) {
        self.rot_scale *= scale;
    }

    pub fn scale_local_nonuniform(&mut self, sx: f32, sy: f32, sz: f32) {
        let mut scale = Mat3::identity();
        scale.set_to_scale_nonuniform(sx, sy, sz);
        self.rot_scale *= scale;
    }

    pub fn scale_world(&mut self, scale: f32) {
        self.scale_world_nonuniform(scale, scale, scale);
    }

    pub fn scale_world_nonuniform(&mut self, sx: f32, sy: f32, sz: f32) {
        let mut scale = Mat3::identity();
        scale.set_to_scale_nonuniform(sx, sy, sz);
        self.rot_scale = scale * self.rot_scale;
    }

    pub fn shear_local_x_by_yz(&mut self, shear_y: f32, shear_z: f32) {
        let mut shear = Mat3::identity();
        shear.set_to_shear_x_by_yz(shear_y, shear_z);
        self.rot_scale *= shear;
    }

    pub fn shear_local_y_by_xz(&mut self, shear_x: f32, shear_z: f32) {
        let mut shear = Mat3::identity();
        shear.set_to_shear_y_by_xz(shear_x, shear_z);
        self.rot_scale *= shear;
    }

    pub fn shear_local_z_by_xy(&mut self, shear_x: f32, shear_y: f32) {
        let mut shear = Mat3::identity();
        shear.set_to_shear_z_by_xy(shear_x, shear_y);
        self.rot_scale *= shear;
    }

    /// Transpose the basis in place. Only an inverse when the basis is a pure
    /// rotation; the position is left untouched.
    pub fn invert_rt(&mut self) {
        self.rot_scale.invert_rotation();
    }

    /// `self = self * t`
    pub fn combine(&mut self, t: &Transform) {
        *self = *self * *t;
    }

    pub fn apply_point(&self, p: Vec3) -> Vec3 {
        self.rot_scale * p + self.position
    }
}

/// `t1 * t2` applies `t2` first, then `t1`.
impl ops::Mul for Transform {
    type Output = Transform;

    fn mul(self, rhs: Transform) -> Transform {
        Transform {
            rot_scale: self.rot_scale * rhs.rot_scale,
            position: self.rot_scale * rhs.position + self.position,
        }
    }
}

impl ops::MulAssign for Transform {
    fn mul_assign(&mut self, rhs: Transform) {
        self.combine(&rhs);
    }
}

impl PartialEq for Transform {
    fn eq(&self, other: &Transform) -> bool {
        self.rot_scale == other.rot_scale && self.position == other.position
    }
}

impl AbsDiffEq for Transform {
    type Epsilon = f32;

    fn default_epsilon() -> f32 {
        EPSILON
    }

    fn abs_diff_eq(&self, other: &Transform, epsilon: f32) -> bool {
        self.rot_scale.abs_diff_eq(&other.rot_scale, epsilon)
            && self.position.abs_diff_eq(&other.position, epsilon)
    }
}

/// The 4x4 equivalent in row order, bottom row included.
impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let rows = self.rot_scale.transposed();
        writeln!(f, "{}{:>10.2}", rows.right, self.position.x)?;
        writeln!(f, "{}{:>10.2}", rows.up, self.position.y)?;
        writeln!(f, "{}{:>10.2}", rows.back, self.position.z)?;
        write!(f, "{}", Vec4::new(0.0, 0.0, 0.0, 1.0))
    }
}
