/// Camera pose and projection
use log::{debug, trace};
use std::cell::Cell;

use crate::error::MathError;
use crate::mat3::Mat3;
use crate::mat4::Mat4;
use crate::transform::Transform;
use crate::vec::Vec3;

/// Which builder produced the camera's current projection matrix
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionMode {
    SymmetricPerspective {
        vertical_fov: f64,
        aspect: f64,
        near: f64,
        far: f64,
    },
    AsymmetricPerspective {
        left: f64,
        right: f64,
        bottom: f64,
        top: f64,
        near: f64,
        far: f64,
    },
    Orthographic {
        left: f64,
        right: f64,
        bottom: f64,
        top: f64,
        near: f64,
        far: f64,
    },
}

/// A viewer with a pose and an independently settable projection.
///
/// The view matrix is derived from the pose on demand and cached until the
/// next pose change.
#[derive(Debug, Clone)]
pub struct Camera {
    world: Transform,
    view: Cell<Option<Transform>>,
    projection: Mat4,
    mode: ProjectionMode,
    original_eye: Vec3,
    original_back: Vec3,
}

impl Camera {
    /// Place a camera at `eye` looking down `-back`, with a symmetric
    /// perspective projection.
    ///
    /// `back` need not be unit length but must not be zero or parallel to
    /// world Y, since world Y seeds the up direction.
    pub fn new(
        eye: Vec3,
        back: Vec3,
        near: f64,
        far: f64,
        aspect: f64,
        vertical_fov_degrees: f64,
    ) -> Result<Self, MathError> {
        let original_back = back.normalized()?;
        let mut world = Transform::from_position(eye);
        world.set_orientation(basis_from_back(back)?);

        let mut camera = Self {
            world,
            view: Cell::new(None),
            projection: Mat4::identity(),
            mode: ProjectionMode::SymmetricPerspective {
                vertical_fov: vertical_fov_degrees,
                aspect,
                near,
                far,
            },
            original_eye: eye,
            original_back,
        };
        camera.set_projection_symmetric_perspective(vertical_fov_degrees, aspect, near, far);
        debug!("camera created at ({}) looking along ({})", eye, -original_back);
        Ok(camera)
    }

    pub fn world(&self) -> &Transform {
        &self.world
    }

    pub fn position(&self) -> Vec3 {
        self.world.position()
    }

    pub fn right(&self) -> Vec3 {
        self.world.right()
    }

    pub fn up(&self) -> Vec3 {
        self.world.up()
    }

    pub fn back(&self) -> Vec3 {
        self.world.back()
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.world.set_position(position);
        self.invalidate_view();
    }

    pub fn move_right(&mut self, distance: f32) {
        self.world.move_right(distance);
        self.invalidate_view();
    }

    pub fn move_up(&mut self, distance: f32) {
        self.world.move_up(distance);
        self.invalidate_view();
    }

    pub fn move_back(&mut self, distance: f32) {
        self.world.move_back(distance);
        self.invalidate_view();
    }

    pub fn pitch(&mut self, degrees: f32) {
        self.world.pitch(degrees);
        self.invalidate_view();
    }

    pub fn yaw(&mut self, degrees: f32) {
        self.world.yaw(degrees);
        self.invalidate_view();
    }

    pub fn roll(&mut self, degrees: f32) {
        self.world.roll(degrees);
        self.invalidate_view();
    }

    /// World-to-eye transform: the transposed orientation composed with the
    /// negated position.
    pub fn view_matrix(&self) -> Transform {
        if let Some(view) = self.view.get() {
            return view;
        }

        let mut rotate_inverse = Transform::new();
        rotate_inverse.set_orientation(self.world.orientation());
        rotate_inverse.invert_rt();
        let translate_inverse = Transform::from_position(-self.world.position());
        let view = rotate_inverse * translate_inverse;

        trace!("recomputed view matrix");
        self.view.set(Some(view));
        view
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    pub fn projection_mode(&self) -> ProjectionMode {
        self.mode
    }

    pub fn set_projection_symmetric_perspective(
        &mut self,
        vertical_fov_degrees: f64,
        aspect: f64,
        near: f64,
        far: f64,
    ) {
        self.projection
            .set_to_perspective_projection(vertical_fov_degrees, aspect, near, far);
        self.mode = ProjectionMode::SymmetricPerspective {
            vertical_fov: vertical_fov_degrees,
            aspect,
            near,
            far,
        };
        trace!("projection set to {:?}", self.mode);
    }

    pub fn set_projection_asymmetric_perspective(
        &mut self,
        left: f64,
        right: f64,
        bottom: f64,
        top: f64,
        near: f64,
        far: f64,
    ) {
        self.projection
            .set_to_asymmetric_perspective_projection(left, right, bottom, top, near, far);
        self.mode = ProjectionMode::AsymmetricPerspective {
            left,
            right,
            bottom,
            top,
            near,
            far,
        };
        trace!("projection set to {:?}", self.mode);
    }

    pub fn set_projection_orthographic(
        &mut self,
        left: f64,
        right: f64,
        bottom: f64,
        top: f64,
        near: f64,
        far: f64,
    ) {
        self.projection
            .set_to_orthographic_projection(left, right, bottom, top, near, far);
        self.mode = ProjectionMode::Orthographic {
            left,
            right,
            bottom,
            top,
            near,
            far,
        };
        trace!("projection set to {:?}", self.mode);
    }

    /// Return to the construction-time position and orientation.
    /// The projection is left as it is.
    pub fn reset_pose(&mut self) -> Result<(), MathError> {
        let basis = basis_from_back(self.original_back)?;
        self.world.set_position(self.original_eye);
        self.world.set_orientation(basis);
        self.invalidate_view();
        debug!("camera pose reset");
        Ok(())
    }

    pub fn original_eye(&self) -> Vec3 {
        self.original_eye
    }

    /// Unit length.
    pub fn original_back(&self) -> Vec3 {
        self.original_back
    }

    fn invalidate_view(&mut self) {
        self.view.set(None);
    }
}

/// Orthonormal basis whose back is `back`, seeded with world Y as up
fn basis_from_back(back: Vec3) -> Result<Mat3, MathError> {
    let right = Vec3::Y.cross(&back);
    let up = back.cross(&right);
    Mat3::from_right_up_orthonormal(right, up)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn demo_camera() -> Camera {
        Camera::new(
            Vec3::new(0.0, 0.0, 12.0),
            Vec3::new(0.0, 0.0, 1.0),
            0.01,
            40.0,
            4.0 / 3.0,
            50.0,
        )
        .unwrap()
    }

    #[test]
    fn test_camera_creation() {
        let camera = demo_camera();
        assert_eq!(camera.right(), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(camera.up(), Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(camera.back(), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(camera.position(), Vec3::new(0.0, 0.0, 12.0));
        assert!(matches!(
            camera.projection_mode(),
            ProjectionMode::SymmetricPerspective { .. }
        ));
    }

    #[test]
    fn test_non_unit_oblique_back() {
        let camera = Camera::new(Vec3::zero(), Vec3::new(3.0, 2.0, 3.0), 0.1, 10.0, 1.0, 60.0).unwrap();
        let basis = camera.world().orientation();
        assert_abs_diff_eq!(basis.back, Vec3::new(3.0, 2.0, 3.0).normalized().unwrap(), epsilon = 1e-5);
        assert!(basis.right.dot(&basis.up).abs() < 1e-5);
        assert!(basis.right.y.abs() < 1e-6);
        assert!(basis.up.y > 0.0);
        assert_abs_diff_eq!(camera.original_back().length(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_degenerate_back() {
        assert!(Camera::new(Vec3::zero(), Vec3::zero(), 0.1, 10.0, 1.0, 60.0).is_err());
        assert_eq!(
            Camera::new(Vec3::zero(), Vec3::new(0.0, -2.0, 0.0), 0.1, 10.0, 1.0, 60.0).unwrap_err(),
            MathError::DegenerateVector
        );
    }

    #[test]
    fn test_view_matrix_inverts_pose() {
        let mut camera = demo_camera();
        camera.yaw(25.0);
        camera.pitch(-10.0);
        camera.move_right(1.5);

        let view = camera.view_matrix();
        assert_abs_diff_eq!(view * *camera.world(), Transform::new(), epsilon = 1e-5);
        assert_abs_diff_eq!(view.apply_point(camera.position()), Vec3::zero(), epsilon = 1e-5);
    }

    #[test]
    fn test_view_matrix_cache_invalidated_by_moves() {
        let mut camera = demo_camera();
        let first = camera.view_matrix();
        assert_eq!(first.position(), Vec3::new(0.0, 0.0, -12.0));
        assert_eq!(camera.view_matrix(), first);

        camera.move_back(3.0);
        assert_eq!(camera.view_matrix().position(), Vec3::new(0.0, 0.0, -15.0));

        camera.set_position(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(camera.view_matrix().position(), Vec3::new(-1.0, -2.0, -3.0));

        camera.move_up(1.0);
        assert_eq!(camera.view_matrix().position(), Vec3::new(-1.0, -3.0, -3.0));
    }

    #[test]
    fn test_roll_changes_view() {
        let mut camera = demo_camera();
        let before = camera.view_matrix();
        camera.roll(90.0);
        let after = camera.view_matrix();
        assert_ne!(before, after);
        assert_eq!(after.orientation().transform(Vec3::Y), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_reset_pose_keeps_projection() {
        let mut camera = demo_camera();
        camera.set_projection_orthographic(-4.0, 6.0, -6.0, 5.0, 0.01, 30.0);
        let projection = camera.projection_matrix();

        camera.yaw(40.0);
        camera.roll(15.0);
        camera.move_back(-5.0);
        camera.reset_pose().unwrap();

        assert_eq!(camera.position(), Vec3::new(0.0, 0.0, 12.0));
        assert_eq!(camera.world().orientation(), Mat3::identity());
        assert_eq!(camera.view_matrix().position(), Vec3::new(0.0, 0.0, -12.0));
        assert_eq!(camera.projection_matrix(), projection);
        assert!(matches!(camera.projection_mode(), ProjectionMode::Orthographic { .. }));
    }

    #[test]
    fn test_projection_setters() {
        let mut camera = demo_camera();
        let mut expected = Mat4::identity();

        camera.set_projection_asymmetric_perspective(-4.0, 6.0, -6.0, 5.0, 2.0, 20.0);
        expected.set_to_asymmetric_perspective_projection(-4.0, 6.0, -6.0, 5.0, 2.0, 20.0);
        assert_eq!(camera.projection_matrix(), expected);

        camera.set_projection_symmetric_perspective(30.0, 2.0, 0.5, 10.0);
        expected.set_to_perspective_projection(30.0, 2.0, 0.5, 10.0);
        assert_eq!(camera.projection_matrix(), expected);
        assert_eq!(
            camera.projection_mode(),
            ProjectionMode::SymmetricPerspective {
                vertical_fov: 30.0,
                aspect: 2.0,
                near: 0.5,
                far: 10.0
            }
        );
    }
}
