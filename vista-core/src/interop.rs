/// Conversions to and from nalgebra types
///
/// Both sides store matrices column-major, so conversions copy columns as-is.
use nalgebra::{Matrix3, Matrix4, Vector3, Vector4};

use crate::mat3::Mat3;
use crate::mat4::Mat4;
use crate::transform::Transform;
use crate::vec::{Vec3, Vec4};

impl From<Vec3> for Vector3<f32> {
    fn from(v: Vec3) -> Self {
        Vector3::new(v.x, v.y, v.z)
    }
}

impl From<Vector3<f32>> for Vec3 {
    fn from(v: Vector3<f32>) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

impl From<Vec4> for Vector4<f32> {
    fn from(v: Vec4) -> Self {
        Vector4::new(v.x, v.y, v.z, v.w)
    }
}

impl From<Vector4<f32>> for Vec4 {
    fn from(v: Vector4<f32>) -> Self {
        Vec4::new(v.x, v.y, v.z, v.w)
    }
}

impl From<Mat3> for Matrix3<f32> {
    fn from(m: Mat3) -> Self {
        Matrix3::from_column_slice(&m.to_cols_array())
    }
}

impl From<Matrix3<f32>> for Mat3 {
    fn from(m: Matrix3<f32>) -> Self {
        let col = |c: usize| Vec3::new(m[(0, c)], m[(1, c)], m[(2, c)]);
        Mat3::from_cols(col(0), col(1), col(2))
    }
}

impl From<Mat4> for Matrix4<f32> {
    fn from(m: Mat4) -> Self {
        Matrix4::from_column_slice(&m.to_cols_array())
    }
}

impl From<Matrix4<f32>> for Mat4 {
    fn from(m: Matrix4<f32>) -> Self {
        let col = |c: usize| Vec4::new(m[(0, c)], m[(1, c)], m[(2, c)], m[(3, c)]);
        Mat4::from_cols(col(0), col(1), col(2), col(3))
    }
}

impl From<Transform> for Matrix4<f32> {
    fn from(t: Transform) -> Self {
        t.transform().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::{Orthographic3, Perspective3};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Diagonally dominant, so always invertible
    fn random_mat3(rng: &mut StdRng) -> Mat3 {
        let mut m = Mat3::identity();
        m *= 3.0;
        let values: Vec<f32> = (0..9).map(|_| rng.gen_range(-1.0..1.0)).collect();
        m + Mat3::new(
            values[0], values[1], values[2], values[3], values[4], values[5], values[6], values[7], values[8],
        )
    }

    fn random_vec3(rng: &mut StdRng) -> Vec3 {
        Vec3::new(rng.gen_range(-5.0..5.0), rng.gen_range(-5.0..5.0), rng.gen_range(-5.0..5.0))
    }

    #[test]
    fn test_round_trip_keeps_columns() {
        let m = Mat3::from_cols(Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 5.0, 6.0), Vec3::new(7.0, 8.0, 10.0));
        let n: Matrix3<f32> = m.into();
        assert_eq!(n[(1, 0)], 2.0);
        assert_eq!(n[(0, 1)], 4.0);
        assert_eq!(Mat3::from(n), m);
    }

    #[test]
    fn test_inverse_matches_nalgebra() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..20 {
            let m = random_mat3(&mut rng);
            let expected = Matrix3::from(m).try_inverse().unwrap();
            assert_abs_diff_eq!(m.inverse().unwrap(), Mat3::from(expected), epsilon = 1e-4);
        }
    }

    #[test]
    fn test_determinant_matches_nalgebra() {
        let mut rng = StdRng::seed_from_u64(12);
        for _ in 0..20 {
            let m = random_mat3(&mut rng);
            let expected = Matrix3::from(m).determinant();
            assert_abs_diff_eq!(m.determinant(), expected, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_product_and_transform_match_nalgebra() {
        let mut rng = StdRng::seed_from_u64(13);
        for _ in 0..20 {
            let a = random_mat3(&mut rng);
            let b = random_mat3(&mut rng);
            let v = random_vec3(&mut rng);
            let product = Matrix3::from(a) * Matrix3::from(b);
            assert_abs_diff_eq!(a * b, Mat3::from(product), epsilon = 1e-4);
            assert_abs_diff_eq!(a * v, Vec3::from(Matrix3::from(a) * Vector3::from(v)), epsilon = 1e-4);
        }
    }

    #[test]
    fn test_transform_composition_matches_nalgebra() {
        let mut rng = StdRng::seed_from_u64(14);
        let mut a = Transform::from_position(random_vec3(&mut rng));
        a.yaw(35.0);
        a.scale_local_nonuniform(1.0, 2.0, 0.5);
        let mut b = Transform::from_position(random_vec3(&mut rng));
        b.pitch(-20.0);
        b.shear_local_y_by_xz(0.3, -0.2);

        let expected = Matrix4::from(a) * Matrix4::from(b);
        assert_abs_diff_eq!((a * b).transform(), Mat4::from(expected), epsilon = 1e-4);

        let p = random_vec3(&mut rng);
        let h = Matrix4::from(a) * Vector4::from(p.extend(1.0));
        assert_abs_diff_eq!(a.apply_point(p), Vec4::from(h).truncate(), epsilon = 1e-4);
    }

    #[test]
    fn test_projections_match_nalgebra() {
        let mut m = Mat4::identity();
        m.set_to_perspective_projection(50.0, 4.0 / 3.0, 0.01, 40.0);
        let expected = Perspective3::new(4.0f32 / 3.0, 50.0f32.to_radians(), 0.01, 40.0).to_homogeneous();
        assert_abs_diff_eq!(m, Mat4::from(expected), epsilon = 1e-4);

        m.set_to_orthographic_projection(-4.0, 6.0, -6.0, 5.0, 0.01, 30.0);
        let expected = Orthographic3::new(-4.0f32, 6.0, -6.0, 5.0, 0.01, 30.0).to_homogeneous();
        assert_abs_diff_eq!(m, Mat4::from(expected), epsilon = 1e-5);
    }
}
