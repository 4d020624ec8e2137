/// Geometry helpers that turn triangle lists into indexed mesh data
use log::debug;
use rand::Rng;

use crate::error::GeometryError;
use crate::vec::{Vec3, EPSILON};

/// Three corners, counter-clockwise when seen from the front
pub type Triangle = [Vec3; 3];

const VERTICES_PER_TRIANGLE: usize = 3;

/// Deduplicated interleaved vertex floats plus the indices that rebuild the
/// original triangle list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub data: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// See [`index_data`].
    pub fn indexed(geometry: &[f32], floats_per_vertex: usize) -> Result<Self, GeometryError> {
        index_data(geometry, floats_per_vertex)
    }

    pub fn vertex_count(&self, floats_per_vertex: usize) -> usize {
        self.data.len() / floats_per_vertex.max(1)
    }
}

/// Collapse repeated vertices in a flat triangle buffer.
///
/// Two vertices are the same when every float differs by less than 1e-5.
/// This is a linear scan per vertex, so it is meant for small meshes built
/// once, not per frame.
pub fn index_data(geometry: &[f32], floats_per_vertex: usize) -> Result<MeshData, GeometryError> {
    if floats_per_vertex == 0 {
        return Err(GeometryError::ZeroFloatsPerVertex);
    }
    if geometry.len() % (floats_per_vertex * VERTICES_PER_TRIANGLE) != 0 {
        return Err(GeometryError::IncompleteTriangles {
            floats: geometry.len(),
            floats_per_vertex,
        });
    }

    let mut mesh = MeshData::default();
    for vertex in geometry.chunks_exact(floats_per_vertex) {
        let existing = mesh
            .data
            .chunks_exact(floats_per_vertex)
            .position(|other| vertex.iter().zip(other).all(|(a, b)| (a - b).abs() < EPSILON));

        let index = match existing {
            Some(index) => index,
            None => {
                mesh.data.extend_from_slice(vertex);
                mesh.data.len() / floats_per_vertex - 1
            }
        };
        mesh.indices.push(index as u32);
    }

    debug!(
        "indexed {} vertices into {} unique",
        mesh.indices.len(),
        mesh.data.len() / floats_per_vertex
    );
    Ok(mesh)
}

fn face_cross(face: &Triangle) -> Vec3 {
    (face[1] - face[0]).cross(&(face[2] - face[0]))
}

/// Unit normal of each face from `(v1 - v0) x (v2 - v0)`.
pub fn compute_face_normals(faces: &[Triangle]) -> Result<Vec<Vec3>, GeometryError> {
    faces
        .iter()
        .enumerate()
        .map(|(face, corners)| {
            face_cross(corners)
                .normalized()
                .map_err(|_| GeometryError::DegenerateFace { face })
        })
        .collect()
}

/// One normal per face corner, averaged over every face that touches the
/// same position.
///
/// Each contribution is the face normal weighted by the face area and by the
/// corner angle, so many small faces do not outweigh a few large ones.
/// Quadratic in the face count.
pub fn compute_vertex_normals(
    faces: &[Triangle],
    face_normals: &[Vec3],
) -> Result<Vec<Vec3>, GeometryError> {
    check_len(faces.len(), face_normals.len())?;

    let mut normals = Vec::with_capacity(faces.len() * VERTICES_PER_TRIANGLE);
    for (face, corners) in faces.iter().enumerate() {
        for position in corners {
            let mut sum = Vec3::zero();
            for (other, other_corners) in faces.iter().enumerate() {
                for (i, other_position) in other_corners.iter().enumerate() {
                    if position != other_position {
                        continue;
                    }
                    let area = 0.5 * face_cross(other_corners).length();
                    let to_a = other_corners[(i + 1) % 3] - *other_position;
                    let to_b = other_corners[(i + 2) % 3] - *other_position;
                    let angle = to_a
                        .angle_between(&to_b)
                        .map_err(|_| GeometryError::DegenerateFace { face: other })?;
                    sum += face_normals[other] * area.abs() * angle.abs();
                }
            }
            normals.push(sum.normalized().map_err(|_| GeometryError::DegenerateFace { face })?);
        }
    }
    Ok(normals)
}

fn random_color<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    Vec3::new(rng.gen(), rng.gen(), rng.gen())
}

/// One uniformly random RGB color in `[0, 1)` per face.
pub fn random_face_colors<R: Rng + ?Sized>(faces: &[Triangle], rng: &mut R) -> Vec<Vec3> {
    faces.iter().map(|_| random_color(rng)).collect()
}

/// One color per face corner. A position already seen in an earlier face
/// reuses that corner's color.
pub fn random_vertex_colors<R: Rng + ?Sized>(faces: &[Triangle], rng: &mut R) -> Vec<Vec3> {
    let mut colors: Vec<Vec3> = Vec::with_capacity(faces.len() * VERTICES_PER_TRIANGLE);
    for (face, corners) in faces.iter().enumerate() {
        for position in corners {
            let earlier = faces[..face]
                .iter()
                .flatten()
                .position(|other| other == position);
            let color = match earlier {
                Some(slot) => colors[slot],
                None => random_color(rng),
            };
            colors.push(color);
        }
    }
    colors
}

fn check_len(expected: usize, actual: usize) -> Result<(), GeometryError> {
    if expected != actual {
        return Err(GeometryError::LengthMismatch { expected, actual });
    }
    Ok(())
}

/// Interleave each corner position with an attribute picked by `attribute`.
fn interleave(faces: &[Triangle], attribute: impl Fn(usize, usize) -> Vec3) -> Vec<f32> {
    let mut data = Vec::with_capacity(faces.len() * VERTICES_PER_TRIANGLE * 6);
    for (face, corners) in faces.iter().enumerate() {
        for (corner, position) in corners.iter().enumerate() {
            data.extend_from_slice(&position.to_array());
            data.extend_from_slice(&attribute(face, corner).to_array());
        }
    }
    data
}

/// Position and color per corner, the face's color repeated on its corners.
pub fn data_with_face_colors(faces: &[Triangle], face_colors: &[Vec3]) -> Result<Vec<f32>, GeometryError> {
    check_len(faces.len(), face_colors.len())?;
    Ok(interleave(faces, |face, _| face_colors[face]))
}

pub fn data_with_vertex_colors(
    faces: &[Triangle],
    vertex_colors: &[Vec3],
) -> Result<Vec<f32>, GeometryError> {
    check_len(faces.len() * VERTICES_PER_TRIANGLE, vertex_colors.len())?;
    Ok(interleave(faces, |face, corner| {
        vertex_colors[face * VERTICES_PER_TRIANGLE + corner]
    }))
}

pub fn data_with_face_normals(faces: &[Triangle], face_normals: &[Vec3]) -> Result<Vec<f32>, GeometryError> {
    check_len(faces.len(), face_normals.len())?;
    Ok(interleave(faces, |face, _| face_normals[face]))
}

pub fn data_with_vertex_normals(
    faces: &[Triangle],
    vertex_normals: &[Vec3],
) -> Result<Vec<f32>, GeometryError> {
    check_len(faces.len() * VERTICES_PER_TRIANGLE, vertex_normals.len())?;
    Ok(interleave(faces, |face, corner| {
        vertex_normals[face * VERTICES_PER_TRIANGLE + corner]
    }))
}

/// Positions only, three floats per corner.
pub fn positions(faces: &[Triangle]) -> Vec<f32> {
    faces.iter().flatten().flat_map(|p| p.to_array()).collect()
}

/// Unit cube centered on the origin, two triangles per side.
pub fn build_cube() -> Vec<Triangle> {
    let v = Vec3::new;
    vec![
        // Front
        [v(-0.5, 0.5, 0.5), v(-0.5, -0.5, 0.5), v(0.5, 0.5, 0.5)],
        [v(0.5, -0.5, 0.5), v(0.5, 0.5, 0.5), v(-0.5, -0.5, 0.5)],
        // Right
        [v(0.5, 0.5, 0.5), v(0.5, -0.5, 0.5), v(0.5, 0.5, -0.5)],
        [v(0.5, -0.5, -0.5), v(0.5, 0.5, -0.5), v(0.5, -0.5, 0.5)],
        // Back
        [v(0.5, 0.5, -0.5), v(0.5, -0.5, -0.5), v(-0.5, 0.5, -0.5)],
        [v(-0.5, -0.5, -0.5), v(-0.5, 0.5, -0.5), v(0.5, -0.5, -0.5)],
        // Left
        [v(-0.5, 0.5, -0.5), v(-0.5, -0.5, -0.5), v(-0.5, 0.5, 0.5)],
        [v(-0.5, -0.5, 0.5), v(-0.5, 0.5, 0.5), v(-0.5, -0.5, -0.5)],
        // Top
        [v(-0.5, 0.5, -0.5), v(-0.5, 0.5, 0.5), v(0.5, 0.5, -0.5)],
        [v(0.5, 0.5, 0.5), v(0.5, 0.5, -0.5), v(-0.5, 0.5, 0.5)],
        // Bottom
        [v(-0.5, -0.5, 0.5), v(-0.5, -0.5, -0.5), v(0.5, -0.5, 0.5)],
        [v(0.5, -0.5, -0.5), v(0.5, -0.5, 0.5), v(-0.5, -0.5, -0.5)],
    ]
}

/// Regular polygon corners in the XY plane, starting at `start_degrees` and
/// stepping by `step_degrees`.
fn polygon_ring(center: Vec3, sides: usize, side_length: f32, start_degrees: f32, step_degrees: f32) -> Vec<Vec3> {
    let radius = side_length / (2.0 * (180.0 / sides as f32).to_radians().sin());
    (0..sides)
        .map(|k| {
            let angle = (start_degrees + step_degrees * k as f32).to_radians();
            center + Vec3::new(angle.cos(), angle.sin(), 0.0) * radius
        })
        .collect()
}

/// Flat decagon with unit sides facing +Z, closed at the back by a pyramid
/// whose apex sits 2 units behind the center.
///
/// The decagon's leftmost corner is at (-4, 0, 0). The third corner of every
/// triangle is the center or the apex.
pub fn build_decagon_pyramid() -> Vec<Triangle> {
    let radius = 0.5 / 18f32.to_radians().sin();
    let center = Vec3::new(-4.0 + radius, 0.0, 0.0);
    let apex = center - Vec3::Z * 2.0;
    let rim = polygon_ring(center, 10, 1.0, 180.0, 36.0);

    let front = (0..10).map(|k| [rim[k], rim[(k + 1) % 10], center]);
    let back = (0..10).map(|k| [rim[(k + 1) % 10], rim[k], apex]);
    front.chain(back).collect()
}

/// Octagon with unit sides facing -Z, topped by a cone whose apex is 4 units
/// in front of the center.
///
/// The first corner is the origin. The third corner of every triangle is the
/// center or the apex.
pub fn build_octagon_cone() -> Vec<Triangle> {
    let center = Vec3::new((std::f32::consts::SQRT_2 + 1.0) / 2.0, -0.5, 0.0);
    let apex = center + Vec3::Z * 4.0;
    let rim = polygon_ring(center, 8, 1.0, 157.5, -45.0);

    let base = (0..8).map(|k| [rim[k], rim[(k + 1) % 8], center]);
    let cone = (0..8).map(|k| [rim[(k + 1) % 8], rim[k], apex]);
    base.chain(cone).collect()
}
