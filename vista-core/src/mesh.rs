/// Drawable meshes: interleaved vertex data, indices and a world transform
use log::debug;
use std::fmt;
use std::rc::Rc;

use crate::device::{BufferId, BufferTarget, SharedDevice, VertexArrayId};
use crate::error::{MathError, MeshError};
use crate::geometry::MeshData;
use crate::mat4::Mat4;
use crate::shader::{ShaderProgram, MODEL_VIEW_UNIFORM, PROJECTION_UNIFORM};
use crate::transform::Transform;
use crate::vec::Vec3;

pub const POSITION_ATTRIBUTE: u32 = 0;
pub const COLOR_ATTRIBUTE: u32 = 1;
pub const NORMAL_ATTRIBUTE: u32 = 2;

/// One attribute inside an interleaved vertex, measured in floats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub index: u32,
    pub size: usize,
    pub offset: usize,
}

/// How the floats of one vertex are laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    pub floats_per_vertex: usize,
    pub attributes: &'static [VertexAttribute],
}

impl VertexLayout {
    /// `x y z`
    pub const POSITIONS: VertexLayout = VertexLayout {
        floats_per_vertex: 3,
        attributes: &[VertexAttribute {
            index: POSITION_ATTRIBUTE,
            size: 3,
            offset: 0,
        }],
    };

    /// `x y z r g b`
    pub const POSITIONS_COLORS: VertexLayout = VertexLayout {
        floats_per_vertex: 6,
        attributes: &[
            VertexAttribute {
                index: POSITION_ATTRIBUTE,
                size: 3,
                offset: 0,
            },
            VertexAttribute {
                index: COLOR_ATTRIBUTE,
                size: 3,
                offset: 3,
            },
        ],
    };

    /// `x y z nx ny nz`
    pub const POSITIONS_NORMALS: VertexLayout = VertexLayout {
        floats_per_vertex: 6,
        attributes: &[
            VertexAttribute {
                index: POSITION_ATTRIBUTE,
                size: 3,
                offset: 0,
            },
            VertexAttribute {
                index: NORMAL_ATTRIBUTE,
                size: 3,
                offset: 3,
            },
        ],
    };

    pub fn attribute(&self, index: u32) -> Option<&VertexAttribute> {
        self.attributes.iter().find(|a| a.index == index)
    }
}

/// A mesh owns its device buffers and releases them on drop.
///
/// Geometry and indices are collected first, then uploaded once with
/// [`Mesh::prepare`]. The world transform can change at any time.
pub struct Mesh {
    device: SharedDevice,
    shader: Rc<ShaderProgram>,
    layout: VertexLayout,
    vao: VertexArrayId,
    vbo: BufferId,
    ibo: BufferId,
    data: Vec<f32>,
    indices: Vec<u32>,
    prepared: bool,
    world: Transform,
}

impl Mesh {
    pub fn new(device: SharedDevice, shader: Rc<ShaderProgram>, layout: VertexLayout) -> Self {
        let (vao, vbo, ibo) = {
            let mut d = device.borrow_mut();
            (d.gen_vertex_array(), d.gen_buffer(), d.gen_buffer())
        };
        debug!("mesh created with {:?} {:?} {:?}", vao, vbo, ibo);
        Self {
            device,
            shader,
            layout,
            vao,
            vbo,
            ibo,
            data: Vec::new(),
            indices: Vec::new(),
            prepared: false,
            world: Transform::default(),
        }
    }

    pub fn layout(&self) -> VertexLayout {
        self.layout
    }

    pub fn floats_per_vertex(&self) -> usize {
        self.layout.floats_per_vertex
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.data.len() / self.layout.floats_per_vertex
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    /// Append whole vertices in this mesh's layout.
    pub fn add_geometry(&mut self, geometry: &[f32]) -> Result<(), MeshError> {
        if self.prepared {
            return Err(MeshError::AlreadyPrepared);
        }
        let floats_per_vertex = self.layout.floats_per_vertex;
        if geometry.len() % floats_per_vertex != 0 {
            return Err(MeshError::PartialVertex {
                floats: geometry.len(),
                floats_per_vertex,
            });
        }
        self.data.extend_from_slice(geometry);
        Ok(())
    }

    /// Append whole triangles of indices.
    pub fn add_indices(&mut self, indices: &[u32]) -> Result<(), MeshError> {
        if self.prepared {
            return Err(MeshError::AlreadyPrepared);
        }
        if indices.len() % 3 != 0 {
            return Err(MeshError::IncompleteTriangles {
                indices: indices.len(),
            });
        }
        self.indices.extend_from_slice(indices);
        Ok(())
    }

    /// Geometry and indices from [`MeshData`].
    ///
    /// Indices are taken relative to the vertices already present.
    pub fn add_mesh_data(&mut self, mesh: &MeshData) -> Result<(), MeshError> {
        let base = self.vertex_count() as u32;
        self.add_geometry(&mesh.data)?;
        let shifted: Vec<u32> = mesh.indices.iter().map(|i| i + base).collect();
        self.add_indices(&shifted)
    }

    /// Upload the data to the device and describe the vertex attributes.
    pub fn prepare(&mut self) -> Result<(), MeshError> {
        if self.prepared {
            return Err(MeshError::AlreadyPrepared);
        }
        let vertex_count = self.vertex_count();
        if let Some(&index) = self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(MeshError::IndexOutOfRange { index, vertex_count });
        }

        let mut device = self.device.borrow_mut();
        device.bind_vertex_array(Some(self.vao));
        device.bind_buffer(BufferTarget::Vertices, Some(self.vbo));
        device.buffer_data_f32(BufferTarget::Vertices, &self.data);
        device.bind_buffer(BufferTarget::Indices, Some(self.ibo));
        device.buffer_data_u32(BufferTarget::Indices, &self.indices);
        for attribute in self.layout.attributes {
            device.enable_vertex_attrib_array(attribute.index);
            device.vertex_attrib_pointer(
                attribute.index,
                attribute.size,
                self.layout.floats_per_vertex,
                attribute.offset,
            );
        }
        device.bind_vertex_array(None);

        self.prepared = true;
        debug!(
            "mesh {:?} prepared: {} vertices, {} indices",
            self.vao,
            vertex_count,
            self.indices.len()
        );
        Ok(())
    }

    /// Draw with model-view = `view * world`.
    pub fn draw(&self, view: &Transform, projection: &Mat4) -> Result<(), MeshError> {
        if !self.prepared {
            return Err(MeshError::NotPrepared);
        }
        let mut model_view = *view;
        model_view.combine(&self.world);

        self.shader.enable();
        self.shader.set_uniform_matrix(MODEL_VIEW_UNIFORM, &model_view.transform());
        self.shader.set_uniform_matrix(PROJECTION_UNIFORM, projection);
        {
            let mut device = self.device.borrow_mut();
            device.bind_vertex_array(Some(self.vao));
            device.draw_elements(self.indices.len());
            device.bind_vertex_array(None);
        }
        self.shader.disable();
        Ok(())
    }

    pub fn world(&self) -> Transform {
        self.world
    }

    pub fn set_world(&mut self, world: Transform) {
        self.world = world;
    }

    pub fn move_right(&mut self, distance: f32) {
        self.world.move_right(distance);
    }

    pub fn move_up(&mut self, distance: f32) {
        self.world.move_up(distance);
    }

    pub fn move_back(&mut self, distance: f32) {
        self.world.move_back(distance);
    }

    pub fn move_local(&mut self, distance: f32, local_direction: Vec3) {
        self.world.move_local(distance, local_direction);
    }

    pub fn move_world(&mut self, distance: f32, world_direction: Vec3) {
        self.world.move_world(distance, world_direction);
    }

    pub fn pitch(&mut self, angle_degrees: f32) {
        self.world.pitch(angle_degrees);
    }

    pub fn yaw(&mut self, angle_degrees: f32) {
        self.world.yaw(angle_degrees);
    }

    pub fn roll(&mut self, angle_degrees: f32) {
        self.world.roll(angle_degrees);
    }

    pub fn rotate_local(&mut self, angle_degrees: f32, axis: Vec3) -> Result<(), MathError> {
        self.world.rotate_local(angle_degrees, axis)
    }

    pub fn rotate_world(&mut self, angle_degrees: f32, axis: Vec3) -> Result<(), MathError> {
        self.world.rotate_world(angle_degrees, axis)
    }

    pub fn align_with_world_y(&mut self) -> Result<(), MathError> {
        self.world.align_with_world_y()
    }

    pub fn scale_local(&mut self, scale: f32) {
        self.world.scale_local(scale);
    }

    pub fn scale_local_nonuniform(&mut self, sx: f32, sy: f32, sz: f32) {
        self.world.scale_local_nonuniform(sx, sy, sz);
    }

    pub fn scale_world(&mut self, scale: f32) {
        self.world.scale_world(scale);
    }

    pub fn scale_world_nonuniform(&mut self, sx: f32, sy: f32, sz: f32) {
        self.world.scale_world_nonuniform(sx, sy, sz);
    }

    pub fn shear_local_x_by_yz(&mut self, shear_y: f32, shear_z: f32) {
        self.world.shear_local_x_by_yz(shear_y, shear_z);
    }

    pub fn shear_local_y_by_xz(&mut self, shear_x: f32, shear_z: f32) {
        self.world.shear_local_y_by_xz(shear_x, shear_z);
    }

    pub fn shear_local_z_by_xy(&mut self, shear_x: f32, shear_y: f32) {
        self.world.shear_local_z_by_xy(shear_x, shear_y);
    }
}

impl Drop for Mesh {
    fn drop(&mut self) {
        let mut device = self.device.borrow_mut();
        device.delete_vertex_array(self.vao);
        device.delete_buffer(self.vbo);
        device.delete_buffer(self.ibo);
    }
}

impl fmt::Debug for Mesh {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Mesh")
            .field("vao", &self.vao)
            .field("layout", &self.layout)
            .field("vertices", &self.vertex_count())
            .field("indices", &self.indices.len())
            .field("prepared", &self.prepared)
            .field("world", &self.world)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceCall, RecordingDevice};
    use crate::geometry::{build_cube, compute_face_normals, data_with_face_normals, index_data};
    use approx::assert_abs_diff_eq;
    use std::cell::RefCell;

    fn setup() -> (Rc<RefCell<RecordingDevice>>, Rc<ShaderProgram>) {
        let device = RecordingDevice::shared();
        let shader = Rc::new(ShaderProgram::new(device.clone(), "vs", "fs").unwrap());
        device.borrow_mut().take_calls();
        (device, shader)
    }

    fn triangle_mesh(device: &Rc<RefCell<RecordingDevice>>, shader: &Rc<ShaderProgram>) -> Mesh {
        let mut mesh = Mesh::new(device.clone(), shader.clone(), VertexLayout::POSITIONS_COLORS);
        #[rustfmt::skip]
        let geometry = [
            0.0, 0.0, 0.0, 1.0, 0.0, 0.0,
            1.0, 0.0, 0.0, 0.0, 1.0, 0.0,
            0.0, 1.0, 0.0, 0.0, 0.0, 1.0,
        ];
        mesh.add_geometry(&geometry).unwrap();
        mesh.add_indices(&[0, 1, 2]).unwrap();
        mesh
    }

    #[test]
    fn test_layouts() {
        assert_eq!(VertexLayout::POSITIONS.floats_per_vertex, 3);
        let color = VertexLayout::POSITIONS_COLORS.attribute(COLOR_ATTRIBUTE).unwrap();
        assert_eq!((color.size, color.offset), (3, 3));
        let normal = VertexLayout::POSITIONS_NORMALS.attribute(NORMAL_ATTRIBUTE).unwrap();
        assert_eq!((normal.size, normal.offset), (3, 3));
        assert!(VertexLayout::POSITIONS_NORMALS.attribute(COLOR_ATTRIBUTE).is_none());
    }

    #[test]
    fn test_prepare_uploads_and_describes_attributes() {
        let (device, shader) = setup();
        let mut mesh = triangle_mesh(&device, &shader);
        device.borrow_mut().take_calls();
        mesh.prepare().unwrap();
        assert!(mesh.is_prepared());

        let d = device.borrow();
        let calls = d.calls();
        assert!(calls.contains(&DeviceCall::BufferDataF32(BufferTarget::Vertices, mesh.data().to_vec())));
        assert!(calls.contains(&DeviceCall::BufferDataU32(BufferTarget::Indices, vec![0, 1, 2])));
        assert!(calls.contains(&DeviceCall::VertexAttribPointer {
            index: COLOR_ATTRIBUTE,
            size: 3,
            stride: 6,
            offset: 3
        }));
        assert_eq!(d.count(|c| matches!(c, DeviceCall::EnableVertexAttribArray(_))), 2);
        assert_eq!(calls.last(), Some(&DeviceCall::BindVertexArray(None)));
    }

    #[test]
    fn test_data_validation() {
        let (device, shader) = setup();
        let mut mesh = Mesh::new(device.clone(), shader.clone(), VertexLayout::POSITIONS_NORMALS);
        assert_eq!(
            mesh.add_geometry(&[0.0; 7]),
            Err(MeshError::PartialVertex {
                floats: 7,
                floats_per_vertex: 6
            })
        );
        assert_eq!(
            mesh.add_indices(&[0, 1]),
            Err(MeshError::IncompleteTriangles { indices: 2 })
        );
        mesh.add_geometry(&[0.0; 12]).unwrap();
        mesh.add_indices(&[0, 1, 2]).unwrap();
        assert_eq!(
            mesh.prepare(),
            Err(MeshError::IndexOutOfRange {
                index: 2,
                vertex_count: 2
            })
        );
        assert!(!mesh.is_prepared());
    }

    #[test]
    fn test_prepared_mesh_is_frozen() {
        let (device, shader) = setup();
        let mut mesh = triangle_mesh(&device, &shader);
        mesh.prepare().unwrap();
        assert_eq!(mesh.prepare(), Err(MeshError::AlreadyPrepared));
        assert_eq!(mesh.add_geometry(&[0.0; 6]), Err(MeshError::AlreadyPrepared));
        assert_eq!(mesh.add_indices(&[0, 0, 0]), Err(MeshError::AlreadyPrepared));
    }

    #[test]
    fn test_draw_requires_prepare() {
        let (device, shader) = setup();
        let mesh = triangle_mesh(&device, &shader);
        assert_eq!(
            mesh.draw(&Transform::new(), &Mat4::identity()),
            Err(MeshError::NotPrepared)
        );
    }

    #[test]
    fn test_draw_uploads_model_view() {
        let (device, shader) = setup();
        let mut mesh = triangle_mesh(&device, &shader);
        mesh.move_right(2.0);
        mesh.yaw(30.0);
        mesh.prepare().unwrap();

        let view = Transform::from_position(Vec3::new(0.0, 0.0, -10.0));
        let mut projection = Mat4::identity();
        projection.set_to_perspective_projection(50.0, 4.0 / 3.0, 0.01, 40.0);
        device.borrow_mut().take_calls();
        mesh.draw(&view, &projection).unwrap();

        let d = device.borrow();
        let model_view = d.last_uniform(MODEL_VIEW_UNIFORM).unwrap();
        let expected = (view * mesh.world()).to_cols_array();
        for (a, b) in model_view.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-6);
        }
        assert_eq!(d.last_uniform(PROJECTION_UNIFORM), Some(projection.to_cols_array()));
        assert!(d.calls().contains(&DeviceCall::DrawElements(3)));
        assert_eq!(d.calls().first(), Some(&DeviceCall::UseProgram(Some(shader.id()))));
        assert_eq!(d.calls().last(), Some(&DeviceCall::UseProgram(None)));
    }

    #[test]
    fn test_add_mesh_data_offsets_indices() {
        let (device, shader) = setup();
        let cube = build_cube();
        let normals = compute_face_normals(&cube).unwrap();
        let data = index_data(&data_with_face_normals(&cube, &normals).unwrap(), 6).unwrap();

        let mut mesh = Mesh::new(device.clone(), shader.clone(), VertexLayout::POSITIONS_NORMALS);
        mesh.add_mesh_data(&data).unwrap();
        mesh.add_mesh_data(&data).unwrap();
        assert_eq!(mesh.vertex_count(), 48);
        assert_eq!(mesh.indices().len(), 72);
        assert_eq!(mesh.indices()[36], data.indices[0] + 24);
        mesh.prepare().unwrap();
    }

    #[test]
    fn test_transform_forwarding() {
        let (device, shader) = setup();
        let mut mesh = triangle_mesh(&device, &shader);
        mesh.scale_world(0.1);
        mesh.move_world(-15.0, Vec3::Y);
        assert_eq!(mesh.world().position(), Vec3::new(0.0, -1.5, 0.0));

        mesh.set_world(Transform::new());
        mesh.shear_local_x_by_yz(0.5, 0.5);
        mesh.move_world(2.0, Vec3::new(-1.0, 2.0, -1.0));
        assert_eq!(mesh.world().position(), Vec3::new(-1.0, 4.0, -2.0));

        assert!(mesh.rotate_local(10.0, Vec3::zero()).is_err());
        mesh.rotate_world(90.0, Vec3::Y).unwrap();
        assert_eq!(mesh.world().position(), Vec3::new(-2.0, 4.0, 1.0));
    }

    #[test]
    fn test_drop_releases_buffers() {
        let (device, shader) = setup();
        let mesh = triangle_mesh(&device, &shader);
        drop(mesh);
        let d = device.borrow();
        assert_eq!(d.count(|c| matches!(c, DeviceCall::DeleteVertexArray(_))), 1);
        assert_eq!(d.count(|c| matches!(c, DeviceCall::DeleteBuffer(_))), 2);
    }
}
