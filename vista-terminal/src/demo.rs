/// The demo scene: two colored solids, four cubes and an optional STL model
use log::info;
use rand::Rng;
use std::rc::Rc;
use vista_core::geometry::{
    build_cube, build_decagon_pyramid, build_octagon_cone, compute_face_normals, compute_vertex_normals,
    data_with_face_colors, data_with_face_normals, data_with_vertex_colors, data_with_vertex_normals,
    random_face_colors, random_vertex_colors,
};
use vista_core::{
    stl, GeometryError, MathError, Mesh, MeshData, MeshError, Scene, SceneError, ShaderError, ShaderProgram,
    SharedDevice, StlError, Triangle, Vec3, VertexLayout,
};

use crate::config::DemoConfig;

const COLORS_VERTEX_SHADER: &str = "#version 330
layout (location = 0) in vec3 aPosition;
layout (location = 1) in vec3 aColor;
out vec4 vColor;
uniform mat4 uModelView;
uniform mat4 uProjection;
void main() {
    vColor = vec4(aColor, 1.0);
    gl_Position = uProjection * uModelView * vec4(aPosition, 1.0);
}
";

const NORMALS_VERTEX_SHADER: &str = "#version 330
layout (location = 0) in vec3 aPosition;
layout (location = 2) in vec3 aNormal;
out vec4 vColor;
uniform mat4 uModelView;
uniform mat4 uProjection;
void main() {
    vec3 normal = normalize(mat3(uModelView) * aNormal);
    float light = 0.15 + 0.85 * max(normal.z, 0.0);
    vColor = vec4(light, light, light, 1.0);
    gl_Position = uProjection * uModelView * vec4(aPosition, 1.0);
}
";

const FRAGMENT_SHADER: &str = "#version 330
in vec4 vColor;
out vec4 fColor;
void main() {
    fColor = vColor;
}
";

const CYAN: Vec3 = Vec3::new(0.0, 1.0, 1.0);
const RED: Vec3 = Vec3::new(1.0, 0.0, 0.0);
const BLUE: Vec3 = Vec3::new(0.0, 0.0, 1.0);

#[derive(thiserror::Error, Debug)]
pub enum DemoError {
    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Math(#[from] MathError),

    #[error(transparent)]
    Stl(#[from] StlError),
}

/// Shader programs for the two vertex layouts the demo uses
pub struct DemoShaders {
    pub colors: Rc<ShaderProgram>,
    pub normals: Rc<ShaderProgram>,
}

impl DemoShaders {
    pub fn new(device: &SharedDevice) -> Result<Self, DemoError> {
        Ok(Self {
            colors: Rc::new(ShaderProgram::new(device.clone(), COLORS_VERTEX_SHADER, FRAGMENT_SHADER)?),
            normals: Rc::new(ShaderProgram::new(device.clone(), NORMALS_VERTEX_SHADER, FRAGMENT_SHADER)?),
        })
    }
}

/// Corner colors for fans whose third corner is the hub
fn hub_colors(faces: &[Triangle], rim: Vec3, hub: Vec3) -> Vec<Vec3> {
    faces.iter().flat_map(|_| [rim, rim, hub]).collect()
}

fn indexed_mesh(
    device: &SharedDevice,
    shader: &Rc<ShaderProgram>,
    layout: VertexLayout,
    geometry: &[f32],
) -> Result<Mesh, DemoError> {
    let data = MeshData::indexed(geometry, layout.floats_per_vertex)?;
    let mut mesh = Mesh::new(device.clone(), shader.clone(), layout);
    mesh.add_mesh_data(&data)?;
    Ok(mesh)
}

fn add_prepared(scene: &mut Scene, name: &str, mut mesh: Mesh) -> Result<(), DemoError> {
    mesh.prepare()?;
    scene.add(name, mesh)?;
    Ok(())
}

/// Imported files may contain zero-area slivers, which have no normal
fn without_degenerate_faces(faces: Vec<Triangle>) -> Vec<Triangle> {
    faces
        .into_iter()
        .filter(|face| (face[1] - face[0]).cross(&(face[2] - face[0])).length() > f32::EPSILON)
        .collect()
}

/// Populate a scene with the demo meshes, plus `config.model` when set.
pub fn build_scene<R: Rng + ?Sized>(
    device: &SharedDevice,
    shaders: &DemoShaders,
    config: &DemoConfig,
    rng: &mut R,
) -> Result<Scene, DemoError> {
    let mut scene = Scene::new();
    let colors = VertexLayout::POSITIONS_COLORS;
    let normals = VertexLayout::POSITIONS_NORMALS;

    let decagon = build_decagon_pyramid();
    let geometry = data_with_vertex_colors(&decagon, &hub_colors(&decagon, CYAN, RED))?;
    let mut mesh = indexed_mesh(device, &shaders.colors, colors, &geometry)?;
    mesh.move_right(-1.0);
    mesh.pitch(50.0);
    add_prepared(&mut scene, "decagon", mesh)?;

    let octacone = build_octagon_cone();
    let geometry = data_with_vertex_colors(&octacone, &hub_colors(&octacone, RED, BLUE))?;
    let mut mesh = indexed_mesh(device, &shaders.colors, colors, &geometry)?;
    mesh.shear_local_x_by_yz(0.5, 0.5);
    mesh.move_world(2.0, Vec3::new(-1.0, 2.0, -1.0));
    add_prepared(&mut scene, "octacone", mesh)?;

    let cube = build_cube();

    let geometry = data_with_face_colors(&cube, &random_face_colors(&cube, rng))?;
    let mut mesh = indexed_mesh(device, &shaders.colors, colors, &geometry)?;
    mesh.move_up(-4.0);
    mesh.move_right(-2.0);
    add_prepared(&mut scene, "cubeRandomFaceColors", mesh)?;

    let geometry = data_with_vertex_colors(&cube, &random_vertex_colors(&cube, rng))?;
    let mut mesh = indexed_mesh(device, &shaders.colors, colors, &geometry)?;
    mesh.move_up(-3.0);
    mesh.move_right(2.0);
    add_prepared(&mut scene, "cubeRandomVertexColors", mesh)?;

    let face_normals = compute_face_normals(&cube)?;
    let geometry = data_with_face_normals(&cube, &face_normals)?;
    let mut mesh = indexed_mesh(device, &shaders.normals, normals, &geometry)?;
    mesh.move_up(-2.0);
    mesh.move_right(-2.0);
    add_prepared(&mut scene, "cubeFaceNormals", mesh)?;

    let vertex_normals = compute_vertex_normals(&cube, &face_normals)?;
    let geometry = data_with_vertex_normals(&cube, &vertex_normals)?;
    let mut mesh = indexed_mesh(device, &shaders.normals, normals, &geometry)?;
    mesh.move_up(-1.0);
    mesh.move_right(2.0);
    add_prepared(&mut scene, "cubeVertexNormals", mesh)?;

    if let Some(path) = &config.model {
        let faces = without_degenerate_faces(stl::load_stl(path)?);
        let face_normals = compute_face_normals(&faces)?;
        let geometry = data_with_face_normals(&faces, &face_normals)?;
        let mut mesh = indexed_mesh(device, &shaders.normals, normals, &geometry)?;
        mesh.scale_world(0.1);
        mesh.yaw(30.0);
        mesh.move_world(-15.0, Vec3::Y);
        add_prepared(&mut scene, "model", mesh)?;
        info!("loaded model {} with {} faces", path.display(), faces.len());
    }

    info!("demo scene built with {} meshes", scene.len());
    Ok(scene)
}
