/// Vista Core Library - math, meshes and scenes behind a device seam
///
/// This library provides vector and matrix math, rigid/affine transforms, a
/// camera, mesh construction utilities and a named mesh registry. All device
/// work goes through the [`device::Device`] trait, so the same scene can be
/// rendered by any backend or recorded in tests.

pub mod device;
pub mod error;
pub mod geometry;
pub mod interop;
pub mod mat3;
pub mod mat4;
pub mod mesh;
pub mod projection;
pub mod scene;
pub mod shader;
pub mod stl;
pub mod transform;
pub mod vec;

// Re-export commonly used types
pub use device::{Device, SharedDevice};
pub use error::{GeometryError, MathError, MeshError, SceneError, ShaderError, StlError};
pub use geometry::{MeshData, Triangle};
pub use mat3::Mat3;
pub use mat4::Mat4;
pub use mesh::{Mesh, VertexLayout};
pub use projection::{Camera, ProjectionMode};
pub use scene::Scene;
pub use shader::ShaderProgram;
pub use transform::Transform;
pub use vec::{Vec3, Vec4};
