/// Error types for the math, geometry, mesh and scene layers
use thiserror::Error;

/// Numerically degenerate input to a vector or matrix operation
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum MathError {
    #[error("vector has zero length")]
    DegenerateVector,

    #[error("matrix is singular (determinant {determinant})")]
    SingularMatrix { determinant: f32 },
}

/// Malformed input to the geometry utilities
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("floats per vertex must be non-zero")]
    ZeroFloatsPerVertex,

    #[error("{floats} floats do not form whole triangles of {floats_per_vertex}-float vertices")]
    IncompleteTriangles { floats: usize, floats_per_vertex: usize },

    #[error("expected {expected} attribute values, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("face {face} is degenerate")]
    DegenerateFace { face: usize },
}

/// Failure while building or linking a shader program
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShaderError {
    #[error("device could not create a {0} object")]
    CreateFailed(&'static str),

    #[error("{stage} shader failed to compile: {log}")]
    Compile { stage: &'static str, log: String },

    #[error("shader program failed to link: {log}")]
    Link { log: String },
}

/// Misuse of a mesh's buffer lifecycle
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    #[error("mesh has already been uploaded to the device")]
    AlreadyPrepared,

    #[error("mesh has not been uploaded to the device")]
    NotPrepared,

    #[error("{floats} floats is not a whole number of {floats_per_vertex}-float vertices")]
    PartialVertex { floats: usize, floats_per_vertex: usize },

    #[error("{indices} indices do not form whole triangles")]
    IncompleteTriangles { indices: usize },

    #[error("index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    #[error(transparent)]
    Shader(#[from] ShaderError),
}

/// Errors raised by the named mesh registry
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("a mesh named '{0}' already exists")]
    DuplicateName(String),

    #[error("no mesh named '{0}'")]
    NotFound(String),

    #[error("scene is empty")]
    Empty,

    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// STL import errors
#[derive(Error, Debug)]
pub enum StlError {
    #[error("file too small to be a valid STL")]
    TooShort,

    #[error("unexpected end of file in triangle {triangle}")]
    UnexpectedEof { triangle: usize },

    #[error("failed to parse ASCII STL: {0}")]
    Parse(String),

    #[error("failed to read STL file: {0}")]
    Io(#[from] std::io::Error),
}
