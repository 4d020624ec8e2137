/// Graphics device seam: buffers, vertex arrays, shaders and uniforms
///
/// Meshes and shader programs only talk to the device through [`Device`], so
/// the same scene can drive a real backend or the [`RecordingDevice`] used in
/// tests.
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexArrayId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

/// Where a bound buffer's data goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Interleaved vertex floats
    Vertices,
    /// Triangle indices
    Indices,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }
}

/// Capability set of a graphics device.
///
/// Sizes, strides and offsets are counted in floats. Vertex attribute state
/// and element buffers are captured by the vertex array bound at the time,
/// and `draw_elements` draws triangles from the bound vertex array with the
/// program in use.
pub trait Device {
    fn gen_vertex_array(&mut self) -> VertexArrayId;
    fn delete_vertex_array(&mut self, id: VertexArrayId);
    fn bind_vertex_array(&mut self, id: Option<VertexArrayId>);

    fn gen_buffer(&mut self) -> BufferId;
    fn delete_buffer(&mut self, id: BufferId);
    fn bind_buffer(&mut self, target: BufferTarget, id: Option<BufferId>);
    fn buffer_data_f32(&mut self, target: BufferTarget, data: &[f32]);
    fn buffer_data_u32(&mut self, target: BufferTarget, data: &[u32]);

    fn enable_vertex_attrib_array(&mut self, index: u32);
    fn vertex_attrib_pointer(&mut self, index: u32, size: usize, stride: usize, offset: usize);

    /// Draw `count` indices from the bound element buffer as triangles.
    fn draw_elements(&mut self, count: usize);

    /// `None` when the device cannot allocate a shader object.
    fn create_shader(&mut self, stage: ShaderStage) -> Option<ShaderId>;
    fn shader_source(&mut self, shader: ShaderId, source: &str);
    /// Returns whether compilation succeeded.
    fn compile_shader(&mut self, shader: ShaderId) -> bool;
    fn shader_info_log(&self, shader: ShaderId) -> String;
    fn delete_shader(&mut self, shader: ShaderId);

    fn create_program(&mut self) -> Option<ProgramId>;
    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId);
    fn detach_shader(&mut self, program: ProgramId, shader: ShaderId);
    /// Returns whether linking succeeded.
    fn link_program(&mut self, program: ProgramId) -> bool;
    fn program_info_log(&self, program: ProgramId) -> String;
    fn delete_program(&mut self, program: ProgramId);
    fn use_program(&mut self, program: Option<ProgramId>);

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation>;
    /// Upload a column-major 4x4 matrix to the program in use.
    fn uniform_matrix4(&mut self, location: UniformLocation, matrix: &[f32; 16]);

    fn viewport(&mut self, x: i32, y: i32, width: u32, height: u32);
    fn clear(&mut self);
}

/// A device shared by the meshes and programs of one render loop
pub type SharedDevice = Rc<RefCell<dyn Device>>;

/// One call made against a [`RecordingDevice`]
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    GenVertexArray(VertexArrayId),
    DeleteVertexArray(VertexArrayId),
    BindVertexArray(Option<VertexArrayId>),
    GenBuffer(BufferId),
    DeleteBuffer(BufferId),
    BindBuffer(BufferTarget, Option<BufferId>),
    BufferDataF32(BufferTarget, Vec<f32>),
    BufferDataU32(BufferTarget, Vec<u32>),
    EnableVertexAttribArray(u32),
    VertexAttribPointer {
        index: u32,
        size: usize,
        stride: usize,
        offset: usize,
    },
    DrawElements(usize),
    CreateShader(ShaderStage, ShaderId),
    ShaderSource(ShaderId),
    CompileShader(ShaderId),
    DeleteShader(ShaderId),
    CreateProgram(ProgramId),
    AttachShader(ProgramId, ShaderId),
    DetachShader(ProgramId, ShaderId),
    LinkProgram(ProgramId),
    DeleteProgram(ProgramId),
    UseProgram(Option<ProgramId>),
    UniformMatrix4(UniformLocation, [f32; 16]),
    Viewport(i32, i32, u32, u32),
    Clear,
}

/// Headless device that records every call and hands out sequential handles.
///
/// Compilation and linking succeed unless configured to fail.
#[derive(Debug, Default)]
pub struct RecordingDevice {
    calls: Vec<DeviceCall>,
    next_handle: u32,
    uniforms: HashMap<(ProgramId, String), UniformLocation>,
    compile_error: Option<String>,
    link_error: Option<String>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every compilation fails with `log`.
    pub fn failing_compile(log: &str) -> Self {
        Self {
            compile_error: Some(log.to_string()),
            ..Self::default()
        }
    }

    /// Every link fails with `log`.
    pub fn failing_link(log: &str) -> Self {
        Self {
            link_error: Some(log.to_string()),
            ..Self::default()
        }
    }

    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn calls(&self) -> &[DeviceCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<DeviceCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn count(&self, matches: impl Fn(&DeviceCall) -> bool) -> usize {
        self.calls.iter().filter(|call| matches(*call)).count()
    }

    /// The last matrix uploaded under `name`, for any program.
    pub fn last_uniform(&self, name: &str) -> Option<[f32; 16]> {
        let locations: Vec<UniformLocation> = self
            .uniforms
            .iter()
            .filter(|((_, uniform), _)| uniform == name)
            .map(|(_, location)| *location)
            .collect();
        self.calls.iter().rev().find_map(|call| match call {
            DeviceCall::UniformMatrix4(location, matrix) if locations.contains(location) => Some(*matrix),
            _ => None,
        })
    }

    fn next(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }
}

impl Device for RecordingDevice {
    fn gen_vertex_array(&mut self) -> VertexArrayId {
        let id = VertexArrayId(self.next());
        self.calls.push(DeviceCall::GenVertexArray(id));
        id
    }

    fn delete_vertex_array(&mut self, id: VertexArrayId) {
        self.calls.push(DeviceCall::DeleteVertexArray(id));
    }

    fn bind_vertex_array(&mut self, id: Option<VertexArrayId>) {
        self.calls.push(DeviceCall::BindVertexArray(id));
    }

    fn gen_buffer(&mut self) -> BufferId {
        let id = BufferId(self.next());
        self.calls.push(DeviceCall::GenBuffer(id));
        id
    }

    fn delete_buffer(&mut self, id: BufferId) {
        self.calls.push(DeviceCall::DeleteBuffer(id));
    }

    fn bind_buffer(&mut self, target: BufferTarget, id: Option<BufferId>) {
        self.calls.push(DeviceCall::BindBuffer(target, id));
    }

    fn buffer_data_f32(&mut self, target: BufferTarget, data: &[f32]) {
        self.calls.push(DeviceCall::BufferDataF32(target, data.to_vec()));
    }

    fn buffer_data_u32(&mut self, target: BufferTarget, data: &[u32]) {
        self.calls.push(DeviceCall::BufferDataU32(target, data.to_vec()));
    }

    fn enable_vertex_attrib_array(&mut self, index: u32) {
        self.calls.push(DeviceCall::EnableVertexAttribArray(index));
    }

    fn vertex_attrib_pointer(&mut self, index: u32, size: usize, stride: usize, offset: usize) {
        self.calls.push(DeviceCall::VertexAttribPointer {
            index,
            size,
            stride,
            offset,
        });
    }

    fn draw_elements(&mut self, count: usize) {
        self.calls.push(DeviceCall::DrawElements(count));
    }

    fn create_shader(&mut self, stage: ShaderStage) -> Option<ShaderId> {
        let id = ShaderId(self.next());
        self.calls.push(DeviceCall::CreateShader(stage, id));
        Some(id)
    }

    fn shader_source(&mut self, shader: ShaderId, _source: &str) {
        self.calls.push(DeviceCall::ShaderSource(shader));
    }

    fn compile_shader(&mut self, shader: ShaderId) -> bool {
        self.calls.push(DeviceCall::CompileShader(shader));
        self.compile_error.is_none()
    }

    fn shader_info_log(&self, _shader: ShaderId) -> String {
        self.compile_error.clone().unwrap_or_default()
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        self.calls.push(DeviceCall::DeleteShader(shader));
    }

    fn create_program(&mut self) -> Option<ProgramId> {
        let id = ProgramId(self.next());
        self.calls.push(DeviceCall::CreateProgram(id));
        Some(id)
    }

    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId) {
        self.calls.push(DeviceCall::AttachShader(program, shader));
    }

    fn detach_shader(&mut self, program: ProgramId, shader: ShaderId) {
        self.calls.push(DeviceCall::DetachShader(program, shader));
    }

    fn link_program(&mut self, program: ProgramId) -> bool {
        self.calls.push(DeviceCall::LinkProgram(program));
        self.link_error.is_none()
    }

    fn program_info_log(&self, _program: ProgramId) -> String {
        self.link_error.clone().unwrap_or_default()
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.calls.push(DeviceCall::DeleteProgram(program));
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        self.calls.push(DeviceCall::UseProgram(program));
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let key = (program, name.to_string());
        if let Some(location) = self.uniforms.get(&key) {
            return Some(*location);
        }
        let location = UniformLocation(self.next());
        self.uniforms.insert(key, location);
        Some(location)
    }

    fn uniform_matrix4(&mut self, location: UniformLocation, matrix: &[f32; 16]) {
        self.calls.push(DeviceCall::UniformMatrix4(location, *matrix));
    }

    fn viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.calls.push(DeviceCall::Viewport(x, y, width, height));
    }

    fn clear(&mut self) {
        self.calls.push(DeviceCall::Clear);
    }
}
