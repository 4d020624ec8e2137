/// Shader programs built through a [`Device`](crate::device::Device)
use log::{debug, error};

use crate::device::{ProgramId, ShaderId, ShaderStage, SharedDevice};
use crate::error::ShaderError;
use crate::mat4::Mat4;

/// Uniform receiving the combined view and model matrix
pub const MODEL_VIEW_UNIFORM: &str = "uModelView";
/// Uniform receiving the projection matrix
pub const PROJECTION_UNIFORM: &str = "uProjection";

/// A linked vertex + fragment program. Dropping it deletes the device objects.
pub struct ShaderProgram {
    device: SharedDevice,
    program: ProgramId,
    vertex: ShaderId,
    fragment: ShaderId,
}

impl ShaderProgram {
    /// Compile both stages and link them.
    ///
    /// Any device objects created before a failure are deleted again.
    pub fn new(device: SharedDevice, vertex_source: &str, fragment_source: &str) -> Result<Self, ShaderError> {
        let program = device
            .borrow_mut()
            .create_program()
            .ok_or(ShaderError::CreateFailed("program"))?;

        let vertex = match compile(&device, program, ShaderStage::Vertex, vertex_source) {
            Ok(vertex) => vertex,
            Err(e) => {
                device.borrow_mut().delete_program(program);
                return Err(e);
            }
        };
        let fragment = match compile(&device, program, ShaderStage::Fragment, fragment_source) {
            Ok(fragment) => fragment,
            Err(e) => {
                let mut d = device.borrow_mut();
                d.delete_shader(vertex);
                d.delete_program(program);
                return Err(e);
            }
        };

        // Dropping the half-built program cleans up on link failure.
        let shader = Self {
            device,
            program,
            vertex,
            fragment,
        };
        shader.link()?;
        debug!("linked shader program {:?}", program);
        Ok(shader)
    }

    fn link(&self) -> Result<(), ShaderError> {
        let mut device = self.device.borrow_mut();
        if !device.link_program(self.program) {
            let log = device.program_info_log(self.program);
            error!("shader program {:?} failed to link: {}", self.program, log);
            return Err(ShaderError::Link { log });
        }
        device.detach_shader(self.program, self.vertex);
        device.detach_shader(self.program, self.fragment);
        Ok(())
    }

    pub fn id(&self) -> ProgramId {
        self.program
    }

    pub fn enable(&self) {
        self.device.borrow_mut().use_program(Some(self.program));
    }

    pub fn disable(&self) {
        self.device.borrow_mut().use_program(None);
    }

    /// Upload `value` column-major to the named uniform. Names the program
    /// does not use are ignored.
    pub fn set_uniform_matrix(&self, name: &str, value: &Mat4) {
        let mut device = self.device.borrow_mut();
        if let Some(location) = device.uniform_location(self.program, name) {
            device.uniform_matrix4(location, &value.to_cols_array());
        }
    }
}

fn compile(
    device: &SharedDevice,
    program: ProgramId,
    stage: ShaderStage,
    source: &str,
) -> Result<ShaderId, ShaderError> {
    let mut device = device.borrow_mut();
    let shader = device
        .create_shader(stage)
        .ok_or(ShaderError::CreateFailed(stage.name()))?;
    device.shader_source(shader, source);
    if !device.compile_shader(shader) {
        let log = device.shader_info_log(shader);
        device.delete_shader(shader);
        error!("{} shader failed to compile: {}", stage.name(), log);
        return Err(ShaderError::Compile {
            stage: stage.name(),
            log,
        });
    }
    device.attach_shader(program, shader);
    Ok(shader)
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        let mut device = self.device.borrow_mut();
        device.delete_shader(self.vertex);
        device.delete_shader(self.fragment);
        device.delete_program(self.program);
    }
}

impl std::fmt::Debug for ShaderProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("program", &self.program)
            .field("vertex", &self.vertex)
            .field("fragment", &self.fragment)
            .finish()
    }
}
