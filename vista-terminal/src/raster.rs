/// Software rasterizer that executes device calls into terminal cells
use crossterm::{
    cursor,
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use vista_core::device::{
    BufferId, BufferTarget, Device, ProgramId, ShaderId, ShaderStage, UniformLocation, VertexArrayId,
};
use vista_core::mesh::{COLOR_ATTRIBUTE, NORMAL_ATTRIBUTE, POSITION_ATTRIBUTE};
use vista_core::shader::{MODEL_VIEW_UNIFORM, PROJECTION_UNIFORM};
use vista_core::{Mat4, Vec3};

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Light that reaches surfaces facing away from the viewer
const AMBIENT: f32 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    character: char,
    color: Color,
}

const EMPTY_CELL: Cell = Cell {
    character: ' ',
    color: Color::Reset,
};

#[derive(Debug, Clone, Copy)]
struct AttribPointer {
    buffer: BufferId,
    size: usize,
    stride: usize,
    offset: usize,
}

#[derive(Debug, Default)]
struct VertexArray {
    index_buffer: Option<BufferId>,
    pointers: HashMap<u32, AttribPointer>,
    enabled: HashSet<u32>,
}

#[derive(Debug)]
enum BufferData {
    Empty,
    Floats(Vec<f32>),
    Indices(Vec<u32>),
}

#[derive(Debug)]
struct ShaderObject {
    stage: ShaderStage,
    source: String,
    compiled: bool,
    log: String,
}

#[derive(Debug, Default)]
struct ProgramObject {
    attached: Vec<ShaderId>,
    linked: bool,
    log: String,
    uniforms: HashMap<String, UniformLocation>,
}

/// A vertex after projection to screen space
#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    x: f32,
    y: f32,
    depth: f32,
    intensity: f32,
    color: Option<Vec3>,
}

/// Device that rasterizes indexed triangles into a character grid.
///
/// Attribute 0 supplies positions, transformed by the `uModelView` and
/// `uProjection` uniforms. Surfaces are shaded from attribute 1 (color) when
/// present, otherwise from attribute 2 (normal) lit from the viewer, otherwise
/// from the face normal. Triangles wound clockwise on screen are culled and a
/// depth buffer resolves overlaps.
pub struct TerminalDevice {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    cells: Vec<Cell>,
    next_handle: u32,
    vertex_arrays: HashMap<VertexArrayId, VertexArray>,
    buffers: HashMap<BufferId, BufferData>,
    shaders: HashMap<ShaderId, ShaderObject>,
    programs: HashMap<ProgramId, ProgramObject>,
    uniform_values: HashMap<UniformLocation, [f32; 16]>,
    bound_vertex_array: Option<VertexArrayId>,
    bound_vertex_buffer: Option<BufferId>,
    current_program: Option<ProgramId>,
}

impl TerminalDevice {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            cells: vec![EMPTY_CELL; size],
            next_handle: 0,
            vertex_arrays: HashMap::new(),
            buffers: HashMap::new(),
            shaders: HashMap::new(),
            programs: HashMap::new(),
            uniform_values: HashMap::new(),
            bound_vertex_array: None,
            bound_vertex_buffer: None,
            current_program: None,
        }
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Character at column `x`, row `y` (row 0 is the top).
    pub fn character_at(&self, x: usize, y: usize) -> Option<char> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.cells[y * self.width + x].character)
    }

    /// The frame as plain text, one line per row.
    pub fn frame_text(&self) -> String {
        self.cells
            .chunks(self.width.max(1))
            .map(|row| row.iter().map(|cell| cell.character).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Queue the frame to `writer`, starting at the top-left corner.
    pub fn present<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let mut current = None;
        for (y, row) in self.cells.chunks(self.width.max(1)).enumerate() {
            writer.queue(cursor::MoveTo(0, y as u16))?;
            for cell in row {
                if current != Some(cell.color) {
                    writer.queue(SetForegroundColor(cell.color))?;
                    current = Some(cell.color);
                }
                writer.queue(Print(cell.character))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }

    fn next(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }

    fn uniform(&self, program: ProgramId, name: &str) -> Option<Mat4> {
        let location = self.programs.get(&program)?.uniforms.get(name)?;
        self.uniform_values.get(location).map(Mat4::from_cols_array)
    }

    fn fetch(&self, vao: &VertexArray, attribute: u32, vertex: usize) -> Option<Vec3> {
        if !vao.enabled.contains(&attribute) {
            return None;
        }
        let pointer = vao.pointers.get(&attribute)?;
        let data = match self.buffers.get(&pointer.buffer)? {
            BufferData::Floats(data) => data,
            _ => return None,
        };
        let start = vertex * pointer.stride + pointer.offset;
        let values = data.get(start..start + pointer.size.min(3))?;
        let component = |i: usize| values.get(i).copied().unwrap_or(0.0);
        Some(Vec3::new(component(0), component(1), component(2)))
    }

    /// Transform, cull and shade the first `count` indices of the bound
    /// vertex array.
    fn assemble(&self, count: usize) -> Vec<[ScreenVertex; 3]> {
        let program = match self.current_program {
            Some(program) => program,
            None => {
                warn!("draw_elements without a program in use");
                return Vec::new();
            }
        };
        let vao = match self.bound_vertex_array.and_then(|id| self.vertex_arrays.get(&id)) {
            Some(vao) => vao,
            None => {
                warn!("draw_elements without a vertex array bound");
                return Vec::new();
            }
        };
        let indices = match vao.index_buffer.and_then(|id| self.buffers.get(&id)) {
            Some(BufferData::Indices(indices)) => indices,
            _ => {
                warn!("draw_elements without an index buffer");
                return Vec::new();
            }
        };

        let model_view = self.uniform(program, MODEL_VIEW_UNIFORM).unwrap_or_default();
        let projection = self.uniform(program, PROJECTION_UNIFORM).unwrap_or_default();

        let mut triangles = Vec::new();
        for triangle in indices[..count.min(indices.len())].chunks_exact(3) {
            let mut eye = [Vec3::zero(); 3];
            let mut ndc = [Vec3::zero(); 3];
            let mut visible = true;
            for (corner, &index) in triangle.iter().enumerate() {
                let position = match self.fetch(vao, POSITION_ATTRIBUTE, index as usize) {
                    Some(position) => position,
                    None => return triangles,
                };
                let eye_position = model_view * position.extend(1.0);
                let clip = projection * eye_position;
                if clip.w <= f32::EPSILON {
                    visible = false;
                    break;
                }
                eye[corner] = eye_position.truncate();
                ndc[corner] = clip.truncate() / clip.w;
            }
            if !visible {
                continue;
            }

            let signed_area = (ndc[1].x - ndc[0].x) * (ndc[2].y - ndc[0].y)
                - (ndc[1].y - ndc[0].y) * (ndc[2].x - ndc[0].x);
            if signed_area <= 0.0 {
                continue;
            }

            let face_light = (eye[1] - eye[0])
                .cross(&(eye[2] - eye[0]))
                .normalized()
                .map(|n| lambert(n.z))
                .unwrap_or(AMBIENT);

            let mut screen = [ScreenVertex {
                x: 0.0,
                y: 0.0,
                depth: 0.0,
                intensity: 0.0,
                color: None,
            }; 3];
            for (corner, &index) in triangle.iter().enumerate() {
                let index = index as usize;
                let color = self.fetch(vao, COLOR_ATTRIBUTE, index);
                let intensity = match (color, self.fetch(vao, NORMAL_ATTRIBUTE, index)) {
                    (Some(color), _) => luminance(color),
                    (None, Some(normal)) => (model_view * normal.extend(0.0))
                        .truncate()
                        .normalized()
                        .map(|n| lambert(n.z))
                        .unwrap_or(AMBIENT),
                    (None, None) => face_light,
                };
                screen[corner] = ScreenVertex {
                    x: (ndc[corner].x + 1.0) * 0.5 * self.width as f32,
                    y: (1.0 - ndc[corner].y) * 0.5 * self.height as f32,
                    depth: ndc[corner].z,
                    intensity,
                    color,
                };
            }
            triangles.push(screen);
        }
        triangles
    }

    fn rasterize_triangle(&mut self, v: &[ScreenVertex; 3]) {
        let (v0, v1, v2) = (v[0], v[1], v[2]);

        // Bounding box, clipped to the screen
        let min_x = (v0.x.min(v1.x).min(v2.x).floor() as i32).max(0);
        let max_x = (v0.x.max(v1.x).max(v2.x).ceil() as i32).min(self.width as i32 - 1);
        let min_y = (v0.y.min(v1.y).min(v2.y).floor() as i32).max(0);
        let max_y = (v0.y.max(v1.y).max(v2.y).ceil() as i32).min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = (x as f32 + 0.5, y as f32 + 0.5);
                let (w0, w1, w2) = match barycentric((v0.x, v0.y), (v1.x, v1.y), (v2.x, v2.y), p) {
                    Some(weights) => weights,
                    None => continue,
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let depth = w0 * v0.depth + w1 * v1.depth + w2 * v2.depth;
                let idx = y as usize * self.width + x as usize;
                if !(-1.0..=1.0).contains(&depth) || depth >= self.depth_buffer[idx] {
                    continue;
                }

                let intensity = w0 * v0.intensity + w1 * v1.intensity + w2 * v2.intensity;
                let character = shade(intensity);
                let color = match (v0.color, v1.color, v2.color) {
                    (Some(c0), Some(c1), Some(c2)) => rgb(c0 * w0 + c1 * w1 + c2 * w2),
                    _ => ramp_color(character),
                };
                self.depth_buffer[idx] = depth;
                self.cells[idx] = Cell { character, color };
            }
        }
    }
}

fn lambert(facing: f32) -> f32 {
    AMBIENT + (1.0 - AMBIENT) * facing.max(0.0)
}

fn luminance(color: Vec3) -> f32 {
    0.299 * color.x + 0.587 * color.y + 0.114 * color.z
}

/// Lit surfaces never fall back to a blank cell.
fn shade(intensity: f32) -> char {
    let last = LUMINOSITY_RAMP.len() - 1;
    let index = (intensity.clamp(0.0, 1.0) * last as f32).round() as usize;
    LUMINOSITY_RAMP[index.clamp(1, last)]
}

fn rgb(color: Vec3) -> Color {
    let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color::Rgb {
        r: channel(color.x),
        g: channel(color.y),
        b: channel(color.z),
    }
}

fn ramp_color(character: char) -> Color {
    match character {
        '.' | ':' => Color::DarkGrey,
        '-' | '=' => Color::Grey,
        '+' | '*' => Color::White,
        '#' | '%' | '@' => Color::Cyan,
        _ => Color::White,
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(v0: (f32, f32), v1: (f32, f32), v2: (f32, f32), p: (f32, f32)) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

impl Device for TerminalDevice {
    fn gen_vertex_array(&mut self) -> VertexArrayId {
        let id = VertexArrayId(self.next());
        self.vertex_arrays.insert(id, VertexArray::default());
        id
    }

    fn delete_vertex_array(&mut self, id: VertexArrayId) {
        self.vertex_arrays.remove(&id);
        if self.bound_vertex_array == Some(id) {
            self.bound_vertex_array = None;
        }
    }

    fn bind_vertex_array(&mut self, id: Option<VertexArrayId>) {
        self.bound_vertex_array = id;
    }

    fn gen_buffer(&mut self) -> BufferId {
        let id = BufferId(self.next());
        self.buffers.insert(id, BufferData::Empty);
        id
    }

    fn delete_buffer(&mut self, id: BufferId) {
        self.buffers.remove(&id);
        if self.bound_vertex_buffer == Some(id) {
            self.bound_vertex_buffer = None;
        }
    }

    fn bind_buffer(&mut self, target: BufferTarget, id: Option<BufferId>) {
        match target {
            BufferTarget::Vertices => self.bound_vertex_buffer = id,
            BufferTarget::Indices => match self.bound_vertex_array.and_then(|vao| self.vertex_arrays.get_mut(&vao)) {
                Some(vao) => vao.index_buffer = id,
                None => warn!("index buffer bound without a vertex array"),
            },
        }
    }

    fn buffer_data_f32(&mut self, target: BufferTarget, data: &[f32]) {
        let id = match target {
            BufferTarget::Vertices => self.bound_vertex_buffer,
            BufferTarget::Indices => self
                .bound_vertex_array
                .and_then(|vao| self.vertex_arrays.get(&vao))
                .and_then(|vao| vao.index_buffer),
        };
        match id.and_then(|id| self.buffers.get_mut(&id)) {
            Some(buffer) => *buffer = BufferData::Floats(data.to_vec()),
            None => warn!("buffer data uploaded with no {:?} buffer bound", target),
        }
    }

    fn buffer_data_u32(&mut self, target: BufferTarget, data: &[u32]) {
        let id = match target {
            BufferTarget::Vertices => self.bound_vertex_buffer,
            BufferTarget::Indices => self
                .bound_vertex_array
                .and_then(|vao| self.vertex_arrays.get(&vao))
                .and_then(|vao| vao.index_buffer),
        };
        match id.and_then(|id| self.buffers.get_mut(&id)) {
            Some(buffer) => *buffer = BufferData::Indices(data.to_vec()),
            None => warn!("buffer data uploaded with no {:?} buffer bound", target),
        }
    }

    fn enable_vertex_attrib_array(&mut self, index: u32) {
        match self.bound_vertex_array.and_then(|vao| self.vertex_arrays.get_mut(&vao)) {
            Some(vao) => {
                vao.enabled.insert(index);
            }
            None => warn!("attribute {} enabled without a vertex array", index),
        }
    }

    fn vertex_attrib_pointer(&mut self, index: u32, size: usize, stride: usize, offset: usize) {
        let buffer = match self.bound_vertex_buffer {
            Some(buffer) => buffer,
            None => {
                warn!("attribute {} described without a vertex buffer", index);
                return;
            }
        };
        match self.bound_vertex_array.and_then(|vao| self.vertex_arrays.get_mut(&vao)) {
            Some(vao) => {
                vao.pointers.insert(
                    index,
                    AttribPointer {
                        buffer,
                        size,
                        stride,
                        offset,
                    },
                );
            }
            None => warn!("attribute {} described without a vertex array", index),
        }
    }

    fn draw_elements(&mut self, count: usize) {
        let triangles = self.assemble(count);
        for triangle in &triangles {
            self.rasterize_triangle(triangle);
        }
    }

    fn create_shader(&mut self, stage: ShaderStage) -> Option<ShaderId> {
        let id = ShaderId(self.next());
        self.shaders.insert(
            id,
            ShaderObject {
                stage,
                source: String::new(),
                compiled: false,
                log: String::new(),
            },
        );
        Some(id)
    }

    fn shader_source(&mut self, shader: ShaderId, source: &str) {
        if let Some(object) = self.shaders.get_mut(&shader) {
            object.source = source.to_string();
        }
    }

    /// There is no shader language here: any non-empty source compiles and
    /// the fixed pipeline above runs instead.
    fn compile_shader(&mut self, shader: ShaderId) -> bool {
        match self.shaders.get_mut(&shader) {
            Some(object) => {
                object.compiled = !object.source.trim().is_empty();
                object.log = if object.compiled {
                    String::new()
                } else {
                    format!("empty {} shader source", object.stage.name())
                };
                object.compiled
            }
            None => false,
        }
    }

    fn shader_info_log(&self, shader: ShaderId) -> String {
        self.shaders
            .get(&shader)
            .map(|object| object.log.clone())
            .unwrap_or_else(|| format!("unknown shader {:?}", shader))
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        self.shaders.remove(&shader);
    }

    fn create_program(&mut self) -> Option<ProgramId> {
        let id = ProgramId(self.next());
        self.programs.insert(id, ProgramObject::default());
        Some(id)
    }

    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId) {
        if let Some(object) = self.programs.get_mut(&program) {
            object.attached.push(shader);
        }
    }

    fn detach_shader(&mut self, program: ProgramId, shader: ShaderId) {
        if let Some(object) = self.programs.get_mut(&program) {
            object.attached.retain(|&attached| attached != shader);
        }
    }

    /// Links when one compiled vertex and one compiled fragment shader are
    /// attached.
    fn link_program(&mut self, program: ProgramId) -> bool {
        let stages: Vec<ShaderStage> = match self.programs.get(&program) {
            Some(object) => object
                .attached
                .iter()
                .filter_map(|id| self.shaders.get(id))
                .filter(|shader| shader.compiled)
                .map(|shader| shader.stage)
                .collect(),
            None => return false,
        };
        let count = |stage: ShaderStage| stages.iter().filter(|&&s| s == stage).count();
        let linked = count(ShaderStage::Vertex) == 1 && count(ShaderStage::Fragment) == 1;

        if let Some(object) = self.programs.get_mut(&program) {
            object.linked = linked;
            object.log = if linked {
                String::new()
            } else {
                "program needs one compiled vertex and one compiled fragment shader".to_string()
            };
        }
        debug!("program {:?} linked: {}", program, linked);
        linked
    }

    fn program_info_log(&self, program: ProgramId) -> String {
        self.programs
            .get(&program)
            .map(|object| object.log.clone())
            .unwrap_or_else(|| format!("unknown program {:?}", program))
    }

    fn delete_program(&mut self, program: ProgramId) {
        if let Some(object) = self.programs.remove(&program) {
            for location in object.uniforms.values() {
                self.uniform_values.remove(location);
            }
        }
        if self.current_program == Some(program) {
            self.current_program = None;
        }
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        if let Some(id) = program {
            if !self.programs.get(&id).map_or(false, |object| object.linked) {
                warn!("program {:?} is not linked", id);
                return;
            }
        }
        self.current_program = program;
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        if let Some(location) = self.programs.get(&program)?.uniforms.get(name) {
            return Some(*location);
        }
        let location = UniformLocation(self.next());
        self.programs
            .get_mut(&program)?
            .uniforms
            .insert(name.to_string(), location);
        Some(location)
    }

    fn uniform_matrix4(&mut self, location: UniformLocation, matrix: &[f32; 16]) {
        self.uniform_values.insert(location, *matrix);
    }

    /// Resizes the frame. The offset is ignored; the frame always starts at
    /// the top-left cell.
    fn viewport(&mut self, _x: i32, _y: i32, width: u32, height: u32) {
        self.width = width as usize;
        self.height = height as usize;
        let size = self.width * self.height;
        self.depth_buffer = vec![f32::INFINITY; size];
        self.cells = vec![EMPTY_CELL; size];
    }

    fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.cells.fill(EMPTY_CELL);
    }
}
