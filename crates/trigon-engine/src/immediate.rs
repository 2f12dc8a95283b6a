//! Immediate-mode drawing: vertices are specified one call at a time every frame
//! and streamed to the GPU, with no persistent geometry.

use bytemuck::{Pod, Zeroable};
use thiserror::Error;

use crate::paint::Color;
use crate::render::RenderCtx;
use crate::shader::{ShaderError, ShaderProgram};

const SHADER: &str = "
struct VsOut {
    @builtin(position) position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_main(@location(0) position: vec2<f32>, @location(1) color: vec4<f32>) -> VsOut {
    var out: VsOut;
    out.position = vec4<f32>(position, 0.0, 1.0);
    out.color = color;
    return out;
}

@fragment
fn fs_main(v: VsOut) -> @location(0) vec4<f32> {
    return v.color;
}
";

/// Smallest streaming buffer, in vertices.
const MIN_CAPACITY: usize = 64;

/// Primitive assembled from a `begin`/`end` block.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Primitive {
    Triangles,
}

impl Primitive {
    pub fn vertices_per_primitive(self) -> usize {
        match self {
            Primitive::Triangles => 3,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Error)]
pub enum ImmediateError {
    #[error("begin() called inside an open begin/end block")]
    NestedBegin,
    #[error("vertex() called outside begin/end")]
    VertexOutsideBegin,
    #[error("end() called without a matching begin()")]
    EndWithoutBegin,
}

/// Position plus the color current when the vertex was emitted.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ImmediateVertex {
    pub pos: [f32; 2],
    pub color: [f32; 4],
}

impl ImmediateVertex {
    pub const ATTRS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x4];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ImmediateVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Vertices recorded for one frame.
///
/// Only vertices of closed `begin`/`end` blocks are drawn.
#[derive(Debug, Clone)]
pub struct ImmediateBatch {
    vertices: Vec<ImmediateVertex>,
    color: Color,
    /// Open block and the vertex index it started at.
    open: Option<(Primitive, usize)>,
}

impl Default for ImmediateBatch {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            color: Color::WHITE,
            open: None,
        }
    }
}

impl ImmediateBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, primitive: Primitive) -> Result<(), ImmediateError> {
        if self.open.is_some() {
            return Err(ImmediateError::NestedBegin);
        }
        self.open = Some((primitive, self.vertices.len()));
        Ok(())
    }

    /// Sets the color inherited by subsequent vertices. Allowed anywhere.
    pub fn color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.color = Color::rgba(r, g, b, a);
    }

    pub fn vertex(&mut self, x: f32, y: f32) -> Result<(), ImmediateError> {
        if self.open.is_none() {
            return Err(ImmediateError::VertexOutsideBegin);
        }
        self.vertices.push(ImmediateVertex {
            pos: [x, y],
            color: self.color.to_array(),
        });
        Ok(())
    }

    /// Closes the block. Trailing vertices that do not complete a primitive are
    /// dropped; the number dropped is returned.
    pub fn end(&mut self) -> Result<usize, ImmediateError> {
        let (primitive, start) = self.open.take().ok_or(ImmediateError::EndWithoutBegin)?;

        let emitted = self.vertices.len() - start;
        let dropped = emitted % primitive.vertices_per_primitive();
        if dropped > 0 {
            log::warn!("end(): dropping {dropped} vertex(es) of an incomplete {primitive:?} primitive");
            self.vertices.truncate(self.vertices.len() - dropped);
        }
        Ok(dropped)
    }

    /// Forgets every vertex and any open block. The current color is kept.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.open = None;
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Vertices of closed blocks.
    pub fn vertices(&self) -> &[ImmediateVertex] {
        let closed = self.open.map_or(self.vertices.len(), |(_, start)| start);
        &self.vertices[..closed]
    }
}

/// Streams an [`ImmediateBatch`] into a growable vertex buffer and draws it with a
/// built-in shader.
pub struct ImmediateRenderer {
    program: ShaderProgram,
    vbo: Option<wgpu::Buffer>,
    capacity: usize,
    vertex_count: u32,
}

impl ImmediateRenderer {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Result<Self, ShaderError> {
        let program =
            ShaderProgram::create(device, format, SHADER, SHADER, &[ImmediateVertex::layout()])?;
        Ok(Self {
            program,
            vbo: None,
            capacity: 0,
            vertex_count: 0,
        })
    }

    /// Uploads the batch's closed vertices for the next [`draw`](Self::draw).
    pub fn prepare(&mut self, ctx: &RenderCtx<'_>, batch: &ImmediateBatch) {
        if batch.is_open() {
            log::warn!("immediate batch still has an open begin(); drawing closed blocks only");
        }

        let vertices = batch.vertices();
        self.vertex_count = vertices.len() as u32;
        if vertices.is_empty() {
            return;
        }

        self.ensure_capacity(ctx.device, vertices.len());
        let Some(vbo) = self.vbo.as_ref() else { return };
        ctx.queue.write_buffer(vbo, 0, bytemuck::cast_slice(vertices));
    }

    /// Issues one draw call for the prepared vertices.
    pub fn draw(&self, rpass: &mut wgpu::RenderPass<'_>) {
        let Some(vbo) = self.vbo.as_ref() else { return };
        if self.vertex_count == 0 {
            return;
        }

        self.program.bind(rpass);
        rpass.set_vertex_buffer(0, vbo.slice(..));
        rpass.draw(0..self.vertex_count, 0..1);
    }

    fn ensure_capacity(&mut self, device: &wgpu::Device, required: usize) {
        if required <= self.capacity && self.vbo.is_some() {
            return;
        }

        let new_cap = grown_capacity(required);
        self.vbo = Some(device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("trigon immediate vbo"),
            size: (new_cap * std::mem::size_of::<ImmediateVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.capacity = new_cap;
    }
}

fn grown_capacity(required: usize) -> usize {
    required.next_power_of_two().max(MIN_CAPACITY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::{compile_shader, link_program, ShaderStage};

    fn triangle(batch: &mut ImmediateBatch) {
        batch.begin(Primitive::Triangles).unwrap();
        batch.color(1.0, 0.0, 0.0, 1.0);
        batch.vertex(-0.5, -0.5).unwrap();
        batch.color(0.0, 1.0, 0.0, 1.0);
        batch.vertex(0.5, -0.5).unwrap();
        batch.color(0.0, 0.0, 1.0, 1.0);
        batch.vertex(0.0, 0.5).unwrap();
        assert_eq!(batch.end(), Ok(0));
    }

    #[test]
    fn vertices_inherit_current_color() {
        let mut batch = ImmediateBatch::new();
        triangle(&mut batch);

        let v = batch.vertices();
        assert_eq!(v.len(), 3);
        assert_eq!(v[0].color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(v[1].color, [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(v[2].color, [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(v[2].pos, [0.0, 0.5]);
    }

    #[test]
    fn default_color_is_white() {
        let mut batch = ImmediateBatch::new();
        batch.begin(Primitive::Triangles).unwrap();
        batch.vertex(0.0, 0.0).unwrap();
        batch.end().unwrap();
        assert!(batch.vertices().is_empty());

        batch.begin(Primitive::Triangles).unwrap();
        for _ in 0..3 {
            batch.vertex(0.0, 0.0).unwrap();
        }
        batch.end().unwrap();
        assert_eq!(batch.vertices()[0].color, [1.0; 4]);
    }

    #[test]
    fn vertex_outside_block_is_rejected() {
        let mut batch = ImmediateBatch::new();
        assert_eq!(batch.vertex(0.0, 0.0), Err(ImmediateError::VertexOutsideBegin));

        triangle(&mut batch);
        assert_eq!(batch.vertex(0.0, 0.0), Err(ImmediateError::VertexOutsideBegin));
        assert_eq!(batch.vertices().len(), 3);
    }

    #[test]
    fn nested_begin_and_stray_end_are_rejected() {
        let mut batch = ImmediateBatch::new();
        assert_eq!(batch.end(), Err(ImmediateError::EndWithoutBegin));

        batch.begin(Primitive::Triangles).unwrap();
        assert_eq!(batch.begin(Primitive::Triangles), Err(ImmediateError::NestedBegin));
        assert!(batch.is_open());
    }

    #[test]
    fn end_trims_incomplete_triangle() {
        let mut batch = ImmediateBatch::new();
        triangle(&mut batch);

        batch.begin(Primitive::Triangles).unwrap();
        for i in 0..5 {
            batch.vertex(i as f32, 0.0).unwrap();
        }
        assert_eq!(batch.end(), Ok(2));
        assert_eq!(batch.vertices().len(), 6);
        assert_eq!(batch.vertices()[5].pos, [2.0, 0.0]);
    }

    #[test]
    fn open_block_is_not_visible() {
        let mut batch = ImmediateBatch::new();
        triangle(&mut batch);
        batch.begin(Primitive::Triangles).unwrap();
        batch.vertex(0.0, 0.0).unwrap();
        assert_eq!(batch.vertices().len(), 3);

        batch.clear();
        assert!(!batch.is_open());
        assert!(batch.vertices().is_empty());
    }

    #[test]
    fn capacity_grows_by_powers_of_two() {
        assert_eq!(grown_capacity(1), 64);
        assert_eq!(grown_capacity(64), 64);
        assert_eq!(grown_capacity(65), 128);
        assert_eq!(grown_capacity(300), 512);
    }

    #[test]
    fn builtin_shader_links_against_vertex_layout() {
        let vs = compile_shader(ShaderStage::Vertex, SHADER).unwrap();
        let fs = compile_shader(ShaderStage::Fragment, SHADER).unwrap();
        let layout = link_program(&vs, &fs, &[ImmediateVertex::layout()]).unwrap();
        assert_eq!(layout.vertex_inputs().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(ImmediateVertex::layout().array_stride, 24);
    }
}
