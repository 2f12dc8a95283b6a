//! Fixed tutorial geometry and the buffer objects holding it.
//!
//! Positions are already in normalized device coordinates; no transform is applied.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

/// One vertex: a 2D position, two `f32`s, not normalized.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex2 {
    pub pos: [f32; 2],
}

impl Vertex2 {
    pub const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { pos: [x, y] }
    }

    /// Attribute 0, `Float32x2`, stride 8, offset 0.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex2>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Single triangle, counter-clockwise.
pub const TRIANGLE_VERTICES: [Vertex2; 3] = [
    Vertex2::new(-0.5, -0.5),
    Vertex2::new(0.5, -0.5),
    Vertex2::new(0.0, 0.5),
];

/// Quad corners, indexed by [`QUAD_INDICES`].
pub const QUAD_VERTICES: [Vertex2; 4] = [
    Vertex2::new(-0.5, -0.5), // 0
    Vertex2::new(0.5, -0.5),  // 1
    Vertex2::new(0.5, 0.5),   // 2
    Vertex2::new(-0.5, 0.5),  // 3
];

/// Two triangles sharing the 0-2 diagonal.
pub const QUAD_INDICES: [u32; 6] = [
    0, 1, 2, //
    2, 3, 0, //
];

/// Vertex buffer plus an optional index buffer, uploaded once and never mutated.
pub struct Mesh {
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
    index_buffer: Option<(wgpu::Buffer, u32)>,
}

impl Mesh {
    /// Uploads a non-indexed vertex array.
    pub fn new(device: &wgpu::Device, label: &str, vertices: &[Vertex2]) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} vbo")),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Self {
            vertex_buffer,
            vertex_count: vertices.len() as u32,
            index_buffer: None,
        }
    }

    /// Uploads a vertex array and a `u32` index array.
    pub fn indexed(
        device: &wgpu::Device,
        label: &str,
        vertices: &[Vertex2],
        indices: &[u32],
    ) -> Self {
        debug_assert!(
            indices.iter().all(|&i| (i as usize) < vertices.len()),
            "index out of range for {} vertices",
            vertices.len()
        );

        let mut mesh = Self::new(device, label, vertices);
        let ibo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} ibo")),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        mesh.index_buffer = Some((ibo, indices.len() as u32));
        mesh
    }

    /// Binds the buffers and issues exactly one draw call.
    pub fn draw(&self, rpass: &mut wgpu::RenderPass<'_>) {
        rpass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        match &self.index_buffer {
            Some((ibo, count)) => {
                rpass.set_index_buffer(ibo.slice(..), wgpu::IndexFormat::Uint32);
                rpass.draw_indexed(0..*count, 0, 0..1);
            }
            None => rpass.draw(0..self.vertex_count, 0..1),
        }
    }
}
