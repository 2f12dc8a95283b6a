use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

use bytemuck::Pod;

use crate::device::checked;
use crate::paint::Color;

use super::{
    compile_shader, link_program, CompiledShader, ProgramLayout, ShaderError, ShaderStage,
    UniformLocation,
};

/// Uniform buffers are allocated in 16-byte rows.
const UNIFORM_ALIGN: u64 = 16;

/// Source of program ids. `0` is reserved for locations not owned by a program.
static NEXT_PROGRAM_ID: AtomicU64 = AtomicU64::new(1);

struct UniformSlot {
    name: String,
    location: UniformLocation,
    buffer: wgpu::Buffer,
}

/// A linked, GPU-resident shader program: render pipeline plus the buffers
/// backing its uniforms.
///
/// Only the pipeline survives creation; the per-stage shader modules are dropped
/// as soon as the pipeline exists.
pub struct ShaderProgram {
    id: u64,
    layout: ProgramLayout,
    pipeline: wgpu::RenderPipeline,
    bind_group: Option<wgpu::BindGroup>,
    uniforms: Vec<UniformSlot>,
}

impl ShaderProgram {
    /// Compiles both stages, links them and builds the render pipeline for `format`.
    ///
    /// Compile and link diagnostics are logged before the error is returned. GPU
    /// object creation runs inside a validation scope, so anything wgpu rejects
    /// that the shader checks did not catch (attribute types, target formats)
    /// becomes [`ShaderError::Link`] rather than a panic.
    pub fn create(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        vertex_src: &str,
        fragment_src: &str,
        vertex_layouts: &[wgpu::VertexBufferLayout<'_>],
    ) -> Result<Self, ShaderError> {
        let vs = compile_shader(ShaderStage::Vertex, vertex_src)?;
        let fs = compile_shader(ShaderStage::Fragment, fragment_src)?;
        let mut layout = link_program(&vs, &fs, vertex_layouts)?;

        let id = NEXT_PROGRAM_ID.fetch_add(1, Ordering::Relaxed);
        layout.assign_program(id);

        let built = checked(device, "program creation", || {
            Self::build_gpu_objects(device, format, &vs, &fs, &layout, vertex_layouts)
        });
        let (uniforms, bind_group, pipeline) = match built {
            Ok(objects) => objects,
            Err(err) => {
                return Err(ShaderError::Link {
                    log: err.to_string(),
                });
            }
        };

        log::debug!(
            "linked program {} / {} (inputs {:?}) with {} uniform(s)",
            layout.vertex_entry(),
            layout.fragment_entry(),
            layout.vertex_inputs().collect::<Vec<_>>(),
            uniforms.len()
        );

        Ok(Self {
            id,
            layout,
            pipeline,
            bind_group,
            uniforms,
        })
    }

    fn build_gpu_objects(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        vs: &CompiledShader,
        fs: &CompiledShader,
        layout: &ProgramLayout,
        vertex_layouts: &[wgpu::VertexBufferLayout<'_>],
    ) -> (Vec<UniformSlot>, Option<wgpu::BindGroup>, wgpu::RenderPipeline) {
        let uniforms: Vec<UniformSlot> = layout
            .uniforms()
            .map(|(name, location)| UniformSlot {
                name: name.to_string(),
                location,
                buffer: device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(&format!("trigon uniform {name}")),
                    size: uniform_buffer_size(location.size),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                }),
            })
            .collect();

        let bind_group_layout = (!uniforms.is_empty()).then(|| {
            let entries: Vec<wgpu::BindGroupLayoutEntry> = uniforms
                .iter()
                .map(|u| wgpu::BindGroupLayoutEntry {
                    binding: u.location.binding,
                    visibility: u.location.visibility,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: NonZeroU64::new(u.location.size),
                    },
                    count: None,
                })
                .collect();

            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("trigon program bgl"),
                entries: &entries,
            })
        });

        let bind_group = bind_group_layout.as_ref().map(|bgl| {
            let entries: Vec<wgpu::BindGroupEntry<'_>> = uniforms
                .iter()
                .map(|u| wgpu::BindGroupEntry {
                    binding: u.location.binding,
                    resource: u.buffer.as_entire_binding(),
                })
                .collect();

            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("trigon program bind group"),
                layout: bgl,
                entries: &entries,
            })
        });

        let bind_group_layouts: Vec<&wgpu::BindGroupLayout> = bind_group_layout.iter().collect();
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("trigon program pipeline layout"),
            bind_group_layouts: &bind_group_layouts,
            immediate_size: 0,
        });

        // The stage modules live only for the duration of this block.
        let pipeline = {
            let vs_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("trigon vertex shader"),
                source: wgpu::ShaderSource::Wgsl(vs.source().into()),
            });
            let fs_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("trigon fragment shader"),
                source: wgpu::ShaderSource::Wgsl(fs.source().into()),
            });

            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("trigon program pipeline"),
                layout: Some(&pipeline_layout),

                vertex: wgpu::VertexState {
                    module: &vs_module,
                    entry_point: Some(layout.vertex_entry()),
                    compilation_options: Default::default(),
                    buffers: vertex_layouts,
                },

                fragment: Some(wgpu::FragmentState {
                    module: &fs_module,
                    entry_point: Some(layout.fragment_entry()),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),

                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },

                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            })
        };

        (uniforms, bind_group, pipeline)
    }

    /// See [`ProgramLayout::uniform_location`].
    pub fn uniform_location(&self, name: &str) -> Option<UniformLocation> {
        self.layout.uniform_location(name)
    }

    /// Writes raw uniform data. `value` must be exactly as large as the uniform.
    pub fn set_uniform<T: Pod>(
        &self,
        queue: &wgpu::Queue,
        location: UniformLocation,
        value: &T,
    ) -> Result<(), ShaderError> {
        let slot = self
            .uniforms
            .get(location.slot)
            .filter(|_| location.program == self.id)
            .ok_or(ShaderError::UnknownUniform {
                binding: location.binding,
            })?;

        let bytes = bytemuck::bytes_of(value);
        if bytes.len() as u64 != slot.location.size {
            return Err(ShaderError::UniformSize {
                name: slot.name.clone(),
                declared: slot.location.size,
                written: bytes.len() as u64,
            });
        }

        queue.write_buffer(&slot.buffer, 0, bytes);
        Ok(())
    }

    /// Sets a `vec4<f32>` uniform.
    pub fn set_uniform_4f(
        &self,
        queue: &wgpu::Queue,
        location: UniformLocation,
        v: [f32; 4],
    ) -> Result<(), ShaderError> {
        self.set_uniform(queue, location, &v)
    }

    pub fn set_uniform_color(
        &self,
        queue: &wgpu::Queue,
        location: UniformLocation,
        color: Color,
    ) -> Result<(), ShaderError> {
        self.set_uniform(queue, location, &color)
    }

    /// Makes this program current for subsequent draws in `rpass`.
    pub fn bind(&self, rpass: &mut wgpu::RenderPass<'_>) {
        rpass.set_pipeline(&self.pipeline);
        if let Some(bind_group) = &self.bind_group {
            rpass.set_bind_group(0, bind_group, &[]);
        }
    }
}

fn uniform_buffer_size(size: u64) -> u64 {
    size.max(1).div_ceil(UNIFORM_ALIGN) * UNIFORM_ALIGN
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vertex2;
    use crate::shader::compile_shader;

    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    const VERTEX: &str = "
@vertex
fn vs_main(@location(0) position: vec2<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(position, 0.0, 1.0);
}
";

    const FRAGMENT: &str = "
@group(0) @binding(0)
var<uniform> u_color: vec4<f32>;

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return u_color;
}
";

    fn noop_device() -> (wgpu::Device, wgpu::Queue) {
        wgpu::Device::noop(&wgpu::DeviceDescriptor::default())
    }

    fn create(device: &wgpu::Device, vertex: &str, fragment: &str) -> Result<ShaderProgram, ShaderError> {
        ShaderProgram::create(device, FORMAT, vertex, fragment, &[Vertex2::layout()])
    }

    #[test]
    fn uniform_buffers_round_up_to_rows() {
        assert_eq!(uniform_buffer_size(16), 16);
        assert_eq!(uniform_buffer_size(4), 16);
        assert_eq!(uniform_buffer_size(20), 32);
        assert_eq!(uniform_buffer_size(0), 16);
    }

    #[test]
    fn creates_program_and_writes_color() {
        let (device, queue) = noop_device();
        let program = create(&device, VERTEX, FRAGMENT).unwrap();

        let loc = program.uniform_location("u_color").unwrap();
        assert_eq!((loc.binding, loc.size), (0, 16));
        program.set_uniform_4f(&queue, loc, [0.2, 0.3, 0.8, 1.0]).unwrap();
        program
            .set_uniform_color(&queue, loc, Color::rgba(0.0, 0.3, 0.8, 1.0))
            .unwrap();
        assert!(program.uniform_location("u_missing").is_none());
    }

    #[test]
    fn attribute_type_mismatch_is_a_link_error() {
        // naga and the interface check accept this; only pipeline validation
        // sees that a Float32x2 attribute feeds a vec4<u32> input.
        let vertex = "
@vertex
fn vs_main(@location(0) position: vec4<u32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(position);
}
";
        let (device, _queue) = noop_device();
        match create(&device, vertex, FRAGMENT) {
            Err(ShaderError::Link { log }) => assert!(!log.trim().is_empty()),
            Err(other) => panic!("expected a link error, got {other:?}"),
            Ok(_) => panic!("mismatched attribute type was accepted"),
        }
    }

    #[test]
    fn output_incompatible_with_target_is_a_link_error() {
        let fragment = "
@fragment
fn fs_main() -> @location(0) vec4<i32> {
    return vec4<i32>(1, 0, 0, 1);
}
";
        let (device, _queue) = noop_device();
        assert!(matches!(
            create(&device, VERTEX, fragment),
            Err(ShaderError::Link { .. })
        ));
    }

    #[test]
    fn wrong_sized_write_is_rejected() {
        let (device, queue) = noop_device();
        let program = create(&device, VERTEX, FRAGMENT).unwrap();
        let loc = program.uniform_location("u_color").unwrap();

        match program.set_uniform(&queue, loc, &[1.0f32, 0.0]).unwrap_err() {
            ShaderError::UniformSize {
                name,
                declared,
                written,
            } => {
                assert_eq!(name, "u_color");
                assert_eq!(declared, 16);
                assert_eq!(written, 8);
            }
            other => panic!("expected a size error, got {other:?}"),
        }
    }

    #[test]
    fn location_from_another_program_is_rejected() {
        let other_fragment = "
@group(0) @binding(0)
var<uniform> u_other: vec4<f32>;

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return u_other;
}
";
        let (device, queue) = noop_device();
        let a = create(&device, VERTEX, FRAGMENT).unwrap();
        let b = create(&device, VERTEX, other_fragment).unwrap();
        let twin = create(&device, VERTEX, FRAGMENT).unwrap();

        let foreign = b.uniform_location("u_other").unwrap();
        assert!(matches!(
            a.set_uniform_color(&queue, foreign, Color::WHITE),
            Err(ShaderError::UnknownUniform { binding: 0 })
        ));

        // Same name and binding, still a different program.
        let twin_loc = twin.uniform_location("u_color").unwrap();
        assert!(matches!(
            a.set_uniform_color(&queue, twin_loc, Color::WHITE),
            Err(ShaderError::UnknownUniform { .. })
        ));
    }

    #[test]
    fn location_from_bare_layout_is_rejected() {
        let vs = compile_shader(ShaderStage::Vertex, VERTEX).unwrap();
        let fs = compile_shader(ShaderStage::Fragment, FRAGMENT).unwrap();
        let layout = link_program(&vs, &fs, &[Vertex2::layout()]).unwrap();

        let (device, queue) = noop_device();
        let program = create(&device, VERTEX, FRAGMENT).unwrap();
        let loc = layout.uniform_location("u_color").unwrap();
        assert!(matches!(
            program.set_uniform_4f(&queue, loc, [0.0; 4]),
            Err(ShaderError::UnknownUniform { .. })
        ));
    }
}
