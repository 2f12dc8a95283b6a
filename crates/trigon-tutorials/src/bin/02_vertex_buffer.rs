//! Stage 2: the triangle lives in a vertex buffer uploaded once; shaders are
//! inline sources compiled and linked at startup.

use anyhow::Result;

use trigon_engine::animate::Oscillator;
use trigon_engine::core::{App, AppControl, FrameCtx};
use trigon_engine::device::{Gpu, GpuInit};
use trigon_engine::geometry::{Mesh, TRIANGLE_VERTICES, Vertex2};
use trigon_engine::logging::{init_logging, LoggingConfig};
use trigon_engine::paint::Color;
use trigon_engine::shader::{ShaderProgram, UniformLocation};
use trigon_engine::window::{Runtime, RuntimeConfig};

const VERTEX_SHADER: &str = "
@vertex
fn vs_main(@location(0) position: vec2<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(position, 0.0, 1.0);
}
";

const FRAGMENT_SHADER: &str = "
@group(0) @binding(0)
var<uniform> u_color: vec4<f32>;

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return u_color;
}
";

const BASE_COLOR: Color = Color::rgba(0.2, 0.3, 0.8, 1.0);

struct VertexBuffer {
    mesh: Option<Mesh>,
    program: Option<(ShaderProgram, UniformLocation)>,
    red: Oscillator,
}

impl App for VertexBuffer {
    fn on_start(&mut self, gpu: &Gpu<'_>) -> AppControl {
        self.mesh = Some(Mesh::new(gpu.device(), "triangle", &TRIANGLE_VERTICES));

        let program = match ShaderProgram::create(
            gpu.device(),
            gpu.surface_format(),
            VERTEX_SHADER,
            FRAGMENT_SHADER,
            &[Vertex2::layout()],
        ) {
            Ok(p) => p,
            Err(e) => {
                log::error!("{e}");
                return AppControl::Continue;
            }
        };

        let Some(location) = program.uniform_location("u_color") else {
            log::warn!("u_color is not an active uniform");
            return AppControl::Continue;
        };
        if let Err(e) = program.set_uniform_color(gpu.queue(), location, BASE_COLOR) {
            log::error!("{e}");
        }
        self.program = Some((program, location));

        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let red = self.red.step();
        let (mesh, program) = (&self.mesh, &self.program);

        ctx.render(Color::BLACK, |rctx, rpass| {
            let (Some(mesh), Some((program, location))) = (mesh, program) else {
                return;
            };
            if let Err(e) = program.set_uniform_color(rctx.queue, *location, BASE_COLOR.with_r(red)) {
                log::error!("{e}");
            }
            program.bind(rpass);
            mesh.draw(rpass);
        })
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let app = VertexBuffer {
        mesh: None,
        program: None,
        red: Oscillator::color_ramp(),
    };

    Runtime::run(RuntimeConfig::new("Hello World"), GpuInit::default(), app)
}
