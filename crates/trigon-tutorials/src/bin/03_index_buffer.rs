//! Stage 3: a quad drawn from four vertices and six indices, with shaders parsed
//! from one annotated file and an animated color uniform.

use anyhow::Result;

use trigon_engine::animate::Oscillator;
use trigon_engine::core::{App, AppControl, FrameCtx};
use trigon_engine::device::{Gpu, GpuInit};
use trigon_engine::geometry::{Mesh, QUAD_INDICES, QUAD_VERTICES, Vertex2};
use trigon_engine::input::Key;
use trigon_engine::logging::{init_logging, LoggingConfig};
use trigon_engine::paint::Color;
use trigon_engine::shader::{ShaderProgram, ShaderProgramSource, UniformLocation};
use trigon_engine::window::{Runtime, RuntimeConfig};

const SHADER_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/res/shaders/basic.shader");

const INITIAL_COLOR: Color = Color::rgba(0.2, 0.3, 0.8, 1.0);

struct IndexBuffer {
    mesh: Option<Mesh>,
    program: Option<(ShaderProgram, UniformLocation)>,
    red: Oscillator,
    paused: bool,
}

impl IndexBuffer {
    fn build_program(gpu: &Gpu<'_>) -> Option<(ShaderProgram, UniformLocation)> {
        let source = ShaderProgramSource::load(SHADER_PATH);
        log::info!("VERTEX\n{}", source.vertex);
        log::info!("FRAGMENT\n{}", source.fragment);

        let program = ShaderProgram::create(
            gpu.device(),
            gpu.surface_format(),
            &source.vertex,
            &source.fragment,
            &[Vertex2::layout()],
        )
        .map_err(|e| log::error!("{e}"))
        .ok()?;

        let Some(location) = program.uniform_location("u_color") else {
            log::warn!("u_color is not an active uniform in {SHADER_PATH}");
            return None;
        };

        program
            .set_uniform_color(gpu.queue(), location, INITIAL_COLOR)
            .map_err(|e| log::error!("{e}"))
            .ok()?;

        Some((program, location))
    }
}

impl App for IndexBuffer {
    fn on_start(&mut self, gpu: &Gpu<'_>) -> AppControl {
        self.mesh = Some(Mesh::indexed(
            gpu.device(),
            "quad",
            &QUAD_VERTICES,
            &QUAD_INDICES,
        ));
        self.program = Self::build_program(gpu);
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if ctx.input_frame.pressed(Key::Space) {
            self.paused = !self.paused;
            ctx.window
                .set_title(if self.paused { "Hello World (paused)" } else { "Hello World" });
        }

        let red = if self.paused {
            self.red.value()
        } else {
            self.red.step()
        };
        let color = INITIAL_COLOR.with_r(red);
        let (mesh, program) = (&self.mesh, &self.program);

        ctx.render(Color::BLACK, |rctx, rpass| {
            let (Some(mesh), Some((program, location))) = (mesh, program) else {
                return;
            };
            if let Err(e) = program.set_uniform_color(rctx.queue, *location, color) {
                log::error!("{e}");
            }
            program.bind(rpass);
            mesh.draw(rpass);
        })
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let app = IndexBuffer {
        mesh: None,
        program: None,
        red: Oscillator::color_ramp(),
        paused: false,
    };

    Runtime::run(RuntimeConfig::new("Hello World"), GpuInit::default(), app)
}
