//! Stage 1: immediate mode. The triangle is re-specified vertex by vertex every
//! frame and streamed to the GPU.

use anyhow::Result;

use trigon_engine::animate::Oscillator;
use trigon_engine::core::{App, AppControl, FrameCtx};
use trigon_engine::device::{Gpu, GpuInit};
use trigon_engine::immediate::{ImmediateBatch, ImmediateError, ImmediateRenderer, Primitive};
use trigon_engine::logging::{init_logging, LoggingConfig};
use trigon_engine::paint::Color;
use trigon_engine::window::{Runtime, RuntimeConfig};

struct Immediate {
    renderer: Option<ImmediateRenderer>,
    batch: ImmediateBatch,
    red: Oscillator,
}

impl Immediate {
    fn record(&mut self) -> Result<(), ImmediateError> {
        let r = self.red.step();

        self.batch.clear();
        self.batch.begin(Primitive::Triangles)?;
        self.batch.color(r, 0.3, 0.8, 1.0);
        self.batch.vertex(-0.5, -0.5)?;
        self.batch.color(0.2, 0.3, 0.8, 1.0);
        self.batch.vertex(0.5, -0.5)?;
        self.batch.vertex(0.0, 0.5)?;
        self.batch.end()?;
        Ok(())
    }
}

impl App for Immediate {
    fn on_start(&mut self, gpu: &Gpu<'_>) -> AppControl {
        match ImmediateRenderer::new(gpu.device(), gpu.surface_format()) {
            Ok(renderer) => self.renderer = Some(renderer),
            Err(e) => log::error!("immediate renderer unavailable: {e}"),
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if let Err(e) = self.record() {
            log::error!("{e}");
        }

        let (renderer, batch) = (&mut self.renderer, &self.batch);
        ctx.render(Color::BLACK, |rctx, rpass| {
            if let Some(renderer) = renderer {
                renderer.prepare(rctx, batch);
                renderer.draw(rpass);
            }
        })
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let app = Immediate {
        renderer: None,
        batch: ImmediateBatch::new(),
        red: Oscillator::color_ramp(),
    };

    Runtime::run(RuntimeConfig::new("Hello World"), GpuInit::default(), app)
}
