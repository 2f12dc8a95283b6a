use winit::event::WindowEvent;

use crate::device::Gpu;
use crate::input::{InputEvent, Key, KeyState};

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by each tutorial stage.
pub trait App {
    /// Called once, after the window and its GPU context exist and before the
    /// first frame. Buffers, shaders and pipelines are created here.
    fn on_start(&mut self, gpu: &Gpu<'_>) -> AppControl {
        let _ = gpu;
        AppControl::Continue
    }

    /// Called for raw window events.
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Key callback. The default sets the close flag on an Escape press.
    fn on_input(&mut self, event: &InputEvent) -> AppControl {
        match event {
            InputEvent::Key {
                key: Key::Escape,
                state: KeyState::Pressed,
                ..
            } => AppControl::Exit,
            _ => AppControl::Continue,
        }
    }

    /// Called once per rendered frame.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;

    /// Called once when the loop ends, while the GPU context is still alive.
    fn on_exit(&mut self) {}
}
