//! Core engine-facing contracts.
//!
//! This module defines the interface between the runtime (platform loop) and the
//! tutorial programs: a setup hook, an event hook and a per-frame callback.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCtx};
