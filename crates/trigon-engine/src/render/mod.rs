//! Renderer-facing context.
//!
//! Renderers own their GPU resources (pipelines, buffers) and record into the
//! single render pass the frame context opens for them.

mod ctx;

pub use ctx::RenderCtx;
