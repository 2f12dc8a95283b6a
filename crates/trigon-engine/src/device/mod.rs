//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - creating & configuring the Surface (swapchain) with the requested present mode
//! - acquiring frames and providing encoders/views for rendering
//! - capturing wgpu validation errors instead of panicking on them

mod checked;
mod error;
mod frame;
mod gpu;
mod init;
mod surface;

pub use checked::checked;
pub use error::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use gpu::Gpu;
pub use init::GpuInit;
