//! Trigon engine crate.
//!
//! This crate owns the platform + GPU runtime pieces used by the tutorial stages:
//! window and event loop, GPU bootstrap, shader loading/compilation and the small
//! helpers each stage shares.

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod paint;
pub mod geometry;
pub mod immediate;
pub mod shader;
pub mod animate;
pub mod render;
