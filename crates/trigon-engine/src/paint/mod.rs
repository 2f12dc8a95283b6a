//! Color model shared between the tutorials and the renderers.

pub mod color;

pub use color::Color;
