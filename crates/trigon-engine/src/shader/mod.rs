//! Shader loading, compilation and program linking.
//!
//! The pipeline mirrors the classic two-stage flow:
//! - [`ShaderProgramSource`] splits one annotated text file into vertex and fragment source
//! - [`compile_shader`] turns one stage's WGSL into a [`CompiledShader`] or a diagnostic log
//! - [`link_program`] checks that the two stages fit together and records their uniforms
//! - [`ShaderProgram`] builds the GPU render pipeline from a linked pair

mod compile;
mod error;
mod link;
mod program;
mod source;

pub use compile::{compile_shader, CompiledShader, ShaderStage};
pub use error::ShaderError;
pub use link::{link_program, ProgramLayout, UniformLocation};
pub use program::ShaderProgram;
pub use source::ShaderProgramSource;
