use std::path::PathBuf;

use thiserror::Error;

use super::ShaderStage;

/// Failure while loading, compiling, linking or feeding a shader program.
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("failed to read shader file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `log` is the compiler's diagnostic, never empty.
    #[error("{stage} shader failed to compile:\n{log}")]
    Compile { stage: ShaderStage, log: String },

    #[error("program failed to link:\n{log}")]
    Link { log: String },

    #[error("no uniform at @binding({binding}) in this program")]
    UnknownUniform { binding: u32 },

    #[error("uniform '{name}' is {declared} bytes, {written} bytes were written")]
    UniformSize {
        name: String,
        declared: u64,
        written: u64,
    },
}
