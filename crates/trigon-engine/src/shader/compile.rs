use std::fmt;

use naga::valid::{Capabilities, ValidationFlags, Validator};

use super::ShaderError;

/// Pipeline stage a shader source is compiled for.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub(crate) fn naga(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }

    pub(crate) fn wgpu(self) -> wgpu::ShaderStages {
        match self {
            ShaderStage::Vertex => wgpu::ShaderStages::VERTEX,
            ShaderStage::Fragment => wgpu::ShaderStages::FRAGMENT,
        }
    }

    /// The WGSL attribute marking an entry point of this stage.
    fn attribute(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "@vertex",
            ShaderStage::Fragment => "@fragment",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        })
    }
}

/// One successfully compiled stage: validated IR plus the entry point to run.
#[derive(Debug, Clone)]
pub struct CompiledShader {
    stage: ShaderStage,
    source: String,
    entry_point: String,
    module: naga::Module,
}

impl CompiledShader {
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    pub(crate) fn module(&self) -> &naga::Module {
        &self.module
    }

    pub(crate) fn entry(&self) -> &naga::EntryPoint {
        // Presence was checked in `compile_shader`.
        self.module
            .entry_points
            .iter()
            .find(|ep| ep.name == self.entry_point)
            .unwrap_or(&self.module.entry_points[0])
    }
}

/// Compiles one stage of WGSL source.
///
/// The source is parsed, validated, and must declare an entry point for `stage`.
/// On failure the diagnostic is logged and returned as [`ShaderError::Compile`];
/// no compiled object exists for a failed stage.
pub fn compile_shader(stage: ShaderStage, source: &str) -> Result<CompiledShader, ShaderError> {
    let result = parse_and_validate(stage, source);

    match &result {
        Ok(shader) => log::debug!("{stage} shader compiled, entry point `{}`", shader.entry_point()),
        Err(ShaderError::Compile { log, .. }) => {
            log::error!("{stage} shader failed to compile:\n{log}");
        }
        Err(_) => {}
    }

    result
}

fn parse_and_validate(stage: ShaderStage, source: &str) -> Result<CompiledShader, ShaderError> {
    let fail = |log: String, fallback: &dyn fmt::Display| ShaderError::Compile {
        stage,
        log: if log.trim().is_empty() {
            fallback.to_string()
        } else {
            log
        },
    };

    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| fail(e.emit_to_string(source), &e))?;

    Validator::new(ValidationFlags::all(), Capabilities::empty())
        .validate(&module)
        .map_err(|e| fail(e.emit_to_string(source), &e))?;

    let mut candidates = module
        .entry_points
        .iter()
        .filter(|ep| ep.stage == stage.naga());

    let Some(entry) = candidates.next() else {
        let found: Vec<&str> = module.entry_points.iter().map(|ep| ep.name.as_str()).collect();
        let log = if found.is_empty() {
            format!("no {} entry point: source declares no entry points", stage.attribute())
        } else {
            format!(
                "no {} entry point (found: {})",
                stage.attribute(),
                found.join(", ")
            )
        };
        return Err(ShaderError::Compile { stage, log });
    };

    let entry_point = entry.name.clone();
    if let Some(extra) = candidates.next() {
        log::debug!(
            "{stage} shader declares several entry points; using `{entry_point}`, ignoring `{}`",
            extra.name
        );
    }

    Ok(CompiledShader {
        stage,
        source: source.to_string(),
        entry_point,
        module,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = "
@vertex
fn vs_main(@location(0) position: vec2<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(position, 0.0, 1.0);
}
";

    const FRAGMENT: &str = "
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 0.0, 0.0, 1.0);
}
";

    fn compile_log(err: ShaderError) -> (ShaderStage, String) {
        match err {
            ShaderError::Compile { stage, log } => (stage, log),
            other => panic!("expected a compile error, got {other:?}"),
        }
    }

    #[test]
    fn valid_stages_compile() {
        let vs = compile_shader(ShaderStage::Vertex, VERTEX).unwrap();
        assert_eq!(vs.stage(), ShaderStage::Vertex);
        assert_eq!(vs.entry_point(), "vs_main");

        let fs = compile_shader(ShaderStage::Fragment, FRAGMENT).unwrap();
        assert_eq!(fs.entry_point(), "fs_main");
        assert_eq!(fs.entry().name, "fs_main");
    }

    #[test]
    fn syntax_error_reports_diagnostic() {
        let broken = "@vertex\nfn vs_main( -> @builtin(position) vec4<f32> {\n";
        let (stage, log) = compile_log(compile_shader(ShaderStage::Vertex, broken).unwrap_err());
        assert_eq!(stage, ShaderStage::Vertex);
        assert!(!log.trim().is_empty());
    }

    #[test]
    fn type_error_is_caught_by_validation() {
        let mistyped = "
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec3<f32>(1.0, 0.0, 0.0);
}
";
        let (stage, log) = compile_log(compile_shader(ShaderStage::Fragment, mistyped).unwrap_err());
        assert_eq!(stage, ShaderStage::Fragment);
        assert!(!log.trim().is_empty());
    }

    #[test]
    fn wrong_stage_has_no_entry_point() {
        let (_, log) = compile_log(compile_shader(ShaderStage::Vertex, FRAGMENT).unwrap_err());
        assert!(log.contains("@vertex"));
        assert!(log.contains("fs_main"));
    }

    #[test]
    fn empty_source_fails_cleanly() {
        let (stage, log) = compile_log(compile_shader(ShaderStage::Fragment, "").unwrap_err());
        assert_eq!(stage, ShaderStage::Fragment);
        assert!(log.contains("no @fragment entry point"));
    }

    #[test]
    fn error_display_names_stage() {
        let err = compile_shader(ShaderStage::Vertex, "").unwrap_err();
        assert!(err.to_string().starts_with("vertex shader failed to compile"));
    }
}
