use std::collections::BTreeSet;

use super::{CompiledShader, ShaderError, ShaderStage};

/// Where a named uniform lives in a linked program.
///
/// `None` from [`ProgramLayout::uniform_location`] plays the role of the `-1`
/// "no such uniform" location.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct UniformLocation {
    pub group: u32,
    pub binding: u32,
    /// Size of the uniform's type in bytes.
    pub size: u64,
    /// Stages reading the uniform.
    pub visibility: wgpu::ShaderStages,
    pub(crate) slot: usize,
    /// Id of the [`ShaderProgram`](super::ShaderProgram) that owns the uniform;
    /// `0` for a location that only comes from [`link_program`].
    pub(crate) program: u64,
}

/// The linked view of a vertex + fragment pair: entry points, the vertex inputs
/// they consume and the uniforms they read.
#[derive(Debug, Clone)]
pub struct ProgramLayout {
    vertex_entry: String,
    fragment_entry: String,
    vertex_inputs: BTreeSet<u32>,
    uniforms: Vec<(String, UniformLocation)>,
}

impl ProgramLayout {
    pub fn vertex_entry(&self) -> &str {
        &self.vertex_entry
    }

    pub fn fragment_entry(&self) -> &str {
        &self.fragment_entry
    }

    /// Vertex attribute locations the vertex stage reads.
    pub fn vertex_inputs(&self) -> impl Iterator<Item = u32> + '_ {
        self.vertex_inputs.iter().copied()
    }

    /// Looks up a uniform by variable name in either stage.
    pub fn uniform_location(&self, name: &str) -> Option<UniformLocation> {
        self.uniforms
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, loc)| *loc)
    }

    pub fn uniforms(&self) -> impl Iterator<Item = (&str, UniformLocation)> + '_ {
        self.uniforms.iter().map(|(n, loc)| (n.as_str(), *loc))
    }

    /// Ties every uniform location to the program built from this layout.
    pub(crate) fn assign_program(&mut self, program: u64) {
        for (_, loc) in &mut self.uniforms {
            loc.program = program;
        }
    }
}

/// Links a compiled vertex stage with a compiled fragment stage.
///
/// Checks, collecting every problem into one log:
/// - the stages are attached to the right slots
/// - every `@location` the fragment stage reads is written by the vertex stage
/// - every vertex input has a matching attribute in `vertex_layouts`
/// - uniforms shared by both stages agree on group/binding/size
/// - uniforms live in bind group 0
/// - no other bound resources (storage buffers, textures, samplers) are declared
pub fn link_program(
    vertex: &CompiledShader,
    fragment: &CompiledShader,
    vertex_layouts: &[wgpu::VertexBufferLayout<'_>],
) -> Result<ProgramLayout, ShaderError> {
    let mut problems = Vec::new();

    for (shader, expected) in [(vertex, ShaderStage::Vertex), (fragment, ShaderStage::Fragment)] {
        if shader.stage() != expected {
            problems.push(format!(
                "a {} shader is attached where a {expected} shader is expected",
                shader.stage()
            ));
        }
    }
    if !problems.is_empty() {
        return Err(link_failure(problems));
    }

    let vs_entry = vertex.entry();
    let fs_entry = fragment.entry();

    let mut vertex_inputs = BTreeSet::new();
    for arg in &vs_entry.function.arguments {
        collect_locations(vertex.module(), arg.ty, arg.binding.as_ref(), &mut vertex_inputs);
    }

    let mut varyings_out = BTreeSet::new();
    if let Some(result) = &vs_entry.function.result {
        collect_locations(vertex.module(), result.ty, result.binding.as_ref(), &mut varyings_out);
    }

    let mut varyings_in = BTreeSet::new();
    for arg in &fs_entry.function.arguments {
        collect_locations(fragment.module(), arg.ty, arg.binding.as_ref(), &mut varyings_in);
    }

    for loc in varyings_in.difference(&varyings_out) {
        problems.push(format!(
            "fragment input @location({loc}) is not written by vertex entry point `{}`",
            vs_entry.name
        ));
    }

    let attributes: BTreeSet<u32> = vertex_layouts
        .iter()
        .flat_map(|l| l.attributes.iter().map(|a| a.shader_location))
        .collect();
    for loc in vertex_inputs.difference(&attributes) {
        problems.push(format!(
            "vertex input @location({loc}) has no matching vertex buffer attribute"
        ));
    }

    for shader in [vertex, fragment] {
        for (name, kind) in unsupported_bindings(shader.module()) {
            problems.push(format!(
                "{} shader binds {kind} `{name}`; only var<uniform> bindings are supported",
                shader.stage()
            ));
        }
    }

    let mut uniforms: Vec<(String, UniformLocation)> = Vec::new();
    for shader in [vertex, fragment] {
        for (name, group, binding, size) in uniform_globals(shader.module()) {
            if group != 0 {
                problems.push(format!(
                    "uniform `{name}` is in bind group {group}; only group 0 is supported"
                ));
                continue;
            }

            match uniforms.iter_mut().find(|(n, _)| *n == name) {
                Some((_, loc)) => {
                    if (loc.group, loc.binding, loc.size) != (group, binding, size) {
                        problems.push(format!(
                            "uniform `{name}` is declared differently in the vertex and fragment stages"
                        ));
                    }
                    loc.visibility |= shader.stage().wgpu();
                }
                None => {
                    if let Some((other, _)) = uniforms.iter().find(|(_, l)| l.binding == binding) {
                        problems.push(format!(
                            "uniforms `{other}` and `{name}` share @binding({binding})"
                        ));
                        continue;
                    }
                    let slot = uniforms.len();
                    uniforms.push((
                        name,
                        UniformLocation {
                            group,
                            binding,
                            size,
                            visibility: shader.stage().wgpu(),
                            slot,
                            program: 0,
                        },
                    ));
                }
            }
        }
    }

    if !problems.is_empty() {
        return Err(link_failure(problems));
    }

    Ok(ProgramLayout {
        vertex_entry: vs_entry.name.clone(),
        fragment_entry: fs_entry.name.clone(),
        vertex_inputs,
        uniforms,
    })
}

fn link_failure(problems: Vec<String>) -> ShaderError {
    let log = problems.join("\n");
    log::error!("program failed to link:\n{log}");
    ShaderError::Link { log }
}

/// Collects `@location` bindings, descending into struct members.
fn collect_locations(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
    out: &mut BTreeSet<u32>,
) {
    match binding {
        Some(naga::Binding::Location { location, .. }) => {
            out.insert(*location);
        }
        Some(naga::Binding::BuiltIn(_)) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_locations(module, member.ty, member.binding.as_ref(), out);
                }
            }
        }
    }
}

/// `(name, kind)` of every bound global that is not a uniform buffer.
fn unsupported_bindings(module: &naga::Module) -> Vec<(String, &'static str)> {
    module
        .global_variables
        .iter()
        .filter(|(_, var)| var.binding.is_some() && var.space != naga::AddressSpace::Uniform)
        .map(|(_, var)| {
            let kind = match var.space {
                naga::AddressSpace::Storage { .. } => "storage buffer",
                naga::AddressSpace::Handle => "texture or sampler",
                _ => "resource",
            };
            (var.name.clone().unwrap_or_else(|| "<unnamed>".to_string()), kind)
        })
        .collect()
}

/// `(name, group, binding, size)` of every named `var<uniform>`.
fn uniform_globals(module: &naga::Module) -> Vec<(String, u32, u32, u64)> {
    module
        .global_variables
        .iter()
        .filter(|(_, var)| var.space == naga::AddressSpace::Uniform)
        .filter_map(|(_, var)| {
            let name = var.name.clone()?;
            let rb = var.binding.as_ref()?;
            let size = module.types[var.ty].inner.size(module.to_ctx()) as u64;
            Some((name, rb.group, rb.binding, size))
        })
        .collect()
}
