use super::compiled_shader::{CompiledShader, PassDescriptor, SubShader};
use crate::error::{CompileError, CompileResult};
use crate::parser::{ParsedPass, ParsedShader, StageSource};
use crate::source_map::{SourceMap, SourceSpan};

pub const DEFAULT_PASS_NAME: &str = "Default";

/// Turn parsed passes into descriptors with complete per-stage GLSL
pub fn assemble(
    parsed: ParsedShader,
    expanded_source: String,
    source_map: SourceMap,
) -> CompileResult<CompiledShader> {
    let mut subshaders = Vec::with_capacity(parsed.subshaders.len());
    for sub in parsed.subshaders {
        let mut passes = Vec::with_capacity(sub.passes.len());
        for pass in sub.passes {
            passes.push(assemble_pass(pass, &expanded_source, &source_map)?);
        }
        subshaders.push(SubShader {
            name: sub.name,
            tags: sub.tags,
            passes,
        });
    }

    Ok(CompiledShader {
        name: parsed.name,
        subshaders,
        expanded_source,
        source_map,
    })
}

fn assemble_pass(pass: ParsedPass, source: &str, map: &SourceMap) -> CompileResult<PassDescriptor> {
    let name = pass
        .name
        .clone()
        .unwrap_or_else(|| DEFAULT_PASS_NAME.to_string());

    let shared: Vec<&str> = pass
        .shared_glsl
        .iter()
        .map(|span| slice(source, *span))
        .collect();
    let shared = shared.join("\n");

    let (vertex_source, vertex_span) =
        stage_source(&pass, pass.vertex.as_ref(), "VertexShader", &name, &shared, source, map)?;
    let (fragment_source, fragment_span) = stage_source(
        &pass,
        pass.fragment.as_ref(),
        "FragmentShader",
        &name,
        &shared,
        source,
        map,
    )?;

    Ok(PassDescriptor {
        name,
        vertex_source,
        fragment_source,
        vertex_span,
        fragment_span,
        tags: pass.tags,
        constant_states: pass.render_states.constants,
        variable_states: pass.render_states.variables,
    })
}

fn stage_source(
    pass: &ParsedPass,
    stage: Option<&StageSource>,
    stage_name: &str,
    pass_name: &str,
    shared: &str,
    source: &str,
    map: &SourceMap,
) -> CompileResult<(String, SourceSpan)> {
    match stage {
        None => Err(CompileError::assembly(
            format!("Pass '{}' has no {}", pass_name, stage_name),
            map.position_or_default(pass.span.start),
        )),
        Some(StageSource::Inline(span)) => {
            let body = slice(source, *span);
            Ok((prepend(shared, body), *span))
        }
        Some(StageSource::EntryPoint { name, span }) => {
            if !pass.glsl_functions.contains(name) {
                return Err(CompileError::assembly(
                    format!(
                        "{} entry point '{}' is not declared as a function in Pass '{}'",
                        stage_name, name, pass_name
                    ),
                    map.position_or_default(span.start),
                ));
            }
            let main = format!("void main() {{\n    {}();\n}}\n", name);
            Ok((prepend(shared, &main), *span))
        }
    }
}

fn prepend(shared: &str, body: &str) -> String {
    if shared.is_empty() {
        body.to_string()
    } else {
        format!("{}\n{}", shared, body)
    }
}

fn slice(source: &str, span: SourceSpan) -> &str {
    source.get(span.start..span.end).unwrap_or("")
}
