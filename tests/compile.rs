use glsl_pass_compiler::preprocessor::Preprocessor;
use glsl_pass_compiler::*;

const MINIMAL: &str = r#"SubShader {
    Pass "p0" {
        BlendState { Enabled = true }
        VertexShader { void main() { gl_Position = vec4(0.0); } }
        FragmentShader { out vec4 color; void main() { color = vec4(1.0); } }
    }
}
"#;

fn compiler_with(includes: &[(&str, &str)]) -> ShaderCompiler {
    let mut config = CompileConfig::default();
    for (path, text) in includes {
        config.add_include(path, text);
    }
    ShaderCompiler::new(config).unwrap()
}

#[test]
fn minimal_shader_round_trip() {
    let shader = compile(MINIMAL, &CompileConfig::default()).unwrap();
    assert_eq!(shader.subshaders.len(), 1);
    assert_eq!(shader.subshaders[0].passes.len(), 1);

    let pass = &shader.subshaders[0].passes[0];
    assert_eq!(pass.name, "p0");
    assert_eq!(pass.constant_states.len(), 1);
    assert_eq!(
        pass.constant_states
            .get(&RenderStateKey::new(RenderStateElement::BlendEnabled)),
        Some(&RenderStateConstant::Bool(true))
    );
    assert!(pass.variable_states.is_empty());
    assert!(!pass.vertex_span.is_empty());
    assert!(!pass.fragment_span.is_empty());
    assert!(pass.vertex_source.contains("gl_Position"));
    assert!(pass.fragment_source.contains("color = vec4(1.0);"));
}

#[test]
fn function_macro_substitutes_without_evaluating() {
    let mut preprocessor = Preprocessor::new();
    let output = preprocessor.process("#define N(a) (a+a)\nN(5)\n").unwrap();
    assert!(output.contains("(5+5)"));
}

#[test]
fn self_referential_macro_is_left_alone() {
    let mut preprocessor = Preprocessor::new();
    let output = preprocessor.process("#define A A\nA\n").unwrap();
    assert_eq!(output.trim(), "A");
}

#[test]
fn conditional_chain_is_exclusive() {
    let mut preprocessor = Preprocessor::new();
    let source = "#if false\nfirst\n#elif true\nsecond\n#else\nthird\n#endif\n";
    let output = preprocessor.process(source).unwrap();
    assert!(!output.contains("first"));
    assert!(output.contains("second"));
    assert!(!output.contains("third"));

    let output = preprocessor
        .process("#if 0\n#define X 1\n#endif\n#ifdef X\nleaked\n#endif\n")
        .unwrap();
    assert!(!output.contains("leaked"));
}

#[test]
fn preprocessing_is_idempotent_on_plain_output() {
    let mut preprocessor = Preprocessor::new();
    let first = preprocessor
        .process("#define TINT vec3(1.0, 0.5, 0.25)\nvec3 c = TINT; // tint\n")
        .unwrap();
    let second = preprocessor.process(&first).unwrap();
    assert_eq!(first, second);
}

#[test]
fn nested_include_positions_point_at_origin() {
    let mut preprocessor = Preprocessor::with_includes(
        [
            ("a.glsl".to_string(), "#include \"b.glsl\"\nfloat from_a;\n".to_string()),
            ("b.glsl".to_string(), "float from_b;\n".to_string()),
        ]
        .into_iter()
        .collect(),
        "",
    );
    let output = preprocessor.process("#include \"a.glsl\"\n").unwrap();
    assert!(output.contains("float from_b;"));

    let start = output.find("float from_b;").unwrap();
    for index in start..start + "float from_b;".len() {
        let position = preprocessor.convert_source_index(index).unwrap();
        assert_eq!(position.unit, "b.glsl");
    }
    let position = preprocessor
        .convert_source_index(output.find("from_a").unwrap())
        .unwrap();
    assert_eq!((position.unit.as_str(), position.line), ("a.glsl", 2));
}

#[test]
fn unresolved_include_fails_compile() {
    let mut compiler = ShaderCompiler::new(CompileConfig::default()).unwrap();
    let source = format!("#include \"missing.glsl\"\n{}", MINIMAL);
    match compiler.compile(&source) {
        Err(CompileError::DirectiveError { message, position }) => {
            assert!(message.contains("\"missing.glsl\""));
            assert_eq!(position.unit, "shader");
            assert_eq!(position.line, 1);
        }
        other => panic!("Expected DirectiveError, got {:?}", other),
    }
}

#[test]
fn included_passes_and_predefined_macros() {
    let mut config = CompileConfig::default();
    config
        .define("MAX_LIGHTS", Some("4"))
        .define("USE_SHADOWS", None)
        .add_include("common/lighting.glsl", "vec3 light(int i) { return vec3(i); }\n")
        .add_include(
            "passes/forward.pass",
            "Pass \"forward\" {\n#include \"../common/lighting.glsl\"\nVertexShader { void main() { } }\nFragmentShader { void main() { for (int i = 0; i < MAX_LIGHTS; ++i) light(i); } }\n}\n",
        );
    let mut compiler = ShaderCompiler::new(config).unwrap();

    let source = r#"
SubShader "forward" {
    Tags { RenderType = "Opaque" }
#include "passes/forward.pass"
#if USE_SHADOWS
    Pass "shadow" {
        DepthState { WriteEnabled = true; CompareFunction = CompareFunction.Less }
        RasterState { CullMode = _ShadowCull }
        VertexShader { void main() { } }
        FragmentShader { void main() { } }
    }
#endif
}
"#;
    let shader = compiler.compile(source).unwrap();
    let names: Vec<&str> = shader.passes().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["forward", "shadow"]);
    assert_eq!(
        shader.subshaders[0].tags.get("RenderType"),
        Some(&TagValue::String("Opaque".to_string()))
    );

    let forward = &shader.subshaders[0].passes[0];
    assert!(forward.fragment_source.contains("i < 4;"));
    assert!(forward.vertex_source.starts_with("vec3 light(int i)"));

    let shadow = &shader.subshaders[0].passes[1];
    assert_eq!(
        shadow.render_state(&RenderStateKey::new(RenderStateElement::CullMode)),
        Some(RenderStateValue::Variable("_ShadowCull".to_string()))
    );
    assert_eq!(
        shadow.render_state(&RenderStateKey::new(RenderStateElement::DepthCompareFunction)),
        Some(RenderStateValue::Constant(RenderStateConstant::Enum(
            StateEnum::CompareFunction,
            "Less".to_string()
        )))
    );
}

#[test]
fn parse_error_is_mapped_to_included_unit() {
    let mut compiler = compiler_with(&[(
        "states.inc",
        "// shared state\nBlendState { Enabled = true; Bogus = 1 }\n",
    )]);
    let source = "SubShader {\n  Pass {\n#include \"states.inc\"\n    VertexShader { } FragmentShader { }\n  }\n}\n";
    match compiler.compile(source) {
        Err(CompileError::ParseError { message, position }) => {
            assert!(message.contains("Bogus"));
            assert_eq!(position.unit, "states.inc");
            assert_eq!(position.line, 2);
            assert_eq!(position.column, 30);
        }
        other => panic!("Expected ParseError, got {:?}", other),
    }
}

#[test]
fn missing_fragment_stage_is_assembly_error() {
    let source = "SubShader { Pass \"half\" { VertexShader { void main() { } } } }";
    let err = compile(source, &CompileConfig::default()).unwrap_err();
    assert!(matches!(err, CompileError::AssemblyError { .. }));
    assert!(err.to_string().contains("assembly error"));
}

#[test]
fn duplicate_pass_names_are_kept() {
    let source = "SubShader { Pass \"a\" { VertexShader { } FragmentShader { } } Pass \"a\" { VertexShader { } FragmentShader { } } }";
    let shader = compile(source, &CompileConfig::default()).unwrap();
    assert_eq!(shader.pass_count(), 2);
}

#[test]
fn source_position_of_compiled_result() {
    let shader = compile(MINIMAL, &CompileConfig::default()).unwrap();
    let offset = shader.expanded_source.find("gl_Position").unwrap();
    let position = shader.source_position_of(offset).unwrap();
    assert_eq!(position, SourcePosition::new("shader", 4, 38));
}

#[test]
fn independent_compilers_on_threads() {
    let handles: Vec<_> = (0..4)
        .map(|i| {
            std::thread::spawn(move || {
                let mut config = CompileConfig::default();
                config.define("VARIANT", Some(i.to_string().as_str()));
                let mut compiler = ShaderCompiler::new(config).unwrap();
                let source = "SubShader { Pass { int variant = VARIANT; VertexShader { void main() { } } FragmentShader { void main() { } } } }";
                let shader = compiler.compile(source).unwrap();
                let vs = shader.passes().next().unwrap().vertex_source.clone();
                vs
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let vertex = handle.join().unwrap();
        assert!(vertex.contains(&format!("int variant = {};", i)));
    }
}
