use crate::assembly::{CompiledShader, assemble};
use crate::config::CompileConfig;
use crate::error::CompileResult;
use crate::parser::ShaderParser;
use crate::preprocessor::Preprocessor;

/// Preprocess, parse and assemble shader sources.
///
/// Each compile resets the preprocessor, so one instance can be reused for any number of
/// independent sources. Instances share nothing; give each thread its own.
pub struct ShaderCompiler {
    config: CompileConfig,
    preprocessor: Preprocessor,
}

impl ShaderCompiler {
    pub fn new(config: CompileConfig) -> CompileResult<Self> {
        let mut preprocessor = Preprocessor::new();
        preprocessor.set_root_unit(&config.root_unit);
        for m in &config.predefined_macros {
            preprocessor.add_predefined_macro(&m.name, m.value.as_deref())?;
        }
        Ok(Self {
            config,
            preprocessor,
        })
    }

    pub fn config(&self) -> &CompileConfig {
        &self.config
    }

    pub fn compile(&mut self, raw_source: &str) -> CompileResult<CompiledShader> {
        self.preprocessor
            .reset(self.config.include_map(), &self.config.base_path);
        let expanded = self.preprocessor.try_process(raw_source)?;
        let source_map = self.preprocessor.take_source_map();

        let parsed = ShaderParser::new(&expanded, &source_map)?.parse()?;
        let shader = assemble(parsed, expanded, source_map)?;

        log::debug!(
            "compiled '{}': {} subshader(s), {} pass(es)",
            self.config.root_unit,
            shader.subshaders.len(),
            shader.pass_count()
        );
        Ok(shader)
    }
}

/// Compile `raw_source` with a fresh compiler built from `config`
pub fn compile(raw_source: &str, config: &CompileConfig) -> CompileResult<CompiledShader> {
    ShaderCompiler::new(config.clone())?.compile(raw_source)
}
