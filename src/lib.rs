//! Shader pass compiler
//!
//! Turns shader source written in a small pass DSL with embedded GLSL into a
//! [`CompiledShader`]: ordered SubShaders, each an ordered list of passes with complete
//! vertex and fragment GLSL and their render-state configuration.
//!
//! ```text
//! raw text -> Preprocessor -> expanded text + SourceMap -> ShaderParser -> assemble
//! ```

pub mod assembly;
pub mod compiler;
pub mod config;
pub mod error;
pub mod keywords;
pub mod parser;
pub mod preprocessor;
pub mod scanner;
pub mod source_map;

pub use assembly::{CompiledShader, PassDescriptor, SubShader};
pub use compiler::{ShaderCompiler, compile};
pub use config::{CompileConfig, PredefinedMacro};
pub use error::{CompileError, CompileResult};
pub use parser::{
    RenderStateConstant, RenderStateElement, RenderStateKey, RenderStateValue, StateEnum,
    TagValue,
};
pub use source_map::{SourceMap, SourcePosition, SourceSpan};
