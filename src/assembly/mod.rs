//! Pass assembly: parsed blocks to the compiled shader handed to the render pipeline

mod assemble;
mod compiled_shader;

pub use assemble::{DEFAULT_PASS_NAME, assemble};
pub use compiled_shader::*;
