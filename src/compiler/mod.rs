mod compiler;

pub use compiler::*;
