//! Structural parser for the pass DSL

mod parser;
mod render_state;
mod token;

pub use parser::*;
pub use render_state::*;
pub use token::*;
