//! Position-tracking lexeme scanner shared by the preprocessor and the structural parser

mod lexeme;
mod scanner;

pub use lexeme::LexemeKind;
pub use scanner::*;
