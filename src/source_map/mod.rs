//! Source units and the output-to-input position mapping

mod source_map;

pub use source_map::*;
