//! Preprocessor
//!
//! A C-like preprocessor for GLSL-flavored shader sources that handles:
//! - `#define` / `#undef` for object-like and function-like macros
//! - `#if`, `#ifdef`, `#ifndef`, `#elif`, `#else`, `#endif` for conditional compilation
//! - `#include` from an in-memory include map with circular dependency detection
//! - `#error` and `#pragma once`
//!
//! `#version`, `#extension`, `#line` and other pragmas are passed through. Every byte of
//! output is recorded in a [`SourceMap`](crate::source_map::SourceMap) so that later
//! stages can report positions in the original units.

mod conditional;
mod expand;
mod expression;
mod macros;
mod parser;
mod processor;

pub use conditional::ConditionalFrame;
pub use expand::{Origin, PpToken};
pub use expression::evaluate;
pub use macros::{MacroDefinition, MacroTable, ReplacementToken};
pub use parser::Directive;
pub use processor::{
    DEFAULT_ROOT_UNIT, IncludeMap, Preprocessor, join_path, normalize_path, parent_dir,
};
