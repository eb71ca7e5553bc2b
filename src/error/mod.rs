//! Error types shared by every compilation stage

use crate::source_map::SourcePosition;
use std::fmt;

/// Result type for compiler operations
pub type CompileResult<T> = Result<T, CompileError>;

/// Errors that abort a compilation
///
/// Every variant produced by [`crate::ShaderCompiler::compile`] carries the position of the
/// failure already mapped back to the original source unit.
#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    /// Malformed lexical content (unterminated comment or literal)
    ScanError {
        message: String,
        position: SourcePosition,
    },

    /// Malformed directive, unresolved include, macro arity mismatch, unterminated conditional
    DirectiveError {
        message: String,
        position: SourcePosition,
    },

    /// Unexpected token in the structural grammar
    ParseError {
        message: String,
        position: SourcePosition,
    },

    /// Structurally incomplete pass
    AssemblyError {
        message: String,
        position: SourcePosition,
    },

    /// Unreadable or malformed configuration
    ConfigError { path: String, message: String },
}

impl CompileError {
    pub fn scan(message: impl Into<String>, position: SourcePosition) -> Self {
        CompileError::ScanError {
            message: message.into(),
            position,
        }
    }

    pub fn directive(message: impl Into<String>, position: SourcePosition) -> Self {
        CompileError::DirectiveError {
            message: message.into(),
            position,
        }
    }

    pub fn parse(message: impl Into<String>, position: SourcePosition) -> Self {
        CompileError::ParseError {
            message: message.into(),
            position,
        }
    }

    pub fn assembly(message: impl Into<String>, position: SourcePosition) -> Self {
        CompileError::AssemblyError {
            message: message.into(),
            position,
        }
    }

    pub fn config(path: impl Into<String>, message: impl Into<String>) -> Self {
        CompileError::ConfigError {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            CompileError::ScanError { message, .. }
            | CompileError::DirectiveError { message, .. }
            | CompileError::ParseError { message, .. }
            | CompileError::AssemblyError { message, .. }
            | CompileError::ConfigError { message, .. } => message,
        }
    }

    /// Mapped source position, absent only for configuration errors
    pub fn position(&self) -> Option<&SourcePosition> {
        match self {
            CompileError::ScanError { position, .. }
            | CompileError::DirectiveError { position, .. }
            | CompileError::ParseError { position, .. }
            | CompileError::AssemblyError { position, .. } => Some(position),
            CompileError::ConfigError { .. } => None,
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::ScanError { message, position } => {
                write!(f, "{}: scan error: {}", position, message)
            }
            CompileError::DirectiveError { message, position } => {
                write!(f, "{}: directive error: {}", position, message)
            }
            CompileError::ParseError { message, position } => {
                write!(f, "{}: parse error: {}", position, message)
            }
            CompileError::AssemblyError { message, position } => {
                write!(f, "{}: assembly error: {}", position, message)
            }
            CompileError::ConfigError { path, message } => {
                write!(f, "config error in '{}': {}", path, message)
            }
        }
    }
}

impl std::error::Error for CompileError {}

impl From<std::io::Error> for CompileError {
    fn from(value: std::io::Error) -> Self {
        CompileError::config("", value.to_string())
    }
}

impl From<serde_json::Error> for CompileError {
    fn from(value: serde_json::Error) -> Self {
        CompileError::config("", value.to_string())
    }
}
