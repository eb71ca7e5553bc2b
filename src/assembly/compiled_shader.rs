use std::collections::HashMap;

use crate::parser::{RenderStateConstant, RenderStateKey, RenderStateValue, TagMap};
use crate::source_map::{SourceMap, SourcePosition, SourceSpan};

/// One renderable pass: assembled stage sources plus its render-state configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PassDescriptor {
    pub name: String,
    pub vertex_source: String,
    pub fragment_source: String,
    /// Span of the stage body (or entry point name) in the expanded source
    pub vertex_span: SourceSpan,
    pub fragment_span: SourceSpan,
    pub tags: TagMap,
    pub constant_states: HashMap<RenderStateKey, RenderStateConstant>,
    /// Property names resolved against runtime shader data at draw time
    pub variable_states: HashMap<RenderStateKey, String>,
}

impl PassDescriptor {
    pub fn render_state(&self, key: &RenderStateKey) -> Option<RenderStateValue> {
        if let Some(c) = self.constant_states.get(key) {
            return Some(RenderStateValue::Constant(c.clone()));
        }
        self.variable_states
            .get(key)
            .map(|v| RenderStateValue::Variable(v.clone()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubShader {
    pub name: Option<String>,
    pub tags: TagMap,
    pub passes: Vec<PassDescriptor>,
}

/// Result of a successful compile. Owned by the caller; the compiler keeps no reference.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledShader {
    pub name: Option<String>,
    pub subshaders: Vec<SubShader>,
    pub expanded_source: String,
    pub source_map: SourceMap,
}

impl CompiledShader {
    /// Map an offset of `expanded_source` back to the unit, line and column it came from
    pub fn source_position_of(&self, output_offset: usize) -> Option<SourcePosition> {
        self.source_map.source_position_of(output_offset)
    }

    /// Every pass, in SubShader order
    pub fn passes(&self) -> impl Iterator<Item = &PassDescriptor> {
        self.subshaders.iter().flat_map(|s| s.passes.iter())
    }

    pub fn pass_count(&self) -> usize {
        self.subshaders.iter().map(|s| s.passes.len()).sum()
    }
}
