//! Static keyword table for the pass DSL and GLSL

use std::collections::HashMap;

/// Structural keywords of the pass DSL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Shader,
    SubShader,
    Pass,
    Tags,
    BlendState,
    DepthState,
    StencilState,
    RasterState,
    RenderQueueType,
    VertexShader,
    FragmentShader,
}

impl Keyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Shader => "Shader",
            Keyword::SubShader => "SubShader",
            Keyword::Pass => "Pass",
            Keyword::Tags => "Tags",
            Keyword::BlendState => "BlendState",
            Keyword::DepthState => "DepthState",
            Keyword::StencilState => "StencilState",
            Keyword::RasterState => "RasterState",
            Keyword::RenderQueueType => "RenderQueueType",
            Keyword::VertexShader => "VertexShader",
            Keyword::FragmentShader => "FragmentShader",
        }
    }

    /// Keywords that may start an item directly inside a `Pass` block
    pub fn is_pass_item(&self) -> bool {
        !matches!(self, Keyword::Shader | Keyword::SubShader | Keyword::Pass)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordCategory {
    Structural(Keyword),
    BoolLiteral(bool),
    GlslType,
    GlslQualifier,
    GlslControl,
}

const STRUCTURAL: &[Keyword] = &[
    Keyword::Shader,
    Keyword::SubShader,
    Keyword::Pass,
    Keyword::Tags,
    Keyword::BlendState,
    Keyword::DepthState,
    Keyword::StencilState,
    Keyword::RasterState,
    Keyword::RenderQueueType,
    Keyword::VertexShader,
    Keyword::FragmentShader,
];

const GLSL_TYPES: &[&str] = &[
    "void", "bool", "int", "uint", "float", "double",
    "vec2", "vec3", "vec4", "bvec2", "bvec3", "bvec4",
    "ivec2", "ivec3", "ivec4", "uvec2", "uvec3", "uvec4",
    "dvec2", "dvec3", "dvec4",
    "mat2", "mat3", "mat4", "mat2x2", "mat2x3", "mat2x4",
    "mat3x2", "mat3x3", "mat3x4", "mat4x2", "mat4x3", "mat4x4",
    "sampler2D", "sampler3D", "samplerCube", "sampler2DShadow", "samplerCubeShadow",
    "sampler2DArray", "sampler2DArrayShadow", "isampler2D", "usampler2D",
    "struct",
];

const GLSL_QUALIFIERS: &[&str] = &[
    "const", "uniform", "attribute", "varying", "in", "out", "inout", "buffer", "shared",
    "layout", "centroid", "flat", "smooth", "noperspective", "invariant", "precise",
    "precision", "highp", "mediump", "lowp",
];

const GLSL_CONTROL: &[&str] = &[
    "if", "else", "for", "while", "do", "switch", "case", "default",
    "break", "continue", "return", "discard",
];

lazy_static::lazy_static! {
    /// Name to category, built once per process and never mutated
    static ref KEYWORDS: HashMap<&'static str, KeywordCategory> = {
        let mut table = HashMap::new();
        for k in STRUCTURAL {
            table.insert(k.as_str(), KeywordCategory::Structural(*k));
        }
        table.insert("true", KeywordCategory::BoolLiteral(true));
        table.insert("false", KeywordCategory::BoolLiteral(false));
        for name in GLSL_TYPES {
            table.insert(*name, KeywordCategory::GlslType);
        }
        for name in GLSL_QUALIFIERS {
            table.insert(*name, KeywordCategory::GlslQualifier);
        }
        for name in GLSL_CONTROL {
            table.insert(*name, KeywordCategory::GlslControl);
        }
        table
    };
}

/// Category of `word`, or `None` for a plain identifier
pub fn classify(word: &str) -> Option<KeywordCategory> {
    KEYWORDS.get(word).copied()
}

/// Structural keyword named by `word`
pub fn structural(word: &str) -> Option<Keyword> {
    match classify(word) {
        Some(KeywordCategory::Structural(k)) => Some(k),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(
            classify("SubShader"),
            Some(KeywordCategory::Structural(Keyword::SubShader))
        );
        assert_eq!(classify("vec3"), Some(KeywordCategory::GlslType));
        assert_eq!(classify("uniform"), Some(KeywordCategory::GlslQualifier));
        assert_eq!(classify("discard"), Some(KeywordCategory::GlslControl));
        assert_eq!(classify("false"), Some(KeywordCategory::BoolLiteral(false)));
        assert_eq!(classify("albedo"), None);
    }

    #[test]
    fn test_case_sensitive() {
        assert_eq!(classify("pass"), None);
        assert_eq!(structural("Pass"), Some(Keyword::Pass));
        assert_eq!(structural("vec4"), None);
    }

    #[test]
    fn test_every_structural_keyword_round_trips() {
        for k in STRUCTURAL {
            assert_eq!(structural(k.as_str()), Some(*k));
        }
    }
}
