//! Recursive-descent parser for the Shader / SubShader / Pass block structure.
//!
//! The pass DSL is parsed fully. GLSL between the DSL items is not: stage bodies and
//! shared declarations are recorded as spans of the preprocessed text.

use std::collections::{HashMap, HashSet};

use super::render_state::{
    RenderStateConstant, RenderStateElement, RenderStateKey, RenderStateValue, RenderStates,
    StateBlock, StateEnum,
};
use super::token::{Token, TokenKind, tokenize};
use crate::error::{CompileError, CompileResult};
use crate::keywords::{Keyword, KeywordCategory, structural};
use crate::source_map::{SourceMap, SourcePosition, SourceSpan};

#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    String(String),
    Number(f64),
    Bool(bool),
}

pub type TagMap = HashMap<String, TagValue>;

/// Where a stage's GLSL comes from
#[derive(Debug, Clone, PartialEq)]
pub enum StageSource {
    /// `VertexShader { ... }`, the span of the text between the braces
    Inline(SourceSpan),
    /// `VertexShader = name;`, a function defined in the pass's shared GLSL
    EntryPoint { name: String, span: SourceSpan },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedPass {
    pub name: Option<String>,
    pub tags: TagMap,
    pub render_states: RenderStates,
    /// Pass-level GLSL chunks in source order
    pub shared_glsl: Vec<SourceSpan>,
    /// Functions declared at file scope in `shared_glsl`
    pub glsl_functions: HashSet<String>,
    pub vertex: Option<StageSource>,
    pub fragment: Option<StageSource>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedSubShader {
    pub name: Option<String>,
    pub tags: TagMap,
    pub passes: Vec<ParsedPass>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedShader {
    pub name: Option<String>,
    pub subshaders: Vec<ParsedSubShader>,
}

pub struct ShaderParser<'a> {
    source: &'a str,
    map: &'a SourceMap,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> ShaderParser<'a> {
    /// Tokenize preprocessed `source`; `map` translates its offsets for diagnostics
    pub fn new(source: &'a str, map: &'a SourceMap) -> CompileResult<Self> {
        let tokens = tokenize(source, map)?;
        Ok(ShaderParser {
            source,
            map,
            tokens,
            pos: 0,
        })
    }

    pub fn parse(mut self) -> CompileResult<ParsedShader> {
        let mut shader = ParsedShader::default();
        self.skip_directives();

        if self.peek_keyword() == Some(Keyword::Shader) {
            self.advance();
            let name = match self.peek() {
                Some(t) if t.kind == TokenKind::String => unquote(&t.text),
                _ => return Err(self.error_here("expected shader name after 'Shader'")),
            };
            self.advance();
            shader.name = Some(name);
            self.expect_punct('{', "after shader name")?;
            shader.subshaders = self.parse_subshaders(true)?;
            self.expect_punct('}', "to close Shader block")?;
            self.skip_directives();
            if self.peek().is_some() {
                return Err(self.error_here("unexpected token after Shader block"));
            }
        } else {
            shader.subshaders = self.parse_subshaders(false)?;
        }

        if shader.subshaders.is_empty() {
            return Err(self.error_here("shader contains no SubShader"));
        }
        Ok(shader)
    }

    fn parse_subshaders(&mut self, enclosed: bool) -> CompileResult<Vec<ParsedSubShader>> {
        let mut subshaders = Vec::new();
        loop {
            self.skip_directives();
            match self.peek() {
                None if enclosed => return Err(self.error_here("unterminated Shader block")),
                None => break,
                Some(t) if enclosed && t.is_punct('}') => break,
                Some(t) if structural(&t.text) == Some(Keyword::SubShader) => {
                    subshaders.push(self.parse_subshader()?);
                }
                Some(t) => {
                    let message = format!("unexpected '{}', expected SubShader", t.text);
                    return Err(self.error_here(&message));
                }
            }
        }
        Ok(subshaders)
    }

    fn parse_subshader(&mut self) -> CompileResult<ParsedSubShader> {
        let start = self.advance_span();
        let mut subshader = ParsedSubShader {
            name: self.optional_name(),
            ..Default::default()
        };
        self.expect_punct('{', "to open SubShader block")?;

        loop {
            self.skip_directives();
            match self.peek_keyword() {
                Some(Keyword::Tags) => self.parse_tags(&mut subshader.tags)?,
                Some(Keyword::Pass) => subshader.passes.push(self.parse_pass()?),
                _ => match self.peek() {
                    Some(t) if t.is_punct('}') => break,
                    Some(t) => {
                        let message = format!("unexpected '{}' in SubShader block", t.text);
                        return Err(self.error_here(&message));
                    }
                    None => return Err(self.error_here("unterminated SubShader block")),
                },
            }
        }
        let end = self.advance_span();
        subshader.span = SourceSpan::new(start.start, end.end);

        if subshader.passes.is_empty() {
            return Err(CompileError::parse(
                "SubShader has no Pass",
                self.map.position_or_default(start.start),
            ));
        }
        Ok(subshader)
    }

    fn parse_pass(&mut self) -> CompileResult<ParsedPass> {
        let start = self.advance_span();
        let mut pass = ParsedPass {
            name: self.optional_name(),
            ..Default::default()
        };
        self.expect_punct('{', "to open Pass block")?;

        loop {
            let (kind, text) = match self.peek() {
                Some(t) if t.is_punct('}') => break,
                Some(t) => (t.kind, t.text.clone()),
                None => return Err(self.error_here("unterminated Pass block")),
            };
            match kind {
                TokenKind::Keyword(KeywordCategory::Structural(keyword)) => match keyword {
                    Keyword::Tags => self.parse_tags(&mut pass.tags)?,
                    Keyword::BlendState
                    | Keyword::DepthState
                    | Keyword::StencilState
                    | Keyword::RasterState => {
                        let block = StateBlock::from_keyword(keyword)
                            .ok_or_else(|| self.error_here("expected render state block"))?;
                        self.parse_state_block(block, &mut pass.render_states)?;
                    }
                    Keyword::RenderQueueType => {
                        self.advance();
                        self.expect_punct('=', "after 'RenderQueueType'")?;
                        let value = self.parse_state_value()?;
                        let key = RenderStateKey::new(RenderStateElement::RenderQueueType);
                        pass.render_states.assign(key, value);
                        self.eat_punct(';');
                    }
                    Keyword::VertexShader => {
                        if pass.vertex.is_some() {
                            log::warn!(
                                "{}: VertexShader given twice, keeping the last",
                                self.position_here()
                            );
                        }
                        pass.vertex = Some(self.parse_stage("VertexShader")?);
                    }
                    Keyword::FragmentShader => {
                        if pass.fragment.is_some() {
                            log::warn!(
                                "{}: FragmentShader given twice, keeping the last",
                                self.position_here()
                            );
                        }
                        pass.fragment = Some(self.parse_stage("FragmentShader")?);
                    }
                    Keyword::Shader | Keyword::SubShader | Keyword::Pass => {
                        let message = format!("unexpected '{}' inside Pass block", text);
                        return Err(self.error_here(&message));
                    }
                },
                _ => self.parse_glsl_chunk(&mut pass),
            }
        }
        let end = self.advance_span();
        pass.span = SourceSpan::new(start.start, end.end);

        log::debug!(
            "parsed pass '{}' with {} render state(s)",
            pass.name.as_deref().unwrap_or("Default"),
            pass.render_states.len()
        );
        Ok(pass)
    }

    /// Opaque GLSL at pass level, up to the next DSL item or the closing brace of the pass
    fn parse_glsl_chunk(&mut self, pass: &mut ParsedPass) {
        let mut depth = 0usize;
        let mut span: Option<SourceSpan> = None;
        let mut previous: Option<TokenKind> = None;
        while let Some(token) = self.peek() {
            if depth == 0 {
                if token.is_punct('}') {
                    break;
                }
                if let TokenKind::Keyword(KeywordCategory::Structural(k)) = token.kind {
                    if k.is_pass_item() && span.is_some() {
                        break;
                    }
                }
            }
            if token.is_punct('{') {
                depth += 1;
            } else if token.is_punct('}') {
                depth -= 1;
            } else if depth == 0
                && token.kind == TokenKind::Identifier
                && returns_type(previous)
                && self.peek_nth_is_punct(1, '(')
            {
                // `type name(` at file scope declares a function
                pass.glsl_functions.insert(token.text.clone());
            }
            previous = Some(token.kind);
            let s = token.span;
            span = Some(match span {
                Some(prev) => SourceSpan::new(prev.start, s.end),
                None => s,
            });
            self.advance();
        }
        if let Some(span) = span {
            pass.shared_glsl.push(span);
        }
    }

    fn parse_stage(&mut self, stage: &str) -> CompileResult<StageSource> {
        self.advance();
        if self.eat_punct('{') {
            let open = self.tokens[self.pos - 1].span;
            let mut depth = 0usize;
            loop {
                let token = match self.peek() {
                    Some(t) => t,
                    None => {
                        let message = format!("unterminated {} block", stage);
                        return Err(self.error_here(&message));
                    }
                };
                if token.is_punct('{') {
                    depth += 1;
                } else if token.is_punct('}') {
                    if depth == 0 {
                        let close = token.span;
                        self.advance();
                        return Ok(StageSource::Inline(SourceSpan::new(open.end, close.start)));
                    }
                    depth -= 1;
                }
                self.advance();
            }
        }

        if self.eat_punct('=') {
            let (name, span) = match self.peek() {
                Some(t) if t.kind == TokenKind::Identifier => (t.text.clone(), t.span),
                _ => {
                    let message = format!("expected entry point name after '{} ='", stage);
                    return Err(self.error_here(&message));
                }
            };
            self.advance();
            self.eat_punct(';');
            return Ok(StageSource::EntryPoint { name, span });
        }

        let message = format!("expected '{{' or '=' after '{}'", stage);
        Err(self.error_here(&message))
    }

    fn parse_tags(&mut self, tags: &mut TagMap) -> CompileResult<()> {
        self.advance();
        self.expect_punct('{', "after 'Tags'")?;
        loop {
            let key = match self.peek() {
                Some(t) if t.is_punct('}') => break,
                Some(t) if matches!(t.kind, TokenKind::Identifier | TokenKind::Keyword(_)) => {
                    t.text.clone()
                }
                Some(_) => return Err(self.error_here("expected tag name")),
                None => return Err(self.error_here("unterminated Tags block")),
            };
            self.advance();
            self.expect_punct('=', "after tag name")?;

            let negative = self.eat_punct('-');
            let value = match self.peek() {
                Some(t) if t.kind == TokenKind::String && !negative => {
                    Some(TagValue::String(unquote(&t.text)))
                }
                Some(t) if t.kind == TokenKind::Number => parse_number(&t.text)
                    .map(|n| TagValue::Number(if negative { -n } else { n })),
                Some(t) if !negative => match t.kind {
                    TokenKind::Keyword(KeywordCategory::BoolLiteral(b)) => Some(TagValue::Bool(b)),
                    _ => None,
                },
                _ => None,
            };
            let value = match value {
                Some(v) => v,
                None => {
                    let message = format!("invalid value for tag '{}'", key);
                    return Err(self.error_here(&message));
                }
            };
            self.advance();
            tags.insert(key, value);
            if !self.eat_punct(',') {
                self.eat_punct(';');
            }
        }
        self.advance();
        Ok(())
    }

    fn parse_state_block(
        &mut self,
        block: StateBlock,
        states: &mut RenderStates,
    ) -> CompileResult<()> {
        let block_name = block.keyword().as_str();
        self.advance();
        self.expect_punct('{', &format!("after '{}'", block_name))?;

        loop {
            let token = match self.peek() {
                Some(t) if t.is_punct('}') => break,
                Some(t) => t,
                None => {
                    let message = format!("unterminated {} block", block_name);
                    return Err(self.error_here(&message));
                }
            };
            let name = token.text.clone();
            let element = match RenderStateElement::lookup(block, &name) {
                Some(e) if matches!(token.kind, TokenKind::Identifier | TokenKind::Keyword(_)) => e,
                _ => {
                    let message = format!("unknown {} property '{}'", block_name, name);
                    return Err(self.error_here(&message));
                }
            };
            self.advance();

            let mut key = RenderStateKey::new(element);
            if self.eat_punct('[') {
                let target = match self.peek() {
                    Some(t) if t.kind == TokenKind::Number => t.text.parse::<u32>().ok(),
                    _ => None,
                };
                let target = match target {
                    Some(t) => t,
                    None => return Err(self.error_here("expected render target index")),
                };
                if !element.is_per_target() {
                    let message = format!("'{}' does not take a render target index", name);
                    return Err(self.error_here(&message));
                }
                self.advance();
                self.expect_punct(']', "after render target index")?;
                key.target = target;
            }

            self.expect_punct('=', "after render state name")?;
            let value = self.parse_state_value()?;
            states.assign(key, value);
            if !self.eat_punct(';') {
                self.eat_punct(',');
            }
        }
        self.advance();
        Ok(())
    }

    fn parse_state_value(&mut self) -> CompileResult<RenderStateValue> {
        let token = match self.peek() {
            Some(t) => t.clone(),
            None => return Err(self.error_here("expected render state value")),
        };

        let constant = match token.kind {
            TokenKind::Keyword(KeywordCategory::BoolLiteral(b)) => RenderStateConstant::Bool(b),
            TokenKind::Punct('-') => {
                self.advance();
                match self.peek().and_then(|t| parse_number(&t.text)) {
                    Some(n) => RenderStateConstant::Number(-n),
                    None => return Err(self.error_here("expected number after '-'")),
                }
            }
            TokenKind::Number => match parse_number(&token.text) {
                Some(n) => RenderStateConstant::Number(n),
                None => {
                    let message = format!("invalid number '{}'", token.text);
                    return Err(self.error_here(&message));
                }
            },
            TokenKind::String => RenderStateConstant::String(unquote(&token.text)),
            TokenKind::Identifier if token.text == "Color" && self.peek_nth_is_punct(1, '(') => {
                return self.parse_color();
            }
            TokenKind::Identifier | TokenKind::Keyword(_) if self.peek_nth_is_punct(1, '.') => {
                return self.parse_enum_literal();
            }
            TokenKind::Identifier => {
                self.advance();
                return Ok(RenderStateValue::Variable(token.text));
            }
            _ => {
                let message = format!("expected render state value, found '{}'", token.text);
                return Err(self.error_here(&message));
            }
        };
        self.advance();
        Ok(RenderStateValue::Constant(constant))
    }

    fn parse_enum_literal(&mut self) -> CompileResult<RenderStateValue> {
        let type_name = self.peek().map(|t| t.text.clone()).unwrap_or_default();
        let ty = match StateEnum::from_name(&type_name) {
            Some(ty) => ty,
            None => {
                let message = format!("unknown enum type '{}'", type_name);
                return Err(self.error_here(&message));
            }
        };
        self.advance();
        self.advance();
        let member = match self.peek() {
            Some(t) if t.kind == TokenKind::Identifier && ty.has_member(&t.text) => t.text.clone(),
            Some(t) => {
                let message = format!("'{}' is not a member of {}", t.text, ty.name());
                return Err(self.error_here(&message));
            }
            None => return Err(self.error_here("expected enum member")),
        };
        self.advance();
        Ok(RenderStateValue::Constant(RenderStateConstant::Enum(ty, member)))
    }

    fn parse_color(&mut self) -> CompileResult<RenderStateValue> {
        self.advance();
        self.advance();
        let mut components = Vec::with_capacity(4);
        loop {
            let negative = self.eat_punct('-');
            let n = match self.peek().and_then(|t| parse_number(&t.text)) {
                Some(n) => n,
                None => return Err(self.error_here("expected number in Color(...)")),
            };
            self.advance();
            let n = if negative { -n } else { n };
            components.push(n as f32);
            if self.eat_punct(')') {
                break;
            }
            self.expect_punct(',', "between Color components")?;
        }
        let color = match components.as_slice() {
            [r, g, b] => [*r, *g, *b, 1.0],
            [r, g, b, a] => [*r, *g, *b, *a],
            _ => {
                let message = format!("Color takes 3 or 4 components, got {}", components.len());
                return Err(self.error_here(&message));
            }
        };
        Ok(RenderStateValue::Constant(RenderStateConstant::Color(color)))
    }

    //----------------------------------------

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_keyword(&self) -> Option<Keyword> {
        self.peek().and_then(|t| structural(&t.text))
    }

    fn peek_nth_is_punct(&self, n: usize, c: char) -> bool {
        self.tokens
            .get(self.pos + n)
            .map_or(false, |t| t.is_punct(c))
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    /// Consume the current token, returning its span
    fn advance_span(&mut self) -> SourceSpan {
        let span = self.peek().map(|t| t.span).unwrap_or_default();
        self.advance();
        span
    }

    fn eat_punct(&mut self, c: char) -> bool {
        if self.peek().map_or(false, |t| t.is_punct(c)) {
            self.advance();
            return true;
        }
        false
    }

    fn expect_punct(&mut self, c: char, context: &str) -> CompileResult<()> {
        if self.eat_punct(c) {
            return Ok(());
        }
        let found = match self.peek() {
            Some(t) => format!("'{}'", t.text),
            None => "end of input".to_string(),
        };
        let message = format!("expected '{}' {}, found {}", c, context, found);
        Err(self.error_here(&message))
    }

    fn optional_name(&mut self) -> Option<String> {
        match self.peek() {
            Some(t) if t.kind == TokenKind::String => {
                let name = unquote(&t.text);
                self.advance();
                Some(name)
            }
            _ => None,
        }
    }

    /// Directive lines outside any pass have nowhere to go
    fn skip_directives(&mut self) {
        while let Some(t) = self.peek() {
            if t.kind != TokenKind::Directive {
                break;
            }
            log::warn!("{}: ignoring '{}' outside of a Pass", self.position_here(), t.text);
            self.advance();
        }
    }

    fn position_here(&self) -> SourcePosition {
        let offset = match self.peek() {
            Some(t) => t.span.start,
            None => self.source.len(),
        };
        self.map.position_or_default(offset)
    }

    fn error_here(&self, message: &str) -> CompileError {
        CompileError::parse(message, self.position_here())
    }
}

fn returns_type(kind: Option<TokenKind>) -> bool {
    matches!(
        kind,
        Some(TokenKind::Keyword(KeywordCategory::GlslType)) | Some(TokenKind::Identifier)
    )
}

fn unquote(text: &str) -> String {
    if text.len() >= 2 {
        text[1..text.len() - 1].to_string()
    } else {
        text.to_string()
    }
}

/// Number literal as written in the DSL: decimal, float with optional `f` suffix, or hex
fn parse_number(text: &str) -> Option<f64> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        let hex = hex.trim_end_matches(|c| c == 'u' || c == 'U');
        return i64::from_str_radix(hex, 16).ok().map(|n| n as f64);
    }
    text.trim_end_matches(|c| matches!(c, 'f' | 'F' | 'u' | 'U'))
        .parse::<f64>()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> CompileResult<ParsedShader> {
        let map = SourceMap::new();
        ShaderParser::new(source, &map)?.parse()
    }

    fn slice(source: &str, span: SourceSpan) -> &str {
        &source[span.start..span.end]
    }

    #[test]
    fn test_001() {
        let source = r#"
SubShader {
    Pass "p0" {
        BlendState { Enabled = true }
        VertexShader { void main() { gl_Position = vec4(0.0); } }
        FragmentShader { void main() { } }
    }
}
"#;
        let shader = parse(source).unwrap();
        assert_eq!(shader.subshaders.len(), 1);
        let pass = &shader.subshaders[0].passes[0];
        assert_eq!(pass.name.as_deref(), Some("p0"));
        assert_eq!(
            pass.render_states
                .constants
                .get(&RenderStateKey::new(RenderStateElement::BlendEnabled)),
            Some(&RenderStateConstant::Bool(true))
        );
        match &pass.vertex {
            Some(StageSource::Inline(span)) => {
                assert_eq!(slice(source, *span).trim(), "void main() { gl_Position = vec4(0.0); }");
            }
            other => panic!("unexpected vertex stage {:?}", other),
        }
        assert!(matches!(pass.fragment, Some(StageSource::Inline(_))));
    }

    #[test]
    fn test_shader_wrapper_and_tags() {
        let source = r#"
Shader "Unlit/Color" {
    SubShader "main" {
        Tags { Queue = "Geometry", LOD = 200, Shadows = false }
        Pass { VertexShader { } FragmentShader { } }
        Pass "second" { VertexShader { } FragmentShader { } }
    }
}
"#;
        let shader = parse(source).unwrap();
        assert_eq!(shader.name.as_deref(), Some("Unlit/Color"));
        let sub = &shader.subshaders[0];
        assert_eq!(sub.name.as_deref(), Some("main"));
        assert_eq!(sub.tags.get("Queue"), Some(&TagValue::String("Geometry".into())));
        assert_eq!(sub.tags.get("LOD"), Some(&TagValue::Number(200.0)));
        assert_eq!(sub.tags.get("Shadows"), Some(&TagValue::Bool(false)));
        assert_eq!(sub.passes.len(), 2);
        assert_eq!(sub.passes[0].name, None);
    }

    #[test]
    fn test_state_values() {
        let source = r#"
SubShader { Pass {
    BlendState {
        SourceColorBlendFactor = BlendFactor.SourceAlpha;
        DestinationColorBlendFactor[1] = BlendFactor.OneMinusSourceAlpha;
        BlendColor = Color(1, 0.5, 0);
        Enabled = _BlendOn;
    }
    DepthState { CompareFunction = CompareFunction.LessEqual, WriteEnabled = false }
    StencilState { ReferenceValue = 3; ZFailOperationFront = StencilOperation.IncrementWrap; }
    RasterState { CullMode = CullMode.Back; DepthBias = -1.5 }
    RenderQueueType = RenderQueueType.Transparent;
    VertexShader { } FragmentShader { }
} }
"#;
        let shader = parse(source).unwrap();
        let states = &shader.subshaders[0].passes[0].render_states;
        let get = |e, target| states.get(&RenderStateKey::with_target(e, target));

        assert_eq!(
            get(RenderStateElement::SourceColorBlendFactor, 0),
            Some(RenderStateValue::Constant(RenderStateConstant::Enum(
                StateEnum::BlendFactor,
                "SourceAlpha".into()
            )))
        );
        assert!(get(RenderStateElement::DestinationColorBlendFactor, 1).is_some());
        assert!(get(RenderStateElement::DestinationColorBlendFactor, 0).is_none());
        assert_eq!(
            get(RenderStateElement::BlendColor, 0),
            Some(RenderStateValue::Constant(RenderStateConstant::Color([1.0, 0.5, 0.0, 1.0])))
        );
        assert_eq!(
            get(RenderStateElement::BlendEnabled, 0),
            Some(RenderStateValue::Variable("_BlendOn".into()))
        );
        assert_eq!(
            get(RenderStateElement::DepthBias, 0),
            Some(RenderStateValue::Constant(RenderStateConstant::Number(-1.5)))
        );
        assert_eq!(
            get(RenderStateElement::RenderQueueType, 0),
            Some(RenderStateValue::Constant(RenderStateConstant::Enum(
                StateEnum::RenderQueueType,
                "Transparent".into()
            )))
        );
        assert_eq!(states.len(), 11);
    }

    #[test]
    fn test_unknown_state_property() {
        let err = parse("SubShader { Pass { DepthState { Blend = true } } }").unwrap_err();
        match err {
            CompileError::ParseError { message, .. } => {
                assert!(message.contains("unknown DepthState property 'Blend'"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_bad_enum_literal() {
        let err = parse("SubShader { Pass { RasterState { CullMode = CullMode.Sideways } } }")
            .unwrap_err();
        assert!(err.message().contains("not a member of CullMode"));
        let err = parse("SubShader { Pass { RasterState { CullMode = Culling.Back } } }")
            .unwrap_err();
        assert!(err.message().contains("unknown enum type 'Culling'"));
    }

    #[test]
    fn test_target_index_only_on_blend_keys() {
        let err = parse("SubShader { Pass { DepthState { Enabled[1] = true } } }").unwrap_err();
        assert!(err.message().contains("does not take a render target index"));
    }

    #[test]
    fn test_shared_glsl_and_entry_points() {
        let source = r#"
SubShader { Pass {
    uniform vec4 _Color;
    vec4 frag() { return _Color; }
    VertexShader = vert;
    void vert() { }
    FragmentShader = frag;
} }
"#;
        let shader = parse(source).unwrap();
        let pass = &shader.subshaders[0].passes[0];
        assert_eq!(pass.shared_glsl.len(), 2);
        assert!(slice(source, pass.shared_glsl[0]).starts_with("uniform vec4 _Color;"));
        assert!(slice(source, pass.shared_glsl[0]).ends_with("return _Color; }"));
        assert_eq!(slice(source, pass.shared_glsl[1]), "void vert() { }");
        assert!(pass.glsl_functions.contains("frag"));
        assert!(pass.glsl_functions.contains("vert"));
        assert!(!pass.glsl_functions.contains("_Color"));
        assert!(matches!(
            &pass.vertex,
            Some(StageSource::EntryPoint { name, .. }) if name == "vert"
        ));
    }

    #[test]
    fn test_subshader_requires_pass() {
        let err = parse("SubShader { Tags { A = 1 } }").unwrap_err();
        assert!(matches!(err, CompileError::ParseError { .. }));
        assert!(err.message().contains("no Pass"));
    }

    #[test]
    fn test_empty_and_unterminated() {
        assert!(parse("").unwrap_err().message().contains("no SubShader"));
        assert!(parse("SubShader { Pass { VertexShader { ").is_err());
        assert!(parse("Pass { }").unwrap_err().message().contains("expected SubShader"));
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("1.5f"), Some(1.5));
        assert_eq!(parse_number("0xff"), Some(255.0));
        assert_eq!(parse_number("2u"), Some(2.0));
        assert_eq!(parse_number("abc"), None);
    }
}
