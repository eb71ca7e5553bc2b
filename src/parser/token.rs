use crate::error::{CompileError, CompileResult};
use crate::keywords::{KeywordCategory, classify};
use crate::scanner::{LexemeKind, Scanner};
use crate::source_map::{SourceMap, SourceSpan};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    Keyword(KeywordCategory),
    Identifier,
    Number,
    String,
    Punct(char),
    /// A directive line left in the output by the preprocessor (`#version`, `#extension`, ...)
    Directive,
}

/// Classified token of the preprocessed output; spans index into that output
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: SourceSpan,
}

impl Token {
    pub fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punct(c)
    }
}

/// Re-scan preprocessed text into significant tokens, dropping whitespace and comments
pub fn tokenize(source: &str, map: &SourceMap) -> CompileResult<Vec<Token>> {
    let mut scanner = Scanner::new(source);
    let mut tokens = Vec::new();
    let mut at_line_start = true;

    loop {
        let lexeme = match scanner.next_lexeme() {
            Ok(Some(l)) => l,
            Ok(None) => break,
            Err(f) => {
                return Err(CompileError::scan(
                    f.message,
                    map.position_or_default(f.location.offset),
                ));
            }
        };

        let kind = match lexeme.kind {
            LexemeKind::Newline => {
                at_line_start = true;
                continue;
            }
            k if k.is_trivia() => continue,
            LexemeKind::Punct if at_line_start && lexeme.text == "#" => {
                let start = lexeme.start();
                let end = start + source[start..].find('\n').unwrap_or(source.len() - start);
                let text = source[start..end].trim_end();
                while scanner.location().offset < start + text.len() {
                    match scanner.next_lexeme() {
                        Ok(Some(_)) => {}
                        _ => break,
                    }
                }
                tokens.push(Token {
                    kind: TokenKind::Directive,
                    text: text.to_string(),
                    span: SourceSpan::new(start, start + text.len()),
                });
                continue;
            }
            LexemeKind::Identifier => match classify(lexeme.text) {
                Some(category) => TokenKind::Keyword(category),
                None => TokenKind::Identifier,
            },
            LexemeKind::Number => TokenKind::Number,
            LexemeKind::StringLiteral | LexemeKind::CharLiteral => TokenKind::String,
            _ => TokenKind::Punct(lexeme.text.chars().next().unwrap_or(' ')),
        };
        at_line_start = false;
        tokens.push(Token {
            kind,
            text: lexeme.text.to_string(),
            span: SourceSpan::new(lexeme.start(), lexeme.end()),
        });
    }
    Ok(tokens)
}
