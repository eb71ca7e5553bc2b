//! Macro replacement over a buffered run of tokens.
//!
//! Every token carries the set of macro names it was produced by. A name in its own
//! hide set is never expanded again, which stops self-referencing and mutually
//! recursive macros without a depth limit. Replacement output goes back to the front
//! of the work queue so that it is rescanned together with the tokens following it.

use std::collections::VecDeque;

use crate::error::{CompileError, CompileResult};
use crate::scanner::{Lexeme, LexemeKind};
use crate::source_map::{SourceMap, UnitId};

use super::macros::{MacroDefinition, MacroTable};

/// Where a preprocessed token was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin {
    pub unit: UnitId,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PpToken {
    pub kind: LexemeKind,
    pub text: String,
    pub origin: Origin,
    /// Copied unchanged from the source at `origin`
    pub verbatim: bool,
    pub hide: Vec<String>,
}

impl PpToken {
    pub fn from_lexeme(lexeme: &Lexeme, unit: UnitId) -> Self {
        PpToken {
            kind: lexeme.kind,
            text: lexeme.text.to_string(),
            origin: Origin {
                unit,
                offset: lexeme.start(),
            },
            verbatim: true,
            hide: Vec::new(),
        }
    }

    pub fn synthetic(kind: LexemeKind, text: &str, origin: Origin) -> Self {
        PpToken {
            kind,
            text: text.to_string(),
            origin,
            verbatim: false,
            hide: Vec::new(),
        }
    }

    fn is_hidden(&self) -> bool {
        self.hide.iter().any(|h| h == &self.text)
    }

    pub fn is_punct(&self, c: char) -> bool {
        self.kind == LexemeKind::Punct && self.text.starts_with(c)
    }
}

pub struct Expander<'a> {
    macros: &'a MacroTable,
    map: &'a SourceMap,
}

impl<'a> Expander<'a> {
    pub fn new(macros: &'a MacroTable, map: &'a SourceMap) -> Self {
        Expander { macros, map }
    }

    pub fn expand(&self, input: Vec<PpToken>) -> CompileResult<Vec<PpToken>> {
        let mut pending: VecDeque<PpToken> = input.into();
        let mut output = Vec::with_capacity(pending.len());

        while let Some(token) = pending.pop_front() {
            if token.kind != LexemeKind::Identifier || token.is_hidden() {
                output.push(token);
                continue;
            }
            let definition = match self.macros.get(&token.text) {
                Some(d) => d,
                None => {
                    output.push(token);
                    continue;
                }
            };

            let replacement = match &definition.params {
                None => self.substitute(definition, &token, &[]),
                Some(params) => {
                    if !invocation_follows(&pending) {
                        output.push(token);
                        continue;
                    }
                    let arguments = self.collect_arguments(&mut pending, &token)?;
                    let arguments = self.check_arity(definition, params.len(), arguments, &token)?;
                    let expanded = arguments
                        .into_iter()
                        .map(|argument| self.expand(argument))
                        .collect::<CompileResult<Vec<_>>>()?;
                    self.substitute(definition, &token, &expanded)
                }
            };

            for t in replacement.into_iter().rev() {
                pending.push_front(t);
            }
        }

        Ok(output)
    }

    fn substitute(
        &self,
        definition: &MacroDefinition,
        invocation: &PpToken,
        arguments: &[Vec<PpToken>],
    ) -> Vec<PpToken> {
        let mut hide = invocation.hide.clone();
        hide.push(definition.name.clone());

        let mut result = Vec::with_capacity(definition.body.len());
        for body_token in &definition.body {
            let argument = if body_token.kind == LexemeKind::Identifier {
                definition
                    .param_index(&body_token.text)
                    .and_then(|i| arguments.get(i))
            } else {
                None
            };
            match argument {
                Some(tokens) => {
                    for t in tokens {
                        let mut t = t.clone();
                        t.origin = invocation.origin;
                        t.verbatim = false;
                        for h in &hide {
                            if !t.hide.contains(h) {
                                t.hide.push(h.clone());
                            }
                        }
                        result.push(t);
                    }
                }
                None => result.push(PpToken {
                    kind: body_token.kind,
                    text: body_token.text.clone(),
                    origin: invocation.origin,
                    verbatim: false,
                    hide: hide.clone(),
                }),
            }
        }
        result
    }

    /// Consume `( ... )` from the front of `pending`, splitting on top-level commas
    fn collect_arguments(
        &self,
        pending: &mut VecDeque<PpToken>,
        invocation: &PpToken,
    ) -> CompileResult<Vec<Vec<PpToken>>> {
        while let Some(t) = pending.pop_front() {
            if t.is_punct('(') {
                break;
            }
        }

        let mut arguments = Vec::new();
        let mut current = Vec::new();
        let mut depth = 0usize;
        loop {
            let mut t = match pending.pop_front() {
                Some(t) => t,
                None => {
                    return Err(self.error(
                        invocation,
                        format!(
                            "unterminated argument list invoking macro '{}'",
                            invocation.text
                        ),
                    ));
                }
            };
            if t.is_punct('(') {
                depth += 1;
            } else if t.is_punct(')') {
                if depth == 0 {
                    arguments.push(trim(current));
                    break;
                }
                depth -= 1;
            } else if t.is_punct(',') && depth == 0 {
                arguments.push(trim(std::mem::take(&mut current)));
                continue;
            } else if t.kind == LexemeKind::Newline {
                t.kind = LexemeKind::Whitespace;
                t.text = " ".to_string();
            }
            current.push(t);
        }
        Ok(arguments)
    }

    fn check_arity(
        &self,
        definition: &MacroDefinition,
        expected: usize,
        mut arguments: Vec<Vec<PpToken>>,
        invocation: &PpToken,
    ) -> CompileResult<Vec<Vec<PpToken>>> {
        if expected == 0 && arguments.len() == 1 && arguments[0].is_empty() {
            arguments.clear();
        }
        if arguments.len() != expected {
            return Err(self.error(
                invocation,
                format!(
                    "macro '{}' expects {} argument(s), got {}",
                    definition.name,
                    expected,
                    arguments.len()
                ),
            ));
        }
        Ok(arguments)
    }

    fn error(&self, token: &PpToken, message: String) -> CompileError {
        let position = self
            .map
            .position_in_unit(token.origin.unit, token.origin.offset);
        CompileError::directive(message, position)
    }
}

/// A function-like macro name only invokes when `(` follows on the same line,
/// possibly after spaces or comments
fn invocation_follows(pending: &VecDeque<PpToken>) -> bool {
    for t in pending {
        if t.kind.is_trivia() {
            continue;
        }
        return t.is_punct('(');
    }
    false
}

fn trim(mut tokens: Vec<PpToken>) -> Vec<PpToken> {
    while tokens.last().map_or(false, |t| t.kind.is_trivia()) {
        tokens.pop();
    }
    let leading = tokens.iter().take_while(|t| t.kind.is_trivia()).count();
    tokens.drain(..leading);
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Scanner;

    fn tokens(map: &mut SourceMap, text: &str) -> Vec<PpToken> {
        let unit = map.add_unit("test", text);
        let mut scanner = Scanner::new(text);
        let mut v = Vec::new();
        while let Some(l) = scanner.next_lexeme().unwrap() {
            v.push(PpToken::from_lexeme(&l, unit));
        }
        v
    }

    fn run(table: &MacroTable, text: &str) -> CompileResult<String> {
        let mut map = SourceMap::new();
        let input = tokens(&mut map, text);
        let out = Expander::new(table, &map).expand(input)?;
        Ok(out.into_iter().map(|t| t.text).collect())
    }

    #[test]
    fn test_self_reference_stops() {
        let mut table = MacroTable::new();
        table.define(MacroDefinition::object("X", "X + 1").unwrap());
        assert_eq!(run(&table, "X").unwrap(), "X + 1");
    }

    #[test]
    fn test_mutual_recursion_stops() {
        let mut table = MacroTable::new();
        table.define(MacroDefinition::object("A", "B").unwrap());
        table.define(MacroDefinition::object("B", "A").unwrap());
        assert_eq!(run(&table, "A B").unwrap(), "A B");
    }

    #[test]
    fn test_nested_arguments() {
        let mut table = MacroTable::new();
        table.define(
            MacroDefinition::function("ADD", vec!["a".into(), "b".into()], "(a + b)").unwrap(),
        );
        assert_eq!(
            run(&table, "ADD(f(1, 2), ADD(3, 4))").unwrap(),
            "(f(1, 2) + (3 + 4))"
        );
    }

    #[test]
    fn test_result_is_rescanned_with_following_tokens() {
        let mut table = MacroTable::new();
        table.define(MacroDefinition::object("CALL", "TWICE").unwrap());
        table.define(MacroDefinition::function("TWICE", vec!["x".into()], "x x").unwrap());
        assert_eq!(run(&table, "CALL(y)").unwrap(), "y y");
    }

    #[test]
    fn test_name_without_parens_is_kept() {
        let mut table = MacroTable::new();
        table.define(MacroDefinition::function("F", vec!["x".into()], "x").unwrap());
        assert_eq!(run(&table, "F\n(1)").unwrap(), "F\n(1)");
        assert_eq!(run(&table, "F /* c */ (1)").unwrap(), "1");
    }

    #[test]
    fn test_arity_mismatch() {
        let mut table = MacroTable::new();
        table.define(
            MacroDefinition::function("MAX", vec!["a".into(), "b".into()], "a").unwrap(),
        );
        let err = run(&table, "MAX(1)").unwrap_err();
        assert!(err.message().contains("expects 2 argument(s), got 1"));
        assert_eq!(err.position().unwrap().column, 1);
    }

    #[test]
    fn test_zero_parameter_macro() {
        let mut table = MacroTable::new();
        table.define(MacroDefinition::function("ZERO", vec![], "0.0").unwrap());
        assert_eq!(run(&table, "ZERO()").unwrap(), "0.0");
        assert!(run(&table, "ZERO(1)").is_err());
    }

    #[test]
    fn test_unterminated_arguments() {
        let mut table = MacroTable::new();
        table.define(MacroDefinition::function("F", vec!["x".into()], "x").unwrap());
        let err = run(&table, "F(1, (2)").unwrap_err();
        assert!(err.message().contains("unterminated argument list"));
    }

    #[test]
    fn test_expanded_tokens_map_to_invocation() {
        let mut table = MacroTable::new();
        table.define(MacroDefinition::object("PI", "3.14").unwrap());
        let mut map = SourceMap::new();
        let input = tokens(&mut map, "x = PI;");
        let out = Expander::new(&table, &map).expand(input).unwrap();
        let pi = out.iter().find(|t| t.text == "3.14").unwrap();
        assert!(!pi.verbatim);
        assert_eq!(pi.origin.offset, 4);
        assert!(out[0].verbatim);
    }
}
