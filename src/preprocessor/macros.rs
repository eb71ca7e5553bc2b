use std::collections::HashMap;

use crate::scanner::{LexemeKind, ScanFailure, Scanner};

/// One token of a macro replacement list
#[derive(Debug, Clone, PartialEq)]
pub struct ReplacementToken {
    pub kind: LexemeKind,
    pub text: String,
}

/// A `#define`d macro.
///
/// `params` is `None` for object-like macros. `Some(vec![])` is a function-like
/// macro taking no arguments, which only expands when followed by `()`.
#[derive(Debug, Clone, PartialEq)]
pub struct MacroDefinition {
    pub name: String,
    pub params: Option<Vec<String>>,
    pub body: Vec<ReplacementToken>,
}

impl MacroDefinition {
    pub fn object(name: &str, body: &str) -> Result<Self, ScanFailure> {
        Ok(MacroDefinition {
            name: name.to_string(),
            params: None,
            body: replacement_list(body)?,
        })
    }

    pub fn function(name: &str, params: Vec<String>, body: &str) -> Result<Self, ScanFailure> {
        Ok(MacroDefinition {
            name: name.to_string(),
            params: Some(params),
            body: replacement_list(body)?,
        })
    }

    pub fn is_function_like(&self) -> bool {
        self.params.is_some()
    }

    pub fn param_index(&self, name: &str) -> Option<usize> {
        self.params
            .as_ref()
            .and_then(|params| params.iter().position(|p| p == name))
    }

    /// Replacement list as written, with interior whitespace collapsed
    pub fn body_text(&self) -> String {
        self.body
            .iter()
            .map(|t| if t.kind.is_trivia() { " " } else { t.text.as_str() })
            .collect()
    }
}

fn replacement_list(body: &str) -> Result<Vec<ReplacementToken>, ScanFailure> {
    let mut scanner = Scanner::new(body.trim());
    let mut tokens = Vec::new();
    while let Some(lexeme) = scanner.next_lexeme()? {
        tokens.push(ReplacementToken {
            kind: lexeme.kind,
            text: lexeme.text.to_string(),
        });
    }
    Ok(tokens)
}

/// Name to definition mapping; later definitions replace earlier ones
#[derive(Debug, Clone, Default)]
pub struct MacroTable {
    macros: HashMap<String, MacroDefinition>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a definition, returning the one it replaced
    pub fn define(&mut self, definition: MacroDefinition) -> Option<MacroDefinition> {
        self.macros.insert(definition.name.clone(), definition)
    }

    pub fn undef(&mut self, name: &str) -> Option<MacroDefinition> {
        self.macros.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&MacroDefinition> {
        self.macros.get(name)
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    pub fn clear(&mut self) {
        self.macros.clear();
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_body_is_tokenized() {
        let def = MacroDefinition::object("SCALE", " 2.0 * x ").unwrap();
        assert!(!def.is_function_like());
        let texts: Vec<&str> = def.body.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["2.0", " ", "*", " ", "x"]);
        assert_eq!(def.body_text(), "2.0 * x");
    }

    #[test]
    fn test_param_index() {
        let def =
            MacroDefinition::function("MAX", vec!["a".into(), "b".into()], "a > b ? a : b")
                .unwrap();
        assert_eq!(def.param_index("b"), Some(1));
        assert_eq!(def.param_index("c"), None);
    }

    #[test]
    fn test_redefine_replaces() {
        let mut table = MacroTable::new();
        table.define(MacroDefinition::object("A", "1").unwrap());
        let old = table.define(MacroDefinition::function("A", vec![], "2").unwrap());
        assert_eq!(old.map(|d| d.body_text()), Some("1".to_string()));
        assert!(table.get("A").unwrap().is_function_like());
        assert_eq!(table.len(), 1);
        assert!(table.undef("A").is_some());
        assert!(table.is_empty());
    }

    #[test]
    fn test_unterminated_string_in_body() {
        assert!(MacroDefinition::object("S", "\"open").is_err());
    }
}
