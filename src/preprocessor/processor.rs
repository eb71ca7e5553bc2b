//! Preprocessor implementation

use std::collections::{HashMap, HashSet};

use crate::error::{CompileError, CompileResult};
use crate::preprocessor::conditional::ConditionalFrame;
use crate::preprocessor::expand::{Expander, Origin, PpToken};
use crate::preprocessor::expression;
use crate::preprocessor::macros::{MacroDefinition, MacroTable};
use crate::preprocessor::parser::{Directive, directive_name, parse_directive};
use crate::scanner::{Lexeme, LexemeKind, Location, ScanFailure, Scanner};
use crate::source_map::{SourceMap, SourcePosition, UnitId};

/// Include path to source text
pub type IncludeMap = HashMap<String, String>;

pub const DEFAULT_ROOT_UNIT: &str = "shader";

/// One logical directive line, continuations folded
struct DirectiveLine<'a> {
    text: String,
    location: Location,
    /// Continuation newlines and the terminating one, re-emitted to keep line numbers
    newlines: Vec<Lexeme<'a>>,
}

/// A C-like preprocessor that expands macros, evaluates conditionals and splices
/// includes from an in-memory map, recording where every output byte came from.
pub struct Preprocessor {
    /// Active macro definitions
    macros: MacroTable,

    /// Macros seeded on every reset, in definition order
    predefined: Vec<(String, String)>,

    /// Virtual file system for `#include`
    includes: IncludeMap,

    /// Directory that includes of the root unit resolve against
    base_path: String,

    /// Name of the unit passed to `process`
    root_unit: String,

    /// Open conditional groups across the include chain
    conditionals: Vec<ConditionalFrame>,

    /// Units currently being processed (for circular dependency detection)
    include_stack: Vec<String>,

    /// Units that asked to be included once
    once_units: HashSet<String>,

    output: String,
    source_map: SourceMap,
    last_error: Option<CompileError>,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Preprocessor {
    /// Create a new preprocessor
    pub fn new() -> Self {
        Self {
            macros: MacroTable::new(),
            predefined: Vec::new(),
            includes: IncludeMap::new(),
            base_path: String::new(),
            root_unit: DEFAULT_ROOT_UNIT.to_string(),
            conditionals: Vec::new(),
            include_stack: Vec::new(),
            once_units: HashSet::new(),
            output: String::new(),
            source_map: SourceMap::new(),
            last_error: None,
        }
    }

    /// Create a preprocessor with includes resolved from `includes`
    pub fn with_includes(includes: IncludeMap, base_path: &str) -> Self {
        let mut p = Self::new();
        p.reset(includes, base_path);
        p
    }

    /// Name used for the root unit in positions and include resolution
    pub fn set_root_unit(&mut self, name: &str) {
        self.root_unit = name.to_string();
    }

    pub fn root_unit(&self) -> &str {
        &self.root_unit
    }

    /// Drop all per-run state and user macros, keep predefined macros.
    /// Include keys are normalized the same way `#include` paths are.
    pub fn reset(&mut self, includes: IncludeMap, base_path: &str) {
        self.includes = includes
            .into_iter()
            .map(|(path, text)| (normalize_path(&path), text))
            .collect();
        self.base_path = normalize_path(base_path);
        self.macros.clear();
        for (name, value) in &self.predefined {
            // validated when added
            if let Ok(definition) = MacroDefinition::object(name, value) {
                self.macros.define(definition);
            }
        }
        self.clear_run_state();
        self.last_error = None;
    }

    /// Add a macro that survives `reset`; a missing value defines it as `1`
    pub fn add_predefined_macro(&mut self, name: &str, value: Option<&str>) -> CompileResult<()> {
        let value = value.unwrap_or("1");
        let definition = MacroDefinition::object(name, value).map_err(|f| {
            CompileError::scan(
                format!("in predefined macro '{}': {}", name, f.message),
                SourcePosition::new("<predefined>", 1, f.location.column),
            )
        })?;
        self.predefined.retain(|(n, _)| n != name);
        self.predefined.push((name.to_string(), value.to_string()));
        self.macros.define(definition);
        Ok(())
    }

    /// Check if a macro is defined
    pub fn is_defined(&self, name: &str) -> bool {
        self.macros.is_defined(name)
    }

    pub fn macros(&self) -> &MacroTable {
        &self.macros
    }

    /// Process source code, returning `None` on failure.
    ///
    /// The failure is kept for [`Preprocessor::last_error`].
    pub fn process(&mut self, source: &str) -> Option<String> {
        match self.try_process(source) {
            Ok(output) => Some(output),
            Err(e) => {
                log::error!("{}", e);
                self.last_error = Some(e);
                None
            }
        }
    }

    /// Process source code
    pub fn try_process(&mut self, source: &str) -> CompileResult<String> {
        self.clear_run_state();
        self.last_error = None;

        let root = self.root_unit.clone();
        let dir = self.base_path.clone();
        self.process_unit(&root, source, &dir)?;

        log::debug!(
            "preprocessed '{}': {} bytes in, {} bytes out, {} mapping runs",
            root,
            source.len(),
            self.output.len(),
            self.source_map.runs().len()
        );
        Ok(self.output.clone())
    }

    pub fn last_error(&self) -> Option<&CompileError> {
        self.last_error.as_ref()
    }

    pub fn source_map(&self) -> &SourceMap {
        &self.source_map
    }

    /// Hand the source map of the last run to the caller
    pub fn take_source_map(&mut self) -> SourceMap {
        std::mem::take(&mut self.source_map)
    }

    /// Map an index of the last output back to a position in its source unit
    pub fn convert_source_index(&self, output_index: usize) -> Option<SourcePosition> {
        self.source_map.source_position_of(output_index)
    }

    fn clear_run_state(&mut self) {
        self.output.clear();
        self.source_map.clear();
        self.conditionals.clear();
        self.include_stack.clear();
        self.once_units.clear();
    }

    fn is_active(&self) -> bool {
        self.conditionals.last().map_or(true, |f| f.is_emitting())
    }

    fn process_unit(&mut self, name: &str, text: &str, dir: &str) -> CompileResult<()> {
        let unit = self.source_map.add_unit(name, text);
        self.include_stack.push(name.to_string());
        let depth = self.conditionals.len();

        let mut scanner = Scanner::new(text);
        let mut pending: Vec<PpToken> = Vec::new();
        let mut at_line_start = true;

        loop {
            // skipped text is not shader code, so stray quotes in it are not literals
            let next = if self.is_active() {
                scanner.next_lexeme()
            } else {
                scanner.next_lexeme_lenient()
            };
            let lexeme = match next {
                Ok(Some(l)) => l,
                Ok(None) => break,
                Err(f) => return Err(self.scan_error(unit, f)),
            };

            if at_line_start && lexeme.is_punct('#') {
                self.flush(&mut pending)?;
                let line = self.read_directive_line(&mut scanner, unit, &lexeme)?;
                self.handle_directive(unit, name, dir, depth, &line)?;
                for newline in &line.newlines {
                    self.emit_newline(unit, newline);
                }
                continue;
            }

            match lexeme.kind {
                LexemeKind::Newline => at_line_start = true,
                k if k.is_trivia() => {}
                _ => at_line_start = false,
            }

            if self.is_active() {
                pending.push(PpToken::from_lexeme(&lexeme, unit));
            } else if lexeme.kind == LexemeKind::Newline {
                self.emit_newline(unit, &lexeme);
            }
        }
        self.flush(&mut pending)?;

        if self.conditionals.len() > depth {
            let opened_at = self.conditionals[depth].opened_at.clone();
            self.conditionals.truncate(depth);
            return Err(CompileError::directive(
                "unterminated conditional block: missing #endif",
                opened_at,
            ));
        }

        self.include_stack.pop();
        Ok(())
    }

    fn flush(&mut self, pending: &mut Vec<PpToken>) -> CompileResult<()> {
        if pending.is_empty() {
            return Ok(());
        }
        let tokens = std::mem::take(pending);
        let expanded = Expander::new(&self.macros, &self.source_map).expand(tokens)?;
        for token in &expanded {
            self.emit(token);
        }
        Ok(())
    }

    fn emit(&mut self, token: &PpToken) {
        let start = self.output.len();
        self.output.push_str(&token.text);
        self.source_map.push(
            start,
            token.text.len(),
            token.origin.unit,
            token.origin.offset,
            token.verbatim,
        );
    }

    fn emit_newline(&mut self, unit: UnitId, newline: &Lexeme) {
        let start = self.output.len();
        self.output.push('\n');
        self.source_map.push(start, 1, unit, newline.start(), true);
    }

    fn emit_text(&mut self, text: &str, unit: UnitId, offset: usize) {
        let start = self.output.len();
        self.output.push_str(text);
        self.source_map.push(start, text.len(), unit, offset, false);
    }

    /// Consume the rest of a directive line, replacing comments with a space and
    /// joining backslash-continued lines. Quotes are read leniently; a directive that
    /// needs a literal rejects the malformed text itself.
    fn read_directive_line<'a>(
        &self,
        scanner: &mut Scanner<'a>,
        unit: UnitId,
        hash: &Lexeme<'a>,
    ) -> CompileResult<DirectiveLine<'a>> {
        let mut rest = String::new();
        let mut newlines = Vec::new();
        loop {
            let lexeme = match scanner.next_lexeme_lenient() {
                Ok(Some(l)) => l,
                Ok(None) => break,
                Err(f) => return Err(self.scan_error(unit, f)),
            };
            match lexeme.kind {
                LexemeKind::Newline => {
                    newlines.push(lexeme);
                    break;
                }
                LexemeKind::LineComment | LexemeKind::BlockComment => rest.push(' '),
                LexemeKind::Punct if lexeme.text == "\\" => {
                    match scanner.peek_lexeme() {
                        Ok(Some(next)) if next.kind == LexemeKind::Newline => {
                            let _ = scanner.next_lexeme();
                            newlines.push(next);
                            rest.push(' ');
                        }
                        _ => rest.push('\\'),
                    }
                }
                _ => rest.push_str(lexeme.text),
            }
        }
        Ok(DirectiveLine {
            text: format!("#{}", rest.trim()),
            location: hash.location,
            newlines,
        })
    }

    fn handle_directive(
        &mut self,
        unit: UnitId,
        unit_name: &str,
        dir: &str,
        depth: usize,
        line: &DirectiveLine,
    ) -> CompileResult<()> {
        let position = self.source_map.position_in_unit(unit, line.location.offset);
        let name = directive_name(&line.text);

        // skipped regions only track conditional nesting
        if !self.is_active() && !is_conditional_name(name) {
            return Ok(());
        }
        if !self.is_active() && matches!(name, "if" | "ifdef" | "ifndef") {
            self.conditionals
                .push(ConditionalFrame::open(false, false, position));
            return Ok(());
        }

        let directive = match parse_directive(&line.text) {
            Ok((_, d)) => d,
            Err(_) => return Err(malformed(name, &line.text, position)),
        };

        match directive {
            Directive::Define { name, value } => {
                let definition = MacroDefinition::object(&name, &value)
                    .map_err(|f| directive_scan_error(&name, f, &position))?;
                self.define(definition, &position)?;
            }
            Directive::DefineMacro { name, params, body } => {
                for (i, p) in params.iter().enumerate() {
                    if params[..i].contains(p) {
                        return Err(CompileError::directive(
                            format!("duplicate parameter '{}' in macro '{}'", p, name),
                            position,
                        ));
                    }
                }
                let definition = MacroDefinition::function(&name, params, &body)
                    .map_err(|f| directive_scan_error(&name, f, &position))?;
                self.define(definition, &position)?;
            }
            Directive::Undef { name } => {
                if self.macros.undef(&name).is_some() {
                    log::debug!("{}: #undef {}", position, name);
                }
            }
            Directive::IfDef { name } => {
                let defined = self.macros.is_defined(&name);
                self.conditionals
                    .push(ConditionalFrame::open(true, defined, position));
            }
            Directive::IfNDef { name } => {
                let defined = self.macros.is_defined(&name);
                self.conditionals
                    .push(ConditionalFrame::open(true, !defined, position));
            }
            Directive::If { expr } => {
                let condition =
                    self.evaluate_condition(unit, line.location.offset, &expr, &position)?;
                self.conditionals
                    .push(ConditionalFrame::open(true, condition, position));
            }
            Directive::ElIf { expr } => {
                let frame = self.open_frame(depth, "#elif", &position)?;
                if frame.seen_else {
                    return Err(CompileError::directive("#elif after #else", position));
                }
                let condition = if frame.wants_alternative() {
                    self.evaluate_condition(unit, line.location.offset, &expr, &position)?
                } else {
                    false
                };
                if let Some(frame) = self.conditionals.last_mut() {
                    frame.enter_elif(condition);
                }
            }
            Directive::Else => {
                let frame = self.open_frame(depth, "#else", &position)?;
                if frame.seen_else {
                    return Err(CompileError::directive("#else after #else", position));
                }
                if let Some(frame) = self.conditionals.last_mut() {
                    frame.enter_else();
                }
            }
            Directive::EndIf => {
                self.open_frame(depth, "#endif", &position)?;
                self.conditionals.pop();
            }
            Directive::Include { path } => {
                self.include(&path, unit_name, dir, &position)?;
            }
            Directive::Error { message } => {
                return Err(CompileError::directive(
                    format!("#error {}", message).trim_end().to_string(),
                    position,
                ));
            }
            Directive::PragmaOnce => {
                self.once_units.insert(unit_name.to_string());
            }
            Directive::PassThrough { text } => {
                self.emit_text(&text, unit, line.location.offset);
            }
            Directive::Null => {}
        }
        Ok(())
    }

    /// The innermost conditional group opened by the current unit
    fn open_frame(
        &self,
        depth: usize,
        directive: &str,
        position: &SourcePosition,
    ) -> CompileResult<ConditionalFrame> {
        match self.conditionals.last() {
            Some(frame) if self.conditionals.len() > depth => Ok(frame.clone()),
            _ => Err(CompileError::directive(
                format!("{} without #if", directive),
                position.clone(),
            )),
        }
    }

    fn define(
        &mut self,
        definition: MacroDefinition,
        position: &SourcePosition,
    ) -> CompileResult<()> {
        if definition.name == "defined" {
            return Err(CompileError::directive(
                "'defined' cannot be used as a macro name",
                position.clone(),
            ));
        }
        if let Some(old) = self.macros.define(definition) {
            if self.predefined.iter().any(|(n, _)| n == &old.name) {
                log::warn!("{}: predefined macro '{}' redefined", position, old.name);
            } else {
                log::debug!("{}: macro '{}' redefined", position, old.name);
            }
        }
        Ok(())
    }

    fn include(
        &mut self,
        path: &str,
        from: &str,
        dir: &str,
        position: &SourcePosition,
    ) -> CompileResult<()> {
        let resolved = match self.resolve_include(path, dir) {
            Some(r) => r,
            None => {
                return Err(CompileError::directive(
                    format!("unresolved include \"{}\"", path),
                    position.clone(),
                ));
            }
        };

        if self.include_stack.contains(&resolved) {
            let mut chain = self.include_stack.clone();
            chain.push(resolved);
            return Err(CompileError::directive(
                format!("circular include: {}", chain.join(" -> ")),
                position.clone(),
            ));
        }
        if self.once_units.contains(&resolved) {
            log::warn!("{}: '{}' was marked #pragma once, not included again", position, resolved);
            return Ok(());
        }

        let text = self.includes.get(&resolved).cloned().unwrap_or_default();
        log::debug!("including '{}' from '{}'", resolved, from);
        let include_dir = parent_dir(&resolved).to_string();
        self.process_unit(&resolved, &text, &include_dir)
    }

    /// Look up `path` relative to the including unit, then the base path, then as given
    fn resolve_include(&self, path: &str, dir: &str) -> Option<String> {
        let candidates = [
            join_path(dir, path),
            join_path(&self.base_path, path),
            normalize_path(path),
        ];
        candidates
            .into_iter()
            .find(|c| self.includes.contains_key(c))
    }

    fn evaluate_condition(
        &self,
        unit: UnitId,
        offset: usize,
        expr: &str,
        position: &SourcePosition,
    ) -> CompileResult<bool> {
        let origin = Origin { unit, offset };
        let mut scanner = Scanner::new(expr);
        let mut tokens = Vec::new();
        loop {
            match scanner.next_lexeme() {
                Ok(Some(l)) => tokens.push(PpToken::synthetic(l.kind, l.text, origin)),
                Ok(None) => break,
                Err(f) => {
                    return Err(CompileError::directive(
                        format!("invalid #if expression: {}", f.message),
                        position.clone(),
                    ));
                }
            }
        }

        let tokens = self.replace_defined(tokens, position)?;
        let expanded = Expander::new(&self.macros, &self.source_map).expand(tokens)?;

        let mut text = String::new();
        for t in &expanded {
            match t.kind {
                LexemeKind::Identifier if t.text == "true" => text.push('1'),
                LexemeKind::Identifier => text.push('0'),
                LexemeKind::Newline => text.push(' '),
                k if k.is_trivia() => text.push(' '),
                _ => text.push_str(&t.text),
            }
        }

        match expression::evaluate(&text) {
            Ok(v) => Ok(v != 0),
            Err(message) => Err(CompileError::directive(
                format!("invalid #if expression '{}': {}", expr, message),
                position.clone(),
            )),
        }
    }

    /// Replace `defined NAME` and `defined(NAME)` before macro expansion
    fn replace_defined(
        &self,
        tokens: Vec<PpToken>,
        position: &SourcePosition,
    ) -> CompileResult<Vec<PpToken>> {
        let significant = |from: usize| (from..tokens.len()).find(|&j| !tokens[j].kind.is_trivia());
        let mut result = Vec::with_capacity(tokens.len());
        let mut i = 0;
        while i < tokens.len() {
            let t = &tokens[i];
            if t.kind != LexemeKind::Identifier || t.text != "defined" {
                result.push(t.clone());
                i += 1;
                continue;
            }

            let mut j = significant(i + 1);
            let parenthesized = j.map_or(false, |j| tokens[j].is_punct('('));
            if parenthesized {
                j = j.and_then(|j| significant(j + 1));
            }
            let (name, mut next) = match j {
                Some(j) if tokens[j].kind == LexemeKind::Identifier => (&tokens[j].text, j + 1),
                _ => {
                    return Err(CompileError::directive(
                        "expected macro name after 'defined'",
                        position.clone(),
                    ));
                }
            };
            if parenthesized {
                match significant(next) {
                    Some(k) if tokens[k].is_punct(')') => next = k + 1,
                    _ => {
                        return Err(CompileError::directive(
                            "missing ')' after 'defined'",
                            position.clone(),
                        ));
                    }
                }
            }

            let value = if self.macros.is_defined(name) { "1" } else { "0" };
            result.push(PpToken::synthetic(LexemeKind::Number, value, t.origin));
            i = next;
        }
        Ok(result)
    }

    fn scan_error(&self, unit: UnitId, failure: ScanFailure) -> CompileError {
        let position = self.source_map.position_in_unit(unit, failure.location.offset);
        CompileError::scan(failure.message, position)
    }
}

fn is_conditional_name(name: &str) -> bool {
    matches!(name, "if" | "ifdef" | "ifndef" | "elif" | "else" | "endif")
}

fn malformed(name: &str, text: &str, position: SourcePosition) -> CompileError {
    let known = matches!(
        name,
        "define" | "undef" | "include" | "error" | "version" | "extension" | "line" | "pragma"
    ) || is_conditional_name(name);
    if known {
        CompileError::directive(format!("malformed #{} directive: {}", name, text), position)
    } else {
        CompileError::directive(format!("unknown directive: {}", text), position)
    }
}

fn directive_scan_error(
    name: &str,
    failure: ScanFailure,
    position: &SourcePosition,
) -> CompileError {
    CompileError::directive(
        format!("in definition of macro '{}': {}", name, failure.message),
        position.clone(),
    )
}

/// Directory part of a `/`-separated path, empty for a bare name
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(i) => &path[..i],
        None => "",
    }
}

/// Join `path` onto `dir`; a leading `/` makes `path` relative to the include root
pub fn join_path(dir: &str, path: &str) -> String {
    if path.starts_with('/') || dir.is_empty() {
        normalize_path(path)
    } else {
        normalize_path(&format!("{}/{}", dir, path))
    }
}

/// Resolve `.` and `..` segments and drop empty ones
pub fn normalize_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split(|c| c == '/' || c == '\\') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    parts.join("/")
}
