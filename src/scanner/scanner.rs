use super::lexeme::{LexemeKind, lexeme};

/// Cursor position: byte offset plus 1-based line and column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Default for Location {
    fn default() -> Self {
        Location {
            offset: 0,
            line: 1,
            column: 1,
        }
    }
}

/// Malformed lexical content found by the scanner
#[derive(Debug, Clone, PartialEq)]
pub struct ScanFailure {
    pub message: String,
    pub location: Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexeme<'a> {
    pub kind: LexemeKind,
    pub text: &'a str,
    pub location: Location,
}

impl<'a> Lexeme<'a> {
    pub fn start(&self) -> usize {
        self.location.offset
    }

    pub fn end(&self) -> usize {
        self.location.offset + self.text.len()
    }

    pub fn is_punct(&self, c: char) -> bool {
        self.kind == LexemeKind::Punct && self.text.starts_with(c)
    }
}

/// Saved cursor for backtracking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanState(Location);

/// Lazy lexeme stream over one piece of text
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    text: &'a str,
    location: Location,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Scanner {
            text,
            location: Location::default(),
        }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn rest(&self) -> &'a str {
        &self.text[self.location.offset..]
    }

    pub fn is_eof(&self) -> bool {
        self.location.offset >= self.text.len()
    }

    pub fn peek_char(&self) -> Option<char> {
        self.peek_nth_char(0)
    }

    pub fn peek_nth_char(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    pub fn save(&self) -> ScanState {
        ScanState(self.location)
    }

    pub fn restore(&mut self, state: ScanState) {
        self.location = state.0;
    }

    fn advance(&mut self, consumed: &str) {
        for c in consumed.chars() {
            if c == '\n' {
                self.location.line += 1;
                self.location.column = 1;
            } else {
                self.location.column += 1;
            }
        }
        self.location.offset += consumed.len();
    }

    pub fn next_lexeme(&mut self) -> Result<Option<Lexeme<'a>>, ScanFailure> {
        self.scan(true)
    }

    /// Like `next_lexeme`, but an unterminated string or character literal is
    /// returned as a single quote `Punct`. Unterminated block comments still fail.
    pub fn next_lexeme_lenient(&mut self) -> Result<Option<Lexeme<'a>>, ScanFailure> {
        self.scan(false)
    }

    fn scan(&mut self, strict_literals: bool) -> Result<Option<Lexeme<'a>>, ScanFailure> {
        let rest = self.rest();
        if rest.is_empty() {
            return Ok(None);
        }
        let start = self.location;
        let (kind, text) = match lexeme(rest) {
            Ok((_, r)) => r,
            Err(e) => {
                return Err(ScanFailure {
                    message: e.to_string(),
                    location: start,
                });
            }
        };
        if kind == LexemeKind::Punct {
            if rest.starts_with("/*") {
                return Err(self.failure("unterminated block comment", start));
            }
            if strict_literals && text == "\"" {
                return Err(self.failure("unterminated string literal", start));
            }
            if strict_literals && text == "'" {
                return Err(self.failure("unterminated character literal", start));
            }
        }
        self.advance(text);
        Ok(Some(Lexeme {
            kind,
            text,
            location: start,
        }))
    }

    pub fn peek_lexeme(&mut self) -> Result<Option<Lexeme<'a>>, ScanFailure> {
        let state = self.save();
        let r = self.next_lexeme();
        self.restore(state);
        r
    }

    /// Skip whitespace and comments on the current line, returning the next lexeme
    /// without consuming it
    pub fn peek_significant(&mut self) -> Result<Option<Lexeme<'a>>, ScanFailure> {
        let state = self.save();
        let r = loop {
            match self.next_lexeme() {
                Ok(Some(l)) if l.kind.is_trivia() => continue,
                other => break other,
            }
        };
        self.restore(state);
        r
    }

    fn failure(&self, message: &str, location: Location) -> ScanFailure {
        ScanFailure {
            message: message.to_string(),
            location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(s: &str) -> Vec<LexemeKind> {
        let mut scanner = Scanner::new(s);
        let mut v = Vec::new();
        while let Some(l) = scanner.next_lexeme().unwrap() {
            v.push(l.kind);
        }
        v
    }

    #[test]
    fn test_lexeme_sequence() {
        assert_eq!(
            kinds("a /b\n"),
            vec![
                LexemeKind::Identifier,
                LexemeKind::Whitespace,
                LexemeKind::Punct,
                LexemeKind::Identifier,
                LexemeKind::Newline,
            ]
        );
    }

    #[test]
    fn test_line_tracking() {
        let mut scanner = Scanner::new("a\n  b /* x\n y */ c");
        let mut locations = Vec::new();
        while let Some(l) = scanner.next_lexeme().unwrap() {
            if l.kind == LexemeKind::Identifier {
                locations.push((l.text, l.location.line, l.location.column));
            }
        }
        assert_eq!(locations, vec![("a", 1, 1), ("b", 2, 3), ("c", 3, 7)]);
    }

    #[test]
    fn test_save_restore() {
        let mut scanner = Scanner::new("MAX (a, b)");
        let first = scanner.next_lexeme().unwrap().unwrap();
        assert_eq!(first.text, "MAX");
        let state = scanner.save();
        let next = scanner.peek_significant().unwrap().unwrap();
        assert!(next.is_punct('('));
        scanner.next_lexeme().unwrap();
        scanner.restore(state);
        assert_eq!(scanner.location().offset, 3);
        assert_eq!(scanner.peek_char(), Some(' '));
        assert_eq!(scanner.peek_nth_char(1), Some('('));
    }

    #[test]
    fn test_unterminated_block_comment() {
        let mut scanner = Scanner::new("x\n/* never closed");
        scanner.next_lexeme().unwrap();
        scanner.next_lexeme().unwrap();
        let err = scanner.next_lexeme().unwrap_err();
        assert!(err.message.contains("block comment"));
        assert_eq!(err.location.line, 2);
    }

    #[test]
    fn test_lenient_quote_is_punct() {
        let mut scanner = Scanner::new("it's");
        let first = scanner.next_lexeme_lenient().unwrap().unwrap();
        assert_eq!(first.text, "it");
        let quote = scanner.next_lexeme_lenient().unwrap().unwrap();
        assert!(quote.is_punct('\''));
        let last = scanner.next_lexeme_lenient().unwrap().unwrap();
        assert_eq!(last.text, "s");
        assert!(scanner.next_lexeme_lenient().unwrap().is_none());

        let mut scanner = Scanner::new("/* open");
        assert!(scanner.next_lexeme_lenient().is_err());
    }

    #[test]
    fn test_unterminated_string() {
        let mut scanner = Scanner::new("\"open");
        let err = scanner.next_lexeme().unwrap_err();
        assert!(err.message.contains("string"));
    }
}
