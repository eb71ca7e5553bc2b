use nom::IResult;
use nom::branch::alt;
use nom::bytes::complete::{tag, take_till, take_until, take_while, take_while1};
use nom::character::complete::{anychar, char, one_of, satisfy};
use nom::combinator::{map, recognize};
use nom::multi::many0;
use nom::sequence::{delimited, pair};

/// Raw lexical category, before keyword classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LexemeKind {
    Newline,
    Whitespace,
    LineComment,
    BlockComment,
    Identifier,
    Number,
    StringLiteral,
    CharLiteral,
    Punct,
}

impl LexemeKind {
    /// Whitespace or comment, but not a newline
    pub fn is_trivia(&self) -> bool {
        matches!(
            self,
            LexemeKind::Whitespace | LexemeKind::LineComment | LexemeKind::BlockComment
        )
    }
}

pub(super) fn lexeme(s: &str) -> IResult<&str, (LexemeKind, &str)> {
    return alt((
        map(newline, |t| (LexemeKind::Newline, t)),
        map(whitespace, |t| (LexemeKind::Whitespace, t)),
        map(line_comment, |t| (LexemeKind::LineComment, t)),
        map(block_comment, |t| (LexemeKind::BlockComment, t)),
        map(identifier, |t| (LexemeKind::Identifier, t)),
        map(number, |t| (LexemeKind::Number, t)),
        map(string_literal, |t| (LexemeKind::StringLiteral, t)),
        map(char_literal, |t| (LexemeKind::CharLiteral, t)),
        map(recognize(anychar), |t| (LexemeKind::Punct, t)),
    ))(s);
}

fn newline(s: &str) -> IResult<&str, &str> {
    return alt((tag("\r\n"), tag("\n")))(s);
}

fn whitespace(s: &str) -> IResult<&str, &str> {
    return take_while1(|c| c == ' ' || c == '\t' || c == '\r' || c == '\x0b' || c == '\x0c')(s);
}

fn line_comment(s: &str) -> IResult<&str, &str> {
    return recognize(pair(tag("//"), take_till(|c| c == '\n')))(s);
}

fn block_comment(s: &str) -> IResult<&str, &str> {
    return recognize(delimited(tag("/*"), take_until("*/"), tag("*/")))(s);
}

pub(super) fn identifier(s: &str) -> IResult<&str, &str> {
    return recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(s);
}

/// Preprocessing number: digits, suffixes, exponents and dots in one lexeme
fn number(s: &str) -> IResult<&str, &str> {
    return recognize(pair(
        alt((
            recognize(satisfy(|c| c.is_ascii_digit())),
            recognize(pair(char('.'), satisfy(|c| c.is_ascii_digit()))),
        )),
        many0(alt((
            recognize(pair(one_of("eE"), one_of("+-"))),
            recognize(satisfy(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')),
        ))),
    ))(s);
}

fn string_literal(s: &str) -> IResult<&str, &str> {
    return quoted(s, '"');
}

fn char_literal(s: &str) -> IResult<&str, &str> {
    return quoted(s, '\'');
}

fn quoted(s: &str, quote: char) -> IResult<&str, &str> {
    return recognize(delimited(
        char(quote),
        many0(alt((
            recognize(pair(char('\\'), anychar)),
            recognize(satisfy(move |c| c != quote && c != '\\' && c != '\n')),
        ))),
        char(quote),
    ))(s);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier() {
        let (rest, (kind, text)) = lexeme("gl_Position = x;").unwrap();
        assert_eq!(kind, LexemeKind::Identifier);
        assert_eq!(text, "gl_Position");
        assert_eq!(rest, " = x;");
    }

    #[test]
    fn test_numbers() {
        for s in ["1.0", "0x1F", "3e-5", ".5", "10u", "1.5f"] {
            let (rest, (kind, text)) = lexeme(s).unwrap();
            assert_eq!(kind, LexemeKind::Number, "{}", s);
            assert_eq!(text, s);
            assert_eq!(rest, "");
        }
    }

    #[test]
    fn test_comments() {
        let (rest, (kind, _)) = lexeme("// note\nx").unwrap();
        assert_eq!(kind, LexemeKind::LineComment);
        assert_eq!(rest, "\nx");

        let (rest, (kind, text)) = lexeme("/* a\n#define X */y").unwrap();
        assert_eq!(kind, LexemeKind::BlockComment);
        assert_eq!(text, "/* a\n#define X */");
        assert_eq!(rest, "y");
    }

    #[test]
    fn test_division_is_punct() {
        let (rest, (kind, text)) = lexeme("/ 2").unwrap();
        assert_eq!(kind, LexemeKind::Punct);
        assert_eq!(text, "/");
        assert_eq!(rest, " 2");
    }

    #[test]
    fn test_string_with_escape() {
        let (rest, (kind, text)) = lexeme("\"a\\\"b\" c").unwrap();
        assert_eq!(kind, LexemeKind::StringLiteral);
        assert_eq!(text, "\"a\\\"b\"");
        assert_eq!(rest, " c");
    }

    #[test]
    fn test_unterminated_string_falls_back_to_punct() {
        let (_, (kind, text)) = lexeme("\"abc\n").unwrap();
        assert_eq!(kind, LexemeKind::Punct);
        assert_eq!(text, "\"");
    }
}
