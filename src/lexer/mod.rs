use logos::{Lexer, Logos};

use crate::program::Category;

#[derive(Logos, Debug, PartialEq, Clone)]
pub enum Token {
    // Group openers; the longest match picks the specific form
    #[token("(?:")]
    NonCapture,
    #[token("(?=")]
    LookAhead,
    #[token("(?!")]
    NegLookAhead,
    #[token("(?<=")]
    LookBehind,
    #[token("(?<!")]
    NegLookBehind,
    #[regex(r"\(\?P?<[A-Za-z_][A-Za-z0-9_]*>", group_name)]
    NamedGroup(String),
    #[token("(")]
    Open,
    #[token(")")]
    Close,

    #[token("[^")]
    ClassOpenNegated,
    #[token("[")]
    ClassOpen,
    #[token("]")]
    ClassClose,

    // Operators
    #[token("|")]
    Pipe,
    #[token("*")]
    Star,
    #[token("+")]
    Plus,
    #[token("?")]
    Question,
    #[regex(r"\{[0-9]+(,[0-9]*)?\}", bounds)]
    Bounds((u32, Option<u32>)),
    /// A `{` that does not open a valid `{m}`, `{m,}` or `{m,n}`.
    #[token("{")]
    Brace,

    #[token("^")]
    Caret,
    #[token("$")]
    Dollar,
    #[token(".")]
    Dot,
    #[token("-")]
    Dash,

    // Escapes
    #[regex(r"\\[dDwWsS]", category)]
    ClassEscape(Category),
    #[regex(r"\\[bBAzZG]", |lex| lex.slice().chars().nth(1))]
    AssertEscape(char),
    #[regex(r"\\[1-9][0-9]*", |lex| lex.slice()[1..].parse::<usize>().ok())]
    Backref(usize),
    #[regex(r"\\k<[A-Za-z_][A-Za-z0-9_]*>", |lex| {
        let s = lex.slice();
        s[3..s.len() - 1].to_string()
    })]
    NamedBackref(String),
    #[regex(r"\\x[0-9a-fA-F]{2}", hex)]
    #[regex(r"\\u[0-9a-fA-F]{4}", hex)]
    Hex(char),
    #[regex(r"\\[nrtfv0]", control)]
    Control(char),
    /// `\` before any non-alphanumeric character stands for that character.
    #[regex(r"\\[^A-Za-z0-9]", |lex| lex.slice().chars().nth(1))]
    Escaped(char),

    #[regex(r"[^\\()\[\]|*+?{^$.\-]", |lex| lex.slice().chars().next())]
    Literal(char),
}

fn group_name(lex: &mut Lexer<Token>) -> String {
    let s = lex.slice();
    let open = s.find('<').map_or(0, |i| i + 1);
    s[open..s.len() - 1].to_string()
}

fn bounds(lex: &mut Lexer<Token>) -> Option<(u32, Option<u32>)> {
    let inner = &lex.slice()[1..lex.slice().len() - 1];
    match inner.split_once(',') {
        None => {
            let n = inner.parse().ok()?;
            Some((n, Some(n)))
        }
        Some((min, "")) => Some((min.parse().ok()?, None)),
        Some((min, max)) => Some((min.parse().ok()?, Some(max.parse().ok()?))),
    }
}

fn category(lex: &mut Lexer<Token>) -> Option<Category> {
    Some(match lex.slice().chars().nth(1)? {
        'd' => Category::Digit,
        'D' => Category::NotDigit,
        'w' => Category::Word,
        'W' => Category::NotWord,
        's' => Category::Space,
        'S' => Category::NotSpace,
        _ => return None,
    })
}

fn hex(lex: &mut Lexer<Token>) -> Option<char> {
    let code = u32::from_str_radix(&lex.slice()[2..], 16).ok()?;
    char::from_u32(code)
}

fn control(lex: &mut Lexer<Token>) -> Option<char> {
    Some(match lex.slice().chars().nth(1)? {
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        'f' => '\u{c}',
        'v' => '\u{b}',
        '0' => '\0',
        _ => return None,
    })
}

/// Lex a pattern into tokens with byte ranges.
/// Fails at the first sequence no token accepts.
pub fn lex(source: &str) -> Result<Vec<(Token, std::ops::Range<usize>)>, LexError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push((token, lexer.span())),
            Err(()) => {
                let span = lexer.span();
                return Err(LexError {
                    position: span.start,
                    snippet: source[span.clone()].to_string(),
                    suggestion: suggest_fix(&source[span.start..]),
                });
            }
        }
    }

    Ok(tokens)
}

/// Every lex error comes with a suggested fix.
fn suggest_fix(rest: &str) -> String {
    let mut chars = rest.chars();
    match (chars.next(), chars.next()) {
        (Some('\\'), Some('p' | 'P')) => {
            "Unicode property classes are not supported; spell the range out, e.g. [a-zA-Z]".to_string()
        }
        (Some('\\'), Some('x')) => "Write \\x with exactly two hex digits, e.g. \\x41".to_string(),
        (Some('\\'), Some('u')) => "Write \\u with exactly four hex digits, e.g. \\u00e9".to_string(),
        (Some('\\'), Some('k')) => "Name the group in angle brackets: \\k<name>".to_string(),
        (Some('\\'), None) => "A pattern cannot end with a lone backslash; write \\\\ for a literal one".to_string(),
        (Some('\\'), Some(c)) => format!("Unknown escape '\\{c}'; write '{c}' or escape punctuation only"),
        _ => format!("Unexpected character(s): '{}'", rest.chars().next().unwrap_or(' ')),
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Lex error at position {position}: '{snippet}'. {suggestion}")]
pub struct LexError {
    pub position: usize,
    pub snippet: String,
    pub suggestion: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        lex(source).unwrap().into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn lex_literals_and_operators() {
        assert_eq!(
            kinds("ab*|c+?"),
            vec![
                Token::Literal('a'),
                Token::Literal('b'),
                Token::Star,
                Token::Pipe,
                Token::Literal('c'),
                Token::Plus,
                Token::Question,
            ]
        );
    }

    #[test]
    fn lex_group_openers() {
        assert_eq!(
            kinds("(?:(?=(?!(?<=(?<!(?<year>(?P<d>("),
            vec![
                Token::NonCapture,
                Token::LookAhead,
                Token::NegLookAhead,
                Token::LookBehind,
                Token::NegLookBehind,
                Token::NamedGroup("year".into()),
                Token::NamedGroup("d".into()),
                Token::Open,
            ]
        );
    }

    #[test]
    fn lex_bounds() {
        assert_eq!(kinds("{3}"), vec![Token::Bounds((3, Some(3)))]);
        assert_eq!(kinds("{2,}"), vec![Token::Bounds((2, None))]);
        assert_eq!(kinds("{1,4}"), vec![Token::Bounds((1, Some(4)))]);
        // not a quantifier
        assert_eq!(kinds("{a}"), vec![Token::Brace, Token::Literal('a'), Token::Literal('}')]);
    }

    #[test]
    fn lex_escapes() {
        assert_eq!(
            kinds(r"\d\b\12\k<x>\x41\u00e9\n\.\\"),
            vec![
                Token::ClassEscape(Category::Digit),
                Token::AssertEscape('b'),
                Token::Backref(12),
                Token::NamedBackref("x".into()),
                Token::Hex('A'),
                Token::Hex('é'),
                Token::Control('\n'),
                Token::Escaped('.'),
                Token::Escaped('\\'),
            ]
        );
    }

    #[test]
    fn lex_spans() {
        let tokens = lex("a{2}").unwrap();
        assert_eq!(tokens[0].1, 0..1);
        assert_eq!(tokens[1].1, 1..4);
    }

    #[test]
    fn lex_unknown_escape_suggests_fix() {
        let err = lex(r"a\p{L}").unwrap_err();
        assert_eq!(err.position, 1);
        assert!(err.suggestion.contains("Unicode property"), "{}", err.suggestion);

        let err = lex(r"\x4").unwrap_err();
        assert!(err.suggestion.contains("two hex digits"), "{}", err.suggestion);
    }
}
