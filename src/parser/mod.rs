use crate::ast::*;
use crate::lexer::Token;
use crate::program::CharClass;

pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<(Token, Span)>,
    pos: usize,
    captures: usize,
    names: Vec<(String, usize)>,
    backrefs: Vec<(usize, Span)>,
}

#[derive(Debug, thiserror::Error)]
#[error("Parse error at token {position}: {message}")]
pub struct ParseError {
    pub code: &'static str,
    pub position: usize,
    pub span: Span,
    pub message: String,
}

type Result<T> = std::result::Result<T, ParseError>;

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, tokens: Vec<(Token, std::ops::Range<usize>)>) -> Self {
        let tokens = tokens.into_iter().map(|(t, r)| (t, Span::from(r))).collect();
        Parser { source, tokens, pos: 0, captures: 0, names: Vec::new(), backrefs: Vec::new() }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .map(|(_, s)| *s)
            .unwrap_or(Span { start: self.source.len(), end: self.source.len() })
    }

    fn advance(&mut self) -> Option<(Token, Span)> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn error(&self, code: &'static str, message: String) -> ParseError {
        self.error_at(code, self.peek_span(), message)
    }

    fn error_at(&self, code: &'static str, span: Span, message: String) -> ParseError {
        ParseError { code, position: self.pos, span, message }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    // ---- Top level ----

    pub fn parse_pattern(&mut self) -> Result<Pattern> {
        let root = self.parse_alternation()?;
        if !self.at_end() {
            // the only token that stops an alternation early
            return Err(self.error("RGX-P002", "unmatched ')'".into()));
        }
        for &(index, span) in &self.backrefs {
            if index > self.captures {
                return Err(self.error_at(
                    "RGX-P007",
                    span,
                    format!("reference to group {index}, but the pattern has {} groups", self.captures),
                ));
            }
        }
        Ok(Pattern { root, capture_count: self.captures, names: std::mem::take(&mut self.names) })
    }

    fn parse_alternation(&mut self) -> Result<Node> {
        let mut arms = vec![self.parse_concat()?];
        while self.peek() == Some(&Token::Pipe) {
            self.advance();
            arms.push(self.parse_concat()?);
        }
        Ok(if arms.len() == 1 { arms.remove(0) } else { Node::Alternate(arms) })
    }

    fn parse_concat(&mut self) -> Result<Node> {
        let mut items = Vec::new();
        while !matches!(self.peek(), None | Some(Token::Pipe) | Some(Token::Close)) {
            items.push(self.parse_repeat()?);
        }
        Ok(match items.len() {
            0 => Node::Empty,
            1 => items.remove(0),
            _ => Node::Concat(items),
        })
    }

    fn parse_repeat(&mut self) -> Result<Node> {
        let mut node = self.parse_atom()?;
        loop {
            let (min, max) = match self.peek() {
                Some(Token::Star) => (0, None),
                Some(Token::Plus) => (1, None),
                Some(Token::Question) => (0, Some(1)),
                Some(Token::Bounds((min, max))) => (*min, *max),
                _ => break,
            };
            if let Some(max) = max.filter(|&max| max < min) {
                return Err(self.error("RGX-P006", format!("quantifier range {{{min},{max}}} is out of order")));
            }
            if matches!(node, Node::Repeat { .. }) {
                return Err(self.error("RGX-P004", "nested quantifier".into()));
            }
            if !node.is_repeatable() {
                return Err(self.error("RGX-P005", "quantifier has nothing to repeat".into()));
            }
            self.advance();
            let lazy = self.peek() == Some(&Token::Question);
            if lazy {
                self.advance();
            }
            node = Node::Repeat { node: Box::new(node), min, max, lazy };
        }
        Ok(node)
    }

    fn parse_atom(&mut self) -> Result<Node> {
        let Some((tok, span)) = self.advance() else {
            return Err(self.error("RGX-P001", "unexpected end of pattern".into()));
        };
        Ok(match tok {
            Token::Literal(c) | Token::Escaped(c) | Token::Hex(c) | Token::Control(c) => Node::Char(c),
            Token::Dash => Node::Char('-'),
            Token::Brace => Node::Char('{'),
            Token::ClassClose => Node::Char(']'),
            Token::Dot => Node::Any,
            Token::Caret => Node::Assert(Anchor::LineStart),
            Token::Dollar => Node::Assert(Anchor::LineEnd),
            Token::ClassEscape(cat) => Node::Class(CharClass::category(cat)),
            Token::AssertEscape(c) => Node::Assert(match c {
                'b' => Anchor::WordBoundary,
                'B' => Anchor::NotWordBoundary,
                'A' => Anchor::TextStart,
                'z' => Anchor::TextEnd,
                'Z' => Anchor::TextEndNewline,
                _ => Anchor::Continue,
            }),
            Token::Backref(index) => {
                self.backrefs.push((index, span));
                Node::Backref(index)
            }
            Token::NamedBackref(name) => match self.names.iter().find(|(n, _)| *n == name) {
                Some((_, index)) => Node::Backref(*index),
                None => return Err(self.error_at("RGX-P007", span, format!("reference to unknown group '{name}'"))),
            },

            Token::Open => {
                if self.peek() == Some(&Token::Question) {
                    return Err(self.error_at(
                        "RGX-P009",
                        span.merge(self.peek_span()),
                        "unsupported group syntax '(?'".into(),
                    ));
                }
                self.captures += 1;
                let index = self.captures;
                let node = self.parse_group_body(span)?;
                Node::Capture { index, node: Box::new(node) }
            }
            Token::NamedGroup(name) => {
                if self.names.iter().any(|(n, _)| *n == name) {
                    return Err(self.error_at("RGX-P008", span, format!("group name '{name}' is already defined")));
                }
                self.captures += 1;
                let index = self.captures;
                self.names.push((name, index));
                let node = self.parse_group_body(span)?;
                Node::Capture { index, node: Box::new(node) }
            }
            Token::NonCapture => Node::Group(Box::new(self.parse_group_body(span)?)),
            Token::LookAhead => self.parse_lookaround(span, false, false)?,
            Token::NegLookAhead => self.parse_lookaround(span, true, false)?,
            Token::LookBehind => self.parse_lookaround(span, false, true)?,
            Token::NegLookBehind => self.parse_lookaround(span, true, true)?,

            Token::ClassOpen => self.parse_class(span, false)?,
            Token::ClassOpenNegated => self.parse_class(span, true)?,

            Token::Star | Token::Plus | Token::Question | Token::Bounds(_) => {
                return Err(self.error_at("RGX-P005", span, "quantifier has nothing to repeat".into()));
            }
            Token::Pipe | Token::Close => {
                return Err(self.error_at("RGX-P003", span, format!("unexpected {tok:?}")));
            }
        })
    }

    fn parse_group_body(&mut self, open: Span) -> Result<Node> {
        let node = self.parse_alternation()?;
        match self.advance() {
            Some((Token::Close, _)) => Ok(node),
            _ => Err(self.error_at("RGX-P003", open, "unclosed group".into())),
        }
    }

    fn parse_lookaround(&mut self, open: Span, negative: bool, behind: bool) -> Result<Node> {
        let node = self.parse_group_body(open)?;
        Ok(Node::LookAround { node: Box::new(node), negative, behind })
    }

    // ---- Character classes ----

    fn parse_class(&mut self, open: Span, negated: bool) -> Result<Node> {
        let mut class = CharClass::default();
        let mut first = true;
        loop {
            let Some((tok, span)) = self.advance() else {
                return Err(self.error_at("RGX-P010", open, "unclosed character class".into()));
            };
            if tok == Token::ClassClose && !first {
                break;
            }
            first = false;
            self.reject_class_syntax(self.pos - 1)?;

            if let Token::ClassEscape(cat) = tok {
                class.push_category(cat);
                continue;
            }
            let mut chars = self.class_chars(&tok, span)?;
            let Some(start) = chars.pop() else { continue };
            for c in chars {
                class.push_range(c, c);
            }

            let is_range = self.peek() == Some(&Token::Dash)
                && !matches!(self.tokens.get(self.pos + 1), None | Some((Token::ClassClose, _)));
            if !is_range {
                class.push_range(start, start);
                continue;
            }
            self.reject_class_syntax(self.pos)?;
            self.advance();
            self.reject_class_syntax(self.pos)?;
            let Some((end_tok, end_span)) = self.advance() else {
                return Err(self.error_at("RGX-P010", open, "unclosed character class".into()));
            };
            let end = match end_tok {
                Token::ClassEscape(_) => None,
                _ => self.class_chars(&end_tok, end_span)?.first().copied(),
            };
            match end {
                Some(end) if end >= start => class.push_range(start, end),
                _ => {
                    return Err(self.error_at(
                        "RGX-P012",
                        span.merge(end_span),
                        format!("invalid class range '{}'", &self.source[span.start..end_span.end]),
                    ));
                }
            }
        }
        if negated {
            class.negate();
        }
        Ok(Node::Class(class))
    }

    /// Nested classes, POSIX classes and the set operators `&&`, `--`, `~~`
    /// change a class's meaning for the matcher; refuse them rather than
    /// read them as plain characters.
    fn reject_class_syntax(&self, at: usize) -> Result<()> {
        let Some((tok, span)) = self.tokens.get(at) else { return Ok(()) };
        let rest = &self.source[span.start..];
        let (span, message) = match tok {
            Token::ClassOpen | Token::ClassOpenNegated if rest.starts_with("[:") => {
                let end = rest.find(":]").map_or(span.end, |i| span.start + i + 2);
                let span = Span { start: span.start, end };
                (span, format!("POSIX class '{}' is not supported", &self.source[span.start..span.end]))
            }
            Token::ClassOpen | Token::ClassOpenNegated => {
                (*span, "nested character classes are not supported".to_string())
            }
            Token::Dash | Token::Literal('&' | '~') => match self.tokens.get(at + 1) {
                Some((next, next_span)) if next == tok => {
                    let span = span.merge(*next_span);
                    (span, format!("class set operator '{}' is not supported", &self.source[span.start..span.end]))
                }
                _ => return Ok(()),
            },
            _ => return Ok(()),
        };
        Err(self.error_at("RGX-P013", span, message))
    }

    /// Characters a token stands for inside a class, where operators are
    /// plain characters.
    fn class_chars(&self, tok: &Token, span: Span) -> Result<Vec<char>> {
        Ok(match tok {
            Token::Literal(c) | Token::Escaped(c) | Token::Hex(c) | Token::Control(c) => vec![*c],
            Token::AssertEscape('b') => vec!['\u{8}'],
            Token::AssertEscape(_) | Token::Backref(_) | Token::NamedBackref(_) | Token::ClassEscape(_) => {
                return Err(self.error_at(
                    "RGX-P011",
                    span,
                    format!("'{}' is not allowed in a character class", &self.source[span.start..span.end]),
                ));
            }
            _ => self.source[span.start..span.end].chars().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::program::Category;

    fn parse(source: &str) -> Result<Pattern> {
        let tokens = lex(source).unwrap();
        Parser::new(source, tokens).parse_pattern()
    }

    fn chars(s: &str) -> Node {
        Node::Concat(s.chars().map(Node::Char).collect())
    }

    #[test]
    fn parse_literal_concat() {
        assert_eq!(parse("abc").unwrap().root, chars("abc"));
        assert_eq!(parse("").unwrap().root, Node::Empty);
    }

    #[test]
    fn parse_alternation() {
        let p = parse("ab|c|").unwrap();
        assert_eq!(p.root, Node::Alternate(vec![chars("ab"), Node::Char('c'), Node::Empty]));
    }

    #[test]
    fn parse_quantifiers() {
        let p = parse("a*b+?c{2,5}d{3,}").unwrap();
        let Node::Concat(items) = p.root else { panic!("expected concat") };
        assert_eq!(items[0], Node::Repeat { node: Box::new(Node::Char('a')), min: 0, max: None, lazy: false });
        assert_eq!(items[1], Node::Repeat { node: Box::new(Node::Char('b')), min: 1, max: None, lazy: true });
        assert_eq!(items[2], Node::Repeat { node: Box::new(Node::Char('c')), min: 2, max: Some(5), lazy: false });
        assert_eq!(items[3], Node::Repeat { node: Box::new(Node::Char('d')), min: 3, max: None, lazy: false });
    }

    #[test]
    fn parse_groups_numbered_left_to_right() {
        let p = parse("(a(?<inner>b))(?:c)").unwrap();
        assert_eq!(p.capture_count, 2);
        assert_eq!(p.group_index("inner"), Some(2));
        let Node::Concat(items) = p.root else { panic!("expected concat") };
        match &items[0] {
            Node::Capture { index: 1, node } => match node.as_ref() {
                Node::Concat(inner) => assert!(matches!(inner[1], Node::Capture { index: 2, .. })),
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(items[1], Node::Group(Box::new(Node::Char('c'))));
    }

    #[test]
    fn parse_backrefs() {
        let p = parse(r"(a)\1(?P<x>b)\k<x>").unwrap();
        let Node::Concat(items) = p.root else { panic!("expected concat") };
        assert_eq!(items[1], Node::Backref(1));
        assert_eq!(items[3], Node::Backref(2));

        // forward and self references are left to the generator
        assert!(parse(r"(a\1)").is_ok());

        let err = parse(r"(a)\2").unwrap_err();
        assert_eq!(err.code, "RGX-P007");
        assert_eq!(err.span, Span { start: 3, end: 5 });

        assert_eq!(parse(r"\k<nope>(?<nope>a)").unwrap_err().code, "RGX-P007");
    }

    #[test]
    fn parse_classes() {
        let p = parse(r"[a-c\d_]").unwrap();
        let mut expected = CharClass::range('a', 'c');
        expected.push_range('_', '_');
        expected.push_category(Category::Digit);
        assert_eq!(p.root, Node::Class(expected));

        let Node::Class(c) = parse("[^]a-]").unwrap().root else { panic!("expected class") };
        assert!(c.is_negated());
        assert!(!c.contains(']'));
        assert!(!c.contains('-'));
        assert!(c.contains('b'));

        let Node::Class(c) = parse("[.*+(|)]").unwrap().root else { panic!("expected class") };
        for ch in ".*+(|)".chars() {
            assert!(c.contains(ch), "{ch}");
        }

        let Node::Class(c) = parse(r"[\x80-\xff]").unwrap().root else { panic!("expected class") };
        assert!(c.contains('\u{80}') && c.contains('\u{ff}'));
    }

    #[test]
    fn parse_anchors_and_lookaround() {
        let p = parse(r"^\bfoo(?!x)(?<=o)$").unwrap();
        let Node::Concat(items) = p.root else { panic!("expected concat") };
        assert_eq!(items[0], Node::Assert(Anchor::LineStart));
        assert_eq!(items[1], Node::Assert(Anchor::WordBoundary));
        assert_eq!(
            items[5],
            Node::LookAround { node: Box::new(Node::Char('x')), negative: true, behind: false }
        );
        assert_eq!(
            items[6],
            Node::LookAround { node: Box::new(Node::Char('o')), negative: false, behind: true }
        );
        assert_eq!(items[7], Node::Assert(Anchor::LineEnd));
    }

    #[test]
    fn parse_literal_brace() {
        assert_eq!(parse("a{b").unwrap().root, chars("a{b"));
    }

    #[test]
    fn parse_errors() {
        let cases = [
            ("a)", "RGX-P002"),
            ("(ab", "RGX-P003"),
            ("a**", "RGX-P004"),
            ("*a", "RGX-P005"),
            ("^*", "RGX-P005"),
            ("a{5,2}", "RGX-P006"),
            ("(?<n>a)(?<n>b)", "RGX-P008"),
            ("(?i)a", "RGX-P009"),
            ("[abc", "RGX-P010"),
            (r"[\1]", "RGX-P011"),
            ("[z-a]", "RGX-P012"),
            (r"[a-\d]", "RGX-P012"),
        ];
        for (source, code) in cases {
            match parse(source) {
                Err(e) => assert_eq!(e.code, code, "{source}: {}", e.message),
                Ok(p) => panic!("{source} parsed as {:?}", p.root),
            }
        }
    }

    #[test]
    fn unclosed_group_points_at_opener() {
        let err = parse("x(ab").unwrap_err();
        assert_eq!(err.span, Span { start: 1, end: 2 });
    }

    #[test]
    fn posix_class_is_rejected() {
        let err = parse("^[[:alpha:]]$").unwrap_err();
        assert_eq!(err.code, "RGX-P013");
        assert_eq!(err.span, Span { start: 2, end: 11 });
        assert!(err.message.contains("[:alpha:]"), "{}", err.message);

        assert_eq!(parse("[^[:digit:]x]").unwrap_err().code, "RGX-P013");
    }

    #[test]
    fn nested_class_is_rejected() {
        let err = parse("[a[bc]]").unwrap_err();
        assert_eq!(err.code, "RGX-P013");
        assert_eq!(err.span, Span { start: 2, end: 3 });
        assert_eq!(parse("[!-[]").unwrap_err().code, "RGX-P013");
    }

    #[test]
    fn class_set_operators_are_rejected() {
        for (source, op) in [("[a&&b]", "&&"), ("[a-z--m]", "--"), ("[a~~b]", "~~"), ("[a--b]", "--")] {
            let err = parse(source).unwrap_err();
            assert_eq!(err.code, "RGX-P013", "{source}");
            assert_eq!(&source[err.span.start..err.span.end], op, "{source}");
        }
    }

    #[test]
    fn single_operator_characters_stay_literal() {
        let Node::Class(c) = parse(r"[a&~\[-]").unwrap().root else { panic!("expected class") };
        for ch in ['a', '&', '~', '[', '-'] {
            assert!(c.contains(ch), "{ch}");
        }
        let Node::Class(c) = parse(r"[&\&]").unwrap().root else { panic!("expected class") };
        assert!(c.contains('&'));
    }
}
