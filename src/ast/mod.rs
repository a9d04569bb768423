use serde::{Deserialize, Serialize};

use crate::program::CharClass;

pub mod source_map;
pub use source_map::SourceMap;

// ---- Span infrastructure ----

/// Byte range within the pattern text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const UNKNOWN: Span = Span { start: 0, end: 0 };

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl From<std::ops::Range<usize>> for Span {
    fn from(r: std::ops::Range<usize>) -> Self {
        Span { start: r.start, end: r.end }
    }
}

// ---- Pattern syntax tree ----

/// Zero-width assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Anchor {
    /// `^`
    LineStart,
    /// `$`
    LineEnd,
    /// `\A`
    TextStart,
    /// `\z`
    TextEnd,
    /// `\Z`
    TextEndNewline,
    /// `\G`
    Continue,
    /// `\b`
    WordBoundary,
    /// `\B`
    NotWordBoundary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Empty,
    Char(char),
    /// `.`
    Any,
    Class(CharClass),
    Concat(Vec<Node>),
    Alternate(Vec<Node>),
    /// `(?:...)`
    Group(Box<Node>),
    Capture { index: usize, node: Box<Node> },
    Repeat { node: Box<Node>, min: u32, max: Option<u32>, lazy: bool },
    Backref(usize),
    Assert(Anchor),
    LookAround { node: Box<Node>, negative: bool, behind: bool },
}

impl Node {
    /// Whether the node can stand under a quantifier.
    pub fn is_repeatable(&self) -> bool {
        !matches!(self, Node::Empty | Node::Assert(_) | Node::Repeat { .. } | Node::LookAround { .. })
    }

    /// A single character, possibly inside non-capturing groups.
    pub fn as_char(&self) -> Option<char> {
        match self {
            Node::Char(c) => Some(*c),
            Node::Group(inner) => inner.as_char(),
            _ => None,
        }
    }
}

/// A parsed pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub root: Node,
    /// Number of capture groups, not counting the implicit group 0.
    pub capture_count: usize,
    /// Named groups and their indices, in order of appearance.
    pub names: Vec<(String, usize)>,
}

impl Pattern {
    pub fn group_index(&self, name: &str) -> Option<usize> {
        self.names.iter().find(|(n, _)| n == name).map(|(_, i)| *i)
    }
}
