use std::fmt;

use serde::{Deserialize, Serialize};

/// Inclusive character range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassRange {
    pub start: char,
    pub end: char,
}

impl ClassRange {
    pub fn contains(self, c: char) -> bool {
        self.start <= c && c <= self.end
    }
}

/// Shorthand classes (`\d`, `\w`, `\s` and their negations).
///
/// Membership is conservative in both directions: a character counts as a
/// member only when every common regex flavor agrees, so a negated class
/// built from a category never admits a character the matcher would reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Digit,
    NotDigit,
    Word,
    NotWord,
    Space,
    NotSpace,
}

impl Category {
    /// Definitely a member.
    fn surely(self, c: char) -> bool {
        match self {
            Category::Digit => c.is_ascii_digit(),
            Category::NotDigit => !c.is_numeric(),
            Category::Word => c.is_ascii_alphanumeric() || c == '_',
            Category::NotWord => c.is_ascii() && !(c.is_ascii_alphanumeric() || c == '_'),
            Category::Space => c.is_whitespace(),
            Category::NotSpace => !c.is_whitespace(),
        }
    }

    /// Possibly a member.
    fn maybe(self, c: char) -> bool {
        match self {
            Category::Digit => c.is_numeric(),
            Category::NotDigit => !c.is_ascii_digit(),
            Category::Word => c.is_ascii_alphanumeric() || c == '_' || !c.is_ascii(),
            Category::NotWord => !(c.is_ascii_alphanumeric() || c == '_'),
            Category::Space => c.is_whitespace(),
            Category::NotSpace => !c.is_whitespace(),
        }
    }

    pub fn escape(self) -> &'static str {
        match self {
            Category::Digit => "\\d",
            Category::NotDigit => "\\D",
            Category::Word => "\\w",
            Category::NotWord => "\\W",
            Category::Space => "\\s",
            Category::NotSpace => "\\S",
        }
    }
}

/// A character-class predicate: sorted, merged ranges plus categories,
/// optionally negated.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CharClass {
    #[serde(default)]
    negated: bool,
    #[serde(default)]
    ranges: Vec<ClassRange>,
    #[serde(default)]
    categories: Vec<Category>,
}

impl CharClass {
    pub fn new(negated: bool, ranges: Vec<ClassRange>, categories: Vec<Category>) -> Self {
        let mut class = CharClass { negated, ranges, categories };
        class.normalize();
        class
    }

    pub fn single(c: char) -> Self {
        Self::range(c, c)
    }

    pub fn range(start: char, end: char) -> Self {
        Self::new(false, vec![ClassRange { start, end }], vec![])
    }

    /// `[^c]`
    pub fn not_char(c: char) -> Self {
        Self::new(true, vec![ClassRange { start: c, end: c }], vec![])
    }

    pub fn category(cat: Category) -> Self {
        Self::new(false, vec![], vec![cat])
    }

    /// Every character (dot-all `.`).
    pub fn any() -> Self {
        Self::new(true, vec![], vec![])
    }

    pub fn push_range(&mut self, start: char, end: char) {
        self.ranges.push(ClassRange { start, end });
        self.normalize();
    }

    pub fn push_category(&mut self, cat: Category) {
        if !self.categories.contains(&cat) {
            self.categories.push(cat);
        }
    }

    pub fn negate(&mut self) {
        self.negated = !self.negated;
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    pub fn ranges(&self) -> &[ClassRange] {
        &self.ranges
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    fn normalize(&mut self) {
        for r in &mut self.ranges {
            if r.start > r.end {
                std::mem::swap(&mut r.start, &mut r.end);
            }
        }
        self.ranges.sort();
        let mut merged: Vec<ClassRange> = Vec::with_capacity(self.ranges.len());
        for r in self.ranges.drain(..) {
            match merged.last_mut() {
                Some(last) if next_char(last.end).is_none_or(|n| r.start <= n) => {
                    if r.end > last.end {
                        last.end = r.end;
                    }
                }
                _ => merged.push(r),
            }
        }
        self.ranges = merged;
    }

    pub fn contains(&self, c: char) -> bool {
        let in_ranges = self.ranges.iter().any(|r| r.contains(c));
        if self.negated {
            !(in_ranges || self.categories.iter().any(|cat| cat.maybe(c)))
        } else {
            in_ranges || self.categories.iter().any(|cat| cat.surely(c))
        }
    }

    /// A concrete member, independent of any alphabet.
    ///
    /// Only category-free classes have one: the lowest member of a positive
    /// class, or the lowest character from U+0020 up that a negated class
    /// leaves out.
    pub fn witness(&self) -> Option<char> {
        if !self.categories.is_empty() {
            return None;
        }
        if !self.negated {
            return self.ranges.first().map(|r| r.start);
        }
        let mut candidate = ' ';
        for r in &self.ranges {
            if r.end < candidate {
                continue;
            }
            if r.start > candidate {
                break;
            }
            candidate = next_char(r.end)?;
        }
        Some(candidate)
    }
}

fn next_char(c: char) -> Option<char> {
    match c {
        '\u{D7FF}' => Some('\u{E000}'),
        _ => char::from_u32(c as u32 + 1),
    }
}

fn write_class_char(f: &mut fmt::Formatter<'_>, c: char) -> fmt::Result {
    match c {
        '\\' | ']' | '[' | '^' | '-' => write!(f, "\\{c}"),
        '\n' => f.write_str("\\n"),
        '\r' => f.write_str("\\r"),
        '\t' => f.write_str("\\t"),
        c if c.is_control() || (c as u32) > 0x7e => write!(f, "\\u{{{:04X}}}", c as u32),
        c => write!(f, "{c}"),
    }
}

impl fmt::Display for CharClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.negated { "[^" } else { "[" })?;
        for r in &self.ranges {
            write_class_char(f, r.start)?;
            if r.end != r.start {
                f.write_str("-")?;
                write_class_char(f, r.end)?;
            }
        }
        for cat in &self.categories {
            f.write_str(cat.escape())?;
        }
        f.write_str("]")
    }
}
