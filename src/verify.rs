//! The independent matcher every generated string is checked against.

use crate::config::PatternOptions;

#[derive(Debug, Clone)]
pub struct Matcher {
    backend: fancy_regex::Regex,
}

impl Matcher {
    pub fn new(pattern: &str, options: PatternOptions) -> Result<Self, MatchError> {
        let mut builder = fancy_regex::RegexBuilder::new(pattern);
        builder.case_insensitive(options.case_insensitive);
        builder.multi_line(options.multi_line);
        builder.dot_matches_new_line(options.dot_matches_new_line);
        let backend = builder.build().map_err(MatchError::from)?;
        Ok(Self { backend })
    }

    pub fn is_match(&self, input: &str) -> Result<bool, MatchError> {
        self.backend.is_match(input).map_err(MatchError::from)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct MatchError {
    pub message: String,
}

impl From<fancy_regex::Error> for MatchError {
    fn from(value: fancy_regex::Error) -> Self {
        Self { message: value.to_string() }
    }
}
