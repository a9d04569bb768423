//! Pattern in, matching string out.
//!
//! The pattern is first handed to the verifying matcher, so a pattern the
//! matcher cannot read is rejected before anything is compiled. The compiled
//! program then runs through the interpreter and its output is matched back
//! against the pattern.

use crate::compiler::{compile_pattern, CompileError};
use crate::config::{GenerationConfig, PatternOptions};
use crate::interpreter::{generate, GenerationError};
use crate::program::Program;
use crate::verify::{MatchError, Matcher};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid pattern: {0}")]
    PatternInvalid(MatchError),
    #[error("cannot compile pattern: {0}")]
    ProgramCompilationFailed(#[from] CompileError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error("generated string {output:?} does not match the pattern")]
    GeneratedStringDoesNotMatch { output: String },
    #[error("matcher failed: {0}")]
    Matcher(MatchError),
}

pub struct Generator {
    pattern: String,
    matcher: Matcher,
    program: Program,
}

impl Generator {
    pub fn new(pattern: &str) -> Result<Self, Error> {
        Self::with_options(pattern, PatternOptions::default())
    }

    pub fn with_options(pattern: &str, options: PatternOptions) -> Result<Self, Error> {
        let matcher = Matcher::new(pattern, options).map_err(Error::PatternInvalid)?;
        let program = compile_pattern(pattern, options)?;
        Ok(Generator { pattern: pattern.to_string(), matcher, program })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// One attempt. Retrying with another seed is up to the caller.
    pub fn generate(&self, config: &GenerationConfig) -> Result<String, Error> {
        let output = generate(&self.program, config)?;
        if !self.matcher.is_match(&output).map_err(Error::Matcher)? {
            return Err(Error::GeneratedStringDoesNotMatch { output });
        }
        Ok(output)
    }
}
