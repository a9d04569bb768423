pub mod ansi;
pub mod json;
pub mod registry;

use crate::ast::Span;
use crate::compiler::CompileError;
use crate::generator::Error;
use crate::interpreter::GenerationError;
use crate::program::ProgramError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Severity {
    Error,
    #[allow(dead_code)] // no warning diagnostics are produced yet
    Warning,
}

#[derive(Debug, Clone)]
pub struct Label {
    pub span: Span,
    pub message: String,
    pub is_primary: bool,
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Option<&'static str>,
    pub message: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
    pub suggestion: Option<String>,
    pub source: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
            suggestion: None,
            source: None,
        }
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_span(mut self, span: Span, label: impl Into<String>) -> Self {
        self.labels.push(Label { span, message: label.into(), is_primary: true });
        self
    }

    #[allow(dead_code)]
    pub fn with_secondary_span(mut self, span: Span, label: impl Into<String>) -> Self {
        self.labels.push(Label { span, message: label.into(), is_primary: false });
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

// ---- From impls for the crate's error types ----

impl From<&crate::lexer::LexError> for Diagnostic {
    fn from(e: &crate::lexer::LexError) -> Self {
        let span = Span {
            start: e.position,
            end: e.position + e.snippet.len().max(1),
        };
        let mut d = Diagnostic::error(format!("unexpected '{}'", e.snippet))
            .with_code("RGX-L001")
            .with_span(span, "here");
        if !e.suggestion.is_empty() {
            d = d.with_suggestion(e.suggestion.clone());
        }
        d
    }
}

impl From<&crate::parser::ParseError> for Diagnostic {
    fn from(e: &crate::parser::ParseError) -> Self {
        let mut d = Diagnostic::error(&e.message).with_code(e.code).with_span(e.span, "here");
        if let Some(hint) = registry::lookup(e.code).and_then(|entry| entry.hint) {
            d = d.with_suggestion(hint);
        }
        d
    }
}

impl From<&ProgramError> for Diagnostic {
    fn from(e: &ProgramError) -> Self {
        let code = match e {
            ProgramError::UnknownOpcode { .. } => "RGX-C001",
            ProgramError::Truncated { .. } => "RGX-C002",
            ProgramError::InvalidClassIndex { .. } | ProgramError::InvalidStringIndex { .. } => "RGX-C003",
            ProgramError::InvalidCharacter { .. } => "RGX-C004",
            ProgramError::NegativeCount { .. } => "RGX-C005",
            ProgramError::InvalidJumpTarget { .. } => "RGX-C006",
        };
        Diagnostic::error(e.to_string()).with_code(code)
    }
}

impl From<&GenerationError> for Diagnostic {
    fn from(e: &GenerationError) -> Self {
        let code = match e {
            GenerationError::NoAdmissibleCharacter { .. } => "RGX-G001",
            GenerationError::UnresolvedBackreference { .. } => "RGX-G002",
            GenerationError::EmptyLoopCountStack { .. } => "RGX-G003",
            GenerationError::EmptyMarkStack { .. } => "RGX-G004",
            GenerationError::UnterminatedLookaround { .. } => "RGX-G005",
            GenerationError::Program(inner) => return Diagnostic::from(inner),
        };
        let d = Diagnostic::error(e.to_string()).with_code(code);
        match e {
            GenerationError::NoAdmissibleCharacter { .. } => {
                d.with_suggestion("widen the alphabet with --alphabet so it overlaps the class")
            }
            GenerationError::UnresolvedBackreference { .. } => {
                d.with_note("the referenced group must close before the reference is reached")
            }
            _ => d,
        }
    }
}

impl From<&CompileError> for Diagnostic {
    fn from(e: &CompileError) -> Self {
        match e {
            CompileError::Lex(e) => Diagnostic::from(e),
            CompileError::Parse(e) => Diagnostic::from(e),
            CompileError::Program(e) => Diagnostic::from(e),
        }
    }
}

impl From<&Error> for Diagnostic {
    fn from(e: &Error) -> Self {
        match e {
            Error::PatternInvalid(m) => {
                Diagnostic::error(format!("invalid pattern: {}", m.message)).with_code("RGX-V001")
            }
            Error::ProgramCompilationFailed(e) => Diagnostic::from(e),
            Error::Generation(e) => Diagnostic::from(e),
            Error::GeneratedStringDoesNotMatch { output } => {
                Diagnostic::error(format!("generated string {output:?} does not match the pattern"))
                    .with_code("RGX-V002")
                    .with_note("choices are made greedily without backtracking")
                    .with_suggestion("retry with other seeds using --attempts")
            }
            Error::Matcher(m) => Diagnostic::error(format!("matcher failed: {}", m.message)).with_code("RGX-V003"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Span;
    use crate::program::Opcode;

    #[test]
    fn diagnostic_error_builder() {
        let d = Diagnostic::error("something went wrong");
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.message, "something went wrong");
        assert!(d.code.is_none());
        assert!(d.labels.is_empty());
        assert!(d.notes.is_empty());
        assert!(d.suggestion.is_none());
    }

    #[test]
    fn diagnostic_with_span() {
        let d = Diagnostic::error("bad token")
            .with_span(Span { start: 5, end: 8 }, "here");
        assert_eq!(d.labels.len(), 1);
        assert_eq!(d.labels[0].span.start, 5);
        assert_eq!(d.labels[0].span.end, 8);
        assert!(d.labels[0].is_primary);
    }

    #[test]
    fn diagnostic_with_note_and_suggestion() {
        let d = Diagnostic::error("no admissible character")
            .with_note("at offset 3")
            .with_suggestion("widen the alphabet");
        assert_eq!(d.notes, vec!["at offset 3"]);
        assert_eq!(d.suggestion.as_deref(), Some("widen the alphabet"));
    }

    #[test]
    fn from_lex_error() {
        let e = crate::lexer::LexError {
            position: 3,
            snippet: "\\q".to_string(),
            suggestion: "Unknown escape '\\q'".to_string(),
        };
        let d = Diagnostic::from(&e);
        assert_eq!(d.code, Some("RGX-L001"));
        assert!(d.message.contains("\\q"));
        assert_eq!(d.labels[0].span.start, 3);
        assert_eq!(d.labels[0].span.end, 5);
        assert!(d.suggestion.is_some());
    }

    #[test]
    fn from_parse_error() {
        let e = crate::parser::ParseError {
            code: "RGX-P004",
            position: 2,
            span: Span { start: 2, end: 3 },
            message: "nested quantifier".to_string(),
        };
        let d = Diagnostic::from(&e);
        assert_eq!(d.code, Some("RGX-P004"));
        assert!(d.message.contains("nested quantifier"));
        assert_eq!(d.labels[0].span, Span { start: 2, end: 3 });
        assert!(d.suggestion.is_some());
    }

    #[test]
    fn from_generation_errors() {
        let e = GenerationError::NoAdmissibleCharacter { offset: 4, opcode: Opcode::Set };
        let d = Diagnostic::from(&e);
        assert_eq!(d.code, Some("RGX-G001"));
        assert!(d.message.contains("offset 4"));
        assert!(d.labels.is_empty());

        let e = GenerationError::Program(ProgramError::UnknownOpcode { offset: 0, code: 99 });
        assert_eq!(Diagnostic::from(&e).code, Some("RGX-C001"));
    }

    #[test]
    fn from_pipeline_error() {
        let e = Error::GeneratedStringDoesNotMatch { output: "abc".into() };
        let d = Diagnostic::from(&e);
        assert_eq!(d.code, Some("RGX-V002"));
        assert!(d.message.contains("\"abc\""));
    }

    #[test]
    fn every_code_is_registered() {
        let codes = [
            Diagnostic::from(&GenerationError::EmptyLoopCountStack { offset: 0, opcode: Opcode::Branchcount }),
            Diagnostic::from(&GenerationError::UnterminatedLookaround { offset: 0 }),
            Diagnostic::from(&ProgramError::Truncated { offset: 0, opcode: Opcode::One }),
            Diagnostic::from(&Error::GeneratedStringDoesNotMatch { output: String::new() }),
        ];
        for d in codes {
            let code = d.code.unwrap();
            assert!(registry::lookup(code).is_some(), "{code} missing from registry");
        }
    }
}
