use serde::Serialize;

use super::{registry, Diagnostic, Severity};
use crate::ast::SourceMap;

#[derive(Serialize)]
struct JsonDiagnostic<'a> {
    severity: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'static str>,
    message: &'a str,
    labels: Vec<JsonLabel<'a>>,
    notes: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    suggestion: Option<&'a str>,
}

#[derive(Serialize)]
struct JsonLabel<'a> {
    start: usize,
    end: usize,
    message: &'a str,
    primary: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    col: Option<usize>,
    /// Pattern text under the span.
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

/// One diagnostic as a single JSON line.
pub fn render(d: &Diagnostic) -> String {
    let source = d.source.as_deref();
    let map = source.map(SourceMap::new);

    let labels = d
        .labels
        .iter()
        .map(|l| {
            let (line, col) = match &map {
                Some(m) => {
                    let (line, col) = m.lookup(l.span.start);
                    (Some(line), Some(col))
                }
                None => (None, None),
            };
            JsonLabel {
                start: l.span.start,
                end: l.span.end,
                message: &l.message,
                primary: l.is_primary,
                line,
                col,
                text: source.and_then(|s| s.get(l.span.start..l.span.end)),
            }
        })
        .collect();

    let out = JsonDiagnostic {
        severity: match d.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        },
        code: d.code,
        title: d.code.and_then(registry::lookup).map(|e| e.short),
        message: &d.message,
        labels,
        notes: &d.notes,
        suggestion: d.suggestion.as_deref(),
    };

    serde_json::to_string(&out)
        .unwrap_or_else(|_| r#"{"severity":"error","message":"internal error serializing diagnostic"}"#.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Span;

    fn parse_json(s: &str) -> serde_json::Value {
        serde_json::from_str(s).expect("valid JSON")
    }

    #[test]
    fn render_basic_error() {
        let d = Diagnostic::error("no admissible character");
        let out = render(&d);
        let v = parse_json(&out);
        assert_eq!(v["severity"], "error");
        assert_eq!(v["message"], "no admissible character");
        assert!(v["labels"].as_array().unwrap().is_empty());
        assert!(v.get("code").is_none());
    }

    #[test]
    fn render_with_span_and_source() {
        let d = Diagnostic::error("bad token")
            .with_span(Span { start: 2, end: 5 }, "here")
            .with_source("ab{5,2}".to_string());
        let out = render(&d);
        let v = parse_json(&out);
        let label = &v["labels"][0];
        assert_eq!(label["start"], 2);
        assert_eq!(label["end"], 5);
        assert_eq!(label["primary"], true);
        assert_eq!(label["line"], 1);
        assert_eq!(label["col"], 3);
        assert_eq!(label["text"], "{5,");
    }

    #[test]
    fn render_with_suggestion() {
        let d = Diagnostic::error("bad")
            .with_suggestion("try this instead");
        let out = render(&d);
        let v = parse_json(&out);
        assert_eq!(v["suggestion"], "try this instead");
    }

    #[test]
    fn render_with_notes() {
        let d = Diagnostic::error("bad")
            .with_note("at offset 3")
            .with_note("class [0-9]");
        let out = render(&d);
        let v = parse_json(&out);
        let notes = v["notes"].as_array().unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0], "at offset 3");
    }

    #[test]
    fn render_no_suggestion_key_absent() {
        let d = Diagnostic::error("bad");
        let out = render(&d);
        let v = parse_json(&out);
        assert!(v.get("suggestion").is_none());
    }

    #[test]
    fn render_label_without_source_no_line_col() {
        let d = Diagnostic::error("bad")
            .with_span(Span { start: 5, end: 8 }, "here");
        let out = render(&d);
        let v = parse_json(&out);
        let label = &v["labels"][0];
        assert!(label.get("line").is_none());
        assert!(label.get("col").is_none());
        assert!(label.get("text").is_none());
    }

    #[test]
    fn render_is_valid_json() {
        let d = Diagnostic::error("complex error")
            .with_span(Span { start: 0, end: 5 }, "primary")
            .with_secondary_span(Span { start: 10, end: 12 }, "secondary")
            .with_note("some note")
            .with_suggestion("fix it")
            .with_source("(a|b)*c{2}d".to_string());
        let out = render(&d);
        // Must be parseable JSON
        parse_json(&out);
    }

    #[test]
    fn render_with_code() {
        let d = Diagnostic::error("unresolved backreference").with_code("RGX-G002");
        let v = parse_json(&render(&d));
        assert_eq!(v["code"], "RGX-G002");
        assert_eq!(v["title"], "unresolved backreference");
    }

    #[test]
    fn unregistered_code_has_no_title() {
        let d = Diagnostic::error("bad").with_code("RGX-X999");
        let v = parse_json(&render(&d));
        assert_eq!(v["code"], "RGX-X999");
        assert!(v.get("title").is_none());
    }

    #[test]
    fn render_warning_severity() {
        let mut d = Diagnostic::error("alphabet has one character");
        d.severity = Severity::Warning;
        let out = render(&d);
        let v = parse_json(&out);
        assert_eq!(v["severity"], "warning");
    }
}
