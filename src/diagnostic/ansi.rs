use super::{registry, Diagnostic, Severity};
use crate::ast::SourceMap;

const BOLD: &str = "1";
const BOLD_RED: &str = "1;31";
const CYAN: &str = "36";
const DIM: &str = "2";

/// Renders diagnostics for a terminal, optionally with ANSI colors.
pub struct AnsiRenderer {
    pub use_color: bool,
}

impl AnsiRenderer {
    fn paint(&self, style: &str, s: &str) -> String {
        if self.use_color { format!("\x1b[{style}m{s}\x1b[0m") } else { s.to_string() }
    }

    pub fn render(&self, d: &Diagnostic) -> String {
        let mut out = String::new();

        let severity = match d.severity {
            Severity::Error => self.paint(BOLD_RED, "error"),
            Severity::Warning => self.paint(CYAN, "warning"),
        };
        let code = d.code.map(|c| self.paint(BOLD_RED, &format!("[{c}]"))).unwrap_or_default();
        out.push_str(&format!("{severity}{code}: {}\n", self.paint(BOLD, &d.message)));

        let primary = d.labels.iter().find(|l| l.is_primary);
        if let (Some(label), Some(source)) = (primary, &d.source) {
            let map = SourceMap::new(source);
            let (line, col) = map.lookup(label.span.start);
            let line_text = map.line_text(source, line);

            out.push_str(&format!("  {} {line}:{col}\n", self.paint(CYAN, "-->")));

            let gutter = line.to_string().len();
            let pipe = self.paint(CYAN, "|");
            let pad = " ".repeat(gutter);
            let line_num = self.paint(CYAN, &format!("{line:>gutter$}"));

            // columns are bytes, carets are drawn per character
            let byte_col = col - 1;
            let indent = line_text.get(..byte_col).map_or(byte_col, |p| p.chars().count());
            let width = source
                .get(label.span.start..label.span.end)
                .map_or(label.span.end.saturating_sub(label.span.start), |t| t.chars().count())
                .max(1);
            let carets = self.paint(BOLD_RED, &"^".repeat(width));

            out.push_str(&format!("{pad} {pipe}\n"));
            out.push_str(&format!("{line_num} {pipe} {line_text}\n"));
            out.push_str(&format!("{pad} {pipe} {}{carets}", " ".repeat(indent)));
            if !label.message.is_empty() {
                out.push_str(&format!(" {}", self.paint(BOLD_RED, &label.message)));
            }
            out.push('\n');
            out.push_str(&format!("{pad} {pipe}\n"));
        }

        let eq = self.paint(DIM, "=");
        for label in d.labels.iter().filter(|l| !l.is_primary && !l.message.is_empty()) {
            out.push_str(&format!("  {eq} {}\n", label.message));
        }
        for note in &d.notes {
            out.push_str(&format!("  {eq} note: {note}\n"));
        }
        if let Some(suggestion) = &d.suggestion {
            out.push_str(&format!("  {eq} suggestion: {suggestion}\n"));
        }
        if let Some(code) = d.code.filter(|c| registry::lookup(c).is_some()) {
            out.push_str(&format!("  {eq} help: run `regexgen --explain {code}` for details\n"));
        }

        out
    }
}
