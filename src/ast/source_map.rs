/// Line starts of a pattern source, for turning byte offsets into
/// 1-based line/column pairs.
pub struct SourceMap {
    line_starts: Vec<usize>,
}

impl SourceMap {
    pub fn new(source: &str) -> Self {
        let breaks = source.match_indices('\n').map(|(i, _)| i + 1);
        SourceMap { line_starts: std::iter::once(0).chain(breaks).collect() }
    }

    /// (line, col), both 1-based; the column counts bytes.
    pub fn lookup(&self, offset: usize) -> (usize, usize) {
        let line = self.line_starts.partition_point(|&start| start <= offset).max(1);
        (line, offset - self.line_starts[line - 1] + 1)
    }

    /// Text of a 1-based line without its line terminator; empty when out of range.
    pub fn line_text<'a>(&self, source: &'a str, line: usize) -> &'a str {
        let Some(&start) = line.checked_sub(1).and_then(|i| self.line_starts.get(i)) else {
            return "";
        };
        let end = self.line_starts.get(line).map_or(source.len(), |&next| next);
        source.get(start..end).unwrap_or("").trim_end_matches('\n').trim_end_matches('\r')
    }
}
