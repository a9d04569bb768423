use std::collections::HashMap;

/// Nested output segments. The bottom segment is the final output; each
/// open group writes into its own segment until it closes.
#[derive(Debug, Default)]
pub struct MarkStack {
    current: String,
    parents: Vec<String>,
    captures: HashMap<i32, String>,
}

/// Popped with no group open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyMarks;

impl MarkStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_char(&mut self, c: char) {
        self.current.push(c);
    }

    pub fn push_str(&mut self, s: &str) {
        self.current.push_str(s);
    }

    pub fn buffer(&mut self) -> &mut String {
        &mut self.current
    }

    /// Open a group.
    pub fn push(&mut self) {
        let parent = std::mem::take(&mut self.current);
        self.parents.push(parent);
    }

    /// Close the innermost group, appending its text to the parent. With
    /// `capture`, a copy is also remembered under that group index.
    pub fn pop(&mut self, capture: Option<i32>) -> Result<(), EmptyMarks> {
        let parent = self.parents.pop().ok_or(EmptyMarks)?;
        let segment = std::mem::replace(&mut self.current, parent);
        self.current.push_str(&segment);
        if let Some(index) = capture {
            self.captures.insert(index, segment);
        }
        Ok(())
    }

    pub fn capture(&self, index: i32) -> Option<&str> {
        self.captures.get(&index).map(String::as_str)
    }

    /// Collapse any groups still open and return the output.
    pub fn finish(mut self) -> String {
        while self.pop(None).is_ok() {}
        self.current
    }
}
