//! Indentation-aware text accumulation.
//!
//! Indentation is applied lazily: the active prefix is emitted right before
//! the first content written on a line, so blank lines never carry trailing
//! whitespace. A blank line inside a non-whitespace prefix such as `"> "`
//! keeps the prefix's visible part (`">"`), which keeps block quotes intact
//! across paragraph breaks.

/// A string sink with an indentation stack and newline bookkeeping.
#[derive(Debug, Default)]
pub struct IndentedWriter {
    buffer: String,
    indents: Vec<String>,
    indent: String,
    /// No content has been written on the current line yet.
    at_line_start: bool,
    /// The most recently terminated line had no content.
    previous_line_blank: bool,
    /// Byte offset where the current line's content begins (after indent).
    line_content_start: usize,
}

impl IndentedWriter {
    pub fn new() -> Self {
        Self {
            at_line_start: true,
            ..Self::default()
        }
    }

    /// Append `text` verbatim, inserting the indent prefix at each line start.
    pub fn write(&mut self, text: &str) {
        for (i, segment) in text.split('\n').enumerate() {
            if i > 0 {
                self.write_newline();
            }
            if !segment.is_empty() {
                self.write_segment(segment);
            }
        }
    }

    /// Append `text` followed by a newline.
    pub fn write_line(&mut self, text: &str) {
        self.write(text);
        self.write_newline();
    }

    /// Append a newline unless the buffer is empty or already ends one.
    pub fn ensure_new_line(&mut self) {
        if !self.at_line_start {
            self.write_newline();
        }
    }

    /// Guarantee exactly one blank line between prior content and what
    /// follows. Idempotent.
    pub fn ensure_skipped_line(&mut self) {
        self.ensure_new_line();
        if !self.previous_line_blank {
            self.write_newline();
        }
    }

    /// Run `f` with `prefix` appended to the indentation stack.
    pub fn with_indent<R>(&mut self, prefix: &str, f: impl FnOnce(&mut Self) -> R) -> R {
        self.push_indent(prefix);
        let result = f(self);
        self.pop_indent();
        result
    }

    pub(crate) fn push_indent(&mut self, prefix: &str) {
        self.indents.push(prefix.to_string());
        self.indent.push_str(prefix);
    }

    pub(crate) fn pop_indent(&mut self) {
        if let Some(prefix) = self.indents.pop() {
            let len = self.indent.len() - prefix.len();
            self.indent.truncate(len);
        }
    }

    /// True when nothing but spaces has been written since the last newline.
    pub fn current_line_is_blank(&self) -> bool {
        self.at_line_start
            || self.buffer[self.line_content_start..]
                .chars()
                .all(|c| c == ' ')
    }

    pub fn at_line_start(&self) -> bool {
        self.at_line_start
    }

    pub fn peek_last_char(&self) -> Option<char> {
        self.buffer.chars().next_back()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn into_string(self) -> String {
        self.buffer
    }

    fn write_segment(&mut self, segment: &str) {
        if self.at_line_start {
            self.buffer.push_str(&self.indent);
            self.line_content_start = self.buffer.len();
            self.at_line_start = false;
        }
        self.buffer.push_str(segment);
    }

    fn write_newline(&mut self) {
        self.previous_line_blank = self.at_line_start;
        if self.at_line_start {
            self.buffer.push_str(self.indent.trim_end());
        }
        self.buffer.push('\n');
        self.at_line_start = true;
        self.line_content_start = self.buffer.len();
    }
}
