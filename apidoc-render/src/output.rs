//! The rendering target: an [`IndentedWriter`] plus a set of scoped modes.
//!
//! Each mode is a boolean flag exposed through a `with_*` method that saves
//! the current value, sets it, runs the closure, and restores the saved value
//! whether the closure succeeded or returned an error. Nested renders
//! therefore never leak modes into their siblings.

use crate::error::{RenderError, Result};
use crate::escape::EscapeContext;
use crate::writer::IndentedWriter;

/// A scoped rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Writing into a Markdown table cell.
    Table,
    /// No literal newline may be written.
    SingleLine,
    /// Inside a still-open block-level HTML tag.
    HtmlBlockTag,
    /// Inside a code span or fenced block: prose escaping is off.
    MarkdownCode,
    /// Inside a `<code>` run that stands in for a multi-line code block.
    SingleLineCodeBlock,
    /// Inside a `<pre>` block: HTML escaping on, newlines literal.
    Preformatted,
    /// Rendering the content of a list item.
    ListNode,
    /// Inside a quoted HTML attribute value.
    HtmlAttribute,
    /// The current line is parsed as inline Markdown, even between HTML tags.
    InlineMarkdown,
}

#[derive(Debug, Clone, Copy, Default)]
struct Modes {
    table: bool,
    single_line: bool,
    html_block_tag: bool,
    markdown_code: bool,
    single_line_code_block: bool,
    preformatted: bool,
    list_node: bool,
    html_attribute: bool,
    inline_markdown: bool,
}

impl Modes {
    fn flag(&mut self, mode: Mode) -> &mut bool {
        match mode {
            Mode::Table => &mut self.table,
            Mode::SingleLine => &mut self.single_line,
            Mode::HtmlBlockTag => &mut self.html_block_tag,
            Mode::MarkdownCode => &mut self.markdown_code,
            Mode::SingleLineCodeBlock => &mut self.single_line_code_block,
            Mode::Preformatted => &mut self.preformatted,
            Mode::ListNode => &mut self.list_node,
            Mode::HtmlAttribute => &mut self.html_attribute,
            Mode::InlineMarkdown => &mut self.inline_markdown,
        }
    }
}

/// Markdown text sink with rendering modes and paragraph-break bookkeeping.
#[derive(Debug)]
pub struct MarkdownOutput {
    writer: IndentedWriter,
    modes: Modes,
    new_paragraph: bool,
}

impl Default for MarkdownOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownOutput {
    pub fn new() -> Self {
        Self {
            writer: IndentedWriter::new(),
            modes: Modes::default(),
            new_paragraph: false,
        }
    }

    // ------------------------------------------------------------------
    // Writing
    // ------------------------------------------------------------------

    /// Append `text`. Fails if it contains a newline while constrained to a
    /// single line.
    pub fn write(&mut self, text: &str) -> Result<()> {
        if self.constrained_to_single_line() && text.contains('\n') {
            return Err(RenderError::NewlineInSingleLine {
                text: text.to_string(),
            });
        }
        if text.chars().any(|c| !c.is_whitespace()) {
            self.new_paragraph = false;
        }
        self.writer.write(text);
        Ok(())
    }

    pub fn write_line(&mut self, text: &str) -> Result<()> {
        self.write(text)?;
        self.write("\n")
    }

    /// Append a newline unless already at the start of a line.
    pub fn ensure_new_line(&mut self) -> Result<()> {
        if self.writer.at_line_start() {
            return Ok(());
        }
        self.write("\n")
    }

    /// Guarantee one blank line before whatever is written next.
    pub fn ensure_skipped_line(&mut self) -> Result<()> {
        if self.constrained_to_single_line() {
            return Err(RenderError::ParagraphBreakInSingleLine);
        }
        self.writer.ensure_skipped_line();
        Ok(())
    }

    /// Run `f` with `prefix` added to the indentation of every new line.
    pub fn with_indent<T>(
        &mut self,
        prefix: &str,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.writer.push_indent(prefix);
        let result = f(self);
        self.writer.pop_indent();
        result
    }

    /// Run `f` as a new block: one blank line is inserted first, unless a
    /// fresh block has just been marked and nothing has been written into it.
    ///
    /// Content after a blank line is parsed as Markdown again even inside an
    /// open HTML block, so the HTML-block mode is cleared for `f`.
    pub fn with_paragraph_break<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.constrained_to_single_line() {
            return Err(RenderError::ParagraphBreakInSingleLine);
        }
        if self.new_paragraph {
            return f(self);
        }
        self.writer.ensure_skipped_line();
        self.with_mode(Mode::HtmlBlockTag, false, |out| {
            out.mark_start_of_paragraph();
            f(out)
        })
    }

    /// Flag that a fresh block has begun. Consumed by the next write of
    /// non-whitespace text.
    pub fn mark_start_of_paragraph(&mut self) {
        self.new_paragraph = true;
    }

    pub fn is_marked_new_paragraph(&self) -> bool {
        self.new_paragraph
    }

    // ------------------------------------------------------------------
    // Modes
    // ------------------------------------------------------------------

    /// Run `f` with `mode` set to `value`, restoring the previous value on
    /// every exit path.
    pub fn with_mode<T>(
        &mut self,
        mode: Mode,
        value: bool,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let saved = std::mem::replace(self.modes.flag(mode), value);
        let result = f(self);
        *self.modes.flag(mode) = saved;
        result
    }

    /// Table cells are always inline Markdown, whatever HTML wraps them.
    pub fn with_in_table<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.with_mode(Mode::InlineMarkdown, true, |out| {
            out.with_mode(Mode::Table, true, f)
        })
    }

    /// A single line opened outside an HTML block is a Markdown line, so
    /// HTML fallbacks written into it still need Markdown escaping.
    pub fn with_in_single_line<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let inline_markdown = self.modes.inline_markdown || !self.modes.html_block_tag;
        self.with_mode(Mode::InlineMarkdown, inline_markdown, |out| {
            out.with_mode(Mode::SingleLine, true, f)
        })
    }

    pub fn with_in_html_block_tag<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.with_mode(Mode::HtmlBlockTag, true, f)
    }

    pub fn with_in_markdown_code<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.with_mode(Mode::MarkdownCode, true, f)
    }

    pub fn with_in_single_line_code_block<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.with_mode(Mode::SingleLineCodeBlock, true, f)
    }

    pub fn with_in_preformatted<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.with_mode(Mode::Preformatted, true, f)
    }

    pub fn with_in_list_node<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.with_mode(Mode::ListNode, true, f)
    }

    pub fn with_in_html_attribute<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.with_mode(Mode::HtmlAttribute, true, f)
    }

    pub fn in_table(&self) -> bool {
        self.modes.table
    }

    pub fn in_single_line(&self) -> bool {
        self.modes.single_line
    }

    pub fn constrained_to_single_line(&self) -> bool {
        self.modes.table || self.modes.single_line
    }

    pub fn in_html_block_tag(&self) -> bool {
        self.modes.html_block_tag
    }

    pub fn in_markdown_code(&self) -> bool {
        self.modes.markdown_code
    }

    pub fn in_single_line_code_block(&self) -> bool {
        self.modes.single_line_code_block
    }

    pub fn in_preformatted(&self) -> bool {
        self.modes.preformatted
    }

    pub fn in_list_node(&self) -> bool {
        self.modes.list_node
    }

    pub fn in_html_attribute(&self) -> bool {
        self.modes.html_attribute
    }

    pub fn in_inline_markdown(&self) -> bool {
        self.modes.inline_markdown
    }

    /// Snapshot of the modes that drive text escaping.
    pub fn escape_context(&self) -> EscapeContext {
        EscapeContext {
            in_markdown_code: self.modes.markdown_code,
            in_table: self.modes.table,
            in_single_line_code_block: self.modes.single_line_code_block,
            in_html_attribute: self.modes.html_attribute,
            in_html_block_tag: self.modes.html_block_tag,
            in_preformatted: self.modes.preformatted,
            in_inline_markdown: self.modes.inline_markdown,
            line_is_blank: self.new_paragraph || self.writer.current_line_is_blank(),
        }
    }

    // ------------------------------------------------------------------
    // Buffer access
    // ------------------------------------------------------------------

    pub fn at_line_start(&self) -> bool {
        self.writer.at_line_start()
    }

    pub fn peek_last_char(&self) -> Option<char> {
        self.writer.peek_last_char()
    }

    pub fn is_empty(&self) -> bool {
        self.writer.is_empty()
    }

    pub fn as_str(&self) -> &str {
        self.writer.as_str()
    }

    pub fn into_string(self) -> String {
        self.writer.into_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn newline_in_table_is_fatal() {
        let mut out = MarkdownOutput::new();
        let err = out.with_in_table(|out| out.write("a\nb")).unwrap_err();
        assert!(matches!(err, RenderError::NewlineInSingleLine { .. }));
    }

    #[test]
    fn newline_in_single_line_is_fatal() {
        let mut out = MarkdownOutput::new();
        let err = out.with_in_single_line(|out| out.write_line("a")).unwrap_err();
        assert!(matches!(err, RenderError::NewlineInSingleLine { .. }));
    }

    #[test]
    fn paragraph_break_while_constrained_is_fatal() {
        let mut out = MarkdownOutput::new();
        let err = out
            .with_in_single_line(|out| out.with_paragraph_break(|_| Ok(())))
            .unwrap_err();
        assert_eq!(err, RenderError::ParagraphBreakInSingleLine);
    }

    #[test]
    fn modes_restore_after_error() {
        let mut out = MarkdownOutput::new();
        let _ = out.with_in_table(|out| {
            out.with_in_html_block_tag(|out| out.write("\n"))
        });
        assert!(!out.in_table());
        assert!(!out.in_html_block_tag());
        assert!(!out.constrained_to_single_line());
    }

    #[test]
    fn modes_nest_and_restore() {
        let mut out = MarkdownOutput::new();
        out.with_in_html_block_tag(|out| {
            assert!(out.in_html_block_tag());
            out.with_mode(Mode::HtmlBlockTag, false, |out| {
                assert!(!out.in_html_block_tag());
                Ok(())
            })?;
            assert!(out.in_html_block_tag());
            Ok(())
        })
        .unwrap();
        assert!(!out.in_html_block_tag());
    }

    #[test]
    fn paragraph_break_inserts_one_blank_line() {
        let mut out = MarkdownOutput::new();
        out.write("first").unwrap();
        out.with_paragraph_break(|out| out.write("second")).unwrap();
        out.with_paragraph_break(|out| out.write("third")).unwrap();
        assert_eq!(out.as_str(), "first\n\nsecond\n\nthird");
    }

    #[test]
    fn nested_paragraph_breaks_collapse() {
        let mut out = MarkdownOutput::new();
        out.write("first").unwrap();
        out.with_paragraph_break(|out| out.with_paragraph_break(|out| out.write("second")))
            .unwrap();
        assert_eq!(out.as_str(), "first\n\nsecond");
    }

    #[test]
    fn paragraph_break_clears_html_block_mode() {
        let mut out = MarkdownOutput::new();
        out.with_in_html_block_tag(|out| {
            out.write("<div>")?;
            out.with_paragraph_break(|out| {
                assert!(!out.in_html_block_tag());
                Ok(())
            })?;
            assert!(out.in_html_block_tag());
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn paragraph_mark_is_consumed_by_content() {
        let mut out = MarkdownOutput::new();
        out.mark_start_of_paragraph();
        out.write("  ").unwrap();
        assert!(out.is_marked_new_paragraph());
        out.write("x").unwrap();
        assert!(!out.is_marked_new_paragraph());
    }
}
