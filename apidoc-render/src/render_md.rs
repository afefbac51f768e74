//! Markdown renderer.
//!
//! Walks a simplified [`Node`] tree and writes CommonMark into a
//! [`MarkdownOutput`]. Block constructs check whether the output is
//! constrained to a single line and fall back to their inline HTML form when
//! it is; inline constructs switch to HTML once they sit inside an open HTML
//! block tag.

use std::collections::BTreeMap;

use crate::anchors::toc_to_node;
use crate::error::{RenderError, Result};
use crate::escape::{
    calculate_fence_length, calculate_inline_code_ticks, escape_link_destination,
    escape_link_title, escape_text,
};
use crate::html::{TagClass, classify};
use crate::links::{join_url, relative_path};
use crate::node::{ListType, Node, PageMetadata, Row, is_valid_anchor};
use crate::output::{MarkdownOutput, Mode};
use crate::simplify::simplify;

/// Marker comment written at the top of every generated page.
pub const DO_NOT_EDIT_COMMENT: &str =
    "<!-- Do not edit this file. It is automatically generated by apidoc. -->";

/// Empty HTML comment that keeps CommonMark from merging adjacent lists.
const LIST_SEPARATOR: &str = "<!-- -->";

/// Per-page rendering settings.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Site-root-relative path of the page being rendered. LocalPageLink
    /// destinations are made relative to it.
    pub page_path: String,
    /// Prefix for GithubSourceLink destinations. Without one, destinations
    /// are written as given.
    pub source_base_url: Option<String>,
    /// Drop HtmlComment nodes that are not marked `persist`.
    pub strip_transient_comments: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            page_path: "index.md".to_string(),
            source_base_url: None,
            strip_transient_comments: false,
        }
    }
}

impl RenderOptions {
    pub fn for_page(page_path: impl Into<String>) -> Self {
        Self {
            page_path: page_path.into(),
            ..Self::default()
        }
    }
}

/// Simplify `node` and render it as Markdown.
pub fn to_markdown(node: &Node, options: &RenderOptions) -> Result<String> {
    render_markdown(&simplify(node.clone()), options)
}

/// Render an already simplified tree as Markdown.
pub fn render_markdown(node: &Node, options: &RenderOptions) -> Result<String> {
    let mut out = MarkdownOutput::new();
    MarkdownRenderer::new(options).render(node, &mut out)?;
    Ok(out.into_string())
}

/// Dispatches nodes to their rendering rules.
#[derive(Debug, Clone, Copy)]
pub struct MarkdownRenderer<'a> {
    options: &'a RenderOptions,
}

impl<'a> MarkdownRenderer<'a> {
    pub fn new(options: &'a RenderOptions) -> Self {
        Self { options }
    }

    /// Render one node into `out`.
    pub fn render(&self, node: &Node, out: &mut MarkdownOutput) -> Result<()> {
        match node {
            Node::PlainText { text } => self.write_text(text, out),
            Node::HorizontalRule => self.render_horizontal_rule(out),
            Node::HtmlComment { comment, persist } => self.render_comment(comment, *persist, out),
            Node::Image { src, title, alt } => {
                self.render_image(src, title.as_deref(), alt.as_deref(), out)
            }
            Node::CodeBlock { language, code } => {
                self.render_code_block(language.as_deref(), code, out)
            }
            Node::DoNotEditComment => {
                out.write(DO_NOT_EDIT_COMMENT)?;
                if out.constrained_to_single_line() {
                    Ok(())
                } else {
                    out.ensure_new_line()
                }
            }
            Node::Container { children } => self.render_children(children, out),
            Node::BlockQuote { children } => self.render_block_quote(children, out),
            Node::HtmlElement {
                tag_name,
                attributes,
                children,
            } => self.render_html_element(tag_name, attributes, children, out),
            Node::Italics { children } => self.render_emphasis("*", "i", children, out),
            Node::Bold { children } => self.render_emphasis("**", "b", children, out),
            Node::Strikethrough { children } => self.render_emphasis("~~", "s", children, out),
            Node::CodeSpan { children } => self.render_code_span(children, out),
            Node::RichCodeBlock { language, children } => {
                self.render_rich_code_block(language, children, out)
            }
            Node::Link {
                destination,
                title,
                children,
            } => self.render_link(destination, title.as_deref(), children, out),
            Node::LocalPageLink {
                destination,
                title,
                children,
            } => {
                let destination = relative_path(&self.options.page_path, destination);
                self.render_link(&destination, title.as_deref(), children, out)
            }
            Node::GithubSourceLink {
                destination,
                title,
                children,
            } => {
                let destination = match &self.options.source_base_url {
                    Some(base) => join_url(base, destination),
                    None => destination.clone(),
                };
                self.render_link(&destination, title.as_deref(), children, out)
            }
            Node::Paragraph { children } => {
                self.render_html_element("p", &BTreeMap::new(), children, out)
            }
            Node::Heading123456 {
                level,
                alternate_id,
                children,
            } => self.render_heading(*level, alternate_id.as_deref(), children, out),
            Node::List {
                list_type,
                children,
            } => self.render_list(*list_type, children, out),
            Node::Table { header, rows } => self.render_table(header, rows, out),
            Node::CollapsibleSection {
                summary_node,
                children,
            } => self.render_collapsible_section(summary_node, children, out),
            Node::Page { metadata, children } => self.render_page(metadata, children, out),
        }
    }

    /// Render children in order. Adjacent lists get a separator comment so
    /// they stay two lists.
    pub fn render_children(&self, children: &[Node], out: &mut MarkdownOutput) -> Result<()> {
        let mut previous_was_list = false;
        for child in children {
            let is_list = matches!(child, Node::List { .. });
            if is_list && previous_was_list && !out.constrained_to_single_line() {
                out.ensure_skipped_line()?;
                out.write(LIST_SEPARATOR)?;
                out.ensure_new_line()?;
            }
            self.render(child, out)?;
            previous_was_list = is_list;
        }
        Ok(())
    }

    fn write_text(&self, text: &str, out: &mut MarkdownOutput) -> Result<()> {
        let escaped = escape_text(text, &out.escape_context());
        out.write(&escaped)
    }

    // ------------------------------------------------------------------
    // Block constructs
    // ------------------------------------------------------------------

    fn render_heading(
        &self,
        level: u8,
        alternate_id: Option<&str>,
        children: &[Node],
        out: &mut MarkdownOutput,
    ) -> Result<()> {
        if !(1..=6).contains(&level) {
            return Err(RenderError::InvalidHeadingLevel(level));
        }
        if let Some(id) = alternate_id {
            if !is_valid_anchor(id) {
                return Err(RenderError::InvalidAnchor(id.to_string()));
            }
        }

        if out.constrained_to_single_line() {
            out.write(&format!("<h{level}>"))?;
            out.with_in_html_block_tag(|out| {
                if let Some(id) = alternate_id {
                    write_anchor(id, out)?;
                }
                self.render_children(children, out)
            })?;
            return out.write(&format!("</h{level}>"));
        }

        out.with_paragraph_break(|out| {
            out.write(&"#".repeat(usize::from(level)))?;
            out.write(" ")?;
            if let Some(id) = alternate_id {
                write_anchor(id, out)?;
            }
            out.with_in_single_line(|out| self.render_children(children, out))?;
            out.ensure_new_line()
        })
    }

    fn render_list(
        &self,
        list_type: ListType,
        items: &[Node],
        out: &mut MarkdownOutput,
    ) -> Result<()> {
        if out.constrained_to_single_line() {
            let (open, close) = match list_type {
                ListType::Ordered { start: 1 } => ("<ol>".to_string(), "</ol>"),
                ListType::Ordered { start } => (format!("<ol start=\"{start}\">"), "</ol>"),
                ListType::Unordered => ("<ul>".to_string(), "</ul>"),
            };
            out.write(&open)?;
            out.with_in_html_block_tag(|out| {
                for item in items {
                    out.write("<li>")?;
                    self.render(item, out)?;
                    out.write("</li>")?;
                }
                Ok(())
            })?;
            return out.write(close);
        }

        // Only a list starting at 1 may interrupt the paragraph before it.
        let interrupts_paragraph =
            !matches!(list_type, ListType::Ordered { start } if start != 1);
        if out.in_list_node() && (interrupts_paragraph || out.is_marked_new_paragraph()) {
            out.ensure_new_line()?;
        } else {
            out.ensure_skipped_line()?;
        }

        out.with_mode(Mode::HtmlBlockTag, false, |out| {
            for (i, item) in items.iter().enumerate() {
                let marker = match list_type {
                    ListType::Ordered { start } => format!("{}. ", u64::from(start) + i as u64),
                    ListType::Unordered => "- ".to_string(),
                };
                out.ensure_new_line()?;
                out.write(&marker)?;
                out.with_indent(&" ".repeat(marker.len()), |out| {
                    out.with_in_list_node(|out| {
                        out.mark_start_of_paragraph();
                        self.render(item, out)
                    })
                })?;
            }
            out.ensure_new_line()
        })
    }

    fn render_table(&self, header: &Row, rows: &[Row], out: &mut MarkdownOutput) -> Result<()> {
        let columns = std::iter::once(header)
            .chain(rows)
            .map(|row| row.children.len())
            .max()
            .unwrap_or(0);
        if columns == 0 {
            return Err(RenderError::EmptyTable);
        }

        if out.constrained_to_single_line() {
            out.write("<table>")?;
            out.with_in_html_block_tag(|out| {
                self.write_html_row(header, "th", columns, out)?;
                for row in rows {
                    self.write_html_row(row, "td", columns, out)?;
                }
                Ok(())
            })?;
            return out.write("</table>");
        }

        out.ensure_skipped_line()?;
        out.with_mode(Mode::HtmlBlockTag, false, |out| {
            self.write_markdown_row(header, columns, out)?;
            out.write("|")?;
            for _ in 0..columns {
                out.write(" --- |")?;
            }
            out.write("\n")?;
            for row in rows {
                self.write_markdown_row(row, columns, out)?;
            }
            Ok(())
        })
    }

    fn write_markdown_row(&self, row: &Row, columns: usize, out: &mut MarkdownOutput) -> Result<()> {
        out.write("|")?;
        for i in 0..columns {
            out.write(" ")?;
            if let Some(cell) = row.children.get(i) {
                out.with_in_table(|out| self.render(cell, out))?;
            }
            out.write(" |")?;
        }
        out.write("\n")
    }

    fn write_html_row(
        &self,
        row: &Row,
        cell_tag: &str,
        columns: usize,
        out: &mut MarkdownOutput,
    ) -> Result<()> {
        out.write("<tr>")?;
        for i in 0..columns {
            out.write(&format!("<{cell_tag}>"))?;
            if let Some(cell) = row.children.get(i) {
                self.render(cell, out)?;
            }
            out.write(&format!("</{cell_tag}>"))?;
        }
        out.write("</tr>")
    }

    fn render_block_quote(&self, children: &[Node], out: &mut MarkdownOutput) -> Result<()> {
        if out.constrained_to_single_line() {
            out.write("<blockquote>")?;
            out.with_in_html_block_tag(|out| self.render_children(children, out))?;
            return out.write("</blockquote>");
        }

        out.with_paragraph_break(|out| {
            if !out.at_line_start() {
                out.write("> ")?;
            }
            out.with_indent("> ", |out| {
                out.mark_start_of_paragraph();
                self.render_children(children, out)
            })?;
            out.ensure_new_line()
        })
    }

    fn render_horizontal_rule(&self, out: &mut MarkdownOutput) -> Result<()> {
        if out.constrained_to_single_line() {
            return out.write("<hr/>");
        }
        out.with_paragraph_break(|out| {
            out.write("---")?;
            out.ensure_new_line()
        })
    }

    fn render_code_block(
        &self,
        language: Option<&str>,
        code: &str,
        out: &mut MarkdownOutput,
    ) -> Result<()> {
        if out.constrained_to_single_line() {
            out.write("<code>")?;
            out.with_in_html_block_tag(|out| {
                out.with_in_single_line_code_block(|out| self.write_text(code, out))
            })?;
            return out.write("</code>");
        }

        out.with_paragraph_break(|out| {
            let fence = "`".repeat(calculate_fence_length(code, '`'));
            out.write(&fence)?;
            out.write(language.unwrap_or(""))?;
            out.write("\n")?;
            out.with_in_markdown_code(|out| self.write_text(code, out))?;
            out.ensure_new_line()?;
            out.write(&fence)?;
            out.ensure_new_line()
        })
    }

    fn render_rich_code_block(
        &self,
        language: &str,
        children: &[Node],
        out: &mut MarkdownOutput,
    ) -> Result<()> {
        if !children.iter().any(contains_link) {
            let code: String = children.iter().map(Node::text_content).collect();
            return self.render_code_block(Some(language), &code, out);
        }

        if out.constrained_to_single_line() {
            out.write("<code>")?;
            out.with_in_html_block_tag(|out| {
                out.with_in_single_line_code_block(|out| self.render_children(children, out))
            })?;
            return out.write("</code>");
        }

        // Markdown links are not recognized inside a fence.
        out.with_paragraph_break(|out| {
            out.write("<pre><code class=\"language-")?;
            self.write_attribute_value(language, out)?;
            out.write("\">")?;
            out.with_in_html_block_tag(|out| {
                out.with_in_preformatted(|out| self.render_children(children, out))
            })?;
            out.write("</code></pre>")?;
            out.ensure_new_line()
        })
    }

    fn render_collapsible_section(
        &self,
        summary: &Node,
        children: &[Node],
        out: &mut MarkdownOutput,
    ) -> Result<()> {
        if out.constrained_to_single_line() {
            out.write("<details><summary>")?;
            out.with_in_html_block_tag(|out| {
                self.render(summary, out)?;
                out.write("</summary>")?;
                self.render_children(children, out)
            })?;
            return out.write("</details>");
        }

        out.with_paragraph_break(|out| {
            out.write_line("<details>")?;
            out.write("<summary>")?;
            out.with_in_html_block_tag(|out| out.with_in_single_line(|out| self.render(summary, out)))?;
            out.write("</summary>")?;
            out.ensure_skipped_line()?;
            self.render_children(children, out)?;
            out.ensure_skipped_line()?;
            out.write("</details>")?;
            out.ensure_new_line()
        })
    }

    fn render_page(
        &self,
        metadata: &PageMetadata,
        children: &[Node],
        out: &mut MarkdownOutput,
    ) -> Result<()> {
        self.render(&Node::DoNotEditComment, out)?;
        self.render(&Node::page_title(vec![Node::text(&metadata.title)]), out)?;
        if !metadata.table_of_contents.is_empty() {
            self.render(&toc_to_node(&metadata.table_of_contents), out)?;
        }
        self.render_children(children, out)?;
        out.ensure_new_line()
    }

    // ------------------------------------------------------------------
    // HTML elements
    // ------------------------------------------------------------------

    fn render_html_element(
        &self,
        tag_name: &str,
        attributes: &BTreeMap<String, String>,
        children: &[Node],
        out: &mut MarkdownOutput,
    ) -> Result<()> {
        match classify(tag_name) {
            TagClass::SelfClosing => self.write_open_tag(tag_name, attributes, true, out),
            TagClass::Inline => {
                self.write_open_tag(tag_name, attributes, false, out)?;
                self.render_children(children, out)?;
                out.write(&format!("</{tag_name}>"))
            }
            TagClass::Block => {
                let constrained = out.constrained_to_single_line();

                // A bare paragraph is nothing but the blank lines around it.
                if !constrained && attributes.is_empty() && tag_name.eq_ignore_ascii_case("p") {
                    return out.with_paragraph_break(|out| self.render_children(children, out));
                }

                if constrained || out.in_html_block_tag() {
                    self.write_open_tag(tag_name, attributes, false, out)?;
                    out.with_in_html_block_tag(|out| self.render_children(children, out))?;
                    return out.write(&format!("</{tag_name}>"));
                }

                out.with_paragraph_break(|out| {
                    self.write_open_tag(tag_name, attributes, false, out)?;
                    let start = out.as_str().len();
                    out.with_in_html_block_tag(|out| self.render_children(children, out))?;
                    if out.as_str()[start..].contains('\n') {
                        out.ensure_skipped_line()?;
                    }
                    out.write(&format!("</{tag_name}>"))?;
                    out.ensure_new_line()
                })
            }
        }
    }

    fn write_open_tag(
        &self,
        tag_name: &str,
        attributes: &BTreeMap<String, String>,
        self_closing: bool,
        out: &mut MarkdownOutput,
    ) -> Result<()> {
        out.write("<")?;
        out.write(tag_name)?;
        for (name, value) in attributes {
            out.write(" ")?;
            out.write(name)?;
            out.write("=\"")?;
            self.write_attribute_value(value, out)?;
            out.write("\"")?;
        }
        out.write(if self_closing { "/>" } else { ">" })
    }

    fn write_attribute_value(&self, value: &str, out: &mut MarkdownOutput) -> Result<()> {
        out.with_in_html_attribute(|out| {
            out.with_in_html_block_tag(|out| {
                out.with_mode(Mode::MarkdownCode, false, |out| self.write_text(value, out))
            })
        })
    }

    fn render_comment(&self, comment: &str, persist: bool, out: &mut MarkdownOutput) -> Result<()> {
        if !persist && self.options.strip_transient_comments {
            return Ok(());
        }
        let mut body = comment.replace("-->", "--&gt;");
        if out.constrained_to_single_line() {
            body = body.replace('\n', " ");
        }
        out.write("<!-- ")?;
        out.write(&body)?;
        out.write(" -->")
    }

    // ------------------------------------------------------------------
    // Inline constructs
    // ------------------------------------------------------------------

    fn use_inline_html(&self, out: &MarkdownOutput) -> bool {
        out.in_html_block_tag() && !out.in_table()
    }

    fn render_link(
        &self,
        destination: &str,
        title: Option<&str>,
        children: &[Node],
        out: &mut MarkdownOutput,
    ) -> Result<()> {
        if out.in_markdown_code() {
            return self.render_children(children, out);
        }

        if self.use_inline_html(out) {
            out.write("<a href=\"")?;
            self.write_attribute_value(destination, out)?;
            out.write("\"")?;
            if let Some(title) = title {
                out.write(" title=\"")?;
                self.write_attribute_value(title, out)?;
                out.write("\"")?;
            }
            out.write(">")?;
            self.render_children(children, out)?;
            return out.write("</a>");
        }

        out.write("[")?;
        self.render_children(children, out)?;
        out.write("](")?;
        out.write(&escape_link_destination(destination, out.in_table()))?;
        if let Some(title) = title {
            out.write(&format!(" \"{}\"", escape_link_title(title, out.in_table())))?;
        }
        out.write(")")
    }

    fn render_emphasis(
        &self,
        delimiter: &str,
        html_tag: &str,
        children: &[Node],
        out: &mut MarkdownOutput,
    ) -> Result<()> {
        if children.is_empty() || out.in_markdown_code() {
            return self.render_children(children, out);
        }
        if self.use_inline_html(out) {
            out.write(&format!("<{html_tag}>"))?;
            self.render_children(children, out)?;
            return out.write(&format!("</{html_tag}>"));
        }
        out.write(delimiter)?;
        self.render_children(children, out)?;
        out.write(delimiter)
    }

    fn render_code_span(&self, children: &[Node], out: &mut MarkdownOutput) -> Result<()> {
        // Code spans fold line endings to spaces.
        let code = children
            .iter()
            .map(Node::text_content)
            .collect::<String>()
            .replace('\n', " ");
        if code.is_empty() {
            return Ok(());
        }

        if self.use_inline_html(out) {
            out.write("<code>")?;
            self.write_text(&code, out)?;
            return out.write("</code>");
        }

        let ticks = "`".repeat(calculate_inline_code_ticks(&code));
        // A parser strips one space from each end of a span that starts and
        // ends with one, unless the span is all spaces.
        let stripped_by_parser =
            code.starts_with(' ') && code.ends_with(' ') && !code.trim_matches(' ').is_empty();
        let pad = if code.starts_with('`') || code.ends_with('`') || stripped_by_parser {
            " "
        } else {
            ""
        };
        out.write(&ticks)?;
        out.write(pad)?;
        out.with_in_markdown_code(|out| self.write_text(&code, out))?;
        out.write(pad)?;
        out.write(&ticks)
    }

    fn render_image(
        &self,
        src: &str,
        title: Option<&str>,
        alt: Option<&str>,
        out: &mut MarkdownOutput,
    ) -> Result<()> {
        if self.use_inline_html(out) {
            out.write("<img src=\"")?;
            self.write_attribute_value(src, out)?;
            out.write("\"")?;
            if let Some(alt) = alt {
                out.write(" alt=\"")?;
                self.write_attribute_value(alt, out)?;
                out.write("\"")?;
            }
            if let Some(title) = title {
                out.write(" title=\"")?;
                self.write_attribute_value(title, out)?;
                out.write("\"")?;
            }
            return out.write("/>");
        }

        out.write("![")?;
        if let Some(alt) = alt {
            self.write_text(&alt.replace('\n', " "), out)?;
        }
        out.write("](")?;
        out.write(&escape_link_destination(src, out.in_table()))?;
        if let Some(title) = title {
            out.write(&format!(" \"{}\"", escape_link_title(title, out.in_table())))?;
        }
        out.write(")")
    }
}

fn write_anchor(id: &str, out: &mut MarkdownOutput) -> Result<()> {
    out.write(&format!("<a name=\"{id}\"></a>"))
}

fn contains_link(node: &Node) -> bool {
    match node {
        Node::Link { .. } | Node::LocalPageLink { .. } | Node::GithubSourceLink { .. } => true,
        other => other
            .children()
            .is_some_and(|children| children.iter().any(contains_link)),
    }
}

// ---- Tests ----
