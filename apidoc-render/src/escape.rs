//! Text escaping for PlainText content.
//!
//! Which rules apply depends on where the text lands: HTML entities are
//! escaped everywhere except inside Markdown code, Markdown metacharacters
//! only where Markdown is parsed, and newlines are rewritten to whatever the
//! surrounding construct can hold.

/// The rendering modes that decide which escaping rules apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EscapeContext {
    pub in_markdown_code: bool,
    pub in_table: bool,
    pub in_single_line_code_block: bool,
    pub in_html_attribute: bool,
    pub in_html_block_tag: bool,
    pub in_preformatted: bool,
    /// The line is parsed as inline Markdown even inside an HTML fallback,
    /// as in a table cell or a heading.
    pub in_inline_markdown: bool,
    /// Only spaces have been written since the last newline.
    pub line_is_blank: bool,
}

/// Escape `text` for the given context.
///
/// ```
/// use apidoc_render::escape::{escape_text, EscapeContext};
///
/// let ctx = EscapeContext { line_is_blank: true, ..Default::default() };
/// assert_eq!(escape_text("# a_b", &ctx), "\\# a\\_b");
/// ```
pub fn escape_text(text: &str, ctx: &EscapeContext) -> String {
    let mut result = String::with_capacity(text.len() + text.len() / 8);
    let markdown = (!ctx.in_html_block_tag || ctx.in_inline_markdown)
        && !ctx.in_markdown_code
        && !ctx.in_preformatted
        && !ctx.in_html_attribute;
    let mut line_is_blank = ctx.line_is_blank;

    for c in text.chars() {
        match c {
            '&' | '"' | '<' | '>' if !ctx.in_markdown_code => result.push_str(match c {
                '&' => "&amp;",
                '"' => "&quot;",
                '<' => "&lt;",
                _ => "&gt;",
            }),
            '|' if ctx.in_table => result.push_str("\\|"),
            '\n' => {
                result.push_str(newline_replacement(ctx));
                line_is_blank = true;
                continue;
            }
            '\\' | '*' | '/' | '(' | ')' | '[' | ']' | '<' | '>' | '_' if markdown => {
                result.push('\\');
                result.push(c);
            }
            '#' if markdown && line_is_blank => result.push_str("\\#"),
            _ => result.push(c),
        }
        if c != ' ' {
            line_is_blank = false;
        }
    }

    result
}

fn newline_replacement(ctx: &EscapeContext) -> &'static str {
    if ctx.in_table && !ctx.in_single_line_code_block && !ctx.in_html_attribute {
        "<br>"
    } else if ctx.in_html_attribute {
        "\\n"
    } else if ctx.in_single_line_code_block {
        "</code><br><code>"
    } else if ctx.in_html_block_tag && !ctx.in_table && !ctx.in_preformatted {
        "<br>"
    } else {
        "\n"
    }
}

/// Escape a string for use inside a double-quoted HTML attribute value.
pub fn escape_attribute(value: &str) -> String {
    escape_text(
        value,
        &EscapeContext {
            in_html_attribute: true,
            in_html_block_tag: true,
            ..Default::default()
        },
    )
}

/// Prepare a link destination for `[text](destination)` syntax.
///
/// Destinations with spaces or unbalanced parentheses use the `<...>` form.
/// Inside a table a `|` would end the cell, so it is percent-encoded.
pub fn escape_link_destination(destination: &str, in_table: bool) -> String {
    let destination = if in_table {
        destination.replace('|', "%7C")
    } else {
        destination.to_string()
    };
    let needs_angle = destination.contains(' ')
        || destination.matches('(').count() != destination.matches(')').count();
    if needs_angle {
        format!("<{}>", destination.replace('<', "%3C").replace('>', "%3E"))
    } else {
        destination
    }
}

/// Prepare a link title for the double-quoted `"title"` form.
pub fn escape_link_title(title: &str, in_table: bool) -> String {
    let title = title
        .replace('\n', " ")
        .replace('\\', "\\\\")
        .replace('"', "\\\"");
    if in_table {
        title.replace('|', "\\|")
    } else {
        title
    }
}

/// Calculate the minimum fence length needed for a code block.
///
/// Returns the smallest number of fence characters (at least 3) that does
/// not appear as a run in the content.
pub fn calculate_fence_length(content: &str, fence_char: char) -> usize {
    longest_run(content, fence_char).max(2) + 1
}

/// Calculate the backtick count for a code span: one more than the longest
/// backtick run in the content.
pub fn calculate_inline_code_ticks(content: &str) -> usize {
    longest_run(content, '`') + 1
}

fn longest_run(content: &str, needle: char) -> usize {
    let mut max_run = 0;
    let mut current_run = 0;
    for c in content.chars() {
        if c == needle {
            current_run += 1;
            max_run = max_run.max(current_run);
        } else {
            current_run = 0;
        }
    }
    max_run
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn prose() -> EscapeContext {
        EscapeContext::default()
    }

    #[test]
    fn entities_then_metacharacters() {
        assert_eq!(
            escape_text("a & b <c> \"d\"", &prose()),
            "a &amp; b &lt;c&gt; &quot;d&quot;"
        );
        assert_eq!(escape_text("*x* [y](z) \\", &prose()), "\\*x\\* \\[y\\]\\(z\\) \\\\");
        assert_eq!(escape_text("a/b_c", &prose()), "a\\/b\\_c");
    }

    #[test]
    fn hash_escaped_only_at_line_start() {
        let at_start = EscapeContext {
            line_is_blank: true,
            ..prose()
        };
        assert_eq!(escape_text("# title", &at_start), "\\# title");
        assert_eq!(escape_text("   # title", &at_start), "   \\# title");
        assert_eq!(escape_text("a # b", &at_start), "a # b");
        assert_eq!(escape_text("# mid-line", &prose()), "# mid-line");
        assert_eq!(escape_text("x\n# y", &prose()), "x\n\\# y");
    }

    #[test]
    fn markdown_code_disables_escaping() {
        let ctx = EscapeContext {
            in_markdown_code: true,
            line_is_blank: true,
            ..prose()
        };
        assert_eq!(escape_text("# <T>*x*", &ctx), "# <T>*x*");
    }

    #[test]
    fn html_block_keeps_entities_only() {
        let ctx = EscapeContext {
            in_html_block_tag: true,
            ..prose()
        };
        assert_eq!(escape_text("a_b <c>\nd", &ctx), "a_b &lt;c&gt;<br>d");
    }

    #[test]
    fn table_escapes_pipes_and_newlines() {
        let ctx = EscapeContext {
            in_table: true,
            ..prose()
        };
        assert_eq!(escape_text("a|b\nc", &ctx), "a\\|b<br>c");
    }

    #[test]
    fn html_fallback_in_table_keeps_markdown_escaping() {
        let ctx = EscapeContext {
            in_table: true,
            in_html_block_tag: true,
            in_inline_markdown: true,
            ..prose()
        };
        assert_eq!(escape_text("a*b*_c_", &ctx), "a\\*b\\*\\_c\\_");
    }

    #[test]
    fn html_fallback_in_heading_keeps_markdown_escaping() {
        let ctx = EscapeContext {
            in_html_block_tag: true,
            in_inline_markdown: true,
            ..prose()
        };
        assert_eq!(escape_text("[x](y)", &ctx), "\\[x\\]\\(y\\)");
    }

    #[test]
    fn attribute_never_gets_markdown_escapes() {
        let ctx = EscapeContext {
            in_html_attribute: true,
            in_html_block_tag: true,
            in_inline_markdown: true,
            in_table: true,
            ..prose()
        };
        assert_eq!(escape_text("a_b*c", &ctx), "a_b*c");
    }

    #[test]
    fn table_pipe_escaped_in_code() {
        let ctx = EscapeContext {
            in_table: true,
            in_markdown_code: true,
            ..prose()
        };
        assert_eq!(escape_text("A | B", &ctx), "A \\| B");
    }

    #[test]
    fn attribute_newlines() {
        assert_eq!(escape_attribute("say \"hi\"\nthere"), "say &quot;hi&quot;\\nthere");
    }

    #[test]
    fn single_line_code_block_joins_lines() {
        let ctx = EscapeContext {
            in_single_line_code_block: true,
            in_html_block_tag: true,
            ..prose()
        };
        assert_eq!(escape_text("a\nb", &ctx), "a</code><br><code>b");
    }

    #[test]
    fn preformatted_keeps_newlines() {
        let ctx = EscapeContext {
            in_html_block_tag: true,
            in_preformatted: true,
            ..prose()
        };
        assert_eq!(escape_text("a<b>\nc", &ctx), "a&lt;b&gt;\nc");
    }

    #[test]
    fn link_destinations() {
        assert_eq!(escape_link_destination("foo.md#bar", false), "foo.md#bar");
        assert_eq!(escape_link_destination("a b.md", false), "<a b.md>");
        assert_eq!(escape_link_destination("f(x", false), "<f(x>");
        assert_eq!(escape_link_destination("?q=a|b", false), "?q=a|b");
        assert_eq!(escape_link_destination("?q=a|b", true), "?q=a%7Cb");
        assert_eq!(escape_link_destination("a b|c", true), "<a b%7Cc>");
    }

    #[test]
    fn link_titles() {
        assert_eq!(escape_link_title("say \"hi\"", false), "say \\\"hi\\\"");
        assert_eq!(escape_link_title("ends in \\", false), "ends in \\\\");
        assert_eq!(escape_link_title("a\nb|c", false), "a b|c");
        assert_eq!(escape_link_title("a|b", true), "a\\|b");
    }

    #[test]
    fn fence_and_tick_lengths() {
        assert_eq!(calculate_fence_length("let x = 1;", '`'), 3);
        assert_eq!(calculate_fence_length("```rust\ncode\n```", '`'), 4);
        assert_eq!(calculate_inline_code_ticks("code"), 1);
        assert_eq!(calculate_inline_code_ticks("a ` b"), 2);
    }
}
