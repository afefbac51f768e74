//! HTML preview of rendered Markdown.
//!
//! Runs generated Markdown back through `pulldown-cmark` so a page can be
//! checked in a browser without the documentation site.

use pulldown_cmark::{Options, Parser, html};

use crate::escape::escape_attribute;

/// Render Markdown to an HTML fragment, with tables and strikethrough.
pub fn preview_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, options);
    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);
    html_output
}

/// Wrap rendered Markdown in a standalone HTML document.
pub fn preview_page(title: &str, markdown: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="generator" content="apidoc">
    <title>{title}</title>
    <style>{css}</style>
</head>
<body>
<article class="apidoc">
{body}
</article>
</body>
</html>"#,
        title = escape_attribute(title),
        css = PREVIEW_CSS,
        body = preview_html(markdown),
    )
}

const PREVIEW_CSS: &str = r#"
body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; line-height: 1.6; }
.apidoc { max-width: 48rem; margin: 0 auto; padding: 2rem 1.5rem 4rem; }
.apidoc pre { background: #f6f8fa; padding: 1rem; overflow-x: auto; border-radius: 6px; }
.apidoc code { font-family: "SF Mono", Menlo, Consolas, monospace; font-size: 0.875em; }
.apidoc table { border-collapse: collapse; }
.apidoc th, .apidoc td { border: 1px solid #d0d7de; padding: 0.25rem 0.75rem; }
"#;
