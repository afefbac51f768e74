//! HTML tag classification.

/// How an HTML element participates in layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagClass {
    /// Starts a CommonMark HTML block; content may span blank lines.
    Block,
    /// Void element: never has children or a closing tag.
    SelfClosing,
    /// Phrasing content, rendered in place.
    Inline,
}

/// Classify `tag_name` (case-insensitive). Unknown tags are inline.
pub fn classify(tag_name: &str) -> TagClass {
    let lower = tag_name.to_ascii_lowercase();
    match lower.as_str() {
        "area" | "base" | "br" | "col" | "embed" | "hr" | "img" | "input" | "link" | "meta"
        | "source" | "track" | "wbr" => TagClass::SelfClosing,

        "address" | "article" | "aside" | "blockquote" | "details" | "dialog" | "dd" | "div"
        | "dl" | "dt" | "fieldset" | "figcaption" | "figure" | "footer" | "form" | "h1" | "h2"
        | "h3" | "h4" | "h5" | "h6" | "header" | "li" | "main" | "nav" | "ol" | "p" | "pre"
        | "section" | "summary" | "table" | "tbody" | "td" | "tfoot" | "th" | "thead" | "tr"
        | "ul" => TagClass::Block,

        _ => TagClass::Inline,
    }
}
