//! The documentation node tree.
//!
//! A closed sum type: every construct the renderer understands is a variant
//! of [`Node`], so dispatch over it is checked exhaustively by the compiler.
//! Nodes are plain values. Upstream builders construct them once, the
//! simplifier produces a normalized copy and the renderer only reads them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// One element of the document tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum Node {
    // -- Leaves ---------------------------------------------------------
    PlainText {
        text: String,
    },
    HorizontalRule,
    HtmlComment {
        comment: String,
        #[serde(default)]
        persist: bool,
    },
    Image {
        src: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alt: Option<String>,
    },
    CodeBlock {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
        code: String,
    },
    DoNotEditComment,

    // -- Containers -----------------------------------------------------
    Container {
        #[serde(default)]
        children: Vec<Node>,
    },
    BlockQuote {
        #[serde(default)]
        children: Vec<Node>,
    },
    HtmlElement {
        tag_name: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        attributes: BTreeMap<String, String>,
        #[serde(default)]
        children: Vec<Node>,
    },
    Italics {
        #[serde(default)]
        children: Vec<Node>,
    },
    Bold {
        #[serde(default)]
        children: Vec<Node>,
    },
    Strikethrough {
        #[serde(default)]
        children: Vec<Node>,
    },
    CodeSpan {
        #[serde(default)]
        children: Vec<Node>,
    },
    RichCodeBlock {
        language: String,
        #[serde(default)]
        children: Vec<Node>,
    },
    Link {
        destination: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default)]
        children: Vec<Node>,
    },
    /// Link to another generated page (or an anchor on this one). The
    /// destination is a site-root-relative page path, made page-relative at
    /// render time.
    LocalPageLink {
        destination: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default)]
        children: Vec<Node>,
    },
    /// Link into the source repository. The destination is a repository path,
    /// prefixed with the configured source URL at render time.
    GithubSourceLink {
        destination: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default)]
        children: Vec<Node>,
    },
    Paragraph {
        #[serde(default)]
        children: Vec<Node>,
    },
    Heading123456 {
        level: u8,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alternate_id: Option<String>,
        #[serde(default)]
        children: Vec<Node>,
    },
    List {
        list_type: ListType,
        #[serde(default)]
        children: Vec<Node>,
    },

    // -- Compound -------------------------------------------------------
    Table {
        header: Row,
        #[serde(default)]
        rows: Vec<Row>,
    },
    CollapsibleSection {
        summary_node: Box<Node>,
        #[serde(default)]
        children: Vec<Node>,
    },
    Page {
        metadata: PageMetadata,
        #[serde(default)]
        children: Vec<Node>,
    },
}

/// Ordered or unordered list marker style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ListType {
    Ordered {
        #[serde(default = "default_list_start")]
        start: u32,
    },
    Unordered,
}

fn default_list_start() -> u32 {
    1
}

/// One table row: an ordered sequence of cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Row {
    pub fn new(cells: Vec<Node>) -> Self {
        Self { children: cells }
    }
}

/// Page-level metadata rendered ahead of the body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub title: String,
    #[serde(default)]
    pub table_of_contents: TableOfContents,
}

/// A nested table of contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableOfContents {
    #[serde(default)]
    pub entries: Vec<TocEntry>,
}

impl TableOfContents {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One table of contents entry, optionally with per-kind anchors and nested
/// entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TocEntry {
    pub title: String,
    /// Same-page fragment, without `#`. `None` for pure grouping entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kinds: Vec<KindRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TocEntry>,
}

/// Inline reference to one kind-specific anchor of a shared export name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindRef {
    pub label: String,
    pub anchor: String,
}

// ------------------------------------------------------------------
// Constructors
// ------------------------------------------------------------------

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::PlainText { text: text.into() }
    }

    pub fn container(children: Vec<Node>) -> Self {
        Node::Container { children }
    }

    pub fn paragraph(children: Vec<Node>) -> Self {
        Node::Paragraph { children }
    }

    pub fn heading_level(level: u8, children: Vec<Node>) -> Self {
        Node::Heading123456 {
            level,
            alternate_id: None,
            children,
        }
    }

    /// Level 1: the page title.
    pub fn page_title(children: Vec<Node>) -> Self {
        Self::heading_level(1, children)
    }

    /// Level 2: a titled section of a page.
    pub fn title(children: Vec<Node>) -> Self {
        Self::heading_level(2, children)
    }

    /// Level 3: one export's heading.
    pub fn heading(children: Vec<Node>) -> Self {
        Self::heading_level(3, children)
    }

    /// Level 4: the small kind-labeled heading.
    pub fn subheading(children: Vec<Node>) -> Self {
        Self::heading_level(4, children)
    }

    /// Attach an anchor to a heading. No effect on other variants.
    pub fn with_alternate_id(mut self, id: impl Into<String>) -> Self {
        if let Node::Heading123456 { alternate_id, .. } = &mut self {
            *alternate_id = Some(id.into());
        }
        self
    }

    pub fn code_span(code: impl Into<String>) -> Self {
        Node::CodeSpan {
            children: vec![Node::text(code)],
        }
    }

    pub fn ordered_list(items: Vec<Node>) -> Self {
        Node::List {
            list_type: ListType::Ordered { start: 1 },
            children: items,
        }
    }

    pub fn unordered_list(items: Vec<Node>) -> Self {
        Node::List {
            list_type: ListType::Unordered,
            children: items,
        }
    }

    pub fn local_link(destination: impl Into<String>, children: Vec<Node>) -> Self {
        Node::LocalPageLink {
            destination: destination.into(),
            title: None,
            children,
        }
    }

    pub fn html(tag_name: &str, children: Vec<Node>) -> Self {
        Node::HtmlElement {
            tag_name: tag_name.to_string(),
            attributes: BTreeMap::new(),
            children,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Variant name, as used for the serialized `type` discriminant.
    pub fn type_name(&self) -> &'static str {
        match self {
            Node::PlainText { .. } => "PlainText",
            Node::HorizontalRule => "HorizontalRule",
            Node::HtmlComment { .. } => "HtmlComment",
            Node::Image { .. } => "Image",
            Node::CodeBlock { .. } => "CodeBlock",
            Node::DoNotEditComment => "DoNotEditComment",
            Node::Container { .. } => "Container",
            Node::BlockQuote { .. } => "BlockQuote",
            Node::HtmlElement { .. } => "HtmlElement",
            Node::Italics { .. } => "Italics",
            Node::Bold { .. } => "Bold",
            Node::Strikethrough { .. } => "Strikethrough",
            Node::CodeSpan { .. } => "CodeSpan",
            Node::RichCodeBlock { .. } => "RichCodeBlock",
            Node::Link { .. } => "Link",
            Node::LocalPageLink { .. } => "LocalPageLink",
            Node::GithubSourceLink { .. } => "GithubSourceLink",
            Node::Paragraph { .. } => "Paragraph",
            Node::Heading123456 { .. } => "Heading123456",
            Node::List { .. } => "List",
            Node::Table { .. } => "Table",
            Node::CollapsibleSection { .. } => "CollapsibleSection",
            Node::Page { .. } => "Page",
        }
    }

    /// The main ordered child sequence, if this variant has one.
    ///
    /// Table rows and the collapsible summary are separate roles and are not
    /// included.
    pub fn children(&self) -> Option<&[Node]> {
        match self {
            Node::PlainText { .. }
            | Node::HorizontalRule
            | Node::HtmlComment { .. }
            | Node::Image { .. }
            | Node::CodeBlock { .. }
            | Node::DoNotEditComment
            | Node::Table { .. } => None,
            Node::Container { children }
            | Node::BlockQuote { children }
            | Node::HtmlElement { children, .. }
            | Node::Italics { children }
            | Node::Bold { children }
            | Node::Strikethrough { children }
            | Node::CodeSpan { children }
            | Node::RichCodeBlock { children, .. }
            | Node::Link { children, .. }
            | Node::LocalPageLink { children, .. }
            | Node::GithubSourceLink { children, .. }
            | Node::Paragraph { children }
            | Node::Heading123456 { children, .. }
            | Node::List { children, .. }
            | Node::CollapsibleSection { children, .. }
            | Node::Page { children, .. } => Some(children),
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::PlainText { .. }
            | Node::HorizontalRule
            | Node::HtmlComment { .. }
            | Node::Image { .. }
            | Node::CodeBlock { .. }
            | Node::DoNotEditComment
            | Node::Table { .. } => None,
            Node::Container { children }
            | Node::BlockQuote { children }
            | Node::HtmlElement { children, .. }
            | Node::Italics { children }
            | Node::Bold { children }
            | Node::Strikethrough { children }
            | Node::CodeSpan { children }
            | Node::RichCodeBlock { children, .. }
            | Node::Link { children, .. }
            | Node::LocalPageLink { children, .. }
            | Node::GithubSourceLink { children, .. }
            | Node::Paragraph { children }
            | Node::Heading123456 { children, .. }
            | Node::List { children, .. }
            | Node::CollapsibleSection { children, .. }
            | Node::Page { children, .. } => Some(children),
        }
    }

    /// Concatenated text of every PlainText and code leaf under this node.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::PlainText { text } => out.push_str(text),
            Node::CodeBlock { code, .. } => out.push_str(code),
            Node::Table { header, rows } => {
                for cell in header.children.iter().chain(rows.iter().flat_map(|r| &r.children)) {
                    cell.collect_text(out);
                }
            }
            Node::CollapsibleSection {
                summary_node,
                children,
            } => {
                summary_node.collect_text(out);
                for child in children {
                    child.collect_text(out);
                }
            }
            other => {
                if let Some(children) = other.children() {
                    for child in children {
                        child.collect_text(out);
                    }
                }
            }
        }
    }

    /// Parse a node tree from its JSON form.
    pub fn from_json(input: &str) -> Result<Node, ParseError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Parse a node tree from its YAML form.
    pub fn from_yaml(input: &str) -> Result<Node, ParseError> {
        Ok(serde_yaml::from_str(input)?)
    }
}

/// Check that `id` is usable as a same-page fragment: non-empty, no
/// whitespace, no `#`, and only characters that survive in an HTML `name`
/// attribute unescaped.
pub fn is_valid_anchor(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
}

// ------------------------------------------------------------------
// Tests
// ------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn json_uses_type_discriminant() {
        let json = r#"{
            "type": "Heading123456",
            "level": 2,
            "alternateId": "foo",
            "children": [{ "type": "PlainText", "text": "Foo" }]
        }"#;
        let node = Node::from_json(json).unwrap();
        assert_eq!(
            node,
            Node::title(vec![Node::text("Foo")]).with_alternate_id("foo")
        );
    }

    #[test]
    fn json_list_type() {
        let json = r#"{
            "type": "List",
            "listType": { "kind": "Ordered", "start": 3 },
            "children": []
        }"#;
        let node = Node::from_json(json).unwrap();
        assert!(matches!(
            node,
            Node::List {
                list_type: ListType::Ordered { start: 3 },
                ..
            }
        ));
    }

    #[test]
    fn yaml_table() {
        let yaml = "
type: Table
header:
  children:
    - type: PlainText
      text: Name
rows:
  - children:
      - type: PlainText
        text: foo
";
        let node = Node::from_yaml(yaml).unwrap();
        match node {
            Node::Table { header, rows } => {
                assert_eq!(header.children.len(), 1);
                assert_eq!(rows.len(), 1);
            }
            other => panic!("Expected Table, got {other:?}"),
        }
    }

    #[test]
    fn unknown_type_is_a_parse_error() {
        let err = Node::from_json(r#"{ "type": "Footnote", "children": [] }"#);
        assert!(err.is_err());
    }

    #[test]
    fn heading_aliases_fix_level() {
        let levels: Vec<u8> = [
            Node::page_title(vec![]),
            Node::title(vec![]),
            Node::heading(vec![]),
            Node::subheading(vec![]),
        ]
        .iter()
        .map(|n| match n {
            Node::Heading123456 { level, .. } => *level,
            _ => 0,
        })
        .collect();
        assert_eq!(levels, vec![1, 2, 3, 4]);
    }

    #[test]
    fn text_content_walks_compound_nodes() {
        let node = Node::Table {
            header: Row::new(vec![Node::text("a")]),
            rows: vec![Row::new(vec![Node::Bold {
                children: vec![Node::text("b")],
            }])],
        };
        assert_eq!(node.text_content(), "ab");
    }

    #[test]
    fn anchor_validity() {
        assert!(is_valid_anchor("foo-function"));
        assert!(!is_valid_anchor(""));
        assert!(!is_valid_anchor("has space"));
        assert!(!is_valid_anchor("#foo"));
        assert!(!is_valid_anchor("a\"b"));
    }
}
