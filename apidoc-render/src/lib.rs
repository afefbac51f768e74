//! `apidoc-render`: Markdown serializer for API documentation trees.
//!
//! Documentation arrives as a tree of [`Node`] values built from extracted
//! declarations and translated doc comments. This crate normalizes the tree,
//! renders it to CommonMark that stays valid wherever it lands (top level,
//! table cell, list item, open HTML block) and assembles whole pages from an
//! [`ApiModel`] and a static page configuration.
//!
//! # Quick start
//!
//! ```
//! use apidoc_render::{Node, RenderOptions, to_markdown};
//!
//! let doc = Node::container(vec![
//!     Node::title(vec![Node::text("Title")]),
//!     Node::paragraph(vec![Node::text("Some "), Node::code_span("code"), Node::text(".")]),
//! ]);
//! let markdown = to_markdown(&doc, &RenderOptions::default()).unwrap();
//! assert_eq!(markdown, "\n## Title\n\nSome `code`.");
//! ```

pub mod anchors;
pub mod error;
pub mod escape;
pub mod format;
pub mod html;
pub mod links;
pub mod model;
pub mod node;
pub mod output;
pub mod preview;
pub mod reference;
pub mod render_md;
pub mod signature;
pub mod simplify;
pub mod site;
pub mod validate;
pub mod writer;

pub use error::*;
pub use model::{ApiItem, ApiItemKind, ApiModel, Excerpt, ExcerptToken, ExcerptTokenKind, ItemIndex};
pub use node::*;
pub use render_md::{MarkdownRenderer, RenderOptions, render_markdown, to_markdown};
pub use simplify::simplify;
pub use site::{
    BuiltPage, BuiltSite, PageEntry, RenderedPage, RenderedSite, Section, SiteConfig, build_site,
    render_site,
};

impl Node {
    /// Simplify and render this tree as Markdown.
    pub fn to_markdown(&self, options: &RenderOptions) -> Result<String> {
        render_md::to_markdown(self, options)
    }

    /// Validate this tree and return any diagnostics.
    pub fn validate(&self) -> Vec<crate::error::Diagnostic> {
        validate::validate(self)
    }
}
