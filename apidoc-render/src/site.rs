//! Page assembly: one `Page` node per configured page.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::anchors::{AnchorTable, section_anchor};
use crate::error::{Diagnostic, RenderError, Result};
use crate::model::{ApiItem, ApiModel, ItemIndex};
use crate::node::{Node, PageMetadata};
use crate::reference::ReferenceResolver;
use crate::render_md::{RenderOptions, to_markdown};
use crate::signature::SignatureBuilder;

/// Static page routing and rendering settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    #[serde(default)]
    pub pages: Vec<PageEntry>,
    /// Prefix for source links, e.g. `https://github.com/org/repo/blob/main`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_base_url: Option<String>,
    /// Shadowed global name to the suffixed name it was exported under.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub renamed_globals: BTreeMap<String, String>,
    #[serde(default)]
    pub strip_transient_comments: bool,
}

/// One output page and the exports documented on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEntry {
    /// Site-root-relative output path, e.g. `api/core.md`.
    pub path: String,
    pub title: String,
    #[serde(default)]
    pub sections: Vec<Section>,
}

/// A group of exports, optionally under its own heading.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub exports: Vec<String>,
}

impl SiteConfig {
    /// Export name to the page documenting it. The first page listing a
    /// name wins.
    pub fn routes(&self) -> BTreeMap<String, String> {
        let mut routes = BTreeMap::new();
        for page in &self.pages {
            for name in page.sections.iter().flat_map(|s| &s.exports) {
                routes
                    .entry(name.clone())
                    .or_insert_with(|| page.path.clone());
            }
        }
        routes
    }

    pub fn render_options(&self, page_path: &str) -> RenderOptions {
        RenderOptions {
            page_path: page_path.to_string(),
            source_base_url: self.source_base_url.clone(),
            strip_transient_comments: self.strip_transient_comments,
        }
    }
}

/// A page node and where it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltPage {
    pub path: String,
    pub node: Node,
}

#[derive(Debug, Clone, Default)]
pub struct BuiltSite {
    pub pages: Vec<BuiltPage>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Rendered Markdown for one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub path: String,
    pub markdown: String,
}

#[derive(Debug, Clone, Default)]
pub struct RenderedSite {
    pub pages: Vec<RenderedPage>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Build a `Page` node for every configured page.
///
/// Recoverable problems (unresolved references, unformattable signatures,
/// exports listed on no page) are collected as diagnostics. Duplicate
/// declarations and missing metadata abort the build.
pub fn build_site(model: &ApiModel, site: &SiteConfig) -> Result<BuiltSite> {
    let index = ItemIndex::new(model);
    let anchors = AnchorTable::build(model)?;
    let routes = site.routes();
    let resolver = ReferenceResolver::new(&index, model, &site.renamed_globals);
    let signatures = SignatureBuilder::new(&resolver, &anchors, &routes);

    let mut diagnostics = Vec::new();
    for name in index.names() {
        if !routes.contains_key(name) {
            tracing::warn!("Export '{name}' is not listed on any page");
            diagnostics.push(Diagnostic::warning(
                "S001",
                format!("Export '{name}' is not listed on any page"),
            ));
        }
    }

    let mut pages = Vec::with_capacity(site.pages.len());
    for entry in &site.pages {
        tracing::debug!(page = %entry.path, "building page");
        let mut children = Vec::new();

        for section in &entry.sections {
            if let Some(title) = &section.title {
                children.push(
                    Node::title(vec![Node::text(title)]).with_alternate_id(section_anchor(title)),
                );
            }

            for name in &section.exports {
                let items = index.items_named(name);
                if items.is_empty() {
                    return Err(RenderError::MissingMetadata(format!(
                        "export '{name}' on page '{}' is not in the API model",
                        entry.path
                    )));
                }

                children.push(
                    Node::heading(vec![Node::text(name)]).with_alternate_id(anchors.name_anchor(name)),
                );
                let multiple = anchors.has_multiple_kinds(name);
                for &kind in anchors.kinds_of(name) {
                    if multiple {
                        children.push(
                            Node::subheading(vec![Node::text(kind.label())])
                                .with_alternate_id(anchors.anchor(name, kind)),
                        );
                    }
                    for item in items.iter().filter(|item| item.kind == kind) {
                        children.extend(item_nodes(item, &signatures, &mut diagnostics)?);
                    }
                }
            }
        }

        pages.push(BuiltPage {
            path: entry.path.clone(),
            node: Node::Page {
                metadata: PageMetadata {
                    title: entry.title.clone(),
                    table_of_contents: anchors.build_toc(&entry.sections),
                },
                children,
            },
        });
    }

    Ok(BuiltSite { pages, diagnostics })
}

/// Build and render every configured page.
pub fn render_site(model: &ApiModel, site: &SiteConfig) -> Result<RenderedSite> {
    let built = build_site(model, site)?;
    let mut pages = Vec::with_capacity(built.pages.len());
    for page in built.pages {
        let markdown = to_markdown(&page.node, &site.render_options(&page.path))?;
        pages.push(RenderedPage {
            path: page.path,
            markdown,
        });
    }
    Ok(RenderedSite {
        pages,
        diagnostics: built.diagnostics,
    })
}

/// Signature, doc comment and source links for one declaration.
fn item_nodes(
    item: &ApiItem,
    signatures: &SignatureBuilder<'_>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Vec<Node>> {
    if item.declarations.is_empty() {
        return Err(RenderError::MissingMetadata(format!(
            "{} '{}' has no source location",
            item.kind, item.name
        )));
    }

    let mut nodes = Vec::new();
    if !item.excerpt.tokens.is_empty() {
        nodes.push(signatures.build(&item.excerpt, diagnostics));
    }
    if let Some(doc) = &item.doc {
        nodes.push(doc.clone());
    }

    let mut defined_in = vec![
        Node::Italics {
            children: vec![Node::text("Defined in")],
        },
        Node::text(" "),
    ];
    for (i, location) in item.declarations.iter().enumerate() {
        if i > 0 {
            defined_in.push(Node::text(", "));
        }
        defined_in.push(Node::GithubSourceLink {
            destination: location.link_target(),
            title: None,
            children: vec![Node::text(location.display())],
        });
    }
    nodes.push(Node::paragraph(defined_in));
    Ok(nodes)
}
