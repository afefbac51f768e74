//! Anchors and tables of contents.
//!
//! Several declarations may share one export name. When a name carries more
//! than one kind, each kind gets its own anchor (`name-kind`) next to the
//! name's own anchor, and the table of contents links to all of them.

use std::collections::BTreeMap;

use crate::error::{RenderError, Result};
use crate::model::{ApiItemKind, ApiModel};
use crate::node::{KindRef, Node, TableOfContents, TocEntry, is_valid_anchor};
use crate::site::Section;

/// Anchor for an export name, optionally qualified by kind.
///
/// ```
/// use apidoc_render::anchors::anchor_for;
/// use apidoc_render::model::ApiItemKind;
///
/// assert_eq!(anchor_for("Foo", None), "foo");
/// assert_eq!(anchor_for("Foo", Some(ApiItemKind::TypeAlias)), "foo-typealias");
/// ```
pub fn anchor_for(name: &str, kind: Option<ApiItemKind>) -> String {
    let mut anchor = slug(name);
    if let Some(kind) = kind {
        anchor.push('-');
        anchor.push_str(&slug(kind.label()));
    }
    anchor
}

/// Lowercase `text` and drop everything an anchor cannot hold. Spaces are
/// stripped.
fn slug(text: &str) -> String {
    let slug: String = text
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
        .flat_map(char::to_lowercase)
        .collect();
    if slug.is_empty() { "_".to_string() } else { slug }
}

/// Anchor of a titled page section: words joined by `-`.
pub fn section_anchor(title: &str) -> String {
    let joined = title.split_whitespace().collect::<Vec<_>>().join("-");
    slug(&joined)
}

/// The kinds declared under every export name, with their anchors.
#[derive(Debug, Clone, Default)]
pub struct AnchorTable {
    kinds: BTreeMap<String, Vec<ApiItemKind>>,
}

impl AnchorTable {
    /// Collect kinds per export name. Interfaces, type aliases and variables
    /// may be declared only once per name.
    pub fn build(model: &ApiModel) -> Result<Self> {
        let mut counts: BTreeMap<&str, BTreeMap<ApiItemKind, usize>> = BTreeMap::new();
        for item in &model.items {
            *counts
                .entry(item.name.as_str())
                .or_default()
                .entry(item.kind)
                .or_default() += 1;
        }

        let mut kinds = BTreeMap::new();
        for (name, per_kind) in counts {
            if let Some((&kind, _)) = per_kind
                .iter()
                .find(|(kind, count)| kind.is_unique() && **count > 1)
            {
                return Err(RenderError::DuplicateDeclaration {
                    name: name.to_string(),
                    kind,
                });
            }
            kinds.insert(name.to_string(), per_kind.into_keys().collect());
        }

        Ok(Self { kinds })
    }

    /// Kinds declared under `name`, in a fixed order.
    pub fn kinds_of(&self, name: &str) -> &[ApiItemKind] {
        self.kinds.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_multiple_kinds(&self, name: &str) -> bool {
        self.kinds_of(name).len() > 1
    }

    /// Anchor of the export heading for `name`.
    pub fn name_anchor(&self, name: &str) -> String {
        anchor_for(name, None)
    }

    /// Anchor for one kind of `name`: qualified only when the name has
    /// several kinds.
    pub fn anchor(&self, name: &str, kind: ApiItemKind) -> String {
        if self.has_multiple_kinds(name) {
            anchor_for(name, Some(kind))
        } else {
            anchor_for(name, None)
        }
    }

    /// Per-kind references for the table of contents. Empty for single-kind
    /// names.
    pub fn kind_refs(&self, name: &str) -> Vec<KindRef> {
        if !self.has_multiple_kinds(name) {
            return Vec::new();
        }
        self.kinds_of(name)
            .iter()
            .map(|&kind| KindRef {
                label: kind.label().to_string(),
                anchor: anchor_for(name, Some(kind)),
            })
            .collect()
    }

    /// Table of contents for one page's sections. Titled sections become
    /// grouping entries over their exports.
    pub fn build_toc(&self, sections: &[Section]) -> TableOfContents {
        let mut entries = Vec::new();
        for section in sections {
            let exports: Vec<TocEntry> = section
                .exports
                .iter()
                .map(|name| TocEntry {
                    title: name.clone(),
                    anchor: Some(self.name_anchor(name)),
                    kinds: self.kind_refs(name),
                    children: Vec::new(),
                })
                .collect();
            match &section.title {
                Some(title) => entries.push(TocEntry {
                    title: title.clone(),
                    anchor: Some(section_anchor(title)),
                    kinds: Vec::new(),
                    children: exports,
                }),
                None => entries.extend(exports),
            }
        }
        TableOfContents { entries }
    }
}

/// Render a table of contents as a nested ordered list of same-page links.
pub fn toc_to_node(toc: &TableOfContents) -> Node {
    Node::ordered_list(toc.entries.iter().map(entry_to_node).collect())
}

fn entry_to_node(entry: &TocEntry) -> Node {
    let mut parts = Vec::new();
    match &entry.anchor {
        Some(anchor) if is_valid_anchor(anchor) => parts.push(Node::local_link(
            format!("#{anchor}"),
            vec![Node::text(&entry.title)],
        )),
        _ => parts.push(Node::text(&entry.title)),
    }

    if !entry.kinds.is_empty() {
        parts.push(Node::text(" ("));
        for (i, kind) in entry.kinds.iter().enumerate() {
            if i > 0 {
                parts.push(Node::text(", "));
            }
            parts.push(Node::local_link(
                format!("#{}", kind.anchor),
                vec![Node::text(&kind.label)],
            ));
        }
        parts.push(Node::text(")"));
    }

    if !entry.children.is_empty() {
        parts.push(Node::ordered_list(
            entry.children.iter().map(entry_to_node).collect(),
        ));
    }

    if parts.len() == 1 {
        parts.remove(0)
    } else {
        Node::container(parts)
    }
}
