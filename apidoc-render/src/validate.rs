//! Structural validation for node trees.
//!
//! Reports what the renderer would reject, or silently repair, without
//! rendering. Returns a list of `Diagnostic` items (non-fatal).

use crate::error::{Diagnostic, Severity};
use crate::html::{TagClass, classify};
use crate::node::{Node, Row, is_valid_anchor};

/// Validate a node tree and return any diagnostics.
///
/// Walks every child, table cell and collapsible summary. It never modifies
/// the tree.
pub fn validate(node: &Node) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    validate_node(node, &mut diagnostics);
    diagnostics
}

fn validate_node(node: &Node, diagnostics: &mut Vec<Diagnostic>) {
    match node {
        Node::Heading123456 {
            level,
            alternate_id,
            ..
        } => {
            if !(1..=6).contains(level) {
                diagnostics.push(Diagnostic::error(
                    "V001",
                    format!("Heading level {level} is outside 1..=6"),
                ));
            }
            if let Some(id) = alternate_id {
                if !is_valid_anchor(id) {
                    diagnostics.push(Diagnostic::error(
                        "V002",
                        format!("Heading anchor '{id}' is not a valid fragment"),
                    ));
                }
            }
        }

        Node::Table { header, rows } => {
            let columns = std::iter::once(header)
                .chain(rows)
                .map(|row| row.children.len())
                .max()
                .unwrap_or(0);
            if columns == 0 {
                diagnostics.push(Diagnostic::error("V010", "Table has no columns"));
            }
            for (i, row) in rows.iter().enumerate() {
                if row.children.len() < columns {
                    diagnostics.push(Diagnostic {
                        severity: Severity::Info,
                        message: format!(
                            "Table row {} has {} of {columns} cells; it will be padded",
                            i + 1,
                            row.children.len()
                        ),
                        code: Some("V011".into()),
                    });
                }
            }
            validate_row(header, diagnostics);
            for row in rows {
                validate_row(row, diagnostics);
            }
            return;
        }

        Node::HtmlElement {
            tag_name, children, ..
        } => {
            if tag_name.is_empty() || !tag_name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
            {
                diagnostics.push(Diagnostic::error(
                    "V021",
                    format!("Invalid HTML tag name '{tag_name}'"),
                ));
            } else if classify(tag_name) == TagClass::SelfClosing && !children.is_empty() {
                diagnostics.push(Diagnostic::warning(
                    "V020",
                    format!("Self-closing <{tag_name}> has children; they will be dropped"),
                ));
            }
        }

        Node::Link { destination, .. }
        | Node::LocalPageLink { destination, .. }
        | Node::GithubSourceLink { destination, .. } => {
            if destination.trim().is_empty() {
                diagnostics.push(Diagnostic::warning(
                    "V030",
                    format!("{} has an empty destination", node.type_name()),
                ));
            }
        }

        Node::Image { src, .. } => {
            if src.trim().is_empty() {
                diagnostics.push(Diagnostic::warning("V031", "Image has an empty src"));
            }
        }

        Node::Page { metadata, .. } => {
            if metadata.title.trim().is_empty() {
                diagnostics.push(Diagnostic::warning("V040", "Page has an empty title"));
            }
        }

        Node::CollapsibleSection { summary_node, .. } => {
            validate_node(summary_node, diagnostics);
        }

        _ => {}
    }

    if let Some(children) = node.children() {
        for child in children {
            validate_node(child, diagnostics);
        }
    }
}

fn validate_row(row: &Row, diagnostics: &mut Vec<Diagnostic>) {
    for cell in &row.children {
        validate_node(cell, diagnostics);
    }
}

// ---- Tests ----
