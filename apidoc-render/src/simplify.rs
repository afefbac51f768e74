//! Pre-render normalization of the node tree.
//!
//! One bottom-up pass:
//! - bare `Container` children are spliced into their parent and adjacent
//!   `PlainText` siblings are merged;
//! - list items are kept as they are, except that a single-child item
//!   wrapper is unwrapped (item boundaries carry meaning);
//! - table cells are simplified one by one, never across cells;
//! - a collapsible section's summary is simplified on its own.
//!
//! The pass is idempotent.

use crate::node::{Node, Row};

/// Return the normalized form of `node`.
pub fn simplify(node: Node) -> Node {
    match node {
        Node::List {
            list_type,
            children,
        } => Node::List {
            list_type,
            children: children
                .into_iter()
                .map(|child| unwrap_single_child(simplify(child)))
                .collect(),
        },
        Node::Table { header, rows } => Node::Table {
            header: simplify_row(header),
            rows: rows.into_iter().map(simplify_row).collect(),
        },
        Node::CollapsibleSection {
            summary_node,
            children,
        } => Node::CollapsibleSection {
            summary_node: Box::new(simplify(*summary_node)),
            children: flatten_children(children),
        },
        mut other => {
            if let Some(children) = other.children_mut() {
                let taken = std::mem::take(children);
                *children = flatten_children(taken);
            }
            other
        }
    }
}

fn simplify_row(row: Row) -> Row {
    Row {
        children: row
            .children
            .into_iter()
            .map(|cell| unwrap_single_child(simplify(cell)))
            .collect(),
    }
}

fn unwrap_single_child(node: Node) -> Node {
    match node {
        Node::Container { mut children } if children.len() == 1 => children.remove(0),
        other => other,
    }
}

/// Simplify each child, splice bare containers in place and merge text runs.
///
/// A simplified container never has container children of its own, so one
/// level of splicing leaves none behind.
fn flatten_children(children: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(children.len());
    for child in children {
        match simplify(child) {
            Node::Container { children: inner } => {
                for node in inner {
                    push_merging_text(&mut out, node);
                }
            }
            node => push_merging_text(&mut out, node),
        }
    }
    out
}

fn push_merging_text(out: &mut Vec<Node>, node: Node) {
    if let Node::PlainText { text } = &node {
        if let Some(Node::PlainText { text: previous }) = out.last_mut() {
            previous.push_str(text);
            return;
        }
    }
    out.push(node);
}
