//! Property-based tests using proptest.
//!
//! These tests check the simplifier's normal form and that rendering holds
//! its line-structure guarantees on arbitrary trees.

use apidoc_render::preview::preview_html;
use apidoc_render::{Node, RenderOptions, Row, simplify, to_markdown};
use proptest::prelude::*;

fn leaf() -> impl Strategy<Value = Node> {
    prop_oneof![
        4 => "[A-Za-z0-9 .,*_#()<>&|-]{0,12}".prop_map(Node::text),
        1 => "[a-z `]{0,8}".prop_map(Node::code_span),
        1 => Just(Node::HorizontalRule),
        1 => "[a-z ]{0,8}".prop_map(|comment| Node::HtmlComment { comment, persist: true }),
    ]
}

fn row(
    cell: impl Strategy<Value = Node>,
    cells: std::ops::RangeInclusive<usize>,
) -> impl Strategy<Value = Row> {
    prop::collection::vec(cell, cells).prop_map(Row::new)
}

/// Arbitrary trees up to a few levels deep. Every table has at least one
/// column.
fn node() -> impl Strategy<Value = Node> {
    leaf().prop_recursive(4, 48, 4, |inner| {
        let children = prop::collection::vec(inner.clone(), 0..4);
        prop_oneof![
            children.clone().prop_map(Node::container),
            children.clone().prop_map(Node::paragraph),
            children.clone().prop_map(|children| Node::Italics { children }),
            children.clone().prop_map(|children| Node::Bold { children }),
            children.clone().prop_map(|children| Node::BlockQuote { children }),
            children.clone().prop_map(Node::ordered_list),
            children.clone().prop_map(Node::unordered_list),
            (1u8..=6, children).prop_map(|(level, children)| Node::heading_level(level, children)),
            (row(inner.clone(), 1..=3), prop::collection::vec(row(inner, 0..=3), 0..3))
                .prop_map(|(header, rows)| Node::Table { header, rows }),
        ]
    })
}

fn in_table_cell(cell: Node) -> Node {
    Node::Table {
        header: Row::new(vec![Node::text("h")]),
        rows: vec![Row::new(vec![cell])],
    }
}

/// No bare `Container` below any node except as a list item.
fn assert_no_nested_containers(node: &Node) {
    let is_list = matches!(node, Node::List { .. });
    if let Some(children) = node.children() {
        for child in children {
            if !is_list {
                assert!(
                    !matches!(child, Node::Container { .. }),
                    "bare Container under {}: {node:?}",
                    node.type_name()
                );
            }
            assert_no_nested_containers(child);
        }
    }
    if let Node::Table { header, rows } = node {
        for cell in std::iter::once(header).chain(rows).flat_map(|r| &r.children) {
            assert_no_nested_containers(cell);
        }
    }
}

proptest! {
    /// Simplifying an already simplified tree changes nothing.
    #[test]
    fn simplify_is_idempotent(tree in node()) {
        let once = simplify(tree);
        let twice = simplify(once.clone());
        prop_assert_eq!(once, twice);
    }

    /// After simplification, containers only survive as list items, table
    /// cells or the root.
    #[test]
    fn simplify_flattens_containers(tree in node()) {
        assert_no_nested_containers(&simplify(tree));
    }

    /// Any well-formed tree renders.
    #[test]
    fn arbitrary_trees_render(tree in node()) {
        let result = to_markdown(&tree, &RenderOptions::default());
        prop_assert!(result.is_ok(), "{:?} for {:?}", result, tree);
    }

    /// Any tree placed in a table cell falls back to single-line forms and
    /// leaves the table three rows of Markdown.
    #[test]
    fn arbitrary_tree_in_table_cell_stays_on_its_row(tree in node()) {
        let markdown = to_markdown(&in_table_cell(tree.clone()), &RenderOptions::default());
        prop_assert!(markdown.is_ok(), "{:?} for {:?}", markdown, tree);
        let markdown = markdown.unwrap();
        let lines: Vec<&str> = markdown.trim_matches('\n').lines().collect();
        prop_assert_eq!(lines.len(), 3, "{:?}", markdown);
        prop_assert!(lines.iter().all(|line| line.starts_with('|')), "{:?}", markdown);
        prop_assert!(preview_html(&markdown).contains("<table>"));
    }

    /// Emphasis markers in text that lands inside an HTML fallback in a table
    /// cell are shown literally.
    #[test]
    fn markers_in_cell_fallbacks_stay_literal(
        text in "[a-z ]{0,4}([*_]{1,2}[a-z]{1,4}[*_]{1,2}[a-z ]{0,4}){1,3}",
    ) {
        let cells = [
            Node::text(&text),
            Node::paragraph(vec![Node::text(&text)]),
            Node::BlockQuote { children: vec![Node::text(&text)] },
            Node::CodeBlock { language: None, code: text.clone() },
            Node::heading_level(3, vec![Node::text(&text)]),
        ];
        for cell in cells {
            let markdown = to_markdown(&in_table_cell(cell), &RenderOptions::default()).unwrap();
            let html = preview_html(&markdown);
            prop_assert!(!html.contains("<em>"), "{:?} -> {}", markdown, html);
            prop_assert!(!html.contains("<strong>"), "{:?} -> {}", markdown, html);
        }
    }

    /// A heading is one line of Markdown and parses back as that heading.
    #[test]
    fn heading_is_single_line(text in "[A-Za-z0-9][A-Za-z0-9 .,:;!?*_()<>&-]{0,40}") {
        let markdown = to_markdown(&Node::title(vec![Node::text(&text)]), &RenderOptions::default())
            .unwrap();
        prop_assert!(!markdown.trim_matches('\n').contains('\n'), "{markdown:?}");
        prop_assert!(preview_html(&markdown).contains("<h2>"));
    }

    /// Tables of any width, ragged rows included, render as a table.
    #[test]
    fn tables_of_any_width_render(
        header in prop::collection::vec("[a-z]{1,8}", 1..8),
        rows in prop::collection::vec(prop::collection::vec("[a-z]{0,8}", 0..10), 0..5),
    ) {
        let cells = |texts: Vec<String>| Row::new(texts.into_iter().map(Node::text).collect());
        let row_count = rows.len();
        let table = Node::Table {
            header: cells(header),
            rows: rows.into_iter().map(cells).collect(),
        };
        let markdown = to_markdown(&table, &RenderOptions::default()).unwrap();
        prop_assert_eq!(markdown.trim_matches('\n').lines().count(), row_count + 2);
        prop_assert!(preview_html(&markdown).contains("<table>"));
    }

    /// Newlines inside a table cell never break the row.
    #[test]
    fn cell_text_stays_on_its_row(text in "[a-z\n]{0,20}") {
        let table = Node::Table {
            header: Row::new(vec![Node::text("h")]),
            rows: vec![Row::new(vec![Node::text(&text)])],
        };
        let markdown = to_markdown(&table, &RenderOptions::default()).unwrap();
        prop_assert_eq!(markdown.trim_matches('\n').lines().count(), 3);
    }
}
