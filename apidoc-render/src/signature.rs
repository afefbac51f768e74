//! Declaration signatures as code blocks.
//!
//! Excerpt tokens are drained from a queue. Tokens that reference an exported
//! item become links to that item's page; tokens that reference a
//! non-exported symbol are replaced by that symbol's own tokens, pushed back
//! onto the front of the queue. Everything else is literal text.

use std::collections::{BTreeMap, VecDeque};

use crate::anchors::AnchorTable;
use crate::error::{Diagnostic, ResolveError};
use crate::format::format_signature;
use crate::model::{ApiItem, Excerpt, ExcerptToken};
use crate::node::Node;
use crate::reference::{ReferenceResolver, Resolution};

/// Language tag on signature code blocks.
pub const SIGNATURE_LANGUAGE: &str = "typescript";

/// How many local declarations may be nested inside one another before
/// expansion stops.
pub const MAX_EXPANSION_DEPTH: usize = 8;

/// Builds signature nodes for declarations.
#[derive(Debug)]
pub struct SignatureBuilder<'a> {
    resolver: &'a ReferenceResolver<'a>,
    anchors: &'a AnchorTable,
    /// Export name to the page it is documented on.
    routes: &'a BTreeMap<String, String>,
}

impl<'a> SignatureBuilder<'a> {
    pub fn new(
        resolver: &'a ReferenceResolver<'a>,
        anchors: &'a AnchorTable,
        routes: &'a BTreeMap<String, String>,
    ) -> Self {
        Self {
            resolver,
            anchors,
            routes,
        }
    }

    /// Build the code block for `excerpt`. Resolution and formatting
    /// failures degrade to literal text and are reported in `diagnostics`.
    pub fn build(&self, excerpt: &Excerpt, diagnostics: &mut Vec<Diagnostic>) -> Node {
        let mut queue: VecDeque<(ExcerptToken, usize)> =
            excerpt.tokens.iter().cloned().map(|token| (token, 0)).collect();
        let mut children: Vec<Node> = Vec::new();
        let mut has_links = false;

        while let Some((token, depth)) = queue.pop_front() {
            match self.resolve(&token, depth) {
                Ok(Resolution::NotAReference) => push_text(&mut children, &token.text),
                Ok(Resolution::ExportReference(item)) => match self.link_to(item, &token.text) {
                    Ok(link) => {
                        children.push(link);
                        has_links = true;
                    }
                    Err(err) => {
                        report(&err, diagnostics);
                        push_text(&mut children, &token.text);
                    }
                },
                Ok(Resolution::LocalExpansion(tokens)) => {
                    for expanded in tokens.into_iter().rev() {
                        queue.push_front((expanded, depth + 1));
                    }
                }
                Err(err) => {
                    report(&err, diagnostics);
                    push_text(&mut children, &token.text);
                }
            }
        }

        if has_links {
            return Node::RichCodeBlock {
                language: SIGNATURE_LANGUAGE.to_string(),
                children,
            };
        }

        let text: String = children.iter().map(Node::text_content).collect();
        let code = match format_signature(&text) {
            Ok(formatted) => formatted,
            Err(err) => {
                tracing::warn!("Unable to format signature: {err}");
                diagnostics.push(Diagnostic::warning(
                    "F001",
                    format!("Unable to format signature '{}': {err}", text.trim()),
                ));
                text
            }
        };
        Node::CodeBlock {
            language: Some(SIGNATURE_LANGUAGE.to_string()),
            code,
        }
    }

    fn resolve(&self, token: &ExcerptToken, depth: usize) -> Result<Resolution<'a>, ResolveError> {
        match self.resolver.resolve(token)? {
            Resolution::LocalExpansion(_) if depth >= MAX_EXPANSION_DEPTH => {
                Err(ResolveError::ExpansionLimit(MAX_EXPANSION_DEPTH))
            }
            resolution => Ok(resolution),
        }
    }

    fn link_to(&self, item: &ApiItem, text: &str) -> Result<Node, ResolveError> {
        let page = self
            .routes
            .get(&item.name)
            .ok_or_else(|| ResolveError::Unrouted(item.name.clone()))?;
        let anchor = self.anchors.anchor(&item.name, item.kind);
        Ok(Node::local_link(
            format!("{page}#{anchor}"),
            vec![Node::text(text)],
        ))
    }
}

fn push_text(children: &mut Vec<Node>, text: &str) {
    if let Some(Node::PlainText { text: previous }) = children.last_mut() {
        previous.push_str(text);
    } else {
        children.push(Node::text(text));
    }
}

fn report(err: &ResolveError, diagnostics: &mut Vec<Diagnostic>) {
    tracing::warn!("{err}");
    diagnostics.push(Diagnostic::warning(err.code(), err.to_string()));
}
