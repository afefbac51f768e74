//! The API item model supplied by the source analyzer.
//!
//! These are boundary types: declarations, source locations and signature
//! excerpts are extracted upstream and arrive here already structured.
//! Doc comments arrive already translated into [`Node`] trees.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::node::Node;
use crate::reference::normalize_reference;

/// Declaration kinds an export name can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ApiItemKind {
    Class,
    Enum,
    Function,
    Interface,
    Namespace,
    TypeAlias,
    Variable,
}

impl ApiItemKind {
    /// Human-readable label, as shown in kind sub-headings.
    pub fn label(self) -> &'static str {
        match self {
            ApiItemKind::Class => "Class",
            ApiItemKind::Enum => "Enum",
            ApiItemKind::Function => "Function",
            ApiItemKind::Interface => "Interface",
            ApiItemKind::Namespace => "Namespace",
            ApiItemKind::TypeAlias => "Type Alias",
            ApiItemKind::Variable => "Variable",
        }
    }

    /// Kinds that must be declared at most once per export name.
    pub fn is_unique(self) -> bool {
        matches!(
            self,
            ApiItemKind::Interface | ApiItemKind::TypeAlias | ApiItemKind::Variable
        )
    }
}

impl fmt::Display for ApiItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where a declaration lives in the source repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Repository-relative file path.
    pub path: String,
    /// 1-based line number.
    pub line: u32,
}

impl SourceLocation {
    /// `path#L<line>`, the form used for GitHub source links.
    pub fn link_target(&self) -> String {
        format!("{}#L{}", self.path, self.line)
    }

    pub fn display(&self) -> String {
        format!("{}:{}", self.path, self.line)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExcerptTokenKind {
    Content,
    Reference,
}

/// One lexical piece of a declaration's printed signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExcerptToken {
    pub kind: ExcerptTokenKind,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_reference: Option<String>,
}

impl ExcerptToken {
    pub fn content(text: impl Into<String>) -> Self {
        Self {
            kind: ExcerptTokenKind::Content,
            text: text.into(),
            canonical_reference: None,
        }
    }

    pub fn reference(text: impl Into<String>, canonical_reference: impl Into<String>) -> Self {
        Self {
            kind: ExcerptTokenKind::Reference,
            text: text.into(),
            canonical_reference: Some(canonical_reference.into()),
        }
    }
}

/// A declaration's printed signature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Excerpt {
    #[serde(default)]
    pub tokens: Vec<ExcerptToken>,
}

impl Excerpt {
    pub fn new(tokens: Vec<ExcerptToken>) -> Self {
        Self { tokens }
    }

    pub fn text(&self) -> String {
        self.tokens.iter().map(|t| t.text.as_str()).collect()
    }

    pub fn has_references(&self) -> bool {
        self.tokens
            .iter()
            .any(|t| t.kind == ExcerptTokenKind::Reference && t.canonical_reference.is_some())
    }
}

/// One exported declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiItem {
    /// Exported name. Several items may share one.
    pub name: String,
    pub kind: ApiItemKind,
    pub canonical_reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overload_index: Option<u32>,
    #[serde(default)]
    pub declarations: Vec<SourceLocation>,
    #[serde(default)]
    pub excerpt: Excerpt,
    /// The translated doc comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<Node>,
}

/// Everything the source analyzer exported for one package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiModel {
    pub package_name: String,
    #[serde(default)]
    pub items: Vec<ApiItem>,
    /// Signatures of non-exported symbols, keyed by canonical reference.
    #[serde(default)]
    pub local_declarations: BTreeMap<String, Excerpt>,
}

impl ApiModel {
    pub fn from_json(input: &str) -> Result<Self, ParseError> {
        Ok(serde_json::from_str(input)?)
    }
}

/// Lookup tables over an [`ApiModel`].
#[derive(Debug)]
pub struct ItemIndex<'a> {
    by_reference: HashMap<String, &'a ApiItem>,
    by_name: BTreeMap<&'a str, Vec<&'a ApiItem>>,
}

impl<'a> ItemIndex<'a> {
    pub fn new(model: &'a ApiModel) -> Self {
        let mut by_reference = HashMap::new();
        let mut by_name: BTreeMap<&'a str, Vec<&'a ApiItem>> = BTreeMap::new();

        for item in &model.items {
            let reference = normalize_reference(&item.canonical_reference, item.overload_index);
            by_reference.insert(reference, item);
            by_name.entry(item.name.as_str()).or_default().push(item);
        }

        Self {
            by_reference,
            by_name,
        }
    }

    /// Look up an item by (normalized) canonical reference.
    pub fn by_reference(&self, reference: &str) -> Option<&'a ApiItem> {
        self.by_reference.get(reference).copied()
    }

    /// All items exported under `name`, in model order.
    pub fn items_named(&self, name: &str) -> &[&'a ApiItem] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn names(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.by_name.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn item(name: &str, kind: ApiItemKind, reference: &str) -> ApiItem {
        ApiItem {
            name: name.into(),
            kind,
            canonical_reference: reference.into(),
            overload_index: None,
            declarations: vec![],
            excerpt: Excerpt::default(),
            doc: None,
        }
    }

    #[test]
    fn parse_model_json() {
        let json = r#"{
            "packageName": "pkg",
            "items": [{
                "name": "foo",
                "kind": "Function",
                "canonicalReference": "pkg!foo:function(1)",
                "declarations": [{ "path": "src/foo.ts", "line": 3 }],
                "excerpt": { "tokens": [
                    { "kind": "Content", "text": "export declare function foo(): " },
                    { "kind": "Reference", "text": "Bar", "canonicalReference": "pkg!Bar:interface" }
                ] }
            }]
        }"#;
        let model = ApiModel::from_json(json).unwrap();
        assert_eq!(model.items.len(), 1);
        let foo = &model.items[0];
        assert_eq!(foo.kind, ApiItemKind::Function);
        assert_eq!(foo.declarations[0].link_target(), "src/foo.ts#L3");
        assert!(foo.excerpt.has_references());
        assert_eq!(foo.excerpt.text(), "export declare function foo(): Bar");
    }

    #[test]
    fn index_normalizes_function_references() {
        let model = ApiModel {
            package_name: "pkg".into(),
            items: vec![
                item("foo", ApiItemKind::Function, "pkg!foo:function"),
                item("foo", ApiItemKind::Variable, "pkg!foo:var"),
            ],
            local_declarations: BTreeMap::new(),
        };
        let index = ItemIndex::new(&model);
        assert!(index.by_reference("pkg!foo:function(1)").is_some());
        assert!(index.by_reference("pkg!foo:var").is_some());
        assert_eq!(index.items_named("foo").len(), 2);
        assert!(index.items_named("missing").is_empty());
    }

    #[test]
    fn kind_labels() {
        assert_eq!(ApiItemKind::TypeAlias.to_string(), "Type Alias");
        assert!(ApiItemKind::Variable.is_unique());
        assert!(!ApiItemKind::Function.is_unique());
    }
}
