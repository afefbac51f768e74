//! Resolution of signature tokens to the items they reference.
//!
//! Canonical references have the shape `package!Name:kind`, with an
//! overload suffix `(n)` on functions. A reference without a package
//! (`!Name:kind`) names a global and has no page. A reference whose name
//! starts with `~` names a non-exported symbol: its own signature tokens are
//! spliced into the excerpt in place of a link.

use std::collections::BTreeMap;

use crate::error::ResolveError;
use crate::model::{ApiItem, ApiModel, ExcerptToken, ExcerptTokenKind, ItemIndex};

/// Marker that separates the package from the symbol path.
const PACKAGE_SEPARATOR: char = '!';

/// Prefix on a symbol path that marks a non-exported declaration.
const LOCAL_MARKER: char = '~';

const FUNCTION_KIND: &str = ":function";

/// What a signature token stands for.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<'a> {
    /// Plain text, or a reference to something that has no page.
    NotAReference,
    /// An exported item: rendered as a link to its page.
    ExportReference(&'a ApiItem),
    /// A non-exported symbol: these tokens replace the reference.
    LocalExpansion(Vec<ExcerptToken>),
}

/// Append the overload suffix to a function reference that lacks one.
///
/// ```
/// use apidoc_render::reference::normalize_reference;
///
/// assert_eq!(normalize_reference("pkg!foo:function", None), "pkg!foo:function(1)");
/// assert_eq!(normalize_reference("pkg!foo:function", Some(2)), "pkg!foo:function(2)");
/// assert_eq!(normalize_reference("pkg!foo:function(3)", None), "pkg!foo:function(3)");
/// assert_eq!(normalize_reference("pkg!Bar:interface", None), "pkg!Bar:interface");
/// ```
pub fn normalize_reference(reference: &str, overload_index: Option<u32>) -> String {
    if reference.ends_with(FUNCTION_KIND) {
        format!("{reference}({})", overload_index.unwrap_or(1))
    } else {
        reference.to_string()
    }
}

/// Resolves excerpt tokens against an [`ItemIndex`].
#[derive(Debug)]
pub struct ReferenceResolver<'a> {
    index: &'a ItemIndex<'a>,
    model: &'a ApiModel,
    renamed_globals: &'a BTreeMap<String, String>,
}

impl<'a> ReferenceResolver<'a> {
    /// `renamed_globals` maps a global name that a local declaration shadows
    /// to the suffixed name that declaration was exported under.
    pub fn new(
        index: &'a ItemIndex<'a>,
        model: &'a ApiModel,
        renamed_globals: &'a BTreeMap<String, String>,
    ) -> Self {
        Self {
            index,
            model,
            renamed_globals,
        }
    }

    pub fn resolve(&self, token: &ExcerptToken) -> Result<Resolution<'a>, ResolveError> {
        let reference = match (&token.kind, &token.canonical_reference) {
            (ExcerptTokenKind::Reference, Some(reference)) => reference.as_str(),
            _ => return Ok(Resolution::NotAReference),
        };

        let Some((package, path)) = reference.split_once(PACKAGE_SEPARATOR) else {
            return Err(ResolveError::Unresolved(reference.to_string()));
        };
        if package.is_empty() {
            return Ok(Resolution::NotAReference);
        }

        let exported = match path.strip_prefix(LOCAL_MARKER) {
            Some(local_path) => match self.rename_shadowed_global(package, local_path) {
                Some(renamed) => renamed,
                None => return self.expand_local(reference),
            },
            None => reference.to_string(),
        };

        let normalized = normalize_reference(&exported, None);
        self.index
            .by_reference(&normalized)
            .map(Resolution::ExportReference)
            .ok_or(ResolveError::Unresolved(normalized))
    }

    /// `package!~Event:interface` becomes `package!Event_2:interface` when
    /// `Event` is a renamed global.
    fn rename_shadowed_global(&self, package: &str, local_path: &str) -> Option<String> {
        let (name, rest) = match local_path.find([':', '.', '#']) {
            Some(end) => local_path.split_at(end),
            None => (local_path, ""),
        };
        self.renamed_globals
            .get(name)
            .map(|renamed| format!("{package}{PACKAGE_SEPARATOR}{renamed}{rest}"))
    }

    fn expand_local(&self, reference: &str) -> Result<Resolution<'a>, ResolveError> {
        self.model
            .local_declarations
            .get(reference)
            .map(|excerpt| Resolution::LocalExpansion(excerpt.tokens.clone()))
            .ok_or_else(|| ResolveError::UnsupportedLocalReference(reference.to_string()))
    }
}
