//! WASM bindings for `apidoc-render`.
//!
//! Exposes the Markdown serializer to JavaScript via wasm-bindgen.
//! Call `render_markdown()` with a JSON node tree, or `render_node()` with
//! an already-deserialized JavaScript object.

use apidoc_render::{ApiModel, Node, RenderOptions, SiteConfig};
use wasm_bindgen::prelude::*;

fn options(page_path: Option<String>) -> RenderOptions {
    match page_path {
        Some(path) => RenderOptions::for_page(path),
        None => RenderOptions::default(),
    }
}

/// Render a JSON node tree as Markdown.
///
/// `page_path` is the site-relative path of the page being rendered; page
/// links are made relative to it.
#[wasm_bindgen]
pub fn render_markdown(input: &str, page_path: Option<String>) -> Result<String, JsError> {
    let node = Node::from_json(input)?;
    Ok(node.to_markdown(&options(page_path))?)
}

/// Render a node tree given as a JavaScript object.
#[wasm_bindgen]
pub fn render_node(node: JsValue, page_path: Option<String>) -> Result<String, JsError> {
    let node: Node =
        serde_wasm_bindgen::from_value(node).map_err(|e| JsError::new(&e.to_string()))?;
    Ok(node.to_markdown(&options(page_path))?)
}

/// Render a JSON node tree and return an HTML preview fragment.
#[wasm_bindgen]
pub fn render_preview(input: &str) -> Result<String, JsError> {
    let node = Node::from_json(input)?;
    let markdown = node.to_markdown(&RenderOptions::default())?;
    Ok(apidoc_render::preview::preview_html(&markdown))
}

/// Build every page of a site.
///
/// Takes the API model and the site configuration as JSON and returns
/// `{ pages: [{ path, markdown }], diagnostics }`.
#[wasm_bindgen]
pub fn render_site(model: &str, site: &str) -> Result<String, JsError> {
    let model = ApiModel::from_json(model)?;
    let site: SiteConfig = serde_json::from_str(site)?;
    let rendered = apidoc_render::render_site(&model, &site)?;
    let pages: Vec<_> = rendered
        .pages
        .iter()
        .map(|page| serde_json::json!({ "path": page.path, "markdown": page.markdown }))
        .collect();
    Ok(serde_json::json!({
        "pages": pages,
        "diagnostics": rendered.diagnostics,
    })
    .to_string())
}

/// Validate a JSON node tree and return diagnostics as JSON.
///
/// Returns a JSON array of `{ severity, message, code }` objects.
/// An empty array means the tree is valid. Malformed input yields a single
/// error diagnostic.
#[wasm_bindgen]
pub fn validate(input: &str) -> String {
    let diagnostics = match Node::from_json(input) {
        Ok(node) => node.validate(),
        Err(err) => vec![apidoc_render::Diagnostic::error("P001", err.to_string())],
    };
    serde_json::to_string(&diagnostics).unwrap_or_else(|_| "[]".to_string())
}
