//! Page-relative link destinations.

/// Compute the path of `to_page` relative to the directory of `from_page`.
///
/// Both are slash-delimited page paths relative to the site root. A
/// `#fragment` on `to_page` is preserved; a link to the same page collapses to
/// the bare fragment.
///
/// ```
/// use apidoc_render::links::relative_path;
///
/// assert_eq!(relative_path("api/core/index.md", "api/utils.md#foo"), "../utils.md#foo");
/// assert_eq!(relative_path("api/utils.md", "api/utils.md#foo"), "#foo");
/// ```
pub fn relative_path(from_page: &str, to_page: &str) -> String {
    let (target, fragment) = match to_page.split_once('#') {
        Some((path, fragment)) => (path, Some(fragment)),
        None => (to_page, None),
    };

    if target.is_empty() || normalize(target) == normalize(from_page) {
        return match fragment {
            Some(fragment) => format!("#{fragment}"),
            None => file_name(from_page).to_string(),
        };
    }

    let from_segments = normalize(from_page);
    let from_dir = &from_segments[..from_segments.len().saturating_sub(1)];
    let to_segments = normalize(target);

    let common = from_dir
        .iter()
        .zip(to_segments.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = Vec::new();
    for _ in common..from_dir.len() {
        parts.push("..");
    }
    parts.extend(&to_segments[common..]);

    let mut result = parts.join("/");
    if let Some(fragment) = fragment {
        result.push('#');
        result.push_str(fragment);
    }
    result
}

/// Split a path into segments, dropping empty and `.` segments and folding
/// `..` where possible.
fn normalize(path: &str) -> Vec<&str> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." if segments.last().is_some_and(|s| *s != "..") => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Join a source-repository base URL and a repository path.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches("./").trim_start_matches('/')
    )
}
