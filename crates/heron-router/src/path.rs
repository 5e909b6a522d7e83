//! Path pattern helpers shared by route binding and spec synthesis.
//!
//! Patterns accept two parameter spellings, `:name` and `{name}`, plus a
//! trailing catch-all `*name`.

/// Concatenates a root path and an endpoint path.
///
/// A doubled slash at the seam is collapsed and a missing leading slash is
/// added. Trailing slashes are preserved.
///
/// ```rust
/// use heron_router::path::join;
///
/// assert_eq!(join("/items", "/:id"), "/items/:id");
/// assert_eq!(join("/items/", "/:id"), "/items/:id");
/// assert_eq!(join("/items", "/"), "/items/");
/// assert_eq!(join("", ""), "/");
/// ```
#[must_use]
pub fn join(root: &str, path: &str) -> String {
    let mut joined = String::with_capacity(root.len() + path.len() + 1);
    if !root.starts_with('/') {
        joined.push('/');
    }
    joined.push_str(root);
    if joined.ends_with('/') {
        joined.push_str(path.strip_prefix('/').unwrap_or(path));
    } else if path.is_empty() || path.starts_with('/') {
        joined.push_str(path);
    } else {
        joined.push('/');
        joined.push_str(path);
    }
    joined
}

/// Removes trailing slashes, keeping the root path `/` intact.
#[must_use]
pub fn trim_trailing_slash(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

/// Rewrites `:name` segments to the `{name}` template form.
///
/// ```rust
/// use heron_router::path::to_template;
///
/// assert_eq!(to_template("/orders/:orderId/lines/{lineId}"), "/orders/{orderId}/lines/{lineId}");
/// ```
#[must_use]
pub fn to_template(path: &str) -> String {
    path.split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) if !name.is_empty() => format!("{{{name}}}"),
            _ => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Returns the parameter name a segment declares, if any.
#[must_use]
pub fn param_name(segment: &str) -> Option<&str> {
    segment
        .strip_prefix(':')
        .or_else(|| segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')))
        .filter(|name| !name.is_empty())
}

/// Returns the parameter names declared by a pattern, in order.
///
/// Catch-all segments are included.
#[must_use]
pub fn param_names(path: &str) -> Vec<String> {
    path.split('/')
        .filter_map(|segment| param_name(segment).or_else(|| segment.strip_prefix('*')))
        .filter(|name| !name.is_empty())
        .map(ToString::to_string)
        .collect()
}
