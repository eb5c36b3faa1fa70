//! Request path sanitizing
//!
//! Turns attacker-controlled URIs into relative filesystem paths that cannot
//! climb out of the directory they are joined to. Nothing here fails: unsafe
//! input degrades into a harmless (possibly nonexistent) path.

use crate::http::request::strip_query;

/// Collapse every `..` into `.` until none is left
///
/// Runs to a fixed point, so overlapping sequences such as `....//` cannot
/// reassemble a parent reference.
pub fn remove_dot_dots(path: &str) -> String {
    let mut path = path.to_string();
    while path.contains("..") {
        path = path.replace("..", ".");
    }
    path
}

/// Sanitize a request URI into a directory-relative path
///
/// # Examples
/// ```
/// use switchyard::routing::path::sanitize_uri;
/// assert_eq!(sanitize_uri("/css/site.css?v=3"), "css/site.css");
/// assert_eq!(sanitize_uri("/../../etc/passwd"), "././etc/passwd");
/// ```
pub fn sanitize_uri(uri: &str) -> String {
    let path = remove_dot_dots(strip_query(uri));
    match path.strip_prefix('/') {
        Some(rest) => rest.to_string(),
        None => path,
    }
}

/// Join path segments with exactly one `/` between them
///
/// Leading and trailing separators on inner segments are absorbed; only the
/// first segment keeps a leading `/`. A bare `"/"` segment counts as empty.
///
/// # Examples
/// ```
/// use switchyard::routing::path::path_combine;
/// assert_eq!(path_combine(&["public/", "/css/", "site.css"]), "public/css/site.css");
/// assert_eq!(path_combine(&["/srv/www", "/", "index.html"]), "/srv/www/index.html");
/// ```
pub fn path_combine<S: AsRef<str>>(segments: &[S]) -> String {
    let mut combined = String::new();
    for (i, segment) in segments.iter().enumerate() {
        let segment = segment.as_ref();
        if segment == "/" {
            continue;
        }
        let segment = if i == 0 {
            segment.trim_end_matches('/')
        } else {
            segment.trim_matches('/')
        };
        if segment.is_empty() {
            continue;
        }
        if !combined.is_empty() {
            combined.push('/');
        }
        combined.push_str(segment);
    }
    combined
}
