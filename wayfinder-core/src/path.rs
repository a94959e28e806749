//! URL path joining with POSIX semantics.
//!
//! Route paths are built from a mix of file locations, controller prefixes and
//! explicit action paths. [`join`] concatenates the non-empty segments with `/`
//! and normalises the result: repeated slashes collapse, `.` segments vanish
//! and `..` pops the previous segment.

/// Join path segments and normalise the result.
///
/// ```
/// use wayfinder_core::path::join;
///
/// assert_eq!(join(&["/", "", "user", "info"]), "/user/info");
/// assert_eq!(join(&["/v2", "/dashboard"]), "/v2/dashboard");
/// assert_eq!(join(&["/api/", "../admin"]), "/admin");
/// ```
pub fn join(segments: &[&str]) -> String {
    let joined = segments
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/");

    if joined.is_empty() {
        return ".".to_string();
    }
    normalize(&joined)
}

/// Normalise a single path string.
pub fn normalize(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }

    let absolute = path.starts_with('/');
    let trailing = path.ends_with('/');

    let mut stack: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if stack.last().is_some_and(|last| *last != "..") {
                    stack.pop();
                } else if !absolute {
                    stack.push("..");
                }
            }
            other => stack.push(other),
        }
    }

    let mut out = stack.join("/");
    if out.is_empty() {
        return if absolute { "/".to_string() } else { ".".to_string() };
    }
    if trailing {
        out.push('/');
    }
    if absolute {
        out.insert(0, '/');
    }
    out
}
