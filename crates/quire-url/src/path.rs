//! Path segment normalization.

/// Normalize a decoded URL path.
///
/// - Repeated slashes collapse to one
/// - `.` segments are dropped and `..` segments pop their parent (never above root)
/// - A trailing `index.html` segment is stripped, leaving a trailing slash
/// - The result always starts with `/`; an empty result is `/`
///
/// A trailing slash on the input (or a trailing `.`/`..` segment) is preserved,
/// since it distinguishes a directory from a file.
///
/// # Examples
///
/// ```
/// use quire_url::normalize_path;
///
/// assert_eq!(normalize_path("//a///b/"), "/a/b/");
/// assert_eq!(normalize_path("/a/./b/../c"), "/a/c");
/// assert_eq!(normalize_path("/a/index.html"), "/a/");
/// assert_eq!(normalize_path("../.."), "/");
/// ```
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    let mut trailing = false;

    for segment in path.split('/') {
        match segment {
            "" | "." => trailing = true,
            ".." => {
                segments.pop();
                trailing = true;
            }
            s => {
                segments.push(s);
                trailing = false;
            }
        }
    }

    if segments.last() == Some(&"index.html") {
        segments.pop();
        trailing = true;
    }

    if segments.is_empty() {
        return "/".to_owned();
    }

    let mut out = String::with_capacity(path.len() + 1);
    for segment in &segments {
        out.push('/');
        out.push_str(segment);
    }
    if trailing {
        out.push('/');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_root() {
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("///"), "/");
    }

    #[test]
    fn test_normalize_collapses_slashes() {
        assert_eq!(normalize_path("/a//b"), "/a/b");
        assert_eq!(normalize_path("a//b//"), "/a/b/");
    }

    #[test]
    fn test_normalize_dot_segments() {
        assert_eq!(normalize_path("/a/./b"), "/a/b");
        assert_eq!(normalize_path("/a/b/.."), "/a/");
        assert_eq!(normalize_path("/a/b/."), "/a/b/");
        assert_eq!(normalize_path("/../../a"), "/a");
    }

    #[test]
    fn test_normalize_strips_index_html() {
        assert_eq!(normalize_path("/index.html"), "/");
        assert_eq!(normalize_path("/docs/index.html"), "/docs/");
        // Only a literal trailing segment is stripped
        assert_eq!(normalize_path("/docs/index.html/x"), "/docs/index.html/x");
        assert_eq!(normalize_path("/docs/myindex.html"), "/docs/myindex.html");
    }

    #[test]
    fn test_normalize_keeps_file_paths() {
        assert_eq!(normalize_path("/a/b.css"), "/a/b.css");
    }

    #[test]
    fn test_normalize_idempotent() {
        for input in ["/a//b/../c/", "/x/index.html", "a/./b", "/"] {
            let once = normalize_path(input);
            assert_eq!(normalize_path(&once), once, "input {input}");
        }
    }
}
