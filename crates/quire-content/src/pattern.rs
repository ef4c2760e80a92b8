//! Glob patterns over content paths.
//!
//! Patterns are `/`-separated content paths whose segments are [`glob::Pattern`]s,
//! extended with:
//!
//! - `**` as a whole segment, matching zero or more directories
//! - `{a,b}` brace alternation, expanded before compilation into one
//!   [`PathPattern`] per alternative (in listed order)
//!
//! Hidden names (leading `.`) only match segments that themselves start with `.`,
//! and `**` never descends into hidden directories.

use crate::{ContentError, ContentErrorKind};

/// One compiled path segment.
#[derive(Debug, Clone)]
pub enum Segment {
    /// `**`: zero or more directories.
    Recursive,
    /// A single-name glob.
    Glob {
        /// Compiled segment glob.
        pattern: glob::Pattern,
        /// Whether the segment may match hidden names.
        dotted: bool,
    },
}

impl Segment {
    /// Whether this is the `**` segment.
    pub fn is_recursive(&self) -> bool {
        matches!(self, Self::Recursive)
    }

    /// Whether a single path name matches this segment.
    ///
    /// `**` matches any visible name.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Recursive => !is_hidden(name),
            Self::Glob { pattern, dotted } => (*dotted || !is_hidden(name)) && pattern.matches(name),
        }
    }
}

/// A compiled content path pattern (one brace alternative).
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compile `pattern`, expanding brace alternation.
    ///
    /// # Errors
    ///
    /// Returns [`ContentErrorKind::InvalidPath`] if the pattern contains a `..`
    /// segment and [`ContentErrorKind::InvalidPattern`] if a segment is not a
    /// valid glob.
    pub fn compile(pattern: &str) -> Result<Vec<Self>, ContentError> {
        if pattern.split('/').any(|s| s == "..") {
            return Err(ContentError::invalid_path(pattern));
        }

        expand_braces(pattern)
            .into_iter()
            .map(|alternative| {
                let segments = alternative
                    .split('/')
                    .filter(|s| !s.is_empty() && *s != ".")
                    .map(|s| compile_segment(s, pattern))
                    .collect::<Result<_, _>>()?;
                Ok(Self {
                    source: alternative,
                    segments,
                })
            })
            .collect()
    }

    /// The alternative this pattern was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Compiled segments, root first.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether a content path (e.g. `/a/b/c.md`) matches.
    pub fn matches(&self, path: &str) -> bool {
        let names: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match_from(&self.segments, &names)
    }
}

fn compile_segment(segment: &str, pattern: &str) -> Result<Segment, ContentError> {
    if segment == "**" {
        return Ok(Segment::Recursive);
    }
    let compiled = glob::Pattern::new(segment).map_err(|e| {
        ContentError::new(ContentErrorKind::InvalidPattern)
            .with_path(pattern)
            .with_source(e)
    })?;
    Ok(Segment::Glob {
        pattern: compiled,
        dotted: segment.starts_with('.'),
    })
}

fn match_from(segments: &[Segment], names: &[&str]) -> bool {
    match segments.split_first() {
        None => names.is_empty(),
        Some((Segment::Recursive, rest)) => (0..=names.len()).any(|skip| {
            names[..skip].iter().all(|n| !is_hidden(n)) && match_from(rest, &names[skip..])
        }),
        Some((segment, rest)) => names
            .split_first()
            .is_some_and(|(name, tail)| segment.matches(name) && match_from(rest, tail)),
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Expand `{a,b}` alternation into every combination, in listed order.
///
/// Nested braces are supported; an unmatched `{` is kept literally.
///
/// ```
/// use quire_content::expand_braces;
///
/// assert_eq!(
///     expand_braces("/style.{css,scss}"),
///     vec!["/style.css".to_owned(), "/style.scss".to_owned()]
/// );
/// ```
pub fn expand_braces(pattern: &str) -> Vec<String> {
    let Some(open) = pattern.find('{') else {
        return vec![pattern.to_owned()];
    };

    let mut depth = 0usize;
    let mut close = None;
    let mut commas = Vec::new();
    for (idx, ch) in pattern[open..].char_indices() {
        let idx = open + idx;
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(idx);
                    break;
                }
            }
            ',' if depth == 1 => commas.push(idx),
            _ => {}
        }
    }

    let Some(close) = close else {
        return vec![pattern.to_owned()];
    };

    let prefix = &pattern[..open];
    let suffix = &pattern[close + 1..];
    let mut bounds = Vec::with_capacity(commas.len() + 2);
    bounds.push(open);
    bounds.extend(commas);
    bounds.push(close);

    bounds
        .windows(2)
        .flat_map(|w| expand_braces(&format!("{prefix}{}{suffix}", &pattern[w[0] + 1..w[1]])))
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn compile_one(pattern: &str) -> PathPattern {
        let mut compiled = PathPattern::compile(pattern).unwrap();
        assert_eq!(compiled.len(), 1);
        compiled.remove(0)
    }

    #[test]
    fn test_expand_braces() {
        assert_eq!(expand_braces("/a/b"), vec!["/a/b"]);
        assert_eq!(expand_braces("/a.{x,y,z}"), vec!["/a.x", "/a.y", "/a.z"]);
        assert_eq!(
            expand_braces("/{a,b}/{c,d}"),
            vec!["/a/c", "/a/d", "/b/c", "/b/d"]
        );
        assert_eq!(expand_braces("/{a,b{1,2}}"), vec!["/a", "/b1", "/b2"]);
        assert_eq!(expand_braces("/unclosed{a,b"), vec!["/unclosed{a,b"]);
    }

    #[test]
    fn test_single_segment_glob() {
        let p = compile_one("/docs/*.md");

        assert!(p.matches("/docs/guide.md"));
        assert!(!p.matches("/docs/guide.txt"));
        assert!(!p.matches("/docs/sub/guide.md"));
        assert!(!p.matches("/docs/.draft.md"));
    }

    #[test]
    fn test_recursive_segment() {
        let p = compile_one("/a/**/*.css");

        assert!(p.matches("/a/x.css"));
        assert!(p.matches("/a/b/x.css"));
        assert!(p.matches("/a/b/c/d/x.css"));
        assert!(!p.matches("/b/x.css"));
        assert!(!p.matches("/a/.cache/x.css"));
    }

    #[test]
    fn test_dotted_segment_matches_hidden() {
        let p = compile_one("/.well-known/*");
        assert!(p.matches("/.well-known/security.txt"));
    }

    #[test]
    fn test_root_pattern() {
        let p = compile_one("/");
        assert!(p.segments().is_empty());
        assert!(p.matches("/"));
        assert!(!p.matches("/a"));
    }

    #[test]
    fn test_rejects_parent_segments() {
        let err = PathPattern::compile("/a/../b").unwrap_err();
        assert_eq!(err.kind(), ContentErrorKind::InvalidPath);
    }

    #[test]
    fn test_rejects_bad_glob() {
        let err = PathPattern::compile("/a/[b").unwrap_err();
        assert_eq!(err.kind(), ContentErrorKind::InvalidPattern);
    }

    #[test]
    fn test_brace_alternatives_keep_order() {
        let compiled = PathPattern::compile("/style.{scss,css}").unwrap();
        let sources: Vec<_> = compiled.iter().map(PathPattern::as_str).collect();
        assert_eq!(sources, vec!["/style.scss", "/style.css"]);
    }
}
