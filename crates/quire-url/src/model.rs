//! The [`Url`] value type.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

use crate::path::normalize_path;
use crate::{UrlError, UrlFactory};

/// Characters escaped when a decoded path is serialized.
const PATH_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// A fully qualified URL.
///
/// Values are immutable by convention: the `with_*` methods return modified
/// copies, and callers receive clones rather than shared references.
///
/// # Invariants
///
/// - `path` starts with `/`, never contains `//`, has no `.`/`..` segments and
///   no trailing `index.html` (see [`normalize_path`])
/// - `path` is stored percent-decoded and re-encoded on serialization
/// - `query` is a key-sorted map, so [`Display`](fmt::Display) output is stable
///   regardless of the order parameters were supplied in
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Url {
    scheme: String,
    host: String,
    port: u16,
    path: String,
    query: BTreeMap<String, String>,
    fragment: Option<String>,
}

impl Url {
    /// Parse `input`, expanding relative references against `context`.
    ///
    /// Relative references resolve against `context` itself, so a file context
    /// resolves `img.png` to a sibling file. `@/` expands to `context`'s
    /// directory. For separate site and context stacks use
    /// [`UrlFactory::parse`].
    ///
    /// # Errors
    ///
    /// Returns [`UrlError::Malformed`] if parsing fails and [`UrlError::NoSite`]
    /// if `input` is relative and no `context` was given.
    ///
    /// # Example
    ///
    /// ```
    /// use quire_url::Url;
    ///
    /// let site: Url = "https://ex.com/".parse()?;
    /// let url = Url::parse("@/foo/bar.html", Some(&site))?;
    /// assert_eq!(url.to_string(), "https://ex.com/foo/bar.html");
    /// # Ok::<(), quire_url::UrlError>(())
    /// ```
    pub fn parse(input: &str, context: Option<&Url>) -> Result<Self, UrlError> {
        match context {
            Some(context) => {
                let mut factory = UrlFactory::with_site(context.dir_url());
                factory.parse_in(input, context)
            }
            None => Self::parse_absolute(input),
        }
    }

    /// Parse an absolute URL string with no relative expansion.
    pub(crate) fn parse_absolute(input: &str) -> Result<Self, UrlError> {
        let parsed = ::url::Url::parse(input).map_err(|e| UrlError::malformed(input, e))?;

        let host = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| UrlError::malformed(input, "missing host"))?
            .to_owned();

        let decoded = percent_decode_str(parsed.path()).decode_utf8_lossy();

        Ok(Self {
            scheme: parsed.scheme().to_owned(),
            host,
            port: parsed.port_or_known_default().unwrap_or(0),
            path: normalize_path(&decoded),
            query: parsed.query_pairs().into_owned().collect(),
            fragment: parsed.fragment().map(str::to_owned),
        })
    }

    /// URL scheme (lowercase).
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Host name (lowercase).
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port, with the scheme default filled in.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Decoded, normalized path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query parameters, sorted by key.
    pub fn query(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    /// Value of a single query parameter.
    pub fn query_arg(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    /// Fragment without the leading `#`.
    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// `scheme://host[:port]` with the port omitted when it is the scheme default.
    pub fn origin(&self) -> String {
        if self.port == 0 || Some(self.port) == default_port(&self.scheme) {
            format!("{}://{}", self.scheme, self.host)
        } else {
            format!("{}://{}:{}", self.scheme, self.host, self.port)
        }
    }

    /// Directory portion of the path, always ending in `/`.
    ///
    /// `/a/b.html` → `/a/`, `/a/b/` → `/a/b/`.
    pub fn dir_path(&self) -> &str {
        match self.path.rfind('/') {
            Some(idx) => &self.path[..=idx],
            None => "/",
        }
    }

    /// Last path segment when the path names a file (no trailing slash).
    pub fn filename(&self) -> Option<&str> {
        if self.path.ends_with('/') {
            return None;
        }
        self.path.rsplit('/').next().filter(|s| !s.is_empty())
    }

    /// Lowercased extension of [`filename`](Self::filename), if any.
    pub fn extension(&self) -> Option<String> {
        let name = self.filename()?;
        let (stem, ext) = name.rsplit_once('.')?;
        (!stem.is_empty() && !ext.is_empty()).then(|| ext.to_ascii_lowercase())
    }

    /// Base URL of the directory this URL lives in (no query or fragment).
    pub fn dir_url(&self) -> Self {
        self.with_path(self.dir_path())
    }

    /// Copy with a new path; the path is normalized.
    #[must_use]
    pub fn with_path(&self, path: &str) -> Self {
        Self {
            path: normalize_path(path),
            query: BTreeMap::new(),
            fragment: None,
            ..self.clone()
        }
    }

    /// Copy with a query parameter set.
    #[must_use]
    pub fn with_query_arg(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut url = self.clone();
        url.query.insert(key.into(), value.into());
        url
    }

    /// Copy with all query parameters replaced.
    #[must_use]
    pub fn with_query(&self, query: BTreeMap<String, String>) -> Self {
        Self {
            query,
            ..self.clone()
        }
    }

    /// Copy with the fragment replaced.
    #[must_use]
    pub fn with_fragment(&self, fragment: Option<&str>) -> Self {
        Self {
            fragment: fragment.map(str::to_owned),
            ..self.clone()
        }
    }

    /// Whether this URL lies under `site` (same host and port, path prefixed by
    /// the site's base path).
    pub fn in_site(&self, site: &Url) -> bool {
        self.site_full_path(site).is_some()
    }

    /// Path relative to `site`'s base path, or `None` if not in the site.
    ///
    /// Whenever this returns `Some(rel)`, `site.dir_path() + rel == self.path()`.
    pub fn site_full_path(&self, site: &Url) -> Option<String> {
        if self.host != site.host || self.port != site.port {
            return None;
        }
        self.path
            .strip_prefix(site.dir_path())
            .map(str::to_owned)
    }

    /// Namespace encoded as a leading `@namespace/` segment of the site path.
    pub fn site_namespace(&self, site: &Url) -> Option<String> {
        let full = self.site_full_path(site)?;
        split_namespace(&full).0.map(str::to_owned)
    }

    /// Site path with any `@namespace/` segment stripped, starting with `/`.
    ///
    /// `https://ex.com/@blog/post.html` under site `https://ex.com/` yields
    /// `/post.html`.
    pub fn site_path(&self, site: &Url) -> Option<String> {
        let full = self.site_full_path(site)?;
        let (_, rest) = split_namespace(&full);
        Some(format!("/{rest}"))
    }
}

/// Split `@ns/rest` into `(Some("ns"), "rest")`; anything else into `(None, full)`.
fn split_namespace(full: &str) -> (Option<&str>, &str) {
    let Some(stripped) = full.strip_prefix('@') else {
        return (None, full);
    };
    let (ns, rest) = stripped.split_once('/').unwrap_or((stripped, ""));
    if ns.is_empty() {
        (None, full)
    } else {
        (Some(ns), rest)
    }
}

/// Default port for the schemes whose port is omitted on serialization.
fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            self.origin(),
            utf8_percent_encode(&self.path, PATH_SET)
        )?;
        if !self.query.is_empty() {
            let query = ::url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(&self.query)
                .finish();
            write!(f, "?{query}")?;
        }
        if let Some(fragment) = &self.fragment {
            write!(f, "#{fragment}")?;
        }
        Ok(())
    }
}

impl FromStr for Url {
    type Err = UrlError;

    /// Parse an absolute URL.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_absolute(s)
    }
}
