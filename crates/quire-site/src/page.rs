//! Pages and page resolution.

use std::collections::HashSet;
use std::sync::Arc;

use quire_content::ContentFile;
use quire_url::Url;

use crate::hooks::{FileRequest, bypass, build_from_file, events};
use crate::{LazyContent, Metadata, Session, Site, SiteError};

/// Resolution depth at which a URL re-entering itself is a cycle.
pub(crate) const CYCLE_THRESHOLD: usize = 4;

/// A built page.
///
/// Accessors hand out copies of the URL; a page is a snapshot of one
/// resolution.
#[derive(Debug, Clone)]
pub struct Page {
    url: Url,
    status: u16,
    metadata: Metadata,
    template: Option<String>,
    dynamic: bool,
    source: Option<ContentFile>,
    content: LazyContent,
}

impl Page {
    /// Create a page served at `url`.
    pub fn new(url: Url, content: impl Into<LazyContent>) -> Self {
        Self {
            url,
            status: 200,
            metadata: Metadata::new(),
            template: None,
            dynamic: false,
            source: None,
            content: content.into(),
        }
    }

    /// Attach metadata; `template` and `dynamic` keys set the page fields.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        if let Some(template) = metadata.get_str("template") {
            self.template = Some(template.to_owned());
        }
        if let Some(dynamic) = metadata.get_bool("dynamic") {
            self.dynamic = dynamic;
        }
        self.metadata = metadata;
        self
    }

    #[must_use]
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Mark the page as dynamic, which opts it out of render caching.
    #[must_use]
    pub fn with_dynamic(mut self, dynamic: bool) -> Self {
        self.dynamic = dynamic;
        self
    }

    #[must_use]
    pub fn with_source(mut self, file: ContentFile) -> Self {
        self.source = Some(file);
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn url(&self) -> Url {
        self.url.clone()
    }

    /// `200` for regular pages, the error status for error pages.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.metadata.get_str("title")
    }

    #[must_use]
    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    /// Content file the page was built from, if any.
    #[must_use]
    pub fn source(&self) -> Option<&ContentFile> {
        self.source.as_ref()
    }

    /// Raw content; read it through [`Session::content`].
    #[must_use]
    pub fn lazy_content(&self) -> &LazyContent {
        &self.content
    }
}

/// Resolves request URLs to pages.
///
/// Lookup runs: bypass hooks, content search, extension-keyed builders, then
/// the ready/return hooks.
#[derive(Debug, Default)]
pub struct PageProvider;

impl PageProvider {
    /// Resolve `url`.
    ///
    /// Returns `Ok(None)` when the URL is outside the site or no builder claims
    /// it.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::Cycle`] when `url` is already being rendered more
    /// than four times, and propagates hook and content errors.
    pub fn get(&self, session: &mut Session, url: Url) -> Result<Option<Page>, SiteError> {
        let site_url = session.current_site().clone();
        let Some(path) = url.site_path(&site_url) else {
            tracing::debug!(url = %url, "page outside site");
            return Ok(None);
        };
        if has_hidden_segment(&path) {
            return Ok(None);
        }
        if session.in_flight_count(&url) > CYCLE_THRESHOLD {
            return Err(SiteError::Cycle(url));
        }

        let namespace = url.site_namespace(&site_url);
        let site = Arc::clone(session.site());
        let hooks = site.hooks();

        if let Some(page) = bypass(&hooks.page_get, events::PAGE_GET, namespace.as_deref(), &url)? {
            tracing::debug!(url = %url, "page produced by bypass hook");
            return finalize(&site, page).map(Some);
        }

        for pattern in search_patterns(&path) {
            for file in site.content().files(&pattern, namespace.as_deref())? {
                let request = FileRequest {
                    url: url.clone(),
                    file,
                };
                if let Some(page) = build_from_file(&hooks.page_file, events::PAGE_FILE, &request)? {
                    tracing::debug!(url = %url, file = request.file.url_path(), "page built");
                    return finalize(&site, page).map(Some);
                }
            }
        }

        tracing::debug!(url = %url, "no page");
        Ok(None)
    }

    /// Pages directly below the directory `dir`.
    ///
    /// Children are `dir/*/index.*` and `dir/*.*` sources with a registered
    /// page builder, excluding `dir`'s own index and `_`-prefixed names.
    /// Sorted by URL; each URL appears once.
    ///
    /// # Errors
    ///
    /// Propagates hook and content errors.
    pub fn list(&self, session: &mut Session, dir: &Url) -> Result<Vec<Page>, SiteError> {
        let site_url = session.current_site().clone();
        let Some(path) = dir.site_path(&site_url) else {
            return Ok(Vec::new());
        };
        let dir_path = if path.ends_with('/') {
            path
        } else {
            format!("{path}/")
        };
        let namespace = dir.site_namespace(&site_url);
        let site = Arc::clone(session.site());
        let base = escape_path(&dir_path);

        let mut seen = HashSet::new();
        let mut urls = Vec::new();
        for pattern in [format!("{base}*/index.*"), format!("{base}*.*")] {
            for file in site.content().files(&pattern, namespace.as_deref())? {
                let Some(ext) = file.extension() else {
                    continue;
                };
                if !site.hooks().builds_pages_from(&ext) {
                    continue;
                }
                let Some(page_path) = page_path_for(&file) else {
                    continue;
                };
                if page_path == published_dir(&dir_path, namespace.as_deref()) {
                    continue;
                }
                if seen.insert(page_path.clone()) {
                    urls.push(site_url.with_path(&format!(
                        "{}{}",
                        site_url.dir_path(),
                        page_path.trim_start_matches('/')
                    )));
                }
            }
        }
        urls.sort_by(|a, b| a.path().cmp(b.path()));

        let mut pages = Vec::with_capacity(urls.len());
        for url in urls {
            if let Some(page) = self.get(session, url)? {
                pages.push(page);
            }
        }
        Ok(pages)
    }

    /// Error page for `status` at `url`.
    ///
    /// Searches `_error/<status>.*` then `_error/index.*` in the URL's
    /// directory and each ancestor up to the root. The built-in bundle provides
    /// the root fallback.
    ///
    /// # Errors
    ///
    /// Propagates hook and content errors.
    pub fn error_page(
        &self,
        session: &mut Session,
        status: u16,
        url: &Url,
    ) -> Result<Page, SiteError> {
        let site_url = session.current_site().clone();
        let path = url.site_path(&site_url).unwrap_or_else(|| "/".to_owned());
        let namespace = url.site_namespace(&site_url);
        let site = Arc::clone(session.site());

        for dir in ancestor_dirs(&path) {
            let dir = escape_path(&dir);
            for name in [status.to_string(), "index".to_owned()] {
                let pattern = format!("{dir}_error/{name}.*");
                let mut files = Vec::new();
                if namespace.is_some() {
                    files.extend(site.content().files(&pattern, namespace.as_deref())?);
                }
                files.extend(site.content().files(&pattern, None)?);

                for file in files {
                    let request = FileRequest {
                        url: url.clone(),
                        file,
                    };
                    if let Some(page) =
                        build_from_file(&site.hooks().page_file, events::PAGE_FILE, &request)?
                    {
                        tracing::debug!(status, file = request.file.url_path(), "error page");
                        return finalize(&site, page.with_status(status));
                    }
                }
            }
        }

        tracing::warn!(status, "no error page found, using plain fallback");
        Ok(Page::new(url.clone(), format!("<h1>{status}</h1>"))
            .with_status(status)
            .with_dynamic(true))
    }
}

/// `onPageReady` pipe, then `onPageReturn` notify.
fn finalize(site: &Site, page: Page) -> Result<Page, SiteError> {
    let hooks = site.hooks();
    let mut page = hooks.page_ready.dispatch_all(events::PAGE_READY, page)?;
    hooks
        .page_return
        .dispatch_event(events::PAGE_RETURN, &mut page)?;
    Ok(page)
}

/// Content patterns tried for a site path, in order.
///
/// - `/a/` → `/a/index.*`
/// - `/a/b.html` → `/a/b.*`
/// - `/a/b` → `/a/b.*`, `/a/b/index.*`
fn search_patterns(path: &str) -> Vec<String> {
    let escaped = escape_path(path);
    if escaped.ends_with('/') {
        return vec![format!("{escaped}index.*")];
    }
    let (dir, name) = escaped.rsplit_once('/').unwrap_or(("", escaped.as_str()));
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => vec![format!("{dir}/{stem}.*")],
        _ => vec![format!("{escaped}.*"), format!("{escaped}/index.*")],
    }
}

/// Escape glob metacharacters in each path segment.
fn escape_path(path: &str) -> String {
    path.split('/')
        .map(glob::Pattern::escape)
        .collect::<Vec<_>>()
        .join("/")
}

fn has_hidden_segment(path: &str) -> bool {
    path.split('/').any(|s| s.starts_with('.'))
}

/// `/a/b/c` → `["/a/b/", "/a/", "/"]`; `/a/b/` → `["/a/b/", "/a/", "/"]`.
fn ancestor_dirs(path: &str) -> Vec<String> {
    let dir = match path.rfind('/') {
        Some(idx) => &path[..=idx],
        None => "/",
    };
    let mut dirs = Vec::new();
    let mut current = dir.to_owned();
    loop {
        dirs.push(current.clone());
        if current == "/" {
            break;
        }
        let trimmed = current.trim_end_matches('/');
        current = match trimmed.rfind('/') {
            Some(idx) => trimmed[..=idx].to_owned(),
            None => "/".to_owned(),
        };
    }
    dirs
}

/// The URL path a page source is served at.
///
/// `/a/x/index.md` → `/a/x/`, `/a/y.md` → `/a/y.html`. Names starting with
/// `_` anywhere in the path are private and yield `None`.
fn page_path_for(file: &ContentFile) -> Option<String> {
    let path = file.url_path();
    if path.split('/').any(|s| s.starts_with('_')) {
        return None;
    }
    let dir = &path[..=path.rfind('/')?];
    if file.stem() == "index" {
        Some(dir.to_owned())
    } else {
        Some(format!("{dir}{}.html", file.stem()))
    }
}

/// `dir_path` as published by the provider for `namespace`.
fn published_dir(dir_path: &str, namespace: Option<&str>) -> String {
    match namespace {
        Some(ns) => format!("/@{ns}{dir_path}"),
        None => dir_path.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use quire_content::MemoryBackend;

    use super::*;

    fn session(backend: MemoryBackend) -> Session {
        let url = Url::parse("https://ex.com/", None).unwrap();
        Site::builder(url)
            .content_backend(Arc::new(backend), None)
            .build()
            .unwrap()
            .session()
    }

    #[test]
    fn test_search_patterns() {
        assert_eq!(search_patterns("/"), vec!["/index.*"]);
        assert_eq!(search_patterns("/guide/"), vec!["/guide/index.*"]);
        assert_eq!(search_patterns("/guide/intro.html"), vec!["/guide/intro.*"]);
        assert_eq!(
            search_patterns("/guide/intro"),
            vec!["/guide/intro.*", "/guide/intro/index.*"]
        );
        assert_eq!(search_patterns("/a[1]/b"), vec!["/a[[]1[]]/b.*", "/a[[]1[]]/b/index.*"]);
    }

    #[test]
    fn test_ancestor_dirs() {
        assert_eq!(ancestor_dirs("/"), vec!["/"]);
        assert_eq!(ancestor_dirs("/a/b/c"), vec!["/a/b/", "/a/", "/"]);
        assert_eq!(ancestor_dirs("/a/b/"), vec!["/a/b/", "/a/", "/"]);
    }

    #[test]
    fn test_page_path_for() {
        let file = |p: &str| ContentFile::embedded(Arc::from(&b""[..]), p);

        assert_eq!(page_path_for(&file("/a/x/index.md")), Some("/a/x/".to_owned()));
        assert_eq!(page_path_for(&file("/a/y.md")), Some("/a/y.html".to_owned()));
        assert_eq!(page_path_for(&file("/a/_error/index.html")), None);
    }

    #[test]
    fn test_get_markdown_page() {
        let mut session = session(
            MemoryBackend::new("site").with_file("/guide/intro.md", "---\ntitle: Intro\n---\n# Hi\n"),
        );
        let url = session.parse("/guide/intro.html").unwrap();
        let site = Arc::clone(session.site());
        let page = site.pages().get(&mut session, url).unwrap().unwrap();

        assert_eq!(page.url().to_string(), "https://ex.com/guide/intro.html");
        assert_eq!(page.title(), Some("Intro"));
        assert_eq!(page.source().unwrap().url_path(), "/guide/intro.md");
        assert!(!page.lazy_content().is_evaluated());
        assert_eq!(session.content(&page).unwrap().trim(), "<h1>Hi</h1>");
    }

    #[test]
    fn test_get_rejects_hidden_and_foreign() {
        let mut session = session(MemoryBackend::new("site").with_file("/.secret.md", "x"));
        let hidden = session.parse("/.secret.md").unwrap();
        let foreign = Url::parse("https://other.com/", None).unwrap();
        let site = Arc::clone(session.site());

        assert!(site.pages().get(&mut session, hidden).unwrap().is_none());
        assert!(site.pages().get(&mut session, foreign).unwrap().is_none());
    }

    #[test]
    fn test_error_page_prefers_nearest() {
        let mut session = session(
            MemoryBackend::new("site")
                .with_file("/a/_error/index.html", "section error")
                .with_file("/_error/404.html", "root 404"),
        );
        let site = Arc::clone(session.site());

        let deep = session.parse("/a/b/missing").unwrap();
        let page = site.pages().error_page(&mut session, 404, &deep).unwrap();
        assert_eq!(page.status(), 404);
        assert_eq!(session.content(&page).unwrap(), "section error");

        let top = session.parse("/missing").unwrap();
        let page = site.pages().error_page(&mut session, 404, &top).unwrap();
        assert_eq!(session.content(&page).unwrap(), "root 404");
    }

    #[test]
    fn test_list_children() {
        let mut session = session(
            MemoryBackend::new("site")
                .with_file("/blog/index.md", "blog")
                .with_file("/blog/first.md", "1")
                .with_file("/blog/second/index.html", "2")
                .with_file("/blog/_drafts/x.md", "draft")
                .with_file("/blog/logo.png", "png"),
        );
        let site = Arc::clone(session.site());
        let dir = session.parse("/blog/").unwrap();
        let pages = site.pages().list(&mut session, &dir).unwrap();
        let paths: Vec<_> = pages.iter().map(|p| p.url().path().to_owned()).collect();

        assert_eq!(paths, vec!["/blog/first.html", "/blog/second/"]);
    }
}
