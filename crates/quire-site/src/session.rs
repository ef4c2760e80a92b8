//! Request-scoped resolution state.
//!
//! A [`Session`] owns the URL stacks and the in-flight page stack for one
//! request. Sessions are cheap; create one per request (or per worker) and
//! never share it between concurrently served requests.

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use quire_cache::CacheBucketExt;
use quire_content::Fingerprint;
use quire_url::{Url, UrlError, UrlFactory};

use crate::hooks::events;
use crate::{Asset, Page, Response, Site, SiteError};

/// Cache bucket for rendered page content.
const PAGES_BUCKET: &str = "pages";

/// Per-request resolution context.
pub struct Session {
    site: Arc<Site>,
    urls: UrlFactory,
    /// Pages whose content is being evaluated, outermost first.
    in_flight: Vec<Url>,
    hashes: HashMap<(String, Option<String>), String>,
}

impl Session {
    pub(crate) fn new(site: Arc<Site>) -> Self {
        let urls = UrlFactory::with_site(site.url().clone());
        Self {
            site,
            urls,
            in_flight: Vec::new(),
            hashes: HashMap::new(),
        }
    }

    #[must_use]
    pub fn site(&self) -> &Arc<Site> {
        &self.site
    }

    #[must_use]
    pub fn urls(&self) -> &UrlFactory {
        &self.urls
    }

    /// URL stacks, for pushing sites and contexts around nested resolution.
    pub fn urls_mut(&mut self) -> &mut UrlFactory {
        &mut self.urls
    }

    /// Innermost site base; the site's own URL when no other site is pushed.
    #[must_use]
    pub fn current_site(&self) -> &Url {
        self.urls.site().unwrap_or_else(|| self.site.url())
    }

    /// Parse `input` against the current site and context.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed input.
    pub fn parse(&self, input: &str) -> Result<Url, UrlError> {
        self.urls.parse(input)
    }

    pub(crate) fn in_flight_count(&self, url: &Url) -> usize {
        self.in_flight.iter().filter(|u| *u == url).count()
    }

    /// Resolve `input` to a page.
    ///
    /// Malformed input and content lookup failures are logged and reported as
    /// `None`.
    ///
    /// # Errors
    ///
    /// Propagates hook failures and [`SiteError::Cycle`].
    pub fn get_page(&mut self, input: &str) -> Result<Option<Page>, SiteError> {
        let Some(url) = self.parse_lenient(input) else {
            return Ok(None);
        };
        let site = Arc::clone(&self.site);
        degrade(site.pages().get(self, url), input)
    }

    /// Resolve `input` to a page, substituting the matching error page when
    /// nothing is found or `input` is malformed (404), or when resolution
    /// cycles (508).
    ///
    /// # Errors
    ///
    /// Propagates hook failures.
    pub fn page(&mut self, input: &str) -> Result<Page, SiteError> {
        let Some(url) = self.parse_lenient(input) else {
            let site_url = self.current_site().clone();
            return self.error_page(404, &site_url);
        };
        let site = Arc::clone(&self.site);
        match site.pages().get(self, url.clone()) {
            Ok(Some(page)) => Ok(page),
            Ok(None) => self.error_page(404, &url),
            Err(e) if e.status() != 500 => {
                tracing::warn!(input, error = %e, "page lookup failed");
                self.error_page(e.status(), &url)
            }
            Err(e) => Err(e),
        }
    }

    /// Resolve `input` to an asset.
    ///
    /// # Errors
    ///
    /// Propagates hook failures.
    pub fn asset(&mut self, input: &str) -> Result<Option<Asset>, SiteError> {
        let Some(url) = self.parse_lenient(input) else {
            return Ok(None);
        };
        let site = Arc::clone(&self.site);
        degrade(site.assets().get(self, url), input)
    }

    /// Child pages of the directory `input`.
    ///
    /// # Errors
    ///
    /// Propagates hook failures.
    pub fn list(&mut self, input: &str) -> Result<Vec<Page>, SiteError> {
        let Some(url) = self.parse_lenient(input) else {
            return Ok(Vec::new());
        };
        let site = Arc::clone(&self.site);
        Ok(degrade(site.pages().list(self, &url).map(Some), input)?.unwrap_or_default())
    }

    /// Error page for `status` at `url`.
    ///
    /// # Errors
    ///
    /// Propagates hook and content errors.
    pub fn error_page(&mut self, status: u16, url: &Url) -> Result<Page, SiteError> {
        let site = Arc::clone(&self.site);
        site.pages().error_page(self, status, url)
    }

    /// Evaluate `page`'s content and run the `onPageContent` pipe.
    ///
    /// Relative references parsed while the content is computed resolve
    /// against the page's URL.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::Cycle`] if the content depends on itself, and
    /// propagates failures of the content computation.
    pub fn content(&mut self, page: &Page) -> Result<String, SiteError> {
        let url = page.url();
        let content = {
            let mut scope = self.enter(url.clone());
            page.lazy_content().evaluate(&mut scope, &url)?
        };
        Ok(self
            .site
            .hooks()
            .page_content
            .dispatch_all(events::PAGE_CONTENT, content)?)
    }

    /// [`content`](Self::content) through the render cache.
    ///
    /// Entries are keyed by the page URL and validated against the content
    /// hash of the page's path, so any change to the page's directory, its
    /// ancestors or its descendants invalidates them. Dynamic pages and error
    /// pages bypass the cache.
    ///
    /// # Errors
    ///
    /// See [`content`](Self::content).
    pub fn render(&mut self, page: &Page) -> Result<String, SiteError> {
        if page.is_dynamic() || page.status() != 200 {
            return self.content(page);
        }
        let url = page.url();
        let site_url = self.current_site().clone();
        let Some(path) = url.site_path(&site_url) else {
            return self.content(page);
        };
        let namespace = url.site_namespace(&site_url);
        let hash = self.hash(&path, namespace.as_deref())?;

        let serialized = url.to_string();
        let key = Fingerprint::new().with(&serialized).finish();
        let etag = Fingerprint::new().with(&serialized).with(&hash).finish();

        let site = Arc::clone(&self.site);
        let bucket = site.cache().bucket(PAGES_BUCKET);
        bucket.get_or_try_insert_string(&key, &etag, || self.content(page))
    }

    /// Content hash of `path`, memoized for the session.
    ///
    /// # Errors
    ///
    /// Propagates backend errors.
    pub fn hash(&mut self, path: &str, namespace: Option<&str>) -> Result<String, SiteError> {
        let key = (path.to_owned(), namespace.map(str::to_owned));
        if let Some(hash) = self.hashes.get(&key) {
            return Ok(hash.clone());
        }
        let hash = self.site.content().hash(path, namespace)?;
        self.hashes.insert(key, hash.clone());
        Ok(hash)
    }

    /// Resolve `input` to a complete response: a page, else an asset, else
    /// the 404 error page.
    ///
    /// Missing content, malformed input and resolution cycles produce error
    /// page responses.
    ///
    /// # Errors
    ///
    /// Propagates hook failures.
    pub fn respond(&mut self, input: &str) -> Result<Response, SiteError> {
        let Some(url) = self.parse_lenient(input) else {
            let site_url = self.current_site().clone();
            return self.error_response(404, &site_url);
        };
        let site = Arc::clone(&self.site);

        let page = match site.pages().get(self, url.clone()) {
            Ok(page) => page,
            Err(e) if e.status() != 500 => return self.error_response(e.status(), &url),
            Err(e) => return Err(e),
        };
        if let Some(page) = page {
            return match self.render(&page) {
                Ok(body) => Ok(Response::from_source(page.status(), &page).with_body(body)),
                Err(e) if e.status() != 500 => self.error_response(e.status(), &url),
                Err(e) => Err(e),
            };
        }

        match degrade(site.assets().get(self, url.clone()), input)? {
            Some(asset) => {
                Ok(Response::from_source(200, &asset).with_body(asset.content().to_vec()))
            }
            None => self.error_response(404, &url),
        }
    }

    fn error_response(&mut self, status: u16, url: &Url) -> Result<Response, SiteError> {
        tracing::debug!(status, url = %url, "error response");
        let page = self.error_page(status, url)?;
        let body = self.content(&page)?;
        Ok(Response::from_source(status, &page).with_body(body))
    }

    /// Mark `url` in flight and make it the context until the guard drops.
    fn enter(&mut self, url: Url) -> InFlight<'_> {
        self.in_flight.push(url.clone());
        self.urls.begin_context(Some(url));
        InFlight { session: self }
    }

    fn parse_lenient(&self, input: &str) -> Option<Url> {
        match self.parse(input) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(input, error = %e, "malformed request");
                None
            }
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("site", &self.site.url().to_string())
            .field("in_flight", &self.in_flight.len())
            .finish_non_exhaustive()
    }
}

/// Guard returned by [`Session::enter`].
struct InFlight<'a> {
    session: &'a mut Session,
}

impl Deref for InFlight<'_> {
    type Target = Session;

    fn deref(&self) -> &Session {
        self.session
    }
}

impl DerefMut for InFlight<'_> {
    fn deref_mut(&mut self) -> &mut Session {
        self.session
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.session.urls.end_context();
        self.session.in_flight.pop();
    }
}

/// Turn content lookup failures into "not found".
fn degrade<T>(result: Result<Option<T>, SiteError>, input: &str) -> Result<Option<T>, SiteError> {
    match result {
        Err(SiteError::Content(e)) => {
            tracing::warn!(input, error = %e, "content lookup failed");
            Ok(None)
        }
        other => other,
    }
}
