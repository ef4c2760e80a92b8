//! Site and context stacks for relative URL resolution.
//!
//! A [`UrlFactory`] is request-scoped state: each request (or worker) owns its
//! own instance and threads it through the resolution call chain. It is never
//! shared between concurrently served requests.
//!
//! # Balance
//!
//! Every `begin_*` must be matched by an `end_*`. The [`SiteScope`] and
//! [`ContextScope`] guards returned by [`UrlFactory::scoped_site`] and
//! [`UrlFactory::scoped_context`] pop on drop, so the stacks are restored on
//! every exit path including `?` returns and panics.

use std::ops::{Deref, DerefMut};

use crate::{Url, UrlError};

/// Stacks of "site" and "context" URLs.
#[derive(Clone, Debug, Default)]
pub struct UrlFactory {
    sites: Vec<Url>,
    /// `None` entries were pushed with nothing to copy and defer to the site.
    contexts: Vec<Option<Url>>,
}

impl UrlFactory {
    /// Create a factory with empty stacks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a factory with `site` already pushed.
    #[must_use]
    pub fn with_site(site: Url) -> Self {
        let mut factory = Self::new();
        factory.begin_site(site);
        factory
    }

    /// Push a site base. The base is reduced to its directory, without query
    /// or fragment.
    pub fn begin_site(&mut self, base: Url) {
        let base = if base.path().ends_with('/') {
            base.with_path(base.path())
        } else {
            // "https://ex.com/docs" names the directory /docs/
            base.with_path(&format!("{}/", base.path()))
        };
        tracing::trace!(site = %base, depth = self.sites.len() + 1, "begin site");
        self.sites.push(base);
    }

    /// Pop the current site.
    pub fn end_site(&mut self) -> Option<Url> {
        let site = self.sites.pop();
        if site.is_none() {
            tracing::warn!("end_site called with an empty site stack");
        }
        site
    }

    /// Push a context URL.
    ///
    /// With `None`, pushes a copy of the most specific URL available: the
    /// current context, or else the current site.
    pub fn begin_context(&mut self, context: Option<Url>) {
        let context = context.or_else(|| self.context().cloned());
        if context.is_none() {
            tracing::warn!("begin_context with no site or context to copy");
        }
        tracing::trace!(depth = self.contexts.len() + 1, "begin context");
        self.contexts.push(context);
    }

    /// Parse `input` against the current stacks and push the result as context.
    ///
    /// Nothing is pushed on error.
    pub fn begin_context_str(&mut self, input: &str) -> Result<(), UrlError> {
        let url = self.parse(input)?;
        self.begin_context(Some(url));
        Ok(())
    }

    /// Pop the current context.
    pub fn end_context(&mut self) -> Option<Url> {
        let Some(context) = self.contexts.pop() else {
            tracing::warn!("end_context called with an empty context stack");
            return None;
        };
        context
    }

    /// Push a site for the lifetime of the returned guard.
    pub fn scoped_site(&mut self, base: Url) -> SiteScope<'_> {
        self.begin_site(base);
        SiteScope { factory: self }
    }

    /// Push a context for the lifetime of the returned guard.
    pub fn scoped_context(&mut self, context: Option<Url>) -> ContextScope<'_> {
        self.begin_context(context);
        ContextScope { factory: self }
    }

    /// Current site, if any.
    pub fn site(&self) -> Option<&Url> {
        self.sites.last()
    }

    /// Current context, falling back to the current site.
    pub fn context(&self) -> Option<&Url> {
        self.contexts
            .last()
            .and_then(Option::as_ref)
            .or_else(|| self.sites.last())
    }

    /// Number of sites on the stack.
    pub fn site_depth(&self) -> usize {
        self.sites.len()
    }

    /// Number of contexts on the stack.
    pub fn context_depth(&self) -> usize {
        self.contexts.len()
    }

    /// Parse `input`, expanding relative references against the stacks.
    ///
    /// See the crate documentation for the expansion rules.
    pub fn parse(&self, input: &str) -> Result<Url, UrlError> {
        let absolute = self.expand(input)?;
        Url::parse_absolute(&absolute).map_err(|e| match e {
            // Report the caller's input, not the expanded form
            UrlError::Malformed { reason, .. } => UrlError::malformed(input, reason),
            other => other,
        })
    }

    /// Parse `input` with `context` pushed for the duration of the call.
    ///
    /// The context stack is restored whether or not parsing succeeds.
    pub fn parse_in(&mut self, input: &str, context: &Url) -> Result<Url, UrlError> {
        let scope = self.scoped_context(Some(context.clone()));
        scope.parse(input)
    }

    /// See [`Url::site_full_path`]; `None` when there is no current site.
    pub fn site_full_path(&self, url: &Url) -> Option<String> {
        url.site_full_path(self.site()?)
    }

    /// See [`Url::site_path`].
    pub fn site_path(&self, url: &Url) -> Option<String> {
        url.site_path(self.site()?)
    }

    /// See [`Url::site_namespace`].
    pub fn site_namespace(&self, url: &Url) -> Option<String> {
        url.site_namespace(self.site()?)
    }

    /// See [`Url::in_site`].
    pub fn in_site(&self, url: &Url) -> bool {
        self.site().is_some_and(|site| url.in_site(site))
    }

    /// Expand a possibly relative reference to an absolute URL string.
    fn expand(&self, input: &str) -> Result<String, UrlError> {
        let input = input.trim();
        if has_scheme(input) {
            return Ok(input.to_owned());
        }

        let no_site = || UrlError::NoSite(input.to_owned());

        if let Some(rest) = input.strip_prefix("//") {
            let site = self.site().ok_or_else(no_site)?;
            return Ok(format!("{}://{rest}", site.scheme()));
        }

        if let Some(rest) = input.strip_prefix('@') {
            if rest.is_empty() || rest.starts_with('/') {
                let site = self.site().ok_or_else(no_site)?;
                let rest = rest.trim_start_matches('/');
                return Ok(format!("{}{rest}", site.dir_url()));
            }
            if let Some(after) = rest.strip_prefix("ctx")
                && (after.is_empty() || after.starts_with('/'))
            {
                let context = self.context().ok_or_else(no_site)?;
                let after = after.trim_start_matches('/');
                return Ok(format!("{}{after}", context.dir_url()));
            }
            // @namespace/...
            let site = self.site().ok_or_else(no_site)?;
            return Ok(format!("{}{input}", site.dir_url()));
        }

        if input.starts_with('/') {
            let site = self.site().ok_or_else(no_site)?;
            return Ok(format!("{}{input}", site.origin()));
        }

        let context = self.context().ok_or_else(no_site)?;
        let base = ::url::Url::parse(&context.to_string())
            .map_err(|e| UrlError::malformed(input, e))?;
        base.join(input)
            .map(String::from)
            .map_err(|e| UrlError::malformed(input, e))
    }
}

/// Whether `input` begins with `scheme:`.
fn has_scheme(input: &str) -> bool {
    let Some((scheme, _)) = input.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Guard that pops a site pushed by [`UrlFactory::scoped_site`].
pub struct SiteScope<'a> {
    factory: &'a mut UrlFactory,
}

impl Deref for SiteScope<'_> {
    type Target = UrlFactory;

    fn deref(&self) -> &UrlFactory {
        self.factory
    }
}

impl DerefMut for SiteScope<'_> {
    fn deref_mut(&mut self) -> &mut UrlFactory {
        self.factory
    }
}

impl Drop for SiteScope<'_> {
    fn drop(&mut self) {
        self.factory.end_site();
    }
}

/// Guard that pops a context pushed by [`UrlFactory::scoped_context`].
pub struct ContextScope<'a> {
    factory: &'a mut UrlFactory,
}

impl Deref for ContextScope<'_> {
    type Target = UrlFactory;

    fn deref(&self) -> &UrlFactory {
        self.factory
    }
}

impl DerefMut for ContextScope<'_> {
    fn deref_mut(&mut self) -> &mut UrlFactory {
        self.factory
    }
}

impl Drop for ContextScope<'_> {
    fn drop(&mut self) {
        self.factory.end_context();
    }
}
