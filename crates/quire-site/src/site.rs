//! Site assembly.
//!
//! A [`Site`] holds everything fixed at startup: the base URL, the layered
//! content view, the hook registry, the cache and the providers. It is shared
//! as `Arc<Site>` and never mutated after [`SiteBuilder::build`]; per-request
//! state lives in [`Session`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use quire_content::MemoryBackend;
//! use quire_site::Site;
//!
//! let site = Site::builder("https://ex.com/".parse()?)
//!     .content_backend(Arc::new(MemoryBackend::new("site").with_file("/index.md", "# Home")), None)
//!     .build()?;
//!
//! let mut session = site.session();
//! let page = session.page("/")?;
//! assert_eq!(session.content(&page)?.trim(), "<h1>Home</h1>");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use quire_cache::{Cache, FileCache, NullCache};
use quire_config::Config;
use quire_content::{ContentBackend, ContentProvider};
use quire_content_fs::FsBackend;
use quire_hooks::Subscriber;
use quire_url::Url;

use crate::hooks::SiteHooks;
use crate::{AssetProvider, CoreSubscriber, PageProvider, Session, SiteError, defaults};

/// Cache format version; bumping the crate version invalidates file caches.
const CACHE_VERSION: &str = concat!("quire-", env!("CARGO_PKG_VERSION"));

/// Shared, immutable site state.
pub struct Site {
    url: Url,
    content: ContentProvider,
    hooks: SiteHooks,
    cache: Arc<dyn Cache>,
    pages: PageProvider,
    assets: AssetProvider,
}

impl Site {
    /// Start building a site mounted at `url`.
    pub fn builder(url: Url) -> SiteBuilder {
        SiteBuilder::new(url)
    }

    /// Build a site from loaded configuration.
    ///
    /// Content directories are registered in configuration order. With caching
    /// enabled, rendered pages are stored under [`Config::cache_dir`].
    ///
    /// # Errors
    ///
    /// Returns an error if the site URL is malformed or a hook registration
    /// fails.
    pub fn from_config(config: &Config) -> Result<Arc<Self>, SiteError> {
        let url = Url::parse(&config.site.url, None)?;
        let mut builder = Self::builder(url)
            .output_prefix(&config.assets.output_prefix)
            .extensions(config.extensions.clone());

        for dir in &config.content {
            builder = builder.content_dir(dir.dir.clone(), dir.namespace.as_deref());
        }

        if config.cache.enabled {
            let mut cache = FileCache::new(config.cache_dir(), CACHE_VERSION);
            if let Some(ttl) = config.cache_ttl() {
                cache = cache.with_ttl(ttl);
            }
            tracing::info!(path = %cache.root().display(), "render cache enabled");
            builder = builder.cache(Arc::new(cache));
        }

        builder.build()
    }

    /// Site base URL, always a directory.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub fn content(&self) -> &ContentProvider {
        &self.content
    }

    #[must_use]
    pub fn hooks(&self) -> &SiteHooks {
        &self.hooks
    }

    #[must_use]
    pub fn cache(&self) -> &dyn Cache {
        self.cache.as_ref()
    }

    #[must_use]
    pub fn pages(&self) -> &PageProvider {
        &self.pages
    }

    #[must_use]
    pub fn assets(&self) -> &AssetProvider {
        &self.assets
    }

    /// Start a request-scoped resolution session.
    #[must_use]
    pub fn session(self: &Arc<Self>) -> Session {
        Session::new(Arc::clone(self))
    }
}

impl std::fmt::Debug for Site {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Site")
            .field("url", &self.url.to_string())
            .field("content", &self.content)
            .field("hooks", &self.hooks)
            .field("assets", &self.assets)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Site`].
///
/// Backends and subscribers are activated in the order they are added, after
/// the built-in defaults.
pub struct SiteBuilder {
    url: Url,
    backends: Vec<(Arc<dyn ContentBackend>, Option<String>)>,
    subscribers: Vec<Box<dyn Subscriber<SiteHooks>>>,
    cache: Arc<dyn Cache>,
    output_prefix: String,
    extensions: BTreeMap<String, Vec<String>>,
}

impl SiteBuilder {
    fn new(url: Url) -> Self {
        let url = if url.path().ends_with('/') {
            url.with_path(url.path())
        } else {
            url.with_path(&format!("{}/", url.path()))
        };
        Self {
            url,
            backends: Vec::new(),
            subscribers: Vec::new(),
            cache: Arc::new(NullCache),
            output_prefix: "assets".to_owned(),
            extensions: BTreeMap::from([(
                "css".to_owned(),
                vec!["css".to_owned(), "scss".to_owned(), "less".to_owned()],
            )]),
        }
    }

    /// Register a content backend, optionally scoped to `namespace`.
    #[must_use]
    pub fn content_backend(
        mut self,
        backend: Arc<dyn ContentBackend>,
        namespace: Option<&str>,
    ) -> Self {
        self.backends.push((backend, namespace.map(str::to_owned)));
        self
    }

    /// Register a filesystem content directory.
    #[must_use]
    pub fn content_dir(self, dir: impl Into<PathBuf>, namespace: Option<&str>) -> Self {
        self.content_backend(Arc::new(FsBackend::new(dir)), namespace)
    }

    /// Activate a subscriber after the core builders.
    #[must_use]
    pub fn subscriber(mut self, subscriber: impl Subscriber<SiteHooks> + 'static) -> Self {
        self.subscribers.push(Box::new(subscriber));
        self
    }

    #[must_use]
    pub fn cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = cache;
        self
    }

    #[must_use]
    pub fn output_prefix(mut self, prefix: &str) -> Self {
        prefix.clone_into(&mut self.output_prefix);
        self
    }

    /// Replace the equivalent-extension classes.
    #[must_use]
    pub fn extensions(mut self, extensions: BTreeMap<String, Vec<String>>) -> Self {
        self.extensions = extensions;
        self
    }

    /// Register the defaults bundle and every backend, then activate the core
    /// subscriber followed by the added subscribers.
    ///
    /// # Errors
    ///
    /// Returns an error if a subscriber registers a malformed event name.
    pub fn build(self) -> Result<Arc<Site>, SiteError> {
        let mut content = ContentProvider::new();
        content.add_backend(Arc::new(defaults::bundle()), None);
        for (backend, namespace) in self.backends {
            content.add_backend(backend, namespace.as_deref());
        }

        let mut hooks = SiteHooks::default();
        CoreSubscriber.subscribe(&mut hooks)?;
        for subscriber in &self.subscribers {
            subscriber.subscribe(&mut hooks)?;
            tracing::debug!(subscriber = subscriber.name(), "activated subscriber");
        }

        tracing::info!(url = %self.url, namespaces = ?content.namespaces(), "site ready");

        Ok(Arc::new(Site {
            url: self.url,
            content,
            hooks,
            cache: self.cache,
            pages: PageProvider,
            assets: AssetProvider::new(self.output_prefix, self.extensions),
        }))
    }
}
