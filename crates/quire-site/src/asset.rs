//! Static assets and asset resolution.

use std::collections::BTreeMap;
use std::sync::Arc;

use quire_content::{ContentError, ContentFile, Fingerprint};
use quire_url::Url;

use crate::hooks::{FileRequest, bypass, build_from_file, events};
use crate::{Session, Site, SiteError};

/// Hex digits of the content hash used in output paths.
const OUTPUT_HASH_LEN: usize = 8;

/// Where an asset's bytes came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    File(ContentFile),
    /// Produced by a hook without a backing file.
    Inline,
}

/// A built asset with its content-hashed output location.
///
/// `hash`, `output_path` and `output_url` are assigned when the asset leaves
/// the pipeline; `onAssetReady` hooks see them empty.
#[derive(Debug, Clone)]
pub struct Asset {
    url: Url,
    source: AssetSource,
    content: Vec<u8>,
    extension: Option<String>,
    hash: String,
    output_path: String,
    output_url: Option<Url>,
}

impl Asset {
    /// Asset served at `url` with the bytes of `file`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn from_file(url: Url, file: ContentFile) -> Result<Self, ContentError> {
        let content = file.read()?;
        let extension = file.extension();
        Ok(Self {
            url,
            source: AssetSource::File(file),
            content,
            extension,
            hash: String::new(),
            output_path: String::new(),
            output_url: None,
        })
    }

    /// Inline asset; the extension is taken from `url`.
    pub fn from_string(url: Url, content: impl Into<String>) -> Self {
        let extension = url.extension();
        Self {
            url,
            source: AssetSource::Inline,
            content: content.into().into_bytes(),
            extension,
            hash: String::new(),
            output_path: String::new(),
            output_url: None,
        }
    }

    #[must_use]
    pub fn url(&self) -> Url {
        self.url.clone()
    }

    #[must_use]
    pub fn source(&self) -> &AssetSource {
        &self.source
    }

    /// Lowercase extension of the source file, or of the URL for inline assets.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    /// MIME type guessed from [`extension`](Self::extension).
    #[must_use]
    pub fn mime(&self) -> String {
        self.extension
            .as_deref()
            .and_then(|ext| mime_guess::from_ext(ext).first_raw())
            .unwrap_or("application/octet-stream")
            .to_owned()
    }

    #[must_use]
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Content as UTF-8, if it is valid UTF-8.
    #[must_use]
    pub fn content_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }

    pub fn set_content(&mut self, content: impl Into<Vec<u8>>) {
        self.content = content.into();
    }

    /// Hex SHA-256 of the final content.
    #[must_use]
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Output path relative to the site root, e.g. `assets/1a2b3c4d/site.css`.
    #[must_use]
    pub fn output_path(&self) -> &str {
        &self.output_path
    }

    /// Absolute URL of [`output_path`](Self::output_path).
    #[must_use]
    pub fn output_url(&self) -> Option<&Url> {
        self.output_url.as_ref()
    }

    fn assign_output(&mut self, site: &Url, prefix: &str) {
        self.hash = Fingerprint::new().with(&self.content).finish();
        let filename = self
            .url
            .filename()
            .map_or_else(|| "asset".to_owned(), str::to_owned);
        self.output_path = format!(
            "{}/{}/{filename}",
            prefix.trim_matches('/'),
            &self.hash[..OUTPUT_HASH_LEN]
        );
        self.output_url = Some(site.with_path(&format!("{}{}", site.dir_path(), self.output_path)));
    }
}

/// Resolves request URLs to assets.
#[derive(Debug)]
pub struct AssetProvider {
    output_prefix: String,
    extensions: BTreeMap<String, Vec<String>>,
}

impl AssetProvider {
    /// `extensions` maps a requested extension to the extensions searched for
    /// it, in order.
    pub fn new(output_prefix: impl Into<String>, extensions: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            output_prefix: output_prefix.into(),
            extensions,
        }
    }

    #[must_use]
    pub fn output_prefix(&self) -> &str {
        &self.output_prefix
    }

    /// Extensions searched for a request ending in `.ext`.
    #[must_use]
    pub fn extension_class(&self, ext: &str) -> Option<&[String]> {
        self.extensions.get(ext).map(Vec::as_slice)
    }

    /// Resolve `url`.
    ///
    /// # Errors
    ///
    /// Propagates hook and content errors.
    pub fn get(&self, session: &mut Session, url: Url) -> Result<Option<Asset>, SiteError> {
        let site_url = session.current_site().clone();
        let Some(path) = url.site_path(&site_url) else {
            return Ok(None);
        };
        if path.ends_with('/') || path.split('/').any(|s| s.starts_with('.')) {
            return Ok(None);
        }

        let namespace = url.site_namespace(&site_url);
        let site = Arc::clone(session.site());
        let hooks = site.hooks();

        if let Some(asset) = bypass(&hooks.asset_get, events::ASSET_GET, namespace.as_deref(), &url)? {
            tracing::debug!(url = %url, "asset produced by bypass hook");
            return self.finalize(&site, &site_url, asset).map(Some);
        }

        let pattern = self.search_pattern(&path);
        for file in site.content().files(&pattern, namespace.as_deref())? {
            let request = FileRequest {
                url: url.clone(),
                file,
            };
            if let Some(asset) = build_from_file(&hooks.asset_file, events::ASSET_FILE, &request)? {
                tracing::debug!(url = %url, file = request.file.url_path(), "asset built");
                return self.finalize(&site, &site_url, asset).map(Some);
            }
        }

        Ok(None)
    }

    /// `/a/site.css` → `/a/site.{css,scss,less}` when `css` has a class,
    /// otherwise the escaped path itself.
    fn search_pattern(&self, path: &str) -> String {
        let (dir, name) = path.rsplit_once('/').unwrap_or(("", path));
        let dir = dir
            .split('/')
            .map(glob::Pattern::escape)
            .collect::<Vec<_>>()
            .join("/");
        if let Some((stem, ext)) = name.rsplit_once('.')
            && !stem.is_empty()
            && let Some(class) = self.extension_class(&ext.to_ascii_lowercase())
        {
            return format!("{dir}/{}.{{{}}}", glob::Pattern::escape(stem), class.join(","));
        }
        format!("{dir}/{}", glob::Pattern::escape(name))
    }

    /// `onAssetReady_<ext>`, `onAssetReady`, output assignment, `onAssetReturn`.
    fn finalize(&self, site: &Site, site_url: &Url, mut asset: Asset) -> Result<Asset, SiteError> {
        let hooks = site.hooks();
        if let Some(ext) = asset.extension.clone() {
            hooks
                .asset_ready
                .dispatch_event(&quire_hooks::event_name(events::ASSET_READY, &ext), &mut asset)?;
        }
        hooks.asset_ready.dispatch_event(events::ASSET_READY, &mut asset)?;
        asset.assign_output(site_url, &self.output_prefix);
        hooks.asset_return.dispatch_event(events::ASSET_RETURN, &mut asset)?;
        Ok(asset)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use quire_content::MemoryBackend;

    use super::*;

    fn provider() -> AssetProvider {
        let mut classes = BTreeMap::new();
        classes.insert("css".to_owned(), vec!["css".to_owned(), "scss".to_owned()]);
        AssetProvider::new("assets", classes)
    }

    fn session(backend: MemoryBackend) -> Session {
        let url = Url::parse("https://ex.com/docs/", None).unwrap();
        Site::builder(url)
            .content_backend(Arc::new(backend), None)
            .build()
            .unwrap()
            .session()
    }

    #[test]
    fn test_search_pattern() {
        let assets = provider();

        assert_eq!(assets.search_pattern("/theme/site.css"), "/theme/site.{css,scss}");
        assert_eq!(assets.search_pattern("/theme/site.CSS"), "/theme/site.{css,scss}");
        assert_eq!(assets.search_pattern("/logo.png"), "/logo.png");
        assert_eq!(assets.search_pattern("/img/a[1].png"), "/img/a[[]1[]].png");
    }

    #[test]
    fn test_mime() {
        let url = Url::parse("https://ex.com/a.css", None).unwrap();
        assert_eq!(Asset::from_string(url, "").mime(), "text/css");

        let url = Url::parse("https://ex.com/blob", None).unwrap();
        assert_eq!(Asset::from_string(url, "").mime(), "application/octet-stream");
    }

    #[test]
    fn test_output_location() {
        let mut session = session(MemoryBackend::new("site").with_file("/logo.svg", "<svg/>"));
        let url = session.parse("@/logo.svg").unwrap();
        let site = Arc::clone(session.site());
        let asset = site.assets().get(&mut session, url).unwrap().unwrap();

        let expected_hash = Fingerprint::new().with("<svg/>").finish();
        assert_eq!(asset.hash(), expected_hash);
        assert_eq!(
            asset.output_path(),
            format!("assets/{}/logo.svg", &expected_hash[..8])
        );
        assert_eq!(
            asset.output_url().unwrap().to_string(),
            format!("https://ex.com/docs/assets/{}/logo.svg", &expected_hash[..8])
        );
    }

    #[test]
    fn test_ready_hooks_follow_source_extension() {
        let mut session = session(
            MemoryBackend::new("site")
                .with_file("/theme/plain.css", "a { background: url(../img/x.png) }")
                .with_file("/theme/sass.scss", "a { background: url(../img/x.png) }"),
        );
        let site = Arc::clone(session.site());

        let url = session.parse("@/theme/plain.css").unwrap();
        let plain = site.assets().get(&mut session, url).unwrap().unwrap();
        assert_eq!(
            plain.content_str(),
            Some("a { background: url(\"https://ex.com/docs/img/x.png\") }")
        );

        // A .scss source served for a .css request gets the scss ready hooks
        let url = session.parse("@/theme/sass.css").unwrap();
        let sass = site.assets().get(&mut session, url).unwrap().unwrap();
        assert_eq!(sass.extension(), Some("scss"));
        assert_eq!(sass.content_str(), Some("a { background: url(../img/x.png) }"));
    }

    #[test]
    fn test_directories_are_not_assets() {
        let mut session = session(MemoryBackend::new("site").with_file("/img/a.png", "png"));
        let url = session.parse("@/img/").unwrap();
        let site = Arc::clone(session.site());

        assert!(site.assets().get(&mut session, url).unwrap().is_none());
    }
}
