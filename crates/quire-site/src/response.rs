//! Responses built from pages and assets.

use quire_url::Url;

use crate::{Asset, Page};

/// Something a [`Response`] can be built from.
///
/// Every method except [`url`](Sourceable::url) has a default, so a source
/// implements only what it knows.
pub trait Sourceable {
    /// Canonical URL of the source.
    fn url(&self) -> Url;

    /// Whether the output must not be cached.
    fn dynamic(&self) -> bool {
        false
    }

    /// Template the output is wrapped in.
    fn template(&self) -> Option<String> {
        None
    }

    fn mime(&self) -> String {
        "text/html".to_owned()
    }

    /// Charset appended to textual content types.
    fn charset(&self) -> Option<&str> {
        Some("utf-8")
    }

    /// Where the output is published, when it differs from [`url`](Sourceable::url).
    fn location(&self) -> Option<Url> {
        None
    }
}

impl Sourceable for Page {
    fn url(&self) -> Url {
        Page::url(self)
    }

    fn dynamic(&self) -> bool {
        self.is_dynamic()
    }

    fn template(&self) -> Option<String> {
        Page::template(self).map(str::to_owned)
    }
}

impl Sourceable for Asset {
    fn url(&self) -> Url {
        Asset::url(self)
    }

    fn mime(&self) -> String {
        Asset::mime(self)
    }

    fn charset(&self) -> Option<&str> {
        let mime = Asset::mime(self);
        (mime.starts_with("text/") || mime.ends_with("javascript") || mime.ends_with("json"))
            .then_some("utf-8")
    }

    fn location(&self) -> Option<Url> {
        self.output_url().cloned()
    }
}

/// A resolved request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub url: Url,
    /// Full content type, including the charset when there is one.
    pub content_type: String,
    pub template: Option<String>,
    /// `false` for dynamic sources and error responses.
    pub cacheable: bool,
    pub location: Option<Url>,
    pub body: Vec<u8>,
}

impl Response {
    /// Response metadata for `source`, with an empty body.
    pub fn from_source(status: u16, source: &dyn Sourceable) -> Self {
        let mime = source.mime();
        let content_type = match source.charset() {
            Some(charset) => format!("{mime}; charset={charset}"),
            None => mime,
        };
        Self {
            status,
            url: source.url(),
            content_type,
            template: source.template(),
            cacheable: status == 200 && !source.dynamic(),
            location: source.location(),
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Body as text, replacing invalid UTF-8.
    #[must_use]
    pub fn body_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}
