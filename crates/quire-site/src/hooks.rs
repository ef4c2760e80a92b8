//! Hook channels of the resolution pipeline.
//!
//! | Event | Channel | Mode |
//! |-------|---------|------|
//! | `onPageGet`, `onPageGet_namespace_<ns>` | [`SiteHooks::page_get`] | first |
//! | `onPageFile_<ext>`, `onPageFile_unmatched` | [`SiteHooks::page_file`] | first |
//! | `onPageReady` | [`SiteHooks::page_ready`] | pipe |
//! | `onPageContent` | [`SiteHooks::page_content`] | pipe |
//! | `onPageReturn` | [`SiteHooks::page_return`] | notify |
//! | `onAssetGet`, `onAssetGet_namespace_<ns>` | [`SiteHooks::asset_get`] | first |
//! | `onAssetFile_<ext>`, `onAssetFile_unmatched` | [`SiteHooks::asset_file`] | first |
//! | `onAssetReady`, `onAssetReady_<ext>` | [`SiteHooks::asset_ready`] | notify |
//! | `onAssetReturn` | [`SiteHooks::asset_return`] | notify |

use quire_content::ContentFile;
use quire_hooks::{Channel, FirstFn, HookResult, NotifyFn, PipeFn, event_name};
use quire_url::Url;

use crate::{Asset, Page};

/// Event name bases.
pub mod events {
    pub const PAGE_GET: &str = "onPageGet";
    pub const PAGE_FILE: &str = "onPageFile";
    pub const PAGE_READY: &str = "onPageReady";
    pub const PAGE_CONTENT: &str = "onPageContent";
    pub const PAGE_RETURN: &str = "onPageReturn";
    pub const ASSET_GET: &str = "onAssetGet";
    pub const ASSET_FILE: &str = "onAssetFile";
    pub const ASSET_READY: &str = "onAssetReady";
    pub const ASSET_RETURN: &str = "onAssetReturn";

    /// Key used when no extension-specific builder claims a file.
    pub const UNMATCHED: &str = "unmatched";
}

/// Input of `on*File_<ext>` builders.
#[derive(Debug, Clone)]
pub struct FileRequest {
    /// Canonical URL the artifact is built for.
    pub url: Url,
    /// Candidate content file.
    pub file: ContentFile,
}

/// Every hook channel of a site, filled by subscribers at startup.
#[derive(Debug, Clone, Default)]
pub struct SiteHooks {
    pub page_get: Channel<FirstFn<Url, Page>>,
    pub page_file: Channel<FirstFn<FileRequest, Page>>,
    pub page_ready: Channel<PipeFn<Page>>,
    pub page_content: Channel<PipeFn<String>>,
    pub page_return: Channel<NotifyFn<Page>>,
    pub asset_get: Channel<FirstFn<Url, Asset>>,
    pub asset_file: Channel<FirstFn<FileRequest, Asset>>,
    pub asset_ready: Channel<NotifyFn<Asset>>,
    pub asset_return: Channel<NotifyFn<Asset>>,
}

impl SiteHooks {
    /// Whether some builder handles page files with extension `ext`.
    #[must_use]
    pub fn builds_pages_from(&self, ext: &str) -> bool {
        self.page_file.has(&event_name(events::PAGE_FILE, ext))
    }
}

/// `onXGet_namespace_<ns>` (when namespaced), then `onXGet`.
pub(crate) fn bypass<T>(
    channel: &Channel<FirstFn<Url, T>>,
    base: &str,
    namespace: Option<&str>,
    url: &Url,
) -> HookResult<Option<T>> {
    if let Some(ns) = namespace {
        let event = event_name(base, &format!("namespace_{ns}"));
        if let Some(found) = channel.dispatch_first(&event, url)? {
            return Ok(Some(found));
        }
    }
    channel.dispatch_first(base, url)
}

/// `onXFile_<ext>`, then `onXFile_unmatched`.
pub(crate) fn build_from_file<T>(
    channel: &Channel<FirstFn<FileRequest, T>>,
    base: &str,
    request: &FileRequest,
) -> HookResult<Option<T>> {
    if let Some(ext) = request.file.extension()
        && let Some(built) = channel.dispatch_first(&event_name(base, &ext), request)?
    {
        return Ok(Some(built));
    }
    channel.dispatch_first(&event_name(base, events::UNMATCHED), request)
}
