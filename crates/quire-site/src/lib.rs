//! Page and asset resolution for quire.
//!
//! A request path goes through a fixed pipeline:
//!
//! 1. **Normalize**: parse against the session's site and context stacks;
//!    malformed input is "not found"
//! 2. **Bypass**: `onPageGet` / `onAssetGet` hooks may produce the artifact
//!    outright
//! 3. **Search**: query the layered [`ContentProvider`](quire_content::ContentProvider)
//!    for candidate files
//! 4. **Build**: `onPageFile_<ext>` / `onAssetFile_<ext>` builders, falling back
//!    to `*_unmatched`; the first candidate a builder claims wins
//! 5. **Finalize**: ready and return hooks; assets get a content-hashed output
//!    location
//!
//! Misses become error pages found by walking up the directory tree
//! (`_error/<status>.*`, then `_error/index.*`), ending at the bundled
//! defaults.
//!
//! # Architecture
//!
//! - [`Site`]: shared, immutable after [`SiteBuilder::build`]
//! - [`Session`]: per-request URL stacks, cycle guard and hash memo
//! - [`PageProvider`] / [`AssetProvider`]: the pipeline per artifact type
//! - [`SiteHooks`]: one hook [`Channel`](quire_hooks::Channel) per event family
//! - [`CoreSubscriber`]: built-in Markdown, HTML, passthrough and CSS hooks
//! - [`Response`]: status, content type and body from any [`Sourceable`]

mod asset;
mod builtin;
mod defaults;
mod error;
mod hooks;
mod lazy;
mod metadata;
mod page;
mod response;
mod session;
mod site;

pub use asset::{Asset, AssetProvider, AssetSource};
pub use builtin::{CoreSubscriber, render_markdown};
pub use error::SiteError;
pub use hooks::{FileRequest, SiteHooks, events};
pub use lazy::{ContentThunk, LazyContent};
pub use metadata::{Metadata, parse_front_matter, split_front_matter};
pub use page::{Page, PageProvider};
pub use response::{Response, Sourceable};
pub use session::Session;
pub use site::{Site, SiteBuilder};
