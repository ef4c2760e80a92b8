//! Built-in builders.
//!
//! [`CoreSubscriber`] is activated before any other subscriber, so its
//! builders are the fallback for `dispatch_first` events and its transforms
//! run first for pipe and notify events.

use std::sync::{Arc, LazyLock};

use pulldown_cmark::{Options, Parser, html};
use quire_hooks::{BoxError, HookResult, Subscriber, event_name};
use quire_url::Url;
use regex::{Captures, Regex};

use crate::hooks::{FileRequest, SiteHooks, events};
use crate::{Asset, LazyContent, Page, parse_front_matter};

/// `url(...)` references in stylesheets: double-quoted, single-quoted, or bare.
static CSS_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(\s*(?:"([^"]*)"|'([^']*)'|([^)'"\s]+))\s*\)"#).unwrap()
});

/// Markdown and HTML pages, passthrough assets, CSS reference rewriting.
#[derive(Debug, Default)]
pub struct CoreSubscriber;

impl Subscriber<SiteHooks> for CoreSubscriber {
    fn name(&self) -> &str {
        "core"
    }

    fn subscribe(&self, hooks: &mut SiteHooks) -> HookResult<()> {
        let owner = self.name();
        hooks.page_file.on(
            &event_name(events::PAGE_FILE, "md"),
            owner,
            Arc::new(build_markdown_page),
        )?;
        hooks.page_file.on(
            &event_name(events::PAGE_FILE, "html"),
            owner,
            Arc::new(build_html_page),
        )?;
        hooks.asset_file.on(
            &event_name(events::ASSET_FILE, events::UNMATCHED),
            owner,
            Arc::new(|request: &FileRequest| -> Result<Option<Asset>, BoxError> {
                Ok(Some(Asset::from_file(request.url.clone(), request.file.clone())?))
            }),
        )?;
        hooks.asset_ready.on(
            &event_name(events::ASSET_READY, "css"),
            owner,
            Arc::new(rewrite_css_urls),
        )?;
        Ok(())
    }
}

fn build_markdown_page(request: &FileRequest) -> Result<Option<Page>, BoxError> {
    let source = request.file.read_to_string()?;
    let (metadata, body) = parse_front_matter(&source)?;
    let body = body.to_owned();
    let content = LazyContent::deferred(move |_| Ok(render_markdown(&body)));

    Ok(Some(
        Page::new(request.url.clone(), content)
            .with_metadata(metadata)
            .with_source(request.file.clone()),
    ))
}

fn build_html_page(request: &FileRequest) -> Result<Option<Page>, BoxError> {
    let source = request.file.read_to_string()?;
    let (metadata, body) = parse_front_matter(&source)?;

    Ok(Some(
        Page::new(request.url.clone(), body)
            .with_metadata(metadata)
            .with_source(request.file.clone()),
    ))
}

/// Render CommonMark with the GitHub extensions to HTML.
pub fn render_markdown(source: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let parser = Parser::new_ext(source, options);
    let mut output = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut output, parser);
    output
}

fn rewrite_css_urls(asset: &mut Asset) -> Result<(), BoxError> {
    let Some(css) = asset.content_str() else {
        return Ok(());
    };
    let base = asset.url().dir_url();
    let rewritten = CSS_URL_RE.replace_all(css, |caps: &Captures| {
        let target = caps
            .get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map_or("", |m| m.as_str());
        match resolve_reference(target, &base) {
            Some(url) => format!("url(\"{url}\")"),
            None => caps[0].to_owned(),
        }
    });
    if let std::borrow::Cow::Owned(css) = rewritten {
        asset.set_content(css);
    }
    Ok(())
}

/// Absolute form of a relative stylesheet reference against the directory URL
/// `base`; `None` for references that are already absolute, fragments, or data
/// URIs.
fn resolve_reference(target: &str, base: &Url) -> Option<Url> {
    let skip = target.is_empty()
        || target.starts_with('/')
        || target.starts_with('#')
        || target.starts_with("data:")
        || target.contains("://");
    if skip {
        return None;
    }
    Url::parse(target, Some(base)).ok()
}
