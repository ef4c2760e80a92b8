//! Event naming convention.
//!
//! Event names are `on` followed by a PascalCase event, optionally followed by
//! an underscore and a dispatch key: `onPageReady`, `onAssetFile_scss`,
//! `onPageGet_namespace_blog`.

use std::sync::LazyLock;

use regex::Regex;

use crate::HookError;

static EVENT_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^on[A-Z][A-Za-z0-9]*(_[A-Za-z0-9_]+)?$").unwrap());

/// Check that `name` follows the event naming convention.
///
/// # Errors
///
/// Returns [`HookError::InvalidEventName`] otherwise.
pub fn validate_event_name(name: &str) -> Result<(), HookError> {
    if EVENT_NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(HookError::InvalidEventName(name.to_owned()))
    }
}

/// Build a keyed event name: `("onAssetFile", "scss")` → `onAssetFile_scss`.
///
/// Characters outside `[A-Za-z0-9_]` in the key become `_`, so file extensions
/// and namespace names can be used as keys directly.
///
/// ```
/// use quire_hooks::event_name;
///
/// assert_eq!(event_name("onPageGet", "namespace_my-blog"), "onPageGet_namespace_my_blog");
/// ```
#[must_use]
pub fn event_name(base: &str, key: &str) -> String {
    let key: String = key
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{base}_{key}")
}
