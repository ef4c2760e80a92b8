//! Typed hook dispatch for quire.
//!
//! Subscribers register closures against named events at startup; the engine
//! dispatches to them while resolving a request. Each event name belongs to a
//! [`Channel`] whose handler signature fixes its dispatch mode:
//!
//! | Mode | Handler | Order | Result |
//! |------|---------|-------|--------|
//! | [`dispatch_first`](Channel::dispatch_first) | [`FirstFn`] | newest first | first `Some` |
//! | [`dispatch_all`](Channel::dispatch_all) | [`PipeFn`] | oldest first | last output |
//! | [`dispatch_event`](Channel::dispatch_event) | [`NotifyFn`] | oldest first | mutated event |
//!
//! Newest-first lets a later subscriber override a builder; oldest-first lets
//! core behavior run before add-on behavior.
//!
//! Event names follow `on<Event>[_<key>]` (see [`validate_event_name`]); the
//! key selects a variant such as a file extension (`onAssetFile_scss`).
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use quire_hooks::{Channel, FirstFn};
//!
//! let mut builders: Channel<FirstFn<String, String>> = Channel::new();
//! builders.on("onFile_md", "core", Arc::new(|name: &String| Ok(Some(format!("page:{name}")))))?;
//!
//! let built = builders.dispatch_first("onFile_md", &"index.md".to_owned())?;
//! assert_eq!(built.as_deref(), Some("page:index.md"));
//! # Ok::<(), quire_hooks::HookError>(())
//! ```

mod channel;
mod error;
mod name;

pub use channel::{Channel, FirstFn, NotifyFn, PipeFn};
pub use error::{BoxError, HookError, HookResult};
pub use name::{event_name, validate_event_name};

/// A bundle of hook registrations.
///
/// `H` is the hook registry the subscriber registers into (one [`Channel`] per
/// event family). Subscribers are activated in order; registration order is
/// dispatch order.
pub trait Subscriber<H> {
    /// Owner name recorded with every registration.
    fn name(&self) -> &str;

    /// Register this subscriber's handlers.
    ///
    /// # Errors
    ///
    /// Returns [`HookError::InvalidEventName`] for a malformed event name.
    fn subscribe(&self, hooks: &mut H) -> HookResult<()>;
}
