//! Event-name-keyed listener lists.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::{BoxError, HookError, HookResult, validate_event_name};

/// Listener that may claim a subject: first non-`None` result wins.
pub type FirstFn<S, R> = dyn Fn(&S) -> Result<Option<R>, BoxError> + Send + Sync;

/// Listener in a transform pipeline: receives the previous listener's output.
pub type PipeFn<T> = dyn Fn(T) -> Result<T, BoxError> + Send + Sync;

/// Listener notified with a mutable event.
pub type NotifyFn<E> = dyn Fn(&mut E) -> Result<(), BoxError> + Send + Sync;

struct Listener<F: ?Sized> {
    owner: String,
    handler: Arc<F>,
}

impl<F: ?Sized> Clone for Listener<F> {
    fn clone(&self) -> Self {
        Self {
            owner: self.owner.clone(),
            handler: Arc::clone(&self.handler),
        }
    }
}

/// Listeners of one handler signature, keyed by event name, in registration
/// order.
///
/// The dispatch method available depends on the handler signature `F`:
/// [`dispatch_first`](Channel::dispatch_first) for [`FirstFn`],
/// [`dispatch_all`](Channel::dispatch_all) for [`PipeFn`] and
/// [`dispatch_event`](Channel::dispatch_event) for [`NotifyFn`].
pub struct Channel<F: ?Sized> {
    listeners: HashMap<String, Vec<Listener<F>>>,
}

impl<F: ?Sized> Default for Channel<F> {
    fn default() -> Self {
        Self {
            listeners: HashMap::new(),
        }
    }
}

impl<F: ?Sized> Clone for Channel<F> {
    fn clone(&self) -> Self {
        Self {
            listeners: self.listeners.clone(),
        }
    }
}

impl<F: ?Sized> fmt::Debug for Channel<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for event in self.events() {
            let owners: Vec<&str> = self.owners(event);
            map.entry(&event, &owners);
        }
        map.finish()
    }
}

impl<F: ?Sized> Channel<F> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `event` on behalf of `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`HookError::InvalidEventName`] if `event` does not follow the
    /// naming convention.
    pub fn on(&mut self, event: &str, owner: &str, handler: Arc<F>) -> HookResult<()> {
        validate_event_name(event)?;
        tracing::debug!(event, owner, "registered hook");
        self.listeners
            .entry(event.to_owned())
            .or_default()
            .push(Listener {
                owner: owner.to_owned(),
                handler,
            });
        Ok(())
    }

    /// Whether any listener is registered for `event`.
    #[must_use]
    pub fn has(&self, event: &str) -> bool {
        self.listeners.get(event).is_some_and(|l| !l.is_empty())
    }

    /// Registered event names, sorted.
    #[must_use]
    pub fn events(&self) -> Vec<&str> {
        let mut events: Vec<&str> = self.listeners.keys().map(String::as_str).collect();
        events.sort_unstable();
        events
    }

    /// Owners listening to `event`, in registration order.
    #[must_use]
    pub fn owners(&self, event: &str) -> Vec<&str> {
        self.slice(event).iter().map(|l| l.owner.as_str()).collect()
    }

    fn slice(&self, event: &str) -> &[Listener<F>] {
        self.listeners.get(event).map_or(&[], Vec::as_slice)
    }
}

fn wrap(event: &str, owner: &str, source: BoxError) -> HookError {
    HookError::Handler {
        event: event.to_owned(),
        owner: owner.to_owned(),
        source,
    }
}

impl<S, R> Channel<FirstFn<S, R>> {
    /// Offer `subject` to listeners newest first; return the first claim.
    ///
    /// Returns `Ok(None)` if there are no listeners or none claims it.
    ///
    /// # Errors
    ///
    /// Returns [`HookError::Handler`] from the first listener that fails.
    pub fn dispatch_first(&self, event: &str, subject: &S) -> HookResult<Option<R>> {
        for listener in self.slice(event).iter().rev() {
            let result = (listener.handler)(subject).map_err(|e| wrap(event, &listener.owner, e))?;
            if result.is_some() {
                tracing::debug!(event, owner = %listener.owner, "hook claimed subject");
                return Ok(result);
            }
        }
        Ok(None)
    }
}

impl<T> Channel<PipeFn<T>> {
    /// Feed `subject` through every listener, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`HookError::Handler`] from the first listener that fails.
    pub fn dispatch_all(&self, event: &str, subject: T) -> HookResult<T> {
        let mut value = subject;
        for listener in self.slice(event) {
            value = (listener.handler)(value).map_err(|e| wrap(event, &listener.owner, e))?;
        }
        Ok(value)
    }
}

impl<E> Channel<NotifyFn<E>> {
    /// Notify every listener with the shared mutable event, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`HookError::Handler`] from the first listener that fails.
    pub fn dispatch_event<'a>(&self, event: &str, subject: &'a mut E) -> HookResult<&'a mut E> {
        for listener in self.slice(event) {
            (listener.handler)(subject).map_err(|e| wrap(event, &listener.owner, e))?;
        }
        Ok(subject)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;

    use super::*;

    fn claim(value: Option<&'static str>) -> Arc<FirstFn<u32, &'static str>> {
        Arc::new(move |_: &u32| Ok(value))
    }

    #[test]
    fn test_dispatch_first_no_listeners() {
        let channel: Channel<FirstFn<u32, &str>> = Channel::new();
        assert_eq!(channel.dispatch_first("onThing", &1).unwrap(), None);
    }

    #[test]
    fn test_dispatch_first_newest_wins() {
        let mut channel = Channel::new();
        channel.on("onThing", "old", claim(Some("old"))).unwrap();
        channel.on("onThing", "new", claim(Some("new"))).unwrap();

        assert_eq!(channel.dispatch_first("onThing", &1).unwrap(), Some("new"));
    }

    #[test]
    fn test_dispatch_first_finds_oldest_match() {
        let mut channel = Channel::new();
        channel.on("onThing", "a", claim(Some("oldest"))).unwrap();
        channel.on("onThing", "b", claim(None)).unwrap();
        channel.on("onThing", "c", claim(None)).unwrap();

        assert_eq!(channel.dispatch_first("onThing", &1).unwrap(), Some("oldest"));
    }

    #[test]
    fn test_dispatch_first_short_circuits() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut channel: Channel<FirstFn<u32, u32>> = Channel::new();
        for name in ["a", "b", "c"] {
            let calls = Arc::clone(&calls);
            let claims = name == "b";
            channel
                .on(
                    "onThing",
                    name,
                    Arc::new(move |n: &u32| {
                        calls.lock().unwrap().push(name);
                        Ok(claims.then_some(*n))
                    }),
                )
                .unwrap();
        }

        assert_eq!(channel.dispatch_first("onThing", &7).unwrap(), Some(7));
        assert_eq!(*calls.lock().unwrap(), vec!["c", "b"]);
    }

    #[test]
    fn test_dispatch_first_events_are_exact() {
        let mut channel = Channel::new();
        channel.on("onFile_md", "md", claim(Some("md"))).unwrap();

        assert_eq!(channel.dispatch_first("onFile_css", &1).unwrap(), None);
        assert_eq!(channel.dispatch_first("onFile", &1).unwrap(), None);
    }

    #[test]
    fn test_dispatch_all_pipes_in_order() {
        let mut channel: Channel<PipeFn<String>> = Channel::new();
        channel
            .on("onText", "a", Arc::new(|s: String| Ok(format!("{s}a"))))
            .unwrap();
        channel
            .on("onText", "b", Arc::new(|s: String| Ok(format!("{s}b"))))
            .unwrap();

        assert_eq!(channel.dispatch_all("onText", ">".to_owned()).unwrap(), ">ab");
        assert_eq!(channel.dispatch_all("onOther", ">".to_owned()).unwrap(), ">");
    }

    #[test]
    fn test_dispatch_event_mutates_in_order() {
        let mut channel: Channel<NotifyFn<Vec<u8>>> = Channel::new();
        channel
            .on(
                "onEvent",
                "a",
                Arc::new(|v: &mut Vec<u8>| {
                    v.push(1);
                    Ok(())
                }),
            )
            .unwrap();
        channel
            .on(
                "onEvent",
                "b",
                Arc::new(|v: &mut Vec<u8>| {
                    v.push(2);
                    Ok(())
                }),
            )
            .unwrap();

        let mut event = Vec::new();
        channel.dispatch_event("onEvent", &mut event).unwrap();
        assert_eq!(event, vec![1, 2]);
    }

    #[test]
    fn test_handler_error_propagates() {
        let mut channel: Channel<FirstFn<u32, u32>> = Channel::new();
        channel.on("onThing", "ok", Arc::new(|_: &u32| Ok(Some(1)))).unwrap();
        channel
            .on("onThing", "broken", Arc::new(|_: &u32| Err("boom".into())))
            .unwrap();

        let err = channel.dispatch_first("onThing", &1).unwrap_err();
        assert_eq!(err.event(), "onThing");
        assert_eq!(err.to_string(), "hook onThing registered by broken failed: boom");
    }

    #[test]
    fn test_rejects_invalid_event_name() {
        let mut channel = Channel::new();
        let err = channel.on("pageReady", "x", claim(None)).unwrap_err();
        assert!(matches!(err, HookError::InvalidEventName(_)));
        assert!(!channel.has("pageReady"));
    }

    #[test]
    fn test_introspection() {
        let mut channel = Channel::new();
        channel.on("onB", "one", claim(None)).unwrap();
        channel.on("onA", "two", claim(None)).unwrap();
        channel.on("onA", "three", claim(None)).unwrap();

        assert_eq!(channel.events(), vec!["onA", "onB"]);
        assert_eq!(channel.owners("onA"), vec!["two", "three"]);
        assert!(channel.has("onB"));
        assert!(!channel.has("onC"));
    }
}
