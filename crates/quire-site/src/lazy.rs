//! Memoized page content.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use quire_url::Url;

use crate::{Session, SiteError};

/// Deferred content computation, run at most once.
pub type ContentThunk = Box<dyn FnOnce(&mut Session) -> Result<String, SiteError> + Send>;

enum State {
    Unevaluated(ContentThunk),
    Evaluating,
    Evaluated(String),
    Failed(String),
}

/// Page content that may be computed on first read.
///
/// Clones share the same state, so a page and its copies evaluate once.
/// Reading the content from inside its own computation fails with
/// [`SiteError::Cycle`] instead of deadlocking.
#[derive(Clone)]
pub struct LazyContent {
    state: Arc<Mutex<State>>,
}

impl LazyContent {
    /// Already-evaluated content.
    pub fn ready(content: impl Into<String>) -> Self {
        Self::with_state(State::Evaluated(content.into()))
    }

    /// Content computed by `thunk` on first read.
    pub fn deferred(
        thunk: impl FnOnce(&mut Session) -> Result<String, SiteError> + Send + 'static,
    ) -> Self {
        Self::with_state(State::Unevaluated(Box::new(thunk)))
    }

    fn with_state(state: State) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether the content has been computed (successfully or not).
    #[must_use]
    pub fn is_evaluated(&self) -> bool {
        matches!(*self.lock(), State::Evaluated(_) | State::Failed(_))
    }

    /// Content, computing it with `session` on first read.
    ///
    /// `url` identifies the owner in errors.
    pub(crate) fn evaluate(&self, session: &mut Session, url: &Url) -> Result<String, SiteError> {
        let thunk = {
            let mut state = self.lock();
            match std::mem::replace(&mut *state, State::Evaluating) {
                State::Unevaluated(thunk) => thunk,
                State::Evaluating => return Err(SiteError::Cycle(url.clone())),
                State::Evaluated(content) => {
                    *state = State::Evaluated(content.clone());
                    return Ok(content);
                }
                State::Failed(message) => {
                    *state = State::Failed(message.clone());
                    return Err(SiteError::Render {
                        url: url.to_string(),
                        message,
                    });
                }
            }
        };

        let mut unwinding = Unwinding(Some(self));
        let result = thunk(session);
        unwinding.0 = None;
        *self.lock() = match &result {
            Ok(content) => State::Evaluated(content.clone()),
            Err(e) => State::Failed(e.to_string()),
        };
        result
    }
}

/// Marks the content failed if its computation unwinds.
struct Unwinding<'a>(Option<&'a LazyContent>);

impl Drop for Unwinding<'_> {
    fn drop(&mut self) {
        if let Some(content) = self.0 {
            *content.lock() = State::Failed("content computation panicked".to_owned());
        }
    }
}

impl fmt::Debug for LazyContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.lock() {
            State::Unevaluated(_) => "Unevaluated",
            State::Evaluating => "Evaluating",
            State::Evaluated(_) => "Evaluated",
            State::Failed(_) => "Failed",
        };
        f.debug_tuple("LazyContent").field(&state).finish()
    }
}

impl From<String> for LazyContent {
    fn from(content: String) -> Self {
        Self::ready(content)
    }
}

impl From<&str> for LazyContent {
    fn from(content: &str) -> Self {
        Self::ready(content)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::Site;

    fn session() -> Session {
        let url = Url::parse("https://ex.com/", None).unwrap();
        Site::builder(url).build().unwrap().session()
    }

    fn url() -> Url {
        Url::parse("https://ex.com/page.html", None).unwrap()
    }

    #[test]
    fn test_ready() {
        let mut session = session();
        let content = LazyContent::ready("hello");

        assert!(content.is_evaluated());
        assert_eq!(content.evaluate(&mut session, &url()).unwrap(), "hello");
    }

    #[test]
    fn test_deferred_runs_once_across_clones() {
        let mut session = session();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let content = LazyContent::deferred(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok("computed".to_owned())
        });
        let copy = content.clone();

        assert!(!content.is_evaluated());
        assert_eq!(content.evaluate(&mut session, &url()).unwrap(), "computed");
        assert_eq!(copy.evaluate(&mut session, &url()).unwrap(), "computed");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(copy.is_evaluated());
    }

    #[test]
    fn test_reentrant_read_is_cycle() {
        let mut session = session();
        let slot: Arc<Mutex<Option<LazyContent>>> = Arc::new(Mutex::new(None));
        let inner = Arc::clone(&slot);
        let content = LazyContent::deferred(move |session| {
            let me = inner.lock().unwrap().clone().unwrap();
            me.evaluate(session, &url())
        });
        *slot.lock().unwrap() = Some(content.clone());

        assert!(matches!(
            content.evaluate(&mut session, &url()),
            Err(SiteError::Cycle(_))
        ));
    }

    #[test]
    fn test_panic_leaves_failed_state() {
        let mut session = session();
        let content = LazyContent::deferred(|_| panic!("template exploded"));

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            content.evaluate(&mut session, &url())
        }));

        assert!(outcome.is_err());
        assert!(content.is_evaluated());
        assert!(matches!(
            content.evaluate(&mut session, &url()),
            Err(SiteError::Render { .. })
        ));
    }

    #[test]
    fn test_failure_is_remembered() {
        let mut session = session();
        let content = LazyContent::deferred(|_| Err(SiteError::Cycle(url())));

        assert!(matches!(
            content.evaluate(&mut session, &url()),
            Err(SiteError::Cycle(_))
        ));
        assert!(matches!(
            content.evaluate(&mut session, &url()),
            Err(SiteError::Render { .. })
        ));
    }
}
