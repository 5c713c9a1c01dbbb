//! Side-effect callbacks supplied by the host page.
//!
//! A [`Callback`] wraps a zero-argument closure. Invocation is isolated: an
//! `Err` or a panic inside one callback is turned into a [`ConsentError`] and
//! never unwinds into the engine, so the remaining callbacks and storage
//! writes still happen.

use crate::engine::errors::ConsentError;
use std::fmt::Debug;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

type CallbackFn = dyn Fn() -> anyhow::Result<()> + Send + Sync;

#[derive(Clone)]
pub struct Callback {
    inner: Arc<CallbackFn>,
}

impl Debug for Callback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callback").finish_non_exhaustive()
    }
}

impl Callback {
    /// Wraps an infallible closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(move || {
                f();
                Ok(())
            }),
        }
    }

    /// Wraps a closure that may report a failure.
    pub fn fallible<F>(f: F) -> Self
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Runs the callback. `name` only identifies the callback in the returned error.
    pub fn invoke(&self, name: &str) -> Result<(), ConsentError> {
        match panic::catch_unwind(AssertUnwindSafe(|| (self.inner)())) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ConsentError::CallbackFailed {
                name: name.to_string(),
                message: format!("{e:#}"),
            }),
            Err(_) => Err(ConsentError::CallbackPanicked {
                name: name.to_string(),
            }),
        }
    }
}

impl<F> From<F> for Callback
where
    F: Fn() + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Callback::new(f)
    }
}

/// Runs an optional callback, logging and swallowing any failure. Returns true when a
/// callback was present and invoked (even if it failed).
pub(crate) fn fire(callback: Option<&Callback>, name: &str) -> bool {
    let Some(callback) = callback else {
        return false;
    };

    log::debug!("firing callback {name}");
    if let Err(e) = callback.invoke(name) {
        log::error!("{e}");
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn invoke_runs_closure() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let cb = Callback::new(move || {
            h.fetch_add(1, Ordering::SeqCst);
        });

        cb.invoke("test").unwrap();
        cb.invoke("test").unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn failing_callback_is_reported_not_propagated() {
        let cb = Callback::fallible(|| anyhow::bail!("script blocked"));
        match cb.invoke("analytics.on_accept") {
            Err(ConsentError::CallbackFailed { name, message }) => {
                assert_eq!(name, "analytics.on_accept");
                assert!(message.contains("script blocked"));
            }
            other => panic!("expected CallbackFailed, got {:?}", other),
        }
    }

    #[test]
    fn panicking_callback_is_caught() {
        let cb = Callback::new(|| panic!("boom"));
        assert!(matches!(
            cb.invoke("marketing.on_reject"),
            Err(ConsentError::CallbackPanicked { .. })
        ));
        // fire() swallows the failure but still reports the invocation
        assert!(fire(Some(&cb), "marketing.on_reject"));
        assert!(!fire(None, "nothing"));
    }
}
