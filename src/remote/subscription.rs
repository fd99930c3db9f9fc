//! Live-update listeners and the handle that releases them.

use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::task::AbortHandle;

use crate::models::Trip;

/// Called with the current document, or `None` when it does not exist.
pub type ChangeCallback = Box<dyn Fn(Option<Trip>) + Send + Sync>;

/// A registered callback for one document.
///
/// Delivery and release take the same lock, so once [`Listener::release`]
/// returns the callback will not run again. Callbacks must not release
/// their own subscription.
pub(crate) struct Listener {
    trip_id: String,
    callback: Mutex<Option<ChangeCallback>>,
}

impl Listener {
    pub(crate) fn new(trip_id: &str, callback: ChangeCallback) -> Arc<Self> {
        Arc::new(Self {
            trip_id: trip_id.to_string(),
            callback: Mutex::new(Some(callback)),
        })
    }

    pub(crate) fn trip_id(&self) -> &str {
        &self.trip_id
    }

    /// Runs the callback. Returns `false` if the listener was released.
    pub(crate) fn deliver(&self, trip: Option<Trip>) -> bool {
        let callback = self.callback.lock().unwrap_or_else(|e| e.into_inner());
        match callback.as_ref() {
            Some(callback) => {
                callback(trip);
                true
            }
            None => false,
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.callback
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// Drops the callback. Returns `true` only the first time.
    fn release(&self) -> bool {
        self.callback
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .is_some()
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("trip_id", &self.trip_id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Handle for a live subscription to one trip document.
///
/// The listener is released exactly once: by [`Subscription::cancel`] or
/// when the handle is dropped, whichever comes first.
#[derive(Debug)]
pub struct Subscription {
    listener: Arc<Listener>,
    task: Option<AbortHandle>,
}

impl Subscription {
    pub(crate) fn new(listener: Arc<Listener>) -> Self {
        Self {
            listener,
            task: None,
        }
    }

    /// Ties a background delivery task to the subscription's lifetime.
    pub(crate) fn with_task(listener: Arc<Listener>, task: AbortHandle) -> Self {
        Self {
            listener,
            task: Some(task),
        }
    }

    pub fn trip_id(&self) -> &str {
        self.listener.trip_id()
    }

    pub fn is_active(&self) -> bool {
        self.listener.is_active()
    }

    /// Stops delivery. No callback runs after this returns.
    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.listener.release() {
            tracing::debug!(trip_id = %self.listener.trip_id(), "subscription released");
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_listener() -> (Arc<Listener>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let listener = Listener::new(
            "trip-1",
            Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        (listener, calls)
    }

    #[test]
    fn test_deliver_until_cancelled() {
        let (listener, calls) = counting_listener();
        let subscription = Subscription::new(listener.clone());

        assert!(listener.deliver(None));
        subscription.cancel();
        assert!(!listener.deliver(None));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_releases_listener() {
        let (listener, _calls) = counting_listener();
        {
            let subscription = Subscription::new(listener.clone());
            assert!(subscription.is_active());
        }
        assert!(!listener.is_active());
    }

    #[test]
    fn test_release_happens_once() {
        let (listener, _calls) = counting_listener();
        assert!(listener.release());
        assert!(!listener.release());
    }
}
