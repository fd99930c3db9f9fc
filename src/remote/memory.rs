//! In-process document service.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use super::subscription::{ChangeCallback, Listener, Subscription};
use super::{RemoteDocuments, RemoteError};
use crate::models::Trip;

/// Documents and listeners held in memory.
///
/// Delivery is synchronous: `save` runs every active listener for the
/// document before it returns, and `subscribe` runs the new listener once
/// with the current value. Saves and subscriptions are delivered one at a
/// time, so a listener never sees an older value after a newer one.
/// Callbacks may read from the service but must not save or subscribe.
#[derive(Debug, Default)]
pub struct MemoryDocuments {
    inner: Mutex<Inner>,
    delivery: Mutex<()>,
}

#[derive(Debug, Default)]
struct Inner {
    documents: HashMap<String, Trip>,
    listeners: HashMap<String, Vec<Weak<Listener>>>,
}

impl Inner {
    /// Active listeners for a document, pruning released ones.
    fn active_listeners(&mut self, trip_id: &str) -> Vec<Arc<Listener>> {
        let Some(registered) = self.listeners.get_mut(trip_id) else {
            return Vec::new();
        };

        let mut active = Vec::new();
        registered.retain(|weak| match weak.upgrade() {
            Some(listener) if listener.is_active() => {
                active.push(listener);
                true
            }
            _ => false,
        });
        if registered.is_empty() {
            self.listeners.remove(trip_id);
        }
        active
    }
}

impl MemoryDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscriptions on a document.
    pub fn listener_count(&self, trip_id: &str) -> usize {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.active_listeners(trip_id).len()
    }

    pub fn document_count(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.documents.len()
    }
}

impl RemoteDocuments for MemoryDocuments {
    async fn save(&self, trip: &Trip) -> Result<(), RemoteError> {
        let _delivering = self.delivery.lock().unwrap_or_else(|e| e.into_inner());
        let listeners = {
            let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            inner.documents.insert(trip.id.clone(), trip.clone());
            inner.active_listeners(&trip.id)
        };

        for listener in listeners {
            listener.deliver(Some(trip.clone()));
        }
        Ok(())
    }

    async fn fetch(&self, trip_id: &str) -> Option<Trip> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.documents.get(trip_id).cloned()
    }

    fn subscribe(&self, trip_id: &str, on_change: ChangeCallback) -> Subscription {
        let listener = Listener::new(trip_id, on_change);

        let _delivering = self.delivery.lock().unwrap_or_else(|e| e.into_inner());
        let current = {
            let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            inner
                .listeners
                .entry(trip_id.to_string())
                .or_default()
                .push(Arc::downgrade(&listener));
            inner.documents.get(trip_id).cloned()
        };

        listener.deliver(current);
        Subscription::new(listener)
    }
}
