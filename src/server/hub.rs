//! Fan-out of saved documents to WebSocket subscribers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, Mutex as AsyncMutex, OwnedMutexGuard, RwLock};

use crate::models::Trip;

const CHANNEL_CAPACITY: usize = 16;

/// One broadcast channel per trip id.
///
/// Writers hold [`DocumentHub::lock_document`] across save and broadcast so
/// subscribers see saves in storage order.
pub struct DocumentHub {
    channels: RwLock<HashMap<String, broadcast::Sender<Trip>>>,
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl DocumentHub {
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Waits for exclusive access to `trip_id`.
    pub async fn lock_document(&self, trip_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            // Held or awaited locks have another reference
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(trip_id.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }

    pub fn lock_count(&self) -> usize {
        let locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.values().filter(|lock| Arc::strong_count(lock) > 1).count()
    }

    /// Subscribes to future saves of `trip_id`.
    pub async fn subscribe(&self, trip_id: &str) -> broadcast::Receiver<Trip> {
        let mut channels = self.channels.write().await;

        if let Some(sender) = channels.get(trip_id) {
            sender.subscribe()
        } else {
            let (sender, receiver) = broadcast::channel(CHANNEL_CAPACITY);
            channels.insert(trip_id.to_string(), sender);
            receiver
        }
    }

    /// Sends a saved document to every subscriber of its id.
    pub async fn broadcast(&self, trip: &Trip) {
        let channels = self.channels.read().await;

        if let Some(sender) = channels.get(&trip.id) {
            // No receivers is not an error
            let _ = sender.send(trip.clone());
        }
    }

    /// Drops the channel for `trip_id` once nobody listens on it.
    pub async fn prune(&self, trip_id: &str) {
        let mut channels = self.channels.write().await;

        if channels
            .get(trip_id)
            .is_some_and(|sender| sender.receiver_count() == 0)
        {
            channels.remove(trip_id);
        }
    }

    pub async fn channel_count(&self) -> usize {
        self.channels.read().await.len()
    }
}

impl Default for DocumentHub {
    fn default() -> Self {
        Self::new()
    }
}
