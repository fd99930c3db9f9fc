//! Remote document service: one document per shared trip.
//!
//! Writes are unconditional overwrites (last write wins). Subscriptions
//! deliver the current document right away and again after every change.

mod error;
mod http;
mod memory;
mod subscription;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use error::RemoteError;
pub use http::HttpDocumentClient;
pub use memory::MemoryDocuments;
pub use subscription::{ChangeCallback, Subscription};

use crate::models::Trip;

/// Message pushed to subscribers over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentUpdate<T = Trip> {
    pub trip: Option<T>,
}

/// Access to shared trip documents.
#[allow(async_fn_in_trait)]
pub trait RemoteDocuments {
    /// Upserts the document for `trip.id`, replacing any previous version.
    async fn save(&self, trip: &Trip) -> Result<(), RemoteError>;

    /// Reads a document once. Missing documents and read failures are `None`.
    async fn fetch(&self, trip_id: &str) -> Option<Trip>;

    /// Registers `on_change` for live updates of one document.
    fn subscribe(&self, trip_id: &str, on_change: ChangeCallback) -> Subscription;
}

impl<R: RemoteDocuments + ?Sized> RemoteDocuments for Arc<R> {
    async fn save(&self, trip: &Trip) -> Result<(), RemoteError> {
        (**self).save(trip).await
    }

    async fn fetch(&self, trip_id: &str) -> Option<Trip> {
        (**self).fetch(trip_id).await
    }

    fn subscribe(&self, trip_id: &str, on_change: ChangeCallback) -> Subscription {
        (**self).subscribe(trip_id, on_change)
    }
}
