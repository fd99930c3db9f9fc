//! Itinera
//!
//! Trip itinerary planning: local trips, share links and live shared trips.

pub mod config;
pub mod controller;
pub mod editor;
pub mod models;
pub mod remote;
pub mod server;
pub mod share;
pub mod store;
pub mod suggest;

pub use config::{Config, ConfigError};
pub use controller::{Controller, Notice, SharedTrip, View};
pub use editor::{EditError, ItineraryEditor, NewItem};
pub use models::{color_for, DayPlan, ItineraryItem, Trip, TripCollection, TripError};
pub use remote::{HttpDocumentClient, MemoryDocuments, RemoteDocuments, RemoteError, Subscription};
pub use share::{DecodeError, ShareToken};
pub use store::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, StoreError, TripStore};
pub use suggest::SuggestionClient;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
