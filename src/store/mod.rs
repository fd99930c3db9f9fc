//! Local persistence of the trip collection.

mod error;
mod kv;
mod trips;

pub use error::StoreError;
pub use kv::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use trips::{TripStore, TRIPS_KEY};
