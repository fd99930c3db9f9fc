//! Whole-collection persistence of trips under a single key.

use serde_json::Value;

use super::error::StoreError;
use super::kv::KeyValueStore;
use crate::models::{migrate_trip, Trip};

/// Key under which the trip collection is stored.
pub const TRIPS_KEY: &str = "travel_planner_trips";

/// Loads and saves the full trip list as one JSON document.
///
/// Every save rewrites the entire collection. No size cap is enforced.
#[derive(Debug, Clone)]
pub struct TripStore<K> {
    kv: K,
    key: String,
}

impl<K: KeyValueStore> TripStore<K> {
    pub fn new(kv: K) -> Self {
        Self {
            kv,
            key: TRIPS_KEY.to_string(),
        }
    }

    pub fn with_key(kv: K, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
        }
    }

    pub fn kv(&self) -> &K {
        &self.kv
    }

    /// Loads all trips, migrating older records.
    ///
    /// Never fails: any read or decode error is logged and an empty list is
    /// returned.
    pub fn load_all(&self) -> Vec<Trip> {
        match self.try_load_all() {
            Ok(trips) => {
                tracing::debug!(count = trips.len(), "loaded trips from local store");
                trips
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load trips from local store");
                Vec::new()
            }
        }
    }

    /// Loads all trips, reporting the first error encountered.
    pub fn try_load_all(&self) -> Result<Vec<Trip>, StoreError> {
        let Some(raw) = self.kv.get(&self.key)? else {
            return Ok(Vec::new());
        };

        let records: Vec<Value> = serde_json::from_str(&raw).map_err(StoreError::DecodeError)?;
        records
            .into_iter()
            .map(|record| migrate_trip(record).map_err(StoreError::MigrationError))
            .collect()
    }

    /// Overwrites the stored collection with `trips`.
    ///
    /// Failures are logged and returned; nothing is retried.
    pub fn save_all(&self, trips: &[Trip]) -> Result<(), StoreError> {
        let result = serde_json::to_string(trips)
            .map_err(StoreError::EncodeError)
            .and_then(|json| self.kv.set(&self.key, &json));

        match &result {
            Ok(()) => tracing::debug!(count = trips.len(), "saved trips to local store"),
            Err(e) => tracing::error!(error = %e, "failed to save trips to local store"),
        }
        result
    }
}
