use serde::{Deserialize, Serialize};

use super::trip::Trip;

/// The locally stored trips, in the order they were added.
///
/// All changes are pure transforms: each returns the new collection when
/// something changed and `None` when the request was a no-op, leaving the
/// caller to decide whether to persist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TripCollection {
    trips: Vec<Trip>,
}

impl TripCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection, keeping the first trip for each id.
    pub fn from_trips(trips: Vec<Trip>) -> Self {
        let mut collection = Self::new();
        for trip in trips {
            if collection.contains(&trip.id) {
                tracing::warn!(trip_id = %trip.id, "dropping trip with duplicate id");
                continue;
            }
            collection.trips.push(trip);
        }
        collection
    }

    pub fn len(&self) -> usize {
        self.trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Trip> {
        self.trips.iter()
    }

    pub fn as_slice(&self) -> &[Trip] {
        &self.trips
    }

    pub fn get(&self, trip_id: &str) -> Option<&Trip> {
        self.trips.iter().find(|trip| trip.id == trip_id)
    }

    pub fn contains(&self, trip_id: &str) -> bool {
        self.get(trip_id).is_some()
    }

    /// Appends a trip. Returns `None` if a trip with the same id exists.
    pub fn added(&self, trip: Trip) -> Option<Self> {
        if self.contains(&trip.id) {
            return None;
        }
        let mut trips = self.trips.clone();
        trips.push(trip);
        Some(Self { trips })
    }

    /// Removes a trip by id. Returns `None` if no trip matched.
    pub fn removed(&self, trip_id: &str) -> Option<Self> {
        if !self.contains(trip_id) {
            return None;
        }
        let trips = self
            .trips
            .iter()
            .filter(|trip| trip.id != trip_id)
            .cloned()
            .collect();
        Some(Self { trips })
    }

    /// Replaces the trip sharing `trip.id`. Returns `None` if the id is unknown.
    pub fn updated(&self, trip: Trip) -> Option<Self> {
        let index = self.trips.iter().position(|t| t.id == trip.id)?;
        let mut trips = self.trips.clone();
        trips[index] = trip;
        Some(Self { trips })
    }
}

impl From<TripCollection> for Vec<Trip> {
    fn from(collection: TripCollection) -> Self {
        collection.trips
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn trip(id: &str) -> Trip {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        Trip::with_id(id, format!("Trip {}", id), "Lisbon", date, date).unwrap()
    }

    fn collection() -> TripCollection {
        TripCollection::from_trips(vec![trip("a"), trip("b")])
    }

    #[test]
    fn test_added_appends_in_order() {
        let next = collection().added(trip("c")).unwrap();
        let ids: Vec<&str> = next.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_added_rejects_duplicate_id() {
        assert!(collection().added(trip("a")).is_none());
    }

    #[test]
    fn test_removed_unknown_id_is_noop() {
        let before = collection();
        assert!(before.removed("zzz").is_none());
        assert_eq!(before, collection());
    }

    #[test]
    fn test_updated_unknown_id_is_noop() {
        assert!(collection().updated(trip("zzz")).is_none());
    }

    #[test]
    fn test_add_then_remove_restores_collection() {
        let before = collection();
        let after = before.added(trip("c")).unwrap().removed("c").unwrap();
        assert_eq!(after, before);
    }

    #[test]
    fn test_updated_replaces_in_place() {
        let mut changed = trip("a");
        changed.memo = "bring adapters".to_string();

        let next = collection().updated(changed).unwrap();
        assert_eq!(next.as_slice()[0].memo, "bring adapters");
        assert_eq!(next.as_slice()[1].id, "b");
    }

    #[test]
    fn test_from_trips_drops_duplicates() {
        let collection = TripCollection::from_trips(vec![trip("a"), trip("a"), trip("b")]);
        assert_eq!(collection.len(), 2);
    }
}
