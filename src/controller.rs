//! Application state: the trip collection, the current view and routing.
//!
//! The controller is the only owner of the trip collection. Collection
//! changes are computed as new [`TripCollection`] values and then written
//! through to the local store in full. Shared trips come from the remote
//! document service; their subscription lives inside the shared view, so
//! leaving the view releases it.

use std::fmt;
use tokio::sync::mpsc;

use crate::editor::{EditError, ItineraryEditor};
use crate::models::{Trip, TripCollection};
use crate::remote::{RemoteDocuments, RemoteError, Subscription};
use crate::share::{self, parse_fragment, DecodeError, ShareToken};
use crate::store::{KeyValueStore, TripStore};

/// What the user is looking at.
#[derive(Debug)]
pub enum View {
    /// All local trips.
    List,
    /// One local trip, editable.
    Detail { trip_id: String },
    /// A trip opened from a share link.
    Shared(SharedTrip),
}

#[derive(Debug)]
pub enum SharedTrip {
    /// A live remote document. `trip` is `None` until the first value
    /// arrives, or when the document does not exist.
    Remote {
        trip_id: String,
        trip: Option<Trip>,
        generation: u64,
        subscription: Subscription,
    },
    /// A trip decoded from a snapshot link. Read-only.
    Snapshot { trip: Trip },
}

/// Something the shell should tell the user about.
#[derive(Debug)]
pub enum Notice {
    /// The share link could not be decoded; the fragment was cleared.
    InvalidShareLink(DecodeError),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::InvalidShareLink(_) => write!(f, "Invalid share link."),
        }
    }
}

#[derive(Debug)]
struct RemoteUpdate {
    generation: u64,
    trip: Option<Trip>,
}

pub struct Controller<K, R> {
    store: TripStore<K>,
    remote: R,
    trips: TripCollection,
    view: View,
    fragment: String,
    generation: u64,
    updates_tx: mpsc::UnboundedSender<RemoteUpdate>,
    updates_rx: mpsc::UnboundedReceiver<RemoteUpdate>,
}

impl<K: KeyValueStore, R: RemoteDocuments> Controller<K, R> {
    /// Loads the local collection and starts in list view.
    pub fn new(store: TripStore<K>, remote: R) -> Self {
        let trips = TripCollection::from_trips(store.load_all());
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();

        Self {
            store,
            remote,
            trips,
            view: View::List,
            fragment: String::new(),
            generation: 0,
            updates_tx,
            updates_rx,
        }
    }

    pub fn trips(&self) -> &TripCollection {
        &self.trips
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// The trip shown by the current view, if any.
    pub fn current_trip(&self) -> Option<&Trip> {
        match &self.view {
            View::List => None,
            View::Detail { trip_id } => self.trips.get(trip_id),
            View::Shared(SharedTrip::Remote { trip, .. }) => trip.as_ref(),
            View::Shared(SharedTrip::Snapshot { trip }) => Some(trip),
        }
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self.view, View::Shared(SharedTrip::Snapshot { .. }))
    }

    /// Handles a change of the URL fragment.
    ///
    /// Share fragments open the shared view; anything else leaves it. A
    /// snapshot that fails to decode clears the fragment, returns to the
    /// list and yields a notice for the user.
    pub fn navigate(&mut self, fragment: &str) -> Option<Notice> {
        self.fragment = fragment.to_string();

        match parse_fragment(fragment) {
            None => {
                if matches!(self.view, View::Shared(_)) {
                    tracing::debug!("left shared view");
                    self.view = View::List;
                }
                None
            }
            Some(ShareToken::Remote(trip_id)) => {
                self.open_remote(trip_id);
                None
            }
            Some(ShareToken::Snapshot(token)) => match share::decode(&token) {
                Ok(trip) => {
                    tracing::info!(trip_id = %trip.id, "opened shared snapshot");
                    self.view = View::Shared(SharedTrip::Snapshot { trip });
                    None
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to decode shared trip");
                    self.fragment.clear();
                    self.view = View::List;
                    Some(Notice::InvalidShareLink(e))
                }
            },
        }
    }

    fn open_remote(&mut self, trip_id: String) {
        if let View::Shared(SharedTrip::Remote { trip_id: current, .. }) = &self.view {
            if *current == trip_id {
                return;
            }
        }

        // Release any previous subscription before opening the next one.
        self.view = View::List;

        self.generation += 1;
        let generation = self.generation;
        let tx = self.updates_tx.clone();
        let subscription = self.remote.subscribe(
            &trip_id,
            Box::new(move |trip| {
                let _ = tx.send(RemoteUpdate { generation, trip });
            }),
        );

        tracing::info!(%trip_id, "subscribed to shared trip");
        self.view = View::Shared(SharedTrip::Remote {
            trip_id,
            trip: None,
            generation,
            subscription,
        });
        self.apply_remote_updates();
    }

    /// Applies every remote update received so far. Returns how many were
    /// applied to the current view.
    pub fn apply_remote_updates(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(update) = self.updates_rx.try_recv() {
            if self.apply_remote_update(update) {
                applied += 1;
            }
        }
        applied
    }

    /// Waits for the next update that changes the shared view.
    pub async fn wait_remote_update(&mut self) {
        while let Some(update) = self.updates_rx.recv().await {
            if self.apply_remote_update(update) {
                return;
            }
        }
    }

    fn apply_remote_update(&mut self, update: RemoteUpdate) -> bool {
        match &mut self.view {
            View::Shared(SharedTrip::Remote {
                trip, generation, ..
            }) if *generation == update.generation => {
                *trip = update.trip;
                true
            }
            // From a subscription that has since been released.
            _ => false,
        }
    }

    /// Opens a local trip for editing. Ignored while a shared trip is open.
    pub fn select_trip(&mut self, trip_id: &str) -> bool {
        if matches!(self.view, View::Shared(_)) || !self.trips.contains(trip_id) {
            return false;
        }
        self.view = View::Detail {
            trip_id: trip_id.to_string(),
        };
        true
    }

    /// Returns to the list, leaving any shared trip.
    pub fn back(&mut self) {
        if matches!(self.view, View::Shared(_)) {
            self.fragment.clear();
        }
        self.view = View::List;
    }

    pub fn add_trip(&mut self, trip: Trip) -> bool {
        let trip_id = trip.id.clone();
        match self.trips.added(trip) {
            Some(next) => {
                self.commit(next);
                true
            }
            None => {
                tracing::warn!(%trip_id, "trip id already exists, not added");
                false
            }
        }
    }

    pub fn delete_trip(&mut self, trip_id: &str) -> bool {
        let Some(next) = self.trips.removed(trip_id) else {
            return false;
        };
        self.commit(next);

        if matches!(&self.view, View::Detail { trip_id: selected } if selected == trip_id) {
            self.view = View::List;
        }
        true
    }

    pub fn update_trip(&mut self, trip: Trip) -> bool {
        match self.trips.updated(trip) {
            Some(next) => {
                self.commit(next);
                true
            }
            None => false,
        }
    }

    fn commit(&mut self, next: TripCollection) {
        self.trips = next;
        // Failures are logged by the store; the in-memory state stays current.
        let _ = self.store.save_all(self.trips.as_slice());
    }

    /// Applies an edit to the trip in the current view.
    ///
    /// Local trips are written through to the local store. Remote trips are
    /// shown immediately and pushed to the document service; a failed push
    /// is logged and not retried.
    pub async fn edit<F>(&mut self, f: F) -> Result<Trip, EditError>
    where
        F: FnOnce(&ItineraryEditor<'_>) -> Result<Trip, EditError>,
    {
        match &mut self.view {
            View::List => Err(EditError::NoTripSelected),
            View::Detail { trip_id } => {
                let trip = self.trips.get(trip_id).ok_or(EditError::NoTripSelected)?;
                let updated = f(&ItineraryEditor::new(trip))?;
                self.update_trip(updated.clone());
                Ok(updated)
            }
            View::Shared(SharedTrip::Snapshot { trip }) => f(&ItineraryEditor::read_only(trip)),
            View::Shared(SharedTrip::Remote { trip, .. }) => {
                let current = trip.as_ref().ok_or(EditError::NoTripSelected)?;
                let updated = f(&ItineraryEditor::new(current))?;
                *trip = Some(updated.clone());

                if let Err(e) = self.remote.save(&updated).await {
                    tracing::warn!(trip_id = %updated.id, error = %e, "failed to push shared trip");
                }
                Ok(updated)
            }
        }
    }

    /// Publishes a local trip to the document service so it can be shared.
    pub async fn publish(&self, trip_id: &str) -> Result<(), RemoteError> {
        match self.trips.get(trip_id) {
            Some(trip) => self.remote.save(trip).await,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::NewItem;
    use crate::models::ItineraryItem;
    use crate::remote::MemoryDocuments;
    use crate::share::{encode, share_fragment};
    use crate::store::MemoryKeyValueStore;
    use chrono::NaiveDate;
    use std::sync::Arc;

    type TestController<'a> = Controller<&'a MemoryKeyValueStore, Arc<MemoryDocuments>>;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn trip(id: &str) -> Trip {
        Trip::with_id(id, "Trip", "Hakone", date(1), date(2)).unwrap()
    }

    fn controller<'a>(
        kv: &'a MemoryKeyValueStore,
        docs: &Arc<MemoryDocuments>,
    ) -> TestController<'a> {
        Controller::new(TripStore::new(kv), docs.clone())
    }

    #[test]
    fn test_starts_in_list_view() {
        let kv = MemoryKeyValueStore::new();
        let docs = Arc::new(MemoryDocuments::new());
        let c = controller(&kv, &docs);
        assert!(matches!(c.view(), View::List));
        assert!(c.trips().is_empty());
    }

    #[test]
    fn test_mutations_write_through() {
        let kv = MemoryKeyValueStore::new();
        let docs = Arc::new(MemoryDocuments::new());
        let mut c = controller(&kv, &docs);

        assert!(c.add_trip(trip("a")));
        assert!(c.add_trip(trip("b")));
        assert_eq!(TripStore::new(&kv).load_all().len(), 2);

        assert!(c.delete_trip("a"));
        let stored = TripStore::new(&kv).load_all();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, "b");
    }

    #[test]
    fn test_noop_mutations() {
        let kv = MemoryKeyValueStore::new();
        let docs = Arc::new(MemoryDocuments::new());
        let mut c = controller(&kv, &docs);
        c.add_trip(trip("a"));
        let before = c.trips().clone();

        assert!(!c.add_trip(trip("a")));
        assert!(!c.delete_trip("missing"));
        assert!(!c.update_trip(trip("missing")));
        assert_eq!(c.trips(), &before);
    }

    #[test]
    fn test_deleting_selected_trip_returns_to_list() {
        let kv = MemoryKeyValueStore::new();
        let docs = Arc::new(MemoryDocuments::new());
        let mut c = controller(&kv, &docs);
        c.add_trip(trip("a"));
        c.add_trip(trip("b"));

        assert!(c.select_trip("a"));
        c.delete_trip("b");
        assert!(matches!(c.view(), View::Detail { .. }));

        c.delete_trip("a");
        assert!(matches!(c.view(), View::List));
    }

    #[test]
    fn test_select_unknown_trip() {
        let kv = MemoryKeyValueStore::new();
        let docs = Arc::new(MemoryDocuments::new());
        let mut c = controller(&kv, &docs);
        assert!(!c.select_trip("nope"));
        assert!(matches!(c.view(), View::List));
    }

    #[tokio::test]
    async fn test_edit_in_detail_view_persists() {
        let kv = MemoryKeyValueStore::new();
        let docs = Arc::new(MemoryDocuments::new());
        let mut c = controller(&kv, &docs);
        c.add_trip(trip("a"));
        c.select_trip("a");

        c.edit(|e| e.add_item(date(1), NewItem::new("10:00", "Ropeway")))
            .await
            .unwrap();
        c.edit(|e| e.set_memo("onsen")).await.unwrap();

        let stored = TripStore::new(&kv).load_all();
        assert_eq!(stored[0].item_count(), 1);
        assert_eq!(stored[0].memo, "onsen");
        assert_eq!(docs.document_count(), 0);
    }

    #[tokio::test]
    async fn test_edit_without_selection() {
        let kv = MemoryKeyValueStore::new();
        let docs = Arc::new(MemoryDocuments::new());
        let mut c = controller(&kv, &docs);
        let result = c.edit(|e| e.set_memo("x")).await;
        assert_eq!(result, Err(EditError::NoTripSelected));
    }

    #[tokio::test]
    async fn test_remote_share_subscribes_and_receives_updates() {
        let kv = MemoryKeyValueStore::new();
        let docs = Arc::new(MemoryDocuments::new());
        docs.save(&trip("shared")).await.unwrap();

        let mut c = controller(&kv, &docs);
        assert!(c.navigate("#/share/shared").is_none());
        assert_eq!(c.current_trip().unwrap().id, "shared");
        assert_eq!(docs.listener_count("shared"), 1);

        let mut changed = trip("shared");
        changed.memo = "from another tab".to_string();
        docs.save(&changed).await.unwrap();

        assert_eq!(c.apply_remote_updates(), 1);
        assert_eq!(c.current_trip().unwrap().memo, "from another tab");
    }

    #[tokio::test]
    async fn test_remote_share_of_missing_document() {
        let kv = MemoryKeyValueStore::new();
        let docs = Arc::new(MemoryDocuments::new());
        let mut c = controller(&kv, &docs);

        c.navigate("#/share/ghost");
        assert!(matches!(c.view(), View::Shared(SharedTrip::Remote { .. })));
        assert!(c.current_trip().is_none());
    }

    #[tokio::test]
    async fn test_leaving_share_releases_subscription() {
        let kv = MemoryKeyValueStore::new();
        let docs = Arc::new(MemoryDocuments::new());
        let mut c = controller(&kv, &docs);

        c.navigate("#/share/x");
        assert_eq!(docs.listener_count("x"), 1);

        c.navigate("");
        assert!(matches!(c.view(), View::List));
        assert_eq!(docs.listener_count("x"), 0);
    }

    #[tokio::test]
    async fn test_switching_shared_id_releases_old_subscription() {
        let kv = MemoryKeyValueStore::new();
        let docs = Arc::new(MemoryDocuments::new());
        let mut c = controller(&kv, &docs);

        c.navigate("#/share/x");
        c.navigate("#/share/y");
        assert_eq!(docs.listener_count("x"), 0);
        assert_eq!(docs.listener_count("y"), 1);

        // Same id again keeps the existing subscription.
        c.navigate("#/share/y");
        assert_eq!(docs.listener_count("y"), 1);
    }

    #[tokio::test]
    async fn test_stale_updates_are_ignored() {
        let kv = MemoryKeyValueStore::new();
        let docs = Arc::new(MemoryDocuments::new());
        let mut c = controller(&kv, &docs);

        c.navigate("#/share/x");
        c.navigate("#/share/y");
        // Delivered before `x` was released but applied after the switch.
        c.updates_tx
            .send(RemoteUpdate {
                generation: 1,
                trip: Some(trip("x")),
            })
            .unwrap();

        assert_eq!(c.apply_remote_updates(), 0);
        assert!(c.current_trip().is_none());
    }

    #[tokio::test]
    async fn test_edit_in_remote_view_pushes_not_local() {
        let kv = MemoryKeyValueStore::new();
        let docs = Arc::new(MemoryDocuments::new());
        docs.save(&trip("shared")).await.unwrap();
        let mut c = controller(&kv, &docs);
        c.navigate("#/share/shared");

        c.edit(|e| e.set_memo("group notes")).await.unwrap();

        assert_eq!(docs.fetch("shared").await.unwrap().memo, "group notes");
        assert!(TripStore::new(&kv).load_all().is_empty());
        assert!(kv.get(crate::store::TRIPS_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_snapshot_share_is_read_only() {
        let kv = MemoryKeyValueStore::new();
        let docs = Arc::new(MemoryDocuments::new());
        let mut c = controller(&kv, &docs);

        let mut shared = trip("snap");
        shared.days[0].insert(ItineraryItem::new("09:00", "Lake Ashi"));
        let token = encode(&shared).unwrap();

        assert!(c.navigate(&share_fragment(&token)).is_none());
        assert_eq!(c.current_trip(), Some(&shared));
        assert!(c.is_read_only());
        assert_eq!(
            c.edit(|e| e.set_memo("x")).await,
            Err(EditError::ReadOnly)
        );
    }

    #[test]
    fn test_invalid_snapshot_clears_fragment() {
        let kv = MemoryKeyValueStore::new();
        let docs = Arc::new(MemoryDocuments::new());
        let mut c = controller(&kv, &docs);

        let notice = c.navigate("#/share/eJthis-is-not-compressed");
        assert!(matches!(notice, Some(Notice::InvalidShareLink(_))));
        assert_eq!(c.fragment(), "");
        assert!(matches!(c.view(), View::List));
    }

    #[test]
    fn test_select_ignored_while_shared() {
        let kv = MemoryKeyValueStore::new();
        let docs = Arc::new(MemoryDocuments::new());
        let mut c = controller(&kv, &docs);
        c.add_trip(trip("a"));

        c.navigate("#/share/x");
        assert!(!c.select_trip("a"));

        c.back();
        assert_eq!(c.fragment(), "");
        assert!(c.select_trip("a"));
    }

    #[tokio::test]
    async fn test_publish_saves_remote_copy() {
        let kv = MemoryKeyValueStore::new();
        let docs = Arc::new(MemoryDocuments::new());
        let mut c = controller(&kv, &docs);
        c.add_trip(trip("a"));

        c.publish("a").await.unwrap();
        assert_eq!(docs.fetch("a").await, Some(trip("a")));
    }
}
