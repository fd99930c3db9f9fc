//! Document server and HTTP client against each other over real sockets.

use chrono::NaiveDate;
use futures::{SinkExt, StreamExt};
use serde_json::json;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::{accept_async, tungstenite::Message};

use itinera::controller::Controller;
use itinera::models::Trip;
use itinera::remote::{HttpDocumentClient, RemoteDocuments};
use itinera::server::{init_memory_db, router, AppState, DocumentRepository};
use itinera::store::{MemoryKeyValueStore, TripStore};

const WAIT: Duration = Duration::from_secs(5);

/// A document server on an ephemeral port, stopped when dropped.
struct TestServer {
    url: String,
    task: JoinHandle<()>,
}

impl TestServer {
    async fn start() -> Self {
        let pool = init_memory_db().await.unwrap();
        let app = router(AppState::new(DocumentRepository::new(pool)));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { url, task }
    }

    fn client(&self) -> HttpDocumentClient {
        HttpDocumentClient::new(self.url.clone())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn trip(id: &str) -> Trip {
    let start = NaiveDate::from_ymd_opt(2024, 10, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2024, 10, 2).unwrap();
    Trip::with_id(id, "Autumn", "Nikko", start, end).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await;
    assert!(server.client().check_server().await);
}

#[tokio::test]
async fn test_unreachable_server() {
    let client = HttpDocumentClient::new("http://127.0.0.1:1");
    assert!(!client.check_server().await);
    assert!(client.fetch("t1").await.is_none());
    assert!(client.save(&trip("t1")).await.is_err());
}

#[tokio::test]
async fn test_save_and_fetch() {
    let server = TestServer::start().await;
    let client = server.client();

    assert!(client.fetch("t1").await.is_none());

    let mut trip = trip("t1");
    client.save(&trip).await.unwrap();
    assert_eq!(client.fetch("t1").await, Some(trip.clone()));

    trip.memo = "last write wins".to_string();
    client.save(&trip).await.unwrap();
    assert_eq!(client.fetch("t1").await.unwrap().memo, "last write wins");
}

#[tokio::test]
async fn test_subscribe_receives_current_and_later_values() {
    let server = TestServer::start().await;
    let client = server.client();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let subscription = client.subscribe(
        "t1",
        Box::new(move |trip| {
            let _ = tx.send(trip);
        }),
    );

    // Nothing stored yet
    let first = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert!(first.is_none());

    client.save(&trip("t1")).await.unwrap();
    let second = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(second.unwrap().id, "t1");

    subscription.cancel();
    client.save(&trip("t1")).await.unwrap();
    // Sender was dropped with the listener, so the channel ends
    assert_eq!(timeout(WAIT, rx.recv()).await.unwrap(), None);
}

#[tokio::test]
async fn test_subscription_reconnects_after_connection_drops() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let stored = json!({ "trip": trip("t1") }).to_string();

    let server = tokio::spawn(async move {
        // First connection: empty document, then closed
        let (socket, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(socket).await.unwrap();
        ws.send(Message::text(r#"{"trip":null}"#)).await.unwrap();
        let _ = ws.close(None).await;
        drop(ws);

        // Second connection stays open
        let (socket, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(socket).await.unwrap();
        ws.send(Message::text(stored)).await.unwrap();
        while let Some(Ok(_)) = ws.next().await {}
    });

    let client = HttpDocumentClient::new(url);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = client.subscribe(
        "t1",
        Box::new(move |trip| {
            let _ = tx.send(trip);
        }),
    );

    let first = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert!(first.is_none());

    let second = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(second, Some(trip("t1")));
    assert!(subscription.is_active());

    subscription.cancel();
    server.abort();
}

#[tokio::test]
async fn test_controller_follows_remote_edits() {
    let server = TestServer::start().await;
    let writer = server.client();
    writer.save(&trip("shared")).await.unwrap();

    let kv = MemoryKeyValueStore::new();
    let mut controller = Controller::new(TripStore::new(&kv), server.client());
    controller.navigate("#/share/shared");

    timeout(WAIT, controller.wait_remote_update()).await.unwrap();
    assert_eq!(controller.current_trip().unwrap().id, "shared");

    let mut changed = trip("shared");
    changed.memo = "edited elsewhere".to_string();
    writer.save(&changed).await.unwrap();

    timeout(WAIT, controller.wait_remote_update()).await.unwrap();
    assert_eq!(controller.current_trip().unwrap().memo, "edited elsewhere");

    controller.edit(|e| e.set_memo("edited here")).await.unwrap();
    assert_eq!(writer.fetch("shared").await.unwrap().memo, "edited here");
    assert!(controller.trips().is_empty());
}
