//! Client for the itinera document server.
//!
//! Saves and fetches go over HTTP; subscriptions hold a WebSocket open to
//! `/trips/<id>/subscribe` and forward every pushed document, reconnecting
//! with backoff when the connection drops.

use futures::{Stream, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error as WsError, Message},
};

use super::subscription::{ChangeCallback, Listener, Subscription};
use super::{DocumentUpdate, RemoteDocuments, RemoteError};
use crate::models::{migrate_trip, Trip};

const RECONNECT_DELAY: Duration = Duration::from_millis(250);
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct HttpDocumentClient {
    server_url: String,
    http: reqwest::Client,
}

impl HttpDocumentClient {
    pub fn new(server_url: impl Into<String>) -> Self {
        let server_url = server_url.into().trim_end_matches('/').to_string();
        Self {
            server_url,
            http: reqwest::Client::new(),
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Returns true if the server answers its health check.
    pub async fn check_server(&self) -> bool {
        let url = format!("{}/health", self.http_base());
        match self.http.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    fn http_base(&self) -> String {
        if self.server_url.starts_with("ws://") {
            self.server_url.replacen("ws://", "http://", 1)
        } else if self.server_url.starts_with("wss://") {
            self.server_url.replacen("wss://", "https://", 1)
        } else if !self.server_url.starts_with("http://")
            && !self.server_url.starts_with("https://")
        {
            format!("http://{}", self.server_url)
        } else {
            self.server_url.clone()
        }
    }

    fn ws_base(&self) -> String {
        let http = self.http_base();
        if http.starts_with("https://") {
            http.replacen("https://", "wss://", 1)
        } else {
            http.replacen("http://", "ws://", 1)
        }
    }

    fn document_url(&self, trip_id: &str) -> String {
        format!(
            "{}/trips/{}",
            self.http_base(),
            urlencoding::encode(trip_id)
        )
    }

    fn subscribe_url(&self, trip_id: &str) -> String {
        format!(
            "{}/trips/{}/subscribe",
            self.ws_base(),
            urlencoding::encode(trip_id)
        )
    }

    async fn try_fetch(&self, trip_id: &str) -> Result<Option<Trip>, RemoteError> {
        let response = self
            .http
            .get(self.document_url(trip_id))
            .send()
            .await
            .map_err(|e| RemoteError::HttpError(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(RemoteError::StatusError(response.status().as_u16()));
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| RemoteError::HttpError(e.to_string()))?;
        migrate_trip(value)
            .map(Some)
            .map_err(|e| RemoteError::DecodeError(e.to_string()))
    }
}

impl RemoteDocuments for HttpDocumentClient {
    async fn save(&self, trip: &Trip) -> Result<(), RemoteError> {
        let response = self
            .http
            .put(self.document_url(&trip.id))
            .json(trip)
            .send()
            .await
            .map_err(|e| RemoteError::HttpError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RemoteError::StatusError(response.status().as_u16()));
        }
        Ok(())
    }

    async fn fetch(&self, trip_id: &str) -> Option<Trip> {
        match self.try_fetch(trip_id).await {
            Ok(trip) => trip,
            Err(e) => {
                tracing::warn!(trip_id, error = %e, "failed to fetch trip document");
                None
            }
        }
    }

    /// Must be called from within a Tokio runtime.
    fn subscribe(&self, trip_id: &str, on_change: ChangeCallback) -> Subscription {
        let listener = Listener::new(trip_id, on_change);
        let task = tokio::spawn(run_subscription(
            self.subscribe_url(trip_id),
            listener.clone(),
        ));
        Subscription::with_task(listener, task.abort_handle())
    }
}

/// Keeps a subscription connected until its listener is released.
///
/// Every connection starts with the server sending the current document, so
/// a reconnect re-delivers the latest value. A failed first connection
/// delivers `None` once; later failures keep the last delivered value.
async fn run_subscription(url: String, listener: Arc<Listener>) {
    let mut delay = RECONNECT_DELAY;
    let mut delivered = false;

    while listener.is_active() {
        match connect_async(url.as_str()).await {
            Ok((stream, _)) => {
                tracing::debug!(trip_id = %listener.trip_id(), "subscription connected");
                delay = RECONNECT_DELAY;
                if !forward_updates(stream, &listener, &mut delivered).await {
                    return;
                }
            }
            Err(e) => {
                let e = RemoteError::ConnectionError(e.to_string());
                tracing::warn!(trip_id = %listener.trip_id(), error = %e, "subscription failed");
                if !delivered {
                    if !listener.deliver(None) {
                        return;
                    }
                    delivered = true;
                }
            }
        }

        tracing::debug!(trip_id = %listener.trip_id(), ?delay, "reconnecting subscription");
        tokio::time::sleep(delay).await;
        delay = (delay * 2).min(MAX_RECONNECT_DELAY);
    }
}

/// Forwards pushed documents until the connection ends.
///
/// Returns false once the listener has been released.
async fn forward_updates<S>(mut stream: S, listener: &Listener, delivered: &mut bool) -> bool
where
    S: Stream<Item = Result<Message, WsError>> + Unpin,
{
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => match parse_update(text.as_str()) {
                Ok(trip) => {
                    if !listener.deliver(trip) {
                        return false;
                    }
                    *delivered = true;
                }
                Err(e) => {
                    tracing::warn!(trip_id = %listener.trip_id(), error = %e, "ignoring bad update")
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(trip_id = %listener.trip_id(), error = %e, "subscription dropped");
                break;
            }
        }
    }
    listener.is_active()
}

fn parse_update(text: &str) -> Result<Option<Trip>, RemoteError> {
    let update: DocumentUpdate<Value> =
        serde_json::from_str(text).map_err(|e| RemoteError::DecodeError(e.to_string()))?;

    match update.trip {
        None | Some(Value::Null) => Ok(None),
        Some(value) => migrate_trip(value)
            .map(Some)
            .map_err(|e| RemoteError::DecodeError(e.to_string())),
    }
}
