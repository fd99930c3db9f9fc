//! HTTP and WebSocket routes of the document server.
//!
//! - `GET /health`: liveness check
//! - `GET /trips/{id}`: current document, 404 if none
//! - `PUT /trips/{id}`: replace the document, body id must match the path
//! - `GET /trips/{id}/subscribe`: WebSocket pushing `{"trip": ...}` now and
//!   after every save

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use futures::{Sink, SinkExt, StreamExt};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tower_http::trace::TraceLayer;

use super::hub::DocumentHub;
use super::storage::DocumentRepository;
use crate::models::{migrate_trip, Trip};
use crate::remote::DocumentUpdate;

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub documents: Arc<DocumentRepository>,
    pub hub: Arc<DocumentHub>,
}

impl AppState {
    pub fn new(documents: DocumentRepository) -> Self {
        Self {
            documents: Arc::new(documents),
            hub: Arc::new(DocumentHub::new()),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/trips/{id}", get(get_trip).put(put_trip))
        .route("/trips/{id}/subscribe", get(subscribe_trip))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Error response body
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, "bad_request", message),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn get_trip(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
) -> Result<Json<Trip>, ApiError> {
    match state.documents.get(&trip_id).await {
        Ok(Some(trip)) => Ok(Json(trip)),
        Ok(None) => Err(ApiError::NotFound(format!("No document for trip {}", trip_id))),
        Err(e) => {
            tracing::error!(%trip_id, error = %e, "failed to read document");
            Err(ApiError::Internal(e.to_string()))
        }
    }
}

async fn put_trip(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<StatusCode, ApiError> {
    let trip = migrate_trip(body).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    if trip.id != trip_id {
        return Err(ApiError::BadRequest(format!(
            "Document id {} does not match path id {}",
            trip.id, trip_id
        )));
    }

    // Held until the broadcast so concurrent saves reach subscribers in order
    let _guard = state.hub.lock_document(&trip_id).await;
    if let Err(e) = state.documents.save(&trip).await {
        tracing::error!(%trip_id, error = %e, "failed to save document");
        return Err(ApiError::Internal(e.to_string()));
    }

    tracing::info!(%trip_id, "saved document");
    state.hub.broadcast(&trip).await;

    Ok(StatusCode::NO_CONTENT)
}

async fn subscribe_trip(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
) -> Response {
    ws.on_upgrade(move |socket| stream_document(socket, state, trip_id))
}

async fn load_document(state: &AppState, trip_id: &str) -> Option<Trip> {
    match state.documents.get(trip_id).await {
        Ok(trip) => trip,
        Err(e) => {
            tracing::warn!(%trip_id, error = %e, "failed to read document for subscriber");
            None
        }
    }
}

async fn send_update<S>(sink: &mut S, trip: Option<Trip>) -> bool
where
    S: Sink<Message> + Unpin,
{
    let json = match serde_json::to_string(&DocumentUpdate { trip }) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!(error = %e, "failed to encode document update");
            return false;
        }
    };
    sink.send(Message::Text(json.into())).await.is_ok()
}

async fn stream_document(socket: WebSocket, state: AppState, trip_id: String) {
    // Subscribing and the first read are ordered with saves of this id.
    let (mut updates, current) = {
        let _guard = state.hub.lock_document(&trip_id).await;
        let updates = state.hub.subscribe(&trip_id).await;
        (updates, load_document(&state, &trip_id).await)
    };
    let (mut sink, mut stream) = socket.split();

    tracing::debug!(%trip_id, "subscriber connected");

    if send_update(&mut sink, current).await {
        loop {
            tokio::select! {
                update = updates.recv() => {
                    let trip = match update {
                        Ok(trip) => Some(trip),
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::debug!(%trip_id, skipped, "subscriber lagged, resyncing");
                            let _guard = state.hub.lock_document(&trip_id).await;
                            updates = updates.resubscribe();
                            load_document(&state, &trip_id).await
                        }
                        Err(RecvError::Closed) => break,
                    };
                    if !send_update(&mut sink, trip).await {
                        break;
                    }
                }
                message = stream.next() => match message {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // Subscribers only listen
                    Some(Ok(_)) => {}
                },
            }
        }
    }

    drop(updates);
    state.hub.prune(&trip_id).await;
    tracing::debug!(%trip_id, "subscriber disconnected");
}
