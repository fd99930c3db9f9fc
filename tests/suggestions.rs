//! Suggestion client against a stand-in generation API.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use itinera::suggest::SuggestionClient;

#[derive(Debug, Clone)]
struct SeenRequest {
    path: String,
    api_key: Option<String>,
    body: Value,
}

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    reply: Value,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

async fn generate(
    State(state): State<MockState>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.seen.lock().unwrap().push(SeenRequest {
        path: uri.path().to_string(),
        api_key: headers
            .get("x-goog-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });
    (state.status, Json(state.reply.clone())).into_response()
}

struct MockApi {
    endpoint: String,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
    task: JoinHandle<()>,
}

impl MockApi {
    async fn start(status: StatusCode, reply: Value) -> Self {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            status,
            reply,
            seen: seen.clone(),
        };
        let app = Router::new().fallback(generate).with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}/v1beta", listener.local_addr().unwrap());
        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            endpoint,
            seen,
            task,
        }
    }

    fn client(&self, api_key: Option<&str>) -> SuggestionClient {
        SuggestionClient::new(api_key.map(str::to_string)).with_endpoint(&self.endpoint)
    }

    fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }
}

impl Drop for MockApi {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn candidate(text: &str) -> Value {
    json!({
        "candidates": [{ "content": { "parts": [{ "text": text }] } }]
    })
}

#[tokio::test]
async fn test_suggestions_are_mapped_to_items() {
    let text = json!({
        "suggestions": [
            { "time": "10:00", "title": "Kinkaku-ji", "description": "Golden pavilion" },
            { "time": "08:00", "title": "Fushimi Inari", "description": "Early, before the crowds" }
        ]
    })
    .to_string();
    let api = MockApi::start(StatusCode::OK, candidate(&text)).await;

    let items = api.client(Some("key-123")).suggest("京都", "寺").await;

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].title, "Kinkaku-ji");
    assert_eq!(items[1].time, "08:00");
    assert!(items.iter().all(|item| item.id.starts_with("ai-")));

    let requests = api.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].path,
        "/v1beta/models/gemini-2.5-flash:generateContent"
    );
    assert_eq!(requests[0].api_key.as_deref(), Some("key-123"));

    let prompt = requests[0].body["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap();
    assert!(prompt.contains("京都"));
    assert!(prompt.contains("寺"));
    assert_eq!(
        requests[0].body["generationConfig"]["responseMimeType"],
        "application/json"
    );
}

#[tokio::test]
async fn test_custom_model() {
    let api = MockApi::start(StatusCode::OK, candidate(r#"{"suggestions":[]}"#)).await;

    let items = api
        .client(Some("k"))
        .with_model("gemini-test")
        .suggest("Nara", "deer")
        .await;

    assert!(items.is_empty());
    assert_eq!(
        api.requests()[0].path,
        "/v1beta/models/gemini-test:generateContent"
    );
}

#[tokio::test]
async fn test_error_status_yields_nothing() {
    let api = MockApi::start(
        StatusCode::TOO_MANY_REQUESTS,
        json!({ "error": { "message": "quota" } }),
    )
    .await;

    assert!(api.client(Some("k")).suggest("Nara", "deer").await.is_empty());
}

#[tokio::test]
async fn test_malformed_text_yields_nothing() {
    let api = MockApi::start(StatusCode::OK, candidate("Sorry, I can't help with that.")).await;
    assert!(api.client(Some("k")).suggest("Nara", "deer").await.is_empty());
}

#[tokio::test]
async fn test_missing_api_key_skips_request() {
    let api = MockApi::start(StatusCode::OK, candidate(r#"{"suggestions":[]}"#)).await;
    let client = api.client(None);

    assert!(!client.is_enabled());
    assert!(client.suggest("Nara", "deer").await.is_empty());
    assert!(api.requests().is_empty());
}
