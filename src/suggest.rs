//! Itinerary suggestions from the Gemini generation API.
//!
//! Every failure (no API key, network, quota, malformed output) is logged
//! and turned into an empty suggestion list. Nothing is retried.

use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;

use crate::config::SuggestConfig;
use crate::models::ItineraryItem;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Clone)]
pub struct SuggestionClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl SuggestionClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: api_key.filter(|key| !key.is_empty()),
        }
    }

    pub fn from_config(config: &SuggestConfig) -> Self {
        Self::new(config.api_key.clone())
            .with_endpoint(&config.endpoint)
            .with_model(&config.model)
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Suggestions are disabled when no API key is configured.
    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// Asks for activity ideas at `destination` matching `interests`.
    pub async fn suggest(&self, destination: &str, interests: &str) -> Vec<ItineraryItem> {
        let Some(api_key) = &self.api_key else {
            tracing::warn!("no API key configured, suggestions are disabled");
            return Vec::new();
        };

        match self.request(api_key, destination, interests).await {
            Ok(items) => {
                tracing::debug!(count = items.len(), destination, "received suggestions");
                items
            }
            Err(e) => {
                tracing::error!(error = %e, destination, "failed to get itinerary suggestions");
                Vec::new()
            }
        }
    }

    async fn request(
        &self,
        api_key: &str,
        destination: &str,
        interests: &str,
    ) -> Result<Vec<ItineraryItem>, SuggestionError> {
        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&request_body(&build_prompt(destination, interests)))
            .send()
            .await
            .map_err(|e| SuggestionError::HttpError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SuggestionError::StatusError(response.status().as_u16()));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| SuggestionError::HttpError(e.to_string()))?;

        let text = body.text().ok_or(SuggestionError::EmptyResponse)?;
        parse_suggestions(&text)
    }
}

/// Prompt asking for five plans, each with a time, title and description.
pub fn build_prompt(destination: &str, interests: &str) -> String {
    format!(
        "「{}」への旅行で、「{}」に興味がある旅行者向けの旅行プランを5つ提案してください。\
         各提案について、適切な時間（例：「09:00」、「13:30」）、簡潔なタイトル、\
         そして魅力的で短い説明を付けてください。",
        destination, interests
    )
}

fn request_body(prompt: &str) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "suggestions": {
                        "type": "ARRAY",
                        "description": "A list of itinerary suggestions.",
                        "items": {
                            "type": "OBJECT",
                            "properties": {
                                "time": { "type": "STRING", "description": "Suggested time in HH:MM format." },
                                "title": { "type": "STRING", "description": "The title of the activity or place." },
                                "description": { "type": "STRING", "description": "A short description of the suggestion." }
                            },
                            "required": ["time", "title", "description"]
                        }
                    }
                },
                "required": ["suggestions"]
            }
        }
    })
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateResponse {
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Deserialize)]
struct SuggestionPayload {
    suggestions: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Suggestion {
    time: String,
    title: String,
    description: String,
}

/// Parses the model's JSON text into items with fresh `ai-` ids.
///
/// A payload without a `suggestions` array yields no items.
pub fn parse_suggestions(text: &str) -> Result<Vec<ItineraryItem>, SuggestionError> {
    let payload: SuggestionPayload =
        serde_json::from_str(text.trim()).map_err(SuggestionError::Malformed)?;

    let Some(Value::Array(entries)) = payload.suggestions else {
        return Ok(Vec::new());
    };

    entries
        .into_iter()
        .map(|entry| {
            let suggestion: Suggestion =
                serde_json::from_value(entry).map_err(SuggestionError::Malformed)?;
            Ok(ItineraryItem::suggested(
                suggestion.time,
                suggestion.title,
                suggestion.description,
            ))
        })
        .collect()
}

#[derive(Debug)]
pub enum SuggestionError {
    HttpError(String),
    StatusError(u16),
    /// The response had no generated text.
    EmptyResponse,
    /// The generated text was not the expected JSON.
    Malformed(serde_json::Error),
}

impl fmt::Display for SuggestionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuggestionError::HttpError(e) => write!(f, "HTTP error: {}", e),
            SuggestionError::StatusError(status) => {
                write!(f, "Generation API returned status {}", status)
            }
            SuggestionError::EmptyResponse => write!(f, "Generation API returned no text"),
            SuggestionError::Malformed(e) => write!(f, "Malformed suggestions: {}", e),
        }
    }
}

impl std::error::Error for SuggestionError {}
