//! HTTP surface: request validation, pipeline invocation, response shaping.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use studyscout_core::{ChatTurn, Citation, Error, ResourceBundle};
use tracing::{info, warn};

use crate::pipeline::{Pipeline, PipelineOutcome};

const HEADER: &str = "Recommended Resources";

#[derive(Clone)]
pub struct AppState {
    pub http: reqwest::Client,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn chat(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let req = match parse_chat_request(&body) {
        Ok(req) => req,
        Err(details) => return validation_failure(details),
    };
    info!(history_turns = req.history.len(), "chat request accepted");

    // Configuration is read per request. A missing key is a server-side
    // error, not the caller's.
    let pipeline = match Pipeline::from_env(state.http.clone()) {
        Ok(pipeline) => pipeline,
        Err(e) => return fatal_error(&e),
    };
    match pipeline.run(&req.message, &req.history).await {
        Ok(outcome) => (StatusCode::OK, Json(ChatResponse::from_outcome(outcome))).into_response(),
        Err(e) => fatal_error(&e),
    }
}

#[derive(Debug)]
struct ChatRequest {
    message: String,
    history: Vec<ChatTurn>,
}

#[derive(Debug, Serialize)]
struct FieldError {
    field: String,
    message: String,
}

fn field_error(field: impl Into<String>, message: impl Into<String>) -> FieldError {
    FieldError {
        field: field.into(),
        message: message.into(),
    }
}

fn parse_chat_request(body: &Value) -> std::result::Result<ChatRequest, Vec<FieldError>> {
    let Some(obj) = body.as_object() else {
        return Err(vec![field_error("body", "expected a JSON object")]);
    };

    let mut errors = Vec::new();

    let message = match obj.get("message") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::String(_)) | None => {
            errors.push(field_error("message", "Message is required"));
            String::new()
        }
        Some(_) => {
            errors.push(field_error("message", "message must be a string"));
            String::new()
        }
    };

    let mut history = Vec::new();
    match obj.get("history") {
        None | Some(Value::Null) => {}
        Some(Value::Array(turns)) => {
            for (i, turn) in turns.iter().enumerate() {
                match serde_json::from_value::<ChatTurn>(turn.clone()) {
                    Ok(turn) => history.push(turn),
                    Err(e) => errors.push(field_error(format!("history[{i}]"), e.to_string())),
                }
            }
        }
        Some(_) => errors.push(field_error("history", "history must be an array")),
    }

    if errors.is_empty() {
        Ok(ChatRequest { message, history })
    } else {
        Err(errors)
    }
}

fn validation_failure(details: Vec<FieldError>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({
            "error": "Validation failed",
            "details": details,
        })),
    )
        .into_response()
}

fn fatal_error(err: &Error) -> Response {
    warn!(error = %err, "chat request failed");
    let status = match err {
        Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(serde_json::json!({ "error": err.to_string() }))).into_response()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatResponse {
    message: String,
    structured_data: StructuredData,
    /// Grounding citations stay internal; the public field is always empty.
    citations: Vec<Citation>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StructuredData {
    header: &'static str,
    intro: String,
    youtube_videos: Vec<VideoItem>,
    resources: Vec<ResourceItem>,
}

#[derive(Debug, Serialize)]
struct VideoItem {
    title: String,
    link: String,
    summary: String,
}

#[derive(Debug, Serialize)]
struct ResourceItem {
    #[serde(rename = "type")]
    kind: &'static str,
    title: String,
    link: String,
    summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
}

impl ChatResponse {
    fn from_outcome(outcome: PipelineOutcome) -> Self {
        let ResourceBundle {
            intro,
            videos,
            articles,
        } = outcome.bundle;
        Self {
            message: outcome.synthesis_text,
            structured_data: StructuredData {
                header: HEADER,
                intro,
                youtube_videos: videos
                    .into_iter()
                    .map(|v| VideoItem {
                        title: v.title,
                        link: v.link,
                        summary: v.summary,
                    })
                    .collect(),
                resources: articles
                    .into_iter()
                    .map(|a| ResourceItem {
                        kind: "article",
                        title: a.title,
                        link: a.link,
                        summary: a.summary,
                        image: a.image,
                    })
                    .collect(),
            },
            citations: Vec::new(),
        }
    }
}
