use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use docval::{
    files::{FileRegistry, StoredFile},
    models::{message::Message, role::Role},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;

// Types matching the incoming JSON structure
#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    messages: Vec<IncomingMessage>,
    #[serde(default)]
    file: Option<AttachedFile>,
}

#[derive(Debug, Deserialize)]
struct IncomingMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AttachedFile {
    name: String,
    base64: String,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    message: String,
    #[serde(rename = "toolCalls")]
    tool_calls: Vec<Value>,
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0}")]
    MalformedRequest(String),
    #[error("Agent execution timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error(transparent)]
    Agent(#[from] anyhow::Error),
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        match self {
            ChatError::MalformedRequest(error) => {
                tracing::warn!(%error, "rejected chat request");
                (StatusCode::BAD_REQUEST, Json(json!({ "error": error }))).into_response()
            }
            other => {
                tracing::error!(error = %other, "chat request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "Internal server error",
                        "details": other.to_string(),
                    })),
                )
                    .into_response()
            }
        }
    }
}

// Convert incoming messages to our internal Message type
fn convert_messages(incoming: Vec<IncomingMessage>) -> Vec<Message> {
    incoming
        .into_iter()
        .map(|msg| match msg.role.as_str() {
            "assistant" => Message::assistant().with_text(msg.content),
            "user" => Message::user().with_text(msg.content),
            other => {
                tracing::debug!(role = other, "treating unknown role as user");
                Message::user().with_text(msg.content)
            }
        })
        .collect()
}

/// Tell the model a document arrived by annotating the most recent user message
fn annotate_attachment(messages: &mut [Message], file: &StoredFile) {
    if let Some(message) = messages.iter_mut().rev().find(|m| m.role == Role::User) {
        message.append_text(&format!(
            "\n\n📎 Arquivo PDF anexado: {} ({} KB)",
            file.name,
            file.size_kb()
        ));
    }
}

fn pending_tool_calls(message: &Message) -> Vec<Value> {
    message
        .tool_requests()
        .into_iter()
        .filter_map(|request| {
            let call = request.tool_call.ok()?;
            Some(json!({
                "id": request.id,
                "name": call.name,
                "args": call.arguments,
            }))
        })
        .collect()
}

/// Answer one chat request. The attached file lives in `registry` only while the agent runs.
async fn respond(
    state: &AppState,
    request: ChatRequest,
    registry: &mut FileRegistry,
) -> Result<ChatResponse, ChatError> {
    if request.messages.is_empty() {
        return Err(ChatError::MalformedRequest(
            "Messages array is required".to_string(),
        ));
    }

    let mut messages = convert_messages(request.messages);
    let file = request.file.map(|file| StoredFile::new(file.name, file.base64));
    if let Some(file) = &file {
        tracing::info!(name = %file.name, chars = file.base64.len(), "file received");
        annotate_attachment(&mut messages, file);
    }

    let scope = registry.scope(file);
    tracing::info!(messages = messages.len(), file_id = ?scope.id(), "invoking agent");
    let result = timeout(state.timeout, state.agent.run(&messages, scope.files())).await;
    drop(scope);

    let reply = result.map_err(|_| ChatError::Timeout(state.timeout))??;
    tracing::info!(
        produced = reply.messages.len(),
        rounds = reply.rounds,
        "agent execution completed"
    );

    Ok(ChatResponse {
        message: reply.message.text(),
        tool_calls: pending_tool_calls(&reply.message),
    })
}

async fn handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ChatError> {
    let Json(request) =
        payload.map_err(|rejection| ChatError::MalformedRequest(rejection.body_text()))?;

    let mut registry = FileRegistry::new();
    respond(&state, request, &mut registry).await.map(Json)
}

// Configure routes for this module
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(handler))
        .with_state(state)
}
