//! Chat API.
//!
//! Endpoints:
//!
//! - `POST /api/chat`: send a message, get the final answer
//! - `POST /api/chat/stream`: send a message, get an SSE event stream
//! - `GET  /api/chat/ws`: WebSocket, one request per inbound frame
//! - `GET  /api/tools`: list available tools
//! - `GET  /api/health`: upstream dependency status
//! - `GET  /api/analysis/repo/{owner}/{repo}`, `POST /api/analysis/compare`:
//!   health scores without the model, see [`crate::analysis`]

use axum::{
    Router,
    extract::State,
    extract::rejection::JsonRejection,
    extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
    http::{StatusCode, header},
    response::sse::{Event as SseEvent, Sse},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::SharedState;
use oscopilot_agent::{StreamEvent, display_name};
use oscopilot_core::error::Error;
use oscopilot_core::message::Message;
use oscopilot_core::request::ChatRequest;

/// Sentinel closing every SSE stream.
pub const SSE_DONE: &str = "[DONE]";

pub fn api_router(state: SharedState) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/chat/stream", post(chat_stream_handler))
        .route("/chat/ws", get(ws_handler))
        .route("/tools", get(list_tools_handler))
        .route("/health", get(crate::health::dependencies_handler))
        .route("/analysis/repo/{owner}/{repo}", get(crate::analysis::repo_handler))
        .route("/analysis/compare", post(crate::analysis::compare_handler))
        .with_state(state)
}

// ── Errors ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// A failed API call: status plus `{ "error": ... }` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::Request(_) => StatusCode::BAD_REQUEST,
            Error::Provider(_) => StatusCode::BAD_GATEWAY,
            Error::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

// ── Chat ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub messages: Vec<Message>,
}

async fn chat_handler(
    State(state): State<SharedState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload?;
    info!(repo = ?request.repo(), history = request.history.len(), "api/chat request");

    let outcome = state.orchestrator.run(&request).await.map_err(|e| {
        warn!(error = %e, "Chat request failed");
        ApiError::from(e)
    })?;

    Ok(Json(ChatResponse {
        response: outcome.response,
        messages: outcome.messages,
    }))
}

// ── SSE Streaming ─────────────────────────────────────────────────────────

fn sse_frame(event: &StreamEvent) -> SseEvent {
    let data = serde_json::to_string(event).unwrap_or_default();
    SseEvent::default().data(data)
}

/// `POST /api/chat/stream`: one `data:` frame per event, then `[DONE]`.
async fn chat_stream_handler(
    State(state): State<SharedState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    info!(repo = ?request.repo(), history = request.history.len(), "api/chat/stream SSE request");

    let rx = state
        .orchestrator
        .run_stream(&request)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let stream = ReceiverStream::new(rx)
        .map(|event| Ok::<_, Infallible>(sse_frame(&event)))
        .chain(tokio_stream::once(Ok(SseEvent::default().data(SSE_DONE))));

    Ok((
        [(header::CACHE_CONTROL, "no-cache")],
        Sse::new(stream),
    )
        .into_response())
}

// ── WebSocket ─────────────────────────────────────────────────────────────

/// Server frames on the WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsFrame<'a> {
    Status { status: &'static str },
    Chunk { data: &'a StreamEvent },
    Error { message: String },
}

impl WsFrame<'_> {
    fn to_message(&self) -> WsMessage {
        WsMessage::Text(serde_json::to_string(self).unwrap_or_default().into())
    }
}

/// `GET /api/chat/ws`: each text frame is a `ChatRequest`.
///
/// Replies with `processing`, one `chunk` per stream event, then
/// `completed`. Invalid frames get an `error` frame and the socket stays
/// open.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

async fn handle_ws_connection(mut socket: WebSocket, state: SharedState) {
    info!("WebSocket connection established");

    while let Some(msg) = socket.recv().await {
        let text = match msg {
            Ok(WsMessage::Text(text)) => text,
            Ok(WsMessage::Close(_)) => break,
            Ok(_) => continue,
            Err(_) => break,
        };

        let request: ChatRequest = match serde_json::from_str(text.as_str()) {
            Ok(request) => request,
            Err(e) => {
                let frame = WsFrame::Error {
                    message: format!("Invalid message: {e}"),
                };
                if socket.send(frame.to_message()).await.is_err() {
                    break;
                }
                continue;
            }
        };

        let mut rx = match state.orchestrator.run_stream(&request) {
            Ok(rx) => rx,
            Err(e) => {
                let frame = WsFrame::Error {
                    message: e.to_string(),
                };
                if socket.send(frame.to_message()).await.is_err() {
                    break;
                }
                continue;
            }
        };

        let processing = WsFrame::Status { status: "processing" };
        if socket.send(processing.to_message()).await.is_err() {
            break;
        }

        while let Some(event) = rx.recv().await {
            if socket.send(WsFrame::Chunk { data: &event }.to_message()).await.is_err() {
                debug!("WebSocket client left mid-stream");
                return;
            }
        }

        let completed = WsFrame::Status { status: "completed" };
        if socket.send(completed.to_message()).await.is_err() {
            break;
        }
    }

    info!("WebSocket connection closed");
}

// ── Tools ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ToolDto {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

async fn list_tools_handler(State(state): State<SharedState>) -> Json<Vec<ToolDto>> {
    let tools = state
        .orchestrator
        .tools()
        .definitions()
        .into_iter()
        .map(|d| ToolDto {
            display_name: display_name(&d.name).to_string(),
            name: d.name,
            description: d.description,
            parameters: d.parameters,
        })
        .collect();
    Json(tools)
}
