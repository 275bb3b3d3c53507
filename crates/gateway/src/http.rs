//! The axum HTTP surface for the three client-facing paths in §6.
//!
//! Authentication, rate limiting, and telemetry are external collaborators
//! the spec only specifies an interface for; this module does the minimum
//! to stand in for them — it reads a bearer/`x-api-key` token off the
//! request into an opaque `api_key_id` string and passes it straight to
//! the orchestrator for logging. A real deployment puts an auth layer in
//! front of this router the way the teacher's server crate stacks
//! `tower::ServiceBuilder` layers.

use crate::error::GatewayError;
use crate::orchestrator::Orchestrator;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use futures::StreamExt;
use protocol::ProtocolTag;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Builds the router for `/v1/chat/completions`, `/v1/responses`, and
/// `/v1/messages`. Callers `.merge()` this into a larger app and add
/// whatever auth/rate-limit/tracing layers their deployment needs.
pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    Router::new()
        .route("/v1/chat/completions", post(handle_openai_chat))
        .route("/v1/responses", post(handle_openai_responses))
        .route("/v1/messages", post(handle_anthropic_messages))
        .with_state(orchestrator)
}

async fn handle_openai_chat(State(orchestrator): State<Arc<Orchestrator>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    dispatch(orchestrator, ProtocolTag::OpenAiChat, headers, body).await
}

async fn handle_openai_responses(State(orchestrator): State<Arc<Orchestrator>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    dispatch(orchestrator, ProtocolTag::OpenAiResponses, headers, body).await
}

async fn handle_anthropic_messages(State(orchestrator): State<Arc<Orchestrator>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    dispatch(orchestrator, ProtocolTag::Anthropic, headers, body).await
}

async fn dispatch(orchestrator: Arc<Orchestrator>, tag: ProtocolTag, headers: HeaderMap, body: Value) -> Response {
    let api_key_id = extract_api_key_id(&headers);
    let client_headers = flatten_headers(&headers);
    let is_stream = body.get("stream").and_then(Value::as_bool).unwrap_or(false);

    if is_stream {
        match orchestrator.handle_stream(tag, &api_key_id, body, client_headers).await {
            Ok((status, frames)) => {
                let body = Body::from_stream(frames.map(Ok::<_, std::convert::Infallible>));
                Response::builder()
                    .status(StatusCode::from_u16(status).unwrap_or(StatusCode::OK))
                    .header("content-type", "text/event-stream")
                    .header("cache-control", "no-cache")
                    .body(body)
                    .expect("static headers are always valid")
            }
            Err(err) => error_response(tag, err),
        }
    } else {
        match orchestrator.handle_unary(tag, &api_key_id, body, client_headers).await {
            Ok((status, value)) => {
                (StatusCode::from_u16(status).unwrap_or(StatusCode::OK), Json(value)).into_response()
            }
            Err(err) => error_response(tag, err),
        }
    }
}

/// Renders a `GatewayError` as a protocol-appropriate body with the stable
/// `code` field named in §7.
fn error_response(tag: ProtocolTag, err: GatewayError) -> Response {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = match tag {
        ProtocolTag::Anthropic => json!({
            "type": "error",
            "error": {"type": err.code(), "message": err.client_message()},
        }),
        ProtocolTag::OpenAiChat | ProtocolTag::OpenAiResponses => json!({
            "error": {"message": err.client_message(), "type": err.code(), "code": err.code()},
        }),
    };
    (status, Json(body)).into_response()
}

fn extract_api_key_id(headers: &HeaderMap) -> String {
    if let Some(value) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        if let Some(token) = value.strip_prefix("Bearer ") {
            return token.to_string();
        }
    }
    if let Some(value) = headers.get("x-api-key").and_then(|v| v.to_str().ok()) {
        return value.to_string();
    }
    "anonymous".to_string()
}

fn flatten_headers(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
        .collect()
}
