//! HTTP handlers for the control surface
//!
//! Thin transport over the core: request parsing, status-code mapping and
//! event emission live here; all session/automation semantics live in the
//! `session` and `gemini` modules.

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use crate::events::Event;
use crate::gemini::{Card, Mode, PromptError, parse_cookie_table, run_prompt};
use crate::session::{self, SessionError};

use super::AppState;
use super::response::{self, ApiResponse};

#[derive(Deserialize, Default)]
pub struct LoginRequest {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    card: Option<String>,
}

#[derive(Deserialize)]
pub struct PromptRequest {
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Deserialize)]
pub struct CloseRequest {
    session_id: String,
}

/// POST /update_cookies
///
/// Accepts the raw tab-delimited cookie table either as the `cookies`
/// field of a JSON body or as the raw request body, parses it and rewrites
/// the persisted feed wholesale.
pub async fn update_cookies(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> ApiResponse {
    let is_json = headers
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));

    let table = if is_json {
        serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("cookies").and_then(|c| c.as_str()).map(String::from))
            .unwrap_or_default()
    } else {
        body
    };

    if table.trim().is_empty() {
        return response::bad_request("cookies table text required");
    }

    let parsed = parse_cookie_table(&table);

    match state.cookie_store.save(&parsed).await {
        Ok(()) => {
            state
                .events
                .append(Event::new("update_cookies", "written").field("count", parsed.len()))
                .await;
            response::ok(json!({
                "action": "write_new_cookies",
                "status": "written",
            }))
        }
        Err(e) => {
            state
                .events
                .append(Event::new("update_cookies", "error").field("error", e.to_string()))
                .await;
            response::internal_error(e.to_string())
        }
    }
}

/// POST /login_with_cookies
///
/// Establishes a new session; mode and card inputs are normalized, never
/// rejected. Failures report the attempted session id for log correlation.
pub async fn login_with_cookies(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResponse {
    let mode = Mode::normalize(request.version.as_deref());
    let card = Card::normalize(request.card.as_deref());

    match session::establish(&state.registry, &state.events, &state.config, mode, card).await {
        Ok(established) => response::ok(json!({
            "status": "ok",
            "session_id": established.session_id,
            "cookies_loaded": established.cookies_loaded,
            "mode_selected": established.mode_selected,
            "card_selected": established.card_selected,
        })),
        Err(e) => {
            let session_id = e.session_id().unwrap_or_default().to_string();
            state
                .events
                .append(
                    Event::new("login_with_cookies", "error")
                        .field("session_id", session_id.as_str())
                        .field("error", e.to_string()),
                )
                .await;
            (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "status": "error",
                    "message": e.to_string(),
                    "session_id": session_id,
                })),
            )
        }
    }
}

/// POST /send_prompt
pub async fn send_prompt(
    State(state): State<AppState>,
    Json(request): Json<PromptRequest>,
) -> ApiResponse {
    let session_id = request.session_id.unwrap_or_default();

    state
        .events
        .append(
            Event::new("send_prompt_request", "received")
                .field("session_id", session_id.as_str())
                .field("prompt", request.prompt.clone().unwrap_or_default()),
        )
        .await;

    let Some(prompt) = request.prompt.filter(|p| !p.is_empty()) else {
        state
            .events
            .append(
                Event::new("send_prompt", "warning")
                    .field("session_id", session_id.as_str())
                    .field("message", "Prompt missing"),
            )
            .await;
        return response::bad_request("Prompt is required");
    };

    let Some(handle) = state.registry.get(&session_id).await else {
        state
            .events
            .append(
                Event::new("send_prompt", "error")
                    .field("session_id", session_id.as_str())
                    .field("message", "Session not active"),
            )
            .await;
        return response::not_found("session not active");
    };

    // The token is an affordance for library callers of `run_prompt`;
    // the HTTP layer itself never cancels an in-flight prompt.
    let cancel = CancellationToken::new();
    let result = run_prompt(
        &handle,
        &prompt,
        &state.config.locators,
        &state.config.poll,
        &cancel,
        &state.events,
    )
    .await;

    match result {
        Ok(reply) => response::ok(json!({
            "status": "ok",
            "full_response": reply.full_response,
            "code_blocks": reply.code_blocks,
        })),
        Err(PromptError::NotFound) => {
            state
                .events
                .append(
                    Event::new("send_prompt", "error")
                        .field("session_id", session_id.as_str())
                        .field("message", "Session not active"),
                )
                .await;
            response::not_found("session not active")
        }
        Err(PromptError::Gone) => {
            state
                .events
                .append(
                    Event::new("send_prompt", "error")
                        .field("session_id", session_id.as_str())
                        .field("message", "Session terminated externally"),
                )
                .await;
            response::gone("session terminated externally")
        }
        Err(PromptError::DeadlineExceeded) => {
            response::timeout("timed out waiting for response")
        }
        Err(e) => {
            state
                .events
                .append(
                    Event::new("send_prompt", "error")
                        .field("session_id", session_id.as_str())
                        .field("error", e.to_string()),
                )
                .await;
            response::internal_error(e.to_string())
        }
    }
}

/// POST /close_session
pub async fn close_session(
    State(state): State<AppState>,
    Json(request): Json<CloseRequest>,
) -> ApiResponse {
    match state.registry.close(&request.session_id).await {
        Ok(()) => {
            state
                .events
                .append(
                    Event::new("close_session", "success")
                        .field("session_id", request.session_id.as_str()),
                )
                .await;
            response::ok(json!({
                "status": "closed",
                "session_id": request.session_id,
            }))
        }
        Err(SessionError::NotFound) => {
            state
                .events
                .append(
                    Event::new("close_session", "error")
                        .field("session_id", request.session_id.as_str())
                        .field("message", "Session not active"),
                )
                .await;
            response::not_found("session not active")
        }
        Err(e) => {
            state
                .events
                .append(
                    Event::new("close_session", "error")
                        .field("session_id", request.session_id.as_str())
                        .field("error", e.to_string()),
                )
                .await;
            response::internal_error(e.to_string())
        }
    }
}

/// GET /active_sessions
pub async fn active_sessions(State(state): State<AppState>) -> ApiResponse {
    let entries = state.registry.list_status().await;

    state
        .events
        .append(Event::new("active_sessions", "checked").field("count", entries.len()))
        .await;

    response::ok(json!({
        "active_count": entries.len(),
        "drivers": entries,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use crate::events::EventLog;
    use axum::http::StatusCode;
    use tempfile::TempDir;

    async fn test_state() -> (AppState, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.cookie_file = dir.path().join("cookies.json");
        config.event_log = dir.path().join("events.jsonl");

        let events = EventLog::open(&config.event_log).await.unwrap();
        (AppState::new(config, events), dir)
    }

    #[tokio::test]
    async fn prompt_against_unknown_session_is_not_found() {
        let (state, _dir) = test_state().await;

        let request = PromptRequest {
            prompt: Some("line1\nline2".to_string()),
            session_id: Some("missing".to_string()),
        };

        let (status, Json(body)) = send_prompt(State(state), Json(request)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "session not active");
    }

    #[tokio::test]
    async fn prompt_without_text_is_bad_request() {
        let (state, _dir) = test_state().await;

        let request = PromptRequest {
            prompt: None,
            session_id: Some("whatever".to_string()),
        };

        let (status, Json(body)) = send_prompt(State(state), Json(request)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Prompt is required");
    }

    #[tokio::test]
    async fn empty_prompt_is_bad_request() {
        let (state, _dir) = test_state().await;

        let request = PromptRequest {
            prompt: Some(String::new()),
            session_id: Some("whatever".to_string()),
        };

        let (status, _) = send_prompt(State(state), Json(request)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn closing_unknown_session_is_not_found() {
        let (state, _dir) = test_state().await;

        let request = CloseRequest {
            session_id: "missing".to_string(),
        };

        let (status, Json(body)) = close_session(State(state), Json(request)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "session not active");
    }

    #[tokio::test]
    async fn empty_registry_reports_no_drivers() {
        let (state, _dir) = test_state().await;

        let (status, Json(body)) = active_sessions(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["active_count"], 0);
        assert!(body["drivers"].as_array().unwrap().is_empty());
    }
}
