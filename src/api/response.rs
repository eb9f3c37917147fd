//! JSON response helpers with the status codes the control surface promises

use axum::Json;
use axum::http::StatusCode;
use serde::Serialize;
use serde_json::Value;

pub type ApiResponse = (StatusCode, Json<Value>);

pub fn ok<T: Serialize>(data: T) -> ApiResponse {
    (
        StatusCode::OK,
        Json(serde_json::to_value(data).unwrap_or(Value::Null)),
    )
}

pub fn bad_request(message: impl Into<String>) -> ApiResponse {
    error_with(StatusCode::BAD_REQUEST, message)
}

pub fn not_found(message: impl Into<String>) -> ApiResponse {
    error_with(StatusCode::NOT_FOUND, message)
}

pub fn gone(message: impl Into<String>) -> ApiResponse {
    error_with(StatusCode::GONE, message)
}

pub fn timeout(message: impl Into<String>) -> ApiResponse {
    error_with(StatusCode::GATEWAY_TIMEOUT, message)
}

pub fn internal_error(message: impl Into<String>) -> ApiResponse {
    error_with(StatusCode::INTERNAL_SERVER_ERROR, message)
}

fn error_with(status: StatusCode, message: impl Into<String>) -> ApiResponse {
    (
        status,
        Json(serde_json::json!({
            "status": "error",
            "error": message.into(),
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_shape_carries_status_tag_and_message() {
        let (status, Json(body)) = not_found("session not active");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "session not active");
    }

    #[test]
    fn ok_serializes_payload() {
        let (status, Json(body)) = ok(serde_json::json!({"status": "ok"}));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
