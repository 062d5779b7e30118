/// Centralized helpers for WebSocket and HTTP error responses.
///
/// Every error sent to a client carries a code, a message and a context.
use actix_web::{HttpResponse, http::StatusCode};
use serde_json::json;

/// Formats a WebSocket error frame as a JSON string.
///
/// # Arguments
/// - `code`: Unique error code (e.g. "NOT_YOUR_TURN").
/// - `message`: Human-readable error message.
/// - `context`: Optional context (e.g. player_id, room_id).
pub fn ws_error_message(code: &str, message: &str, context: Option<&str>) -> String {
    json!({
        "action": "Error",
        "data": {
            "code": code,
            "message": message,
            "context": context.unwrap_or(""),
        }
    })
    .to_string()
}

/// Returns the frame sent to a connection replaced by a newer one for the same player.
pub fn ws_session_replaced_message(context: Option<&str>) -> String {
    ws_error_message(
        "SESSION_REPLACED",
        "You have been disconnected because another session has connected as this player.",
        context,
    )
}

/// Returns an HTTP error response with a JSON body.
pub fn http_error_response(
    code: &str,
    message: &str,
    context: Option<&str>,
    status: StatusCode,
) -> HttpResponse {
    let body = json!({
        "error": {
            "code": code,
            "message": message,
            "context": context.unwrap_or(""),
        }
    });
    HttpResponse::build(status).content_type("application/json").body(body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_frame_is_valid_json() {
        let frame = ws_error_message("INVALID_MOVE", "wall in the \"way\"", Some("alice"));
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["action"], "Error");
        assert_eq!(value["data"]["code"], "INVALID_MOVE");
        assert_eq!(value["data"]["message"], "wall in the \"way\"");
        assert_eq!(value["data"]["context"], "alice");
    }
}
