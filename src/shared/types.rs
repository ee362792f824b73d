use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Response envelope used by every endpoint.
///
/// Success payload fields are flattened next to `ok`, so a created report
/// serializes as `{"ok":true,"id":"..."}` rather than nesting a `data`
/// object. Errors carry a single client-safe message.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(flatten)]
    pub body: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(body: T) -> Self {
        Self {
            ok: true,
            body: Some(body),
            error: None,
        }
    }

    pub fn ok_empty() -> ApiResponse<()> {
        ApiResponse {
            ok: true,
            body: None,
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            ok: false,
            body: None,
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Created {
        id: &'static str,
    }

    #[test]
    fn test_success_body_is_flattened() {
        let resp = ApiResponse::ok(Created { id: "abc" });
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json, serde_json::json!({"ok": true, "id": "abc"}));
    }

    #[test]
    fn test_empty_success_has_only_ok() {
        let resp = ApiResponse::<()>::ok_empty();
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json, serde_json::json!({"ok": true}));
    }

    #[test]
    fn test_error_shape() {
        let resp = ApiResponse::<()>::err("Missing/invalid fields: lat, img");
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"ok": false, "error": "Missing/invalid fields: lat, img"})
        );
    }
}
