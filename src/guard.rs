use crate::error::{Error, Result};
use reqwest::StatusCode;
use serde_json::Value;

/// Error body StatBank sends alongside a failing status.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub(crate) error_type_code: Option<Value>,
    #[serde(default)]
    pub(crate) message: Option<String>,
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Check an HTTP status, turning failures into [`Error::Http`].
///
/// When the body is a StatBank error object with both an `errorTypeCode` and a
/// `message`, the message replaces the generic status reason.
pub fn ensure_ok(status: StatusCode, body: &[u8], url: &str) -> Result<()> {
    if status.is_success() {
        return Ok(());
    }
    Err(http_error(status, body, url))
}

/// Build the upstream-failure error for a non-success `status`.
pub fn http_error(status: StatusCode, body: &[u8], url: &str) -> Error {
    let server_message = serde_json::from_slice::<ApiErrorBody>(body)
        .ok()
        .filter(|e| e.error_type_code.as_ref().is_some_and(truthy))
        .and_then(|e| e.message)
        .filter(|m| !m.is_empty());

    let reason = server_message.unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Unknown Status")
            .to_string()
    });
    log::debug!("GET {url} failed with {status}: {reason}");
    Error::Http {
        status,
        reason,
        url: url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_passes() {
        assert!(ensure_ok(StatusCode::OK, b"not json", "u").is_ok());
    }

    #[test]
    fn server_message_replaces_reason() {
        let body = br#"{"errorTypeCode": 1, "message": "Quota exceeded"}"#;
        let err = ensure_ok(StatusCode::BAD_REQUEST, body, "u").unwrap_err();
        assert_eq!(err.reason(), Some("Quota exceeded"));
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn string_error_codes_count() {
        let body = br#"{"errorTypeCode": "TABLE_NOT_FOUND", "message": "Unknown table"}"#;
        let err = ensure_ok(StatusCode::NOT_FOUND, body, "u").unwrap_err();
        assert_eq!(err.reason(), Some("Unknown table"));
    }

    #[test]
    fn falls_back_to_canonical_reason() {
        let err = ensure_ok(StatusCode::BAD_REQUEST, b"", "u").unwrap_err();
        assert_eq!(err.reason(), Some("Bad Request"));

        let err = ensure_ok(StatusCode::SERVICE_UNAVAILABLE, b"<html>down</html>", "u").unwrap_err();
        assert_eq!(err.reason(), Some("Service Unavailable"));

        // message without an error code is not trusted
        let err = ensure_ok(StatusCode::BAD_REQUEST, br#"{"message": "x"}"#, "u").unwrap_err();
        assert_eq!(err.reason(), Some("Bad Request"));

        let err = ensure_ok(StatusCode::BAD_REQUEST, br#"{"errorTypeCode": 0, "message": "x"}"#, "u")
            .unwrap_err();
        assert_eq!(err.reason(), Some("Bad Request"));
    }

    #[test]
    fn http_error_matches_ensure_ok() {
        let body = br#"{"errorTypeCode": 1, "message": "Quota exceeded"}"#;
        let err = http_error(StatusCode::TOO_MANY_REQUESTS, body, "u");
        assert_eq!(err.reason(), Some("Quota exceeded"));
        assert_eq!(err.status(), Some(StatusCode::TOO_MANY_REQUESTS));
    }
}
