//! Conversion of every transport outcome into an `ApiResult`.
//!
//! This is the terminal boundary: it never fails and never panics. Nothing
//! above it sees a raw transport error.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::transport::TransportOutcome;
use super::types::ApiResult;

pub const DEFAULT_SUCCESS_MESSAGE: &str = "Request successful";
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred";

/// Status reported when no HTTP response was received.
pub const NO_RESPONSE_STATUS: u16 = 500;

/// Normalize an outcome. `success_message` replaces the default success
/// message when the backend supplies none.
pub fn normalize<T: DeserializeOwned>(outcome: TransportOutcome, success_message: Option<&str>) -> ApiResult<T> {
    let response = match outcome {
        Ok(response) => response,
        Err(e) => {
            let message = if e.message.is_empty() {
                DEFAULT_ERROR_MESSAGE.to_string()
            } else {
                e.message
            };
            return ApiResult::failure(message, Map::new(), NO_RESPONSE_STATUS);
        }
    };

    let status = response.status;
    let is_success = response.is_success();
    let payload = response.body.unwrap_or(Value::Null);
    let meta = object_field(&payload, "meta");
    let backend_message = payload
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string);
    let signalled_failure = payload.get("success").and_then(Value::as_bool) == Some(false);

    if !is_success || signalled_failure {
        let message = backend_message.unwrap_or_else(|| {
            if is_success {
                DEFAULT_ERROR_MESSAGE.to_string()
            } else {
                format!("Request failed with status code {status}")
            }
        });
        let status_code = payload
            .get("statusCode")
            .and_then(Value::as_u64)
            .and_then(|code| u16::try_from(code).ok())
            .filter(|code| *code != 0)
            .or(Some(status).filter(|code| *code != 0))
            .unwrap_or(NO_RESPONSE_STATUS);
        return ApiResult::failure(message, meta, status_code);
    }

    let data = match payload {
        Value::Object(mut map) if map.contains_key("data") => map.remove("data").unwrap_or(Value::Null),
        other => other,
    };

    let message = backend_message
        .or_else(|| success_message.map(str::to_string))
        .unwrap_or_else(|| DEFAULT_SUCCESS_MESSAGE.to_string());

    // An explicit null still means success; only mismatched non-null data fails.
    if data.is_null() {
        let data = serde_json::from_value::<T>(Value::Null).ok();
        return ApiResult {
            success: true,
            message,
            data,
            meta,
            status_code: status,
        };
    }

    match serde_json::from_value::<T>(data) {
        Ok(data) => ApiResult {
            success: true,
            message,
            data: Some(data),
            meta,
            status_code: status,
        },
        Err(e) => {
            log::warn!("Response payload did not match the expected shape: {}", e);
            ApiResult::failure(format!("Unexpected response payload: {e}"), meta, status)
        }
    }
}

fn object_field(payload: &Value, name: &str) -> Map<String, Value> {
    match payload.get(name) {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::api::transport::{TransportError, TransportErrorKind, TransportResponse};

    fn ok(status: u16, body: Value) -> TransportOutcome {
        Ok(TransportResponse::new(status, Some(body)))
    }

    #[test]
    fn test_success_with_data_field() {
        let result: ApiResult<Value> = normalize(ok(200, json!({"message": "ok", "data": {"id": 1}})), None);
        assert_eq!(
            result,
            ApiResult {
                success: true,
                message: "ok".into(),
                data: Some(json!({"id": 1})),
                meta: Map::new(),
                status_code: 200,
            }
        );
    }

    #[test]
    fn test_success_without_data_field_uses_whole_payload() {
        let result: ApiResult<Value> = normalize(ok(201, json!({"id": 9, "name": "p"})), None);
        assert!(result.success);
        assert_eq!(result.data, Some(json!({"id": 9, "name": "p"})));
        assert_eq!(result.message, DEFAULT_SUCCESS_MESSAGE);
        assert_eq!(result.status_code, 201);
    }

    #[test]
    fn test_success_message_override_only_replaces_default() {
        let result: ApiResult<Value> = normalize(ok(200, json!({"data": 1})), Some("Saved"));
        assert_eq!(result.message, "Saved");

        let result: ApiResult<Value> = normalize(ok(200, json!({"message": "From server", "data": 1})), Some("Saved"));
        assert_eq!(result.message, "From server");
    }

    #[test]
    fn test_success_keeps_meta() {
        let result: ApiResult<Vec<u32>> = normalize(ok(200, json!({"data": [1, 2], "meta": {"total": 2}})), None);
        assert_eq!(result.data, Some(vec![1, 2]));
        assert_eq!(result.meta["total"], 2);
    }

    #[test]
    fn test_empty_success_body() {
        let result: ApiResult<()> = normalize(Ok(TransportResponse::new(204, None)), None);
        assert!(result.success);
        assert_eq!(result.data, Some(()));
        assert_eq!(result.status_code, 204);
    }

    #[test]
    fn test_null_data_on_2xx_is_success_for_typed_payload() {
        #[derive(Debug, Deserialize)]
        struct Project {
            #[allow(dead_code)]
            id: u32,
        }
        let result: ApiResult<Project> = normalize(ok(200, json!({"message": "deleted", "data": null})), None);
        assert!(result.success);
        assert_eq!(result.message, "deleted");
        assert!(result.data.is_none());
        assert_eq!(result.status_code, 200);

        let result: ApiResult<Project> = normalize(Ok(TransportResponse::new(204, None)), None);
        assert!(result.success);
        assert!(result.data.is_none());
    }

    #[test]
    fn test_structured_error() {
        let body = json!({
            "success": false,
            "message": "Email already taken",
            "data": {"field": "email"},
            "meta": {"code": "DUPLICATE"},
            "statusCode": 409
        });
        let result: ApiResult<Value> = normalize(ok(400, body), None);
        assert!(!result.success);
        assert_eq!(result.message, "Email already taken");
        assert_eq!(result.data, None);
        assert_eq!(result.meta["code"], "DUPLICATE");
        assert_eq!(result.status_code, 409);
    }

    #[test]
    fn test_error_without_payload_fields() {
        let result: ApiResult<Value> = normalize(ok(502, json!("Bad Gateway")), None);
        assert!(!result.success);
        assert_eq!(result.message, "Request failed with status code 502");
        assert_eq!(result.status_code, 502);
        assert!(result.meta.is_empty());

        let result: ApiResult<Value> = normalize(Ok(TransportResponse::new(401, None)), None);
        assert_eq!(result.status_code, 401);
        assert_eq!(result.data, None);
    }

    #[test]
    fn test_network_error() {
        let outcome = Err(TransportError::new(TransportErrorKind::Connect, "connection refused"));
        let result: ApiResult<Value> = normalize(outcome, Some("ignored"));
        assert!(!result.success);
        assert_eq!(result.message, "connection refused");
        assert_eq!(result.data, None);
        assert_eq!(result.status_code, 500);

        let outcome = Err(TransportError::new(TransportErrorKind::Other, ""));
        let result: ApiResult<Value> = normalize(outcome, None);
        assert_eq!(result.message, DEFAULT_ERROR_MESSAGE);
    }

    #[test]
    fn test_success_false_on_2xx_is_failure() {
        let result: ApiResult<Value> = normalize(ok(200, json!({"success": false, "data": {"x": 1}})), None);
        assert!(!result.success);
        assert_eq!(result.data, None);
        assert_eq!(result.message, DEFAULT_ERROR_MESSAGE);
        assert_eq!(result.status_code, 200);
    }

    #[test]
    fn test_shape_mismatch_is_failure() {
        #[derive(Debug, Deserialize)]
        struct Project {
            #[allow(dead_code)]
            id: u32,
        }
        let result: ApiResult<Project> = normalize(ok(200, json!({"data": {"name": "no id"}})), None);
        assert!(!result.success);
        assert!(result.data.is_none());
        assert_eq!(result.status_code, 200);
    }

    #[test]
    fn test_data_is_none_whenever_failure() {
        let outcomes = vec![
            ok(200, json!({"data": 1})),
            ok(404, json!({"data": 1, "message": "missing"})),
            ok(500, json!({})),
            Ok(TransportResponse::new(503, None)),
            Err(TransportError::new(TransportErrorKind::Timeout, "timeout")),
        ];
        for outcome in outcomes {
            let result: ApiResult<Value> = normalize(outcome, None);
            assert_eq!(result.success, result.data.is_some());
        }
    }
}
