use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// The request as a function host delivers it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationEvent {
    pub http_method: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    pub status_code: u16,
    pub body: String,
}

impl InvocationResponse {
    pub fn new(status_code: u16, body: impl Into<String>) -> Self {
        InvocationResponse {
            status_code,
            body: body.into(),
        }
    }

    pub fn ok_json(body: String) -> Self {
        Self::new(200, body)
    }

    pub fn not_found() -> Self {
        Self::new(404, "Not Found")
    }

    pub fn bad_request() -> Self {
        Self::new(400, "Bad Request")
    }

    pub fn upstream_error(status: u16, reason: &str) -> Self {
        Self::new(status, format!("Error while connecting to Pocket API: {}", reason))
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(500, message)
    }
}

impl IntoResponse for InvocationResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let content_type = if status == StatusCode::OK {
            "application/json"
        } else {
            "text/plain; charset=utf-8"
        };

        (status, [(header::CONTENT_TYPE, content_type)], self.body).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_deserialize_defaults() {
        let event: InvocationEvent = serde_json::from_str(r#"{"httpMethod":"GET"}"#).unwrap();
        assert_eq!(event.http_method, "GET");
        assert_eq!(event.body, None);
        assert!(!event.is_base64_encoded);

        let event: InvocationEvent = serde_json::from_str(
            r#"{"httpMethod":"POST","body":"cGluZw==","isBase64Encoded":true}"#,
        )
        .unwrap();
        assert_eq!(event.body.as_deref(), Some("cGluZw=="));
        assert!(event.is_base64_encoded);
    }

    #[test]
    fn test_response_serializes_camel_case() {
        let json = serde_json::to_value(InvocationResponse::not_found()).unwrap();
        assert_eq!(json, serde_json::json!({"statusCode": 404, "body": "Not Found"}));
    }

    #[test]
    fn test_upstream_error_body() {
        let resp = InvocationResponse::upstream_error(503, "Service Unavailable");
        assert_eq!(resp.status_code, 503);
        assert_eq!(resp.body, "Error while connecting to Pocket API: Service Unavailable");
    }

    #[test]
    fn test_into_response_status_and_content_type() {
        let resp = InvocationResponse::ok_json("[]".to_owned()).into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/json");

        let resp = InvocationResponse::bad_request().into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/plain; charset=utf-8");

        let resp = InvocationResponse::new(42, "odd").into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
