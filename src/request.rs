//! Extracts Pocket credentials from an incoming invocation.
//!
//! Form bodies are split naively on `&` and `=` without URL-decoding: for a pair
//! `k=a=b` the value is `a`. Callers that need percent-decoded credentials must
//! send JSON.

use base64::{
    Engine as _, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

use crate::api::{InvocationEvent, InvocationResponse};
use crate::model::Credentials;

pub const CONSUMER_KEY_FIELD: &str = "pocket_consumer_key";
pub const ACCESS_TOKEN_FIELD: &str = "pocket_access_token";

const BODY_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("method {0} is not allowed")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(&'static str),
}

impl From<Rejection> for InvocationResponse {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::NotFound(_) => InvocationResponse::not_found(),
            Rejection::BadRequest(_) => InvocationResponse::bad_request(),
        }
    }
}

pub fn decode_credentials(event: &InvocationEvent) -> Result<Credentials, Rejection> {
    if event.http_method != "POST" {
        return Err(Rejection::NotFound(event.http_method.clone()));
    }

    let body = match event.body.as_deref() {
        Some(body) if !body.is_empty() => body,
        _ => return Err(Rejection::BadRequest("body is missing")),
    };

    let (consumer_key, access_token) = if event.is_base64_encoded {
        let bytes = BODY_ENGINE
            .decode(body.trim())
            .map_err(|_| Rejection::BadRequest("body is not valid base64"))?;
        let mut fields = parse_url_encoded(&String::from_utf8_lossy(&bytes));
        (
            fields.remove(CONSUMER_KEY_FIELD).flatten(),
            fields.remove(ACCESS_TOKEN_FIELD).flatten(),
        )
    } else {
        let value: Value = serde_json::from_str(body)
            .map_err(|_| Rejection::BadRequest("body is not valid JSON"))?;
        let object = value
            .as_object()
            .ok_or(Rejection::BadRequest("body is not a JSON object"))?;
        let field = |name: &str| object.get(name).and_then(Value::as_str).map(str::to_owned);
        (field(CONSUMER_KEY_FIELD), field(ACCESS_TOKEN_FIELD))
    };

    match (non_empty(consumer_key), non_empty(access_token)) {
        (Some(consumer_key), Some(access_token)) => Ok(Credentials {
            consumer_key,
            access_token,
        }),
        _ => Err(Rejection::BadRequest("credentials are missing")),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Splits `k=v&k2=v2` into a map. A pair without `=` maps to `None`, later keys
/// overwrite earlier ones, and nothing is percent-decoded.
pub fn parse_url_encoded(input: &str) -> HashMap<String, Option<String>> {
    input
        .split('&')
        .map(|pair| {
            let mut parts = pair.split('=');
            let key = parts.next().unwrap_or_default().to_owned();
            (key, parts.next().map(str::to_owned))
        })
        .collect()
}
