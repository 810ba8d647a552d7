use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, header},
    response::{IntoResponse, Response},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use tracing::info;

use crate::api::{Health, InvocationEvent, InvocationResponse};
use crate::model::flatten_all;
use crate::pocket::{BookmarkSource, PocketClient};
use crate::request::decode_credentials;

#[derive(Clone)]
pub struct AppState {
    pub pocket: Arc<PocketClient>,
}

impl AppState {
    pub fn new(pocket: PocketClient) -> Self {
        AppState {
            pocket: Arc::new(pocket),
        }
    }
}

/// Runs one invocation: decode credentials, fetch the tagged bookmarks and
/// answer with them flattened into a JSON array.
pub async fn handle<S: BookmarkSource>(event: &InvocationEvent, source: &S) -> InvocationResponse {
    let credentials = match decode_credentials(event) {
        Ok(credentials) => credentials,
        Err(rejection) => {
            info!(reason = %rejection, "rejected invocation");
            return rejection.into();
        }
    };

    let entries = match source.fetch(&credentials).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!(error = %e, "failed to fetch bookmarks");
            return e.into();
        }
    };

    let bookmarks = flatten_all(entries);
    match serde_json::to_string(&bookmarks) {
        Ok(body) => {
            info!(count = bookmarks.len(), "fetched newsletter bookmarks");
            InvocationResponse::ok_json(body)
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize bookmarks");
            InvocationResponse::internal_error(e.to_string())
        }
    }
}

pub async fn healthcheck() -> impl IntoResponse {
    info!("got healthcheck request");
    Json(Health { status: "ok" })
}

pub async fn newsletter(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let event = event_from_http(&method, &headers, &body);
    handle(&event, state.pocket.as_ref()).await.into_response()
}

pub async fn invoke(
    State(state): State<AppState>,
    Json(event): Json<InvocationEvent>,
) -> Json<InvocationResponse> {
    Json(handle(&event, state.pocket.as_ref()).await)
}

/// Builds the event a function host would hand over for a plain HTTP request.
/// Form posts and non-UTF-8 bodies arrive base64-encoded.
pub fn event_from_http(method: &Method, headers: &HeaderMap, body: &[u8]) -> InvocationEvent {
    let is_form = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| {
            ct.to_ascii_lowercase()
                .starts_with("application/x-www-form-urlencoded")
        });

    let (body, is_base64_encoded) = if body.is_empty() {
        (None, false)
    } else {
        match std::str::from_utf8(body) {
            Ok(text) if !is_form => (Some(text.to_owned()), false),
            _ => (Some(STANDARD.encode(body)), true),
        }
    };

    InvocationEvent {
        http_method: method.as_str().to_owned(),
        body,
        is_base64_encoded,
    }
}
