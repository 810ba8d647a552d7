use reqwest::Client;
use serde::Serialize;
use std::future::Future;

use crate::error::FetchError;
use crate::model::{Credentials, PocketList, RawBookmark};
use crate::unpack_error;

pub const DEFAULT_ENDPOINT: &str = "https://getpocket.com/v3/get";

const TAG_FILTER: &str = "newsletter";
const STATE_FILTER: &str = "all";
const DETAIL_TYPE: &str = "complete";

/// Somewhere bookmarks can be fetched from with a caller's credentials.
pub trait BookmarkSource {
    fn fetch(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<Vec<RawBookmark>, FetchError>> + Send;
}

#[derive(Serialize)]
struct RetrieveRequest<'a> {
    consumer_key: &'a str,
    access_token: &'a str,
    tag: &'static str,
    state: &'static str,
    #[serde(rename = "detailType")]
    detail_type: &'static str,
}

impl<'a> RetrieveRequest<'a> {
    fn new(credentials: &'a Credentials) -> Self {
        RetrieveRequest {
            consumer_key: &credentials.consumer_key,
            access_token: &credentials.access_token,
            tag: TAG_FILTER,
            state: STATE_FILTER,
            detail_type: DETAIL_TYPE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PocketClient {
    http: Client,
    endpoint: String,
}

impl PocketClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        PocketClient {
            http: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl BookmarkSource for PocketClient {
    async fn fetch(&self, credentials: &Credentials) -> Result<Vec<RawBookmark>, FetchError> {
        let res = self
            .http
            .post(&self.endpoint)
            .header("X-Accept", "application/json")
            .json(&RetrieveRequest::new(credentials))
            .send()
            .await
            .map_err(|e| FetchError::Transport(unpack_error(&e)))?;

        let status = res.status();
        if !status.is_success() {
            let diagnostic = res.headers().get("X-Error").and_then(|v| v.to_str().ok());
            tracing::warn!(
                status = status.as_u16(),
                x_error = diagnostic.unwrap_or(""),
                "pocket rejected retrieve request"
            );
            return Err(FetchError::Upstream {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_owned(),
            });
        }

        let body: PocketList = res
            .json()
            .await
            .map_err(|e| FetchError::Malformed(unpack_error(&e)))?;

        Ok(body.list.into_values())
    }
}
