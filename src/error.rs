use thiserror::Error;

use crate::api::InvocationResponse;

/// Why a Pocket fetch produced no bookmarks.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Pocket answered with a non-success status.
    #[error("pocket responded {status} {reason}")]
    Upstream { status: u16, reason: String },
    /// No response was obtained at all.
    #[error("{0}")]
    Transport(String),
    /// A success response whose body is not a bookmark list.
    #[error("{0}")]
    Malformed(String),
}

impl From<FetchError> for InvocationResponse {
    fn from(error: FetchError) -> Self {
        match error {
            FetchError::Upstream { status, reason } => {
                InvocationResponse::upstream_error(status, &reason)
            }
            FetchError::Transport(message) | FetchError::Malformed(message) => {
                InvocationResponse::internal_error(message)
            }
        }
    }
}
