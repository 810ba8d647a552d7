use axum::{
    Router,
    routing::{any, get, post},
};

use crate::handler::{self, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::healthcheck))
        .route("/newsletter", any(handler::newsletter))
        .route("/invoke", post(handler::invoke))
}
