//! Health endpoint.
//!
//! `GET /_/health` answers 200 "OK" while the instance is Ready and the
//! readiness marker exists, 500 otherwise. Other methods get 405.

use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::http::server::AppState;

pub const HEALTH_PATH: &str = "/_/health";

pub async fn health_handler(State(state): State<AppState>, method: Method) -> Response {
    if method != Method::GET {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    if state.readiness.is_healthy() {
        (StatusCode::OK, "OK").into_response()
    } else {
        tracing::debug!(state = ?state.readiness.state(), "Health check failed");
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}
