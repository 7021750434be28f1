//! HTTP front door.
//!
//! Exposes `POST /interactions` for the platform's signed webhook calls and
//! `GET /` as a liveness probe. Rejections carry no body; the platform only
//! looks at the status code.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use chime_core::{CoreError, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use tracing::{debug, error, warn};

use crate::state::AppState;

/// Path the platform's interactions endpoint URL must point at.
pub const INTERACTIONS_PATH: &str = "/interactions";

/// Builds the router around the shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health))
        .route(INTERACTIONS_PATH, post(handle_interaction))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn handle_interaction(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = header(&headers, SIGNATURE_HEADER);
    let timestamp = header(&headers, TIMESTAMP_HEADER);

    match state.dispatcher().handle(signature, timestamp, &body).await {
        Ok(Some(response)) => {
            debug!(reply = response.name(), "Answering interaction");
            Json(response).into_response()
        }
        Ok(None) => {
            warn!("Interaction produced no response");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => rejection(&e).into_response(),
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Maps a dispatch failure to its status code and logs it.
fn rejection(err: &CoreError) -> StatusCode {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        error!(status = status.as_u16(), error = %err, "Interaction failed");
    } else {
        warn!(status = status.as_u16(), error = %err, "Interaction rejected");
    }
    status
}
