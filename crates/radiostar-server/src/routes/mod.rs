pub mod customers;
pub mod movies;
pub mod rentals;
pub mod zomg;

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use radiostar_core::envelope::Envelope;

use crate::AppState;

/// The full route table. `main` adds CORS on top; the test suite drives
/// this router directly.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(movies::router())
        .merge(customers::router())
        .merge(rentals::router())
        .merge(zomg::router())
        .with_state(state)
}

pub const MALFORMED_MSG: &str = "Request malformed or sort method not recognized.";

/// 400 shape for unrecognized sort keys and malformed ids, rejected before
/// any query runs.
pub struct BadRequest;

impl IntoResponse for BadRequest {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "message": MALFORMED_MSG })),
        )
            .into_response()
    }
}

pub type ApiResult = Result<Response, BadRequest>;

/// Serializes an envelope with its own status code on the wire.
pub fn respond(envelope: Envelope) -> Response {
    let status = StatusCode::from_u16(envelope.status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(envelope)).into_response()
}

/// Strips the literal `sort_by=` prefix off a path segment. The sort key
/// itself is validated against the endpoint's allow-list by the caller.
pub fn sort_segment(segment: &str) -> Result<&str, BadRequest> {
    segment.strip_prefix("sort_by=").ok_or(BadRequest)
}
