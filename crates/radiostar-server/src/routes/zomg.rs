use axum::Json;
use axum::Router;
use axum::routing::get;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/zomg", get(it_works))
}

// Smoke-test endpoint, kept from the very first cut of the API.
async fn it_works() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "it_works": "it works!",
        "no_really": "no, really!"
    }))
}
