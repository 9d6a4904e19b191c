use axum::Router;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::get;
use serde_json::json;

use radiostar_core::envelope::Envelope;
use radiostar_core::format::{self, RenterLinks};
use radiostar_core::model::Page;

use super::respond;
use crate::AppState;

const EXACT_TITLE_MSG: &str =
    "No results found. You must query this endpoint with an exact title.";
const NO_COPIES_OUT_MSG: &str = "No results found. You must query this endpoint with an exact \
     title. If you are using an exact title, no customers have a copy checked out.";
const NO_OVERDUE_MSG: &str = "No results found. No customers currently have an overdue copy.";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rentals/overdue", get(overdue))
        .route("/rentals/overdue/{page}", get(overdue_paged))
        .route("/rentals/{title}", get(movie_info))
        .route("/rentals/{title}/customers", get(customers))
}

async fn movie_info(State(state): State<AppState>, Path(title): Path<String>) -> Response {
    let base = format!("{}/rentals/{title}", state.base_url);
    let movie_url = format!("{}/movies/{title}", state.base_url);

    let movie = match state.db.get_movie(&title).await {
        Ok(Some(movie)) => movie,
        Ok(None) => {
            return respond(Envelope::no_results(&base, EXACT_TITLE_MSG).movie_info(movie_url));
        }
        Err(e) => {
            tracing::error!("rental movie lookup failed: {e}");
            return respond(Envelope::store_error(&base, e).movie_info(movie_url));
        }
    };
    match state.db.open_rental_count(&title).await {
        Ok(open_rentals) => {
            let detail = format::format_movie_detail(movie, open_rentals);
            respond(
                Envelope::results(&base, json!(detail))
                    .movie_info(movie_url)
                    .customers_holding_copies(format!(
                        "{}/rentals/{title}/customers",
                        state.base_url
                    )),
            )
        }
        Err(e) => {
            tracing::error!("open rental count failed: {e}");
            respond(Envelope::store_error(&base, e).movie_info(movie_url))
        }
    }
}

async fn customers(State(state): State<AppState>, Path(title): Path<String>) -> Response {
    let base = format!("{}/rentals/{title}/customers", state.base_url);
    let movie_url = format!("{}/movies/{title}", state.base_url);
    match state.db.customers_renting(&title).await {
        Ok(rows) if rows.is_empty() => {
            respond(Envelope::no_results(&base, NO_COPIES_OUT_MSG).movie_info(movie_url))
        }
        Ok(rows) => {
            let customers = format::format_renters(rows, &state.base_url, RenterLinks::CustomerDetail);
            respond(
                Envelope::results(&base, json!({ "customers": customers }))
                    .movie_info(movie_url)
                    .more_rental_info(format!("{}/rentals/{title}", state.base_url)),
            )
        }
        Err(e) => {
            tracing::error!("renting customer lookup failed: {e}");
            respond(Envelope::store_error(&base, e).movie_info(movie_url))
        }
    }
}

async fn overdue(State(state): State<AppState>) -> Response {
    overdue_list(state, Page::from_param(None)).await
}

async fn overdue_paged(State(state): State<AppState>, Path(page): Path<String>) -> Response {
    overdue_list(state, Page::from_param(Some(&page))).await
}

async fn overdue_list(state: AppState, page: Page) -> Response {
    let base = format!("{}/rentals/overdue", state.base_url);
    let now_ms = chrono::Utc::now().timestamp_millis();
    match state.db.overdue_renters(now_ms, page).await {
        Ok((rows, total)) if rows.is_empty() => {
            respond(Envelope::no_results(&base, NO_OVERDUE_MSG).paginate(page, total))
        }
        Ok((rows, total)) => {
            let customers = format::format_renters(rows, &state.base_url, RenterLinks::RentalDetail);
            respond(
                Envelope::results(&base, json!({ "customers": customers })).paginate(page, total),
            )
        }
        Err(e) => {
            tracing::error!("overdue lookup failed: {e}");
            respond(Envelope::store_error(&base, e))
        }
    }
}
