use axum::Router;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::get;
use serde_json::json;

use radiostar_core::envelope::Envelope;
use radiostar_core::format::{self, RenterLinks};
use radiostar_core::model::{MovieSort, Page, RentalSort};

use super::{ApiResult, BadRequest, respond, sort_segment};
use crate::AppState;

const NO_MOVIES_MSG: &str = "No results found. There are no movies on this page.";
const EXACT_TITLE_MSG: &str =
    "No results found. You must query this endpoint with an exact title.";
const NO_COPIES_OUT_MSG: &str = "No results found. You must query this endpoint with an exact \
     title. If you are using an exact title, no customers have a copy checked out.";
const NO_PAST_RENTERS_MSG: &str = "No results found. You must query this endpoint with an exact \
     title. If you are using an exact title, no customers have rented a copy.";

pub fn router() -> Router<AppState> {
    // The router wants a single parameter name per position, so the lone
    // trailing segment borrows the sorted route's name; it holds a page
    // number.
    Router::new()
        .route("/movies/all", get(all))
        .route("/movies/all/{sort}", get(all_paged))
        .route("/movies/all/{sort}/{page}", get(all_sorted))
        .route("/movies/{title}", get(detail))
        .route("/movies/{title}/renting", get(renting))
        .route("/movies/{title}/rented/{sort}", get(rented))
        .route("/movies/{title}/rented/{sort}/{page}", get(rented_paged))
}

async fn all(State(state): State<AppState>) -> Response {
    list(state, None, Page::from_param(None)).await
}

async fn all_paged(State(state): State<AppState>, Path(page): Path<String>) -> Response {
    list(state, None, Page::from_param(Some(&page))).await
}

async fn all_sorted(
    State(state): State<AppState>,
    Path((sort, page)): Path<(String, String)>,
) -> ApiResult {
    let sort: MovieSort = sort_segment(&sort)?.parse().map_err(|_| BadRequest)?;
    Ok(list(state, Some(sort), Page::from_param(Some(&page))).await)
}

async fn list(state: AppState, sort: Option<MovieSort>, page: Page) -> Response {
    let base = match sort {
        Some(sort) => format!("{}/movies/all/sort_by={}", state.base_url, sort.key()),
        None => format!("{}/movies/all", state.base_url),
    };
    match state.db.list_movies(sort, page).await {
        Ok((rows, total)) if rows.is_empty() => {
            respond(Envelope::no_results(&base, NO_MOVIES_MSG).paginate(page, total))
        }
        Ok((rows, total)) => {
            let movies = format::format_movies(rows);
            respond(
                Envelope::results(&base, serde_json::to_value(movies).unwrap())
                    .paginate(page, total),
            )
        }
        Err(e) => {
            tracing::error!("movie listing failed: {e}");
            respond(Envelope::store_error(&base, e))
        }
    }
}

async fn detail(State(state): State<AppState>, Path(title): Path<String>) -> Response {
    let base = format!("{}/movies/{title}", state.base_url);
    match state.db.get_movie(&title).await {
        Ok(Some(movie)) => {
            let movie = format::format_movie(movie);
            respond(
                Envelope::results(&base, json!({ "status": 200, "movieInfo": movie }))
                    .rental_info(format!("{}/rentals/{title}", state.base_url))
                    .customers_holding_copies(format!(
                        "{}/rentals/{title}/customers",
                        state.base_url
                    )),
            )
        }
        Ok(None) => respond(Envelope::no_results(&base, EXACT_TITLE_MSG)),
        Err(e) => {
            tracing::error!("movie lookup failed: {e}");
            respond(Envelope::store_error(&base, e))
        }
    }
}

async fn renting(State(state): State<AppState>, Path(title): Path<String>) -> Response {
    let base = format!("{}/movies/{title}/renting", state.base_url);
    match state.db.customers_renting(&title).await {
        Ok(rows) if rows.is_empty() => respond(Envelope::no_results(&base, NO_COPIES_OUT_MSG)),
        Ok(rows) => {
            let customers = format::format_renters(rows, &state.base_url, RenterLinks::CustomerDetail);
            respond(
                Envelope::results(&base, json!({ "customers": customers }))
                    .movie_info(format!("{}/movies/{title}", state.base_url))
                    .more_rental_info(format!("{}/rentals/{title}", state.base_url)),
            )
        }
        Err(e) => {
            tracing::error!("renting lookup failed: {e}");
            respond(Envelope::store_error(&base, e))
        }
    }
}

async fn rented(
    State(state): State<AppState>,
    Path((title, sort)): Path<(String, String)>,
) -> ApiResult {
    past_renters(state, title, &sort, None).await
}

async fn rented_paged(
    State(state): State<AppState>,
    Path((title, sort, page)): Path<(String, String, String)>,
) -> ApiResult {
    past_renters(state, title, &sort, Some(&page)).await
}

async fn past_renters(
    state: AppState,
    title: String,
    sort_segment_text: &str,
    page: Option<&str>,
) -> ApiResult {
    let sort: RentalSort = sort_segment(sort_segment_text)?
        .parse()
        .map_err(|_| BadRequest)?;
    let page = Page::from_param(page);
    let base = format!(
        "{}/movies/{title}/rented/sort_by={}",
        state.base_url,
        sort.key()
    );
    Ok(match state.db.past_renters(&title, sort, page).await {
        Ok((rows, total)) if rows.is_empty() => {
            respond(Envelope::no_results(&base, NO_PAST_RENTERS_MSG).paginate(page, total))
        }
        Ok((rows, total)) => {
            let customers = format::format_renters(rows, &state.base_url, RenterLinks::CustomerDetail);
            respond(
                Envelope::results(&base, json!({ "customers": customers }))
                    .movie_info(format!("{}/movies/{title}", state.base_url))
                    .paginate(page, total),
            )
        }
        Err(e) => {
            tracing::error!("past renter lookup failed: {e}");
            respond(Envelope::store_error(&base, e))
        }
    })
}
