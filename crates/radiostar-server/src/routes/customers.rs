use axum::Router;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::get;
use serde_json::json;

use radiostar_core::envelope::Envelope;
use radiostar_core::format;
use radiostar_core::model::{CustomerSort, Page};

use super::{ApiResult, BadRequest, respond, sort_segment};
use crate::AppState;

const NO_CUSTOMERS_MSG: &str = "No results found. There are no customers on this page.";
const NO_CUSTOMER_MSG: &str =
    "No results found. You must query this endpoint with a valid customer id.";

pub fn router() -> Router<AppState> {
    // Same naming constraint as the movie router: the lone trailing segment
    // is a page number.
    Router::new()
        .route("/customers/all", get(all))
        .route("/customers/all/{sort}", get(all_paged))
        .route("/customers/all/{sort}/{page}", get(all_sorted))
        .route("/customers/{id}", get(show))
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
    let sort: CustomerSort = sort_segment(&sort)?.parse().map_err(|_| BadRequest)?;
    Ok(list(state, Some(sort), Page::from_param(Some(&page))).await)
}

async fn list(state: AppState, sort: Option<CustomerSort>, page: Page) -> Response {
    let base = match sort {
        Some(sort) => format!("{}/customers/all/sort_by={}", state.base_url, sort.key()),
        None => format!("{}/customers/all", state.base_url),
    };
    match state.db.list_customers(sort, page).await {
        Ok((rows, total)) if rows.is_empty() => {
            respond(Envelope::no_results(&base, NO_CUSTOMERS_MSG).paginate(page, total))
        }
        Ok((rows, total)) => {
            // registered_at becomes human-readable only on the date-sorted listing
            let convert_dates = sort == Some(CustomerSort::RegisteredAt);
            let customers = format::format_customers(rows, convert_dates);
            respond(
                Envelope::results(&base, serde_json::to_value(customers).unwrap())
                    .paginate(page, total),
            )
        }
        Err(e) => {
            tracing::error!("customer listing failed: {e}");
            respond(Envelope::store_error(&base, e))
        }
    }
}

async fn show(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let id: i64 = id.parse().map_err(|_| BadRequest)?;
    let base = format!("{}/customers/{id}", state.base_url);
    Ok(match state.db.get_customer(id).await {
        Ok(Some(customer)) => respond(Envelope::results(
            &base,
            json!({ "status": 200, "customerInfo": customer }),
        )),
        Ok(None) => respond(Envelope::no_results(&base, NO_CUSTOMER_MSG)),
        Err(e) => {
            tracing::error!("customer lookup failed: {e}");
            respond(Envelope::store_error(&base, e))
        }
    })
}
