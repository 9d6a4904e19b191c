//! The `{data, meta}` response envelope every endpoint returns.
//!
//! `meta.status` mirrors the HTTP status. `meta.yourQuery` is the canonical
//! URL for the request and picks up a `/{page}` suffix only past page 1.
//! Page links are computed from the real row count, so `nextPage` never
//! points past the end of the result set.

use serde::Serialize;
use serde_json::{Value, json};

use crate::model::{PAGE_SIZE, Page};

#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub data: Value,
    pub meta: Meta,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Meta {
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "yourQuery")]
    pub your_query: String,
    #[serde(rename = "nextPage", skip_serializing_if = "Option::is_none")]
    pub next_page: Option<String>,
    #[serde(rename = "prevPage", skip_serializing_if = "Option::is_none")]
    pub prev_page: Option<String>,
    #[serde(rename = "movieInfo", skip_serializing_if = "Option::is_none")]
    pub movie_info: Option<String>,
    #[serde(rename = "rentalInfo", skip_serializing_if = "Option::is_none")]
    pub rental_info: Option<String>,
    #[serde(
        rename = "customersHoldingCopies",
        skip_serializing_if = "Option::is_none"
    )]
    pub customers_holding_copies: Option<String>,
    #[serde(rename = "moreRentalInfo", skip_serializing_if = "Option::is_none")]
    pub more_rental_info: Option<String>,
}

impl Envelope {
    /// 200: `data` carries the formatted rows.
    pub fn results(base_url: impl Into<String>, data: Value) -> Self {
        Envelope {
            data,
            meta: Meta {
                status: 200,
                your_query: base_url.into(),
                ..Meta::default()
            },
        }
    }

    /// 303: nothing matched. The message lands in both `data` and `meta`.
    pub fn no_results(base_url: impl Into<String>, message: &str) -> Self {
        Envelope {
            data: json!({ "status": 303, "message": message }),
            meta: Meta {
                status: 303,
                message: Some(message.to_string()),
                your_query: base_url.into(),
                ..Meta::default()
            },
        }
    }

    /// 500: the query executor failed. Only the error description goes out,
    /// and pagination metadata is never attached to this shape.
    pub fn store_error(base_url: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Envelope {
            data: json!({ "status": 500, "message": error.to_string() }),
            meta: Meta {
                status: 500,
                your_query: base_url.into(),
                ..Meta::default()
            },
        }
    }

    /// Attaches page metadata. `nextPage` appears only when `total_count`
    /// says there really is a next page, `prevPage` from page 2 on, and
    /// both only on the 200 shape. Links are built from the unsuffixed base
    /// URL before `yourQuery` picks up its own page suffix; the suffix also
    /// applies to the empty-page 303 shape so clients always see what they
    /// asked for. No-op on the 500 shape.
    pub fn paginate(mut self, page: Page, total_count: i64) -> Self {
        if self.meta.status == 500 {
            return self;
        }
        let base = self.meta.your_query.clone();
        if self.meta.status == 200 {
            if total_count > page.number() * PAGE_SIZE {
                self.meta.next_page = Some(format!("{}/{}", base, page.number() + 1));
            }
            if page.number() >= 2 {
                self.meta.prev_page = Some(format!("{}/{}", base, page.number() - 1));
            }
        }
        if page.number() != 1 {
            self.meta.your_query = format!("{}/{}", base, page.number());
        }
        self
    }

    pub fn movie_info(mut self, url: impl Into<String>) -> Self {
        self.meta.movie_info = Some(url.into());
        self
    }

    pub fn rental_info(mut self, url: impl Into<String>) -> Self {
        self.meta.rental_info = Some(url.into());
        self
    }

    pub fn customers_holding_copies(mut self, url: impl Into<String>) -> Self {
        self.meta.customers_holding_copies = Some(url.into());
        self
    }

    pub fn more_rental_info(mut self, url: impl Into<String>) -> Self {
        self.meta.more_rental_info = Some(url.into());
        self
    }

    pub fn status(&self) -> u16 {
        self.meta.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://localhost:3000/movies/all";

    #[test]
    fn test_results_envelope() {
        let env = Envelope::results(BASE, json!([{ "title": "Alien" }]));
        assert_eq!(env.status(), 200);
        assert_eq!(env.meta.your_query, BASE);
        assert!(env.meta.message.is_none());
    }

    #[test]
    fn test_no_results_envelope() {
        let env = Envelope::no_results(BASE, "No results found.");
        assert_eq!(env.status(), 303);
        assert_eq!(env.data["message"], "No results found.");
        assert_eq!(env.meta.message.as_deref(), Some("No results found."));
        assert!(env.meta.next_page.is_none());
        assert!(env.meta.prev_page.is_none());
    }

    #[test]
    fn test_store_error_envelope() {
        let env = Envelope::store_error(BASE, "database is locked");
        assert_eq!(env.status(), 500);
        assert_eq!(env.data["message"], "database is locked");
        assert_eq!(env.meta.your_query, BASE);
    }

    #[test]
    fn test_first_page_links() {
        // 15 rows, page 1 of 2: next but no prev, no page suffix.
        let env = Envelope::results(BASE, json!([])).paginate(Page::new(1), 15);
        assert_eq!(env.meta.next_page.as_deref(), Some(&format!("{BASE}/2")[..]));
        assert!(env.meta.prev_page.is_none());
        assert_eq!(env.meta.your_query, BASE);
    }

    #[test]
    fn test_last_page_links() {
        let env = Envelope::results(BASE, json!([])).paginate(Page::new(2), 15);
        assert!(env.meta.next_page.is_none());
        assert_eq!(env.meta.prev_page.as_deref(), Some(&format!("{BASE}/1")[..]));
        assert_eq!(env.meta.your_query, format!("{BASE}/2"));
    }

    #[test]
    fn test_exact_fit_has_no_next_page() {
        let env = Envelope::results(BASE, json!([])).paginate(Page::new(1), 10);
        assert!(env.meta.next_page.is_none());
    }

    #[test]
    fn test_empty_page_gets_suffix_but_no_links() {
        let env = Envelope::no_results(BASE, "nope").paginate(Page::new(2), 100);
        assert!(env.meta.next_page.is_none());
        assert!(env.meta.prev_page.is_none());
        assert_eq!(env.meta.your_query, format!("{BASE}/2"));
    }

    #[test]
    fn test_huge_page_number_paginates_without_overflow() {
        let page = Page::new(i64::MAX);
        let env = Envelope::results(BASE, json!([])).paginate(page, 15);
        assert!(env.meta.next_page.is_none());
        assert_eq!(
            env.meta.prev_page.as_deref(),
            Some(&format!("{BASE}/{}", page.number() - 1)[..])
        );
        assert_eq!(env.meta.your_query, format!("{BASE}/{}", page.number()));
    }

    #[test]
    fn test_store_error_never_gets_page_metadata() {
        let env = Envelope::store_error(BASE, "boom").paginate(Page::new(2), 100);
        assert!(env.meta.next_page.is_none());
        assert!(env.meta.prev_page.is_none());
        assert_eq!(env.meta.your_query, BASE);
    }

    #[test]
    fn test_serialized_meta_uses_camel_case_and_drops_absent_links() {
        let env = Envelope::results(BASE, json!([])).paginate(Page::new(1), 15);
        let value = serde_json::to_value(&env).unwrap();
        let meta = value["meta"].as_object().unwrap();
        assert!(meta.contains_key("yourQuery"));
        assert!(meta.contains_key("nextPage"));
        assert!(!meta.contains_key("prevPage"));
        assert!(!meta.contains_key("message"));
        assert!(!meta.contains_key("movieInfo"));
    }
}
