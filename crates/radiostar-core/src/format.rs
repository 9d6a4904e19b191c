//! Row formatters: epoch-millisecond timestamps become human-readable
//! strings, movie rows pick up an availability flag, and joined renter rows
//! pick up a link back to the relevant detail endpoint.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::model::{Customer, Movie, RenterRow};

/// Date-then-time with a single space between them, in the style of
/// JavaScript's `toDateString()` / `toTimeString()` pair,
/// e.g. `"Thu Jan 01 1970 00:00:00"`. Sub-second precision is dropped.
const DATE_FORMAT: &str = "%a %b %d %Y";
const TIME_FORMAT: &str = "%H:%M:%S";

pub fn millis_to_date_string(ms: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(ms) {
        Some(dt) => format!("{} {}", dt.format(DATE_FORMAT), dt.format(TIME_FORMAT)),
        // out-of-range timestamp, leave the raw number visible
        None => ms.to_string(),
    }
}

/// Inverse of [`millis_to_date_string`], exact to the second.
pub fn parse_date_string(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, &format!("{DATE_FORMAT} {TIME_FORMAT}"))
        .ok()
        .map(|naive| naive.and_utc())
}

/// A movie row ready for serialization, `release_date` rendered.
#[derive(Debug, Clone, Serialize)]
pub struct FormattedMovie {
    pub title: String,
    pub overview: String,
    pub release_date: String,
    pub inventory: i64,
}

pub fn format_movie(movie: Movie) -> FormattedMovie {
    FormattedMovie {
        release_date: millis_to_date_string(movie.release_date),
        title: movie.title,
        overview: movie.overview,
        inventory: movie.inventory,
    }
}

pub fn format_movies(movies: Vec<Movie>) -> Vec<FormattedMovie> {
    movies.into_iter().map(format_movie).collect()
}

/// Movie detail plus the derived rentability flag.
#[derive(Debug, Clone, Serialize)]
pub struct MovieDetail {
    #[serde(rename = "movieInfo")]
    pub movie_info: FormattedMovie,
    #[serde(rename = "availableToRent")]
    pub available_to_rent: bool,
}

pub fn is_available(inventory: i64, open_rentals: i64) -> bool {
    inventory > open_rentals
}

pub fn format_movie_detail(movie: Movie, open_rentals: i64) -> MovieDetail {
    let available = is_available(movie.inventory, open_rentals);
    MovieDetail {
        movie_info: format_movie(movie),
        available_to_rent: available,
    }
}

/// A customer row ready for serialization. `registered_at` stays raw
/// milliseconds except on the registered_at-sorted listing, where it is
/// rendered like every other date.
#[derive(Debug, Clone, Serialize)]
pub struct FormattedCustomer {
    pub id: i64,
    pub name: String,
    pub registered_at: Value,
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub phone: String,
    pub account_credit: i64,
}

pub fn format_customers(
    customers: Vec<Customer>,
    convert_registered_at: bool,
) -> Vec<FormattedCustomer> {
    customers
        .into_iter()
        .map(|c| FormattedCustomer {
            id: c.id,
            name: c.name,
            registered_at: if convert_registered_at {
                Value::from(millis_to_date_string(c.registered_at))
            } else {
                Value::from(c.registered_at)
            },
            address: c.address,
            city: c.city,
            state: c.state,
            postal_code: c.postal_code,
            phone: c.phone,
            account_credit: c.account_credit,
        })
        .collect()
}

/// Which detail endpoint each renter record should link back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenterLinks {
    /// `customerInfo` → `/customers/{id}`
    CustomerDetail,
    /// `moreRentalInfo` → `/rentals/{title}`
    RentalDetail,
}

/// A joined renter record, `check_out_date` rendered and a related-resource
/// link attached.
#[derive(Debug, Clone, Serialize)]
pub struct RenterInfo {
    pub id: i64,
    pub name: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub check_out_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movie_title: Option<String>,
    #[serde(rename = "customerInfo", skip_serializing_if = "Option::is_none")]
    pub customer_info: Option<String>,
    #[serde(rename = "moreRentalInfo", skip_serializing_if = "Option::is_none")]
    pub more_rental_info: Option<String>,
}

pub fn format_renters(rows: Vec<RenterRow>, base_url: &str, links: RenterLinks) -> Vec<RenterInfo> {
    rows.into_iter()
        .map(|row| {
            let customer_info = match links {
                RenterLinks::CustomerDetail => Some(format!("{base_url}/customers/{}", row.id)),
                RenterLinks::RentalDetail => None,
            };
            let more_rental_info = match links {
                RenterLinks::RentalDetail => row
                    .movie_title
                    .as_deref()
                    .map(|title| format!("{base_url}/rentals/{title}")),
                RenterLinks::CustomerDetail => None,
            };
            RenterInfo {
                id: row.id,
                name: row.name,
                city: row.city,
                state: row.state,
                postal_code: row.postal_code,
                check_out_date: millis_to_date_string(row.check_out_date),
                movie_title: row.movie_title,
                customer_info,
                more_rental_info,
            }
        })
        .collect()
}
