use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Rows per page for every list endpoint. We like ten.
pub const PAGE_SIZE: i64 = 10;

/// Largest representable page: offsets and page-link arithmetic must stay
/// within i64.
const MAX_PAGE: i64 = i64::MAX / PAGE_SIZE;

/// A 1-indexed page number. Anything absent, non-numeric, or below 1
/// collapses to page 1; anything past [`MAX_PAGE`] clamps to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page(i64);

impl Page {
    pub fn new(number: i64) -> Self {
        Page(number.clamp(1, MAX_PAGE))
    }

    /// Parses an optional trailing path segment into a page.
    pub fn from_param(param: Option<&str>) -> Self {
        match param.and_then(|p| p.trim().parse::<i64>().ok()) {
            Some(n) if n >= 1 => Page::new(n),
            _ => Page(1),
        }
    }

    pub fn number(&self) -> i64 {
        self.0
    }

    pub fn limit(&self) -> i64 {
        PAGE_SIZE
    }

    pub fn offset(&self) -> i64 {
        (self.0 - 1) * PAGE_SIZE
    }
}

/// A sort key that is not on the endpoint's allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSortKey(pub String);

impl fmt::Display for UnknownSortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized sort key: {}", self.0)
    }
}

impl std::error::Error for UnknownSortKey {}

/// Sort allow-list for `/movies/all/sort_by=...`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovieSort {
    Title,
    ReleaseDate,
}

impl MovieSort {
    /// The key as it appears in the URL.
    pub fn key(self) -> &'static str {
        match self {
            MovieSort::Title => "title",
            MovieSort::ReleaseDate => "release_date",
        }
    }

    /// The ORDER BY column for the pre-defined query template.
    pub fn column(self) -> &'static str {
        match self {
            MovieSort::Title => "title",
            MovieSort::ReleaseDate => "release_date",
        }
    }
}

impl FromStr for MovieSort {
    type Err = UnknownSortKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(MovieSort::Title),
            "release_date" => Ok(MovieSort::ReleaseDate),
            other => Err(UnknownSortKey(other.to_string())),
        }
    }
}

/// Sort allow-list for `/customers/all/sort_by=...`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerSort {
    RegisteredAt,
    Name,
    PostalCode,
}

impl CustomerSort {
    pub fn key(self) -> &'static str {
        match self {
            CustomerSort::RegisteredAt => "registered_at",
            CustomerSort::Name => "name",
            CustomerSort::PostalCode => "postal_code",
        }
    }

    pub fn column(self) -> &'static str {
        self.key()
    }
}

impl FromStr for CustomerSort {
    type Err = UnknownSortKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registered_at" => Ok(CustomerSort::RegisteredAt),
            "name" => Ok(CustomerSort::Name),
            "postal_code" => Ok(CustomerSort::PostalCode),
            other => Err(UnknownSortKey(other.to_string())),
        }
    }
}

/// Sort allow-list for `/movies/{title}/rented/sort_by=...`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RentalSort {
    CustomerId,
    CustomerName,
    CheckOutDate,
}

impl RentalSort {
    pub fn key(self) -> &'static str {
        match self {
            RentalSort::CustomerId => "customer_id",
            RentalSort::CustomerName => "customer_name",
            RentalSort::CheckOutDate => "check_out_date",
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            RentalSort::CustomerId => "rentals.customer_id",
            RentalSort::CustomerName => "customers.name",
            RentalSort::CheckOutDate => "rentals.check_out_date",
        }
    }
}

impl FromStr for RentalSort {
    type Err = UnknownSortKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer_id" => Ok(RentalSort::CustomerId),
            "customer_name" => Ok(RentalSort::CustomerName),
            "check_out_date" => Ok(RentalSort::CheckOutDate),
            other => Err(UnknownSortKey(other.to_string())),
        }
    }
}

/// A movie row. `title` is the primary key; `release_date` is epoch
/// milliseconds until a formatter renders it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    pub title: String,
    pub overview: String,
    pub release_date: i64,
    pub inventory: i64,
}

/// A customer row. `account_credit` is integer cents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub registered_at: i64,
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub phone: String,
    pub account_credit: i64,
}

/// A rentals-joined-to-customers row, as returned by the renting/rented
/// and overdue queries. `movie_title` is only selected by the overdue
/// query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenterRow {
    pub id: i64,
    pub name: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub check_out_date: i64,
    pub movie_title: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_defaults_to_one() {
        assert_eq!(Page::from_param(None).number(), 1);
        assert_eq!(Page::from_param(Some("abc")).number(), 1);
        assert_eq!(Page::from_param(Some("")).number(), 1);
        assert_eq!(Page::from_param(Some("0")).number(), 1);
        assert_eq!(Page::from_param(Some("-3")).number(), 1);
    }

    #[test]
    fn test_page_offset() {
        let page = Page::from_param(Some("4"));
        assert_eq!(page.number(), 4);
        assert_eq!(page.offset(), 30);
        assert_eq!(page.limit(), PAGE_SIZE);
        assert_eq!(Page::new(1).offset(), 0);
    }

    #[test]
    fn test_huge_page_number_clamps_instead_of_overflowing() {
        let page = Page::from_param(Some("9223372036854775807"));
        assert_eq!(page.number(), MAX_PAGE);
        // offset and the next-page number both stay in range
        assert_eq!(page.offset(), (MAX_PAGE - 1) * PAGE_SIZE);
        assert!(page.number().checked_add(1).is_some());
        assert_eq!(Page::new(i64::MAX).number(), MAX_PAGE);
    }

    #[test]
    fn test_movie_sort_allow_list() {
        assert_eq!("title".parse::<MovieSort>().unwrap(), MovieSort::Title);
        assert_eq!(
            "release_date".parse::<MovieSort>().unwrap(),
            MovieSort::ReleaseDate
        );
        assert!("overview".parse::<MovieSort>().is_err());
        assert!("title; DROP TABLE movies".parse::<MovieSort>().is_err());
    }

    #[test]
    fn test_customer_sort_allow_list() {
        for key in ["registered_at", "name", "postal_code"] {
            assert_eq!(key.parse::<CustomerSort>().unwrap().key(), key);
        }
        assert!("account_credit".parse::<CustomerSort>().is_err());
    }

    #[test]
    fn test_rental_sort_columns() {
        let sort = "customer_name".parse::<RentalSort>().unwrap();
        assert_eq!(sort.column(), "customers.name");
        assert_eq!(sort.key(), "customer_name");
        assert!("".parse::<RentalSort>().is_err());
    }
}
