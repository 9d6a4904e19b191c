//! The query executor. Every statement here is a pre-defined template;
//! dynamic values are bound as parameters and sort columns come from the
//! closed enums in radiostar-core, so no request text ever reaches SQL.

use std::future::Future;
use std::time::Duration;

use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};

use radiostar_core::model::{Customer, CustomerSort, Movie, MovieSort, Page, RentalSort, RenterRow};

/// Upper bound on a single query round-trip.
const QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// A rental counts as overdue 72 hours after check-out.
pub const OVERDUE_AFTER_MS: i64 = 72 * 60 * 60 * 1000;

#[derive(Debug)]
pub enum DbError {
    Sqlx(sqlx::Error),
    Timeout,
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        DbError::Sqlx(e)
    }
}

impl std::fmt::Display for DbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbError::Sqlx(e) => write!(f, "database error: {e}"),
            DbError::Timeout => write!(f, "query timed out"),
        }
    }
}

impl std::error::Error for DbError {}

/// Bounds a query future by [`QUERY_TIMEOUT`].
async fn with_deadline<T, F>(fut: F) -> Result<T, DbError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(QUERY_TIMEOUT, fut).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(DbError::Timeout),
    }
}

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(url: &str) -> Result<Self, DbError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await?;
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    async fn run_migrations(&self) -> Result<(), DbError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS movies (
                title TEXT PRIMARY KEY,
                overview TEXT NOT NULL DEFAULT '',
                release_date INTEGER NOT NULL,
                inventory INTEGER NOT NULL DEFAULT 0
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS customers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                registered_at INTEGER NOT NULL,
                address TEXT NOT NULL DEFAULT '',
                city TEXT NOT NULL DEFAULT '',
                state TEXT NOT NULL DEFAULT '',
                postal_code TEXT NOT NULL DEFAULT '',
                phone TEXT NOT NULL DEFAULT '',
                account_credit INTEGER NOT NULL DEFAULT 0
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS rentals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                movie_title TEXT NOT NULL REFERENCES movies(title),
                customer_id INTEGER NOT NULL REFERENCES customers(id),
                returned INTEGER NOT NULL DEFAULT 0,
                check_out_date INTEGER NOT NULL,
                return_date INTEGER
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // -----------------------------------------------------------------------
    // Movies
    // -----------------------------------------------------------------------

    pub async fn list_movies(
        &self,
        sort: Option<MovieSort>,
        page: Page,
    ) -> Result<(Vec<Movie>, i64), DbError> {
        let statement = match sort {
            Some(sort) => format!(
                "SELECT title, overview, release_date, inventory FROM movies
                 ORDER BY {} LIMIT ? OFFSET ?",
                sort.column()
            ),
            None => "SELECT title, overview, release_date, inventory FROM movies
                     LIMIT ? OFFSET ?"
                .to_string(),
        };
        let rows = with_deadline(
            sqlx::query(&statement)
                .bind(page.limit())
                .bind(page.offset())
                .fetch_all(&self.pool),
        )
        .await?;
        let total = with_deadline(
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM movies").fetch_one(&self.pool),
        )
        .await?;
        Ok((rows.iter().map(row_to_movie).collect(), total))
    }

    pub async fn get_movie(&self, title: &str) -> Result<Option<Movie>, DbError> {
        let row = with_deadline(
            sqlx::query(
                "SELECT title, overview, release_date, inventory FROM movies WHERE title = ?",
            )
            .bind(title)
            .fetch_optional(&self.pool),
        )
        .await?;
        Ok(row.as_ref().map(row_to_movie))
    }

    /// Copies of a title currently checked out.
    pub async fn open_rental_count(&self, title: &str) -> Result<i64, DbError> {
        with_deadline(
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM rentals WHERE movie_title = ? AND returned = 0",
            )
            .bind(title)
            .fetch_one(&self.pool),
        )
        .await
    }

    // -----------------------------------------------------------------------
    // Rentals
    // -----------------------------------------------------------------------

    /// Customers currently holding a copy of the title.
    pub async fn customers_renting(&self, title: &str) -> Result<Vec<RenterRow>, DbError> {
        let rows = with_deadline(
            sqlx::query(
                "SELECT customers.id, customers.name, customers.city, customers.state,
                        customers.postal_code, rentals.check_out_date
                 FROM rentals
                 JOIN customers ON customers.id = rentals.customer_id
                 WHERE rentals.movie_title = ? AND rentals.returned = 0
                 ORDER BY rentals.check_out_date",
            )
            .bind(title)
            .fetch_all(&self.pool),
        )
        .await?;
        Ok(rows.iter().map(row_to_renter).collect())
    }

    /// Customers who rented the title in the past, sorted per the allow-list.
    pub async fn past_renters(
        &self,
        title: &str,
        sort: RentalSort,
        page: Page,
    ) -> Result<(Vec<RenterRow>, i64), DbError> {
        let statement = format!(
            "SELECT customers.id, customers.name, customers.city, customers.state,
                    customers.postal_code, rentals.check_out_date
             FROM rentals
             JOIN customers ON customers.id = rentals.customer_id
             WHERE rentals.movie_title = ? AND rentals.returned = 1
             ORDER BY {} LIMIT ? OFFSET ?",
            sort.column()
        );
        let rows = with_deadline(
            sqlx::query(&statement)
                .bind(title)
                .bind(page.limit())
                .bind(page.offset())
                .fetch_all(&self.pool),
        )
        .await?;
        let total = with_deadline(
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM rentals WHERE movie_title = ? AND returned = 1",
            )
            .bind(title)
            .fetch_one(&self.pool),
        )
        .await?;
        Ok((rows.iter().map(row_to_renter).collect(), total))
    }

    /// Customers holding a copy past the overdue threshold as of `now_ms`.
    pub async fn overdue_renters(
        &self,
        now_ms: i64,
        page: Page,
    ) -> Result<(Vec<RenterRow>, i64), DbError> {
        let rows = with_deadline(
            sqlx::query(
                "SELECT customers.id, customers.name, customers.city, customers.state,
                        customers.postal_code, rentals.check_out_date, rentals.movie_title
                 FROM rentals
                 JOIN customers ON customers.id = rentals.customer_id
                 WHERE rentals.returned = 0 AND rentals.check_out_date + ? < ?
                 ORDER BY rentals.check_out_date
                 LIMIT ? OFFSET ?",
            )
            .bind(OVERDUE_AFTER_MS)
            .bind(now_ms)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool),
        )
        .await?;
        let total = with_deadline(
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM rentals
                 WHERE returned = 0 AND check_out_date + ? < ?",
            )
            .bind(OVERDUE_AFTER_MS)
            .bind(now_ms)
            .fetch_one(&self.pool),
        )
        .await?;
        Ok((rows.iter().map(row_to_renter).collect(), total))
    }

    // -----------------------------------------------------------------------
    // Customers
    // -----------------------------------------------------------------------

    pub async fn list_customers(
        &self,
        sort: Option<CustomerSort>,
        page: Page,
    ) -> Result<(Vec<Customer>, i64), DbError> {
        let statement = match sort {
            Some(sort) => format!(
                "SELECT id, name, registered_at, address, city, state, postal_code,
                        phone, account_credit
                 FROM customers ORDER BY {} LIMIT ? OFFSET ?",
                sort.column()
            ),
            None => "SELECT id, name, registered_at, address, city, state, postal_code,
                            phone, account_credit
                     FROM customers LIMIT ? OFFSET ?"
                .to_string(),
        };
        let rows = with_deadline(
            sqlx::query(&statement)
                .bind(page.limit())
                .bind(page.offset())
                .fetch_all(&self.pool),
        )
        .await?;
        let total = with_deadline(
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customers").fetch_one(&self.pool),
        )
        .await?;
        Ok((rows.iter().map(row_to_customer).collect(), total))
    }

    pub async fn get_customer(&self, id: i64) -> Result<Option<Customer>, DbError> {
        let row = with_deadline(
            sqlx::query(
                "SELECT id, name, registered_at, address, city, state, postal_code,
                        phone, account_credit
                 FROM customers WHERE id = ?",
            )
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await?;
        Ok(row.as_ref().map(row_to_customer))
    }
}

fn row_to_movie(row: &SqliteRow) -> Movie {
    Movie {
        title: row.get("title"),
        overview: row.get("overview"),
        release_date: row.get("release_date"),
        inventory: row.get("inventory"),
    }
}

fn row_to_customer(row: &SqliteRow) -> Customer {
    Customer {
        id: row.get("id"),
        name: row.get("name"),
        registered_at: row.get("registered_at"),
        address: row.get("address"),
        city: row.get("city"),
        state: row.get("state"),
        postal_code: row.get("postal_code"),
        phone: row.get("phone"),
        account_credit: row.get("account_credit"),
    }
}

fn row_to_renter(row: &SqliteRow) -> RenterRow {
    RenterRow {
        id: row.get("id"),
        name: row.get("name"),
        city: row.get("city"),
        state: row.get("state"),
        postal_code: row.get("postal_code"),
        check_out_date: row.get("check_out_date"),
        // only the overdue query selects the title
        movie_title: row.try_get("movie_title").ok(),
    }
}

// Seeding helpers for the test suites; the HTTP surface is read-only.
#[cfg(test)]
impl Database {
    pub async fn insert_movie(
        &self,
        title: &str,
        overview: &str,
        release_date: i64,
        inventory: i64,
    ) -> Result<(), DbError> {
        sqlx::query(
            "INSERT INTO movies (title, overview, release_date, inventory) VALUES (?, ?, ?, ?)",
        )
        .bind(title)
        .bind(overview)
        .bind(release_date)
        .bind(inventory)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn insert_customer(
        &self,
        name: &str,
        registered_at: i64,
        postal_code: &str,
    ) -> Result<i64, DbError> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO customers (name, registered_at, address, city, state, postal_code, phone)
             VALUES (?, ?, '1 Test St', 'Portland', 'OR', ?, '555-0100') RETURNING id",
        )
        .bind(name)
        .bind(registered_at)
        .bind(postal_code)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn insert_rental(
        &self,
        movie_title: &str,
        customer_id: i64,
        returned: bool,
        check_out_date: i64,
    ) -> Result<(), DbError> {
        sqlx::query(
            "INSERT INTO rentals (movie_title, customer_id, returned, check_out_date)
             VALUES (?, ?, ?, ?)",
        )
        .bind(movie_title)
        .bind(customer_id)
        .bind(returned as i64)
        .bind(check_out_date)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Database {
        Database::new("sqlite::memory:").await.unwrap()
    }

    async fn seed_movies(db: &Database, count: i64) {
        for i in 0..count {
            db.insert_movie(
                &format!("Movie {i:02}"),
                "an overview",
                1_000_000_000_000 + i * 86_400_000,
                i % 4,
            )
            .await
            .unwrap();
        }
    }

    #[tokio::test]
    async fn test_get_movie() {
        let db = test_db().await;
        db.insert_movie("Alien", "in space", 296_870_400_000, 3)
            .await
            .unwrap();

        let movie = db.get_movie("Alien").await.unwrap().unwrap();
        assert_eq!(movie.title, "Alien");
        assert_eq!(movie.inventory, 3);

        assert!(db.get_movie("Aliens").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_movies_pagination() {
        let db = test_db().await;
        seed_movies(&db, 15).await;

        let (page1, total) = db.list_movies(None, Page::new(1)).await.unwrap();
        assert_eq!(page1.len(), 10);
        assert_eq!(total, 15);

        let (page2, total) = db.list_movies(None, Page::new(2)).await.unwrap();
        assert_eq!(page2.len(), 5);
        assert_eq!(total, 15);

        let (page3, _) = db.list_movies(None, Page::new(3)).await.unwrap();
        assert!(page3.is_empty());
    }

    #[tokio::test]
    async fn test_list_movies_sorted_by_title() {
        let db = test_db().await;
        db.insert_movie("Zardoz", "", 0, 1).await.unwrap();
        db.insert_movie("Alien", "", 0, 1).await.unwrap();

        let (movies, _) = db
            .list_movies(Some(MovieSort::Title), Page::new(1))
            .await
            .unwrap();
        assert_eq!(movies[0].title, "Alien");
        assert_eq!(movies[1].title, "Zardoz");
    }

    #[tokio::test]
    async fn test_customers_renting_filters_returned_copies() {
        let db = test_db().await;
        db.insert_movie("Alien", "", 0, 2).await.unwrap();
        let ripley = db.insert_customer("Ripley", 0, "97201").await.unwrap();
        let dallas = db.insert_customer("Dallas", 0, "97202").await.unwrap();
        db.insert_rental("Alien", ripley, false, 1000).await.unwrap();
        db.insert_rental("Alien", dallas, true, 2000).await.unwrap();

        let renting = db.customers_renting("Alien").await.unwrap();
        assert_eq!(renting.len(), 1);
        assert_eq!(renting[0].name, "Ripley");

        assert_eq!(db.open_rental_count("Alien").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_past_renters_sorted_by_name() {
        let db = test_db().await;
        db.insert_movie("Alien", "", 0, 2).await.unwrap();
        let ripley = db.insert_customer("Ripley", 0, "97201").await.unwrap();
        let dallas = db.insert_customer("Dallas", 0, "97202").await.unwrap();
        db.insert_rental("Alien", ripley, true, 1000).await.unwrap();
        db.insert_rental("Alien", dallas, true, 2000).await.unwrap();
        db.insert_rental("Alien", ripley, false, 3000).await.unwrap();

        let (renters, total) = db
            .past_renters("Alien", RentalSort::CustomerName, Page::new(1))
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(renters[0].name, "Dallas");
        assert_eq!(renters[1].name, "Ripley");
    }

    #[tokio::test]
    async fn test_overdue_renters_threshold() {
        let db = test_db().await;
        db.insert_movie("Alien", "", 0, 3).await.unwrap();
        let ripley = db.insert_customer("Ripley", 0, "97201").await.unwrap();
        let dallas = db.insert_customer("Dallas", 0, "97202").await.unwrap();
        let kane = db.insert_customer("Kane", 0, "97203").await.unwrap();

        let now = 1_000_000_000_000_i64;
        let hundred_hours = 100 * 60 * 60 * 1000;
        // 100 hours out and unreturned: overdue
        db.insert_rental("Alien", ripley, false, now - hundred_hours)
            .await
            .unwrap();
        // 100 hours out but returned: not overdue
        db.insert_rental("Alien", dallas, true, now - hundred_hours)
            .await
            .unwrap();
        // one hour out: not overdue
        db.insert_rental("Alien", kane, false, now - 3_600_000)
            .await
            .unwrap();

        let (overdue, total) = db.overdue_renters(now, Page::new(1)).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(overdue[0].name, "Ripley");
        assert_eq!(overdue[0].movie_title.as_deref(), Some("Alien"));
    }

    #[tokio::test]
    async fn test_exactly_72_hours_is_not_overdue() {
        let db = test_db().await;
        db.insert_movie("Alien", "", 0, 1).await.unwrap();
        let ripley = db.insert_customer("Ripley", 0, "97201").await.unwrap();

        let now = 1_000_000_000_000_i64;
        db.insert_rental("Alien", ripley, false, now - OVERDUE_AFTER_MS)
            .await
            .unwrap();

        let (overdue, total) = db.overdue_renters(now, Page::new(1)).await.unwrap();
        assert!(overdue.is_empty());
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_list_customers_sorted() {
        let db = test_db().await;
        db.insert_customer("Ripley", 2000, "97209").await.unwrap();
        db.insert_customer("Dallas", 1000, "97201").await.unwrap();

        let (by_name, total) = db
            .list_customers(Some(CustomerSort::Name), Page::new(1))
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(by_name[0].name, "Dallas");

        let (by_postal, _) = db
            .list_customers(Some(CustomerSort::PostalCode), Page::new(1))
            .await
            .unwrap();
        assert_eq!(by_postal[0].postal_code, "97201");

        let (by_date, _) = db
            .list_customers(Some(CustomerSort::RegisteredAt), Page::new(1))
            .await
            .unwrap();
        assert_eq!(by_date[0].registered_at, 1000);
    }

    #[tokio::test]
    async fn test_get_customer() {
        let db = test_db().await;
        let id = db.insert_customer("Ripley", 0, "97201").await.unwrap();

        let customer = db.get_customer(id).await.unwrap().unwrap();
        assert_eq!(customer.name, "Ripley");
        assert!(db.get_customer(id + 99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_backed_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("radiostar_test.db");
        let url = format!("sqlite:{}?mode=rwc", path.display());

        let db = Database::new(&url).await.unwrap();
        db.insert_movie("Alien", "", 0, 1).await.unwrap();
        let (movies, total) = db.list_movies(None, Page::new(1)).await.unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(total, 1);
    }
}
