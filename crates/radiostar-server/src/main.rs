use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

mod db;
mod routes;

#[derive(Clone)]
pub struct AppState {
    pub db: db::Database,
    /// Canonical host prefix for every link the envelopes hand out.
    pub base_url: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("radiostar_server=info")),
        )
        .init();

    let db_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:radiostar.db?mode=rwc".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let base_url =
        std::env::var("BASE_URL").unwrap_or_else(|_| format!("http://localhost:{port}"));

    let database = db::Database::new(&db_url)
        .await
        .expect("failed to initialize database");

    let state = AppState {
        db: database,
        base_url,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::app(state).layer(cors);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");
    tracing::info!("radiostar server listening on http://localhost:{port}");
    axum::serve(listener, app).await.unwrap();
}
