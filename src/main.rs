use std::sync::Arc;

use basecamp::config::Config;
use basecamp::db::{create_pool, migrations};
use basecamp::handlers;
use basecamp::services::clock::SystemClock;
use basecamp::state::AppState;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "basecamp=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!(
        version = basecamp::VERSION,
        backend = %config.backend_url,
        "Starting basecamp on {}",
        config.address()
    );

    let db = create_pool(&config.database_path).expect("Failed to create database pool");

    {
        let conn = db.get().expect("Failed to get database connection");
        migrations::run_migrations(&conn).expect("Failed to run migrations");
    }

    let address = config.address();
    let state = AppState::new(config, db, Arc::new(SystemClock))
        .expect("Failed to initialise application state");

    let app = handlers::routes()
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = TcpListener::bind(&address)
        .await
        .expect("Failed to bind address");

    tracing::info!("Listening on http://{}", address);

    axum::serve(listener, app).await.expect("Server error");
}
