use std::sync::Arc;

use roster_api::api::{self, AppState};
use roster_api::config::{Config, StoreBackend};
use roster_api::domain::repositories::DocumentStore;
use roster_api::engine::Roster;
use roster_api::infrastructure::repositories::{MemoryDocumentStore, PostgresDocumentStore};
use roster_api::seed;
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load environment variables
    dotenv::dotenv().ok();

    let config = Config::from_env().expect("Invalid configuration");

    // Open the document store
    let store: Arc<dyn DocumentStore> = match config.store {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store, data is lost on exit");
            Arc::new(MemoryDocumentStore::with_change_buffer(config.change_buffer))
        }
        StoreBackend::Postgres => {
            tracing::info!("Connecting to database...");
            let pool = PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .connect(&config.database_url)
                .await
                .expect("Failed to connect to database");

            let store = PostgresDocumentStore::connect(pool, config.change_buffer)
                .await
                .expect("Failed to open document store");
            tracing::info!("Database connected successfully");
            Arc::new(store)
        }
    };

    if config.seed_demo {
        seed::seed_if_empty(store.as_ref())
            .await
            .expect("Failed to seed demo roster");
    }

    // Load the roster and follow store changes
    let roster = Arc::new(Roster::load(store).await.expect("Failed to load roster"));
    let sync = roster.watch().await.expect("Failed to start roster sync");

    let app = api::router(AppState::new(roster));

    // Start server
    tracing::info!("Server listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server failed");

    sync.shutdown().await;
    tracing::info!("Server stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
