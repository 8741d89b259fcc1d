//! # BudgetMate API Server
//!
//! Loads configuration, migrates the database and serves the household
//! finance API until interrupted.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/budgetmate cargo run -p budgetmate-api
//! ```

use budgetmate_api::{
    app::{build_router, AppState},
    config::Config,
};
use budgetmate_shared::auth::session_cache::InMemorySessionCache;
use budgetmate_shared::db::{migrations, pool};
use budgetmate_shared::models::session::Session;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often expired sessions are swept from the database and the cache
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(15 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "budgetmate_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "BudgetMate API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    migrations::ensure_database_exists(&config.database.url).await?;
    let db = pool::create_pool(pool::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;
    migrations::run_migrations(&db).await?;

    let cache = Arc::new(InMemorySessionCache::new(chrono::Duration::seconds(
        config.session.cache_ttl_secs,
    )));
    tokio::spawn(sweep_sessions(db.clone(), cache.clone()));

    let bind_address = config.bind_address();
    let state = AppState::with_cache(db.clone(), config, cache);
    if !state.categorizer.has_model() {
        tracing::info!("GROQ_API_KEY not set; categorization uses keyword rules only");
    }

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool::close_pool(db).await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn sweep_sessions(db: PgPool, cache: Arc<InMemorySessionCache>) {
    let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
    loop {
        interval.tick().await;

        match Session::delete_expired(&db).await {
            Ok(deleted) if deleted > 0 => {
                tracing::debug!(deleted, "Deleted expired sessions");
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "Failed to delete expired sessions"),
        }

        let purged = cache.purge_stale();
        if purged > 0 {
            tracing::debug!(purged, "Purged stale session cache entries");
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
