/// Health check endpoint
///
/// ```text
/// GET /health
/// ```
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "pool": { "active_connections": 1, "idle_connections": 2, "total_connections": 3 }
/// }
/// ```
///
/// A failing database turns the status into `degraded` and the response
/// code into `503`.

use crate::app::AppState;
use axum::{extract::State, http::StatusCode, Json};
use budgetmate_shared::db::pool::{get_pool_stats, health_check as ping, PoolStats};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,
    pub pool: PoolStats,
}

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (code, status, database) = match ping(&state.db).await {
        Ok(()) => (StatusCode::OK, "healthy", "connected"),
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach the database");
            (StatusCode::SERVICE_UNAVAILABLE, "degraded", "disconnected")
        }
    };

    (
        code,
        Json(HealthResponse {
            status,
            version: budgetmate_shared::VERSION,
            database,
            pool: get_pool_stats(&state.db),
        }),
    )
}
