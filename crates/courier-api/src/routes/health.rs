use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::routes::dto::HealthResponse;
use crate::state::AppState;

/// Liveness, plus a database ping when one is configured
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let (status, database) = match &state.database {
        None => (StatusCode::OK, "unchecked"),
        Some(check) => match check.ping().await {
            Ok(()) => (StatusCode::OK, "up"),
            Err(e) => {
                tracing::warn!(error = %e, "Database ping failed");
                (StatusCode::SERVICE_UNAVAILABLE, "down")
            }
        },
    };

    let body = HealthResponse {
        status: if status.is_success() { "ok" } else { "degraded" }.to_string(),
        database: database.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    (status, Json(body))
}
