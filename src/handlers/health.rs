use crate::health::AggregatedHealth;
use crate::routes;
use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};

/// GET /health handler - Aggregated health check
///
/// Probes every configured dependency and returns the combined verdict.
/// The body is the same on success and failure; only the status differs.
#[utoipa::path(
    get,
    path = routes::HEALTH,
    responses(
        (status = 200, description = "Service and all dependencies are healthy", body = AggregatedHealth),
        (status = 503, description = "At least one dependency is unhealthy", body = AggregatedHealth)
    ),
    tag = "health"
)]
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<AggregatedHealth>) {
    let health = state.health.check(&state.request_context()).await;

    if health.ok {
        tracing::debug!("Health check passed");
        (StatusCode::OK, Json(health))
    } else {
        tracing::warn!(message = %health.message, "Health check failed");
        (StatusCode::SERVICE_UNAVAILABLE, Json(health))
    }
}
