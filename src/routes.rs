// Route path constants - single source of truth for all API paths

use crate::error::ApiError;
use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    routing::{MethodRouter, get},
};
use tower_http::trace::TraceLayer;

pub const HEALTH: &str = "/health";
pub const ITEMS: &str = "/items";
/// Catch-all so ids containing `/` reach the handler and get rejected there
pub const ITEM: &str = "/items/{*id}";
/// The catch-all does not match an empty id; this does
pub const ITEM_PREFIX: &str = "/items/";

/// Fixed route table for the service.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(HEALTH, get(handlers::health_handler))
        .route(
            ITEMS,
            get(handlers::list_handler).post(handlers::create_handler),
        )
        .route(ITEM, item_routes())
        .route(ITEM_PREFIX, item_routes())
        .fallback(route_not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

fn item_routes() -> MethodRouter<AppState> {
    get(handlers::get_handler)
        .put(handlers::put_handler)
        .delete(handlers::delete_handler)
}

async fn route_not_found() -> ApiError {
    ApiError::RouteNotFound
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
