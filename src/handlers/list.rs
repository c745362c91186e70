use super::item_service;
use crate::error::{ApiError, ErrorResponse};
use crate::models::ListQuery;
use crate::routes;
use crate::state::AppState;
use crate::store::Item;
use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};

pub const DEFAULT_LIST_LIMIT: i32 = 50;

/// Positive integers are taken as-is; anything else falls back to the default.
fn parse_limit(raw: Option<&str>) -> i32 {
    raw.and_then(|v| v.trim().parse::<i32>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_LIST_LIMIT)
}

/// GET /items handler - List items in the collection
///
/// Returns up to `limit` items in backend-defined order. A missing, invalid
/// or non-positive `limit` is treated as 50 rather than rejected.
#[utoipa::path(
    get,
    path = routes::ITEMS,
    params(ListQuery),
    responses(
        (status = 200, description = "Items in the collection", body = Vec<serde_json::Value>),
        (status = 404, description = "Item service not configured", body = ErrorResponse),
        (status = 500, description = "Storage backend failure", body = ErrorResponse)
    ),
    tag = "items"
)]
pub async fn list_handler(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<Item>>, ApiError> {
    let service = item_service(&state)?;
    let raw = query.ok().and_then(|Query(q)| q.limit);
    let limit = parse_limit(raw.as_deref());

    let items = service.list(&state.request_context(), limit).await?;

    tracing::debug!("Listed {} items (limit: {})", items.len(), limit);
    Ok(Json(items))
}
