use super::{item_service, path_key};
use crate::error::{ApiError, ErrorResponse};
use crate::state::AppState;
use crate::store::Item;
use axum::{
    Json,
    extract::{Path, State, rejection::PathRejection},
};

/// GET /items/{id} handler - Retrieve one item
#[utoipa::path(
    get,
    path = "/items/{id}",
    params(
        ("id" = String, Path, description = "Item id")
    ),
    responses(
        (status = 200, description = "Item found", body = serde_json::Value),
        (status = 404, description = "Item not found, invalid id, or item service not configured", body = ErrorResponse),
        (status = 500, description = "Storage backend failure", body = ErrorResponse)
    ),
    tag = "items"
)]
pub async fn get_handler(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Item>, ApiError> {
    let service = item_service(&state)?;
    let key = path_key(path)?;

    let item = service.get(&state.request_context(), &key).await?;

    Ok(Json(item))
}
