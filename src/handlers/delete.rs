use super::{item_service, path_key};
use crate::error::{ApiError, ErrorResponse, no_content};
use crate::state::AppState;
use axum::{
    extract::{Path, State, rejection::PathRejection},
    response::Response,
};

/// DELETE /items/{id} handler - Remove an item
///
/// Idempotent: deleting an id that does not exist still answers 204.
#[utoipa::path(
    delete,
    path = "/items/{id}",
    params(
        ("id" = String, Path, description = "Item id")
    ),
    responses(
        (status = 204, description = "Item removed (or was already absent)"),
        (status = 404, description = "Invalid id or item service not configured", body = ErrorResponse),
        (status = 500, description = "Storage backend failure", body = ErrorResponse)
    ),
    tag = "items"
)]
pub async fn delete_handler(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    let service = item_service(&state)?;
    let key = path_key(path)?;

    service.delete(&state.request_context(), &key).await?;

    Ok(no_content())
}
