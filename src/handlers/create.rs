use super::{item_service, read_item};
use crate::error::{ApiError, ErrorResponse, OkResponse};
use crate::routes;
use crate::state::AppState;
use axum::{
    Json,
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::StatusCode,
};

/// POST /items handler - Store a new item
///
/// The body must be a JSON object carrying the collection's key fields.
#[utoipa::path(
    post,
    path = routes::ITEMS,
    request_body = serde_json::Value,
    responses(
        (status = 201, description = "Item stored", body = OkResponse),
        (status = 400, description = "Invalid JSON or missing key field", body = ErrorResponse),
        (status = 404, description = "Item service not configured", body = ErrorResponse),
        (status = 413, description = "Request body too large", body = ErrorResponse),
        (status = 500, description = "Storage backend failure", body = ErrorResponse)
    ),
    tag = "items"
)]
pub async fn create_handler(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<OkResponse>), ApiError> {
    let service = item_service(&state)?;
    let item = read_item(body)?;

    service.create(&state.request_context(), item).await?;

    Ok((StatusCode::CREATED, OkResponse::json()))
}
