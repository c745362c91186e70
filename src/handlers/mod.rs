pub mod create;
pub mod delete;
pub mod get;
pub mod health;
pub mod list;
pub mod put;

pub use create::create_handler;
pub use delete::delete_handler;
pub use get::get_handler;
pub use health::health_handler;
pub use list::list_handler;
pub use put::put_handler;

use crate::error::ApiError;
use crate::service::ItemService;
use crate::state::AppState;
use crate::store::{DEFAULT_KEY_FIELD, Item, Key};
use axum::{
    body::Bytes,
    extract::{
        Path,
        rejection::{BytesRejection, PathRejection},
    },
    http::StatusCode,
};
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// The item service, or "not configured" when no backend was wired in.
fn item_service(state: &AppState) -> Result<Arc<dyn ItemService>, ApiError> {
    state.items.clone().ok_or(ApiError::NotConfigured)
}

/// Key addressed by the `{id}` path segment.
fn item_key(id: &str) -> Result<Key, ApiError> {
    if id.is_empty() || id.contains('/') {
        return Err(ApiError::InvalidItemId);
    }
    let mut key = Key::new();
    key.insert(DEFAULT_KEY_FIELD.to_string(), JsonValue::String(id.to_string()));
    Ok(key)
}

/// Key for the `{id}` segment, or an invalid id when axum could not decode
/// it (bad percent-encoding, or the bare `/items/` prefix).
fn path_key(path: Result<Path<String>, PathRejection>) -> Result<Key, ApiError> {
    let Path(id) = path.map_err(|_| ApiError::InvalidItemId)?;
    item_key(&id)
}

/// Request bodies must be a JSON object.
fn parse_item(body: &[u8]) -> Result<Item, ApiError> {
    serde_json::from_slice(body).map_err(|_| ApiError::InvalidJson)
}

/// Buffered request body parsed as an item. Failing to buffer the body is
/// reported as JSON like every other error.
fn read_item(body: Result<Bytes, BytesRejection>) -> Result<Item, ApiError> {
    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::BodyTooLarge
        } else {
            ApiError::InvalidJson
        }
    })?;
    parse_item(&body)
}
