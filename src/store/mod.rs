//! Key-value storage port and its adapters.
//!
//! The rest of the service only ever talks to a [`StorePort`]; the concrete
//! backend (in-memory map or Cloud Spanner) is chosen at startup.

pub mod memory;
pub mod spanner;

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

pub use memory::MemoryStore;
pub use spanner::SpannerStore;

/// An open-ended document: field name to arbitrary JSON value.
pub type Item = Map<String, JsonValue>;

/// The subset of an item's fields that uniquely addresses it in a collection.
pub type Key = Map<String, JsonValue>;

/// Key field used when no schema is configured.
pub const DEFAULT_KEY_FIELD: &str = "id";

/// Errors surfaced by the storage port and everything layered on top of it.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No item matches the requested key
    #[error("item not found: {0}")]
    NotFound(String),

    /// Malformed input from the caller (missing key field, bad limit, ...)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The backend could not be reached or failed the operation
    #[error("backend unavailable")]
    Unavailable(#[source] anyhow::Error),

    /// The caller went away or its deadline passed before the call finished
    #[error("operation cancelled")]
    Cancelled,
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Capability interface for a key-value backend.
///
/// Implementations own their connection state and must be safe to share
/// across concurrently running request handlers.
#[async_trait]
pub trait StorePort: Send + Sync {
    /// Insert or fully replace the item addressed by its embedded key fields.
    async fn put(&self, collection: &str, item: Item) -> StoreResult<()>;

    /// Fetch one item. Fails with [`StoreError::NotFound`] when absent.
    async fn get(&self, collection: &str, key: &Key) -> StoreResult<Item>;

    /// Remove one item. Deleting a missing key succeeds.
    async fn delete(&self, collection: &str, key: &Key) -> StoreResult<()>;

    /// Return up to `limit` items in backend-defined order.
    async fn scan(&self, collection: &str, limit: i32) -> StoreResult<Vec<Item>>;

    /// Succeeds iff the backend is currently reachable and responsive.
    async fn health(&self) -> StoreResult<()>;
}

/// Ordered list of key-field names shared by every collection of a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchema {
    fields: Vec<String>,
}

impl KeySchema {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Extract the key fields from an item (or from a key map).
    ///
    /// Extra fields are ignored; a missing key field is an invalid argument.
    pub fn key_of(&self, item: &Item) -> StoreResult<Key> {
        let mut key = Key::new();
        for field in &self.fields {
            let value = item.get(field).ok_or_else(|| {
                StoreError::InvalidArgument(format!("missing key field '{}'", field))
            })?;
            key.insert(field.clone(), value.clone());
        }
        Ok(key)
    }

    /// Canonical storage address for a key: its values encoded in schema order.
    ///
    /// Typed values are kept, so `{"id": 1}` and `{"id": "1"}` address
    /// different items.
    pub fn encode(&self, key: &Key) -> StoreResult<String> {
        let key = self.key_of(key)?;
        let values: Vec<&JsonValue> = self
            .fields
            .iter()
            .filter_map(|field| key.get(field))
            .collect();
        serde_json::to_string(&values)
            .map_err(|e| StoreError::InvalidArgument(format!("unencodable key: {}", e)))
    }
}

impl Default for KeySchema {
    fn default() -> Self {
        Self::new([DEFAULT_KEY_FIELD])
    }
}

/// Shared argument check for `scan` implementations.
pub(crate) fn check_scan_limit(limit: i32) -> StoreResult<usize> {
    if limit <= 0 {
        return Err(StoreError::InvalidArgument(format!(
            "limit must be positive, got {}",
            limit
        )));
    }
    Ok(limit as usize)
}
