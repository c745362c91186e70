use super::{Item, Key, KeySchema, StoreError, StorePort, StoreResult, check_scan_limit};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-process store, one map per collection.
///
/// Used for local development and tests; contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    schema: KeySchema,
    collections: RwLock<HashMap<String, HashMap<String, Item>>>,
}

impl MemoryStore {
    pub fn new(schema: KeySchema) -> Self {
        Self {
            schema,
            collections: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl StorePort for MemoryStore {
    async fn put(&self, collection: &str, item: Item) -> StoreResult<()> {
        let address = self.schema.encode(&item)?;
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(address, item);
        Ok(())
    }

    async fn get(&self, collection: &str, key: &Key) -> StoreResult<Item> {
        let address = self.schema.encode(key)?;
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .and_then(|items| items.get(&address))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(address))
    }

    async fn delete(&self, collection: &str, key: &Key) -> StoreResult<()> {
        let address = self.schema.encode(key)?;
        let mut collections = self.collections.write().await;
        if let Some(items) = collections.get_mut(collection) {
            items.remove(&address);
        }
        Ok(())
    }

    async fn scan(&self, collection: &str, limit: i32) -> StoreResult<Vec<Item>> {
        let limit = check_scan_limit(limit)?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|items| items.values().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn health(&self) -> StoreResult<()> {
        Ok(())
    }
}
