use crate::store::{Item, Key, StorePort, StoreResult};
use std::sync::Arc;

/// Binds a [`StorePort`] to one collection so callers cannot address any other.
///
/// Every operation is a pass-through; store errors come back untouched.
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn StorePort>,
    collection: String,
}

impl Repository {
    pub fn new(store: Arc<dyn StorePort>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The item must carry complete key fields; that is not checked here.
    pub async fn create(&self, item: Item) -> StoreResult<()> {
        self.store.put(&self.collection, item).await
    }

    pub async fn get(&self, key: &Key) -> StoreResult<Item> {
        self.store.get(&self.collection, key).await
    }

    pub async fn update(&self, item: Item) -> StoreResult<()> {
        self.store.put(&self.collection, item).await
    }

    pub async fn delete(&self, key: &Key) -> StoreResult<()> {
        self.store.delete(&self.collection, key).await
    }

    pub async fn list(&self, limit: i32) -> StoreResult<Vec<Item>> {
        self.store.scan(&self.collection, limit).await
    }
}
