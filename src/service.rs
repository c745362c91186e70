use crate::context::RequestContext;
use crate::repository::Repository;
use crate::store::{Item, Key, StoreResult};
use async_trait::async_trait;

/// Use-case surface the HTTP layer depends on.
///
/// Every call honours the context: if it is cancelled or its deadline
/// passes first, the downstream call is dropped and `Cancelled` is returned.
#[async_trait]
pub trait ItemService: Send + Sync {
    async fn create(&self, ctx: &RequestContext, item: Item) -> StoreResult<()>;
    async fn get(&self, ctx: &RequestContext, key: &Key) -> StoreResult<Item>;
    async fn update(&self, ctx: &RequestContext, item: Item) -> StoreResult<()>;
    async fn delete(&self, ctx: &RequestContext, key: &Key) -> StoreResult<()>;
    async fn list(&self, ctx: &RequestContext, limit: i32) -> StoreResult<Vec<Item>>;
}

/// CRUD over one collection. Only `create` is logged.
pub struct CrudService {
    repo: Repository,
}

impl CrudService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    pub fn collection(&self) -> &str {
        self.repo.collection()
    }
}

#[async_trait]
impl ItemService for CrudService {
    async fn create(&self, ctx: &RequestContext, item: Item) -> StoreResult<()> {
        tracing::info!(collection = %self.repo.collection(), "create item");
        ctx.run(self.repo.create(item)).await
    }

    async fn get(&self, ctx: &RequestContext, key: &Key) -> StoreResult<Item> {
        ctx.run(self.repo.get(key)).await
    }

    async fn update(&self, ctx: &RequestContext, item: Item) -> StoreResult<()> {
        ctx.run(self.repo.update(item)).await
    }

    async fn delete(&self, ctx: &RequestContext, key: &Key) -> StoreResult<()> {
        ctx.run(self.repo.delete(key)).await
    }

    async fn list(&self, ctx: &RequestContext, limit: i32) -> StoreResult<Vec<Item>> {
        ctx.run(self.repo.list(limit)).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreError, StorePort};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    /// Store whose every call sleeps before delegating to an in-memory store.
    pub(crate) struct SlowStore {
        pub(crate) delay: Duration,
        pub(crate) inner: MemoryStore,
    }

    #[async_trait]
    impl StorePort for SlowStore {
        async fn put(&self, collection: &str, item: Item) -> StoreResult<()> {
            tokio::time::sleep(self.delay).await;
            self.inner.put(collection, item).await
        }

        async fn get(&self, collection: &str, key: &Key) -> StoreResult<Item> {
            tokio::time::sleep(self.delay).await;
            self.inner.get(collection, key).await
        }

        async fn delete(&self, collection: &str, key: &Key) -> StoreResult<()> {
            tokio::time::sleep(self.delay).await;
            self.inner.delete(collection, key).await
        }

        async fn scan(&self, collection: &str, limit: i32) -> StoreResult<Vec<Item>> {
            tokio::time::sleep(self.delay).await;
            self.inner.scan(collection, limit).await
        }

        async fn health(&self) -> StoreResult<()> {
            tokio::time::sleep(self.delay).await;
            Ok(())
        }
    }

    fn item(value: serde_json::Value) -> Item {
        value.as_object().cloned().unwrap()
    }

    fn service(store: Arc<dyn StorePort>) -> CrudService {
        CrudService::new(Repository::new(store, "things"))
    }

    #[tokio::test]
    async fn test_round_trip_through_service() {
        let svc = service(Arc::new(MemoryStore::default()));
        let ctx = RequestContext::background();
        let original = item(json!({"id": "1", "name": "x", "n": 1.5}));

        svc.create(&ctx, original.clone()).await.unwrap();
        let fetched = svc.get(&ctx, &item(json!({"id": "1"}))).await.unwrap();

        assert_eq!(fetched, original);
        assert_eq!(svc.collection(), "things");
    }

    #[tokio::test]
    async fn test_delete_twice_succeeds() {
        let svc = service(Arc::new(MemoryStore::default()));
        let ctx = RequestContext::background();
        let key = item(json!({"id": "1"}));

        svc.create(&ctx, item(json!({"id": "1"}))).await.unwrap();
        svc.delete(&ctx, &key).await.unwrap();
        svc.delete(&ctx, &key).await.unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_context_aborts_slow_call() {
        let store = Arc::new(SlowStore {
            delay: Duration::from_secs(30),
            inner: MemoryStore::default(),
        });
        let svc = service(store.clone());
        let ctx = RequestContext::with_timeout(Duration::from_millis(20));

        let result = svc.create(&ctx, item(json!({"id": "1"}))).await;

        assert!(matches!(result, Err(StoreError::Cancelled)));
        // the write was dropped along with the future
        assert!(store.inner.scan("things", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_propagates_invalid_limit() {
        let svc = service(Arc::new(MemoryStore::default()));
        let ctx = RequestContext::background();

        assert!(matches!(
            svc.list(&ctx, -1).await,
            Err(StoreError::InvalidArgument(_))
        ));
    }
}
