//! Aggregated health check.
//!
//! Each configured dependency is probed independently, with its own short
//! timeout, and the verdicts are folded into one pass/fail result and one
//! message. A failing dependency never stops the others from being checked.

use crate::context::RequestContext;
use crate::store::StorePort;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub const BASE_MESSAGE: &str = "api up";
pub const REACHABILITY_TIMEOUT: Duration = Duration::from_millis(300);
pub const STORE_PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// One dependency's verdict, built once per check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheckResult {
    pub ok: bool,
    pub detail: Option<String>,
}

/// Combined verdict returned by `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AggregatedHealth {
    pub ok: bool,
    pub message: String,
    /// Configured reachability endpoint, echoed regardless of the verdict
    pub endpoint: Option<String>,
}

/// A single dependency check.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Used in the message suffix, e.g. "store ok"
    fn name(&self) -> &str;

    fn timeout(&self) -> Duration;

    async fn check(&self) -> Result<()>;
}

/// Plain HTTP GET against a fixed URL; any 2xx counts as reachable.
pub struct ReachabilityProbe {
    url: String,
    client: Client,
}

impl ReachabilityProbe {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REACHABILITY_TIMEOUT)
            .build()
            .context("Failed to build HTTP client for health probe")?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl Probe for ReachabilityProbe {
    fn name(&self) -> &str {
        "upstream"
    }

    fn timeout(&self) -> Duration {
        REACHABILITY_TIMEOUT
    }

    async fn check(&self) -> Result<()> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            bail!("unexpected status {}", status);
        }
        Ok(())
    }
}

/// Liveness of the storage backend.
pub struct StoreProbe {
    store: Arc<dyn StorePort>,
}

impl StoreProbe {
    pub fn new(store: Arc<dyn StorePort>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Probe for StoreProbe {
    fn name(&self) -> &str {
        "store"
    }

    fn timeout(&self) -> Duration {
        STORE_PROBE_TIMEOUT
    }

    async fn check(&self) -> Result<()> {
        self.store.health().await?;
        Ok(())
    }
}

pub struct HealthAggregator {
    endpoint: Option<String>,
    probes: Vec<Arc<dyn Probe>>,
}

impl HealthAggregator {
    /// Probes run in a fixed order: reachability first, then the store.
    /// Either one is skipped when not configured.
    pub fn new(endpoint: Option<String>, store: Option<Arc<dyn StorePort>>) -> Result<Self> {
        let mut probes: Vec<Arc<dyn Probe>> = Vec::new();
        if let Some(url) = &endpoint {
            probes.push(Arc::new(ReachabilityProbe::new(url.clone())?));
        }
        if let Some(store) = store {
            probes.push(Arc::new(StoreProbe::new(store)));
        }
        Ok(Self::with_probes(endpoint, probes))
    }

    pub fn with_probes(endpoint: Option<String>, probes: Vec<Arc<dyn Probe>>) -> Self {
        Self { endpoint, probes }
    }

    pub async fn check(&self, ctx: &RequestContext) -> AggregatedHealth {
        let results = join_all(self.probes.iter().map(|probe| run_probe(ctx, probe.as_ref()))).await;
        aggregate(self.endpoint.clone(), &results)
    }
}

async fn run_probe(ctx: &RequestContext, probe: &dyn Probe) -> HealthCheckResult {
    let timeout = probe.timeout();
    let outcome = tokio::select! {
        biased;
        _ = ctx.done() => Err(anyhow::anyhow!("request cancelled")),
        result = tokio::time::timeout(timeout, probe.check()) => {
            result.unwrap_or_else(|_| Err(anyhow::anyhow!("timed out after {:?}", timeout)))
        }
    };

    match outcome {
        Ok(()) => HealthCheckResult {
            ok: true,
            detail: Some(format!("{} ok", probe.name())),
        },
        Err(e) => {
            tracing::warn!(probe = probe.name(), error = %e, "health probe failed");
            HealthCheckResult {
                ok: false,
                detail: Some(format!("{} unreachable", probe.name())),
            }
        }
    }
}

/// Fold individual results, in order, into the overall verdict.
pub fn aggregate(endpoint: Option<String>, results: &[HealthCheckResult]) -> AggregatedHealth {
    let mut ok = true;
    let mut message = BASE_MESSAGE.to_string();
    for result in results {
        ok &= result.ok;
        if let Some(detail) = result.detail.as_deref().filter(|d| !d.is_empty()) {
            message.push_str("; ");
            message.push_str(detail);
        }
    }
    AggregatedHealth {
        ok,
        message,
        endpoint,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::store::{Item, Key, MemoryStore, StoreError, StoreResult};
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Probe with a fixed outcome that records whether it ran.
    pub(crate) struct StaticProbe {
        pub(crate) name: &'static str,
        pub(crate) healthy: bool,
        pub(crate) delay: Duration,
        pub(crate) ran: AtomicBool,
    }

    impl StaticProbe {
        pub(crate) fn new(name: &'static str, healthy: bool) -> Self {
            Self {
                name,
                healthy,
                delay: Duration::ZERO,
                ran: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl Probe for StaticProbe {
        fn name(&self) -> &str {
            self.name
        }

        fn timeout(&self) -> Duration {
            Duration::from_millis(100)
        }

        async fn check(&self) -> Result<()> {
            tokio::time::sleep(self.delay).await;
            self.ran.store(true, Ordering::SeqCst);
            if self.healthy {
                Ok(())
            } else {
                bail!("{} is down", self.name)
            }
        }
    }

    /// Store that always reports itself unreachable.
    pub(crate) struct DownStore;

    #[async_trait]
    impl StorePort for DownStore {
        async fn put(&self, _: &str, _: Item) -> StoreResult<()> {
            Err(StoreError::Unavailable(anyhow::anyhow!("connection refused")))
        }

        async fn get(&self, _: &str, _: &Key) -> StoreResult<Item> {
            Err(StoreError::Unavailable(anyhow::anyhow!("connection refused")))
        }

        async fn delete(&self, _: &str, _: &Key) -> StoreResult<()> {
            Err(StoreError::Unavailable(anyhow::anyhow!("connection refused")))
        }

        async fn scan(&self, _: &str, _: i32) -> StoreResult<Vec<Item>> {
            Err(StoreError::Unavailable(anyhow::anyhow!("connection refused")))
        }

        async fn health(&self) -> StoreResult<()> {
            Err(StoreError::Unavailable(anyhow::anyhow!("connection refused")))
        }
    }

    #[tokio::test]
    async fn test_no_dependencies_is_healthy() {
        let aggregator = HealthAggregator::new(None, None).unwrap();
        let health = aggregator.check(&RequestContext::background()).await;

        assert_eq!(
            health,
            AggregatedHealth {
                ok: true,
                message: "api up".to_string(),
                endpoint: None,
            }
        );
    }

    #[tokio::test]
    async fn test_reachability_down_store_up() {
        let aggregator = HealthAggregator::with_probes(
            Some("http://upstream".to_string()),
            vec![
                Arc::new(StaticProbe::new("upstream", false)),
                Arc::new(StaticProbe::new("store", true)),
            ],
        );

        let health = aggregator.check(&RequestContext::background()).await;

        assert!(!health.ok);
        assert_eq!(health.message, "api up; upstream unreachable; store ok");
        assert_eq!(health.message.matches("unreachable").count(), 1);
        assert_eq!(health.endpoint, Some("http://upstream".to_string()));
    }

    #[tokio::test]
    async fn test_failure_does_not_short_circuit() {
        let first = Arc::new(StaticProbe::new("upstream", false));
        let second = Arc::new(StaticProbe::new("store", false));
        let aggregator =
            HealthAggregator::with_probes(None, vec![first.clone(), second.clone()]);

        let health = aggregator.check(&RequestContext::background()).await;

        assert!(first.ran.load(Ordering::SeqCst));
        assert!(second.ran.load(Ordering::SeqCst));
        assert_eq!(
            health.message,
            "api up; upstream unreachable; store unreachable"
        );
    }

    #[tokio::test]
    async fn test_slow_probe_times_out() {
        let mut slow = StaticProbe::new("store", true);
        slow.delay = Duration::from_secs(5);
        let aggregator = HealthAggregator::with_probes(None, vec![Arc::new(slow)]);

        let health = aggregator.check(&RequestContext::background()).await;

        assert!(!health.ok);
        assert_eq!(health.message, "api up; store unreachable");
    }

    #[tokio::test]
    async fn test_cancelled_request_fails_probes() {
        let ctx = RequestContext::background();
        ctx.cancel();
        let aggregator =
            HealthAggregator::with_probes(None, vec![Arc::new(StaticProbe::new("store", true))]);

        let health = aggregator.check(&ctx).await;

        assert!(!health.ok);
    }

    #[tokio::test]
    async fn test_store_probe_uses_store_health() {
        let up = HealthAggregator::new(None, Some(Arc::new(MemoryStore::default()))).unwrap();
        let down = HealthAggregator::new(None, Some(Arc::new(DownStore))).unwrap();
        let ctx = RequestContext::background();

        assert_eq!(up.check(&ctx).await.message, "api up; store ok");

        let health = down.check(&ctx).await;
        assert!(!health.ok);
        assert_eq!(health.message, "api up; store unreachable");
        assert!(!health.message.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_reachability_probe_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .with_status(200)
            .create_async()
            .await;

        let aggregator = HealthAggregator::new(Some(server.url()), None).unwrap();
        let health = aggregator.check(&RequestContext::background()).await;

        mock.assert_async().await;
        assert!(health.ok);
        assert_eq!(health.message, "api up; upstream ok");
        assert_eq!(health.endpoint, Some(server.url()));
    }

    #[tokio::test]
    async fn test_reachability_probe_uses_url_verbatim() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/_status/ready")
            .with_status(204)
            .create_async()
            .await;

        let probe = ReachabilityProbe::new(format!("{}/_status/ready", server.url())).unwrap();

        assert!(probe.check().await.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_reachability_probe_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .with_status(500)
            .create_async()
            .await;

        let store: Arc<dyn StorePort> = Arc::new(MemoryStore::default());
        let aggregator = HealthAggregator::new(Some(server.url()), Some(store)).unwrap();
        let health = aggregator.check(&RequestContext::background()).await;

        assert!(!health.ok);
        assert_eq!(health.message, "api up; upstream unreachable; store ok");
    }

    #[tokio::test]
    async fn test_reachability_probe_connection_refused() {
        // Nothing listens on port 9 (discard) in the test environment.
        let aggregator =
            HealthAggregator::new(Some("http://127.0.0.1:9".to_string()), None).unwrap();
        let health = aggregator.check(&RequestContext::background()).await;

        assert!(!health.ok);
        assert_eq!(health.message, "api up; upstream unreachable");
    }

    #[test]
    fn test_aggregate_skips_empty_details() {
        let results = vec![
            HealthCheckResult {
                ok: true,
                detail: None,
            },
            HealthCheckResult {
                ok: true,
                detail: Some(String::new()),
            },
            HealthCheckResult {
                ok: true,
                detail: Some("store ok".to_string()),
            },
        ];

        let health = aggregate(None, &results);
        assert!(health.ok);
        assert_eq!(health.message, "api up; store ok");
    }
}
