use crate::context::RequestContext;
use crate::health::HealthAggregator;
use crate::service::ItemService;
use std::sync::Arc;
use std::time::Duration;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// `None` when no store backend is configured
    pub items: Option<Arc<dyn ItemService>>,
    pub health: Arc<HealthAggregator>,
    pub request_timeout: Duration,
}

impl AppState {
    /// Fresh context for one inbound request.
    pub fn request_context(&self) -> RequestContext {
        RequestContext::with_timeout(self.request_timeout)
    }
}
