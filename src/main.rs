use items_api::api_doc::ApiDoc;
use items_api::config::{Config, StoreBackend};
use items_api::health::HealthAggregator;
use items_api::repository::Repository;
use items_api::routes::build_router;
use items_api::service::{CrudService, ItemService};
use items_api::state::AppState;
use items_api::store::{KeySchema, MemoryStore, SpannerStore, StorePort};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("items-api starting");

    let config = Config::from_env()?;
    config.log_startup();

    let store = build_store(&config).await;

    let items: Option<Arc<dyn ItemService>> = store.clone().map(|store| {
        let service = CrudService::new(Repository::new(store, config.collection.clone()));
        tracing::info!(collection = %service.collection(), "item routes enabled");
        Arc::new(service) as Arc<dyn ItemService>
    });

    let health = HealthAggregator::new(config.health_probe_url.clone(), store)?;

    let state = AppState {
        items,
        health: Arc::new(health),
        request_timeout: config.request_timeout,
    };

    let app = build_router(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let addr = format!("{}:{}", config.service_host, config.service_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("items-api stopped");
    Ok(())
}

/// Build the configured store. A Spanner connection failure is not fatal:
/// the service keeps running with the item routes disabled.
async fn build_store(config: &Config) -> Option<Arc<dyn StorePort>> {
    let schema = KeySchema::default();
    tracing::info!("Key fields: {:?}", schema.fields());

    match config.store_backend {
        StoreBackend::Memory => Some(Arc::new(MemoryStore::new(schema))),
        StoreBackend::Spanner => {
            let spanner = config.spanner.as_ref()?;
            match SpannerStore::from_config(spanner, schema).await {
                Ok(store) => Some(Arc::new(store)),
                Err(e) => {
                    tracing::warn!(error = ?e, "failed to init spanner store, item routes disabled");
                    None
                }
            }
        }
        StoreBackend::Disabled => None,
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
