use anyhow::{Context, Result, bail};
use std::env;
use std::time::Duration;

/// Which storage backend serves the item routes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Spanner,
    /// No backend: item routes answer "not configured"
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpannerConfig {
    pub emulator_host: Option<String>,
    pub project: String,
    pub instance: String,
    pub database: String,
}

impl SpannerConfig {
    pub fn database_path(&self) -> String {
        format!(
            "projects/{}/instances/{}/databases/{}",
            self.project, self.instance, self.database
        )
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub store_backend: StoreBackend,
    pub spanner: Option<SpannerConfig>,
    pub collection: String,
    pub health_probe_url: Option<String>,
    pub request_timeout: Duration,
    pub service_port: u16,
    pub service_host: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store_backend = match lookup("STORE_BACKEND").as_deref() {
            None | Some("") | Some("memory") => StoreBackend::Memory,
            Some("spanner") => StoreBackend::Spanner,
            Some("none") => StoreBackend::Disabled,
            Some(other) => bail!(
                "STORE_BACKEND must be one of: memory, spanner, none, got '{}'",
                other
            ),
        };

        let spanner = if store_backend == StoreBackend::Spanner {
            Some(SpannerConfig {
                emulator_host: lookup("SPANNER_EMULATOR_HOST"),
                project: lookup("SPANNER_PROJECT")
                    .context("SPANNER_PROJECT environment variable is required")?,
                instance: lookup("SPANNER_INSTANCE")
                    .context("SPANNER_INSTANCE environment variable is required")?,
                database: lookup("SPANNER_DATABASE")
                    .context("SPANNER_DATABASE environment variable is required")?,
            })
        } else {
            None
        };

        let collection = lookup("ITEMS_COLLECTION")
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "example-items".to_string());

        let health_probe_url = lookup("HEALTH_PROBE_URL").filter(|url| !url.is_empty());

        let request_timeout_ms = lookup("REQUEST_TIMEOUT_MS")
            .unwrap_or_else(|| "5000".to_string())
            .parse::<u64>()
            .context("REQUEST_TIMEOUT_MS must be a number of milliseconds")?;

        let service_port = lookup("SERVICE_PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse::<u16>()
            .context("SERVICE_PORT must be a valid port number (0-65535)")?;

        let service_host = lookup("SERVICE_HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        Ok(Config {
            store_backend,
            spanner,
            collection,
            health_probe_url,
            request_timeout: Duration::from_millis(request_timeout_ms),
            service_port,
            service_host,
        })
    }

    pub fn log_startup(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Store backend: {:?}", self.store_backend);
        if let Some(spanner) = &self.spanner {
            tracing::info!(
                "  Spanner emulator: {}",
                spanner
                    .emulator_host
                    .as_deref()
                    .unwrap_or("disabled (using production)")
            );
            tracing::info!("  Spanner database: {}", spanner.database_path());
        }
        tracing::info!("  Items collection: {}", self.collection);
        tracing::info!(
            "  Health probe: {}",
            self.health_probe_url.as_deref().unwrap_or("disabled")
        );
        tracing::info!("  Request timeout: {:?}", self.request_timeout);
        tracing::info!(
            "  Service listening on: {}:{}",
            self.service_host,
            self.service_port
        );
    }
}
