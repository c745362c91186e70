use anyhow::{Context, Result};
use async_trait::async_trait;
use gcloud_gax::grpc::{Code, Status};
use gcloud_googleapis::spanner::admin::database::v1::{
    CreateDatabaseRequest, GetDatabaseDdlRequest, GetDatabaseRequest, UpdateDatabaseDdlRequest,
};
use gcloud_googleapis::spanner::admin::instance::v1::{
    CreateInstanceRequest, GetInstanceRequest, Instance,
};
use gcloud_spanner::admin::AdminClientConfig;
use gcloud_spanner::admin::client::Client as AdminClient;
use gcloud_spanner::client::{Client, ClientConfig};
use gcloud_spanner::key::Key as SpannerKey;
use gcloud_spanner::mutation::{delete, insert_or_update};
use gcloud_spanner::statement::Statement;
use gcloud_spanner::value::CommitTimestamp;
use std::sync::Arc;

use super::{Item, Key, KeySchema, StoreError, StorePort, StoreResult, check_scan_limit};
use crate::config::SpannerConfig;

const TABLE: &str = "items";

/// Cloud Spanner backed store.
///
/// Every collection shares one `items` table keyed by
/// `(collection, item_key)`, where `item_key` is the canonical key encoding
/// from [`KeySchema::encode`].
#[derive(Clone)]
pub struct SpannerStore {
    inner: Arc<Client>,
    schema: KeySchema,
}

impl SpannerStore {
    /// Connect to Spanner, provisioning the instance, database and table
    /// first when they are missing.
    ///
    /// The gcloud-spanner library picks up `SPANNER_EMULATOR_HOST` from the
    /// environment and talks to the emulator when it is set.
    pub async fn from_config(config: &SpannerConfig, schema: KeySchema) -> Result<Self> {
        tracing::info!("Starting auto-provisioning checks...");
        Provisioner::connect(config).await?.run().await?;
        tracing::info!("Auto-provisioning complete");

        let database_path = config.database_path();

        match &config.emulator_host {
            Some(host) => tracing::info!("Connecting to Spanner emulator at: {}", host),
            None => tracing::info!("Connecting to production Spanner"),
        }

        let client = Client::new(&database_path, ClientConfig::default())
            .await
            .context("Failed to create Spanner client")?;

        tracing::info!(
            "Successfully connected to Spanner database: {}",
            database_path
        );

        Ok(Self {
            inner: Arc::new(client),
            schema,
        })
    }

    async fn upsert(&self, collection: &str, address: String, item: &Item) -> Result<()> {
        let collection = collection.to_string();
        let data = serde_json::to_string(item).context("Failed to serialize item")?;

        let mutation = insert_or_update(
            TABLE,
            &["collection", "item_key", "data", "created_at", "updated_at"],
            &[
                &collection,
                &address,
                &data,
                &CommitTimestamp::new(),
                &CommitTimestamp::new(),
            ],
        );

        self.inner
            .apply(vec![mutation])
            .await
            .context("Failed to upsert item to Spanner")?;

        tracing::debug!(collection = %collection, key = %address, "Upserted item");
        Ok(())
    }

    async fn read(&self, collection: &str, address: &str) -> Result<Option<Item>> {
        let mut statement = Statement::new(&format!(
            "SELECT data FROM {} WHERE collection = @collection AND item_key = @item_key",
            TABLE
        ));
        statement.add_param("collection", &collection.to_string());
        statement.add_param("item_key", &address.to_string());

        let mut tx = self
            .inner
            .single()
            .await
            .context("Failed to create read transaction")?;

        let mut result_set = tx
            .query(statement)
            .await
            .context("Failed to query item from Spanner")?;

        match result_set.next().await? {
            Some(row) => {
                let data: String = row.column_by_name("data")?;
                let item: Item =
                    serde_json::from_str(&data).context("Failed to deserialize item")?;
                Ok(Some(item))
            }
            None => Ok(None),
        }
    }

    async fn remove(&self, collection: &str, address: &str) -> Result<()> {
        let collection = collection.to_string();
        let address = address.to_string();
        let mutation = delete(TABLE, SpannerKey::composite(&[&collection, &address]));

        self.inner
            .apply(vec![mutation])
            .await
            .context("Failed to delete item from Spanner")?;

        tracing::debug!(collection = %collection, key = %address, "Deleted item");
        Ok(())
    }

    async fn read_many(&self, collection: &str, limit: usize) -> Result<Vec<Item>> {
        let mut statement = Statement::new(&format!(
            "SELECT data FROM {} WHERE collection = @collection LIMIT {}",
            TABLE, limit
        ));
        statement.add_param("collection", &collection.to_string());

        let mut tx = self
            .inner
            .single()
            .await
            .context("Failed to create read transaction for scan")?;

        let mut result_set = tx
            .query(statement)
            .await
            .context("Failed to execute scan query")?;

        let mut items = Vec::new();
        while let Some(row) = result_set.next().await? {
            let data: String = row.column_by_name("data")?;
            items.push(serde_json::from_str(&data).context("Failed to deserialize item")?);
        }

        tracing::debug!(collection = %collection, count = items.len(), "Scanned items");
        Ok(items)
    }

    /// Lightweight `SELECT 1` round trip.
    async fn ping(&self) -> Result<()> {
        let statement = Statement::new("SELECT 1");

        let mut tx = self
            .inner
            .single()
            .await
            .context("Failed to create health check transaction")?;

        let mut result_set = tx
            .query(statement)
            .await
            .context("Failed to execute health check query")?;

        if result_set.next().await?.is_some() {
            Ok(())
        } else {
            Err(anyhow::anyhow!("Health check query returned no results"))
        }
    }
}

#[async_trait]
impl StorePort for SpannerStore {
    async fn put(&self, collection: &str, item: Item) -> StoreResult<()> {
        let address = self.schema.encode(&item)?;
        self.upsert(collection, address, &item)
            .await
            .map_err(StoreError::Unavailable)
    }

    async fn get(&self, collection: &str, key: &Key) -> StoreResult<Item> {
        let address = self.schema.encode(key)?;
        let found = self
            .read(collection, &address)
            .await
            .map_err(StoreError::Unavailable)?;
        found.ok_or(StoreError::NotFound(address))
    }

    async fn delete(&self, collection: &str, key: &Key) -> StoreResult<()> {
        let address = self.schema.encode(key)?;
        self.remove(collection, &address)
            .await
            .map_err(StoreError::Unavailable)
    }

    async fn scan(&self, collection: &str, limit: i32) -> StoreResult<Vec<Item>> {
        let limit = check_scan_limit(limit)?;
        self.read_many(collection, limit)
            .await
            .map_err(StoreError::Unavailable)
    }

    async fn health(&self) -> StoreResult<()> {
        self.ping().await.map_err(StoreError::Unavailable)
    }
}

/// Connection to the admin API plus the resource paths it provisions.
///
/// Each resource is looked up and created only when the lookup answers
/// NOT_FOUND. Lets the emulator run with zero setup.
struct Provisioner<'a> {
    admin: AdminClient,
    config: &'a SpannerConfig,
    project_path: String,
    instance_path: String,
    database_path: String,
}

impl<'a> Provisioner<'a> {
    async fn connect(config: &'a SpannerConfig) -> Result<Self> {
        let admin = AdminClient::new(AdminClientConfig::default())
            .await
            .context("Failed to create Spanner admin client")?;

        let project_path = format!("projects/{}", config.project);
        let instance_path = format!("{}/instances/{}", project_path, config.instance);

        Ok(Self {
            admin,
            config,
            project_path,
            instance_path,
            database_path: config.database_path(),
        })
    }

    async fn run(&self) -> Result<()> {
        ensure("instance", &self.instance_path, self.has_instance(), self.create_instance()).await?;
        ensure("database", &self.database_path, self.has_database(), self.create_database()).await?;
        ensure("table", TABLE, self.has_table(), self.create_table()).await
    }

    async fn has_instance(&self) -> Result<bool> {
        let request = GetInstanceRequest {
            name: self.instance_path.clone(),
            field_mask: None,
        };
        present("instance", self.admin.instance().get_instance(request, None).await)
    }

    async fn create_instance(&self) -> Result<()> {
        // The emulator only accepts its own instance config.
        let instance_config = match self.config.emulator_host {
            Some(_) => "emulator-config",
            None => "regional-us-central1",
        };

        let request = CreateInstanceRequest {
            parent: self.project_path.clone(),
            instance_id: self.config.instance.clone(),
            instance: Some(Instance {
                name: self.instance_path.clone(),
                config: format!("{}/instanceConfigs/{}", self.project_path, instance_config),
                display_name: format!("{} instance", self.config.instance),
                node_count: 1,
                ..Default::default()
            }),
        };

        self.admin
            .instance()
            .create_instance(request, None)
            .await?
            .wait(None)
            .await?;
        Ok(())
    }

    async fn has_database(&self) -> Result<bool> {
        let request = GetDatabaseRequest {
            name: self.database_path.clone(),
        };
        present("database", self.admin.database().get_database(request, None).await)
    }

    async fn create_database(&self) -> Result<()> {
        let request = CreateDatabaseRequest {
            parent: self.instance_path.clone(),
            create_statement: format!("CREATE DATABASE `{}`", self.config.database),
            extra_statements: vec![],
            encryption_config: None,
            database_dialect: 1, // Google Standard SQL
            proto_descriptors: vec![],
        };

        self.admin
            .database()
            .create_database(request, None)
            .await?
            .wait(None)
            .await?;
        Ok(())
    }

    async fn has_table(&self) -> Result<bool> {
        let request = GetDatabaseDdlRequest {
            database: self.database_path.clone(),
        };
        let ddl = self
            .admin
            .database()
            .get_database_ddl(request, None)
            .await
            .context("Failed to get database DDL")?;

        Ok(ddl
            .into_inner()
            .statements
            .iter()
            .any(|stmt| defines_table(stmt)))
    }

    async fn create_table(&self) -> Result<()> {
        let request = UpdateDatabaseDdlRequest {
            database: self.database_path.clone(),
            statements: vec![table_ddl()],
            operation_id: String::new(),
            proto_descriptors: vec![],
            throughput_mode: false,
        };

        self.admin
            .database()
            .update_database_ddl(request, None)
            .await?
            .wait(None)
            .await?;
        Ok(())
    }
}

/// Create a resource unless the lookup says it is already there.
///
/// Both futures are lazy; `create` is only polled when `exists` is false.
async fn ensure(
    kind: &str,
    name: &str,
    exists: impl Future<Output = Result<bool>>,
    create: impl Future<Output = Result<()>>,
) -> Result<()> {
    if exists.await? {
        tracing::info!(kind, name, "Spanner resource already exists");
        return Ok(());
    }

    tracing::info!(kind, name, "Spanner resource not found, creating");
    create
        .await
        .with_context(|| format!("Failed to create {} {}", kind, name))?;
    tracing::info!(kind, name, "Spanner resource created");
    Ok(())
}

/// NOT_FOUND from an admin lookup means absent; any other status is an error.
fn present<T>(kind: &str, lookup: std::result::Result<T, Status>) -> Result<bool> {
    match lookup {
        Ok(_) => Ok(true),
        Err(status) if status.code() == Code::NotFound => Ok(false),
        Err(status) => Err(anyhow::anyhow!(
            "Failed to check {} existence: {}",
            kind,
            status.message()
        )),
    }
}

fn defines_table(statement: &str) -> bool {
    let statement = statement.trim_start();
    statement.starts_with(&format!("CREATE TABLE {} ", TABLE))
        || statement.starts_with(&format!("CREATE TABLE `{}` ", TABLE))
}

fn table_ddl() -> String {
    format!(
        "CREATE TABLE {} (
    collection STRING(MAX) NOT NULL,
    item_key STRING(MAX) NOT NULL,
    data STRING(MAX) NOT NULL,
    created_at TIMESTAMP NOT NULL OPTIONS (allow_commit_timestamp=true),
    updated_at TIMESTAMP NOT NULL OPTIONS (allow_commit_timestamp=true),
) PRIMARY KEY (collection, item_key)",
        TABLE
    )
}
