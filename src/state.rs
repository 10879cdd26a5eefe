use std::sync::Arc;

use anyhow::Context;

use crate::config::AppConfig;
use crate::storage::{Storage, StorageClient};
use crate::store::{PgStore, Store};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn StorageClient>,
}

impl AppState {
    /// Connects to Postgres, runs migrations and builds the S3 client.
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run migrations")?;

        let storage = Arc::new(
            Storage::new(
                &config.minio_endpoint,
                &config.minio_bucket,
                &config.minio_access_key,
                &config.minio_secret_key,
                "us-east-1",
                &config.storage_public_url,
            )
            .await?,
        ) as Arc<dyn StorageClient>;

        Ok(Self::from_parts(Arc::new(PgStore::new(db)), config, storage))
    }

    pub fn from_parts(
        store: Arc<dyn Store>,
        config: Arc<AppConfig>,
        storage: Arc<dyn StorageClient>,
    ) -> Self {
        Self {
            store,
            config,
            storage,
        }
    }

    /// In-memory store, recording object store, test JWT settings.
    #[cfg(test)]
    pub fn fake() -> Self {
        Self::fake_with(crate::testing::test_config())
    }

    #[cfg(test)]
    pub fn fake_with(config: AppConfig) -> Self {
        use crate::{store::memory::MemoryStore, testing::FakeStorage};

        Self::from_parts(
            Arc::new(MemoryStore::new()),
            Arc::new(config),
            Arc::new(FakeStorage::default()),
        )
    }
}
