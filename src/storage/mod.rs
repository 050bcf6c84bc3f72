//! Storage implementations.

use std::sync::Arc;

use tracing::info;

use crate::config::{StorageConfig, StorageType};
use crate::interfaces::{CustomerStore, PurchaseHistory, SettingsStore};

pub mod helpers;
pub mod memory;
#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub mod schema;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::MemoryStore;

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteCustomerStore, SqliteSettingsStore};

#[cfg(feature = "postgres")]
pub use postgres::{PostgresCustomerStore, PostgresSettingsStore};

/// The store handles the service runs on.
///
/// One backend usually implements several traits; the handles then point at
/// the same underlying pool or map.
#[derive(Clone)]
pub struct Stores {
    pub customers: Arc<dyn CustomerStore>,
    pub history: Arc<dyn PurchaseHistory>,
    pub settings: Arc<dyn SettingsStore>,
}

impl Stores {
    /// Fresh in-memory stores.
    pub fn memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            customers: store.clone(),
            history: store.clone(),
            settings: store,
        }
    }
}

/// Initialize storage based on configuration.
///
/// Creates missing tables for SQL backends.
pub async fn init_storage(config: &StorageConfig) -> Result<Stores, Box<dyn std::error::Error>> {
    match config.storage_type {
        StorageType::Memory => {
            info!("Storage: memory (data is lost on shutdown)");
            Ok(Stores::memory())
        }
        #[cfg(feature = "sqlite")]
        StorageType::Sqlite => {
            use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

            let path = config.sqlite.path.as_str();
            info!("Storage: sqlite at {}", path);

            let in_memory = path == ":memory:";
            if !in_memory {
                if let Some(parent) = std::path::Path::new(path).parent() {
                    std::fs::create_dir_all(parent)?;
                }
            }

            let options = SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .foreign_keys(true);
            // Every connection to :memory: opens a separate database
            let max_connections = if in_memory { 1 } else { 5 };
            let pool = SqlitePoolOptions::new()
                .max_connections(max_connections)
                .connect_with(options)
                .await?;

            let customers = Arc::new(SqliteCustomerStore::new(pool.clone()));
            customers.init().await?;

            let settings = Arc::new(SqliteSettingsStore::new(pool));
            settings.init().await?;

            Ok(Stores {
                customers: customers.clone(),
                history: customers,
                settings,
            })
        }
        #[cfg(not(feature = "sqlite"))]
        StorageType::Sqlite => {
            tracing::error!("SQLite storage requested but 'sqlite' feature is not enabled");
            Err("SQLite feature not enabled".into())
        }
        #[cfg(feature = "postgres")]
        StorageType::Postgres => {
            use sqlx::postgres::PgPoolOptions;

            info!("Storage: postgres");

            let pool = PgPoolOptions::new()
                .max_connections(config.postgres.max_connections)
                .connect(&config.postgres.uri)
                .await?;

            let customers = Arc::new(PostgresCustomerStore::new(pool.clone()));
            customers.init().await?;

            let settings = Arc::new(PostgresSettingsStore::new(pool));
            settings.init().await?;

            Ok(Stores {
                customers: customers.clone(),
                history: customers,
                settings,
            })
        }
        #[cfg(not(feature = "postgres"))]
        StorageType::Postgres => {
            tracing::error!("PostgreSQL storage requested but 'postgres' feature is not enabled");
            Err("PostgreSQL feature not enabled".into())
        }
    }
}
