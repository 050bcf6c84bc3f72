//! PostgreSQL SettingsStore implementation.

use async_trait::async_trait;
use sea_query::{Expr, OnConflict, PostgresQueryBuilder, Query};
use sea_query_binder::SqlxBinder;
use sqlx::{PgPool, Row};

use crate::interfaces::{Result, SettingsStore};
use crate::storage::schema::Settings;

/// PostgreSQL implementation of SettingsStore.
pub struct PostgresSettingsStore {
    pool: PgPool,
}

impl PostgresSettingsStore {
    /// Create a new PostgreSQL settings store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the settings table if it doesn't exist.
    pub async fn init(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS settings (
                key VARCHAR(100) PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for PostgresSettingsStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let (sql, values) = Query::select()
            .column(Settings::Value)
            .from(Settings::Table)
            .and_where(Expr::col(Settings::Key).eq(key))
            .build_sqlx(PostgresQueryBuilder);

        let row = sqlx::query_with(&sql, values)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| r.try_get("value")).transpose().map_err(Into::into)
    }

    async fn set(&self, key: &str, value: &str, now: &str) -> Result<()> {
        let (sql, values) = Query::insert()
            .into_table(Settings::Table)
            .columns([Settings::Key, Settings::Value, Settings::UpdatedAt])
            .values_panic([key.into(), value.into(), now.into()])
            .on_conflict(
                OnConflict::column(Settings::Key)
                    .update_columns([Settings::Value, Settings::UpdatedAt])
                    .to_owned(),
            )
            .build_sqlx(PostgresQueryBuilder);

        sqlx::query_with(&sql, values).execute(&self.pool).await?;
        Ok(())
    }
}
