//! PostgreSQL CustomerStore and PurchaseHistory implementation.

use async_trait::async_trait;
use sea_query::{Expr, LockType, Order, PostgresQueryBuilder, Query};
use sea_query_binder::SqlxBinder;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};
use tracing::info;

use crate::interfaces::{
    Customer, CustomerStore, LoyaltyStats, NewCustomer, PurchaseEvent, PurchaseHistory,
    PurchaseOutcome, Result, StoreError,
};
use crate::ledger::{Ledger, PurchaseAction};
use crate::storage::helpers::{
    action_from_db, contains_pattern, is_phone_conflict, purchase_count_from_db, search_key,
};
use crate::storage::schema::{Customers, PurchaseHistory as History, CUSTOMER_COLUMNS};

/// PostgreSQL implementation of CustomerStore and PurchaseHistory.
pub struct PostgresCustomerStore {
    pool: PgPool,
}

impl PostgresCustomerStore {
    /// Create a new PostgreSQL customer store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create tables and indexes if they don't exist.
    pub async fn init(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS customers (
                id VARCHAR(50) PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                phone VARCHAR(50) NOT NULL,
                purchase_count BIGINT NOT NULL DEFAULT 0 CHECK (purchase_count >= 0),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                search_key TEXT NOT NULL DEFAULT '',
                CONSTRAINT customers_phone_key UNIQUE (phone)
            )",
        )
        .execute(&self.pool)
        .await?;
        self.ensure_search_key().await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS purchase_history (
                id BIGSERIAL PRIMARY KEY,
                customer_id VARCHAR(50) NOT NULL REFERENCES customers(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL,
                action VARCHAR(50) NOT NULL DEFAULT 'purchase'
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_purchase_history_customer
             ON purchase_history(customer_id, created_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Add and fill `search_key` on databases created before the column existed.
    async fn ensure_search_key(&self) -> Result<()> {
        sqlx::query(
            "ALTER TABLE customers ADD COLUMN IF NOT EXISTS search_key TEXT NOT NULL DEFAULT ''",
        )
        .execute(&self.pool)
        .await?;

        let rows = sqlx::query("SELECT id, name, phone FROM customers WHERE search_key = ''")
            .fetch_all(&self.pool)
            .await?;
        for row in &rows {
            let id: String = row.try_get("id")?;
            let name: String = row.try_get("name")?;
            let phone: String = row.try_get("phone")?;
            let (sql, values) = Query::update()
                .table(Customers::Table)
                .value(Customers::SearchKey, search_key(&name, &phone))
                .and_where(Expr::col(Customers::Id).eq(id))
                .build_sqlx(PostgresQueryBuilder);
            sqlx::query_with(&sql, values).execute(&self.pool).await?;
        }
        if !rows.is_empty() {
            info!(count = rows.len(), "backfilled customer search keys");
        }
        Ok(())
    }

    fn customer_from_row(row: &PgRow) -> Result<Customer> {
        Ok(Customer {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            phone: row.try_get("phone")?,
            purchase_count: purchase_count_from_db(row.try_get("purchase_count")?)?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    async fn fetch_customer(
        conn: &mut PgConnection,
        id: &str,
        lock: Option<LockType>,
    ) -> Result<Option<Customer>> {
        let mut select = Query::select();
        select
            .columns(CUSTOMER_COLUMNS)
            .from(Customers::Table)
            .and_where(Expr::col(Customers::Id).eq(id));
        if let Some(lock) = lock {
            select.lock(lock);
        }
        let (sql, values) = select.build_sqlx(PostgresQueryBuilder);

        let row = sqlx::query_with(&sql, values)
            .fetch_optional(&mut *conn)
            .await?;
        row.as_ref().map(Self::customer_from_row).transpose()
    }
}

#[async_trait]
impl CustomerStore for PostgresCustomerStore {
    async fn create(&self, customer: NewCustomer) -> Result<Customer> {
        let (sql, values) = Query::insert()
            .into_table(Customers::Table)
            .columns(CUSTOMER_COLUMNS.into_iter().chain([Customers::SearchKey]))
            .values_panic([
                customer.id.clone().into(),
                customer.name.clone().into(),
                customer.phone.clone().into(),
                0_i64.into(),
                customer.created_at.clone().into(),
                customer.created_at.clone().into(),
                search_key(&customer.name, &customer.phone).into(),
            ])
            .build_sqlx(PostgresQueryBuilder);

        sqlx::query_with(&sql, values)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_phone_conflict(&e) {
                    StoreError::duplicate_phone(&customer.phone)
                } else {
                    e.into()
                }
            })?;

        Ok(Customer {
            id: customer.id,
            name: customer.name,
            phone: customer.phone,
            purchase_count: 0,
            created_at: customer.created_at.clone(),
            updated_at: customer.created_at,
        })
    }

    async fn get(&self, id: &str) -> Result<Option<Customer>> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch_customer(&mut conn, id, None).await
    }

    async fn list(&self) -> Result<Vec<Customer>> {
        let (sql, values) = Query::select()
            .columns(CUSTOMER_COLUMNS)
            .from(Customers::Table)
            .order_by(Customers::CreatedAt, Order::Desc)
            .order_by(Customers::Id, Order::Asc)
            .build_sqlx(PostgresQueryBuilder);

        let rows = sqlx::query_with(&sql, values).fetch_all(&self.pool).await?;
        rows.iter().map(Self::customer_from_row).collect()
    }

    async fn search(&self, query: &str) -> Result<Vec<Customer>> {
        let rows = sqlx::query(
            "SELECT id, name, phone, purchase_count, created_at, updated_at
             FROM customers
             WHERE search_key LIKE $1 ESCAPE '\\'
             ORDER BY created_at DESC, id ASC",
        )
        .bind(contains_pattern(&query.to_lowercase()))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::customer_from_row).collect()
    }

    async fn update(&self, id: &str, name: &str, phone: &str, now: &str) -> Result<Customer> {
        let mut tx = self.pool.begin().await?;

        let (sql, values) = Query::update()
            .table(Customers::Table)
            .values([
                (Customers::Name, name.into()),
                (Customers::Phone, phone.into()),
                (Customers::UpdatedAt, now.into()),
                (Customers::SearchKey, search_key(name, phone).into()),
            ])
            .and_where(Expr::col(Customers::Id).eq(id))
            .build_sqlx(PostgresQueryBuilder);

        let result = sqlx::query_with(&sql, values)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_phone_conflict(&e) {
                    StoreError::duplicate_phone(phone)
                } else {
                    e.into()
                }
            })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(id));
        }

        let customer = Self::fetch_customer(&mut tx, id, None)
            .await?
            .ok_or_else(|| StoreError::not_found(id))?;
        tx.commit().await?;
        Ok(customer)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let (sql, values) = Query::delete()
            .from_table(History::Table)
            .and_where(Expr::col(History::CustomerId).eq(id))
            .build_sqlx(PostgresQueryBuilder);
        sqlx::query_with(&sql, values).execute(&mut *tx).await?;

        let (sql, values) = Query::delete()
            .from_table(Customers::Table)
            .and_where(Expr::col(Customers::Id).eq(id))
            .build_sqlx(PostgresQueryBuilder);
        let result = sqlx::query_with(&sql, values).execute(&mut *tx).await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(id));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn reset_purchases(&self, id: &str, now: &str) -> Result<()> {
        let (sql, values) = Query::update()
            .table(Customers::Table)
            .values([
                (Customers::PurchaseCount, 0_i64.into()),
                (Customers::UpdatedAt, now.into()),
            ])
            .and_where(Expr::col(Customers::Id).eq(id))
            .build_sqlx(PostgresQueryBuilder);

        let result = sqlx::query_with(&sql, values).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(id));
        }
        Ok(())
    }

    async fn record_purchase(
        &self,
        id: &str,
        ledger: &Ledger,
        now: &str,
    ) -> Result<PurchaseOutcome> {
        // Dropping the transaction without commit rolls it back.
        let mut tx = self.pool.begin().await?;

        // Row lock: a concurrent purchase blocks here until this transaction ends.
        let mut customer = Self::fetch_customer(&mut tx, id, Some(LockType::Update))
            .await?
            .ok_or_else(|| StoreError::not_found(id))?;

        let transition = ledger.record_purchase(customer.purchase_count);

        let (sql, values) = Query::update()
            .table(Customers::Table)
            .values([
                (Customers::PurchaseCount, i64::from(transition.new_count).into()),
                (Customers::UpdatedAt, now.into()),
            ])
            .and_where(Expr::col(Customers::Id).eq(id))
            .build_sqlx(PostgresQueryBuilder);
        sqlx::query_with(&sql, values).execute(&mut *tx).await?;

        let (sql, values) = Query::insert()
            .into_table(History::Table)
            .columns([History::CustomerId, History::CreatedAt, History::Action])
            .values_panic([id.into(), now.into(), transition.action.as_str().into()])
            .returning_col(History::Id)
            .build_sqlx(PostgresQueryBuilder);
        let event_id: i64 = sqlx::query_with(&sql, values)
            .fetch_one(&mut *tx)
            .await?
            .try_get(0)?;

        tx.commit().await?;

        customer.purchase_count = transition.new_count;
        customer.updated_at = now.to_string();

        Ok(PurchaseOutcome {
            event: PurchaseEvent {
                id: event_id,
                customer_id: id.to_string(),
                timestamp: now.to_string(),
                action: transition.action,
            },
            customer,
            transition,
        })
    }

    async fn stats(&self, threshold: u32) -> Result<LoyaltyStats> {
        let row = sqlx::query(
            "SELECT COUNT(*)::BIGINT AS total_customers,
                    COALESCE(SUM(purchase_count), 0)::BIGINT AS total_purchases,
                    COUNT(*) FILTER (WHERE purchase_count >= $1)::BIGINT AS ready
             FROM customers",
        )
        .bind(i64::from(threshold))
        .fetch_one(&self.pool)
        .await?;

        let rewards: i64 = sqlx::query_scalar(
            "SELECT COUNT(*)::BIGINT FROM purchase_history WHERE action = $1",
        )
        .bind(PurchaseAction::FreeCoffee.as_str())
        .fetch_one(&self.pool)
        .await?;

        let total_customers: i64 = row.try_get("total_customers")?;
        let total_purchases: i64 = row.try_get("total_purchases")?;
        let ready: i64 = row.try_get("ready")?;

        Ok(LoyaltyStats {
            total_customers: total_customers.max(0) as u64,
            total_purchases: total_purchases.max(0) as u64,
            ready_for_free_coffee: ready.max(0) as u64,
            rewards_granted: rewards.max(0) as u64,
        })
    }
}

#[async_trait]
impl PurchaseHistory for PostgresCustomerStore {
    async fn history(&self, customer_id: &str) -> Result<Vec<PurchaseEvent>> {
        let (sql, values) = Query::select()
            .columns([
                History::Id,
                History::CustomerId,
                History::CreatedAt,
                History::Action,
            ])
            .from(History::Table)
            .and_where(Expr::col(History::CustomerId).eq(customer_id))
            // Ids are assigned under the purchase lock; timestamps are not
            .order_by(History::Id, Order::Desc)
            .build_sqlx(PostgresQueryBuilder);

        let rows = sqlx::query_with(&sql, values).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|r| {
                let action: String = r.try_get("action")?;
                Ok(PurchaseEvent {
                    id: r.try_get("id")?,
                    customer_id: r.try_get("customer_id")?,
                    timestamp: r.try_get("created_at")?,
                    action: action_from_db(&action)?,
                })
            })
            .collect()
    }
}
