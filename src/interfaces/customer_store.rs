//! Customer storage interface.

use async_trait::async_trait;
use serde::Serialize;

use crate::ledger::{Ledger, Transition};

use super::purchase_history::PurchaseEvent;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Customer not found: {id}")]
    NotFound { id: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

#[cfg(any(feature = "sqlite", feature = "postgres"))]
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl StoreError {
    pub fn not_found(id: &str) -> Self {
        StoreError::NotFound { id: id.to_string() }
    }

    pub fn duplicate_phone(phone: &str) -> Self {
        StoreError::Conflict(format!("phone {} is already registered", phone))
    }
}

/// A loyalty card holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub purchase_count: u32,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields for a new customer row. Id and timestamps are assigned by the caller.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub created_at: String,
}

/// Result of an atomic purchase: the updated row, the ledger decision and
/// the history event appended for it.
#[derive(Debug, Clone)]
pub struct PurchaseOutcome {
    pub customer: Customer,
    pub transition: Transition,
    pub event: PurchaseEvent,
}

/// Aggregate counters for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoyaltyStats {
    pub total_customers: u64,
    /// Sum of current purchase counters across all cards.
    pub total_purchases: u64,
    pub ready_for_free_coffee: u64,
    /// Free coffees handed out over the lifetime of the store.
    pub rewards_granted: u64,
}

/// Interface for customer persistence.
///
/// Implementations:
/// - `MemoryStore`: in-process maps, for development and tests
/// - `SqliteCustomerStore`: SQLite storage
/// - `PostgresCustomerStore`: PostgreSQL storage
#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Insert a new customer.
    ///
    /// Fails with `Conflict` if the phone is already registered.
    async fn create(&self, customer: NewCustomer) -> Result<Customer>;

    /// Retrieve a customer by id.
    async fn get(&self, id: &str) -> Result<Option<Customer>>;

    /// All customers, newest first.
    async fn list(&self) -> Result<Vec<Customer>>;

    /// Customers whose name or phone contains `query`, case-insensitively, newest first.
    async fn search(&self, query: &str) -> Result<Vec<Customer>>;

    /// Replace name and phone.
    ///
    /// Fails with `NotFound` if the id is unknown and `Conflict` if the phone
    /// belongs to another customer.
    async fn update(&self, id: &str, name: &str, phone: &str, now: &str) -> Result<Customer>;

    /// Remove a customer together with its purchase history.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Set the purchase counter back to zero without logging an event.
    async fn reset_purchases(&self, id: &str, now: &str) -> Result<()>;

    /// Apply one redemption event atomically.
    ///
    /// Reads the counter under a lock, asks `ledger` for the transition,
    /// writes the new counter and appends the history event in a single
    /// transaction. Concurrent calls for the same customer are serialized.
    async fn record_purchase(&self, id: &str, ledger: &Ledger, now: &str)
        -> Result<PurchaseOutcome>;

    /// Dashboard counters. `threshold` decides which cards count as ready.
    async fn stats(&self, threshold: u32) -> Result<LoyaltyStats>;
}
