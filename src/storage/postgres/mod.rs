//! PostgreSQL implementations of storage interfaces.

mod customer_store;
mod settings_store;

pub use customer_store::PostgresCustomerStore;
pub use settings_store::PostgresSettingsStore;
