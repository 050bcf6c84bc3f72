//! SQLite implementations of storage interfaces.

mod customer_store;
mod settings_store;

pub use customer_store::SqliteCustomerStore;
pub use settings_store::SqliteSettingsStore;
