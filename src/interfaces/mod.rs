//! Abstract interfaces for coffeemania storage.
//!
//! These traits define the contracts for:
//! - Customer storage (cards and purchase counters)
//! - Purchase history (append-only redemption log)
//! - Settings (contact phone)

pub mod customer_store;
pub mod purchase_history;
pub mod settings_store;

pub use customer_store::{
    Customer, CustomerStore, LoyaltyStats, NewCustomer, PurchaseOutcome, Result, StoreError,
};
pub use purchase_history::{PurchaseEvent, PurchaseHistory};
pub use settings_store::{SettingsStore, CONTACT_PHONE_KEY};
