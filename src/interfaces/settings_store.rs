//! Settings storage interface.

use async_trait::async_trait;

use super::customer_store::Result;

/// Key of the contact phone shown on customer cards.
pub const CONTACT_PHONE_KEY: &str = "barista_phone";

/// Interface for key-value settings.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Retrieve a setting. Returns `None` if unset.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or replace a setting.
    async fn set(&self, key: &str, value: &str, now: &str) -> Result<()>;
}
