//! Loyalty service.
//!
//! The single entry point HTTP handlers use. Validates input, assigns ids
//! and timestamps, and delegates to the stores. The counter transition
//! itself is decided by the [`Ledger`] inside the store's transaction.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::LoyaltyConfig;
use crate::interfaces::{
    Customer, CustomerStore, LoyaltyStats, NewCustomer, PurchaseEvent, PurchaseHistory,
    PurchaseOutcome, SettingsStore, StoreError, CONTACT_PHONE_KEY,
};
use crate::ledger::Ledger;
use crate::storage::helpers::now_timestamp;
use crate::storage::Stores;

use super::ids::generate_customer_id;

/// Longest accepted customer name, in characters.
pub const MAX_NAME_LEN: usize = 255;
/// Longest accepted phone number, in characters.
pub const MAX_PHONE_LEN: usize = 50;
/// Shorter search queries return no results.
pub const MIN_SEARCH_LEN: usize = 2;

pub mod errmsg {
    pub const NAME_REQUIRED: &str = "Name is required";
    pub const PHONE_REQUIRED: &str = "Phone is required";
    pub const NAME_TOO_LONG: &str = "Name is too long";
    pub const PHONE_TOO_LONG: &str = "Phone is too long";
}

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, LoyaltyError>;

/// Errors surfaced to callers of the loyalty service.
#[derive(Debug, thiserror::Error)]
pub enum LoyaltyError {
    #[error("{0}")]
    Validation(String),

    #[error("Customer not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Storage failure: {0}")]
    Storage(String),
}

impl From<StoreError> for LoyaltyError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { id } => LoyaltyError::NotFound(id),
            StoreError::Conflict(msg) => LoyaltyError::Conflict(msg),
            other => LoyaltyError::Storage(other.to_string()),
        }
    }
}

/// Trimmed, length-checked name and phone.
fn validate_contact(name: &str, phone: &str) -> Result<(String, String)> {
    let name = name.trim();
    let phone = phone.trim();

    if name.is_empty() {
        return Err(LoyaltyError::Validation(errmsg::NAME_REQUIRED.to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(LoyaltyError::Validation(errmsg::NAME_TOO_LONG.to_string()));
    }
    validate_phone(phone)?;

    Ok((name.to_string(), phone.to_string()))
}

fn validate_phone(phone: &str) -> Result<()> {
    if phone.is_empty() {
        return Err(LoyaltyError::Validation(errmsg::PHONE_REQUIRED.to_string()));
    }
    if phone.chars().count() > MAX_PHONE_LEN {
        return Err(LoyaltyError::Validation(errmsg::PHONE_TOO_LONG.to_string()));
    }
    Ok(())
}

/// Loyalty card operations over the configured stores.
pub struct LoyaltyService {
    customers: Arc<dyn CustomerStore>,
    history: Arc<dyn PurchaseHistory>,
    settings: Arc<dyn SettingsStore>,
    ledger: Ledger,
    default_contact_phone: String,
}

impl LoyaltyService {
    pub fn new(stores: Stores, config: &LoyaltyConfig) -> Self {
        Self {
            customers: stores.customers,
            history: stores.history,
            settings: stores.settings,
            ledger: Ledger::new(config.threshold),
            default_contact_phone: config.default_contact_phone.clone(),
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Register a new card holder.
    pub async fn register(&self, name: &str, phone: &str) -> Result<Customer> {
        let (name, phone) = validate_contact(name, phone)?;

        let customer = self
            .customers
            .create(NewCustomer {
                id: generate_customer_id(),
                name,
                phone,
                created_at: now_timestamp(),
            })
            .await?;

        info!(customer_id = %customer.id, "customer registered");
        Ok(customer)
    }

    pub async fn customer(&self, id: &str) -> Result<Customer> {
        self.customers
            .get(id)
            .await?
            .ok_or_else(|| LoyaltyError::NotFound(id.to_string()))
    }

    pub async fn customers(&self) -> Result<Vec<Customer>> {
        Ok(self.customers.list().await?)
    }

    /// Search by name or phone fragment. Queries under two characters match nothing.
    pub async fn search(&self, query: &str) -> Result<Vec<Customer>> {
        let query = query.trim();
        if query.chars().count() < MIN_SEARCH_LEN {
            return Ok(Vec::new());
        }
        Ok(self.customers.search(query).await?)
    }

    pub async fn update_customer(&self, id: &str, name: &str, phone: &str) -> Result<Customer> {
        let (name, phone) = validate_contact(name, phone)?;
        let customer = self
            .customers
            .update(id, &name, &phone, &now_timestamp())
            .await?;
        info!(customer_id = %id, "customer updated");
        Ok(customer)
    }

    pub async fn delete_customer(&self, id: &str) -> Result<()> {
        self.customers.delete(id).await?;
        info!(customer_id = %id, "customer deleted");
        Ok(())
    }

    /// Admin correction: zero the counter without touching history.
    pub async fn reset_purchases(&self, id: &str) -> Result<()> {
        self.customers.reset_purchases(id, &now_timestamp()).await?;
        info!(customer_id = %id, "purchase counter reset");
        Ok(())
    }

    /// Record one redemption event for a card.
    pub async fn record_purchase(&self, id: &str) -> Result<PurchaseOutcome> {
        let outcome = self
            .customers
            .record_purchase(id, &self.ledger, &now_timestamp())
            .await?;

        let t = &outcome.transition;
        if t.reward_granted {
            info!(customer_id = %id, "free coffee granted, counter reset");
        } else if t.reward_ready {
            info!(customer_id = %id, count = t.new_count, "card full, next visit is free");
        } else {
            debug!(customer_id = %id, count = t.new_count, "purchase recorded");
        }

        Ok(outcome)
    }

    /// Redemption history, newest first.
    pub async fn history(&self, id: &str) -> Result<Vec<PurchaseEvent>> {
        // Unknown ids are an error rather than an empty list
        self.customer(id).await?;
        Ok(self.history.history(id).await?)
    }

    pub async fn stats(&self) -> Result<LoyaltyStats> {
        Ok(self.customers.stats(self.ledger.threshold()).await?)
    }

    /// Contact phone shown on cards, falling back to the configured default.
    pub async fn contact_phone(&self) -> Result<String> {
        Ok(self
            .settings
            .get(CONTACT_PHONE_KEY)
            .await?
            .unwrap_or_else(|| self.default_contact_phone.clone()))
    }

    pub async fn set_contact_phone(&self, phone: &str) -> Result<()> {
        let phone = phone.trim();
        validate_phone(phone)?;
        self.settings
            .set(CONTACT_PHONE_KEY, phone, &now_timestamp())
            .await?;
        info!("contact phone updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::PurchaseAction;

    fn service() -> LoyaltyService {
        LoyaltyService::new(Stores::memory(), &LoyaltyConfig::default())
    }

    #[tokio::test]
    async fn test_register_trims_and_assigns_id() {
        let svc = service();
        let c = svc.register("  Anna ", " +100 ").await.unwrap();
        assert_eq!(c.name, "Anna");
        assert_eq!(c.phone, "+100");
        assert_eq!(c.id.len(), 10);
        assert_eq!(c.purchase_count, 0);
    }

    #[tokio::test]
    async fn test_register_validation() {
        let svc = service();
        assert!(matches!(
            svc.register("", "+1").await,
            Err(LoyaltyError::Validation(_))
        ));
        assert!(matches!(
            svc.register("Anna", "   ").await,
            Err(LoyaltyError::Validation(_))
        ));
        let long_name = "x".repeat(MAX_NAME_LEN + 1);
        assert!(matches!(
            svc.register(&long_name, "+1").await,
            Err(LoyaltyError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_phone_conflicts() {
        let svc = service();
        svc.register("Anna", "+100").await.unwrap();
        assert!(matches!(
            svc.register("Boris", "+100").await,
            Err(LoyaltyError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_full_reward_cycle() {
        let svc = service();
        let c = svc.register("Anna", "+100").await.unwrap();

        for expected in 1..=6 {
            let outcome = svc.record_purchase(&c.id).await.unwrap();
            assert_eq!(outcome.customer.purchase_count, expected);
            assert_eq!(outcome.transition.reward_ready, expected == 6);
            assert!(!outcome.transition.reward_granted);
        }

        let outcome = svc.record_purchase(&c.id).await.unwrap();
        assert!(outcome.transition.reward_granted);
        assert_eq!(outcome.customer.purchase_count, 0);
        assert_eq!(outcome.event.action, PurchaseAction::FreeCoffee);

        let history = svc.history(&c.id).await.unwrap();
        assert_eq!(history.len(), 7);
        assert_eq!(history[0].action, PurchaseAction::FreeCoffee);
        assert!(history[1..].iter().all(|e| e.action == PurchaseAction::Purchase));

        let stats = svc.stats().await.unwrap();
        assert_eq!(stats.rewards_granted, 1);
        assert_eq!(stats.total_purchases, 0);
    }

    #[tokio::test]
    async fn test_unknown_customer_not_found() {
        let svc = service();
        assert!(matches!(
            svc.record_purchase("missing").await,
            Err(LoyaltyError::NotFound(_))
        ));
        assert!(matches!(
            svc.history("missing").await,
            Err(LoyaltyError::NotFound(_))
        ));
        assert!(matches!(
            svc.delete_customer("missing").await,
            Err(LoyaltyError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_short_search_returns_nothing() {
        let svc = service();
        svc.register("Anna", "+100").await.unwrap();
        assert!(svc.search("a").await.unwrap().is_empty());
        assert_eq!(svc.search("an").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reset_keeps_history() {
        let svc = service();
        let c = svc.register("Anna", "+100").await.unwrap();
        svc.record_purchase(&c.id).await.unwrap();
        svc.record_purchase(&c.id).await.unwrap();

        svc.reset_purchases(&c.id).await.unwrap();

        assert_eq!(svc.customer(&c.id).await.unwrap().purchase_count, 0);
        assert_eq!(svc.history(&c.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_contact_phone_defaults_then_overrides() {
        let svc = service();
        assert_eq!(svc.contact_phone().await.unwrap(), "+7 (999) 123-45-67");

        svc.set_contact_phone(" +1 555 0100 ").await.unwrap();
        assert_eq!(svc.contact_phone().await.unwrap(), "+1 555 0100");

        assert!(matches!(
            svc.set_contact_phone("").await,
            Err(LoyaltyError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_custom_threshold_from_config() {
        let config = LoyaltyConfig {
            threshold: 2,
            ..Default::default()
        };
        let svc = LoyaltyService::new(Stores::memory(), &config);
        let c = svc.register("Anna", "+100").await.unwrap();

        svc.record_purchase(&c.id).await.unwrap();
        assert!(svc.record_purchase(&c.id).await.unwrap().transition.reward_ready);
        assert_eq!(svc.stats().await.unwrap().ready_for_free_coffee, 1);
        assert!(svc.record_purchase(&c.id).await.unwrap().transition.reward_granted);
    }
}
