//! In-memory storage implementation.
//!
//! Keeps customers, history and settings in process. Selected with
//! `storage.type: memory`; also backs the HTTP and service tests. All state
//! sits behind one lock so a purchase's read-decide-write-log sequence is
//! atomic.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::interfaces::{
    Customer, CustomerStore, LoyaltyStats, NewCustomer, PurchaseEvent, PurchaseHistory,
    PurchaseOutcome, Result, SettingsStore, StoreError,
};
use crate::ledger::{Ledger, PurchaseAction};


#[derive(Default)]
struct State {
    customers: HashMap<String, Customer>,
    /// Insertion order per customer id, used to break created_at ties.
    insertion: HashMap<String, u64>,
    next_insertion: u64,
    history: Vec<PurchaseEvent>,
    next_event_id: i64,
    settings: HashMap<String, String>,
}

impl State {
    fn phone_taken(&self, phone: &str, except_id: Option<&str>) -> bool {
        self.customers
            .values()
            .any(|c| c.phone == phone && Some(c.id.as_str()) != except_id)
    }

    /// Customers matching `filter`, newest first.
    fn collect_newest_first(&self, filter: impl Fn(&Customer) -> bool) -> Vec<Customer> {
        let mut matched: Vec<&Customer> = self.customers.values().filter(|c| filter(c)).collect();
        matched.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| self.insertion.get(&b.id).cmp(&self.insertion.get(&a.id)))
        });
        matched.into_iter().cloned().collect()
    }
}

/// In-memory store implementing every storage interface.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of history rows across all customers.
    pub async fn history_len(&self) -> usize {
        self.state.read().await.history.len()
    }
}

#[async_trait]
impl CustomerStore for MemoryStore {
    async fn create(&self, customer: NewCustomer) -> Result<Customer> {
        let mut state = self.state.write().await;

        if state.phone_taken(&customer.phone, None) {
            return Err(StoreError::duplicate_phone(&customer.phone));
        }
        if state.customers.contains_key(&customer.id) {
            return Err(StoreError::Conflict(format!(
                "customer id {} already exists",
                customer.id
            )));
        }

        let record = Customer {
            id: customer.id,
            name: customer.name,
            phone: customer.phone,
            purchase_count: 0,
            created_at: customer.created_at.clone(),
            updated_at: customer.created_at,
        };

        let order = state.next_insertion;
        state.next_insertion += 1;
        state.insertion.insert(record.id.clone(), order);
        state.customers.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn get(&self, id: &str) -> Result<Option<Customer>> {
        Ok(self.state.read().await.customers.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Customer>> {
        Ok(self.state.read().await.collect_newest_first(|_| true))
    }

    async fn search(&self, query: &str) -> Result<Vec<Customer>> {
        let needle = query.to_lowercase();
        Ok(self.state.read().await.collect_newest_first(|c| {
            c.name.to_lowercase().contains(&needle) || c.phone.to_lowercase().contains(&needle)
        }))
    }

    async fn update(&self, id: &str, name: &str, phone: &str, now: &str) -> Result<Customer> {
        let mut state = self.state.write().await;

        if !state.customers.contains_key(id) {
            return Err(StoreError::not_found(id));
        }
        if state.phone_taken(phone, Some(id)) {
            return Err(StoreError::duplicate_phone(phone));
        }

        let customer = state
            .customers
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(id))?;
        customer.name = name.to_string();
        customer.phone = phone.to_string();
        customer.updated_at = now.to_string();
        Ok(customer.clone())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut state = self.state.write().await;

        if state.customers.remove(id).is_none() {
            return Err(StoreError::not_found(id));
        }
        state.insertion.remove(id);
        state.history.retain(|e| e.customer_id != id);
        Ok(())
    }

    async fn reset_purchases(&self, id: &str, now: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let customer = state
            .customers
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(id))?;
        customer.purchase_count = 0;
        customer.updated_at = now.to_string();
        Ok(())
    }

    async fn record_purchase(
        &self,
        id: &str,
        ledger: &Ledger,
        now: &str,
    ) -> Result<PurchaseOutcome> {
        let mut state = self.state.write().await;

        let customer = state
            .customers
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(id))?;

        let transition = ledger.record_purchase(customer.purchase_count);
        customer.purchase_count = transition.new_count;
        customer.updated_at = now.to_string();
        let customer = customer.clone();

        state.next_event_id += 1;
        let event = PurchaseEvent {
            id: state.next_event_id,
            customer_id: id.to_string(),
            timestamp: now.to_string(),
            action: transition.action,
        };
        state.history.push(event.clone());

        Ok(PurchaseOutcome {
            customer,
            transition,
            event,
        })
    }

    async fn stats(&self, threshold: u32) -> Result<LoyaltyStats> {
        let state = self.state.read().await;
        Ok(LoyaltyStats {
            total_customers: state.customers.len() as u64,
            total_purchases: state
                .customers
                .values()
                .map(|c| u64::from(c.purchase_count))
                .sum(),
            ready_for_free_coffee: state
                .customers
                .values()
                .filter(|c| c.purchase_count >= threshold)
                .count() as u64,
            rewards_granted: state
                .history
                .iter()
                .filter(|e| e.action == PurchaseAction::FreeCoffee)
                .count() as u64,
        })
    }
}

#[async_trait]
impl PurchaseHistory for MemoryStore {
    async fn history(&self, customer_id: &str) -> Result<Vec<PurchaseEvent>> {
        let state = self.state.read().await;
        let mut events: Vec<PurchaseEvent> = state
            .history
            .iter()
            .filter(|e| e.customer_id == customer_id)
            .cloned()
            .collect();
        events.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(events)
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.state.read().await.settings.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str, _now: &str) -> Result<()> {
        self.state
            .write()
            .await
            .settings
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
