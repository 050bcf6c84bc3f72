//! Purchase history interface.

use async_trait::async_trait;
use serde::Serialize;

use super::customer_store::Result;
use crate::ledger::PurchaseAction;

/// One entry of the append-only redemption log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseEvent {
    pub id: i64,
    pub customer_id: String,
    pub timestamp: String,
    pub action: PurchaseAction,
}

/// Read side of the purchase history log.
///
/// Events are appended only by `CustomerStore::record_purchase` so that the
/// counter update and the log entry share a transaction.
#[async_trait]
pub trait PurchaseHistory: Send + Sync {
    /// Events for a customer, most recently recorded first.
    ///
    /// Order follows the sequence in which purchases were applied, not the
    /// caller-supplied timestamps.
    async fn history(&self, customer_id: &str) -> Result<Vec<PurchaseEvent>>;
}
