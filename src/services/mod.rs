//! Service layer between the HTTP API and storage.

pub mod ids;
pub mod loyalty;

pub use ids::generate_customer_id;
pub use loyalty::{LoyaltyError, LoyaltyService};
