//! Reward policy and access control configuration.

use serde::Deserialize;

use crate::ledger::DEFAULT_THRESHOLD;

/// Contact phone shown on cards until an admin sets one.
pub const DEFAULT_CONTACT_PHONE: &str = "+7 (999) 123-45-67";

/// Loyalty program configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoyaltyConfig {
    /// Purchases required before a free coffee.
    pub threshold: u32,
    /// Fallback for the contact phone setting.
    pub default_contact_phone: String,
}

impl Default for LoyaltyConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            default_contact_phone: DEFAULT_CONTACT_PHONE.to_string(),
        }
    }
}

/// Admin access configuration.
///
/// Without a token every request is treated as admin.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Bearer token required on admin endpoints.
    pub admin_token: Option<String>,
}
