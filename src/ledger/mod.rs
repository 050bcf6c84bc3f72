//! Purchase ledger.
//!
//! Pure decision logic for the loyalty counter. Given a customer's current
//! purchase count, decides the next count and whether the call earned or
//! redeemed a reward. Persistence is the store's job; every transition maps
//! to exactly one history event carrying [`Transition::action`].
//!
//! Rewards are granted lazily: the purchase that reaches the threshold only
//! marks the card as ready, and the following call hands out the free
//! coffee and resets the counter to zero.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Purchases required before a free coffee is granted.
pub const DEFAULT_THRESHOLD: u32 = 6;

/// Kind of redemption event recorded in purchase history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseAction {
    /// A paid purchase that advanced the counter.
    Purchase,
    /// A reward redemption that reset the counter.
    FreeCoffee,
}

impl PurchaseAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseAction::Purchase => "purchase",
            PurchaseAction::FreeCoffee => "free_coffee",
        }
    }
}

impl fmt::Display for PurchaseAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a stored action string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown purchase action: {0}")]
pub struct UnknownAction(pub String);

impl FromStr for PurchaseAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "purchase" => Ok(PurchaseAction::Purchase),
            "free_coffee" => Ok(PurchaseAction::FreeCoffee),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}

/// Outcome of applying one redemption event to a counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Counter value before the call.
    pub previous: u32,
    /// Counter value after the call.
    pub new_count: u32,
    /// History event to append for this call.
    pub action: PurchaseAction,
    /// True when this call handed out the free coffee.
    pub reward_granted: bool,
    /// True when the counter now sits at the threshold and the next call grants.
    pub reward_ready: bool,
}

/// Counter state machine parameterized by the reward threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ledger {
    threshold: u32,
}

impl Default for Ledger {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl Ledger {
    /// Create a ledger with the given threshold.
    ///
    /// A zero threshold would grant a reward on every call; it is clamped to 1.
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
        }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Whether a card with `count` purchases gets a free coffee on its next call.
    pub fn is_reward_ready(&self, count: u32) -> bool {
        count >= self.threshold
    }

    /// Decide the transition for one redemption event.
    ///
    /// Counts above the threshold (left behind by older data or a lowered
    /// threshold) are treated as ready and reset like any full card.
    pub fn record_purchase(&self, current: u32) -> Transition {
        if self.is_reward_ready(current) {
            return Transition {
                previous: current,
                new_count: 0,
                action: PurchaseAction::FreeCoffee,
                reward_granted: true,
                reward_ready: false,
            };
        }

        let new_count = current + 1;
        Transition {
            previous: current,
            new_count,
            action: PurchaseAction::Purchase,
            reward_granted: false,
            reward_ready: self.is_reward_ready(new_count),
        }
    }
}
