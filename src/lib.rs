//! Coffeemania - coffee shop loyalty cards
//!
//! Every sixth paid coffee earns a free one. Card holders register, baristas
//! record visits, and the counter resets when the free coffee is redeemed.

pub mod api;
pub mod auth;
pub mod config;
pub mod interfaces;
pub mod ledger;
pub mod services;
pub mod storage;
pub mod utils;
