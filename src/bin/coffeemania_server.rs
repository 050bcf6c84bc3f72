//! coffeemania-server: loyalty card REST service
//!
//! ## Architecture
//! ```text
//! [Web client] -> [REST API :1000] -> [LoyaltyService] -> [SQLite/Postgres/memory]
//! ```
//!
//! ## Configuration
//! - `--config <path>` or COFFEEMANIA_CONFIG: YAML config file
//! - COFFEEMANIA__SERVER__PORT, COFFEEMANIA__STORAGE__TYPE, ...: overrides
//! - COFFEEMANIA__AUTH__ADMIN_TOKEN: bearer token for admin endpoints
//! - COFFEEMANIA_LOG: tracing filter (default: info)

use tracing::{error, info};

use coffeemania::api::{self, AppState};
use coffeemania::auth;
use coffeemania::config::Config;
use coffeemania::services::LoyaltyService;
use coffeemania::storage::init_storage;
use coffeemania::utils::bootstrap::{init_tracing, parse_config_path, shutdown_signal};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config_path = parse_config_path();
    let config = Config::load(config_path.as_deref()).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        address = %config.server.bind_address(),
        storage = %config.storage.storage_type,
        threshold = config.loyalty.threshold,
        "starting coffeemania-server"
    );

    let stores = init_storage(&config.storage).await.map_err(|e| {
        error!("Failed to initialize storage: {}", e);
        e
    })?;

    let service = LoyaltyService::new(stores, &config.loyalty);
    let authenticator = auth::from_config(&config.auth);
    info!(mode = authenticator.mode(), "admin access control configured");

    let state = AppState::new(service, authenticator);
    api::serve(state, &config.server.bind_address(), shutdown_signal())
        .await
        .map_err(|e| -> Box<dyn std::error::Error> { e })?;

    info!("coffeemania-server stopped");
    Ok(())
}
