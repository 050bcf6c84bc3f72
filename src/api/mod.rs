//! REST API.
//!
//! Endpoints (all under `/api`):
//! - `GET /api/health`: health check
//! - `POST /api/register`: register a card holder
//! - `GET /api/customer/:id`: card view, `PUT`/`DELETE` for admins
//! - `POST /api/customer/:id/reset`: admin counter reset
//! - `POST /api/purchase/:id`: admin: record a purchase or redeem the reward
//! - `GET /api/history/:id`: redemption history, newest first
//! - `GET /api/customers`, `GET /api/search?q=`: admin listings
//! - `GET /api/stats`: admin dashboard counters
//! - `GET`/`POST /api/barista-phone`: contact phone (`POST` is admin-only)

use std::future::Future;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{Method, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth::{Authenticator, Principal};
use crate::services::LoyaltyService;

pub mod customers;
pub mod error;
pub mod settings;


pub use error::ApiError;

/// Shared state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<LoyaltyService>,
    pub auth: Arc<dyn Authenticator>,
}

impl AppState {
    pub fn new(service: LoyaltyService, auth: Arc<dyn Authenticator>) -> Self {
        Self {
            service: Arc::new(service),
            auth,
        }
    }
}

/// Extractor that admits only requests the injected authenticator accepts.
pub struct AdminAccess(pub Principal);

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminAccess {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let principal = state.auth.authenticate(&parts.headers)?;
        Ok(AdminAccess(principal))
    }
}

/// Acknowledgement body for mutations without a richer result.
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}

impl ActionResponse {
    pub fn ok(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
        }
    }
}

/// Start the REST server on `address` and run until `shutdown` resolves.
///
/// When the port is 0, the OS assigns an ephemeral port. The actual bound
/// address is always logged so it can be discovered.
pub async fn serve<F>(
    state: AppState,
    address: &str,
    shutdown: F,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(address).await?;
    let local = listener.local_addr()?;
    info!(address = %local, "coffeemania REST API listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Build the axum router (separated for testing).
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/register", post(customers::register))
        .route(
            "/api/customer/:id",
            get(customers::get_customer)
                .put(customers::update_customer)
                .delete(customers::delete_customer),
        )
        .route("/api/customer/:id/reset", post(customers::reset_purchases))
        .route("/api/purchase/:id", post(customers::record_purchase))
        .route("/api/history/:id", get(customers::history))
        .route("/api/customers", get(customers::list_customers))
        .route("/api/search", get(customers::search))
        .route("/api/stats", get(customers::stats))
        .route(
            "/api/barista-phone",
            get(settings::get_contact_phone).post(settings::set_contact_phone),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}
