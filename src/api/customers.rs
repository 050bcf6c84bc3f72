//! Customer, purchase and stats handlers.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::interfaces::{Customer, LoyaltyStats, PurchaseEvent};
use crate::ledger::PurchaseAction;

use super::error::ApiError;
use super::{ActionResponse, AdminAccess, AppState};

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub success: bool,
    pub customer_id: String,
    pub message: String,
}

/// Customer record plus whether the next visit is free.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerView {
    #[serde(flatten)]
    pub customer: Customer,
    pub reward_ready: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    pub success: bool,
    pub message: String,
    pub new_count: u32,
    pub reward_granted: bool,
    pub reward_ready: bool,
    pub action: PurchaseAction,
}

fn view(state: &AppState, customer: Customer) -> CustomerView {
    let reward_ready = state.service.ledger().is_reward_ready(customer.purchase_count);
    CustomerView {
        customer,
        reward_ready,
    }
}

// ============================================================================
// Public Handlers
// ============================================================================

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<ContactRequest>, JsonRejection>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let Json(req) = payload?;
    let customer = state.service.register(&req.name, &req.phone).await?;
    Ok(Json(RegisterResponse {
        success: true,
        customer_id: customer.id,
        message: "Customer registered successfully".to_string(),
    }))
}

pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CustomerView>, ApiError> {
    let customer = state.service.customer(&id).await?;
    Ok(Json(view(&state, customer)))
}

pub async fn history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<PurchaseEvent>>, ApiError> {
    Ok(Json(state.service.history(&id).await?))
}

// ============================================================================
// Admin Handlers
// ============================================================================

pub async fn list_customers(
    State(state): State<AppState>,
    _admin: AdminAccess,
) -> Result<Json<Vec<CustomerView>>, ApiError> {
    let customers = state.service.customers().await?;
    Ok(Json(customers.into_iter().map(|c| view(&state, c)).collect()))
}

pub async fn search(
    State(state): State<AppState>,
    _admin: AdminAccess,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Vec<CustomerView>>, ApiError> {
    let Query(params) = params?;
    let customers = state.service.search(&params.q).await?;
    Ok(Json(customers.into_iter().map(|c| view(&state, c)).collect()))
}

pub async fn update_customer(
    State(state): State<AppState>,
    _admin: AdminAccess,
    Path(id): Path<String>,
    payload: Result<Json<ContactRequest>, JsonRejection>,
) -> Result<Json<CustomerView>, ApiError> {
    let Json(req) = payload?;
    let customer = state
        .service
        .update_customer(&id, &req.name, &req.phone)
        .await?;
    Ok(Json(view(&state, customer)))
}

pub async fn delete_customer(
    State(state): State<AppState>,
    _admin: AdminAccess,
    Path(id): Path<String>,
) -> Result<Json<ActionResponse>, ApiError> {
    state.service.delete_customer(&id).await?;
    Ok(Json(ActionResponse::ok("Customer deleted successfully")))
}

pub async fn reset_purchases(
    State(state): State<AppState>,
    _admin: AdminAccess,
    Path(id): Path<String>,
) -> Result<Json<ActionResponse>, ApiError> {
    state.service.reset_purchases(&id).await?;
    Ok(Json(ActionResponse::ok(
        "Customer purchases reset successfully",
    )))
}

pub async fn record_purchase(
    State(state): State<AppState>,
    _admin: AdminAccess,
    Path(id): Path<String>,
) -> Result<Json<PurchaseResponse>, ApiError> {
    let outcome = state.service.record_purchase(&id).await?;
    let t = outcome.transition;
    let message = if t.reward_granted {
        "Free coffee granted"
    } else {
        "Purchase added successfully"
    };
    Ok(Json(PurchaseResponse {
        success: true,
        message: message.to_string(),
        new_count: t.new_count,
        reward_granted: t.reward_granted,
        reward_ready: t.reward_ready,
        action: t.action,
    }))
}

pub async fn stats(
    State(state): State<AppState>,
    _admin: AdminAccess,
) -> Result<Json<LoyaltyStats>, ApiError> {
    Ok(Json(state.service.stats().await?))
}
