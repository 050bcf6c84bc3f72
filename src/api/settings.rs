//! Contact phone handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::{ActionResponse, AdminAccess, AppState};

#[derive(Debug, Deserialize, Serialize)]
pub struct PhoneBody {
    #[serde(default)]
    pub phone: String,
}

pub async fn get_contact_phone(
    State(state): State<AppState>,
) -> Result<Json<PhoneBody>, ApiError> {
    let phone = state.service.contact_phone().await?;
    Ok(Json(PhoneBody { phone }))
}

pub async fn set_contact_phone(
    State(state): State<AppState>,
    _admin: AdminAccess,
    payload: Result<Json<PhoneBody>, JsonRejection>,
) -> Result<Json<ActionResponse>, ApiError> {
    let Json(body) = payload?;
    state.service.set_contact_phone(&body.phone).await?;
    Ok(Json(ActionResponse::ok("Phone updated successfully")))
}
