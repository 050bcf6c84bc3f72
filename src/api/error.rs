//! HTTP error mapping.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::auth::AuthError;
use crate::services::LoyaltyError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Loyalty(#[from] LoyaltyError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedPayload(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::MalformedPayload(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Loyalty(LoyaltyError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Loyalty(LoyaltyError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Loyalty(LoyaltyError::Conflict(_)) => StatusCode::CONFLICT,
            ApiError::Loyalty(LoyaltyError::Storage(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Auth(AuthError::MissingCredentials) => StatusCode::UNAUTHORIZED,
            ApiError::Auth(AuthError::InvalidCredentials) => StatusCode::FORBIDDEN,
            ApiError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, "request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
