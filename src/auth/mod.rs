//! Admin access control.
//!
//! Admin-only endpoints ask an injected [`Authenticator`] whether the
//! request carries admin credentials. Which implementation runs is decided
//! once at startup from [`AuthConfig`].

use std::sync::Arc;

use http::header::AUTHORIZATION;
use http::HeaderMap;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::config::AuthConfig;

/// Identity established for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Principal {
    Admin,
}

/// Authentication failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Admin credentials required")]
    MissingCredentials,

    #[error("Invalid admin credentials")]
    InvalidCredentials,
}

/// Decides whether a request may use admin endpoints.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, headers: &HeaderMap) -> Result<Principal, AuthError>;

    /// Short label for startup logs.
    fn mode(&self) -> &'static str;
}

/// Accepts `Authorization: Bearer <token>` with a preconfigured token.
///
/// Only the SHA-256 digest of the token is kept; presented tokens are
/// hashed and compared digest to digest.
pub struct BearerTokenAuthenticator {
    digest: Vec<u8>,
}

impl BearerTokenAuthenticator {
    pub fn new(token: &str) -> Self {
        Self {
            digest: Sha256::digest(token.as_bytes()).to_vec(),
        }
    }
}

impl Authenticator for BearerTokenAuthenticator {
    fn authenticate(&self, headers: &HeaderMap) -> Result<Principal, AuthError> {
        let value = headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingCredentials)?;
        let token = value
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or(AuthError::InvalidCredentials)?;

        if Sha256::digest(token.as_bytes()).as_slice() == self.digest.as_slice() {
            Ok(Principal::Admin)
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    fn mode(&self) -> &'static str {
        "bearer-token"
    }
}

/// Admits every request as admin.
pub struct OpenAccess;

impl Authenticator for OpenAccess {
    fn authenticate(&self, _headers: &HeaderMap) -> Result<Principal, AuthError> {
        Ok(Principal::Admin)
    }

    fn mode(&self) -> &'static str {
        "open"
    }
}

/// Build the authenticator selected by configuration.
pub fn from_config(config: &AuthConfig) -> Arc<dyn Authenticator> {
    match config.admin_token.as_deref() {
        Some(token) => Arc::new(BearerTokenAuthenticator::new(token)),
        None => {
            warn!("No admin token configured; admin endpoints are open to everyone");
            Arc::new(OpenAccess)
        }
    }
}
