//! Session and role guard.
//!
//! # Responsibilities
//! - Resolve the request's session token to a live, enabled user
//! - Enforce exact role membership
//!
//! # Design Decisions
//! - Read-only: never creates, extends or deletes sessions
//! - Absent, unknown, expired and disabled all collapse to `UNAUTHORIZED`
//! - Store failures propagate as `INTERNAL`, never as a denial

use std::sync::Arc;

use axum::http::HeaderMap;

use crate::auth::session::{now_unix, SessionStore};
use crate::auth::token::TokenSource;
use crate::auth::user::{Role, UserIdentity};
use crate::error::AccessError;

/// Resolves sessions for incoming requests.
#[derive(Clone)]
pub struct SessionGuard {
    store: Arc<dyn SessionStore>,
    tokens: Arc<dyn TokenSource>,
}

impl SessionGuard {
    pub fn new(store: Arc<dyn SessionStore>, tokens: Arc<dyn TokenSource>) -> Self {
        Self { store, tokens }
    }

    /// Token presented by the request, if any.
    pub fn token(&self, headers: &HeaderMap) -> Option<String> {
        self.tokens.current_token(headers)
    }

    /// Resolve the caller's session to a user identity.
    pub async fn require_session(&self, headers: &HeaderMap) -> Result<UserIdentity, AccessError> {
        let token = self.token(headers);
        self.resolve_at(token.as_deref(), now_unix()).await
    }

    /// Resolve an explicit token against the given clock reading.
    pub async fn resolve_at(&self, token: Option<&str>, now: u64) -> Result<UserIdentity, AccessError> {
        let Some(token) = token else {
            tracing::debug!("No session token presented");
            return Err(AccessError::Unauthorized);
        };

        let record = match self.store.lookup_session_by_token(token).await? {
            Some(record) => record,
            None => {
                tracing::debug!("Unknown session token");
                return Err(AccessError::Unauthorized);
            }
        };

        if record.is_expired_at(now) {
            tracing::debug!(user_id = %record.user.id, expires_at = record.expires_at, "Session expired");
            return Err(AccessError::Unauthorized);
        }

        if record.user.is_disabled {
            tracing::info!(user_id = %record.user.id, "Rejected session of disabled user");
            return Err(AccessError::Unauthorized);
        }

        Ok(record.user)
    }
}

/// Fails with `FORBIDDEN` unless `role` is one of `allowed`.
pub fn require_role(role: Role, allowed: &[Role]) -> Result<(), AccessError> {
    if allowed.contains(&role) {
        Ok(())
    } else {
        tracing::debug!(role = %role, allowed = ?allowed, "Role not permitted");
        Err(AccessError::Forbidden)
    }
}
