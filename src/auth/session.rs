//! Session records and the store the guard reads them from.

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::auth::user::UserIdentity;
use crate::error::StoreError;

/// A live session as returned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// The owning user, as currently stored.
    pub user: UserIdentity,
    /// Expiry timestamp (seconds since epoch).
    pub expires_at: u64,
}

impl SessionRecord {
    /// A session is expired once `now` reaches `expires_at`.
    pub fn is_expired_at(&self, now: u64) -> bool {
        self.expires_at <= now
    }
}

/// Session persistence owned by the authentication subsystem.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Look up a session by its opaque token.
    async fn lookup_session_by_token(&self, token: &str) -> Result<Option<SessionRecord>, StoreError>;

    /// Destroy a session. Deleting an unknown token is not an error.
    async fn delete_session_by_token(&self, token: &str) -> Result<(), StoreError>;
}

/// Current Unix timestamp in seconds.
pub fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::user::{Role, UserId};

    fn record(expires_at: u64) -> SessionRecord {
        SessionRecord {
            user: UserIdentity {
                id: UserId::new("u1"),
                email: "u1@example.com".into(),
                role: Role::Member,
                is_disabled: false,
            },
            expires_at,
        }
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let s = record(1_000);
        assert!(!s.is_expired_at(999));
        assert!(s.is_expired_at(1_000));
        assert!(s.is_expired_at(1_001));
    }

    #[test]
    fn far_future_session_is_live() {
        assert!(!record(now_unix() + 3600).is_expired_at(now_unix()));
        assert!(record(0).is_expired_at(now_unix()));
    }
}
