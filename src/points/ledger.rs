//! Append-only points ledger.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::auth::user::UserId;
use crate::error::StoreError;

/// One signed change to a user's points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub user_id: UserId,
    pub delta: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl LedgerEntry {
    pub fn new(user_id: UserId, delta: i64) -> Self {
        Self { user_id, delta, reason: None }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Ledger persistence. Entries are never mutated or removed.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Sum of all deltas recorded for `user_id`; 0 when there are none.
    async fn sum_deltas_for_user(&self, user_id: &UserId) -> Result<i64, StoreError>;

    /// Record a new entry.
    async fn append(&self, entry: LedgerEntry) -> Result<(), StoreError>;
}
