//! Points balance aggregation.

use std::sync::Arc;

use crate::auth::user::UserId;
use crate::error::StoreError;
use crate::points::ledger::LedgerStore;

/// Derives balances from the ledger on every call.
#[derive(Clone)]
pub struct PointsBalance {
    ledger: Arc<dyn LedgerStore>,
}

impl PointsBalance {
    pub fn new(ledger: Arc<dyn LedgerStore>) -> Self {
        Self { ledger }
    }

    /// Current balance of `user_id`. No caching.
    pub async fn balance(&self, user_id: &UserId) -> Result<i64, StoreError> {
        self.ledger.sum_deltas_for_user(user_id).await
    }
}
