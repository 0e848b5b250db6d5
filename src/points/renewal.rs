//! Crediting renewal awards to the ledger.

use crate::auth::user::UserId;
use crate::error::StoreError;
use crate::observability::metrics;
use crate::points::calculator::calculate_renewal_points;
use crate::points::ledger::{LedgerEntry, LedgerStore};
use crate::points::plan::MembershipPlan;

pub const RENEWAL_REASON: &str = "membership_renewal";

/// Compute the award for `plan` and append it for `user_id` when non-zero.
pub async fn award_renewal_points(
    ledger: &dyn LedgerStore,
    user_id: &UserId,
    plan: &MembershipPlan,
) -> Result<u64, StoreError> {
    let points = calculate_renewal_points(plan);
    if points == 0 {
        tracing::debug!(user_id = %user_id, policy = ?plan.points_policy_type, "Renewal earns no points");
        return Ok(0);
    }

    // Ledger deltas are i64; an award past that is clamped.
    let delta = i64::try_from(points).unwrap_or(i64::MAX);
    ledger
        .append(LedgerEntry::new(user_id.clone(), delta).with_reason(RENEWAL_REASON))
        .await?;

    metrics::record_points_awarded(points);
    tracing::info!(user_id = %user_id, points, "Renewal points awarded");
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::points::rate::ConversionRate;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn appends_positive_award() {
        let store = MemoryStore::new(None);
        let user = UserId::new("u1");
        let plan = MembershipPlan::convert_fee(999, ConversionRate::parse("1.5"));

        assert_eq!(award_renewal_points(&store, &user, &plan).await.unwrap(), 14);
        assert_eq!(store.sum_deltas_for_user(&user).await.unwrap(), 14);
        let entries = store.entries_for(&user);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].reason.as_deref(), Some(RENEWAL_REASON));
    }

    #[tokio::test]
    async fn zero_award_writes_nothing() {
        let store = MemoryStore::new(None);
        let user = UserId::new("u1");
        assert_eq!(award_renewal_points(&store, &user, &MembershipPlan::none()).await.unwrap(), 0);
        assert!(store.entries_for(&user).is_empty());
    }
}
