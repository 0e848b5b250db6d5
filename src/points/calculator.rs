//! Renewal points calculation.

use crate::points::plan::{MembershipPlan, PointsPolicyType};

/// Points awarded for one renewal of `plan`. Never negative, never panics.
pub fn calculate_renewal_points(plan: &MembershipPlan) -> u64 {
    match plan.points_policy_type {
        PointsPolicyType::None => 0,
        PointsPolicyType::FixedPerRenewal => plan
            .points_fixed_amount
            .map(|amount| u64::try_from(amount).unwrap_or(0))
            .unwrap_or(0),
        PointsPolicyType::ConvertFeeToPoints => plan
            .points_conversion_rate
            .as_ref()
            .map(|rate| rate.convert_cents(plan.price_cents))
            .unwrap_or(0),
    }
}
