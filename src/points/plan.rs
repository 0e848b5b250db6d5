//! Membership plan as consumed by the points calculator.

use serde::{Deserialize, Serialize};

use crate::points::rate::ConversionRate;

/// How a plan awards points on renewal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PointsPolicyType {
    None,
    FixedPerRenewal,
    ConvertFeeToPoints,
}

/// Pricing and points policy of a membership plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MembershipPlan {
    pub points_policy_type: PointsPolicyType,
    #[serde(default)]
    pub points_fixed_amount: Option<i64>,
    #[serde(default)]
    pub points_conversion_rate: Option<ConversionRate>,
    #[serde(default)]
    pub price_cents: i64,
}

#[cfg(test)]
impl MembershipPlan {
    pub fn none() -> Self {
        Self {
            points_policy_type: PointsPolicyType::None,
            points_fixed_amount: None,
            points_conversion_rate: None,
            price_cents: 0,
        }
    }

    pub fn fixed(amount: i64) -> Self {
        Self {
            points_policy_type: PointsPolicyType::FixedPerRenewal,
            points_fixed_amount: Some(amount),
            ..Self::none()
        }
    }

    pub fn convert_fee(price_cents: i64, rate: Option<ConversionRate>) -> Self {
        Self {
            points_policy_type: PointsPolicyType::ConvertFeeToPoints,
            points_conversion_rate: rate,
            price_cents,
            ..Self::none()
        }
    }
}
