//! Fee-to-points conversion rate.
//!
//! Rates are arbitrary-precision decimals. A JSON number keeps its literal
//! digits, so `999 cents × 1.5` floors to exactly 14 rather than whatever a
//! binary float rounds to.

use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use num_traits::{ToPrimitive, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Rates at or below `10^-21` floor to zero for every `i64` price.
const NEGLIGIBLE_MAGNITUDE: i64 = -21;
/// Rates of `10^40` or more exceed `u64` for every positive price.
const SATURATING_MAGNITUDE: i64 = 40;

/// Exact decimal rate of points per currency unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRate(BigDecimal);

impl ConversionRate {
    /// Parse a decimal literal such as `"1.5"`, `"-2"` or `"1.5e0"`.
    ///
    /// `NaN` and infinities are accepted and award nothing.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let unsigned = text.trim_start_matches(['+', '-']);
        if ["nan", "inf", "infinity"].iter().any(|w| unsigned.eq_ignore_ascii_case(w)) {
            return Some(Self(BigDecimal::zero()));
        }
        BigDecimal::from_str(text).ok().map(Self)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > BigDecimal::zero()
    }

    /// `floor(cents / 100 × rate)`, clamped to `0..=u64::MAX`.
    pub fn convert_cents(&self, cents: i64) -> u64 {
        if cents <= 0 || !self.is_positive() {
            return 0;
        }

        // rate < 10^magnitude <= rate × 10
        let (_, scale) = self.0.as_bigint_and_exponent();
        let magnitude = (self.0.digits() as i64).saturating_sub(scale);
        if magnitude <= NEGLIGIBLE_MAGNITUDE {
            return 0;
        }
        if magnitude > SATURATING_MAGNITUDE {
            return u64::MAX;
        }

        let hundredth = BigDecimal::new(1.into(), 2);
        let points = BigDecimal::from(cents) * &self.0 * hundredth;
        // Positive, so truncation is floor.
        points.with_scale(0).to_u64().unwrap_or(u64::MAX)
    }
}

impl fmt::Display for ConversionRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Serialize for ConversionRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ConversionRate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let parsed = match Value::deserialize(deserializer)? {
            // Literal digits are preserved by serde_json's arbitrary_precision.
            Value::Number(number) => Self::parse(&number.to_string()),
            Value::String(text) => Self::parse(&text),
            _ => None,
        };
        parsed.ok_or_else(|| serde::de::Error::custom("conversion rate must be a decimal number"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rate(s: &str) -> ConversionRate {
        ConversionRate::parse(s).unwrap()
    }

    #[test]
    fn parses_decimal_literals() {
        assert_eq!(rate("1.5"), rate("1.50"));
        assert_eq!(rate("1.5e0"), rate("1.5"));
        assert_eq!(rate("15E-1"), rate("1.5"));
        assert_eq!(rate("-2").to_string(), "-2");
        assert!(ConversionRate::parse("").is_none());
        assert!(ConversionRate::parse("abc").is_none());
    }

    #[test]
    fn non_finite_rates_award_nothing() {
        for text in ["NaN", "inf", "-Infinity"] {
            assert_eq!(rate(text).convert_cents(1000), 0, "{text}");
        }
    }

    #[test]
    fn converts_exactly() {
        assert_eq!(rate("1.5").convert_cents(999), 14);
        assert_eq!(rate("1.1").convert_cents(1000), 11);
        assert_eq!(rate("0.7").convert_cents(700), 4);
        assert_eq!(rate("1").convert_cents(99), 0);
        assert_eq!(rate("0").convert_cents(1000), 0);
        assert_eq!(rate("-1").convert_cents(1000), 0);
        assert_eq!(rate("-1e300").convert_cents(1000), 0);
        assert_eq!(rate("2").convert_cents(-500), 0);
    }

    #[test]
    fn keeps_digits_beyond_f64() {
        // As an f64 this rate is exactly 1.0 and would award 100.
        assert_eq!(rate("0.99999999999999999999").convert_cents(10_000), 99);
        assert_eq!(rate("50.500000000000000000").convert_cents(i64::MAX), 4_657_802_878_611_661_782);
    }

    #[test]
    fn extreme_magnitudes() {
        assert_eq!(rate("99999999999999999999").convert_cents(i64::MAX), u64::MAX);
        assert_eq!(rate("1e300").convert_cents(1), u64::MAX);
        assert_eq!(rate("1e-300").convert_cents(i64::MAX), 0);
        assert_eq!(rate("1e-15").convert_cents(i64::MAX), 92);
    }

    #[test]
    fn deserializes_number_or_string() {
        let from_num: ConversionRate = serde_json::from_str("1.5").unwrap();
        let from_int: ConversionRate = serde_json::from_str("2").unwrap();
        let from_str: ConversionRate = serde_json::from_str("\"1.50\"").unwrap();
        let from_exp: ConversionRate = serde_json::from_str("\"1.5e0\"").unwrap();
        assert_eq!(from_num.convert_cents(999), 14);
        assert_eq!(from_int.convert_cents(999), 19);
        assert_eq!(from_str.convert_cents(999), 14);
        assert_eq!(from_exp.convert_cents(999), 14);

        let precise: ConversionRate = serde_json::from_str("0.99999999999999999999").unwrap();
        assert_eq!(precise.convert_cents(10_000), 99);
        let negative: ConversionRate = serde_json::from_str("-1e300").unwrap();
        assert_eq!(negative.convert_cents(999), 0);

        assert!(serde_json::from_str::<ConversionRate>("\"lots\"").is_err());
        assert!(serde_json::from_str::<ConversionRate>("true").is_err());
    }

    #[test]
    fn serializes_as_decimal_text() {
        assert_eq!(serde_json::to_string(&rate("1.50")).unwrap(), "\"1.50\"");
    }
}
