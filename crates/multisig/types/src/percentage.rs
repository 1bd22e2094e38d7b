//! Fixed-point percentages
//!
//! Percentages are stored as integer parts of [`PRECISION_FACTOR`], so
//! `0.5` is `500_000_000` parts. Nothing in the decision path touches
//! floating point.

use crate::{MultisigError, MultisigResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Scale of the fixed-point representation (1e-9 granularity)
pub const PRECISION_FACTOR: u64 = 1_000_000_000;

const FRACTION_DIGITS: u32 = 9;

/// A ratio in `[0, 1]` with 1e-9 granularity.
///
/// Serializes as a decimal string (`"0.5"`) so config files stay exact.
/// Parsing also accepts a percent form (`"50%"`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Percentage(u64);

impl Percentage {
    pub const ZERO: Percentage = Percentage(0);
    pub const ONE: Percentage = Percentage(PRECISION_FACTOR);

    /// Build from raw parts of [`PRECISION_FACTOR`].
    pub fn from_parts(parts: u64) -> MultisigResult<Self> {
        if parts > PRECISION_FACTOR {
            return Err(MultisigError::InvalidConfig(format!(
                "percentage above 100%: {} parts of {}",
                parts, PRECISION_FACTOR
            )));
        }
        Ok(Self(parts))
    }

    pub fn parts(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let whole = self.0 / PRECISION_FACTOR;
        let fraction = self.0 % PRECISION_FACTOR;
        if fraction == 0 {
            return write!(f, "{}", whole);
        }
        let digits = format!("{:09}", fraction);
        write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
    }
}

impl FromStr for Percentage {
    type Err = MultisigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parsed = match s.strip_suffix('%') {
            // x% == x / 100, so two fewer fractional digits are representable
            Some(percent) => parse_fixed(percent.trim_end(), FRACTION_DIGITS - 2),
            None => parse_fixed(s, FRACTION_DIGITS),
        };
        let parts = parsed
            .ok_or_else(|| MultisigError::InvalidConfig(format!("invalid percentage: {:?}", s)))?;
        Self::from_parts(parts)
    }
}

impl TryFrom<String> for Percentage {
    type Error = MultisigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Percentage> for String {
    fn from(value: Percentage) -> Self {
        value.to_string()
    }
}

/// Parse an unsigned decimal into an integer scaled by `10^scale_digits`.
fn parse_fixed(s: &str, scale_digits: u32) -> Option<u64> {
    let (whole, fraction) = match s.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (s, ""),
    };
    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if fraction.len() > scale_digits as usize || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let scale = 10u128.pow(scale_digits);
    let whole: u128 = whole.parse().ok()?;
    let fraction_value: u128 = if fraction.is_empty() {
        0
    } else {
        let padding = 10u128.pow(scale_digits - fraction.len() as u32);
        fraction.parse::<u128>().ok()? * padding
    };
    let value = whole.checked_mul(scale)?.checked_add(fraction_value)?;
    u64::try_from(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal() {
        assert_eq!("0.5".parse::<Percentage>().unwrap().parts(), 500_000_000);
        assert_eq!("1".parse::<Percentage>().unwrap(), Percentage::ONE);
        assert_eq!("1.0".parse::<Percentage>().unwrap(), Percentage::ONE);
        assert_eq!("0".parse::<Percentage>().unwrap(), Percentage::ZERO);
        assert_eq!("0.000000001".parse::<Percentage>().unwrap().parts(), 1);
    }

    #[test]
    fn test_parse_percent_form() {
        assert_eq!("50%".parse::<Percentage>().unwrap().parts(), 500_000_000);
        assert_eq!("66.6666667%".parse::<Percentage>().unwrap().parts(), 666_666_667);
        assert_eq!("100%".parse::<Percentage>().unwrap(), Percentage::ONE);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("".parse::<Percentage>().is_err());
        assert!(".5".parse::<Percentage>().is_err());
        assert!("-0.5".parse::<Percentage>().is_err());
        assert!("0.5.1".parse::<Percentage>().is_err());
        assert!("0.0000000001".parse::<Percentage>().is_err());
        assert!("abc".parse::<Percentage>().is_err());
    }

    #[test]
    fn test_parse_rejects_above_one() {
        assert!("1.000000001".parse::<Percentage>().is_err());
        assert!("101%".parse::<Percentage>().is_err());
        assert!(Percentage::from_parts(PRECISION_FACTOR + 1).is_err());
    }

    #[test]
    fn test_display_trims_zeros() {
        assert_eq!(Percentage::from_parts(500_000_000).unwrap().to_string(), "0.5");
        assert_eq!(Percentage::from_parts(1).unwrap().to_string(), "0.000000001");
        assert_eq!(Percentage::ONE.to_string(), "1");
        assert_eq!(Percentage::ZERO.to_string(), "0");
    }

    #[test]
    fn test_serde_as_string() {
        let pct: Percentage = "0.75".parse().unwrap();
        let json = serde_json::to_string(&pct).unwrap();
        assert_eq!(json, "\"0.75\"");
        let back: Percentage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pct);
        assert!(serde_json::from_str::<Percentage>("\"1.5\"").is_err());
    }
}
