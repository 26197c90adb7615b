//! Money value object
//!
//! Domain primitive for monetary values. Amounts are normalized to a fixed
//! 2-decimal scale at construction time using banker's rounding, so all
//! arithmetic operates on already-normalized operands.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::DomainError;

/// Fixed scale for all monetary values (2 decimal places)
const SCALE: u32 = 2;

/// Money represents an exact fixed-point monetary value.
///
/// # Invariants
/// - Scale is always exactly 2
/// - Rounding (half-to-even) is applied once, at construction
/// - Equality and ordering are by numeric value, not representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Money(Decimal);

impl Money {
    /// Create a Money value, rounding to 2 decimals with round-half-to-even.
    pub fn of(value: Decimal) -> Self {
        let mut normalized =
            value.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointNearestEven);
        normalized.rescale(SCALE);
        Self(normalized)
    }

    /// Zero balance constant.
    pub fn zero() -> Self {
        Self::of(Decimal::ZERO)
    }

    /// Get the underlying decimal value (scale 2).
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn add(&self, other: Money) -> Money {
        Money::of(self.0 + other.0)
    }

    pub fn subtract(&self, other: Money) -> Money {
        Money::of(self.0 - other.0)
    }

    pub fn is_less_than(&self, other: Money) -> bool {
        self.0 < other.0
    }

    pub fn is_less_than_or_equal(&self, other: Money) -> bool {
        self.0 <= other.0
    }

    pub fn is_greater_than(&self, other: Money) -> bool {
        self.0 > other.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Scale is pinned to 2, so the plain decimal rendering is canonical.
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal = Decimal::from_str(s)
            .map_err(|e| DomainError::InvalidArgument(format!("invalid money value: {e}")))?;
        Ok(Money::of(decimal))
    }
}

impl TryFrom<String> for Money {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Money> for String {
    fn from(money: Money) -> Self {
        money.to_string()
    }
}
