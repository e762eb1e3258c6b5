//! Exchange rates (18-decimal fixed-point wrapper for `Decimal`)

use crate::{Error, ErrorKind};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{de, ser, Deserialize, Serialize};
use std::{
    fmt::{self, Display},
    ops::{Add, Deref, Div, Mul},
    str::FromStr,
};

/// Number of fractional digits in an on-wire exchange rate
pub const WIRE_SCALE: u32 = 18;

/// Exchange rate for a denom (internally represented as a `Decimal`)
///
/// Negative rates are the oracle's abstain sentinel.
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub struct Rate(Decimal);

impl Rate {
    /// Create a new rate from a `Decimal`
    pub fn new(decimal: Decimal) -> Self {
        Rate(decimal)
    }

    /// Zero rate
    pub fn zero() -> Self {
        Rate(Decimal::ZERO)
    }

    /// The abstain sentinel (`-1.000000000000000000`)
    pub fn abstain() -> Self {
        Rate(Decimal::from(-1i64)).quantize()
    }

    /// Is this rate an abstain vote?
    pub fn is_abstain(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Quantize to exactly [`WIRE_SCALE`] fractional places, rounding half-up
    pub fn quantize(self) -> Self {
        let mut decimal = self
            .0
            .round_dp_with_strategy(WIRE_SCALE, RoundingStrategy::MidpointAwayFromZero);
        decimal.rescale(WIRE_SCALE);
        Rate(decimal)
    }
}

impl Add for Rate {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Mul<u32> for Rate {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self {
        Self(self.0 * Decimal::from(rhs))
    }
}

impl Div<u32> for Rate {
    type Output = Self;

    fn div(self, rhs: u32) -> Self {
        Self(self.0 / Decimal::from(rhs))
    }
}

impl Deref for Rate {
    type Target = Decimal;

    fn deref(&self) -> &Decimal {
        &self.0
    }
}

impl Display for Rate {
    /// On-wire form: always [`WIRE_SCALE`] fractional digits, leading sign
    /// if negative
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.quantize().0.fmt(f)
    }
}

impl FromStr for Rate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let decimal = Decimal::from_str(s).map_err(|e| ErrorKind::Parse.context(e))?;
        Ok(Rate(decimal))
    }
}

impl From<Decimal> for Rate {
    fn from(decimal: Decimal) -> Rate {
        Rate(decimal)
    }
}

impl From<i64> for Rate {
    fn from(n: i64) -> Rate {
        Rate(Decimal::from(n))
    }
}

impl From<u64> for Rate {
    fn from(n: u64) -> Rate {
        Rate(Decimal::from(n))
    }
}

impl From<Rate> for Decimal {
    fn from(rate: Rate) -> Decimal {
        rate.0
    }
}

impl<'de> Deserialize<'de> for Rate {
    fn deserialize<D: de::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use de::Error;
        String::deserialize(deserializer)?
            .parse()
            .map_err(D::Error::custom)
    }
}

impl Serialize for Rate {
    fn serialize<S: ser::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_string().serialize(serializer)
    }
}
