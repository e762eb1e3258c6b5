//! Exchange rate denominations

use crate::{prelude::*, Error, ErrorKind};
use serde::{de, ser, Deserialize, Serialize};
use std::{
    fmt::{self, Display},
    str::FromStr,
};

/// Denomination: chain-internal identifier for a currency quoted against
/// the base asset (e.g. `uusd`, `ukrw`).
///
/// The set of active denoms is dynamic (reported by the chain), so this is
/// an open-ended identifier rather than a closed enum.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Denom(String);

impl Denom {
    /// Borrow this denom as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Denom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Denom {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        if s.is_empty() || !s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()) {
            fail!(ErrorKind::Parse, "malformed denom: {:?}", s);
        }

        Ok(Denom(s.to_owned()))
    }
}

impl<'de> Deserialize<'de> for Denom {
    fn deserialize<D: de::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use de::Error;
        String::deserialize(deserializer)?
            .parse()
            .map_err(D::Error::custom)
    }
}

impl Serialize for Denom {
    fn serialize<S: ser::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::Denom;

    #[test]
    fn parse_well_formed() {
        let denom: Denom = "uusd".parse().unwrap();
        assert_eq!(denom.as_str(), "uusd");
        assert_eq!(denom.to_string(), "uusd");
    }

    #[test]
    fn parse_malformed() {
        assert!("".parse::<Denom>().is_err());
        assert!("UUSD".parse::<Denom>().is_err());
        assert!("u usd".parse::<Denom>().is_err());
    }
}
