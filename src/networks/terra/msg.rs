//! Terra oracle message types

use super::denom::Denom;
use crate::Rate;
use rand::{thread_rng, Rng};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use subtle_encoding::hex;

/// Terra Oracle Vote Message (`oracle/MsgExchangeRateVote`)
///
/// Discloses the rate and salt behind a commitment made in the prior
/// vote period.
///
/// <https://docs.terra.money/dev/spec-oracle.html#msgexchangeratevote>
#[derive(Clone, Debug)]
pub struct MsgExchangeRateVote {
    /// Exchange rate voted on. Negative values are an abstain vote.
    pub exchange_rate: Rate,

    /// Salt for commit reveal protocol
    pub salt: String,

    /// Denom for Oracle Vote
    pub denom: Denom,

    /// Origin of the Feed Msg
    pub feeder: String,

    /// Validator voting on behalf of
    pub validator: String,
}

impl MsgExchangeRateVote {
    /// Get a random salt value: 2 bytes from a cryptographic RNG,
    /// hex-encoded to 4 characters
    pub fn random_salt() -> String {
        let bytes: [u8; 2] = thread_rng().gen();

        // Should always succeed.
        String::from_utf8(hex::encode(&bytes)).unwrap()
    }

    /// Amino-compatible JSON representation
    pub fn to_json_value(&self) -> Value {
        json!({
            "type": "oracle/MsgExchangeRateVote",
            "value": {
                "exchange_rate": self.exchange_rate.to_string(),
                "salt": self.salt,
                "denom": self.denom.as_str(),
                "feeder": self.feeder,
                "validator": self.validator,
            }
        })
    }

    /// Compute prevote from this vote
    pub fn prevote(&self) -> MsgExchangeRatePrevote {
        MsgExchangeRatePrevote {
            hash: vote_hash(&self.salt, self.exchange_rate, &self.denom, &self.validator),
            denom: self.denom.clone(),
            feeder: self.feeder.clone(),
            validator: self.validator.clone(),
        }
    }
}

/// Terra Oracle Prevote Message (`oracle/MsgExchangeRatePrevote`)
///
/// <https://docs.terra.money/dev/spec-oracle.html#msgexchangerateprevote>
#[derive(Clone, Debug)]
pub struct MsgExchangeRatePrevote {
    /// Commitment to future vote
    pub hash: String,

    /// Denom to commit for
    pub denom: Denom,

    /// Origin Address for vote
    pub feeder: String,

    /// Validator voting on behalf of
    pub validator: String,
}

impl MsgExchangeRatePrevote {
    /// Amino-compatible JSON representation
    pub fn to_json_value(&self) -> Value {
        json!({
            "type": "oracle/MsgExchangeRatePrevote",
            "value": {
                "hash": self.hash,
                "denom": self.denom.as_str(),
                "feeder": self.feeder,
                "validator": self.validator,
            }
        })
    }
}

/// Generate the hex encoded truncated SHA-256 commitment over
/// `"{salt}:{rate}:{denom}:{validator}"` with the rate in its 18-decimal
/// wire form.
pub fn vote_hash(salt: &str, rate: Rate, denom: &Denom, validator: &str) -> String {
    let data = format!("{}:{}:{}:{}", salt, rate, denom, validator);

    // Tendermint truncated sha256
    let digest = Sha256::digest(data.as_bytes());
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&digest[..20]);

    // Should always succeed.
    String::from_utf8(hex::encode(bytes)).unwrap()
}
