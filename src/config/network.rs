//! Network configuration

use serde::{Deserialize, Serialize};

/// Default LCD node address
pub const DEFAULT_LCD_ADDR: &str = "http://127.0.0.1:1317";

/// Default path of the active-denoms oracle endpoint
pub const DEFAULT_ACTIVES_PATH: &str = "/oracle/denoms/actives";

/// Default vote period length in blocks
pub const DEFAULT_VOTE_PERIOD: u64 = 5;

/// Network/chain specific configuration
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkConfig {
    /// Terra chain id
    pub chain_id: String,

    /// LCD (REST query gateway) node address
    pub lcd_addr: String,

    /// Validator operator address (Bech32 valoper)
    pub validator: String,

    /// Vote period length in blocks
    pub vote_period: u64,

    /// Path of the active-denoms oracle endpoint
    pub actives_path: String,

    /// Oracle transaction fee
    #[serde(default)]
    pub fee: OracleFee,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            chain_id: "columbus-4".to_owned(),
            lcd_addr: DEFAULT_LCD_ADDR.to_owned(),
            validator: String::new(),
            vote_period: DEFAULT_VOTE_PERIOD,
            actives_path: DEFAULT_ACTIVES_PATH.to_owned(),
            fee: OracleFee::default(),
        }
    }
}

/// Oracle fee configuration
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OracleFee {
    /// Fee denomination
    pub denom: String,

    /// Fee amount
    pub amount: u64,

    /// Gas amount
    pub gas: u64,
}

impl Default for OracleFee {
    fn default() -> Self {
        Self {
            denom: "uluna".to_owned(),
            amount: 1_000,
            gas: 200_000,
        }
    }
}
