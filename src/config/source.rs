//! Market source configuration

use serde::{Deserialize, Serialize};

/// Source Configuration
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// Feed sets, one per supported denom
    pub feeds: Vec<FeedConfig>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            feeds: vec![
                FeedConfig {
                    denom: "ukrw".to_owned(),
                    markets: vec![MarketConfig {
                        provider: Provider::Coinone,
                        weight: 100,
                    }],
                },
                FeedConfig {
                    denom: "uusd".to_owned(),
                    markets: vec![MarketConfig {
                        provider: Provider::Binance,
                        weight: 100,
                    }],
                },
            ],
        }
    }
}

/// Weighted market feeds for one denom
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FeedConfig {
    /// Denom the feeds price
    pub denom: String,

    /// Markets contributing to the committed rate
    pub markets: Vec<MarketConfig>,
}

/// One market's contribution to a denom's rate
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MarketConfig {
    /// Market data provider
    pub provider: Provider,

    /// Weight out of 100
    pub weight: u32,
}

/// Supported market data providers
#[derive(Copy, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Binance
    /// <https://github.com/binance-exchange/binance-official-api-docs/blob/master/rest-api.md>
    Binance,

    /// CoinOne
    /// <https://coinone.co.kr/>
    Coinone,
}
