//! Coinone Source Provider
//! <https://coinone.co.kr/>
//!
//! Only the LUNA/KRW pair is consumed.

use crate::{
    config::HttpsConfig,
    http_client::HttpClient,
    prelude::*,
    Error, ErrorKind, Rate,
};
use serde::{Deserialize, Serialize};

/// Base URI for requests to the Coinone API
pub const BASE_URI: &str = "https://api.coinone.co.kr";

/// Source provider for Coinone
pub struct CoinoneSource {
    http_client: HttpClient,
}

impl CoinoneSource {
    /// Create a new Coinone source provider
    pub fn new(config: &HttpsConfig) -> Self {
        Self {
            http_client: HttpClient::new(BASE_URI, config.timeout()),
        }
    }

    /// Order book midpoint of the LUNA/KRW pair
    pub async fn luna_krw(&self) -> Result<Rate, Error> {
        let response: Response = self
            .http_client
            .get_json("/orderbook?currency=luna")
            .await?;
        response.midpoint()
    }
}

/// `/orderbook` API response
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Response {
    /// Error code
    #[serde(rename = "errorCode")]
    pub error_code: String,

    /// Result of the operation
    pub result: String,

    /// Requested currency
    pub currency: String,

    /// Timestamp
    pub timestamp: String,

    /// Ask prices
    pub ask: Vec<PricePoint>,

    /// Bid prices
    pub bid: Vec<PricePoint>,
}

impl Response {
    /// Midpoint of the lowest ask and the highest bid
    pub fn midpoint(&self) -> Result<Rate, Error> {
        let lowest_ask = match self.ask.iter().map(|point| point.price).min() {
            Some(price) => price,
            None => fail!(ErrorKind::Source, "Coinone order book has no asks"),
        };

        let highest_bid = match self.bid.iter().map(|point| point.price).max() {
            Some(price) => price,
            None => fail!(ErrorKind::Source, "Coinone order book has no bids"),
        };

        Ok((lowest_ask + highest_bid) / 2)
    }
}

/// Prices and associated volumes
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct PricePoint {
    /// Price
    pub price: Rate,

    /// Quantity
    pub qty: Rate,
}
