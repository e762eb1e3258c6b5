//! Binance Source Provider
//! <https://binance.com/>

use crate::{config::HttpsConfig, http_client::HttpClient, Error, Rate};
use serde::{Deserialize, Serialize};
use tokio::try_join;

/// Base URI for requests to the Binance API
pub const BASE_URI: &str = "https://api.binance.com";

/// Source provider for Binance
pub struct BinanceSource {
    http_client: HttpClient,
}

impl BinanceSource {
    /// Create a new Binance source provider
    pub fn new(config: &HttpsConfig) -> Self {
        Self {
            http_client: HttpClient::new(BASE_URI, config.timeout()),
        }
    }

    /// LUNA/USD price, approximated by giving the BUSD and USDT stablecoin
    /// pairs equal weight
    pub async fn luna_usd(&self) -> Result<Rate, Error> {
        let (luna_busd, luna_usdt) = try_join!(
            self.avg_price_for_symbol("LUNABUSD"),
            self.avg_price_for_symbol("LUNAUSDT")
        )?;

        Ok((luna_busd + luna_usdt) / 2)
    }

    /// `GET /api/v3/avgPrice` - get average price for a Binance trading symbol
    pub async fn avg_price_for_symbol(&self, symbol: &str) -> Result<Rate, Error> {
        let api_response: AvgPriceResponse = self
            .http_client
            .get_json(&format!("/api/v3/avgPrice?symbol={}", symbol))
            .await?;

        Ok(api_response.price)
    }
}

/// Binance `/api/v3/avgPrice` response
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvgPriceResponse {
    /// Minutes the moving average is computed over
    pub mins: u32,

    /// Price
    pub price: Rate,
}
