//! Market data sources and per-denom feed aggregation

pub mod binance;
pub mod coinone;

use self::{binance::BinanceSource, coinone::CoinoneSource};
use crate::{
    config::{source::Provider, PythiaConfig},
    prelude::*,
    Denom, Error, ErrorKind, Map, Rate,
};
use futures::future::{self, BoxFuture};
use std::sync::Arc;

/// Total weight the markets of one denom must sum to
pub const TOTAL_WEIGHT: u32 = 100;

/// Zero-argument market feed returning the current price
pub type Feed = Box<dyn Fn() -> BoxFuture<'static, Result<Rate, Error>> + Send + Sync>;

/// One weighted market feed for a denom
pub struct Market {
    /// Feed returning the current market price
    pub feed: Feed,

    /// Weight out of [`TOTAL_WEIGHT`]
    pub weight: u32,
}

/// Registry of weighted market feeds keyed by denom
#[derive(Default)]
pub struct MarketSet {
    markets: Map<Denom, Vec<Market>>,
}

impl MarketSet {
    /// Initialize the feed set from config
    pub fn from_config(config: &PythiaConfig) -> Result<Self, Error> {
        let binance = Arc::new(BinanceSource::new(&config.https));
        let coinone = Arc::new(CoinoneSource::new(&config.https));

        let mut set = MarketSet::default();

        for feed_config in &config.source.feeds {
            let denom: Denom = feed_config.denom.parse()?;
            let mut markets = Vec::with_capacity(feed_config.markets.len());

            for market in &feed_config.markets {
                let feed: Feed = match market.provider {
                    Provider::Binance => {
                        let source = binance.clone();
                        Box::new(move || {
                            let source = source.clone();
                            Box::pin(async move { source.luna_usd().await })
                        })
                    }
                    Provider::Coinone => {
                        let source = coinone.clone();
                        Box::new(move || {
                            let source = source.clone();
                            Box::pin(async move { source.luna_krw().await })
                        })
                    }
                };

                markets.push(Market {
                    feed,
                    weight: market.weight,
                });
            }

            set.add(denom, markets)?;
        }

        Ok(set)
    }

    /// Register the market feeds for a denom
    pub fn add(&mut self, denom: Denom, markets: Vec<Market>) -> Result<(), Error> {
        let total: u32 = markets.iter().map(|market| market.weight).sum();
        if total != TOTAL_WEIGHT {
            fail!(
                ErrorKind::Config,
                "market weights for {} sum to {}, expected {}",
                denom,
                total,
                TOTAL_WEIGHT
            );
        }

        self.markets.insert(denom, markets);
        Ok(())
    }

    /// Is there a feed set registered for `denom`?
    pub fn supports(&self, denom: &Denom) -> bool {
        self.markets.contains_key(denom)
    }

    /// Aggregate all market feeds for `denom` into one weighted rate.
    ///
    /// All feeds are queried concurrently; if any feed fails the whole
    /// aggregation fails, so a denom with partial market data produces no
    /// vote rather than a skewed one.
    pub async fn aggregate(&self, denom: &Denom) -> Result<Rate, Error> {
        let markets = match self.markets.get(denom) {
            Some(markets) => markets,
            None => fail!(ErrorKind::Source, "no markets for denom: {}", denom),
        };

        let prices = future::try_join_all(markets.iter().map(|market| (market.feed)())).await?;

        let weighted = markets
            .iter()
            .zip(&prices)
            .fold(Rate::zero(), |acc, (market, price)| {
                acc + *price * market.weight
            });

        Ok((weighted / TOTAL_WEIGHT).quantize())
    }
}
