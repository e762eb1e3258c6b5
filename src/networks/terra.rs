//! Terra stablecoin project schema
//! <https://terra.money/>

pub mod denom;
pub mod lcd;
pub mod msg;
pub mod oracle;
pub mod pending;
pub mod tx;

pub use self::{
    denom::Denom,
    lcd::{LcdApi, LcdClient},
    oracle::ExchangeRateOracle,
};

/// Memo to include in transactions
pub const MEMO: &str = concat!("pythia/", env!("CARGO_PKG_VERSION"));

/// Blocks to wait after broadcast before querying a transaction's result
pub const TX_RESULT_DELAY: u64 = 4;
