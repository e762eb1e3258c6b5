//! Pythia Config
//!
//! See instructions in `commands.rs` to specify the path to your
//! application's configuration file and/or command-line options
//! for specifying it.

pub mod https;
pub mod network;
pub mod source;
pub mod wallet;

pub use self::{
    https::HttpsConfig, network::NetworkConfig, source::SourceConfig, wallet::WalletConfig,
};

use serde::{Deserialize, Serialize};

/// Pythia Configuration
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PythiaConfig {
    /// HTTP client configuration
    #[serde(default)]
    pub https: HttpsConfig,

    /// Network (i.e. chain) configuration
    #[serde(default)]
    pub network: NetworkConfig,

    /// Market source configuration
    #[serde(default)]
    pub source: SourceConfig,

    /// Feeder wallet configuration
    #[serde(default)]
    pub wallet: WalletConfig,
}
