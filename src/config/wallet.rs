//! Feeder wallet configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Feeder wallet settings. The password is read from the `password`
/// environment variable or the `--password` flag, never from this file.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WalletConfig {
    /// Wallet name in the terracli keyring
    pub name: String,

    /// Home directory passed to terracli
    pub home: Option<PathBuf>,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            name: "feeder".to_owned(),
            home: None,
        }
    }
}
