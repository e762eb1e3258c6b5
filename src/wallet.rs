//! Feeder wallet capability
//!
//! Key material never enters this process: signing is delegated to an
//! external signer (terracli). The wallet tracks the feeder account's
//! address, number, and sequence.

use crate::{
    config::WalletConfig,
    networks::terra::{
        lcd::LcdApi,
        tx::{StdTx, TxBuilder},
    },
    prelude::*,
    Error, ErrorKind,
};
use async_trait::async_trait;
use std::{path::PathBuf, process::Stdio};
use tokio::{io::AsyncWriteExt, process::Command};

/// Offline transaction signer capability
#[async_trait]
pub trait Signer: Send + Sync {
    /// Sign `tx` offline for the given signing context, returning the same
    /// transaction with `signatures` populated
    async fn offline_sign(
        &self,
        tx: StdTx,
        chain_id: &str,
        account_number: u64,
        sequence: u64,
    ) -> Result<StdTx, Error>;
}

/// Feeder account state plus the signer capability
pub struct Wallet {
    /// Bech32 account address of the feeder
    pub account_addr: String,

    /// On-chain account number
    pub account_number: u64,

    /// Next account sequence
    pub sequence: u64,

    signer: Box<dyn Signer>,
}

impl Wallet {
    /// Create a wallet for `account_addr` backed by `signer`
    pub fn new(account_addr: impl Into<String>, signer: Box<dyn Signer>) -> Self {
        Self {
            account_addr: account_addr.into(),
            account_number: 0,
            sequence: 0,
            signer,
        }
    }

    /// Refresh the account number and sequence from the chain
    pub async fn sync_state(&mut self, lcd: &dyn LcdApi) -> Result<(), Error> {
        let account = lcd.account(&self.account_addr).await?;
        self.account_number = account.account_number;
        self.sequence = account.sequence;
        Ok(())
    }

    /// Sign the messages accumulated in `builder`
    pub async fn sign_tx(&self, builder: &TxBuilder) -> Result<StdTx, Error> {
        self.signer
            .offline_sign(
                builder.to_sign_payload(),
                builder.chain_id(),
                builder.account_number(),
                builder.sequence(),
            )
            .await
    }
}

/// Signer shelling out to `terracli tx sign --offline`
pub struct CliSigner {
    name: String,
    password: String,
    home: Option<PathBuf>,
}

impl CliSigner {
    /// Create a signer for the named wallet in the terracli keyring
    pub fn new(config: &WalletConfig, password: impl Into<String>) -> Self {
        Self {
            name: config.name.clone(),
            password: password.into(),
            home: config.home.clone(),
        }
    }

    /// Resolve the wallet's account address (`terracli keys show -a`)
    pub async fn account_addr(&self) -> Result<String, Error> {
        let mut command = Command::new("terracli");
        command.args(&["keys", "show", &self.name, "-a"]);
        if let Some(home) = &self.home {
            command.arg("--home").arg(home);
        }

        let output = command
            .output()
            .await
            .map_err(|e| ErrorKind::Signing.context(e))?;

        if !output.status.success() {
            fail!(
                ErrorKind::Signing,
                "terracli keys show failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
    }
}

#[async_trait]
impl Signer for CliSigner {
    async fn offline_sign(
        &self,
        tx: StdTx,
        chain_id: &str,
        account_number: u64,
        sequence: u64,
    ) -> Result<StdTx, Error> {
        let unsigned_path = std::env::temp_dir().join(format!(
            "pythia-unsigned-{}-{}.json",
            std::process::id(),
            sequence
        ));
        std::fs::write(&unsigned_path, serde_json::to_vec(&tx)?)?;

        let mut command = Command::new("terracli");
        command
            .arg("tx")
            .arg("sign")
            .arg(&unsigned_path)
            .args(&["--offline", "--from", &self.name, "--chain-id", chain_id])
            .arg("--account-number")
            .arg(account_number.to_string())
            .arg("--sequence")
            .arg(sequence.to_string())
            .args(&["--output", "json"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(home) = &self.home {
            command.arg("--home").arg(home);
        }

        let mut child = command.spawn().map_err(|e| ErrorKind::Signing.context(e))?;

        let mut stdin = match child.stdin.take() {
            Some(stdin) => stdin,
            None => fail!(ErrorKind::Signing, "terracli stdin unavailable"),
        };
        stdin
            .write_all(format!("{}\n", self.password).as_bytes())
            .await
            .map_err(|e| ErrorKind::Signing.context(e))?;
        drop(stdin);

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ErrorKind::Signing.context(e))?;
        let _ = std::fs::remove_file(&unsigned_path);

        if !output.status.success() {
            fail!(
                ErrorKind::Signing,
                "terracli tx sign failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        serde_json::from_slice(&output.stdout).map_err(|e| ErrorKind::Signing.context(e).into())
    }
}
