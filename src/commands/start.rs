//! `start` subcommand

use crate::{
    application::{app_config, APP},
    config::PythiaConfig,
    networks::terra::{ExchangeRateOracle, LcdClient},
    prelude::*,
    sources::MarketSet,
    wallet::{CliSigner, Wallet},
};
use abscissa_core::{config, Command, FrameworkError, Options, Runnable};
use std::{env, path::PathBuf, process, sync::Arc, time::Duration};

/// Delay between height polls
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// `start` subcommand: run the feeder voter against an LCD node
#[derive(Command, Debug, Default, Options)]
pub struct StartCmd {
    /// Validator operator address
    #[options(free, help = "validator operator address (valoper)")]
    pub validator: Option<String>,

    /// Feeder wallet name
    #[options(help = "feeder wallet name in terracli")]
    pub wallet: Option<String>,

    /// LCD node address
    #[options(help = "LCD node address")]
    pub node: Option<String>,

    /// Chain ID
    #[options(no_short, help = "tendermint chain id")]
    pub chain_id: Option<String>,

    /// Vote period length
    #[options(no_short, help = "vote period length in blocks")]
    pub vote_period: Option<u64>,

    /// Feeder account password
    #[options(help = "password to unlock the feeder account (or env var `password`)")]
    pub password: Option<String>,

    /// terracli home directory
    #[options(help = "home directory to pass to terracli")]
    pub home: Option<PathBuf>,

    /// Gas fee amount
    #[options(no_short, help = "transaction fee amount in the gas denom")]
    pub gas_fee: Option<u64>,

    /// Gas fee denomination
    #[options(no_short, help = "base denomination for the transaction fee")]
    pub gas_denom: Option<String>,
}

impl Runnable for StartCmd {
    /// Start the voter and drive it with height ticks until shutdown.
    fn run(&self) {
        let config = app_config();
        let config = PythiaConfig::clone(&config);

        // Check that the password is given before anything else
        let password = env::var("password")
            .ok()
            .or_else(|| self.password.clone())
            .unwrap_or_else(|| {
                status_err!("no password provided for the feeder account");
                process::exit(1);
            });

        if config.network.validator.is_empty() {
            status_err!("no validator operator address provided");
            process::exit(1);
        }

        let markets = MarketSet::from_config(&config).unwrap_or_else(|e| {
            status_err!("invalid feed configuration: {}", e);
            process::exit(1);
        });

        let lcd = Arc::new(LcdClient::new(
            config.network.lcd_addr.clone(),
            config.network.actives_path.clone(),
            config.https.timeout(),
        ));

        abscissa_tokio::run(&APP, async move {
            let signer = CliSigner::new(&config.wallet, password);

            let account_addr = signer.account_addr().await.unwrap_or_else(|e| {
                status_err!("cannot resolve feeder address: {}", e);
                process::exit(1);
            });

            let mut wallet = Wallet::new(account_addr, Box::new(signer));
            if let Err(e) = wallet.sync_state(&*lcd).await {
                status_err!("cannot reach node {}: {}", config.network.lcd_addr, e);
                process::exit(1);
            }

            let mut oracle = ExchangeRateOracle::new(lcd, wallet, markets, &config.network);

            loop {
                if let Err(err) = oracle.poll().await {
                    warn!("height poll failed: {}", err);
                }

                tokio::time::delay_for(POLL_INTERVAL).await;
            }
        })
        .unwrap_or_else(|e| {
            status_err!("executor exited with error: {}", e);
            process::exit(1);
        });
    }
}

impl config::Override<PythiaConfig> for StartCmd {
    /// Override config settings with command-line options
    fn override_config(&self, mut config: PythiaConfig) -> Result<PythiaConfig, FrameworkError> {
        if let Some(validator) = &self.validator {
            config.network.validator = validator.clone();
        }

        if let Some(node) = &self.node {
            config.network.lcd_addr = node.clone();
        }

        if let Some(chain_id) = &self.chain_id {
            config.network.chain_id = chain_id.clone();
        }

        if let Some(vote_period) = self.vote_period {
            config.network.vote_period = vote_period;
        }

        if let Some(wallet) = &self.wallet {
            config.wallet.name = wallet.clone();
        }

        if let Some(home) = &self.home {
            config.wallet.home = Some(home.clone());
        }

        if let Some(gas_fee) = self.gas_fee {
            config.network.fee.amount = gas_fee;
        }

        if let Some(gas_denom) = &self.gas_denom {
            config.network.fee.denom = gas_denom.clone();
        }

        Ok(config)
    }
}
