//! Pythia Subcommands

pub mod start;
pub mod version;

pub use self::{start::StartCmd, version::VersionCmd};

use crate::config::PythiaConfig;
use abscissa_core::{
    config::Override, Command, Configurable, FrameworkError, Help, Options, Runnable,
};
use std::path::PathBuf;

/// Pythia configuration filename
pub const CONFIG_FILE: &str = "pythia.toml";

/// Pythia Subcommands
#[derive(Command, Debug, Options, Runnable)]
pub enum PythiaCmd {
    /// `help` subcommand
    #[options(help = "get usage information")]
    Help(Help<Self>),

    /// `start` subcommand
    #[options(help = "start the oracle feeder voter")]
    Start(StartCmd),

    /// `version` subcommand
    #[options(help = "display version information")]
    Version(VersionCmd),
}

impl Configurable<PythiaConfig> for PythiaCmd {
    /// Location of the configuration file
    fn config_path(&self) -> Option<PathBuf> {
        let filename = PathBuf::from(CONFIG_FILE);

        if filename.exists() {
            Some(filename)
        } else {
            None
        }
    }

    /// Apply changes to the config after it's been loaded, e.g. overriding
    /// values in a config file using command-line options.
    fn process_config(&self, config: PythiaConfig) -> Result<PythiaConfig, FrameworkError> {
        match self {
            PythiaCmd::Start(cmd) => cmd.override_config(config),
            _ => Ok(config),
        }
    }
}
