//! CLI command implementations for evw

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::EvwConfig;
use crate::error::CliResult;

pub mod init;
pub mod inspect;
pub mod run;

/// evw - event-camera stream windowing
#[derive(Parser, Debug)]
#[command(
    name = "evw",
    version,
    about = "Bin event-camera recordings into ON/OFF frame pairs",
    long_about = "evw windows a timestamp-ordered DVS event stream into frame pairs \
                  (one grid per polarity) using a fixed event count, a fixed time \
                  window, or a sliding time window, and writes every emitted frame."
)]
pub struct EvwCli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "EVW_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default evw.toml
    Init(init::InitCommand),

    /// Window a recording and write the emitted frames
    Run(run::RunCommand),

    /// Summarize the substreams of a recording
    Inspect(inspect::InspectCommand),
}

impl EvwCli {
    /// Execute the CLI command
    pub fn execute(self) -> CliResult<()> {
        match self.command {
            Commands::Init(cmd) => cmd.execute(),
            Commands::Run(cmd) => {
                let config = EvwConfig::resolve(self.config.as_deref())?;
                cmd.execute(config)
            }
            Commands::Inspect(cmd) => {
                let config = EvwConfig::resolve(self.config.as_deref())?;
                cmd.execute(config)
            }
        }
    }
}
