//! Configuration initialization command

use clap::Args;
use std::path::PathBuf;
use tracing::info;

use crate::config::{DEFAULT_CONFIG_TEMPLATE, LOCAL_CONFIG_FILE};
use crate::error::{CliError, CliResult};

/// Write a default configuration file
#[derive(Args, Debug)]
pub struct InitCommand {
    /// Destination (defaults to ./evw.toml)
    #[arg(short, long)]
    pub path: Option<PathBuf>,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

impl InitCommand {
    /// Write the template, refusing to replace an existing file unless forced
    pub fn execute(self) -> CliResult<()> {
        let path = self.path.unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE));

        if path.exists() && !self.force {
            return Err(CliError::config(format!(
                "{} already exists (use --force to overwrite)",
                path.display()
            )));
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&path, DEFAULT_CONFIG_TEMPLATE)?;

        info!("Configuration written to {}", path.display());
        Ok(())
    }
}
