//! # evw CLI
//!
//! Command-line front end for `evw-core`: loads event-camera recordings,
//! windows one substream with the selected policy and writes every emitted
//! ON/OFF frame pair as JSON lines or bincode.

pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod source;

pub use commands::EvwCli;
pub use error::{CliError, CliResult};
