//! Configuration for the tessera tools.
//!
//! Generator tunables and tool settings persist to disk as `config.ron`.
//! Command-line flags parsed by clap override the loaded values.

mod cli;
mod config;
mod error;

pub use cli::{CliArgs, GeneratorKind};
pub use config::{Config, DebugConfig, OutputConfig, TileConfig};
pub use error::ConfigError;
