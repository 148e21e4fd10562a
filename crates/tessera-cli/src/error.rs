//! Errors the `tessera` binary reports before exiting.

use std::path::PathBuf;

use tessera_config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("image buffer for {0} does not match its dimensions")]
    Buffer(PathBuf),

    #[error("generator thread panicked")]
    Worker,
}
