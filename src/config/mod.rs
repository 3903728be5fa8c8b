#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{Cli, ImportCli};
pub use toml_config::{AppConfig, DatabaseConfig, ImportConfig, LoggingConfig, ServerConfig};

use crate::utils::error::Result;

/// Reads the file when one is given, defaults otherwise.
pub fn load(path: Option<&str>) -> Result<AppConfig> {
    match path {
        Some(path) => {
            tracing::debug!("Loading configuration from {}", path);
            AppConfig::from_file(path)
        }
        None => Ok(AppConfig::default()),
    }
}
