use reelfeed_core::ConfigError;
use thiserror::Error;

/// Problems with a loaded configuration that stop the client from starting.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigLoadError {
    #[error("No catalog API token: set TMDB_API_TOKEN (or TMDB_API_KEY)")]
    MissingApiToken,

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] ConfigError),
}
