use thiserror::Error;

/// Failures surfaced by a [`crate::catalog::CatalogClient`].
///
/// Callers in this crate never propagate these to the UI; they are absorbed
/// into empty pages, "no trailer" outcomes or a halted accumulation.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Catalog responded with status {status} for {endpoint}")]
    Status { status: u16, endpoint: String },

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Invalid catalog URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("No catalog API token configured")]
    MissingApiToken,
}

impl CatalogError {
    /// Whether the failure is worth retrying later (everything except a
    /// confirmed missing item or a broken setup).
    pub fn is_transient(&self) -> bool {
        match self {
            CatalogError::Network(_) => true,
            CatalogError::Status { status, .. } => {
                *status == 429 || *status >= 500
            }
            CatalogError::Decode(_) => true,
            CatalogError::NotFound(_)
            | CatalogError::InvalidUrl(_)
            | CatalogError::MissingApiToken => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Invalid configuration values rejected before any work starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Visibility threshold {0} is outside 0.0..=1.0")]
    InvalidThreshold(f32),

    #[error("Feed page ceiling must be at least 1")]
    ZeroPageCeiling,

    #[error("Feed target size must be at least 1")]
    ZeroTargetSize,
}
