use anyhow::{Context, anyhow};
use reelfeed_core::{
    CatalogConfig, CoreConfig, FeedConfig, TrailerCacheConfig, VisibilityConfig,
};
use serde::{Deserialize, Serialize};
use std::{
    env, fmt, fs,
    path::{Path, PathBuf},
};

use crate::error::ConfigLoadError;

pub const CONFIG_PATH_VAR: &str = "REELFEED_CONFIG_PATH";
pub const CONFIG_JSON_VAR: &str = "REELFEED_CONFIG_JSON";
/// Checked in order; the first non-empty value wins.
pub const TOKEN_VARS: &[&str] = &["TMDB_API_TOKEN", "TMDB_API_KEY"];

const DEFAULT_FILES: &[&str] = &[
    "reelfeed.toml",
    "reelfeed.json",
    "config/reelfeed.toml",
    "config/reelfeed.json",
];

/// Source that produced the client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfigSource {
    #[default]
    Default,
    EnvPath(PathBuf),
    EnvInline,
    File(PathBuf),
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Default => f.write_str("built-in defaults"),
            ConfigSource::EnvPath(path) => {
                write!(f, "${CONFIG_PATH_VAR} ({})", path.display())
            }
            ConfigSource::EnvInline => write!(f, "${CONFIG_JSON_VAR}"),
            ConfigSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Everything the client needs: core tuning plus the catalog credential.
///
/// Every section is optional in a file; missing values fall back to the
/// core defaults.
#[derive(Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Catalog read-access token. Usually supplied through the environment
    /// rather than written to a file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    pub catalog: CatalogConfig,
    pub feed: FeedConfig,
    pub visibility: VisibilityConfig,
    pub trailers: TrailerCacheConfig,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("catalog", &self.catalog)
            .field("feed", &self.feed)
            .field("visibility", &self.visibility)
            .field("trailers", &self.trailers)
            .finish()
    }
}

impl ClientConfig {
    /// Load configuration from the process environment and working
    /// directory. Evaluation order:
    /// 1) `$REELFEED_CONFIG_PATH` (TOML or JSON file),
    /// 2) `$REELFEED_CONFIG_JSON` (inline JSON),
    /// 3) `reelfeed.toml` / `config/reelfeed.toml` (or `.json`),
    /// 4) defaults.
    ///
    /// The token from `$TMDB_API_TOKEN` / `$TMDB_API_KEY` overrides any file
    /// value.
    pub fn load_from_env() -> anyhow::Result<(Self, ConfigSource)> {
        Self::load_with(|key| env::var(key).ok(), Path::new("."))
    }

    /// [`load_from_env`](Self::load_from_env) with an explicit variable
    /// lookup and base directory for the default file candidates.
    pub fn load_with<F>(
        lookup: F,
        base_dir: &Path,
    ) -> anyhow::Result<(Self, ConfigSource)>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let (mut config, source) = if let Some(path_str) = non_empty(CONFIG_PATH_VAR)
        {
            let path = PathBuf::from(path_str.trim());
            let config = Self::load_from_file(&path)?;
            (config, ConfigSource::EnvPath(path))
        } else if let Some(raw) = non_empty(CONFIG_JSON_VAR) {
            let parsed = Self::parse_json(&raw)
                .with_context(|| format!("failed to parse {CONFIG_JSON_VAR}"))?;
            (parsed, ConfigSource::EnvInline)
        } else if let Some(path) = Self::find_default_file(base_dir) {
            let config = Self::load_from_file(&path)?;
            (config, ConfigSource::File(path))
        } else {
            (Self::default(), ConfigSource::Default)
        };

        if let Some(token) = TOKEN_VARS.iter().find_map(|key| non_empty(key)) {
            config.api_token = Some(token.trim().to_string());
        }

        Ok((config, source))
    }

    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path).with_context(|| {
            format!("failed to read client config from {}", path.display())
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::parse_json(&contents).with_context(|| {
                format!("invalid client config {}", path.display())
            }),
            Some("toml") | Some("tml") => {
                toml::from_str(&contents).map_err(|err| {
                    anyhow!("invalid client config {}: {}", path.display(), err)
                })
            }
            _ => Self::parse_from_str(&contents, &path.display().to_string()),
        }
    }

    pub fn parse_from_str(
        contents: &str,
        origin: &str,
    ) -> anyhow::Result<Self> {
        // TOML first, then JSON.
        toml::from_str(contents).or_else(|toml_err| {
            serde_json::from_str(contents).map_err(|json_err| {
                anyhow!(
                    "failed to parse client config {}: toml error: {}; json error: {}",
                    origin,
                    toml_err,
                    json_err
                )
            })
        })
    }

    pub fn parse_json(raw: &str) -> anyhow::Result<Self> {
        serde_json::from_str(raw)
            .map_err(|err| anyhow!("invalid client config json: {err}"))
    }

    fn find_default_file(base_dir: &Path) -> Option<PathBuf> {
        DEFAULT_FILES
            .iter()
            .map(|candidate| base_dir.join(candidate))
            .find(|path| path.is_file())
    }

    /// Core settings without the credential.
    pub fn core(&self) -> CoreConfig {
        CoreConfig {
            catalog: self.catalog.clone(),
            feed: self.feed.clone(),
            visibility: self.visibility.clone(),
            trailers: self.trailers.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        self.core().validate()?;
        Ok(())
    }

    pub fn api_token(&self) -> Result<&str, ConfigLoadError> {
        self.api_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(ConfigLoadError::MissingApiToken)
    }

    /// Copy safe to print: the token, if any, is masked.
    pub fn redacted(&self) -> Self {
        Self {
            api_token: self.api_token.as_ref().map(|_| "<redacted>".to_string()),
            ..self.clone()
        }
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        toml::to_string_pretty(self).context("failed to render client config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelfeed_core::FeedOrder;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = ClientConfig::parse_from_str(
            "[feed]\ntarget_size = 60\norder = \"preserve\"\n",
            "inline",
        )
        .expect("parse");
        assert_eq!(config.feed.target_size, 60);
        assert_eq!(config.feed.order, FeedOrder::Preserve);
        assert_eq!(config.feed.max_pages, 20);
        assert_eq!(config.visibility.focus_threshold, 0.55);
        assert!(config.api_token.is_none());
    }

    #[test]
    fn json_is_accepted_as_fallback() {
        let config = ClientConfig::parse_from_str(
            r#"{"trailers": {"absent_ttl_secs": 3600}}"#,
            "inline",
        )
        .expect("parse");
        assert_eq!(config.trailers.absent_ttl_secs, Some(3600));
    }

    #[test]
    fn redaction_masks_token_everywhere() {
        let config = ClientConfig {
            api_token: Some("secret-token".into()),
            ..ClientConfig::default()
        };
        assert!(!format!("{config:?}").contains("secret-token"));
        let rendered = config.redacted().to_toml().expect("render");
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn blank_token_is_missing() {
        let config = ClientConfig {
            api_token: Some("   ".into()),
            ..ClientConfig::default()
        };
        assert!(matches!(
            config.api_token(),
            Err(ConfigLoadError::MissingApiToken)
        ));
    }
}
