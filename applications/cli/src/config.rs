/// Application configuration
use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkup_client::ClientConfig;
use walkup_core::SegmentPolicy;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "walkup.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub auth: AuthSettings,

    #[serde(default)]
    pub playback: PlaybackSettings,

    #[serde(default)]
    pub segments: SegmentPolicy,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthSettings {
    /// Provider access token, usually from `WALKUP_AUTH__ACCESS_TOKEN`
    #[serde(default)]
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PlaybackSettings {
    /// Device to transfer playback to, matched by name
    #[serde(default)]
    pub device_name: Option<String>,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `walkup.toml` is read when
    /// present. `WALKUP_`-prefixed variables override both, with `__`
    /// between section and key (`WALKUP_CLIENT__MAX_RETRIES=5`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("WALKUP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.client
            .validate()
            .map_err(|e| CliError::Config(e.to_string()))?;
        self.segments
            .validate()
            .map_err(|e| CliError::Config(e.to_string()))?;
        Ok(())
    }

    /// Access token for commands that talk to the provider
    pub fn access_token(&self) -> Result<&str> {
        self.auth
            .access_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                CliError::Config(
                    "Access token is required (set WALKUP_AUTH__ACCESS_TOKEN)".to_string(),
                )
            })
    }
}
