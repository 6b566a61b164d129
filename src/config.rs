// Configuration management module
// Handles loading, saving, and validating configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::media_monitor::{LOOP_TOLERANCE_SECS, MIN_PLAY_SECS};

pub const DEFAULT_LASTFM_API_URL: &str = "https://ws.audioscrobbler.com/2.0/";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Refresh interval in seconds for polling the player page
    pub refresh_interval: u64,

    /// Scrobble timing policy
    #[serde(default)]
    pub scrobble: ScrobblePolicy,

    /// Text cleanup configuration
    #[serde(default)]
    pub cleanup: CleanupConfig,

    /// Last.fm configuration
    #[serde(default)]
    pub lastfm: LastFmConfig,

    /// Discord rich presence configuration
    #[serde(default)]
    pub presence: PresenceConfig,

    /// Where samples come from
    #[serde(default)]
    pub sampler: SamplerConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrobblePolicy {
    /// Seconds of wall-clock play before a track may be scrobbled
    pub min_play_seconds: u64,

    /// How far the reported position may fall behind our own clock
    /// before the play is treated as a restart
    pub loop_tolerance_seconds: u64,
}

impl Default for ScrobblePolicy {
    fn default() -> Self {
        Self {
            min_play_seconds: MIN_PLAY_SECS,
            loop_tolerance_seconds: LOOP_TOLERANCE_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// Enable text cleanup
    pub enabled: bool,

    /// Regex patterns to remove from track/artist names
    /// Applied in order, each pattern is removed from the text
    pub patterns: Vec<String>,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            patterns: vec![
                r"\s*\[Explicit\]".to_string(),
                r"\s*\[Clean\]".to_string(),
                r"\s*\(Explicit\)".to_string(),
                r"\s*\(Clean\)".to_string(),
                r"\s*- Explicit".to_string(),
                r"\s*- Clean".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastFmConfig {
    pub enabled: bool,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    #[serde(default)]
    pub session_key: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

fn default_api_url() -> String {
    DEFAULT_LASTFM_API_URL.to_string()
}

impl Default for LastFmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            api_secret: String::new(),
            session_key: String::new(),
            api_url: default_api_url(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PresenceConfig {
    pub enabled: bool,
    /// Discord application id
    #[serde(default)]
    pub client_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Program and arguments printing one JSON sample per run.
    /// Empty means samples are read line by line from stdin.
    #[serde(default)]
    pub command: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval: 5,
            scrobble: ScrobblePolicy::default(),
            cleanup: CleanupConfig::default(),
            lastfm: LastFmConfig::default(),
            presence: PresenceConfig::default(),
            sampler: SamplerConfig::default(),
        }
    }
}

impl Config {
    /// Get the default path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?;

        Ok(config_dir.join("scrobble_relay.toml"))
    }

    /// Load configuration from file, or create default if it doesn't exist
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            log::info!("Config file not found, creating default at {:?}", config_path);
            let default_config = Self::default();
            default_config.save(config_path)?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file {:?}", config_path))?;

        let config: Config = toml::from_str(&content)
            .context("Failed to parse config file")?;

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, config_path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        fs::write(config_path, content)
            .context("Failed to write config file")?;

        log::info!("Config saved to {:?}", config_path);

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.refresh_interval == 0 {
            anyhow::bail!("refresh_interval must be greater than 0");
        }

        if self.scrobble.min_play_seconds == 0 {
            anyhow::bail!("scrobble.min_play_seconds must be greater than 0");
        }

        if !self.lastfm.enabled && !self.presence.enabled {
            log::warn!("Neither Last.fm nor rich presence is enabled");
        }

        // Credentials may legitimately be missing until `auth` has run;
        // submissions are skipped in that case, so only warn here.
        if self.lastfm.enabled {
            if self.lastfm.api_key.is_empty() || self.lastfm.api_secret.is_empty() {
                log::warn!("Last.fm is enabled but api_key/api_secret are not set");
            } else if self.lastfm.session_key.is_empty() {
                log::warn!("Last.fm is enabled but no session key is stored, run `auth` first");
            }
            if self.lastfm.api_url.is_empty() {
                anyhow::bail!("lastfm.api_url must not be empty");
            }
        }

        if self.presence.enabled && self.presence.client_id.is_empty() {
            anyhow::bail!("presence.client_id is required when rich presence is enabled");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_creates_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("relay.toml");

        let config = Config::load(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.toml");

        let mut config = Config::default();
        config.refresh_interval = 3;
        config.lastfm.enabled = true;
        config.lastfm.api_key = "key".into();
        config.lastfm.api_secret = "secret".into();
        config.sampler.command = vec!["scrape".into(), "--json".into()];
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn sparse_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.toml");
        fs::write(&path, "refresh_interval = 5\n\n[scrobble]\nloop_tolerance_seconds = 10\n\n[lastfm]\nenabled = false\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.scrobble.min_play_seconds, 30);
        assert_eq!(config.scrobble.loop_tolerance_seconds, 10);
        assert_eq!(config.lastfm.api_url, DEFAULT_LASTFM_API_URL);
        assert!(config.cleanup.enabled);
    }

    #[test]
    fn rejects_zero_refresh_interval() {
        let config = Config {
            refresh_interval: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn presence_requires_client_id() {
        let mut config = Config::default();
        config.presence.enabled = true;
        assert!(config.validate().is_err());

        config.presence.client_id = "1234".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn lastfm_without_session_is_still_valid() {
        let mut config = Config::default();
        config.lastfm.enabled = true;
        config.lastfm.api_key = "key".into();
        config.lastfm.api_secret = "secret".into();
        assert!(config.validate().is_ok());
    }
}
