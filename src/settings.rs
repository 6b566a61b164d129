// Persisted settings access
// Credentials are passed to each Last.fm call through this capability
// rather than being stored inside the client.

use anyhow::Result;
use std::fmt;
use std::path::PathBuf;

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    ApiKey,
    ApiSecret,
    SessionKey,
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ApiKey => "lastfm.api_key",
            Self::ApiSecret => "lastfm.api_secret",
            Self::SessionKey => "lastfm.session_key",
        };
        f.write_str(name)
    }
}

/// Key-value settings storage
pub trait SettingsStore {
    /// Stored value, `None` when unset or empty
    fn get(&self, key: SettingKey) -> Option<String>;

    fn set(&mut self, key: SettingKey, value: &str) -> Result<()>;
}

/// Settings kept in the `[lastfm]` section of the config file
#[derive(Debug, Clone)]
pub struct FileSettings {
    path: PathBuf,
    config: Config,
}

impl FileSettings {
    pub fn new(path: PathBuf, config: Config) -> Self {
        Self { path, config }
    }

    fn slot(&mut self, key: SettingKey) -> &mut String {
        let lastfm = &mut self.config.lastfm;
        match key {
            SettingKey::ApiKey => &mut lastfm.api_key,
            SettingKey::ApiSecret => &mut lastfm.api_secret,
            SettingKey::SessionKey => &mut lastfm.session_key,
        }
    }
}

impl SettingsStore for FileSettings {
    fn get(&self, key: SettingKey) -> Option<String> {
        let lastfm = &self.config.lastfm;
        let value = match key {
            SettingKey::ApiKey => &lastfm.api_key,
            SettingKey::ApiSecret => &lastfm.api_secret,
            SettingKey::SessionKey => &lastfm.session_key,
        };
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    }

    fn set(&mut self, key: SettingKey, value: &str) -> Result<()> {
        *self.slot(key) = value.to_string();
        self.config.save(&self.path)?;
        log::debug!("Stored {}", key);
        Ok(())
    }
}

/// In-memory settings for tests
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemorySettings(std::collections::HashMap<SettingKey, String>);

#[cfg(test)]
impl MemorySettings {
    pub fn with_credentials() -> Self {
        let mut settings = Self::default();
        settings.0.insert(SettingKey::ApiKey, "KEY".into());
        settings.0.insert(SettingKey::ApiSecret, "SECRET".into());
        settings.0.insert(SettingKey::SessionKey, "SESS".into());
        settings
    }

    pub fn without(mut self, key: SettingKey) -> Self {
        self.0.remove(&key);
        self
    }
}

#[cfg(test)]
impl SettingsStore for MemorySettings {
    fn get(&self, key: SettingKey) -> Option<String> {
        self.0.get(&key).filter(|v| !v.is_empty()).cloned()
    }

    fn set(&mut self, key: SettingKey, value: &str) -> Result<()> {
        self.0.insert(key, value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_lastfm_section() {
        let mut config = Config::default();
        config.lastfm.api_key = "key".into();
        config.lastfm.session_key = "  ".into();
        let settings = FileSettings::new(PathBuf::from("/nonexistent"), config);

        assert_eq!(settings.get(SettingKey::ApiKey).as_deref(), Some("key"));
        assert_eq!(settings.get(SettingKey::ApiSecret), None);
        assert_eq!(settings.get(SettingKey::SessionKey), None);
    }

    #[test]
    fn set_persists_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.toml");
        let mut settings = FileSettings::new(path.clone(), Config::default());

        settings.set(SettingKey::SessionKey, "abc123").unwrap();

        assert_eq!(settings.get(SettingKey::SessionKey).as_deref(), Some("abc123"));
        let reloaded = Config::load(&path).unwrap();
        assert_eq!(reloaded.lastfm.session_key, "abc123");
    }

    #[test]
    fn key_names_match_config() {
        assert_eq!(SettingKey::SessionKey.to_string(), "lastfm.session_key");
    }
}
