//! Layered configuration.
//!
//! Values are resolved in this order, later layers winning:
//! 1. compiled defaults
//! 2. `<config dir>/settings.json` (missing file means defaults)
//! 3. `TASKMINDER_*` environment variables
//! 4. an explicit data directory passed by the caller (the CLI `--data-dir`)
//!
//! The config dir is the explicit data directory if given, else
//! `TASKMINDER_DATA_DIR`, else `~/.taskminder`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const ENV_DATA_DIR: &str = "TASKMINDER_DATA_DIR";
pub const ENV_LOG_LEVEL: &str = "TASKMINDER_LOG_LEVEL";
pub const ENV_SCAN_INTERVAL: &str = "TASKMINDER_SCAN_INTERVAL_SECS";

const DEFAULT_DIR_NAME: &str = ".taskminder";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Where `tasks.json` lives. `None` means the config dir.
    pub data_dir: Option<PathBuf>,
    pub log_level: String,
    pub reminder: ReminderSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: None,
            log_level: "warn".to_string(),
            reminder: ReminderSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReminderSettings {
    pub scan_interval_secs: u64,
    pub banner_secs: u64,
    /// Re-flag an overdue task on every scan. When false, each task is
    /// announced once per monitor lifetime.
    pub repeat_overdue: bool,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            scan_interval_secs: 60,
            banner_secs: 5,
            repeat_overdue: true,
        }
    }
}

impl ReminderSettings {
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs.max(1))
    }

    pub fn banner_duration(&self) -> Duration {
        Duration::from_secs(self.banner_secs)
    }
}

impl Settings {
    /// Loads settings for the given data directory override.
    pub fn load(data_dir: Option<&Path>) -> Result<Self, SettingsError> {
        Self::load_with_env(data_dir, |key| std::env::var(key).ok())
    }

    pub fn load_with_env(
        data_dir: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SettingsError> {
        let config_dir = match (data_dir, env(ENV_DATA_DIR)) {
            (Some(dir), _) => dir.to_path_buf(),
            (None, Some(dir)) => PathBuf::from(dir),
            (None, None) => default_config_dir()?,
        };

        let mut settings = Self::from_file(&config_dir.join(SETTINGS_FILE_NAME))?;
        settings.apply_env(&env)?;
        if data_dir.is_some() || settings.data_dir.is_none() {
            settings.data_dir = Some(config_dir);
        }
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no settings file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(SettingsError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_str(&raw).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_env(&mut self, env: &impl Fn(&str) -> Option<String>) -> Result<(), SettingsError> {
        if let Some(dir) = env(ENV_DATA_DIR) {
            self.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(level) = env(ENV_LOG_LEVEL) {
            self.log_level = level;
        }
        if let Some(value) = env(ENV_SCAN_INTERVAL) {
            self.reminder.scan_interval_secs =
                value.trim().parse().map_err(|_| SettingsError::Env {
                    key: ENV_SCAN_INTERVAL,
                    value,
                })?;
        }
        Ok(())
    }

    /// The resolved data directory. Always set after [`Settings::load`].
    pub fn data_dir(&self) -> Result<PathBuf, SettingsError> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_config_dir(),
        }
    }
}

pub fn default_config_dir() -> Result<PathBuf, SettingsError> {
    let home_dir = dirs::home_dir().ok_or(SettingsError::NoHomeDir)?;
    Ok(home_dir.join(DEFAULT_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_file() {
        let dir = tempdir().unwrap();
        let settings = Settings::load_with_env(Some(dir.path()), env_from(&[])).unwrap();

        assert_eq!(settings.log_level, "warn");
        assert_eq!(settings.reminder, ReminderSettings::default());
        assert_eq!(settings.data_dir().unwrap(), dir.path());
    }

    #[test]
    fn test_partial_file_is_merged_over_defaults() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(SETTINGS_FILE_NAME),
            r#"{"logLevel":"debug","reminder":{"bannerSecs":8}}"#,
        )
        .unwrap();

        let settings = Settings::load_with_env(Some(dir.path()), env_from(&[])).unwrap();
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.reminder.banner_secs, 8);
        assert_eq!(settings.reminder.scan_interval_secs, 60);
        assert!(settings.reminder.repeat_overdue);
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(SETTINGS_FILE_NAME),
            r#"{"reminder":{"scanIntervalSecs":30}}"#,
        )
        .unwrap();

        let env = env_from(&[
            (ENV_DATA_DIR, dir.path().to_str().unwrap()),
            (ENV_SCAN_INTERVAL, "10"),
            (ENV_LOG_LEVEL, "info"),
        ]);
        let settings = Settings::load_with_env(None, env).unwrap();
        assert_eq!(settings.reminder.scan_interval_secs, 10);
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.data_dir().unwrap(), dir.path());
    }

    #[test]
    fn test_data_dir_precedence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(&path, r#"{"dataDir":"/srv/tasks"}"#).unwrap();

        let from_file = Settings::from_file(&path).unwrap();
        assert_eq!(from_file.data_dir().unwrap(), PathBuf::from("/srv/tasks"));

        // The env var both locates the file and overrides its dataDir.
        let env = env_from(&[(ENV_DATA_DIR, dir.path().to_str().unwrap())]);
        let settings = Settings::load_with_env(None, env).unwrap();
        assert_eq!(settings.data_dir().unwrap(), dir.path());

        let flag = tempdir().unwrap();
        fs::write(flag.path().join(SETTINGS_FILE_NAME), r#"{"dataDir":"/srv/tasks"}"#).unwrap();
        let settings = Settings::load_with_env(Some(flag.path()), env_from(&[])).unwrap();
        assert_eq!(settings.data_dir().unwrap(), flag.path());
    }

    #[test]
    fn test_invalid_values_are_errors() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(SETTINGS_FILE_NAME), "{ nope").unwrap();
        assert!(matches!(
            Settings::load_with_env(Some(dir.path()), env_from(&[])),
            Err(SettingsError::Parse { .. })
        ));

        let clean = tempdir().unwrap();
        let env = env_from(&[(ENV_SCAN_INTERVAL, "soon")]);
        assert!(matches!(
            Settings::load_with_env(Some(clean.path()), env),
            Err(SettingsError::Env { .. })
        ));
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let reminder = ReminderSettings {
            scan_interval_secs: 0,
            ..ReminderSettings::default()
        };
        assert_eq!(reminder.scan_interval(), Duration::from_secs(1));
    }
}
