//! TOML-based application configuration.
//!
//! Holds the knobs that are not user preferences:
//! - Scheduler cadence (grace window, poll interval, reset check)
//! - Alarm and test-play durations, sound asset directory
//! - Capability provider selection
//! - Log level
//!
//! Configuration is stored at `~/.config/daybell/config.toml`.

use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;
use crate::notify::NotifierOptions;
use crate::platform::PlatformChoice;
use crate::recurrence::WeeklyResetPolicy;

/// Accepted range for `scheduler.poll_interval_secs`.
pub const POLL_INTERVAL_RANGE: std::ops::RangeInclusive<u64> = 30..=60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// How late a missed occurrence may still fire.
    #[serde(default = "default_grace_window_minutes")]
    pub grace_window_minutes: u32,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_reset_check_interval_secs")]
    pub reset_check_interval_secs: u64,
    #[serde(default)]
    pub weekly_reset: WeeklyResetPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmConfig {
    #[serde(default = "default_alarm_duration_secs")]
    pub alarm_duration_secs: u64,
    /// Notification chime for tasks without an alarm.
    #[serde(default = "default_chime_duration_secs")]
    pub chime_duration_secs: u64,
    #[serde(default = "default_test_duration_secs")]
    pub test_duration_secs: u64,
    /// Directory with the built-in sound files. Defaults to `<data dir>/sounds`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    #[serde(default)]
    pub kind: PlatformChoice,
    /// Sent with every alert so the surface can focus the app.
    #[serde(default = "default_origin_url")]
    pub origin_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive; `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/daybell/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub alarm: AlarmConfig,
    #[serde(default)]
    pub platform: PlatformConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

// Default functions
fn default_grace_window_minutes() -> u32 {
    5
}
fn default_poll_interval_secs() -> u64 {
    30
}
fn default_reset_check_interval_secs() -> u64 {
    60
}
fn default_alarm_duration_secs() -> u64 {
    30
}
fn default_chime_duration_secs() -> u64 {
    3
}
fn default_test_duration_secs() -> u64 {
    5
}
fn default_origin_url() -> String {
    "daybell://app".into()
}
fn default_log_level() -> String {
    "info".into()
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            grace_window_minutes: default_grace_window_minutes(),
            poll_interval_secs: default_poll_interval_secs(),
            reset_check_interval_secs: default_reset_check_interval_secs(),
            weekly_reset: WeeklyResetPolicy::default(),
        }
    }
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            alarm_duration_secs: default_alarm_duration_secs(),
            chime_duration_secs: default_chime_duration_secs(),
            test_duration_secs: default_test_duration_secs(),
            sound_dir: None,
        }
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            kind: PlatformChoice::default(),
            origin_url: default_origin_url(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(root: &'a serde_json::Value, key: &str) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(root: &mut serde_json::Value, key: &str, value: &str) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part);
                let new_value = match existing {
                    Some(serde_json::Value::Bool(_)) => {
                        serde_json::Value::Bool(value.parse::<bool>().map_err(|e| invalid(e.to_string()))?)
                    }
                    Some(serde_json::Value::Number(_)) => value
                        .parse::<u64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|_| invalid(format!("cannot parse '{value}' as a whole number")))?,
                    Some(serde_json::Value::Object(_)) | Some(serde_json::Value::Array(_)) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    Some(_) => serde_json::Value::String(value.into()),
                    // Optional fields are skipped when unset.
                    None if Self::is_optional_key(key) => serde_json::Value::String(value.into()),
                    None => return Err(unknown()),
                };
                obj.insert(part.to_string(), new_value);
                return Ok(());
            }
            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn is_optional_key(key: &str) -> bool {
        key == "alarm.sound_dir"
    }

    pub fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk, writing the default file on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "config unreadable; using defaults");
            Self::default()
        })
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key. The change is validated but not
    /// written; call [`Config::save`] afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not parse
    /// or validate.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let next: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        next.validate()?;
        *self = next;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !POLL_INTERVAL_RANGE.contains(&self.scheduler.poll_interval_secs) {
            return Err(ConfigError::InvalidValue {
                key: "scheduler.poll_interval_secs".to_string(),
                message: format!(
                    "{} is outside {}..={}",
                    self.scheduler.poll_interval_secs,
                    POLL_INTERVAL_RANGE.start(),
                    POLL_INTERVAL_RANGE.end()
                ),
            });
        }
        for (key, value) in [
            ("scheduler.reset_check_interval_secs", self.scheduler.reset_check_interval_secs),
            ("alarm.alarm_duration_secs", self.alarm.alarm_duration_secs),
            ("alarm.chime_duration_secs", self.alarm.chime_duration_secs),
            ("alarm.test_duration_secs", self.alarm.test_duration_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "must be at least 1".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn grace_window(&self) -> Duration {
        Duration::minutes(i64::from(self.scheduler.grace_window_minutes))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::seconds(self.scheduler.poll_interval_secs as i64)
    }

    pub fn reset_check_interval(&self) -> Duration {
        Duration::seconds(self.scheduler.reset_check_interval_secs as i64)
    }

    /// Configured sound directory, or `sounds/` under the data dir.
    pub fn sound_dir(&self) -> Option<PathBuf> {
        self.alarm
            .sound_dir
            .clone()
            .or_else(|| data_dir().ok().map(|d| d.join("sounds")))
    }

    pub fn notifier_options(&self) -> NotifierOptions {
        NotifierOptions {
            origin_url: self.platform.origin_url.clone(),
            alarm_duration: Duration::seconds(self.alarm.alarm_duration_secs as i64),
            chime_duration: Duration::seconds(self.alarm.chime_duration_secs as i64),
            test_duration: Duration::seconds(self.alarm.test_duration_secs as i64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.scheduler.grace_window_minutes, 5);
        assert_eq!(parsed.alarm.alarm_duration_secs, 30);
        assert_eq!(parsed.alarm.chime_duration_secs, 3);
        assert_eq!(cfg.notifier_options().chime_duration, Duration::seconds(3));
        assert_eq!(parsed.platform.kind, PlatformChoice::Auto);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: Config = toml::from_str("[scheduler]\npoll_interval_secs = 45\n").unwrap();
        assert_eq!(cfg.scheduler.poll_interval_secs, 45);
        assert_eq!(cfg.scheduler.reset_check_interval_secs, 60);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("scheduler.poll_interval_secs").as_deref(), Some("30"));
        assert_eq!(cfg.get("scheduler.weekly_reset").as_deref(), Some("retain"));
        assert_eq!(cfg.get("platform.kind").as_deref(), Some("auto"));
        assert!(cfg.get("scheduler.missing").is_none());
    }

    #[test]
    fn set_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.set("scheduler.grace_window_minutes", "10").unwrap();
        cfg.set("scheduler.weekly_reset", "next-occurrence").unwrap();
        cfg.set("platform.kind", "web-fallback").unwrap();
        cfg.set("alarm.sound_dir", "/tmp/sounds").unwrap();
        assert_eq!(cfg.grace_window(), Duration::minutes(10));
        assert_eq!(cfg.scheduler.weekly_reset, WeeklyResetPolicy::NextOccurrence);
        assert_eq!(cfg.platform.kind, PlatformChoice::WebFallback);
        assert_eq!(cfg.alarm.sound_dir, Some(PathBuf::from("/tmp/sounds")));
    }

    #[test]
    fn set_rejects_unknown_key_and_bad_values() {
        let mut cfg = Config::default();
        assert!(matches!(cfg.set("scheduler.nope", "1"), Err(ConfigError::UnknownKey(_))));
        assert!(cfg.set("platform.kind", "desktop").is_err());
        assert!(cfg.set("scheduler.poll_interval_secs", "abc").is_err());
        // Out of the 30..=60 range; previous value is kept.
        assert!(cfg.set("scheduler.poll_interval_secs", "10").is_err());
        assert_eq!(cfg.scheduler.poll_interval_secs, 30);
    }

    #[test]
    fn load_from_writes_default_on_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.scheduler.poll_interval_secs, 30);

        let mut changed = cfg.clone();
        changed.set("logging.level", "debug").unwrap();
        changed.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().logging.level, "debug");
    }

    #[test]
    fn load_from_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[scheduler]\npoll_interval_secs = 5\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
