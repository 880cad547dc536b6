//! User preferences persisted under the `settings` key.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

fn default_true() -> bool {
    true
}
fn default_snooze_minutes() -> u32 {
    5
}
fn default_alarm_sound() -> String {
    crate::notify::DEFAULT_SOUND_ID.to_string()
}
fn default_alarm_volume() -> f32 {
    0.8
}

/// Global reminder preferences. A singleton created with defaults on first run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Master switch for all reminders.
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,
    /// Default `notificationSound` for new tasks.
    #[serde(default = "default_true")]
    pub default_sound: bool,
    /// Default `vibration` for new tasks.
    #[serde(default = "default_true")]
    pub default_vibration: bool,
    #[serde(default)]
    pub dark_mode: bool,
    #[serde(default = "default_snooze_minutes")]
    pub snooze_minutes: u32,
    #[serde(default = "default_alarm_sound")]
    pub default_alarm_sound: String,
    /// 0.0 ..= 1.0
    #[serde(default = "default_alarm_volume")]
    pub alarm_volume: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            notifications_enabled: true,
            default_sound: true,
            default_vibration: true,
            dark_mode: false,
            snooze_minutes: default_snooze_minutes(),
            default_alarm_sound: default_alarm_sound(),
            alarm_volume: default_alarm_volume(),
        }
    }
}

impl Settings {
    /// Volume clamped into `0.0..=1.0`; NaN reads as silent.
    pub fn volume(&self) -> f32 {
        if self.alarm_volume.is_nan() {
            0.0
        } else {
            self.alarm_volume.clamp(0.0, 1.0)
        }
    }

    /// The same settings with `alarmVolume` clamped into `0.0..=1.0`.
    /// NaN is left for [`validate`](Self::validate) to reject.
    pub fn normalized(mut self) -> Self {
        if !self.alarm_volume.is_nan() {
            self.alarm_volume = self.alarm_volume.clamp(0.0, 1.0);
        }
        self
    }

    /// Check user-supplied values before they are stored.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.alarm_volume.is_nan() {
            return Err(ValidationError::InvalidValue {
                field: "alarmVolume".to_string(),
                message: "not a number".to_string(),
            });
        }
        if self.snooze_minutes == 0 {
            return Err(ValidationError::InvalidValue {
                field: "snoozeMinutes".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Whether a change from `previous` affects armed reminders.
    pub fn requires_rearm(&self, previous: &Settings) -> bool {
        self.notifications_enabled != previous.notifications_enabled
            || self.snooze_minutes != previous.snooze_minutes
            || self.alarm_volume != previous.alarm_volume
    }

    /// Set one field by its camelCase name, parsing `value` to the field type.
    /// Leaves `self` untouched when the result would not validate.
    pub fn set_field(&mut self, key: &str, value: &str) -> Result<(), ValidationError> {
        let mut next = self.clone();
        next.assign(key, value)?;
        let next = next.normalized();
        next.validate()?;
        *self = next;
        Ok(())
    }

    fn assign(&mut self, key: &str, value: &str) -> Result<(), ValidationError> {
        let invalid = |message: String| ValidationError::InvalidValue {
            field: key.to_string(),
            message,
        };
        let parse_bool = |v: &str| v.parse::<bool>().map_err(|e| invalid(e.to_string()));
        match key {
            "notificationsEnabled" => self.notifications_enabled = parse_bool(value)?,
            "defaultSound" => self.default_sound = parse_bool(value)?,
            "defaultVibration" => self.default_vibration = parse_bool(value)?,
            "darkMode" => self.dark_mode = parse_bool(value)?,
            "snoozeMinutes" => {
                self.snooze_minutes = value.parse().map_err(|e: std::num::ParseIntError| invalid(e.to_string()))?
            }
            "defaultAlarmSound" => self.default_alarm_sound = value.to_string(),
            "alarmVolume" => {
                self.alarm_volume = value.parse().map_err(|e: std::num::ParseFloatError| invalid(e.to_string()))?
            }
            _ => return Err(invalid("unknown settings key".to_string())),
        }
        Ok(())
    }
}
