//! Wire shapes exchanged with the notification surface and the foreground
//! message channel.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::settings::Settings;
use crate::task::Task;

/// Vibration pattern in milliseconds: buzz, pause, buzz, pause, buzz.
pub const VIBRATION_PATTERN: [u32; 5] = [200, 100, 200, 100, 200];

/// Action buttons offered on an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationAction {
    Complete,
    Snooze,
}

impl NotificationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationAction::Complete => "complete",
            NotificationAction::Snooze => "snooze",
        }
    }
}

impl FromStr for NotificationAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "complete" => Ok(NotificationAction::Complete),
            "snooze" => Ok(NotificationAction::Snooze),
            other => Err(format!("unknown notification action: {other}")),
        }
    }
}

impl fmt::Display for NotificationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionButton {
    pub action: NotificationAction,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    pub task_id: String,
    pub origin_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    /// Alerts with the same tag replace each other.
    pub tag: String,
    pub require_interaction: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vibration_pattern: Option<Vec<u32>>,
    pub silent: bool,
    pub data: NotificationData,
    pub actions: Vec<ActionButton>,
}

impl NotificationPayload {
    pub fn for_task(task: &Task, settings: &Settings, origin_url: &str) -> Self {
        Self {
            title: format!("⏰ {}", task.title),
            body: task.reminder_body(),
            tag: task.id.clone(),
            require_interaction: true,
            vibration_pattern: task.vibration.then(|| VIBRATION_PATTERN.to_vec()),
            silent: !task.notification_sound,
            data: NotificationData {
                task_id: task.id.clone(),
                origin_url: origin_url.to_string(),
            },
            actions: vec![
                ActionButton {
                    action: NotificationAction::Complete,
                    title: "✓ Complete".to_string(),
                },
                ActionButton {
                    action: NotificationAction::Snooze,
                    title: format!("💤 Snooze {}min", settings.snooze_minutes),
                },
            ],
        }
    }

    /// Alert used by the "test notification" command.
    pub fn test(origin_url: &str) -> Self {
        Self {
            title: "⏰ Daybell".to_string(),
            body: "Notifications are working.".to_string(),
            tag: "daybell-test".to_string(),
            require_interaction: false,
            vibration_pattern: Some(VIBRATION_PATTERN.to_vec()),
            silent: false,
            data: NotificationData {
                task_id: String::new(),
                origin_url: origin_url.to_string(),
            },
            actions: Vec::new(),
        }
    }
}

/// Message posted from the notification surface to the foreground app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ForegroundMessage {
    #[serde(rename = "TASK_COMPLETE", rename_all = "camelCase")]
    TaskComplete { task_id: String },
    #[serde(rename = "TASK_SNOOZE", rename_all = "camelCase")]
    TaskSnooze {
        task_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minutes: Option<u32>,
    },
}

impl ForegroundMessage {
    pub fn task_id(&self) -> &str {
        match self {
            ForegroundMessage::TaskComplete { task_id } | ForegroundMessage::TaskSnooze { task_id, .. } => task_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{NewTask, Recurrence};
    use chrono::{TimeZone, Utc};

    fn task(notes: Option<&str>) -> Task {
        let mut new = NewTask::new("Stretch", "09:00".parse().unwrap(), Recurrence::Daily);
        if let Some(notes) = notes {
            new = new.with_notes(notes);
        }
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        Task::create(new, &Settings::default(), now).unwrap()
    }

    #[test]
    fn payload_uses_notes_or_default_body() {
        let settings = Settings::default();
        let plain = NotificationPayload::for_task(&task(None), &settings, "daybell://app");
        assert_eq!(plain.title, "⏰ Stretch");
        assert_eq!(plain.body, "Time for: Stretch");
        assert!(plain.require_interaction);

        let noted = NotificationPayload::for_task(&task(Some("neck and back")), &settings, "daybell://app");
        assert_eq!(noted.body, "neck and back");
    }

    #[test]
    fn payload_reflects_modalities() {
        let mut t = task(None);
        t.vibration = false;
        t.notification_sound = false;
        let payload = NotificationPayload::for_task(&t, &Settings::default(), "daybell://app");
        assert!(payload.silent);
        assert!(payload.vibration_pattern.is_none());
        assert_eq!(payload.tag, t.id);
        assert_eq!(payload.data.task_id, t.id);

        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("vibrationPattern").is_none());
        assert_eq!(json["requireInteraction"], true);
        assert_eq!(json["actions"][1]["action"], "snooze");
    }

    #[test]
    fn foreground_message_wire_format() {
        let msg: ForegroundMessage = serde_json::from_str(r#"{"type":"TASK_SNOOZE","taskId":"a","minutes":10}"#).unwrap();
        assert_eq!(
            msg,
            ForegroundMessage::TaskSnooze {
                task_id: "a".to_string(),
                minutes: Some(10)
            }
        );
        let done = serde_json::to_string(&ForegroundMessage::TaskComplete { task_id: "b".to_string() }).unwrap();
        assert_eq!(done, r#"{"type":"TASK_COMPLETE","taskId":"b"}"#);
    }
}
