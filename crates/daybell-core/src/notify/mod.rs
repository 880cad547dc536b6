//! Notifier: turns a due task into visual, audio and haptic effects.
//!
//! Every modality is attempted independently. A failure in one is logged and
//! the rest still run; sound degrades along a ladder (asset, synthesized
//! tone, silence) instead of failing.

mod payload;
mod permission;
mod player;
mod sound;

pub use payload::{
    ActionButton, ForegroundMessage, NotificationAction, NotificationData, NotificationPayload, VIBRATION_PATTERN,
};
pub use permission::{PermissionGate, PermissionOutcome, PermissionState};
pub use player::{AlarmPlayer, Playback, PlaybackKind};
pub use sound::{
    CustomSound, SoundInfo, SoundLibrary, SoundSource, ToneSpec, CUSTOM_SOUND_EXTENSIONS, MAX_CUSTOM_SOUND_BYTES,
};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::platform::{AudioOutput, Haptics, NotificationSurface};
use crate::settings::Settings;
use crate::task::Task;

/// Sound id every install has.
pub const DEFAULT_SOUND_ID: &str = "default";

/// Which step of the sound ladder was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundOutcome {
    /// Task has neither alarm nor notification sound.
    Off,
    Asset,
    Tone,
    Silent,
}

/// What a `notify` call actually delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEffect {
    pub task_id: String,
    pub visual: bool,
    pub vibrated: bool,
    pub sound: SoundOutcome,
}

#[derive(Debug, Clone)]
pub struct NotifierOptions {
    pub origin_url: String,
    pub alarm_duration: Duration,
    /// Short notification chime for tasks without an alarm.
    pub chime_duration: Duration,
    pub test_duration: Duration,
}

impl Default for NotifierOptions {
    fn default() -> Self {
        Self {
            origin_url: "daybell://app".to_string(),
            alarm_duration: Duration::seconds(30),
            chime_duration: Duration::seconds(3),
            test_duration: Duration::seconds(5),
        }
    }
}

pub struct Notifier {
    surface: Box<dyn NotificationSurface>,
    haptics: Box<dyn Haptics>,
    audio: Box<dyn AudioOutput>,
    permission: PermissionGate,
    sounds: SoundLibrary,
    player: AlarmPlayer,
    options: NotifierOptions,
}

impl Notifier {
    pub fn new(
        surface: Box<dyn NotificationSurface>,
        haptics: Box<dyn Haptics>,
        audio: Box<dyn AudioOutput>,
        sounds: SoundLibrary,
        options: NotifierOptions,
    ) -> Self {
        let permission = PermissionGate::new(surface.permission());
        Self {
            surface,
            haptics,
            audio,
            permission,
            sounds,
            player: AlarmPlayer::new(),
            options,
        }
    }

    pub fn permission(&self) -> PermissionState {
        self.permission.state()
    }

    pub fn request_permission(&mut self) -> PermissionOutcome {
        self.permission.request(self.surface.as_mut())
    }

    pub fn sounds(&self) -> &SoundLibrary {
        &self.sounds
    }

    pub fn sounds_mut(&mut self) -> &mut SoundLibrary {
        &mut self.sounds
    }

    pub fn playing(&self) -> Option<&Playback> {
        self.player.current()
    }

    /// Deliver every enabled modality for `task`.
    pub fn notify(&mut self, task: &Task, settings: &Settings, now: DateTime<Utc>) -> NotificationEffect {
        let visual = self.show(&NotificationPayload::for_task(task, settings, &self.options.origin_url));

        let vibrated = task.vibration
            && match self.haptics.vibrate(&VIBRATION_PATTERN) {
                Ok(()) => true,
                Err(e) => {
                    tracing::debug!(task_id = %task.id, error = %e, "vibration skipped");
                    false
                }
            };

        let sound = if task.alarm_enabled {
            self.play(
                PlaybackKind::Alarm,
                &task.alarm_sound,
                Some(&task.id),
                settings.volume(),
                now + self.options.alarm_duration,
            )
        } else if task.notification_sound {
            self.play(
                PlaybackKind::Chime,
                DEFAULT_SOUND_ID,
                Some(&task.id),
                settings.volume(),
                now + self.options.chime_duration,
            )
        } else {
            SoundOutcome::Off
        };

        tracing::info!(task_id = %task.id, visual, vibrated, ?sound, "reminder delivered");
        NotificationEffect {
            task_id: task.id.clone(),
            visual,
            vibrated,
            sound,
        }
    }

    /// Show the test alert. Returns whether it reached the surface.
    pub fn test_notification(&mut self) -> bool {
        self.show(&NotificationPayload::test(&self.options.origin_url))
    }

    /// Preview a sound for the configured test duration.
    pub fn test_alarm(&mut self, sound_id: &str, volume: f32, now: DateTime<Utc>) -> SoundOutcome {
        self.play(
            PlaybackKind::Test,
            sound_id,
            None,
            volume.clamp(0.0, 1.0),
            now + self.options.test_duration,
        )
    }

    pub fn stop_alarm(&mut self) -> Option<Playback> {
        self.player.stop(self.audio.as_mut())
    }

    pub fn stop_alarm_for(&mut self, task_id: &str) -> Option<Playback> {
        self.player.stop_for_task(self.audio.as_mut(), task_id)
    }

    /// Auto-stop and loop maintenance. Returns the playback that ended.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<Playback> {
        self.player.tick(self.audio.as_mut(), now)
    }

    fn show(&mut self, payload: &NotificationPayload) -> bool {
        if !self.permission.is_granted() {
            // The user may have granted it outside the app since last check.
            if self.permission.refresh(self.surface.as_ref()) == PermissionState::Default {
                // Never answered: ask once. A denial is never re-prompted.
                self.permission.request(self.surface.as_mut());
            }
            if !self.permission.is_granted() {
                tracing::debug!(tag = %payload.tag, "visual alert skipped: permission not granted");
                return false;
            }
        }
        match self.surface.show(payload) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(tag = %payload.tag, error = %e, "visual alert failed");
                false
            }
        }
    }

    fn play(
        &mut self,
        kind: PlaybackKind,
        sound_id: &str,
        task_id: Option<&str>,
        volume: f32,
        stop_at: DateTime<Utc>,
    ) -> SoundOutcome {
        let mut playback = Playback {
            kind,
            sound_id: sound_id.to_string(),
            task_id: task_id.map(str::to_string),
            source: SoundSource::Tone(ToneSpec::new(volume)),
            volume,
            looping: kind == PlaybackKind::Alarm,
            stop_at,
        };

        match self.sounds.resolve(sound_id) {
            Ok(source) => {
                playback.source = source;
                match self.player.start(self.audio.as_mut(), playback.clone()) {
                    Ok(()) => return SoundOutcome::Asset,
                    Err(e) => tracing::warn!(sound = sound_id, error = %e, "sound playback failed; trying tone"),
                }
                playback.source = SoundSource::Tone(ToneSpec::new(volume));
            }
            Err(e) => tracing::warn!(sound = sound_id, error = %e, "sound unavailable; trying tone"),
        }

        match self.player.start(self.audio.as_mut(), playback) {
            Ok(()) => SoundOutcome::Tone,
            Err(e) => {
                tracing::warn!(sound = sound_id, error = %e, "tone playback failed; staying silent");
                SoundOutcome::Silent
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CapabilityError;
    use crate::task::{NewTask, Recurrence};
    use chrono::TimeZone;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Log(Arc<Mutex<Vec<String>>>);

    impl Log {
        fn push(&self, s: impl Into<String>) {
            self.0.lock().unwrap().push(s.into());
        }
        fn entries(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    struct Surface(Log, PermissionState);
    impl NotificationSurface for Surface {
        fn permission(&self) -> PermissionState {
            self.1
        }
        fn request_permission(&mut self) -> PermissionState {
            self.1
        }
        fn show(&mut self, payload: &NotificationPayload) -> Result<(), CapabilityError> {
            self.0.push(format!("show:{}", payload.title));
            Ok(())
        }
    }

    struct BrokenHaptics;
    impl Haptics for BrokenHaptics {
        fn vibrate(&mut self, _pattern: &[u32]) -> Result<(), CapabilityError> {
            Err(CapabilityError::Backend("motor stalled".to_string()))
        }
    }

    /// Plays only tones, like a host without an audio player.
    struct ToneAudio(Log);
    impl AudioOutput for ToneAudio {
        fn play(&mut self, source: &SoundSource, _volume: f32) -> Result<(), CapabilityError> {
            match source {
                SoundSource::Tone(_) => {
                    self.0.push("tone");
                    Ok(())
                }
                _ => Err(CapabilityError::Unsupported { capability: "audio" }),
            }
        }
        fn is_playing(&mut self) -> bool {
            true
        }
        fn stop(&mut self) {
            self.0.push("stop");
        }
    }

    fn notifier(log: &Log, permission: PermissionState) -> Notifier {
        Notifier::new(
            Box::new(Surface(log.clone(), permission)),
            Box::new(BrokenHaptics),
            Box::new(ToneAudio(log.clone())),
            SoundLibrary::new(None),
            NotifierOptions::default(),
        )
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
    }

    fn alarm_task() -> Task {
        let new = NewTask::new("Pills", "09:00".parse().unwrap(), Recurrence::Daily).with_alarm("alarm-2");
        Task::create(new, &Settings::default(), now()).unwrap()
    }

    #[test]
    fn missing_asset_falls_back_to_tone() {
        let log = Log::default();
        let mut n = notifier(&log, PermissionState::Granted);
        let effect = n.notify(&alarm_task(), &Settings::default(), now());
        assert!(effect.visual);
        assert!(!effect.vibrated);
        assert_eq!(effect.sound, SoundOutcome::Tone);
        assert_eq!(log.entries(), vec!["show:⏰ Pills", "tone"]);
        assert_eq!(n.playing().unwrap().stop_at, now() + Duration::seconds(30));
    }

    #[test]
    fn without_permission_sound_still_plays() {
        let log = Log::default();
        let mut n = notifier(&log, PermissionState::Denied);
        let effect = n.notify(&alarm_task(), &Settings::default(), now());
        assert!(!effect.visual);
        assert_eq!(effect.sound, SoundOutcome::Tone);
    }

    #[test]
    fn silent_task_plays_nothing() {
        let log = Log::default();
        let mut n = notifier(&log, PermissionState::Granted);
        let mut task = alarm_task();
        task.alarm_enabled = false;
        task.notification_sound = false;
        assert_eq!(n.notify(&task, &Settings::default(), now()).sound, SoundOutcome::Off);
        assert!(n.playing().is_none());
    }

    #[test]
    fn chime_uses_default_sound_for_its_own_duration() {
        let log = Log::default();
        let mut n = notifier(&log, PermissionState::Granted);
        let mut task = alarm_task();
        task.alarm_enabled = false;
        assert_eq!(n.notify(&task, &Settings::default(), now()).sound, SoundOutcome::Tone);
        let playing = n.playing().unwrap();
        assert_eq!(playing.kind, PlaybackKind::Chime);
        assert_eq!(playing.sound_id, DEFAULT_SOUND_ID);
        assert!(!playing.looping);
        assert_eq!(playing.stop_at, now() + Duration::seconds(3));
    }

    #[test]
    fn unanswered_permission_is_requested_on_first_alert() {
        let log = Log::default();
        let mut n = Notifier::new(
            Box::new(crate::platform::LogSurface::default()),
            Box::new(BrokenHaptics),
            Box::new(ToneAudio(log.clone())),
            SoundLibrary::new(None),
            NotifierOptions::default(),
        );
        assert_eq!(n.permission(), PermissionState::Default);
        assert!(n.notify(&alarm_task(), &Settings::default(), now()).visual);
        assert_eq!(n.permission(), PermissionState::Granted);
    }

    #[test]
    fn test_alarm_stops_after_test_duration() {
        let log = Log::default();
        let mut n = notifier(&log, PermissionState::Granted);
        assert_eq!(n.test_alarm("alarm-1", 0.5, now()), SoundOutcome::Tone);
        assert!(n.tick(now() + Duration::seconds(4)).is_none());
        let stopped = n.tick(now() + Duration::seconds(5)).unwrap();
        assert_eq!(stopped.kind, PlaybackKind::Test);
    }
}
