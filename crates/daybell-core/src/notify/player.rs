//! Single playback slot with auto-stop.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::SoundSource;
use crate::error::CapabilityError;
use crate::platform::AudioOutput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackKind {
    /// Looping task alarm.
    Alarm,
    /// Short one-off sound for a task without an alarm.
    Chime,
    /// User-triggered preview.
    Test,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Playback {
    pub kind: PlaybackKind,
    pub sound_id: String,
    pub task_id: Option<String>,
    pub source: SoundSource,
    pub volume: f32,
    pub looping: bool,
    pub stop_at: DateTime<Utc>,
}

/// Holds at most one playing sound. Starting another stops the current one.
#[derive(Debug, Default)]
pub struct AlarmPlayer {
    current: Option<Playback>,
}

impl AlarmPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Playback> {
        self.current.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    pub fn start(&mut self, audio: &mut dyn AudioOutput, playback: Playback) -> Result<(), CapabilityError> {
        if let Some(previous) = self.stop(audio) {
            tracing::debug!(sound = %previous.sound_id, "replaced by new playback");
        }
        audio.play(&playback.source, playback.volume)?;
        tracing::debug!(sound = %playback.sound_id, kind = ?playback.kind, stop_at = %playback.stop_at, "playback started");
        self.current = Some(playback);
        Ok(())
    }

    pub fn stop(&mut self, audio: &mut dyn AudioOutput) -> Option<Playback> {
        let previous = self.current.take()?;
        audio.stop();
        Some(previous)
    }

    /// Stop only when the current playback belongs to `task_id`.
    pub fn stop_for_task(&mut self, audio: &mut dyn AudioOutput, task_id: &str) -> Option<Playback> {
        match &self.current {
            Some(p) if p.task_id.as_deref() == Some(task_id) => self.stop(audio),
            _ => None,
        }
    }

    /// Auto-stop at the deadline; restart looping sounds that ended early.
    /// Returns the playback that was stopped, if any.
    pub fn tick(&mut self, audio: &mut dyn AudioOutput, now: DateTime<Utc>) -> Option<Playback> {
        let current = self.current.as_ref()?;
        if now >= current.stop_at {
            return self.stop(audio);
        }
        if current.looping && !audio.is_playing() {
            if let Err(e) = audio.play(&current.source, current.volume) {
                tracing::warn!(sound = %current.sound_id, error = %e, "alarm loop restart failed");
                return self.stop(audio);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::ToneSpec;
    use chrono::{Duration, TimeZone};

    #[derive(Default)]
    struct FakeAudio {
        plays: usize,
        stops: usize,
        playing: bool,
    }

    impl AudioOutput for FakeAudio {
        fn play(&mut self, _source: &SoundSource, _volume: f32) -> Result<(), CapabilityError> {
            self.plays += 1;
            self.playing = true;
            Ok(())
        }

        fn is_playing(&mut self) -> bool {
            self.playing
        }

        fn stop(&mut self) {
            self.stops += 1;
            self.playing = false;
        }
    }

    fn playback(id: &str, start: DateTime<Utc>, looping: bool) -> Playback {
        Playback {
            kind: PlaybackKind::Alarm,
            sound_id: id.to_string(),
            task_id: Some(id.to_string()),
            source: SoundSource::Tone(ToneSpec::new(1.0)),
            volume: 1.0,
            looping,
            stop_at: start + Duration::seconds(30),
        }
    }

    #[test]
    fn new_alarm_stops_previous() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let mut audio = FakeAudio::default();
        let mut player = AlarmPlayer::new();
        player.start(&mut audio, playback("a", t0, true)).unwrap();
        player.start(&mut audio, playback("b", t0, true)).unwrap();
        assert_eq!(audio.stops, 1);
        assert_eq!(player.current().unwrap().sound_id, "b");
    }

    #[test]
    fn auto_stops_at_deadline_and_loops_before() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let mut audio = FakeAudio::default();
        let mut player = AlarmPlayer::new();
        player.start(&mut audio, playback("a", t0, true)).unwrap();

        audio.playing = false; // sound file ended
        assert!(player.tick(&mut audio, t0 + Duration::seconds(10)).is_none());
        assert_eq!(audio.plays, 2);

        let stopped = player.tick(&mut audio, t0 + Duration::seconds(30)).unwrap();
        assert_eq!(stopped.sound_id, "a");
        assert!(!player.is_active());
    }

    #[test]
    fn stop_for_other_task_is_ignored() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let mut audio = FakeAudio::default();
        let mut player = AlarmPlayer::new();
        player.start(&mut audio, playback("a", t0, false)).unwrap();
        assert!(player.stop_for_task(&mut audio, "b").is_none());
        assert!(player.stop_for_task(&mut audio, "a").is_some());
        assert!(player.stop(&mut audio).is_none());
    }
}
