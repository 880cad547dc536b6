//! Degraded capability provider for hosts with no notification daemon or
//! audio player. Alerts become log records and every sound becomes the
//! synthesized tone, rendered as a terminal bell.

use std::io::Write;

use crate::error::CapabilityError;
use crate::notify::{NotificationPayload, PermissionState, SoundSource};

/// Writes alerts to the log. Permission starts at `Default` and is granted
/// on the first request.
#[derive(Debug)]
pub struct LogSurface {
    state: PermissionState,
}

impl Default for LogSurface {
    fn default() -> Self {
        Self {
            state: PermissionState::Default,
        }
    }
}

impl super::NotificationSurface for LogSurface {
    fn permission(&self) -> PermissionState {
        self.state
    }

    fn request_permission(&mut self) -> PermissionState {
        if self.state == PermissionState::Default {
            self.state = PermissionState::Granted;
        }
        self.state
    }

    fn show(&mut self, payload: &NotificationPayload) -> Result<(), CapabilityError> {
        if self.state != PermissionState::Granted {
            return Err(CapabilityError::Denied {
                capability: "notifications",
            });
        }
        tracing::info!(tag = %payload.tag, title = %payload.title, body = %payload.body, "reminder");
        Ok(())
    }
}

/// Only the synthesized tone is playable; asset sounds report unsupported
/// so the notifier falls through to the tone.
#[derive(Debug, Default)]
pub struct ToneOnlyAudio {
    playing: bool,
}

impl super::AudioOutput for ToneOnlyAudio {
    fn play(&mut self, source: &SoundSource, volume: f32) -> Result<(), CapabilityError> {
        match source {
            SoundSource::Tone(tone) => {
                self.playing = false;
                if volume <= 0.0 {
                    return Ok(());
                }
                tracing::debug!(frequency_hz = tone.frequency_hz, duration_ms = tone.duration_ms, "tone");
                let mut stderr = std::io::stderr();
                stderr
                    .write_all(b"\x07")
                    .and_then(|_| stderr.flush())
                    .map_err(|e| CapabilityError::Backend(e.to_string()))?;
                Ok(())
            }
            _ => Err(CapabilityError::Unsupported {
                capability: "audio playback",
            }),
        }
    }

    // The bell is instantaneous; a looping alarm re-rings on each check.
    fn is_playing(&mut self) -> bool {
        self.playing
    }

    fn stop(&mut self) {
        self.playing = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::ToneSpec;
    use crate::platform::{AudioOutput, NotificationSurface};
    use std::path::PathBuf;

    #[test]
    fn log_surface_grants_on_request() {
        let mut surface = LogSurface::default();
        assert_eq!(surface.permission(), PermissionState::Default);
        assert_eq!(surface.request_permission(), PermissionState::Granted);
        assert_eq!(surface.permission(), PermissionState::Granted);
    }

    #[test]
    fn tone_only_audio_rejects_files() {
        let mut audio = ToneOnlyAudio::default();
        assert!(matches!(
            audio.play(&SoundSource::File(PathBuf::from("x.mp3")), 1.0),
            Err(CapabilityError::Unsupported { .. })
        ));
        assert!(audio.play(&SoundSource::Tone(ToneSpec::new(0.0)), 0.0).is_ok());
        assert!(!audio.is_playing());
    }
}
