//! Desktop capability provider backed by host commands.
//!
//! Alerts go through `notify-send` (freedesktop) or `osascript` (macOS);
//! sounds through `paplay` or `afplay`. Binaries are located with `which`
//! once, at detection time.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use super::AudioOutput;
use crate::error::CapabilityError;
use crate::notify::{NotificationPayload, PermissionState, SoundSource};

#[derive(Debug, Clone, PartialEq, Eq)]
enum SurfaceCommand {
    NotifySend(PathBuf),
    Osascript(PathBuf),
}

/// Alerts through the desktop notification daemon.
#[derive(Debug)]
pub struct CommandSurface {
    command: SurfaceCommand,
}

impl CommandSurface {
    pub fn detect() -> Option<Self> {
        let command = which::which("notify-send")
            .map(SurfaceCommand::NotifySend)
            .or_else(|_| which::which("osascript").map(SurfaceCommand::Osascript))
            .ok()?;
        tracing::debug!(?command, "notification command found");
        Some(Self { command })
    }

    fn build(&self, payload: &NotificationPayload) -> Command {
        match &self.command {
            SurfaceCommand::NotifySend(bin) => {
                let mut cmd = Command::new(bin);
                cmd.arg("--app-name=Daybell");
                if payload.require_interaction {
                    cmd.args(["--urgency", "critical"]);
                }
                // Same tag replaces the previous alert for the task.
                cmd.arg(format!("--hint=string:x-dunst-stack-tag:{}", payload.tag));
                cmd.arg(&payload.title).arg(&payload.body);
                cmd
            }
            SurfaceCommand::Osascript(bin) => {
                let mut script = format!(
                    "display notification \"{}\" with title \"{}\"",
                    escape_applescript(&payload.body),
                    escape_applescript(&payload.title)
                );
                if !payload.silent {
                    script.push_str(" sound name \"default\"");
                }
                let mut cmd = Command::new(bin);
                cmd.arg("-e").arg(script);
                cmd
            }
        }
    }
}

fn escape_applescript(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

impl super::NotificationSurface for CommandSurface {
    // Desktop daemons do not gate on a per-app permission.
    fn permission(&self) -> PermissionState {
        PermissionState::Granted
    }

    fn request_permission(&mut self) -> PermissionState {
        PermissionState::Granted
    }

    fn show(&mut self, payload: &NotificationPayload) -> Result<(), CapabilityError> {
        let status = self
            .build(payload)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| CapabilityError::Backend(e.to_string()))?;
        if status.success() {
            Ok(())
        } else {
            Err(CapabilityError::Backend(format!("notification command exited with {status}")))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PlayerCommand {
    Paplay(PathBuf),
    Afplay(PathBuf),
}

/// Sound playback through a command-line player. One child process at a time.
#[derive(Debug)]
pub struct CommandAudio {
    player: PlayerCommand,
    scratch_dir: PathBuf,
    child: Option<Child>,
}

impl CommandAudio {
    pub fn detect() -> Option<Self> {
        let player = which::which("paplay")
            .map(PlayerCommand::Paplay)
            .or_else(|_| which::which("afplay").map(PlayerCommand::Afplay))
            .ok()?;
        tracing::debug!(?player, "audio player found");
        Some(Self {
            player,
            scratch_dir: std::env::temp_dir().join("daybell-sounds"),
            child: None,
        })
    }

    /// In-memory sounds are written out so the player can read them.
    fn materialize(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, CapabilityError> {
        std::fs::create_dir_all(&self.scratch_dir).map_err(|e| CapabilityError::Backend(e.to_string()))?;
        let path = self.scratch_dir.join(name);
        let mut file = std::fs::File::create(&path).map_err(|e| CapabilityError::Backend(e.to_string()))?;
        file.write_all(bytes).map_err(|e| CapabilityError::Backend(e.to_string()))?;
        Ok(path)
    }

    fn spawn(&self, path: &Path, volume: f32) -> Result<Child, CapabilityError> {
        let mut cmd = match &self.player {
            PlayerCommand::Paplay(bin) => {
                let mut cmd = Command::new(bin);
                // paplay takes 0..=65536 where 65536 is 100%.
                cmd.arg(format!("--volume={}", (volume * 65536.0).round() as u32));
                cmd
            }
            PlayerCommand::Afplay(bin) => {
                let mut cmd = Command::new(bin);
                cmd.arg("-v").arg(format!("{volume:.2}"));
                cmd
            }
        };
        cmd.arg(path)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| CapabilityError::Backend(e.to_string()))
    }
}

impl AudioOutput for CommandAudio {
    fn play(&mut self, source: &SoundSource, volume: f32) -> Result<(), CapabilityError> {
        self.stop();
        let path = match source {
            SoundSource::File(path) => {
                if !path.is_file() {
                    return Err(CapabilityError::AssetMissing(path.display().to_string()));
                }
                path.clone()
            }
            SoundSource::Embedded { id, bytes } => self.materialize(&format!("{id}.mp3"), bytes)?,
            SoundSource::Tone(tone) => self.materialize("tone.wav", &tone.render_wav())?,
        };
        self.child = Some(self.spawn(&path, volume.clamp(0.0, 1.0))?);
        Ok(())
    }

    fn is_playing(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl Drop for CommandAudio {
    fn drop(&mut self) {
        self.stop();
    }
}
