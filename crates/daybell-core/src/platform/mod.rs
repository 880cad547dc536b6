//! Capability providers.
//!
//! Everything that touches the host (desktop notifications, audio, haptics,
//! OS alarm registries) sits behind one of the traits below. A [`Platform`]
//! bundle is selected once at startup and handed to the service; nothing
//! else in the crate checks which platform it runs on.

mod fallback;
mod native;

pub use fallback::{LogSurface, ToneOnlyAudio};
pub use native::{CommandAudio, CommandSurface};

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CapabilityError;
use crate::notify::{NotificationPayload, PermissionState, SoundSource};

/// Shows visual alerts.
pub trait NotificationSurface {
    fn permission(&self) -> PermissionState;

    /// Ask the host for permission. Only called while the state is
    /// `Default`; see [`crate::notify::PermissionGate`].
    fn request_permission(&mut self) -> PermissionState;

    /// Show or replace (by `payload.tag`) an alert.
    fn show(&mut self, payload: &NotificationPayload) -> Result<(), CapabilityError>;
}

pub trait Haptics {
    fn vibrate(&mut self, pattern: &[u32]) -> Result<(), CapabilityError>;
}

/// "Play this sound at this volume."
pub trait AudioOutput {
    fn play(&mut self, source: &SoundSource, volume: f32) -> Result<(), CapabilityError>;

    /// Whether the last started sound is still audible.
    fn is_playing(&mut self) -> bool;

    fn stop(&mut self);
}

/// Platform-level alarm registry mirrored by the scheduler.
pub trait AlarmBackend {
    fn register(&mut self, task_id: &str, at: DateTime<Utc>) -> Result<(), CapabilityError>;
    fn cancel(&mut self, task_id: &str) -> Result<(), CapabilityError>;
}

/// Haptics for hosts without a vibration motor.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHaptics;

impl Haptics for NoHaptics {
    fn vibrate(&mut self, _pattern: &[u32]) -> Result<(), CapabilityError> {
        Err(CapabilityError::Unsupported { capability: "haptics" })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlatformKind {
    Native,
    WebFallback,
}

impl PlatformKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformKind::Native => "native",
            PlatformKind::WebFallback => "web-fallback",
        }
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `platform.kind` in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlatformChoice {
    #[default]
    Auto,
    Native,
    WebFallback,
}

impl FromStr for PlatformChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(PlatformChoice::Auto),
            "native" => Ok(PlatformChoice::Native),
            "web-fallback" | "fallback" => Ok(PlatformChoice::WebFallback),
            other => Err(format!("unknown platform kind: {other}")),
        }
    }
}

/// The capability set the service runs with.
pub struct Platform {
    pub kind: PlatformKind,
    pub surface: Box<dyn NotificationSurface>,
    pub haptics: Box<dyn Haptics>,
    pub audio: Box<dyn AudioOutput>,
    pub alarms: Option<Box<dyn AlarmBackend>>,
}

impl Platform {
    /// Host notification command and audio player, when both exist.
    pub fn native() -> Option<Self> {
        let surface = CommandSurface::detect()?;
        let audio = CommandAudio::detect()?;
        Some(Self {
            kind: PlatformKind::Native,
            surface: Box::new(surface),
            haptics: Box::new(NoHaptics),
            audio: Box::new(audio),
            alarms: None,
        })
    }

    /// Log-backed alerts and terminal-bell tones. Always available.
    pub fn web_fallback() -> Self {
        Self {
            kind: PlatformKind::WebFallback,
            surface: Box::new(LogSurface::default()),
            haptics: Box::new(NoHaptics),
            audio: Box::new(ToneOnlyAudio::default()),
            alarms: None,
        }
    }

    /// Resolve the configured choice. `native` degrades to the fallback
    /// when the host commands are missing.
    pub fn select(choice: PlatformChoice) -> Self {
        let platform = match choice {
            PlatformChoice::WebFallback => Self::web_fallback(),
            PlatformChoice::Auto | PlatformChoice::Native => Self::native().unwrap_or_else(|| {
                if choice == PlatformChoice::Native {
                    tracing::warn!("native notification or audio command not found; using fallback platform");
                }
                Self::web_fallback()
            }),
        };
        tracing::info!(platform = %platform.kind, "capability provider selected");
        platform
    }
}
