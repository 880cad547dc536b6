//! Sound catalogue: built-in alarm sounds, user uploads, and the synthesized
//! fallback tone.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CapabilityError, ValidationError};

/// Largest accepted upload.
pub const MAX_CUSTOM_SOUND_BYTES: usize = 10 * 1024 * 1024;

/// File extensions accepted for uploads, lowercase.
pub const CUSTOM_SOUND_EXTENSIONS: [&str; 6] = ["mp3", "wav", "m4a", "ogg", "aac", "flac"];

struct BuiltinSound {
    id: &'static str,
    name: &'static str,
    filename: &'static str,
}

const BUILTIN_SOUNDS: [BuiltinSound; 6] = [
    BuiltinSound { id: "alarm-1", name: "Funny Alarm", filename: "funny-alarm.mp3" },
    BuiltinSound { id: "alarm-2", name: "Gentle Chime", filename: "alarm-2.mp3" },
    BuiltinSound { id: "alarm-3", name: "Digital Beep", filename: "alarm-3.mp3" },
    BuiltinSound { id: "alarm-4", name: "Nature Sounds", filename: "alarm-4.mp3" },
    BuiltinSound { id: "alarm-5", name: "Soft Melody", filename: "alarm-5.mp3" },
    BuiltinSound { id: super::DEFAULT_SOUND_ID, name: "Default Sound", filename: "default.mp3" },
];

/// Entry in the sound picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundInfo {
    pub id: String,
    pub name: String,
    pub filename: String,
    pub is_custom: bool,
}

/// User-uploaded sound, persisted under `custom-sounds` with its audio
/// inline as base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomSound {
    pub id: String,
    pub name: String,
    pub filename: String,
    pub data: String,
}

impl CustomSound {
    fn info(&self) -> SoundInfo {
        SoundInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            filename: self.filename.clone(),
            is_custom: true,
        }
    }
}

/// Square-wave beep used when no asset can be played.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSpec {
    pub frequency_hz: f32,
    pub duration_ms: u32,
    /// Linear amplitude, 0.0..=1.0.
    pub gain: f32,
}

impl ToneSpec {
    const SAMPLE_RATE: u32 = 8_000;

    /// 800 Hz for 500 ms at `volume * 0.3`.
    pub fn new(volume: f32) -> Self {
        Self {
            frequency_hz: 800.0,
            duration_ms: 500,
            gain: (volume * 0.3).clamp(0.0, 1.0),
        }
    }

    /// Render as a 16-bit mono PCM WAV file.
    pub fn render_wav(&self) -> Vec<u8> {
        let samples = Self::SAMPLE_RATE * self.duration_ms / 1000;
        let data_len = samples * 2;
        let amplitude = (f32::from(i16::MAX) * self.gain) as i16;
        let period = Self::SAMPLE_RATE as f32 / self.frequency_hz.max(1.0);

        let mut out = Vec::with_capacity(44 + data_len as usize);
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVEfmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes()); // PCM
        out.extend_from_slice(&1u16.to_le_bytes()); // mono
        out.extend_from_slice(&Self::SAMPLE_RATE.to_le_bytes());
        out.extend_from_slice(&(Self::SAMPLE_RATE * 2).to_le_bytes());
        out.extend_from_slice(&2u16.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        for i in 0..samples {
            let phase = (i as f32 % period) / period;
            let sample = if phase < 0.5 { amplitude } else { -amplitude };
            out.extend_from_slice(&sample.to_le_bytes());
        }
        out
    }
}

/// Something an [`crate::platform::AudioOutput`] can play.
#[derive(Debug, Clone, PartialEq)]
pub enum SoundSource {
    File(PathBuf),
    Embedded { id: String, bytes: Vec<u8> },
    Tone(ToneSpec),
}

#[derive(Debug, Clone, Default)]
pub struct SoundLibrary {
    sound_dir: Option<PathBuf>,
    custom: BTreeMap<String, CustomSound>,
}

impl SoundLibrary {
    /// `sound_dir` holds the built-in asset files. Without one, built-ins
    /// resolve as missing and playback falls back to the tone.
    pub fn new(sound_dir: Option<PathBuf>) -> Self {
        Self {
            sound_dir,
            custom: BTreeMap::new(),
        }
    }

    pub fn with_custom(mut self, sounds: Vec<CustomSound>) -> Self {
        self.custom = sounds.into_iter().map(|s| (s.id.clone(), s)).collect();
        self
    }

    pub fn sound_dir(&self) -> Option<&Path> {
        self.sound_dir.as_deref()
    }

    /// Built-ins first, then custom sounds in id order.
    pub fn list(&self) -> Vec<SoundInfo> {
        BUILTIN_SOUNDS
            .iter()
            .map(|b| SoundInfo {
                id: b.id.to_string(),
                name: b.name.to_string(),
                filename: b.filename.to_string(),
                is_custom: false,
            })
            .chain(self.custom.values().map(CustomSound::info))
            .collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        BUILTIN_SOUNDS.iter().any(|b| b.id == id) || self.custom.contains_key(id)
    }

    pub fn custom_sounds(&self) -> Vec<CustomSound> {
        self.custom.values().cloned().collect()
    }

    /// Store an uploaded sound. The display name is the file name without
    /// its extension.
    pub fn add_custom(&mut self, file_name: &str, bytes: &[u8], now: DateTime<Utc>) -> Result<SoundInfo, ValidationError> {
        let invalid = |message: String| ValidationError::InvalidValue {
            field: "sound".to_string(),
            message,
        };
        if bytes.is_empty() {
            return Err(invalid("file is empty".to_string()));
        }
        if bytes.len() > MAX_CUSTOM_SOUND_BYTES {
            return Err(invalid(format!(
                "{} bytes exceeds the {} MiB limit",
                bytes.len(),
                MAX_CUSTOM_SOUND_BYTES / (1024 * 1024)
            )));
        }
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        if !extension.is_some_and(|e| CUSTOM_SOUND_EXTENSIONS.contains(&e.as_str())) {
            return Err(invalid(format!(
                "{file_name} is not an audio file (supported: {})",
                CUSTOM_SOUND_EXTENSIONS.join(", ")
            )));
        }
        let name = Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or(file_name)
            .to_string();

        let mut stamp = now.timestamp_millis();
        while self.custom.contains_key(&format!("custom-{stamp}")) {
            stamp += 1;
        }
        let id = format!("custom-{stamp}");
        let sound = CustomSound {
            filename: format!("{id}.mp3"),
            id: id.clone(),
            name,
            data: STANDARD.encode(bytes),
        };
        let info = sound.info();
        self.custom.insert(id, sound);
        Ok(info)
    }

    /// Built-in sounds cannot be removed.
    pub fn remove_custom(&mut self, id: &str) -> bool {
        self.custom.remove(id).is_some()
    }

    pub fn resolve(&self, id: &str) -> Result<SoundSource, CapabilityError> {
        if let Some(custom) = self.custom.get(id) {
            let bytes = STANDARD
                .decode(custom.data.as_bytes())
                .map_err(|e| CapabilityError::AssetMissing(format!("{id}: {e}")))?;
            return Ok(SoundSource::Embedded { id: id.to_string(), bytes });
        }
        let builtin = BUILTIN_SOUNDS
            .iter()
            .find(|b| b.id == id)
            .ok_or_else(|| CapabilityError::AssetMissing(id.to_string()))?;
        let dir = self
            .sound_dir
            .as_ref()
            .ok_or_else(|| CapabilityError::AssetMissing(builtin.filename.to_string()))?;
        let path = dir.join(builtin.filename);
        if path.is_file() {
            Ok(SoundSource::File(path))
        } else {
            Err(CapabilityError::AssetMissing(path.display().to_string()))
        }
    }
}
