//! Sound picker commands: list, preview and manage custom sounds.

use std::path::PathBuf;
use std::time::Duration;

use clap::Subcommand;
use daybell_core::notify::{SoundOutcome, MAX_CUSTOM_SOUND_BYTES};

use super::{open_service, CliResult, Context};

const PREVIEW_TICK: Duration = Duration::from_millis(200);

#[derive(Subcommand)]
pub enum SoundsAction {
    /// List built-in and custom sounds
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Play a sound for the preview duration
    Test {
        /// Sound id (see `sounds list`)
        id: String,
    },
    /// Import an audio file as a custom sound
    Add {
        /// Audio file
        path: PathBuf,
    },
    /// Remove a custom sound
    Remove {
        /// Sound id
        id: String,
    },
}

pub fn run(ctx: &Context, action: SoundsAction) -> CliResult {
    let mut service = open_service(ctx);
    match action {
        SoundsAction::List { json } => {
            let sounds = service.sounds();
            if json {
                println!("{}", serde_json::to_string_pretty(&sounds)?);
            } else {
                for sound in sounds {
                    let origin = if sound.is_custom { "custom" } else { "built-in" };
                    println!("{:<24} {:<20} {}", sound.id, sound.name, origin);
                }
            }
        }
        SoundsAction::Test { id } => {
            let outcome = service.test_alarm(&id);
            println!("{}", describe(outcome));
            // Keep the process alive until the preview stops itself.
            while service.notifier().playing().is_some() {
                std::thread::sleep(PREVIEW_TICK);
                service.tick_playback();
            }
        }
        SoundsAction::Add { path } => {
            // Refuse oversized files before reading them into memory.
            let size = std::fs::metadata(&path)?.len();
            if size > MAX_CUSTOM_SOUND_BYTES as u64 {
                return Err(format!("{} is {size} bytes; the limit is {MAX_CUSTOM_SOUND_BYTES}", path.display()).into());
            }
            let bytes = std::fs::read(&path)?;
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| format!("not a file name: {}", path.display()))?;
            let info = service.add_custom_sound(file_name, &bytes)?;
            println!("Sound added: {}", info.id);
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        SoundsAction::Remove { id } => {
            if !service.remove_custom_sound(&id) {
                return Err(format!("no custom sound with id {id}").into());
            }
            println!("Sound removed: {id}");
        }
    }
    Ok(())
}

fn describe(outcome: SoundOutcome) -> &'static str {
    match outcome {
        SoundOutcome::Asset => "playing",
        SoundOutcome::Tone => "sound unavailable; playing fallback tone",
        SoundOutcome::Silent => "no audio output available",
        SoundOutcome::Off => "sound off",
    }
}
