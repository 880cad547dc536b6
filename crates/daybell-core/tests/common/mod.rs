//! Shared fixtures: recording capability fakes and a service on a manual clock.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use daybell_core::notify::{NotificationPayload, PermissionState, SoundSource};
use daybell_core::platform::{AudioOutput, Haptics, NotificationSurface};
use daybell_core::{
    CapabilityError, Event, ManualClock, MemoryStore, Platform, PlatformKind, ReminderService, ServiceOptions,
};

pub type TestService = ReminderService<MemoryStore, ManualClock>;

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

/// Shared log of capability calls.
#[derive(Clone, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<String>>>,
    prompts: Arc<AtomicUsize>,
}

impl Recorder {
    pub fn push(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn prompts(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }
}

pub struct FakeSurface {
    recorder: Recorder,
    state: PermissionState,
    answer: PermissionState,
}

impl NotificationSurface for FakeSurface {
    fn permission(&self) -> PermissionState {
        self.state
    }

    fn request_permission(&mut self) -> PermissionState {
        self.recorder.prompts.fetch_add(1, Ordering::SeqCst);
        self.state = self.answer;
        self.state
    }

    fn show(&mut self, payload: &NotificationPayload) -> Result<(), CapabilityError> {
        self.recorder.push(format!("show:{}", payload.tag));
        Ok(())
    }
}

pub struct FakeHaptics(Recorder);

impl Haptics for FakeHaptics {
    fn vibrate(&mut self, pattern: &[u32]) -> Result<(), CapabilityError> {
        self.0.push(format!("vibrate:{}", pattern.len()));
        Ok(())
    }
}

/// Rejects asset files so every sound lands on the tone.
pub struct FakeAudio {
    recorder: Recorder,
    playing: bool,
}

impl AudioOutput for FakeAudio {
    fn play(&mut self, source: &SoundSource, _volume: f32) -> Result<(), CapabilityError> {
        match source {
            SoundSource::Tone(_) => {
                self.recorder.push("play:tone");
                self.playing = true;
                Ok(())
            }
            SoundSource::Embedded { id, .. } => {
                self.recorder.push(format!("play:{id}"));
                self.playing = true;
                Ok(())
            }
            SoundSource::File(path) => Err(CapabilityError::AssetMissing(path.display().to_string())),
        }
    }

    fn is_playing(&mut self) -> bool {
        self.playing
    }

    fn stop(&mut self) {
        self.recorder.push("stop");
        self.playing = false;
    }
}

pub fn platform(recorder: &Recorder, state: PermissionState, answer: PermissionState) -> Platform {
    Platform {
        kind: PlatformKind::WebFallback,
        surface: Box::new(FakeSurface {
            recorder: recorder.clone(),
            state,
            answer,
        }),
        haptics: Box::new(FakeHaptics(recorder.clone())),
        audio: Box::new(FakeAudio {
            recorder: recorder.clone(),
            playing: false,
        }),
        alarms: None,
    }
}

/// Service over `store`, clock at `now`, permission already granted. Not loaded.
pub fn service_with(store: MemoryStore, now: DateTime<Utc>) -> (TestService, ManualClock, Recorder) {
    let recorder = Recorder::default();
    let clock = ManualClock::utc(now);
    let service = ReminderService::new(
        store,
        clock.clone(),
        platform(&recorder, PermissionState::Granted, PermissionState::Granted),
        ServiceOptions::default(),
    );
    (service, clock, recorder)
}

/// Fresh, loaded service on an empty store.
pub fn loaded_service(now: DateTime<Utc>) -> (TestService, ManualClock, Recorder) {
    let (mut service, clock, recorder) = service_with(MemoryStore::new(), now);
    service.load();
    service.drain_events();
    (service, clock, recorder)
}

pub fn fired(events: &[Event]) -> Vec<&Event> {
    events
        .iter()
        .filter(|e| matches!(e, Event::ReminderFired { .. }))
        .collect()
}
