use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, FixedOffset, Local, TimeZone, Utc};

/// Source of "now". The zone decides what a calendar day is.
pub trait Clock {
    type Zone: TimeZone;

    fn now(&self) -> DateTime<Self::Zone>;

    fn now_utc(&self) -> DateTime<Utc> {
        self.now().with_timezone(&Utc)
    }
}

/// Wall clock in the host's local zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    type Zone = Local;

    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Hand-driven clock for tests and simulations. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<FixedOffset>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<FixedOffset>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Start at a UTC instant, with UTC calendar days.
    pub fn utc(start: DateTime<Utc>) -> Self {
        Self::new(start.fixed_offset())
    }

    pub fn set(&self, to: DateTime<FixedOffset>) {
        *self.lock() = to;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.lock();
        *now += by;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<FixedOffset>> {
        // A poisoned clock still holds a valid instant.
        self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Clock for ManualClock {
    type Zone = FixedOffset;

    fn now(&self) -> DateTime<FixedOffset> {
        *self.lock()
    }
}
