pub mod config;
pub mod permission;
pub mod run;
pub mod settings;
pub mod sounds;
pub mod status;
pub mod task;

use daybell_core::{
    BlobStore, Config, MemoryStore, Platform, PlatformChoice, ReminderService, ServiceOptions, SqliteStore,
    SystemClock,
};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

pub type Service = ReminderService<Box<dyn BlobStore>, SystemClock>;

/// Settings resolved once in `main` and shared by every subcommand.
pub struct Context {
    pub config: Config,
    pub platform: PlatformChoice,
}

/// Build a service over the user database without loading it.
///
/// Falls back to an in-memory store when the database cannot be opened, so
/// the command still runs but nothing is saved.
pub fn build_service(ctx: &Context) -> Service {
    let store: Box<dyn BlobStore> = match SqliteStore::open() {
        Ok(store) => Box::new(store),
        Err(e) => {
            tracing::warn!(error = %e, "database unavailable; changes will not be saved");
            Box::new(MemoryStore::new())
        }
    };
    ReminderService::new(
        store,
        SystemClock,
        Platform::select(ctx.platform),
        ServiceOptions::from_config(&ctx.config),
    )
}

/// Build and load a service for a one-shot command. The load is passive:
/// missed reminders are left for `daybell run` to deliver, since this
/// process exits before an alert could be acted on. Startup events are
/// logged rather than printed.
pub fn open_service(ctx: &Context) -> Service {
    let mut service = build_service(ctx);
    service.load_passive();
    for event in service.drain_events() {
        tracing::debug!(?event, "startup");
    }
    service
}
