//! Async run loop for a foreground session.

use std::time::Duration as StdDuration;

use tokio::sync::mpsc::UnboundedReceiver;

use super::{Clock, ReminderService};
use crate::events::Event;
use crate::notify::ForegroundMessage;
use crate::storage::BlobStore;

/// Longest sleep between ticks, so wall-clock jumps (suspend, manual clock
/// changes) are noticed promptly.
const MAX_SLEEP: StdDuration = StdDuration::from_secs(60);

/// Drive `service` until Ctrl-C or until the message channel closes.
///
/// Sleeps until the next timer, poll, reset check or playback deadline,
/// ticks, and hands every produced event to `on_event`. A wake-up that comes
/// much later than planned is treated as a resume from suspension.
pub async fn run<S, C, F>(
    service: &mut ReminderService<S, C>,
    mut messages: Option<UnboundedReceiver<ForegroundMessage>>,
    mut on_event: F,
) where
    S: BlobStore,
    C: Clock,
    F: FnMut(&Event),
{
    service.load();
    flush(service, &mut on_event);

    loop {
        service.tick();
        flush(service, &mut on_event);

        let now = service.now_utc();
        let wait = service
            .next_wakeup()
            .and_then(|at| (at - now).to_std().ok())
            .unwrap_or(StdDuration::ZERO)
            .min(MAX_SLEEP);
        let planned = now + chrono::Duration::from_std(wait).unwrap_or_default();

        tokio::select! {
            _ = tokio::time::sleep(wait) => {
                let overslept = service.now_utc() - planned;
                if overslept > chrono::Duration::seconds(MAX_SLEEP.as_secs() as i64) {
                    tracing::info!(overslept_secs = overslept.num_seconds(), "wake-up after suspension");
                    service.resume();
                }
            }
            message = recv(&mut messages) => match message {
                Some(message) => {
                    let task_id = message.task_id().to_string();
                    if let Err(e) = service.handle_message(message) {
                        tracing::warn!(task_id, error = %e, "foreground message rejected");
                    }
                }
                None => {
                    tracing::debug!("message channel closed");
                    messages = None;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                break;
            }
        }
        flush(service, &mut on_event);
    }

    service.shutdown();
    flush(service, &mut on_event);
}

async fn recv(messages: &mut Option<UnboundedReceiver<ForegroundMessage>>) -> Option<ForegroundMessage> {
    match messages {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

fn flush<S, C, F>(service: &mut ReminderService<S, C>, on_event: &mut F)
where
    S: BlobStore,
    C: Clock,
    F: FnMut(&Event),
{
    for event in service.drain_events() {
        on_event(&event);
    }
}
