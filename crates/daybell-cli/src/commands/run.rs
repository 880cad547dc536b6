//! Foreground reminder loop.
//!
//! Prints every event as one JSON line on stdout. With `--stdin`, reads
//! notification actions (`{"type":"TASK_COMPLETE","taskId":"..."}` or
//! `{"type":"TASK_SNOOZE","taskId":"...","minutes":10}`) one per line.

use clap::Args;
use daybell_core::service;
use daybell_core::ForegroundMessage;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedReceiver};

use super::{build_service, CliResult, Context};

#[derive(Args)]
pub struct RunArgs {
    /// Accept notification actions as JSON lines on stdin
    #[arg(long)]
    pub stdin: bool,
}

pub fn run(ctx: &Context, args: RunArgs) -> CliResult {
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    let mut service = build_service(ctx);

    runtime.block_on(async {
        let messages = args.stdin.then(spawn_stdin_reader);
        service::run(&mut service, messages, |event| match serde_json::to_string(event) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::warn!(error = %e, "event not serializable"),
        })
        .await;
    });
    Ok(())
}

fn spawn_stdin_reader() -> UnboundedReceiver<ForegroundMessage> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "stdin closed");
                    break;
                }
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<ForegroundMessage>(line) {
                Ok(message) => {
                    if tx.send(message).is_err() {
                        break;
                    }
                }
                Err(e) => tracing::warn!(error = %e, line, "ignoring malformed message"),
            }
        }
    });
    rx
}
