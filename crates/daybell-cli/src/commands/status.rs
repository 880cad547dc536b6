use serde::Serialize;

use daybell_core::scheduler::ArmedTimer;
use daybell_core::{PermissionState, PlatformKind, TaskStats};

use super::{open_service, CliResult, Context};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Status {
    platform: PlatformKind,
    permission: PermissionState,
    notifications_enabled: bool,
    today: TaskStats,
    timers: Vec<ArmedTimer>,
}

pub fn run(ctx: &Context, json: bool) -> CliResult {
    let service = open_service(ctx);
    let status = Status {
        platform: service.platform_kind(),
        permission: service.permission(),
        notifications_enabled: service.settings().notifications_enabled,
        today: service.stats(),
        timers: service.scheduler().timers().into_iter().cloned().collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("Today: {}/{} done, {} pending", status.today.completed, status.today.total, status.today.pending);
    if !status.notifications_enabled {
        println!("Notifications are off.");
    }
    for timer in &status.timers {
        let title = service.task(&timer.task_id).map(|t| t.title.as_str()).unwrap_or("?");
        let local = timer.fire_at.with_timezone(&chrono::Local);
        println!("  {}  {title}", local.format("%a %H:%M"));
    }
    Ok(())
}
