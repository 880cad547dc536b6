use clap::Subcommand;
use daybell_core::{PermissionOutcome, PermissionState};

use super::{open_service, CliResult, Context};

#[derive(Subcommand)]
pub enum PermissionAction {
    /// Show the current notification permission
    Status,
    /// Ask for notification permission
    Request,
    /// Show a test notification
    Test,
}

pub fn run(ctx: &Context, action: PermissionAction) -> CliResult {
    let mut service = open_service(ctx);
    match action {
        PermissionAction::Status => {
            let state = match service.permission() {
                PermissionState::Granted => "granted",
                PermissionState::Denied => "denied",
                PermissionState::Default => "not requested",
            };
            println!("{state} ({})", service.platform_kind());
        }
        PermissionAction::Request => match service.request_permission() {
            PermissionOutcome::Granted => println!("granted"),
            PermissionOutcome::Dismissed => println!("dismissed; you can ask again later"),
            PermissionOutcome::OpenSystemSettings => {
                println!("denied; enable notifications for Daybell in your system settings")
            }
        },
        PermissionAction::Test => {
            if !service.test_notification() {
                return Err("test notification was not shown".into());
            }
            println!("test notification sent");
        }
    }
    Ok(())
}
