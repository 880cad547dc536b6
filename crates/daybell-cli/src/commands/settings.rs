use clap::Subcommand;

use super::{open_service, CliResult, Context};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print all settings as JSON
    Show,
    /// Set a setting
    Set {
        /// Setting name (e.g. "snoozeMinutes", "notificationsEnabled")
        key: String,
        /// New value
        value: String,
    },
}

pub fn run(ctx: &Context, action: SettingsAction) -> CliResult {
    let mut service = open_service(ctx);
    match action {
        SettingsAction::Show => {
            println!("{}", serde_json::to_string_pretty(service.settings())?);
        }
        SettingsAction::Set { key, value } => {
            let rearmed = service.set_setting(&key, &value)?;
            if rearmed {
                println!("ok (reminders rescheduled)");
            } else {
                println!("ok");
            }
        }
    }
    Ok(())
}
