use clap::{Parser, Subcommand};
use daybell_core::{Config, PlatformChoice};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "daybell", version, about = "Daybell daily-task reminder")]
struct Cli {
    /// Capability provider: auto, native or web-fallback (overrides config)
    #[arg(long, global = true)]
    platform: Option<PlatformChoice>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Task management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// User settings (notifications, snooze, alarm volume)
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Alarm sounds
    Sounds {
        #[command(subcommand)]
        action: commands::sounds::SoundsAction,
    },
    /// Notification permission
    Permission {
        #[command(subcommand)]
        action: commands::permission::PermissionAction,
    },
    /// Today's counters and armed timers
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the reminder loop in the foreground
    Run(commands::run::RunArgs),
}

fn main() {
    let cli = Cli::parse();
    // Reported once logging is up.
    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    // RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("daybell_core={0},daybell={0}", config.logging.level))),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Some(e) = config_error {
        tracing::warn!(error = %e, "config unreadable; using defaults");
    }

    let ctx = commands::Context {
        platform: cli.platform.unwrap_or(config.platform.kind),
        config,
    };

    let result = match cli.command {
        Commands::Task { action } => commands::task::run(&ctx, action),
        Commands::Settings { action } => commands::settings::run(&ctx, action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Sounds { action } => commands::sounds::run(&ctx, action),
        Commands::Permission { action } => commands::permission::run(&ctx, action),
        Commands::Status { json } => commands::status::run(&ctx, json),
        Commands::Run(args) => commands::run::run(&ctx, args),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
