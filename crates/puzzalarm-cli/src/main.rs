use clap::{Parser, Subcommand};
use puzzalarm_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;
mod common;

#[derive(Parser)]
#[command(name = "puzzalarm", version, about = "PuzzAlarm CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Alarm management
    Alarm {
        #[command(subcommand)]
        action: commands::alarm::AlarmAction,
    },
    /// Usage statistics
    Stats(commands::stats::StatsArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Play a puzzle in the terminal
    Puzzle {
        #[command(subcommand)]
        action: commands::puzzle::PuzzleAction,
    },
}

/// Log to stderr. PUZZALARM_LOG overrides the configured level.
fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_env("PUZZALARM_LOG")
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    let config = Config::load_or_default();
    init_tracing(&config);

    let result = match cli.command {
        Commands::Alarm { action } => commands::alarm::run(action, &config),
        Commands::Stats(args) => commands::stats::run(args, &config),
        Commands::Config { action } => commands::config::run(action),
        Commands::Puzzle { action } => commands::puzzle::run(action, &config),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
