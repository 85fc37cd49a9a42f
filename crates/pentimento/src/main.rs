//! # pentimento
//!
//! Pentimento - Repaint Vue Options API components as `<script setup>`.
//!
//! ## Name Origin
//!
//! A **pentimento** (/ˌpɛntɪˈmɛntoʊ/) is the trace of an earlier image showing
//! through the paint laid over it. Every migrated component is one: the
//! Options API original is still visible under the Composition API version,
//! down to the marker comments left where a reference could not be repainted.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pentimento")]
#[command(about = "Migrate Vue Options API components to <script setup>", long_about = None)]
#[command(version, disable_version_flag = true)]
struct Cli {
    /// Print version
    #[arg(short = 'v', short_alias = 'V', long, action = clap::ArgAction::Version)]
    version: (),

    /// Log level for diagnostics written to stderr (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate Vue SFC files (default command)
    #[command(visible_alias = "atelier")]
    Migrate(commands::migrate::MigrateArgs),

    /// Write a starter pentimento.config.json and its JSON schema
    Init(commands::init::InitArgs),
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Some(Commands::Migrate(args)) => commands::migrate::run(args),
        Some(Commands::Init(args)) => commands::init::run(args),
        None => {
            // Default to a dry run over every .vue file
            commands::migrate::run(commands::migrate::MigrateArgs::default());
        }
    }
}
