// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// MAHALA CLI - Reference host for the light client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use tracing_subscriber::prelude::*;

mod commands;

use commands::common::Settings;

#[derive(Parser)]
#[command(name = "mahala")]
#[command(about = "Mahala light client - wallet sync & validator watch", long_about = None)]
#[command(version)]
struct Cli {
    /// Full node URL (reads MAHALA_NODE_URL env var; overrides the config file)
    #[arg(short, long, env = "MAHALA_NODE_URL")]
    node: Option<String>,

    /// Light client config file (default: <data-dir>/config.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Data directory holding the device salt (default: ~/.mahala)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Device identifier mixed into the fingerprint (default: generated once per data dir)
    #[arg(long, env = "MAHALA_DEVICE_ID")]
    device_id: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the wallet address derived on this device
    Identity,

    /// Run one sync against the full node
    Sync,

    /// Show balance and daily dividend from the last sync
    Balance,

    /// Check once whether this wallet is the selected validator
    Validator,

    /// Keep polling: validator checks every block, periodic resync
    Watch {
        /// Seconds between validator selection checks
        #[arg(long, default_value_t = 5)]
        block_interval: u64,

        /// Seconds between syncs
        #[arg(long, default_value_t = 900)]
        sync_interval: u64,
    },

    /// Configuration file management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write the effective settings to the config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    print_banner();

    if let Err(e) = run(cli).await {
        print_error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = cli.data_dir.unwrap_or_else(|| {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".mahala")
    });
    std::fs::create_dir_all(&data_dir)?;

    let settings = Settings {
        node: cli.node,
        config: cli.config,
        data_dir,
        device_id: cli.device_id,
    };

    match cli.command {
        Commands::Identity => commands::identity::handle(&settings)?,
        Commands::Sync => commands::sync::handle_sync(&settings).await?,
        Commands::Balance => commands::sync::handle_balance(&settings)?,
        Commands::Validator => commands::validator::handle(&settings).await?,
        Commands::Watch {
            block_interval,
            sync_interval,
        } => commands::watch::handle(&settings, block_interval, sync_interval).await?,
        Commands::Config { action } => match action {
            ConfigCommands::Init { force } => commands::config::init(&settings, force)?,
        },
    }

    Ok(())
}

fn print_banner() {
    println!(
        "{}",
        "╔═══════════════════════════════════════════════╗".cyan()
    );
    println!(
        "{}",
        "║        MAHALA - Light Client CLI              ║"
            .cyan()
            .bold()
    );
    println!(
        "{}",
        "╚═══════════════════════════════════════════════╝".cyan()
    );
    println!();
}

fn print_success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red().bold(), msg);
}

fn print_info(msg: &str) {
    println!("{} {}", "ℹ".blue().bold(), msg);
}

// ─────────────────────────────────────────────────────────────────
// UNIT TESTS
// ─────────────────────────────────────────────────────────────────
