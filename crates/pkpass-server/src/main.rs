//! Wallet pass service.
//!
//! Run:
//!   pkpass-server serve --bind 0.0.0.0:8080 --storage-dir /var/lib/pkpass
//!   pkpass-server generate --user-id 42 --username alice --balance 75.50 -o alice.pkpass
//!
//! Signing material is read from `PKPASS_*` environment variables.

use anyhow::Context;
use clap::{Parser, Subcommand};
use pkpass::{AccountSnapshot, PassOverrides, WalletConfig};
use pkpass_server::{generator_from_config, serve, AppState};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_LOG_FILTER: &str = "pkpass=info,pkpass_server=info";

#[derive(Parser)]
#[command(name = "pkpass-server")]
#[command(about = "Wallet pass generation and signing service")]
struct Cli {
    /// Directory for working directories and generated passes
    #[arg(long, env = "PKPASS_STORAGE_DIR", default_value = "pkpass-data", global = true)]
    storage_dir: PathBuf,

    /// Directory holding branded icon/logo PNGs (placeholders when unset)
    #[arg(long, env = "PKPASS_ASSETS_DIR", global = true)]
    assets_dir: Option<PathBuf>,

    /// Address the HTTP service listens on
    #[arg(long, env = "PKPASS_BIND", default_value = DEFAULT_BIND, global = true)]
    bind: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service (default)
    Serve,
    /// Generate a single pass and copy it to a file
    Generate {
        #[arg(long)]
        user_id: u64,

        #[arg(long)]
        username: String,

        #[arg(long, allow_negative_numbers = true)]
        balance: f64,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Display overrides as JSON, e.g. '{"logoText":"Beans"}'
        #[arg(long)]
        pass_data: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();
    let config = WalletConfig::from_env();
    let generator = generator_from_config(&config, &cli.storage_dir, cli.assets_dir.as_deref());

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            tracing::info!(
                storage = %cli.storage_dir.display(),
                team = config.team_identifier(),
                "starting pass service"
            );
            serve(&cli.bind, AppState::new(config, generator)).await
        }
        Command::Generate {
            user_id,
            username,
            balance,
            output,
            pass_data,
        } => {
            let overrides: Option<PassOverrides> = pass_data
                .as_deref()
                .map(serde_json::from_str)
                .transpose()
                .context("--pass-data is not valid JSON")?;
            let account = AccountSnapshot::new(user_id, username, balance)?;

            let pass = tokio::task::spawn_blocking(move || {
                generator.generate(&account, overrides.as_ref())
            })
            .await??;

            std::fs::copy(&pass.path, &output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Pass written to: {}", output.display());
            println!("Serial number: {}", pass.serial_number);
            if !pass.is_signed() {
                eprintln!("warning: pass carries a placeholder signature");
            }
            Ok(())
        }
    }
}
