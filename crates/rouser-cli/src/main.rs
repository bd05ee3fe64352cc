//! `rouser` — provision or remove the read-only console user.
//!
//! # Usage
//!
//! ```text
//! rouser init
//! rouser provision
//! rouser --config /etc/rouser.toml remove
//! ```

mod commands;
mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use rouser_store_sqlite::SqliteDirectory;
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "Provision the read-only console user")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "rouser.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Create the directory file and bootstrap the admin subject.
  Init,
  /// Create the user unless it already exists.
  Provision,
  /// Delete the user.
  Remove,
  /// Print the user, its roles and its configuration.
  Show,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;

  let directory = SqliteDirectory::open(&settings.directory_path)
    .await
    .with_context(|| format!("failed to open directory at {:?}", settings.directory_path))?;

  let report = match cli.command {
    Command::Init => commands::init(&directory, &settings).await?,
    Command::Provision => commands::provision(&directory, &settings).await?,
    Command::Remove => commands::remove(&directory, &settings).await?,
    Command::Show => commands::show(&directory, &settings).await?,
  };
  println!("{report}");

  Ok(())
}
