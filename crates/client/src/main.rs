//! Character sheet client binary.
//!
//! Resolves stored characters against a content directory and records
//! player choices. This binary is the composition root: it loads
//! configuration, installs logging, builds the [`Runtime`] and dispatches
//! one subcommand.
//!
//! ```bash
//! SHEET_CONTENT_DIR=crates/rules/content/data sheet resolve harsk
//! sheet select harsk <operation-uuid> <option-uuid>
//! sheet check
//! ```

mod commands;
mod config;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use commands::{Check, Clear, Pending, Resolve, Select};
use config::ClientConfig;
use runtime::{FileCharacterRepo, Runtime};

/// Rules resolution for tabletop character sheets
#[derive(Parser)]
#[command(name = "sheet")]
#[command(about = "Resolve character sheets and record selections", long_about = None)]
#[command(version)]
struct Cli {
    /// Content directory (overrides SHEET_CONTENT_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    content_dir: Option<PathBuf>,

    /// Character directory (overrides SHEET_CHARACTER_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    character_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Print the resolved sheet of a character
    Resolve(Resolve),

    /// List selections awaiting a choice
    Pending(Pending),

    /// Record a choice for a select operation
    Select(Select),

    /// Remove a stored choice
    Clear(Clear),

    /// Exit non-zero when stored characters are out of sync with content
    Check(Check),
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::from_env().with_overrides(cli.content_dir, cli.character_dir);

    tracing::debug!(
        content_dir = %config.content_dir.display(),
        character_dir = %config.character_dir.display(),
        "Building runtime"
    );

    let repository = FileCharacterRepo::new(&config.character_dir).with_context(|| {
        format!(
            "Failed to open character directory {}",
            config.character_dir.display()
        )
    })?;
    let runtime = Runtime::builder()
        .config(config.runtime.clone())
        .content_dir(&config.content_dir)
        .repository(Arc::new(repository))
        .build()
        .with_context(|| format!("Failed to load content from {}", config.content_dir.display()))?;

    match cli.command {
        Command::Resolve(cmd) => cmd.execute(&runtime).await?,
        Command::Pending(cmd) => cmd.execute(&runtime).await?,
        Command::Select(cmd) => cmd.execute(&runtime).await?,
        Command::Clear(cmd) => cmd.execute(&runtime).await?,
        Command::Check(cmd) => {
            if !cmd.execute(&runtime).await? {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
