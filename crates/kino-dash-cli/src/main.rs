//! Kino DASH CLI - Representation set inspection
//!
//! Loads a parsed manifest, runs one representation update for an adaptation
//! set and prints the resulting quality ladder.

use clap::{Parser, Subcommand};
use kino_dash::MediaType;
use std::path::PathBuf;

mod commands;
mod output;

/// Kino DASH CLI - Representation inspection toolkit
#[derive(Parser)]
#[command(name = "kino-dash")]
#[command(author = "Purple Squirrel Media")]
#[command(version)]
#[command(about = "Inspect DASH representation sets", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve one adaptation set and show its quality ladder
    Inspect {
        /// Path to a manifest in JSON form
        manifest: PathBuf,

        /// Media type (video, audio, text); defaults to the adaptation set's content type
        #[arg(short = 't', long = "type")]
        media_type: Option<MediaType>,

        /// Period index
        #[arg(short, long, default_value = "0")]
        period: usize,

        /// Adaptation set index within the period
        #[arg(short, long, default_value = "0")]
        adaptation: usize,

        /// Quality index to select
        #[arg(short, long)]
        quality: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Inspect { manifest, media_type, period, adaptation, quality } => {
            commands::inspect(&manifest, media_type, period, adaptation, quality, &cli.format).await?;
        }
    }

    Ok(())
}
