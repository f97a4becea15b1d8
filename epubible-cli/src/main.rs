//! epubible CLI - build a personalised EPUB Bible from tagged verse records

mod commands;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use epubible_core::EpubibleError;
use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Exit code when the record source failed and the book was built empty
pub const EXIT_SOURCE_FAILURE: u8 = 2;

/// Exit code when the EPUB container could not be written
pub const EXIT_PACKAGING_FAILURE: u8 = 3;

#[derive(Parser)]
#[command(name = "epubible")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write the log to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a customised EPUB Bible from tagged verse records
    Build(BuildArgs),

    /// List the members of an EPUB and check its container layout
    Inspect {
        /// EPUB file path
        input: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
pub struct BuildArgs {
    /// Record service username; the book is prepared for this user
    #[arg(short, long, env = "EPUBIBLE_USERNAME")]
    pub username: String,

    /// Record service password
    #[arg(long, env = "EPUBIBLE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Comma separated list of tags to retrieve
    #[arg(short, long, value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Query selecting the verse objects
    #[arg(short, long)]
    pub query: Option<String>,

    /// Create the <username>/has-read tag before fetching
    #[arg(long)]
    pub create_has_read: bool,

    /// Do not tag the fetched objects as read
    #[arg(long)]
    pub no_mark_read: bool,

    /// Read records from a saved /values JSON response instead of the service
    #[arg(long)]
    pub source_file: Option<PathBuf>,

    /// Template set directory
    #[arg(long)]
    pub template_dir: Option<PathBuf>,

    /// Directory the EPUB is written to
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Book title
    #[arg(long)]
    pub title: Option<String>,

    /// Record service base URL
    #[arg(long)]
    pub service_url: Option<String>,

    /// JSON pipeline configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

fn init_tracing(verbose: bool, log_file: Option<&PathBuf>) -> Result<()> {
    let filter = if verbose {
        "epubible_cli=debug,epubible_core=debug"
    } else {
        "epubible_cli=info,epubible_core=info"
    };

    let file_layer = match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file: {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(())
}

/// Map a failure to the process exit code
fn exit_code_for(err: &anyhow::Error) -> u8 {
    let core = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<EpubibleError>());
    match core {
        Some(EpubibleError::Package(_)) => EXIT_PACKAGING_FAILURE,
        Some(EpubibleError::Source(_)) => EXIT_SOURCE_FAILURE,
        _ => 1,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose, cli.log_file.as_ref()) {
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }

    let result = match cli.command {
        Commands::Build(args) => commands::build(&args),
        Commands::Inspect { input, json } => commands::inspect(&input, json).map(|_| 0),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code_for(&e))
        }
    }
}
