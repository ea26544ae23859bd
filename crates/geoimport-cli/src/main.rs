//! Command-line interface for `geoimport`, the format detection front of the import pipeline.
//!
//! This binary wraps the [`geoimport_core`] registry: it finds which formats
//! claim a file and lists the layers each of them would import.
//!
//! # Available Commands
//!
//! - `formats` - List all registered formats and their capabilities
//! - `lookup` - Show which formats claim a file
//! - `list` - List the importable layers of a file

mod display;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use tracing::{Level, debug, info};
use tracing_log::LogTracer;
use tracing_subscriber::FmtSubscriber;

use geoimport_core::{FormatRegistry, default_registry};
use geoimport_core_common::{CancellationToken, Catalog, ImportData, ImportError};

use crate::display::{FormatRow, LayerRow, display_formats, display_layers};

#[derive(Parser)]
#[command(
    name = "geoimport",
    version,
    about = "Detect geospatial formats and list importable layers"
)]
/// Command-line arguments and options for the `geoimport` CLI.
struct Cli {
    /// Enable verbose (INFO level) logging output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug (DEBUG level) logging output with detailed diagnostics.
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists all registered formats and their capabilities.
    Formats,

    /// Shows every format that claims a file, in registration order.
    Lookup {
        /// Path to the candidate file.
        #[arg(value_name = "PATH")]
        input: PathBuf,
    },

    /// Lists the layers a file would import as.
    List {
        /// Path to the candidate file.
        #[arg(value_name = "PATH")]
        input: PathBuf,

        /// Only use the named format (e.g. "GeoPackage Vector").
        #[arg(short, long, value_name = "NAME")]
        format: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    // Bridge logs from the `log` crate to the `tracing` ecosystem.
    LogTracer::init()?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let registry = Arc::new(default_registry().map_err(friendly)?);
    debug!("Registry holds {} formats", registry.len());

    match cli.command {
        Commands::Formats => handle_formats(&registry),
        Commands::Lookup { input } => {
            info!("Looking up {}", input.display());
            handle_lookup(&registry, &input)?;
        },
        Commands::List { input, format } => {
            info!("Listing layers of {}", input.display());
            handle_list(registry, input, format).await?;
        },
    }

    Ok(())
}

fn handle_formats(registry: &FormatRegistry) {
    let rows = registry
        .handlers()
        .iter()
        .map(|h| FormatRow::from_handler(h.as_ref()))
        .collect();
    display_formats(rows);
}

fn handle_lookup(registry: &FormatRegistry, input: &std::path::Path) -> Result<()> {
    let handlers = registry.lookup_path(input).map_err(friendly)?;
    if handlers.is_empty() {
        println!("No format claims {}", input.display());
        return Ok(());
    }
    for handler in handlers {
        println!("{}", handler.name());
    }
    Ok(())
}

async fn handle_list(
    registry: Arc<FormatRegistry>,
    input: PathBuf,
    format: Option<String>,
) -> Result<()> {
    let display_name = input.display().to_string();
    let rows = tokio::task::spawn_blocking(move || collect_layers(&registry, input, format))
        .await??;
    display_layers(&display_name, rows);
    Ok(())
}

/// Runs lookup and listing, which block on file IO.
fn collect_layers(
    registry: &FormatRegistry,
    input: PathBuf,
    format: Option<String>,
) -> Result<Vec<LayerRow>> {
    let data = ImportData::file(input);
    let mut handlers = registry.lookup(&data).map_err(friendly)?;

    if let Some(name) = format {
        let handler = registry
            .find(&name)
            .ok_or_else(|| anyhow!("Format '{name}' not found."))?;
        if !handler.can_read(&data) {
            return Err(anyhow!(
                "Format '{}' cannot read {}.",
                handler.name(),
                data.describe()
            ));
        }
        handlers = vec![handler];
    } else if handlers.is_empty() {
        return Err(anyhow!("No format claims {}.", data.describe()));
    }

    let catalog = Catalog::new();
    let cancel = CancellationToken::new();
    let mut rows = Vec::new();
    for handler in handlers {
        let tasks = handler.list(&data, &catalog, &cancel).map_err(friendly)?;
        debug!("{} listed {} layers", handler.name(), tasks.len());
        rows.extend(tasks.iter().map(|task| {
            LayerRow::new(handler.name(), task, handler.feature_count(&data, task))
        }));
    }
    Ok(rows)
}

/// Converts an import error into its user-facing message and suggestion.
fn friendly(err: ImportError) -> anyhow::Error {
    let message = err.user_message();
    match err.recovery_suggestion() {
        Some(hint) => anyhow!("{message}\n{hint}"),
        None => anyhow!(message),
    }
}
