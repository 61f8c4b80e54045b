//! D365 Metadata CLI
//!
//! Entry point for the `d365-metadata` binary.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use d365_metadata::catalog::{export_entity, render_entity, Catalog};
use d365_metadata::config::{Config, RuntimeConfig};
use d365_metadata::odata::{run_fetch, run_parse, FetchSummary, MetadataClient, MetadataPaths};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "d365-metadata")]
#[command(version)]
#[command(about = "Fetch and explore Dynamics 365 OData $metadata")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ./d365-metadata.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log progress to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Download $metadata and write the raw XML and normalized JSON
    Fetch {
        /// Service root or $metadata URL
        #[arg(long)]
        url: Option<String>,

        /// Bearer token (defaults to the token_env variable, D365_TOKEN)
        #[arg(long)]
        token: Option<String>,

        /// JSON output path; the XML snapshot is written next to it
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Normalize a previously saved XML snapshot
    Parse {
        /// Raw $metadata XML file
        #[arg(long, short)]
        input: PathBuf,

        /// JSON output path
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// List all entity names
    List {
        /// Metadata JSON file
        #[arg(long, short)]
        input: Option<PathBuf>,
    },

    /// Show one entity
    Show {
        entity: String,

        #[arg(long, short)]
        input: Option<PathBuf>,

        /// Print the entity as JSON instead of Markdown
        #[arg(long)]
        json: bool,
    },

    /// Find entities whose name contains a term
    Search {
        term: String,

        #[arg(long, short)]
        input: Option<PathBuf>,

        /// Also match property names
        #[arg(long)]
        properties: bool,
    },

    /// Export one entity as Markdown
    Export {
        entity: String,

        #[arg(long, short)]
        input: Option<PathBuf>,

        /// Markdown output path (defaults to <entity>.md)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so command output on stdout stays clean
    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match cli.config {
        Some(ref path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    let runtime = config.to_runtime()?;

    match cli.command {
        Commands::Fetch { url, token, output } => fetch(&runtime, url, token, output).await,
        Commands::Parse { input, output } => {
            let output = output.unwrap_or_else(|| runtime.output.clone());
            let summary = run_parse(&input, &output)
                .with_context(|| format!("Failed to normalize {}", input.display()))?;
            print_summary(&summary);
            Ok(())
        }
        Commands::List { input } => {
            let catalog = load_catalog(&runtime, input.as_deref())?;
            for name in catalog.names() {
                println!("{}", name);
            }
            Ok(())
        }
        Commands::Show {
            entity,
            input,
            json,
        } => {
            let catalog = load_catalog(&runtime, input.as_deref())?;
            let entity = catalog.get(&entity)?;
            if json {
                println!("{}", serde_json::to_string_pretty(entity)?);
            } else {
                print!("{}", render_entity(entity));
            }
            Ok(())
        }
        Commands::Search {
            term,
            input,
            properties,
        } => {
            let catalog = load_catalog(&runtime, input.as_deref())?;
            let matches = catalog.search(&term, properties);
            if matches.is_empty() {
                println!("No entities match '{}'", term);
            }
            for entity in matches {
                println!("{}", entity.name);
            }
            Ok(())
        }
        Commands::Export {
            entity,
            input,
            output,
        } => {
            let catalog = load_catalog(&runtime, input.as_deref())?;
            let path = export_entity(&catalog, &entity, output.as_deref())?;
            println!("Exported {} to {}", entity, path.display());
            Ok(())
        }
    }
}

async fn fetch(
    runtime: &RuntimeConfig,
    url: Option<String>,
    token: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let endpoint = url
        .or_else(|| runtime.endpoint.clone())
        .ok_or_else(|| anyhow!("No endpoint given: pass --url or set `endpoint` in the config"))?;
    let token = token.or_else(|| runtime.token_from_env()).ok_or_else(|| {
        anyhow!(
            "No bearer token: pass --token or set the {} environment variable",
            runtime.token_env
        )
    })?;

    let client = MetadataClient::new(runtime.timeout, runtime.insecure_ssl)?;
    let url = MetadataClient::metadata_url(&endpoint);
    let paths = MetadataPaths::from_json_path(output.unwrap_or_else(|| runtime.output.clone()));

    let summary = run_fetch(&client, &url, &token, &paths)
        .await
        .with_context(|| format!("Failed to fetch metadata from {}", url))?;
    print_summary(&summary);
    Ok(())
}

fn load_catalog(runtime: &RuntimeConfig, input: Option<&Path>) -> Result<Catalog> {
    let path = input.unwrap_or(runtime.output.as_path());
    Ok(Catalog::load(path)?)
}

fn print_summary(summary: &FetchSummary) {
    println!(
        "Saved {} entities to {} (raw XML: {}, {} KB)",
        summary.entity_count,
        summary.paths.json.display(),
        summary.paths.xml.display(),
        summary.xml_bytes / 1024
    );
}
