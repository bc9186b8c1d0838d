use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use serde::Deserialize;

use pfptmeta_core::resource::{Resource, Value};
use pfptmeta_provider::validate_resource;

mod protocol;
mod redact;
mod server;

#[derive(Parser)]
#[command(name = "terraform-provider-pfptmeta")]
#[command(about = "Proofpoint Meta provider for declarative infrastructure tools", long_about = None)]
struct Cli {
    /// Log at debug level, including every request and response
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the provider on stdin/stdout (default)
    Serve,
    /// Print every resource and data source schema as JSON
    Schema,
    /// Validate a JSON document of resource blocks without contacting the API
    Validate {
        /// Path to the JSON document
        file: PathBuf,
    },
}

/// One block of a document checked by `validate`
#[derive(Debug, Deserialize)]
struct Block {
    #[serde(rename = "type")]
    resource_type: String,
    name: String,
    #[serde(default)]
    attributes: HashMap<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
struct Document {
    #[serde(default)]
    resources: Vec<Block>,
    #[serde(default)]
    data_sources: Vec<Block>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => server::serve(cli.debug).await,
        Commands::Schema => run_schema(),
        Commands::Validate { file } => run_validate(&file),
    }
}

/// Log to stderr; stdout carries the protocol
fn init_logging(debug: bool) {
    let env = env_logger::Env::default().default_filter_or("warn");
    let mut builder = env_logger::Builder::from_env(env);
    if debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .init();
}

fn run_schema() -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&server::schema_document())?);
    Ok(())
}

fn validate_document(document: Document) -> Vec<String> {
    let blocks = document
        .resources
        .into_iter()
        .map(|b| (b, false))
        .chain(document.data_sources.into_iter().map(|b| (b, true)));

    let mut errors = Vec::new();
    for (block, read_only) in blocks {
        let resource = Resource::new(&block.resource_type, &block.name)
            .with_attributes(block.attributes)
            .with_read_only(read_only);
        if let Err(e) = validate_resource(&resource) {
            if e.validation.is_empty() {
                errors.push(e.to_string());
            } else {
                for error in &e.validation {
                    errors.push(format!(
                        "{}.{}: {}",
                        block.resource_type, block.name, error
                    ));
                }
            }
        }
    }
    errors
}

fn run_validate(file: &Path) -> anyhow::Result<()> {
    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let document: Document = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", file.display()))?;
    let count = document.resources.len() + document.data_sources.len();

    let errors = validate_document(document);
    if !errors.is_empty() {
        for error in &errors {
            eprintln!("  {}", error);
        }
        bail!("{} validation error(s) in {}", errors.len(), file.display());
    }

    println!("{}: {} block(s) valid", file.display(), count);
    Ok(())
}
