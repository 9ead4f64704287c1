//! Schema Inference CLI
//!
//! Builds the Avro schema for one root type of a JSON object model file.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use schema_infer::{Fingerprint, InferConfig, OutputFormat, SchemaGenerator, TypeCatalog};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-infer")]
#[command(about = "Infer an Avro schema from an object model description")]
struct Cli {
    /// Object model file (JSON: {"types": [...]})
    #[arg(short, long)]
    model: PathBuf,

    /// Root type id (e.g., "com.acme.Order")
    #[arg(short, long)]
    root: String,

    /// Config file (defaults to schema-infer.toml lookup)
    #[arg(short, long)]
    config: Option<String>,

    /// Give nullable fields without a default a null default
    #[arg(long)]
    add_null_defaults: bool,

    /// Re-parse the result with apache-avro
    #[arg(long)]
    validate: bool,

    /// Print compact JSON
    #[arg(long)]
    compact: bool,

    /// Print the schema fingerprint after the schema
    #[arg(long)]
    fingerprint: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = InferConfig::load_from(cli.config.as_deref()).context("loading configuration")?;
    if cli.add_null_defaults {
        config.inference.add_null_defaults = true;
    }
    if cli.validate {
        config.inference.validate_avro = true;
    }
    if cli.compact {
        config.output.format = OutputFormat::Compact;
    }

    let catalog = TypeCatalog::from_path(&cli.model)
        .with_context(|| format!("reading object model {}", cli.model.display()))?;

    let generator = SchemaGenerator::with_config(&catalog, config.inference.clone());
    let schema = generator
        .generate(&cli.root)
        .with_context(|| format!("building schema for {}", cli.root))?;

    println!("{}", schema.to_json_string(config.output.format)?);
    if cli.fingerprint {
        println!("{}", Fingerprint::of(&schema));
    }
    Ok(())
}
