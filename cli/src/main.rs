use std::fs;
use std::io::Read;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use interface_schema_builder::pipe::{PipeOverrides, get_chunks};
use interface_schema_builder::{
    BuilderConfig, DescriptorSet, SchemaBuilder, build_pipe_targets_config,
    reconstruct_expanded_models,
};
use interface_schema_core::{Argument, ParserSchema, PipePriority, validate_schema};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

/// CLI-specific output format enum with clap argument parsing support.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "schema-build")]
#[command(about = "Build CLI schemas from callable descriptors")]
struct Cli {
    /// Log decisions to stderr (overridden by RUST_LOG).
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build a parser schema from a descriptor file.
    Build(BuildArgs),
    /// Build a schema and check its structural invariants.
    Validate(ValidateArgs),
    /// Split a payload read from stdin into pipe-target chunks.
    Pipe(PipeArgs),
    /// Rebuild record values from a flat parse result.
    Reconstruct(ReconstructArgs),
}

#[derive(Debug, Args)]
struct SourceArgs {
    /// Descriptor file (JSON) listing commands and groups.
    #[arg(long)]
    input: PathBuf,
    /// Builder settings (YAML).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct BuildArgs {
    #[command(flatten)]
    source: SourceArgs,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    #[command(flatten)]
    source: SourceArgs,
}

#[derive(Debug, Args)]
struct PipeArgs {
    /// Comma-separated target names, in chunk order.
    #[arg(long)]
    targets: String,
    /// Chunk delimiter (default: line breaks).
    #[arg(long)]
    delimiter: Option<String>,
    /// Pad missing chunks with null instead of failing.
    #[arg(long)]
    allow_partial: bool,
    /// Priority between CLI and piped values (cli or pipe).
    #[arg(long)]
    priority: Option<String>,
}

#[derive(Debug, Args)]
struct ReconstructArgs {
    #[command(flatten)]
    source: SourceArgs,
    /// Top-level command name or alias.
    #[arg(long)]
    command: String,
    /// Subcommand name or alias, for classes and groups.
    #[arg(long)]
    subcommand: Option<String>,
    /// Flat parse result (JSON object keyed by argument name).
    #[arg(long)]
    args: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Build(args) => run_build(args),
        Command::Validate(args) => run_validate(args),
        Command::Pipe(args) => run_pipe(args),
        Command::Reconstruct(args) => run_reconstruct(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run_build(args: BuildArgs) -> Result<(), String> {
    let schema = load_schema(&args.source)?;
    let output = match args.format {
        CliOutputFormat::Json => serde_json::to_string_pretty(&schema)
            .map_err(|err| format!("Failed to serialize schema: {err}"))?,
        CliOutputFormat::Yaml => serde_yaml::to_string(&schema)
            .map_err(|err| format!("Failed to serialize schema: {err}"))?,
    };
    println!("{output}");
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    let schema = load_schema(&args.source)?;
    let errors = validate_schema(&schema);
    if !errors.is_empty() {
        for error in &errors {
            eprintln!("  {error}");
        }
        return Err(format!("Schema has {} validation error(s)", errors.len()));
    }

    println!(
        "Validated schema with {} command(s).",
        schema.commands.len()
    );
    Ok(())
}

fn run_pipe(args: PipeArgs) -> Result<(), String> {
    let targets = parse_csv_list(&args.targets);
    let mut overrides = PipeOverrides::default().with_allow_partial(args.allow_partial);
    if let Some(delimiter) = args.delimiter.as_deref() {
        overrides = overrides.with_delimiter(Some(delimiter));
    }
    if let Some(priority) = args.priority.as_deref() {
        overrides = overrides.with_priority(priority);
    }
    let config = build_pipe_targets_config(targets, overrides).map_err(|e| e.to_string())?;

    let mut payload = String::new();
    std::io::stdin()
        .read_to_string(&mut payload)
        .map_err(|err| format!("Failed to read stdin: {err}"))?;

    let chunks = get_chunks(&payload, &config).map_err(|e| e.to_string())?;

    #[derive(Serialize)]
    struct PipeOutput {
        targets: Vec<String>,
        priority: PipePriority,
        chunks: Vec<Option<String>>,
    }

    let output = PipeOutput {
        targets: config.targets,
        priority: config.priority,
        chunks,
    };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| format!("Failed to serialize output: {e}"))?;
    println!("{json}");
    Ok(())
}

fn run_reconstruct(args: ReconstructArgs) -> Result<(), String> {
    let schema = load_schema(&args.source)?;
    let command = schema
        .resolve_command(&args.command)
        .map_err(|e| e.to_string())?;
    let leaf = match args.subcommand.as_deref() {
        Some(name) => command
            .find_subcommand(name)
            .ok_or_else(|| format!("Unknown subcommand '{name}' for '{}'", command.cli_name))?,
        None => command,
    };

    let raw = fs::read_to_string(&args.args)
        .map_err(|err| format!("Failed to read '{}': {err}", args.args.display()))?;
    let flat: Map<String, Value> = serde_json::from_str(&raw)
        .map_err(|err| format!("Failed to parse '{}': {err}", args.args.display()))?;

    let arguments: Vec<Argument> = command
        .initializer
        .iter()
        .chain(&leaf.parameters)
        .cloned()
        .collect();
    debug!(command = %leaf.cli_name, arguments = arguments.len(), "Reconstructing models");
    let rebuilt = reconstruct_expanded_models(flat, &arguments).map_err(|e| e.to_string())?;

    let json = serde_json::to_string_pretty(&Value::Object(rebuilt))
        .map_err(|e| format!("Failed to serialize output: {e}"))?;
    println!("{json}");
    Ok(())
}

fn load_schema(source: &SourceArgs) -> Result<ParserSchema, String> {
    let config = match &source.config {
        Some(path) => BuilderConfig::load(path)
            .map_err(|e| format!("Failed to load config '{}': {e}", path.display()))?,
        None => BuilderConfig::default(),
    };
    let descriptors = DescriptorSet::load(&source.input)
        .map_err(|e| format!("Failed to load descriptors '{}': {e}", source.input.display()))?;

    let builder = SchemaBuilder::from_config(&config).map_err(|e| e.to_string())?;
    let builder = descriptors.register(builder).map_err(|e| e.to_string())?;
    let schema = builder.build().map_err(|e| e.to_string())?;
    info!(
        input = %source.input.display(),
        commands = schema.commands.len(),
        "Loaded schema"
    );
    Ok(schema)
}

fn parse_csv_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
