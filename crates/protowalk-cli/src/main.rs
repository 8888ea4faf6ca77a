//! protowalk - Dump protobuf descriptor sets
//!
//! This tool decodes serialized `FileDescriptorSet` files (as written by
//! `protoc --descriptor_set_out`) and prints the files, messages and fields
//! they declare, as JSON or as a `.proto`-like outline.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, ValueEnum};
use protowalk_core::render::outline;
use protowalk_core::{Decoder, DecoderConfig, FileSet, Stats};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn, Level};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Extensions treated as descriptor sets in directory mode
const DESCRIPTOR_EXTENSIONS: &[&str] = &["pb", "desc", "protoset", "bin"];

/// Dump protobuf descriptor sets as JSON or a readable outline
#[derive(Parser, Debug)]
#[command(name = "protowalk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    input: InputMode,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Emit JSON on a single line
    #[arg(long)]
    compact: bool,

    /// Print nothing for an input that fails to decode, instead of the files decoded before the failure
    #[arg(long)]
    strict: bool,

    /// Maximum depth of nested message types
    #[arg(long, default_value_t = protowalk_core::descriptor::DEFAULT_RECURSION_LIMIT)]
    recursion_limit: usize,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct InputMode {
    /// Path to a single descriptor set file
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Path to a directory of descriptor set files to process
    #[arg(short, long)]
    directory: Option<PathBuf>,
}

/// Output format for decoded descriptor sets
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Indented JSON, empty attributes omitted
    Json,
    /// `.proto`-like outline
    Tree,
    /// File, message and field counts
    Stats,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    // Dispatch based on input mode
    if let Some(ref file) = cli.input.file {
        process_single_file(&cli, file, &mut out)
    } else if let Some(ref directory) = cli.input.directory {
        process_directory(&cli, directory, &mut out)
    } else {
        bail!("Either --file or --directory must be specified")
    }
}

/// Process a single descriptor set file
fn process_single_file(cli: &Cli, file: &Path, out: &mut impl Write) -> Result<()> {
    if !file.exists() {
        bail!("Input file does not exist: {}", file.display());
    }
    if !file.is_file() {
        bail!("Input path is not a file: {}", file.display());
    }

    decode_path(cli, file, out)
}

/// Process a directory of descriptor sets recursively
fn process_directory(cli: &Cli, directory: &Path, out: &mut impl Write) -> Result<()> {
    if !directory.exists() {
        bail!("Directory does not exist: {}", directory.display());
    }
    if !directory.is_dir() {
        bail!("Path is not a directory: {}", directory.display());
    }

    info!("Scanning directory: {}", directory.display());

    let mut decoded = 0;
    let mut failed = 0;

    for entry in WalkDir::new(directory)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        if !is_descriptor_file(path) {
            trace!("Skipping: {}", path.display());
            continue;
        }

        writeln!(out, "==> {} <==", path.display())?;
        if let Err(e) = decode_path(cli, path, out) {
            // Log error but continue with other files
            warn!("{:#}", e);
            failed += 1;
        } else {
            decoded += 1;
        }
    }

    info!("Decoded {} file(s), {} failed", decoded, failed);
    if failed > 0 {
        bail!(
            "{} of {} input(s) failed to decode",
            failed,
            decoded + failed
        );
    }
    Ok(())
}

/// Heuristic for descriptor set files, by extension
fn is_descriptor_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| DESCRIPTOR_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Decode one file and write its rendering to `out`.
///
/// Unless `--strict` is given, the files decoded before a failure are still
/// written; the failure is returned afterwards.
fn decode_path(cli: &Cli, path: &Path, out: &mut impl Write) -> Result<()> {
    trace!("Reading {}", path.display());
    let data = fs::read(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;

    debug!("Read {} bytes from {}", data.len(), path.display());

    let config = DecoderConfig::new().recursion_limit(cli.recursion_limit);
    let decoded = Decoder::with_config(config).decode_partial(&data);

    if !(cli.strict && decoded.error.is_some()) {
        let rendered = render(cli, &decoded.files)?;
        out.write_all(rendered.as_bytes())
            .context("Failed to write output")?;
    }

    match decoded.error {
        Some(err) => Err(err).with_context(|| format!("Failed to decode {}", path.display())),
        None => Ok(()),
    }
}

/// Render a decoded set in the selected format
fn render(cli: &Cli, files: &FileSet<'_>) -> Result<String> {
    let rendered = match cli.format {
        OutputFormat::Json => {
            let mut json = if cli.compact {
                serde_json::to_string(files)
            } else {
                serde_json::to_string_pretty(files)
            }
            .context("Failed to serialize JSON")?;
            json.push('\n');
            json
        }
        OutputFormat::Tree => outline(files),
        OutputFormat::Stats => {
            let stats = Stats::of(files);
            format!(
                "{} file(s), {} message(s), {} field(s)\n",
                stats.file_count, stats.message_count, stats.field_count
            )
        }
    };
    Ok(rendered)
}
