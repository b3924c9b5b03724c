//! Command-line interface for the snapdiff snapshot diff engine.
//!
//! `snapdiff diff` compares two documents and prints the change records as a
//! JSON array. `snapdiff batch` runs the snapshot pipeline over NDJSON rows and
//! appends one update line per changed product.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use snapdiff_core::pipeline::{run_pipeline, NdjsonSink, NdjsonSource, RetryPolicy};
use snapdiff_core::{compare_documents, CompareOptions, KeyFieldMap, KeyMode, RecordOrder, Value};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "SNAPDIFF_LOG";
const DEFAULT_LOG_FILTER: &str = "warn";

const EXIT_EQUAL: u8 = 0;
const EXIT_DIFFERENT: u8 = 1;
const EXIT_ERROR: u8 = 2;

#[derive(Debug, Parser)]
#[command(
    name = "snapdiff",
    version,
    about = "Diff document snapshots, aligning configured lists by identity keys."
)]
struct Cli {
    /// Format of log events written to stderr.
    #[arg(long = "log-format", value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compare two documents and print the change records.
    Diff(DiffArgs),
    /// Compare every snapshot row of an NDJSON file and write the updates.
    Batch(BatchArgs),
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
enum KeyModeArg {
    /// Align once per configured key.
    #[default]
    Independent,
    /// Identify each element by the first key it carries.
    Fallback,
}

impl From<KeyModeArg> for KeyMode {
    fn from(value: KeyModeArg) -> Self {
        match value {
            KeyModeArg::Independent => Self::Independent,
            KeyModeArg::Fallback => Self::Fallback,
        }
    }
}

#[derive(Debug, Args)]
struct CompareArgs {
    /// Identity-key configuration (JSON or YAML mapping of field to keys).
    #[arg(long = "keys", value_name = "FILE")]
    keys: Option<PathBuf>,

    /// How several identity keys for one field are applied.
    #[arg(long = "key-mode", value_enum, default_value_t = KeyModeArg::Independent)]
    key_mode: KeyModeArg,

    /// Sort records by path instead of traversal order.
    #[arg(long = "sort")]
    sort: bool,

    /// Leave out unregistered top-level fields present in only one document.
    #[arg(long = "skip-unmatched-fields")]
    skip_unmatched_fields: bool,
}

impl CompareArgs {
    fn to_options(&self) -> Result<CompareOptions> {
        let key_fields = match &self.keys {
            Some(path) => KeyFieldMap::load(path)
                .with_context(|| format!("failed to load key configuration {}", path.display()))?,
            None => KeyFieldMap::new(),
        };
        let order = if self.sort { RecordOrder::SortedByPath } else { RecordOrder::Traversal };
        Ok(CompareOptions::default()
            .with_key_fields(key_fields)
            .with_key_mode(self.key_mode.into())
            .with_record_order(order)
            .with_unmatched_top_level_fields(!self.skip_unmatched_fields))
    }
}

#[derive(Debug, Args)]
struct DiffArgs {
    /// Previous version of the document.
    old: PathBuf,

    /// Current version of the document.
    new: PathBuf,

    #[command(flatten)]
    compare: CompareArgs,

    /// Read both documents as YAML instead of JSON.
    #[arg(long = "yaml")]
    yaml: bool,

    /// Pretty-print the records.
    #[arg(long = "pretty")]
    pretty: bool,

    /// Write the records to FILE instead of stdout.
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct BatchArgs {
    /// NDJSON file of snapshot rows.
    #[arg(long = "input", value_name = "ROWS")]
    input: PathBuf,

    /// Append updates to FILE instead of writing them to stdout.
    #[arg(long = "output", value_name = "FILE")]
    output: Option<PathBuf>,

    #[command(flatten)]
    compare: CompareArgs,

    /// Retries after a failed read or write.
    #[arg(long = "max-retries", default_value_t = 5)]
    max_retries: u32,

    /// Seconds to wait between two attempts.
    #[arg(long = "retry-delay-secs", default_value_t = 20)]
    retry_delay_secs: u64,
}

impl BatchArgs {
    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_secs(self.retry_delay_secs))
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match run(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            let _ = writeln!(io::stderr(), "error: {err:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false);
    let installed = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if let Err(err) = installed {
        let _ = writeln!(io::stderr(), "warning: could not install log subscriber: {err}");
    }
}

fn run(cli: &Cli) -> Result<u8> {
    match &cli.command {
        Command::Diff(args) => run_diff(args),
        Command::Batch(args) => run_batch(args),
    }
}

fn run_diff(args: &DiffArgs) -> Result<u8> {
    let options = args.compare.to_options()?;
    let old = read_document(&args.old, args.yaml)?;
    let new = read_document(&args.new, args.yaml)?;

    let diff = compare_documents(&old, &new, &options);
    debug!(records = diff.len(), "documents compared");

    let rendered = if args.pretty { diff.render_json_pretty() } else { diff.render_json() };
    let mut rendered = rendered.context("failed to serialize diff records")?;
    rendered.push('\n');

    match &args.output {
        Some(path) => fs::write(path, rendered.as_bytes())
            .with_context(|| format!("failed to write output to {}", path.display()))?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(rendered.as_bytes()).context("failed to write to stdout")?;
            stdout.flush().ok();
        }
    }

    Ok(if diff.is_empty() { EXIT_EQUAL } else { EXIT_DIFFERENT })
}

fn run_batch(args: &BatchArgs) -> Result<u8> {
    let options = args.compare.to_options()?;
    let policy = args.retry_policy();
    let mut source = NdjsonSource::new(&args.input);

    let summary = match &args.output {
        Some(path) => {
            let mut sink = NdjsonSink::append(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            run_pipeline(&mut source, &mut sink, &options, &policy)
        }
        None => {
            let mut sink = NdjsonSink::new(io::stdout().lock());
            run_pipeline(&mut source, &mut sink, &options, &policy)
        }
    }
    .with_context(|| format!("batch over {} failed", args.input.display()))?;

    info!(
        snapshots = summary.snapshots,
        changed = summary.changed,
        records = summary.records,
        "batch finished"
    );
    Ok(EXIT_EQUAL)
}

fn read_document(path: &Path, yaml: bool) -> Result<Value> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let parsed = if yaml { Value::from_yaml_str(&text) } else { Value::from_json_str(&text) };
    parsed.with_context(|| format!("failed to parse {}", path.display()))
}
