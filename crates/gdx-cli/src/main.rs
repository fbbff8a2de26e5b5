use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use gdx_model::MemoryContainer;
use gdx_read::{extract_json, ErrorKind, ReadError, ReadOptions};
use serde_json::Value as JsonValue;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "gdx-read")]
#[command(about = "Extract one symbol from a JSON GDX-style container as sparse or dense JSON.")]
struct Args {
    /// Container document (JSON).
    container: PathBuf,

    /// Read specifier as a JSON object (e.g. `{"name": "x", "form": "full"}`).
    ///
    /// Without a read specifier the container's label universe is printed.
    #[arg(long, conflicts_with = "request_file")]
    request: Option<String>,

    /// Read the read specifier from a file.
    #[arg(long = "request-file", conflicts_with = "request")]
    request_file: Option<PathBuf>,

    /// Keep zero-valued records in sparse output.
    #[arg(long)]
    no_squeeze: bool,

    /// Ignore declared symbol domains and index every dimension by the full universe.
    #[arg(long)]
    no_domain_info: bool,

    /// Pretty-print the JSON report.
    #[arg(long)]
    pretty: bool,

    /// Log more detail to stderr (`-v` debug, `-vv` trace). Overrides `RUST_LOG`.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let request = load_request(&args)?;
    let options = ReadOptions {
        squeeze: !args.no_squeeze,
        use_domain_info: !args.no_domain_info,
    };

    let mut container = MemoryContainer::open(&args.container)
        .map_err(ReadError::from)
        .map_err(categorize)?;
    log::debug!(
        "opened {} ({} labels)",
        args.container.display(),
        container.universe().len()
    );

    let extraction =
        extract_json(&mut container, request.as_ref(), &options).map_err(categorize)?;
    let json = if args.pretty {
        serde_json::to_string_pretty(&extraction)?
    } else {
        serde_json::to_string(&extraction)?
    };
    write_stdout(&json)
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    // A subscriber may already be installed when embedded; logging is best-effort.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn load_request(args: &Args) -> Result<Option<JsonValue>> {
    let text = match (&args.request, &args.request_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read request file {}", path.display()))?,
        (None, None) => return Ok(None),
    };
    let request = serde_json::from_str(&text).context("read specifier is not valid JSON")?;
    Ok(Some(request))
}

fn categorize(err: ReadError) -> anyhow::Error {
    let category = match err.kind() {
        ErrorKind::Validation => "validation error",
        ErrorKind::NotFound => "not found",
        ErrorKind::UnsupportedCombination => "unsupported combination",
        ErrorKind::Io => "I/O error",
    };
    anyhow::Error::new(err).context(category)
}

fn write_stdout(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    match writeln!(stdout, "{text}").and_then(|()| stdout.flush()) {
        // Downstream consumer went away (e.g. `gdx-read ... | head`).
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => Ok(other?),
    }
}
