//! Capability-tag trace replay CLI.
//!
//! This binary replays a JSON-lines memory trace through the tag tracker. It performs:
//! 1. **Replay:** Feeds every record to its thread's tag table, aborting on the first violation.
//! 2. **Fill output:** Optionally prints each fill request as a JSON line on stdout.
//! 3. **Statistics:** Optionally prints the replay statistics report.

use clap::Parser;
use std::io::{self, BufWriter, Write};
use std::{fs, process};

use tagsim_core::config::Config;
use tagsim_core::sim::{LineRequestSink, NullSink, Replayer, TraceReader};
use tagsim_core::tags::LineRequest;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "tagsim",
    author,
    version,
    about = "Replay a memory trace and track capability tags",
    long_about = "Replay a JSON-lines memory trace, reconstruct the capability tag of every 16-byte granule, and build cache line fill requests.\n\nEach trace line is one record, e.g.\n  {\"thread\":0,\"type\":\"marker\",\"marker\":\"capability_tag\",\"value\":1}\n  {\"thread\":0,\"type\":\"data_read\",\"addr\":4096,\"size\":16}\n\nExamples:\n  tagsim trace.jsonl --stats\n  tagsim trace.jsonl --emit --line-bytes 128"
)]
struct Cli {
    /// JSON-lines trace to replay.
    trace: String,

    /// JSON configuration file.
    #[arg(short, long)]
    config: Option<String>,

    /// Cache line size in bytes (overrides the configuration).
    #[arg(long)]
    line_bytes: Option<u64>,

    /// Print every fill request as a JSON line on stdout.
    #[arg(long)]
    emit: bool,

    /// Print the statistics report after the replay.
    #[arg(long)]
    stats: bool,
}

/// Writes fill requests to stdout as JSON lines.
#[derive(Debug)]
struct JsonLinesSink<W: Write> {
    out: W,
    failed: Option<io::Error>,
}

impl<W: Write> LineRequestSink for JsonLinesSink<W> {
    fn on_fill(&mut self, thread: u32, request: &LineRequest) {
        if self.failed.is_some() {
            return;
        }
        let line = serde_json::json!({ "thread": thread, "request": request });
        if let Err(e) = writeln!(self.out, "{line}") {
            self.failed = Some(e);
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli);

    let mut replayer = Replayer::new(config).unwrap_or_else(|e| {
        eprintln!("[!] FATAL: {}", e);
        process::exit(1);
    });
    let reader = TraceReader::open(&cli.trace).unwrap_or_else(|e| {
        eprintln!("[!] FATAL: Could not open trace '{}': {}", cli.trace, e);
        process::exit(1);
    });

    let result = if cli.emit {
        let mut sink = JsonLinesSink {
            out: BufWriter::new(io::stdout().lock()),
            failed: None,
        };
        let result = replayer.run(reader, &mut sink);
        if let Some(e) = sink.failed.take().or_else(|| sink.out.flush().err()) {
            eprintln!("[!] FATAL: Could not write fill requests: {}", e);
            process::exit(1);
        }
        result
    } else {
        replayer.run(reader, &mut NullSink)
    };

    tracing::info!(
        threads = replayer.threads().count(),
        granules = replayer.known_granules(),
        "replay finished"
    );
    if cli.stats {
        replayer.stats().print(replayer.known_granules());
    }
    if let Err(e) = result {
        eprintln!("[!] FATAL: {}", e);
        process::exit(1);
    }
}

/// Builds the configuration from the optional file and command-line overrides.
///
/// Exits the process with an error message if the file cannot be read or parsed.
fn load_config(cli: &Cli) -> Config {
    let mut config = match &cli.config {
        Some(path) => {
            let json = fs::read_to_string(path).unwrap_or_else(|e| {
                eprintln!("[!] FATAL: Could not read config '{}': {}", path, e);
                process::exit(1);
            });
            Config::from_json(&json).unwrap_or_else(|e| {
                eprintln!("[!] FATAL: Invalid config '{}': {}", path, e);
                process::exit(1);
            })
        }
        None => Config::default(),
    };
    if let Some(line_bytes) = cli.line_bytes {
        config.replay.line_bytes = line_bytes;
    }
    if cli.emit {
        config.replay.emit_fill_requests = true;
    }
    config
}
