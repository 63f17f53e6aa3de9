//! # Tether Watch
//!
//! A standalone CLI around the Tether SDK. Connection events are read as
//! newline-delimited JSON (from a file or stdin), dispatched into a
//! tracker, and the chosen connection is waited on until it settles or the
//! timeout passes.
//!
//! ## Event format
//!
//! ```text
//! {"action":"UPDATED","connection":{"id":"c1","spec":{"name":"c1","type":"DIRECT"},
//!  "status":{"kafka_cluster":{"state":"SUCCESS"},"schema_registry":{"state":"ATTEMPTING"}}}}
//! ```

use std::collections::HashMap;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::*;
use tether_core::{is_stable, ConnectionId, ConnectionSnapshot, SubResource, SubResourceStatus};
use tether_sdk::{
    decode_event, ConnectionTracker, DirectConnectionSpec, MemorySpecStore, RecordingNotifier,
    TracingUsageRecorder, TrackerConfigBuilder,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn Error>>;

// ─── CLI ───────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "tether-watch")]
#[command(about = "Wait for Kafka / Schema Registry / Confluent Cloud connections to settle")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Feed events and wait for one connection to become stable
    Wait {
        /// Connection id to wait on
        id: String,
        /// Event file (newline-delimited JSON); stdin when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Give up after this many milliseconds
        #[arg(short, long, default_value_t = 30_000)]
        timeout_ms: u64,
        /// JSON file mapping connection ids to direct connection specs
        #[arg(short, long)]
        specs: Option<PathBuf>,
    },
    /// Decode events and show each snapshot with its stability
    Inspect {
        /// Event file (newline-delimited JSON); stdin when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

// ─── Pretty printing ──────────────────────────────────────────────────────

fn header(text: &str) {
    let bar = "═".repeat(60);
    println!("\n{}", bar.bright_cyan());
    println!("  {}", text.bold().bright_white());
    println!("{}", bar.bright_cyan());
}

fn section(text: &str) {
    println!("\n{} {}", "▸".bright_yellow(), text.bold());
}

fn colored_status(status: SubResourceStatus) -> ColoredString {
    let text = status.to_string();
    match status {
        SubResourceStatus::Success => text.bright_green(),
        SubResourceStatus::Failed => text.bright_red(),
        SubResourceStatus::Attempting => text.bright_yellow(),
        SubResourceStatus::None => text.white(),
        SubResourceStatus::NotApplicable => text.dimmed(),
    }
}

fn show_snapshot(snapshot: &ConnectionSnapshot) {
    let resources = [
        SubResource::DataCluster,
        SubResource::SchemaCatalog,
        SubResource::CloudAuth,
    ];
    let parts: Vec<String> = resources
        .iter()
        .map(|r| format!("{}={}", r.label(), colored_status(snapshot.status(*r))))
        .collect();
    let stable = if is_stable(snapshot) {
        "stable".bright_green().bold()
    } else {
        "pending".bright_yellow()
    };
    println!(
        "  {} {} [{}] {}  {}",
        "•".bright_green(),
        snapshot.display_name().bright_magenta(),
        snapshot.kind,
        parts.join("  "),
        stable
    );
}

// ─── Input ────────────────────────────────────────────────────────────────

async fn open_input(input: Option<&Path>) -> CliResult<Box<dyn AsyncBufRead + Unpin + Send>> {
    Ok(match input {
        Some(path) => Box::new(BufReader::new(tokio::fs::File::open(path).await?)),
        None => Box::new(BufReader::new(tokio::io::stdin())),
    })
}

fn load_specs(path: Option<&Path>) -> CliResult<MemorySpecStore> {
    let store = MemorySpecStore::new();
    if let Some(path) = path {
        let raw = std::fs::read_to_string(path)?;
        let specs: HashMap<String, DirectConnectionSpec> = serde_json::from_str(&raw)?;
        for (id, spec) in specs {
            store.insert(ConnectionId::new(id), spec);
        }
    }
    Ok(store)
}

// ─── Commands ─────────────────────────────────────────────────────────────

async fn run_wait(
    id: String,
    input: Option<PathBuf>,
    timeout_ms: u64,
    specs: Option<PathBuf>,
) -> CliResult<bool> {
    let notifier = Arc::new(RecordingNotifier::new());
    let tracker = ConnectionTracker::new(
        TrackerConfigBuilder::new().default_timeout(timeout_ms).build(),
        notifier.clone(),
        Arc::new(TracingUsageRecorder),
        Arc::new(load_specs(specs.as_deref())?),
    );
    let id = ConnectionId::new(id);

    header(&format!("Waiting for \"{}\"", id));
    let wait = tracker.spawn_wait(id.clone(), Duration::from_millis(timeout_ms));
    let dispatch = tracker.start_dispatch();

    // Feed events in the background: stdin may stay open after the
    // connection has already settled.
    let sender = dispatch.sender();
    let mut lines = open_input(input.as_deref()).await?.lines();
    let feeder = tokio::spawn(async move {
        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }
            if sender.send(line).await.is_err() {
                break;
            }
        }
    });

    let outcome = wait.join().await?;
    feeder.abort();

    let Some(snapshot) = outcome else {
        section("Timed out");
        println!(
            "  {} no stable snapshot within {}ms",
            "✗".bright_red().bold(),
            timeout_ms
        );
        if let Some(last) = tracker.latest_for(&id) {
            show_snapshot(&last);
        }
        return Ok(false);
    };

    section("Stable");
    show_snapshot(&snapshot);

    for (title, status) in [
        ("Connected", SubResourceStatus::Success),
        ("Failed", SubResourceStatus::Failed),
    ] {
        let summaries = tracker.summarize(&snapshot, status).await;
        if summaries.is_empty() {
            continue;
        }
        section(title);
        for summary in summaries {
            let mut line = format!("  {} {}", "•".bright_green(), summary.label.bold());
            if let Some(platform) = &summary.platform {
                line.push_str(&format!(" on {}", platform));
            }
            if let Some(tls) = summary.tls {
                line.push_str(&format!(" (tls: {})", tls));
            }
            if let Some(reason) = &summary.reason {
                line.push_str(&format!(": {}", reason.bright_red()));
            }
            println!("{}", line);
        }
    }

    tracker.report_outcome(&snapshot);
    for notification in notifier.notifications() {
        section("Notification");
        println!("  {}", notification.message.bright_red().bold());
        for action in &notification.actions {
            println!("  [{}]", action.label().bright_cyan());
        }
    }

    Ok(true)
}

async fn run_inspect(input: Option<PathBuf>) -> CliResult<()> {
    header("Connection events");
    let mut lines = open_input(input.as_deref()).await?.lines();
    let mut line_no = 0usize;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        match decode_event(&line) {
            Ok(event) => {
                print!("  {:>4} {:<8}", line_no, format!("{:?}", event.action).bright_cyan());
                show_snapshot(&event.snapshot);
            }
            Err(e) => println!(
                "  {:>4} {} {}",
                line_no,
                "!".bright_red(),
                e.to_string().dimmed()
            ),
        }
    }
    Ok(())
}

// ─── Entry point ───────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Wait {
            id,
            input,
            timeout_ms,
            specs,
        } => run_wait(id, input, timeout_ms, specs).await,
        Commands::Inspect { input } => run_inspect(input).await.map(|_| true),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => {
            eprintln!("{} {}", "error:".bright_red().bold(), e);
            std::process::exit(1);
        }
    }
}
