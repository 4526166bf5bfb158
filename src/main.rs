// src/main.rs

use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use notion_snapshot::{
    render_markdown, AppError, Command, CommandLineInput, EventNormalizer, FixtureSource,
    MemorySnapshotStore, Notification, SnapshotConfig, SnapshotPipeline,
};
use serde_json::Value;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

/// Sets up logging configuration. Console output goes to stderr so stdout
/// carries only command output.
fn setup_logging(verbose: bool) -> anyhow::Result<()> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let log_file_path = std::env::temp_dir().join("notion_snapshot.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    let stderr_appender = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}",
        )))
        .build(&log_file_path)?;

    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr_appender)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("stderr")
                .appender("file")
                .build(log_level),
        )?;

    log4rs::init_config(config)?;
    log::info!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

/// Reads a JSON document from a file, or from stdin when `input` is `-`.
fn read_json_input(input: &str) -> anyhow::Result<Value> {
    let raw = if input == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read stdin")?;
        buffer
    } else {
        fs::read_to_string(input).with_context(|| format!("Failed to read {}", input))?
    };

    serde_json::from_str(&raw).map_err(|source| {
        AppError::JsonParseError {
            path: Path::new(input).to_path_buf(),
            source,
        }
        .into()
    })
}

fn run_normalize(payload: &Value) -> anyhow::Result<()> {
    let notification = EventNormalizer::default()
        .normalize(payload)
        .map_err(AppError::from)?;

    match notification {
        Notification::Verification(token) => {
            println!("Verification token received: {}", token);
        }
        Notification::Events(events) => {
            for event in &events {
                println!("{}", serde_json::to_string(event)?);
            }
        }
    }
    Ok(())
}

async fn run_ingest(config: &SnapshotConfig, payload: &Value, fixtures: &Path) -> anyhow::Result<()> {
    let store = Arc::new(MemorySnapshotStore::new());
    let pipeline = SnapshotPipeline::new(
        config.composer(),
        Arc::new(FixtureSource::new(fixtures)),
        store.clone(),
    );

    let report = pipeline
        .ingest(payload)
        .await
        .context("Failed to ingest delivery")?;

    eprintln!("{}", report.summary());
    println!("{}", serde_json::to_string_pretty(&store.snapshots())?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CommandLineInput::parse();

    setup_logging(cli.verbose)?;

    let config = SnapshotConfig::resolve(&cli)?;
    let payload = read_json_input(cli.command.input())?;

    match &cli.command {
        Command::Render { .. } => print!("{}", render_markdown(&payload)),
        Command::Normalize { .. } => run_normalize(&payload)?,
        Command::Ingest { fixtures, .. } => run_ingest(&config, &payload, fixtures).await?,
    }

    Ok(())
}
