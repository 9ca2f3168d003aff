//! fpregister - register a recording in the fingerprint catalog
//!
//! Usage: fpregister <input_audio_path> --id <song_id>

use anyhow::{Context, Result};
use clap::Parser;
use echomark_core::{audio, register_song, AppConfig, PostgresStore};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fpregister")]
#[command(about = "Register an audio file in the fingerprint catalog", long_about = None)]
struct Args {
    /// Input audio file path (wav, mp3, flac, ogg)
    input_audio_path: String,

    /// Song identifier to register under (must be non-zero)
    #[arg(short, long)]
    id: u32,

    /// TOML configuration file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    echomark_cli::logging::init(args.verbose);

    let config = match &args.config {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("failed to load config: {}", path.display()))?,
        None => AppConfig::default(),
    };

    let audio_data = audio::decode_audio(&args.input_audio_path, config.engine.sample_rate)
        .with_context(|| format!("failed to decode: {}", args.input_audio_path))?;

    log::info!(
        "decoded {}: {:.1}s, {} samples @ {}Hz",
        args.input_audio_path,
        audio_data.duration_ms as f64 / 1000.0,
        audio_data.samples.len(),
        audio_data.sample_rate
    );

    let store = PostgresStore::new(&config.postgres)
        .await
        .context("failed to connect to the fingerprint store")?;

    let report = register_song(
        &store,
        &audio_data.samples,
        audio_data.sample_rate,
        args.id,
        &config.engine,
    )
    .await?;

    println!(
        "Registered song {}: {} fingerprints stored, {} failed",
        args.id, report.inserted, report.failed
    );

    if report.failed > 0 {
        // Inserts are idempotent; re-running completes the catalog.
        eprintln!("warning: partial registration; re-run to retry failed records");
    }

    Ok(())
}
