//! fpcheck - check a clip against the fingerprint catalog
//!
//! Usage: fpcheck <input_audio_path> [--json]

use anyhow::{Context, Result};
use clap::Parser;
use echomark_cli::output::{print_json_report, print_text_report, CheckReport};
use echomark_core::{audio, find_matches, AppConfig, PostgresStore};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fpcheck")]
#[command(about = "Check an audio file for matches against registered recordings", long_about = None)]
struct Args {
    /// Input audio file path (wav, mp3, flac, ogg)
    input_audio_path: String,

    /// TOML configuration file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit JSON instead of plain text
    #[arg(short, long)]
    json: bool,

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

    let matches = find_matches(
        &store,
        &audio_data.samples,
        audio_data.sample_rate,
        &config.engine,
    )
    .await?;

    let report = CheckReport::new(&matches, config.engine.score_threshold);
    if args.json {
        print_json_report(&report);
    } else {
        print_text_report(&report);
    }

    Ok(())
}
