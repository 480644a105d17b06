//! Chorale - Snapcast streaming server
//!
//! Serves a generated test tone to Snapcast clients. Mostly useful for
//! trying the output against real snapclients:
//!
//! ```bash
//! chorale
//! chorale --config configs/example.toml
//! chorale --port 1705 --frequency 220
//! ```
//!
//! The producer loop runs on the main thread the way a playback pipeline
//! would: submit a block, sleep the output's reported delay, repeat.

mod tone;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chorale_output::{AudioFormat, SampleFormat, SnapcastConfig, SnapcastOutput, Tag, TagKind};

use crate::tone::ToneGenerator;

/// PCM frames submitted per play call
const BLOCK_FRAMES: usize = 1024;

/// Chorale - Snapcast streaming server
#[derive(Parser, Debug)]
#[command(name = "chorale")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured listening port
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Test tone frequency in Hz
    #[arg(long, default_value_t = 440.0)]
    frequency: f32,
}

/// Top-level configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct Config {
    snapcast: SnapcastConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };

    let mut snapcast = config.snapcast;
    if let Some(port) = cli.port {
        snapcast.port = port;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;

    let mut output = SnapcastOutput::new(runtime.handle().clone(), snapcast)?;
    output.bind()?;
    info!(port = output.bound_port(), "serving; connect with snapclient");

    let mut format = AudioFormat::new(44100, SampleFormat::S16, 2);
    output.open(&mut format)?;

    // Ctrl-c ends the producer loop
    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        runtime.spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
            running.store(false, Ordering::Relaxed);
        });
    }

    let tag = Tag::new()
        .with(TagKind::Artist, "Chorale")
        .with(TagKind::Title, format!("Test tone {} Hz", cli.frequency));

    let mut tone = ToneGenerator::new(&format, cli.frequency);

    // Resend tags about once a second so late joiners see them too (tags
    // are dropped for clients that haven't finished their handshake)
    let blocks_per_tag = format.sample_rate as usize / BLOCK_FRAMES;
    let mut blocks_since_tag = blocks_per_tag;

    while running.load(Ordering::Relaxed) {
        blocks_since_tag += 1;
        if blocks_since_tag > blocks_per_tag {
            output.send_tag(&tag);
            blocks_since_tag = 0;
        }

        let block = tone.next_block(BLOCK_FRAMES);
        output.play(&block)?;
        std::thread::sleep(output.delay());
    }

    output.drain();
    output.close();
    output.unbind();

    Ok(())
}

fn load_config(path: &Path) -> Result<Config> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("invalid config {}", path.display()))
}

/// Install the log subscriber; `RUST_LOG` takes precedence over the flag
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("invalid log level {level:?}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    Ok(())
}
