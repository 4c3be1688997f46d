//! mpx-play - command-line player driving one media engine
//!
//! Opens a file, optionally seeks, plays for a while (or until the media
//! ends or Ctrl+C), then closes and disposes the engine.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use mpx_common::MediaEvent;
use mpx_engine::{EngineConfig, MediaEngine};
use tokio::signal;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for mpx-play
#[derive(Parser, Debug)]
#[command(name = "mpx-play")]
#[command(about = "Play a media file through the mpx engine")]
#[command(version)]
struct Args {
    /// Media file to open
    source: String,

    /// Engine configuration file (TOML)
    #[arg(short, long, env = "MPX_CONFIG")]
    config: Option<PathBuf>,

    /// Seconds to play before closing
    #[arg(long, default_value = "10")]
    play_for: f64,

    /// Seek to this many seconds before playing
    #[arg(long)]
    seek: Option<f64>,

    /// Print each property diff as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mpx_engine=debug,mpx_common=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let play_for = seconds_arg("--play-for", args.play_for)?;
    let seek = args.seek.map(|seconds| seconds_arg("--seek", seconds)).transpose()?;

    let config = EngineConfig::load(args.config.as_deref())
        .context("Failed to load engine configuration")?;
    let engine = MediaEngine::new(config).context("Failed to create media engine")?;
    info!("Engine {} ready", engine.id());

    let printer = tokio::spawn(print_events(engine.subscribe(), args.json));
    let mut ended = engine.subscribe();

    let outcome = engine
        .open(args.source.as_str())
        .await
        .with_context(|| format!("Failed to open {}", args.source))?;
    info!("Open: {:?}", outcome);

    if let Some(position) = seek {
        let outcome = engine.seek(position).await?;
        info!("Seek: {:?}", outcome);
    }

    engine.play().await?;

    tokio::select! {
        _ = tokio::time::sleep(play_for) => {
            info!("Play time elapsed");
        }
        _ = wait_for_end(&mut ended) => {
            info!("Media ended");
        }
        result = signal::ctrl_c() => {
            result.context("Failed to listen for Ctrl+C")?;
            info!("Interrupted");
        }
    }

    engine.close().await?;
    engine.dispose().await?;
    drop(engine);

    // The bus closes once the engine is gone, which ends the printer
    if let Err(e) = printer.await {
        warn!("Event printer stopped abnormally: {}", e);
    }
    Ok(())
}

/// Convert a seconds argument into a `Duration`
///
/// Rejects negative, non-finite and out-of-range values instead of panicking.
fn seconds_arg(flag: &str, seconds: f64) -> Result<Duration> {
    match Duration::try_from_secs_f64(seconds) {
        Ok(duration) => Ok(duration),
        Err(e) => bail!("{} must be a non-negative number of seconds ({}): {}", flag, seconds, e),
    }
}

async fn wait_for_end(events: &mut broadcast::Receiver<MediaEvent>) {
    loop {
        match events.recv().await {
            Ok(MediaEvent::MediaEnded { .. }) | Err(RecvError::Closed) => return,
            Ok(_) | Err(RecvError::Lagged(_)) => {}
        }
    }
}

async fn print_events(mut events: broadcast::Receiver<MediaEvent>, json: bool) {
    loop {
        match events.recv().await {
            Ok(event) if json => match serde_json::to_string(&event) {
                Ok(line) => println!("{}", line),
                Err(e) => warn!("Failed to serialize {}: {}", event.name(), e),
            },
            Ok(MediaEvent::PropertiesChanged { changes, .. }) => {
                for change in changes {
                    println!("{:>24} = {}", change.name, change.value);
                }
            }
            Ok(event) => println!("[{}]", event.name()),
            Err(RecvError::Lagged(skipped)) => {
                warn!("Event printer lagged, {} events skipped", skipped)
            }
            Err(RecvError::Closed) => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_arg_accepts_fractions() {
        assert_eq!(seconds_arg("--seek", 1.5).unwrap(), Duration::from_millis(1500));
        assert_eq!(seconds_arg("--play-for", 0.0).unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_seconds_arg_rejects_huge_values() {
        let err = seconds_arg("--play-for", 1e300).unwrap_err();
        assert!(err.to_string().contains("--play-for"));
        assert!(seconds_arg("--seek", f64::INFINITY).is_err());
    }

    #[test]
    fn test_seconds_arg_rejects_negative_and_nan() {
        assert!(seconds_arg("--seek", -0.5).is_err());
        assert!(seconds_arg("--seek", f64::NAN).is_err());
    }
}
