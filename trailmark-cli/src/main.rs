//! Trailmark CLI - headless host for the episode recorder

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio::time::MissedTickBehavior;
use trailmark_core::prelude::*;

#[derive(Parser)]
#[command(name = "trailmark")]
#[command(about = "Record per-tick episodes from a scripted character", long_about = None)]
#[command(version)]
struct Cli {
    /// Load configuration from this file instead of the layered defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive a recording session in the park-and-house scene
    Run {
        /// Number of ticks to run (defaults to the script length, or 600)
        #[arg(short, long)]
        ticks: Option<u64>,

        /// JSON array of input frames: { "move": -1|0|1, "sit": bool, "repeat": n }
        #[arg(short, long)]
        script: Option<PathBuf>,

        /// Ticks per second
        #[arg(long, default_value_t = 60.0)]
        fps: f64,
    },
    /// Export every stored episode to episodes.json
    Export {
        /// Output directory (overrides export.out_dir)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// List stored episodes
    List {
        /// Print one JSON object per episode instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Version information
    Version,
}

const DEFAULT_TICKS: u64 = 600;

fn load_config(path: Option<&PathBuf>) -> Result<TrailmarkConfig> {
    let config = match path {
        Some(path) => TrailmarkConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => TrailmarkConfig::load().context("loading configuration")?,
    };
    Ok(config)
}

/// Log recorder events until every sender is gone
fn spawn_event_logger(mut rx: EventReceiver) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match &event {
                RecorderEvent::EpisodeStored { id, ticks, .. } => {
                    tracing::info!(episode_id = %id, ticks, "Stored episode");
                }
                RecorderEvent::FlushFailed {
                    error,
                    dropped_ticks,
                    ..
                } => {
                    tracing::warn!(dropped_ticks, "Flush failed: {}", error);
                }
                other => tracing::debug!(event = other.event_type(), "Recorder event"),
            }
        }
    })
}

/// Time between ticks at `fps` ticks per second
fn frame_period(fps: f64) -> Result<Duration> {
    if !(fps.is_finite() && fps > 0.0) {
        bail!("fps must be positive, got {}", fps);
    }
    match Duration::try_from_secs_f64(fps.recip()) {
        Ok(period) if !period.is_zero() => Ok(period),
        _ => bail!("fps {} is out of range", fps),
    }
}

async fn run(
    config: TrailmarkConfig,
    ticks: Option<u64>,
    script: Option<PathBuf>,
    fps: f64,
) -> Result<()> {
    let period = frame_period(fps)?;

    let (mut input, ticks): (Box<dyn InputSource>, u64) = match script {
        Some(path) => {
            let json = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("reading script {}", path.display()))?;
            let script = ScriptedInput::from_json(&json)
                .with_context(|| format!("parsing script {}", path.display()))?;
            let ticks = ticks.unwrap_or_else(|| script.remaining_ticks());
            (Box::new(script), ticks)
        }
        None => (
            Box::new(FixedInput::new(MoveDirection::Right, false)),
            ticks.unwrap_or(DEFAULT_TICKS),
        ),
    };

    let (tx, rx) = event_channel(256);
    let logger = spawn_event_logger(rx);

    let scene = Scene::park_and_house_with(&config.recorder);
    let mut session = RecordingSession::builder()
        .config(config)
        .scene(scene)
        .events(EventEmitter::new(tx))
        .start()
        .await?;

    let mut frame = tokio::time::interval(period);
    frame.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    let mut rewarded = 0u64;
    for _ in 0..ticks {
        tokio::select! {
            _ = &mut interrupted => {
                tracing::info!("Interrupted, stopping session");
                break;
            }
            _ = frame.tick() => {
                let outcome = session.tick(input.as_mut()).await?;
                if outcome.record.reward > 0.0 {
                    rewarded += 1;
                }
            }
        }
    }

    session.shutdown().await?;
    let position = session.simulation().position();
    println!(
        "Ran {} ticks ({} rewarded), final position x={:.2} z={:.2}",
        session.simulation().ticks(),
        rewarded,
        position.x,
        position.z
    );

    drop(session);
    if let Err(error) = logger.await {
        tracing::warn!("Event logger stopped abnormally: {}", error);
    }
    Ok(())
}

async fn export_command(mut config: TrailmarkConfig, out: Option<PathBuf>) -> Result<()> {
    if let Some(out) = out {
        config.export.out_dir = out;
    }
    let store = open_store(&config.storage).await?;
    let target = DirectoryDownload::new(&config.export.out_dir);
    let summary = export_to(
        store.as_ref(),
        &target,
        &config.export.file_name,
        config.export.pretty,
    )
    .await?;

    println!(
        "Exported {} episodes ({} ticks) to {}",
        summary.episodes, summary.ticks, summary.location
    );
    Ok(())
}

async fn list(config: TrailmarkConfig, json: bool) -> Result<()> {
    let store = open_store(&config.storage).await?;
    let episodes = store.read_all().await?;

    if json {
        for stored in &episodes {
            let episode = &stored.episode;
            let line = serde_json::json!({
                "id": stored.id,
                "session_id": episode.session_id,
                "ticks": episode.len(),
                "total_reward": episode.total_reward(),
                "started_at": episode.started_at,
                "ended_at": episode.ended_at,
            });
            println!("{}", line);
        }
        return Ok(());
    }
    if episodes.is_empty() {
        println!("No stored episodes");
        return Ok(());
    }

    println!("{:>6}  {:<36}  {:>6}  {:>8}  STARTED", "ID", "SESSION", "TICKS", "REWARD");
    for stored in &episodes {
        let episode = &stored.episode;
        println!(
            "{:>6}  {:<36}  {:>6}  {:>8.1}  {}",
            stored.id,
            episode.session_id,
            episode.len(),
            episode.total_reward(),
            episode.started_at.to_rfc3339()
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Version => {
            println!("trailmark {}", env!("CARGO_PKG_VERSION"));
            println!("trailmark-core {}", trailmark_core::VERSION);
        }
        Commands::Run { ticks, script, fps } => {
            run(load_config(cli.config.as_ref())?, ticks, script, fps).await?;
        }
        Commands::Export { out } => {
            export_command(load_config(cli.config.as_ref())?, out).await?;
        }
        Commands::List { json } => {
            list(load_config(cli.config.as_ref())?, json).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_period_for_usual_rates() {
        assert_eq!(frame_period(50.0).unwrap(), Duration::from_millis(20));
        assert_eq!(frame_period(0.5).unwrap(), Duration::from_secs(2));
    }

    #[test]
    fn test_frame_period_rejects_unusable_rates() {
        assert!(frame_period(0.0).is_err());
        assert!(frame_period(-60.0).is_err());
        assert!(frame_period(f64::NAN).is_err());
        assert!(frame_period(1e10).is_err());
        assert!(frame_period(1e-300).is_err());
    }
}
