//! RideMode - headless ride runner
//!
//! Runs a demo ride, or replays live fixes from JSON lines, against an
//! in-memory map and logs the ride state once per second.

use anyhow::Context;
use clap::Parser;
use ridemode::config::{self, RideConfig};
use ridemode::location::{import, ChannelDevice, DeviceFeeder, PositionFix};
use ridemode::map::HeadlessMap;
use ridemode::media::{fetch_playlist_or_empty, HttpPlaylistSource, HeadlessPlayer};
use ridemode::routing::OsrmRoutingService;
use ridemode::session::{LogDeepLinkHandler, RideCommand, RideHandle, RideRuntime, RideSnapshot};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Largest gap honoured between replayed fixes
const MAX_REPLAY_GAP_MS: u64 = 5_000;

#[derive(Parser, Debug)]
#[command(name = "ridemode")]
#[command(about = "Headless Ride Mode runner - demo or live-fix replay", long_about = None)]
struct Args {
    /// Config file (defaults to the platform data directory)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// GPX file used as the static ride path
    #[arg(long, value_name = "GPX")]
    route: Option<PathBuf>,

    /// Quick-nav destination to guide to
    #[arg(long, value_name = "NAME")]
    target: Option<String>,

    /// Replay live fixes from a JSON-lines file ("-" for stdin) instead of a demo ride
    #[arg(long, value_name = "JSONL")]
    fixes: Option<String>,

    /// Stop after this many seconds (0 runs until Ctrl-C)
    #[arg(long, default_value = "0")]
    duration_secs: u64,

    /// Disable g-force and lean derivation
    #[arg(long, default_value_t = false)]
    low_power: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    tracing::info!("Starting RideMode v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &args.config {
        Some(path) => config::load_config_from(path),
        None => config::load_config(),
    }
    .context("loading configuration")?;
    if args.low_power {
        config.telemetry.low_power_mode = true;
    }

    let static_path = match &args.route {
        Some(path) => Some(
            import::load_gpx_path(path)
                .with_context(|| format!("importing route {}", path.display()))?,
        ),
        None => None,
    };

    let playlist = match &config.media.playlist_url {
        Some(url) => {
            let timeout = Duration::from_secs(config.routing.request_timeout_secs);
            match HttpPlaylistSource::new(url.clone(), timeout) {
                Ok(source) => fetch_playlist_or_empty(&source).await,
                Err(e) => {
                    tracing::warn!("Playlist source unavailable: {}", e);
                    Vec::new()
                }
            }
        }
        None => Vec::new(),
    };

    let (device, feeder) = ChannelDevice::new();
    let player = HeadlessPlayer::new();
    let router = OsrmRoutingService::new(&config.routing).context("creating routing client")?;
    let (runtime, handle) = RideRuntime::new(
        &config,
        HeadlessMap::new(config.telemetry.trail_capacity),
        device,
        player.clone(),
        router,
        LogDeepLinkHandler,
    );
    let ride = tokio::spawn(runtime.run());

    if let Some(path) = static_path {
        handle.send(RideCommand::SetStaticPath(path)).await;
    }
    handle.send(RideCommand::LoadPlaylist(playlist)).await;
    player.mark_ready();

    match &args.fixes {
        Some(source) => {
            handle.send(RideCommand::ArmGps).await;
            let reader = open_fixes(source).await?;
            tokio::spawn(replay_fixes(reader, feeder));
        }
        None => {
            handle.send(RideCommand::StartDemo).await;
        }
    }

    if let Some(name) = &args.target {
        select_target(&handle, &config, name).await;
    }

    report_until_done(&handle, args.duration_secs).await;

    handle.send(RideCommand::Exit).await;
    let controller = ride.await.context("ride runtime panicked")?;
    tracing::info!(
        "Ride finished: {:.2} km, {} overlays left",
        controller.session().trip_distance_km,
        controller.route_provider().overlay_count()
    );
    Ok(())
}

/// Guide to a configured destination, or an ad-hoc one 5 km away.
async fn select_target(handle: &RideHandle, config: &RideConfig, name: &str) {
    let destinations = &config.quick_nav.destinations;
    match destinations.iter().position(|d| d.name.eq_ignore_ascii_case(name)) {
        Some(index) => {
            handle.send(RideCommand::OpenQuickNav).await;
            handle.send(RideCommand::PickDestination(index)).await;
            handle
                .send(RideCommand::ChooseGuidance(
                    ridemode::session::GuidanceChoice::Internal,
                ))
                .await;
        }
        None => {
            tracing::warn!("Unknown destination '{}', using 5 km", name);
            handle
                .send(RideCommand::SelectTarget {
                    name: name.to_string(),
                    distance_km: 5.0,
                })
                .await;
        }
    }
}

async fn open_fixes(source: &str) -> anyhow::Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    if source == "-" {
        return Ok(Box::new(BufReader::new(tokio::io::stdin())));
    }
    let file = tokio::fs::File::open(source)
        .await
        .with_context(|| format!("opening fixes {}", source))?;
    Ok(Box::new(BufReader::new(file)))
}

/// Push JSON-line fixes into the device, spaced by their timestamps.
async fn replay_fixes(reader: Box<dyn AsyncBufRead + Unpin + Send>, feeder: DeviceFeeder) {
    let mut lines = reader.lines();
    let mut last_timestamp: Option<u64> = None;
    let mut line_no = 0u64;

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!("Reading fixes failed: {}", e);
                break;
            }
        };
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }

        let fix: PositionFix = match serde_json::from_str(&line) {
            Ok(fix) => fix,
            Err(e) => {
                tracing::warn!("Skipping line {}: {}", line_no, e);
                continue;
            }
        };

        if let Some(prev) = last_timestamp {
            let gap = fix.timestamp_ms.saturating_sub(prev).min(MAX_REPLAY_GAP_MS);
            tokio::time::sleep(Duration::from_millis(gap)).await;
        }
        last_timestamp = Some(fix.timestamp_ms);

        if !feeder.push_fix(fix) {
            tracing::debug!("No live watch, fix {} dropped", line_no);
        }
    }
    tracing::info!("Fix replay finished ({} lines)", line_no);
}

async fn report_until_done(handle: &RideHandle, duration_secs: u64) {
    let mut report = tokio::time::interval(Duration::from_secs(1));
    let deadline = (duration_secs > 0)
        .then(|| tokio::time::Instant::now() + Duration::from_secs(duration_secs));

    loop {
        tokio::select! {
            _ = report.tick() => log_snapshot(&handle.snapshot()),
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
            _ = async {
                match deadline {
                    Some(deadline) => tokio::time::sleep_until(deadline).await,
                    None => std::future::pending().await,
                }
            } => break,
        }
    }
}

fn log_snapshot(snapshot: &RideSnapshot) {
    tracing::info!(
        mode = %snapshot.mode,
        gps = %snapshot.gps_status,
        speed_kmh = %format!("{:.1}", snapshot.speed_kmh),
        gear = %snapshot.telemetry.gear,
        rpm = snapshot.telemetry.simulated_rpm,
        trip_km = %format!("{:.2}", snapshot.trip_distance_km),
        "{}",
        snapshot.banner
    );
    if let Some(title) = &snapshot.now_playing {
        tracing::debug!("Now playing: {}{}", title, if snapshot.is_playing { "" } else { " (paused)" });
    }
}
