//! motion-bridge CLI: inspect and stream device motion sensors
//!
//! - list: per-kind sensor availability on this device
//! - watch: start sensors and stream normalized events until Ctrl-C
//! - config: open the config file in your editor

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use motion_bridge::config::Config;
use motion_bridge::host::sim::SimulatedHost;
use motion_bridge::host::SensorHost;
use motion_bridge::{MotionBridge, MotionEvent, Reading, SamplingTier, SensorKind};

#[cfg(all(feature = "linux", target_os = "linux"))]
use motion_bridge::host::iio::IioHost;

mod feed;

// === CLI ===

#[derive(Parser)]
#[command(name = "motion-bridge")]
#[command(about = "Stream device motion sensors through one event interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which sensor kinds this device provides
    List {
        /// Use the simulated host instead of the platform binding
        #[arg(long)]
        simulate: bool,
    },
    /// Start sensors and stream events to stdout until Ctrl-C
    Watch {
        /// Sensors to start (default: from config, or all)
        #[arg(short, long = "sensor")]
        sensors: Vec<String>,
        /// Sampling tier: default, ui, game, fastest
        #[arg(short, long)]
        tier: Option<String>,
        /// Emit events as JSON lines
        #[arg(long)]
        json: bool,
        /// Use the simulated host with a synthetic sample feed
        #[arg(long)]
        simulate: bool,
    },
    /// Open the config file in your editor
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::List { simulate }) => {
            init_tracing();
            run_list(simulate);
        }
        Some(Commands::Watch {
            sensors,
            tier,
            json,
            simulate,
        }) => {
            init_tracing();
            run_watch(sensors, tier, json, simulate).await?;
        }
        Some(Commands::Config) => {
            run_config_command()?;
        }
        None => {
            init_tracing();
            run_watch(Vec::new(), None, false, false).await?;
        }
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Platform binding for this target, or the simulated host on request or as a
/// fallback.
fn build_host(simulate: bool) -> Arc<dyn SensorHost> {
    if simulate {
        let host = Arc::new(SimulatedHost::new());
        feed::spawn_synthetic_feed(Arc::clone(&host));
        return host;
    }

    #[cfg(all(feature = "linux", target_os = "linux"))]
    {
        Arc::new(IioHost::new())
    }

    #[cfg(not(all(feature = "linux", target_os = "linux")))]
    {
        tracing::warn!("no platform binding for this target, using the simulated host");
        let host = Arc::new(SimulatedHost::new());
        feed::spawn_synthetic_feed(Arc::clone(&host));
        host
    }
}

fn run_list(simulate: bool) {
    let bridge = MotionBridge::new(build_host(simulate));
    for kind in SensorKind::ALL {
        let status = if bridge.available(kind) {
            "available"
        } else {
            "not available"
        };
        println!("{:<16} {}", kind, status);
    }
}

async fn run_watch(
    sensors: Vec<String>,
    tier: Option<String>,
    json: bool,
    simulate: bool,
) -> anyhow::Result<()> {
    let config = Config::load();

    let tier = match tier {
        Some(name) => name.parse::<SamplingTier>()?,
        None => config.tier,
    };
    let kinds: Vec<SensorKind> = if sensors.is_empty() {
        config.sensors()
    } else {
        sensors
            .iter()
            .map(|name| name.parse::<SensorKind>())
            .collect::<Result<_, _>>()?
    };

    let bridge = MotionBridge::new(build_host(simulate));

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<MotionEvent>();
    bridge.subscribe(move |event| {
        // Receiver gone means we are shutting down; drop the event.
        let _ = tx.send(*event);
    });

    for kind in &kinds {
        bridge.start(*kind, tier);
    }
    tracing::info!("watching {} sensor(s) at tier {}", kinds.len(), tier);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = rx.recv() => match event {
                Some(event) => print_event(&event, json)?,
                None => break,
            },
        }
    }

    for kind in &kinds {
        bridge.stop(*kind);
    }
    tracing::info!("stopped; {} event(s) dispatched", bridge.dispatched());
    Ok(())
}

fn print_event(event: &MotionEvent, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }
    match event.reading {
        Reading::Vector { x, y, z } => println!(
            "{:<16} x={:>10.4} y={:>10.4} z={:>10.4}  t={}",
            event.kind, x, y, z, event.timestamp_nanos
        ),
        Reading::Scalar { value } => println!(
            "{:<16} value={:>10.4}  t={}",
            event.kind, value, event.timestamp_nanos
        ),
    }
    Ok(())
}

/// Open config file in user's editor
fn run_config_command() -> anyhow::Result<()> {
    let config_path =
        Config::path().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    // Create config dir if needed
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Create config file from template if it doesn't exist
    if !config_path.exists() {
        let template = include_str!("../motion.toml.example");
        std::fs::write(&config_path, template)?;
        println!("Created config file: {}", config_path.display());
    }

    // Get editor from environment or fall back to nano
    let editor = std::env::var("EDITOR")
        .or_else(|_| std::env::var("VISUAL"))
        .unwrap_or_else(|_| "nano".to_string());

    println!("Opening {} with {}", config_path.display(), editor);

    // Open editor
    std::process::Command::new(&editor)
        .arg(&config_path)
        .status()?;

    Ok(())
}
