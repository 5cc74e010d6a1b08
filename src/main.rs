//! Headless streaming demo
//!
//! Walks a viewer along +x and streams the world around it, logging what
//! each tick creates and retires.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use glam::Vec3;
use tokio::sync::watch;

use voxstream::{RecordingSink, World, WorldSettings, drive};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// World settings file (TOML). Built-in defaults when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of viewer positions to feed
    #[arg(long, default_value_t = 8)]
    steps: u32,

    /// Distance the viewer moves per step
    #[arg(long, default_value_t = 24.0)]
    stride: f32,

    /// Override the world seed
    #[arg(long)]
    seed: Option<i32>,

    /// Override the check delay in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    if let Err(e) = run(args).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> voxstream::Result<()> {
    let mut settings = match &args.config {
        Some(path) => WorldSettings::load(path)?,
        None => WorldSettings::default(),
    };
    if let Some(seed) = args.seed {
        settings.seed = seed;
    }
    if let Some(delay_ms) = args.delay_ms {
        settings.check_delay_ms = delay_ms;
    }

    let delay = Duration::from_millis(settings.check_delay_ms);
    let mut world = World::new(settings, RecordingSink::new())?;
    let (tx, rx) = watch::channel(Vec3::ZERO);

    let walk = async move {
        for step in 1..=args.steps {
            // Wait past the check delay so every step gets a chance to tick.
            tokio::time::sleep(delay + delay / 2).await;
            let position = Vec3::new(step as f32 * args.stride, 0.0, 0.0);
            tracing::info!("Viewer moved to {:?}", position);
            if tx.send(position).is_err() {
                break;
            }
        }
        tokio::time::sleep(delay * 2).await;
    };

    let (ticks, ()) = tokio::join!(drive(&mut world, rx, delay), walk);

    let sink = world.sink();
    tracing::info!(
        "Done: {} ticks, {} chunks loaded, {} meshes live ({} vertices), {} submits, {} retires",
        ticks,
        world.data_count(),
        sink.live_count(),
        sink.total_vertices(),
        sink.submissions,
        sink.retirements
    );
    Ok(())
}
