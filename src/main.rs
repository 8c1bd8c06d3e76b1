//! Head tracking demo: runs the tracker on a simulated viewer or a raw depth
//! recording and logs the head position and off-axis frustum every frame.

use anyhow::{Context, Result};
use clap::Parser;
use fishtank_tracking::{
    config::{Config, EXAMPLE_CONFIG},
    depth::{
        raw::RawDepthReader,
        synthetic::{SwayPath, SyntheticScene},
        DepthSource,
    },
    head_locator::SamplingMode,
    tracker::{HeadTracker, TickOutcome, TrackerCommand},
};
use log::{debug, info, warn};
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<String>,

    /// Raw depth recording (little-endian u16 millimetres); simulated viewer if absent
    #[arg(short, long)]
    input: Option<String>,

    /// Frame width of the raw recording
    #[arg(long, default_value = "640")]
    width: u32,

    /// Frame height of the raw recording
    #[arg(long, default_value = "480")]
    height: u32,

    /// Number of ticks to run
    #[arg(short, long, default_value = "600")]
    frames: u64,

    /// Sampling mode (centroid, scan_line)
    #[arg(short, long)]
    sampling: Option<String>,

    /// Smoothing filter spec (moving_average, median:5, exponential:0.4, none)
    #[arg(long)]
    filter: Option<String>,

    /// Operator keys to apply before running, e.g. "++.." raises both thresholds
    #[arg(long, default_value = "")]
    keys: String,

    /// Print the example configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    if args.print_config {
        print!("{EXAMPLE_CONFIG}");
        return Ok(());
    }

    info!("Fish-tank head tracker");

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path);
            Config::from_file(path).with_context(|| format!("Failed to load config file {path}"))?
        }
        None => Config::default(),
    };
    if let Some(sampling) = &args.sampling {
        config.sampling.mode = sampling.parse::<SamplingMode>()?;
    }
    if let Some(filter) = &args.filter {
        config.smoothing.filter = filter.clone();
    }

    let mut tracker = HeadTracker::from_config(&config).context("Invalid tracker configuration")?;
    for key in args.keys.chars() {
        match TrackerCommand::from_key(key) {
            Some(command) => tracker.apply(command),
            None => warn!("Ignoring unbound key {:?}", key),
        }
    }

    let mut source: Box<dyn DepthSource> = match &args.input {
        Some(path) => Box::new(RawDepthReader::open(
            path,
            args.width,
            args.height,
            config.intrinsics_for_resolution(args.width, args.height),
            config.depth_clip(),
        )?),
        None => {
            info!("No input given, simulating a swaying viewer");
            Box::new(SyntheticScene::default().with_motion(SwayPath::default()))
        }
    };

    run(&mut tracker, source.as_mut(), args.frames);
    Ok(())
}

fn run(tracker: &mut HeadTracker, source: &mut dyn DepthSource, frames: u64) {
    let start = Instant::now();
    let (mut tracked, mut missed, mut idle) = (0u64, 0u64, 0u64);

    for frame in 0..frames {
        match tracker.tick(&mut *source) {
            TickOutcome::Tracked { head, .. } => {
                tracked += 1;
                let projection = tracker.projection();
                let f = projection.frustum;
                debug!(
                    "frame {frame}: head ({:.1}, {:.1}, {:.1}) frustum l {:.4} r {:.4} b {:.4} t {:.4} d {:.1}",
                    head.x, head.y, head.z, f.left, f.right, f.bottom, f.top, projection.distance
                );
            }
            TickOutcome::NoBlobDetected => missed += 1,
            TickOutcome::NoNewFrame => idle += 1,
        }

        if frame % 60 == 59 {
            info!("{}", tracker.status());
        }
    }

    let elapsed = start.elapsed().as_secs_f64();
    #[allow(clippy::cast_precision_loss)]
    let fps = if elapsed > 0.0 { frames as f64 / elapsed } else { 0.0 };
    info!(
        "Done: {} tracked, {} without head, {} without new frame, {:.1} ticks/s",
        tracked, missed, idle, fps
    );
    info!("Final projection: {:?}", tracker.projection().frustum);
}
