//! Headless navigation replay: drives a camera over a synthetic terrain with
//! a scripted gesture sequence and reports the trajectory.

mod loader;
mod script;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use navigation::{Navigation, NavigationOptions, NavigationStatistics, Position};
use serde::{Deserialize, Serialize};
use terrain::ReferenceFrame;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::loader::{LoaderConfig, SyntheticLoader};
use crate::script::{ScriptStep, demo_script, gestures_at};

#[derive(Parser, Debug)]
#[command(author, version, about = "Replay camera navigation over a synthetic terrain")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a replay and print the final state as JSON.
    Run(RunArgs),
    /// Print a complete default configuration.
    Config {
        #[arg(long, value_enum, default_value_t = FramePreset::Geographic)]
        frame: FramePreset,
    },
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Replay configuration (JSON). Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Reference frame used when no config file is given.
    #[arg(long, value_enum, default_value_t = FramePreset::Geographic)]
    frame: FramePreset,
    /// Number of frames to simulate.
    #[arg(long, default_value_t = 300)]
    frames: u64,
    /// Frame time in seconds.
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f64,
    /// Log the camera every N frames (0 disables).
    #[arg(long, default_value_t = 30)]
    log_every: u64,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FramePreset {
    Geographic,
    WebMercator,
}

impl FramePreset {
    fn frame(self) -> ReferenceFrame {
        match self {
            FramePreset::Geographic => ReferenceFrame::geographic(),
            FramePreset::WebMercator => ReferenceFrame::web_mercator(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ReplayConfig {
    frame: ReferenceFrame,
    #[serde(default)]
    options: NavigationOptions,
    #[serde(default)]
    position: Position,
    #[serde(default)]
    loader: LoaderConfig,
    #[serde(default)]
    script: Vec<ScriptStep>,
}

impl ReplayConfig {
    fn preset(frame: FramePreset) -> Self {
        Self {
            frame: frame.frame(),
            options: NavigationOptions::default(),
            position: Position::default(),
            loader: LoaderConfig::default(),
            script: demo_script(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ReplaySummary {
    frames: u64,
    position: Position,
    statistics: NavigationStatistics,
    tiles_loaded: u64,
    tree_nodes: usize,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Run(args) => run(args),
        Command::Config { frame } => {
            let json = serde_json::to_string_pretty(&ReplayConfig::preset(frame))
                .map_err(|e| e.to_string())?;
            println!("{json}");
            Ok(())
        }
    }
}

fn load_config(args: &RunArgs) -> Result<ReplayConfig, String> {
    let Some(path) = &args.config else {
        return Ok(ReplayConfig::preset(args.frame));
    };
    let text = std::fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("{}: {e}", path.display()))
}

fn run(args: RunArgs) -> Result<(), String> {
    if !(args.dt.is_finite() && args.dt >= 0.0) {
        return Err(format!("invalid frame time {}", args.dt));
    }
    let config = load_config(&args)?;
    let mut loader = SyntheticLoader::new(config.loader.clone(), config.frame.clone())?;
    let mut nav = Navigation::new(config.options, config.frame, config.position)
        .map_err(|e| e.to_string())?;
    info!(frames = args.frames, steps = config.script.len(), "replay started");

    for frame_no in 0..args.frames {
        for gesture in gestures_at(&config.script, frame_no) {
            if let Err(err) = gesture.apply(&mut nav) {
                warn!(frame = frame_no, ?gesture, %err, "gesture rejected");
            }
        }
        nav.update(args.dt, &mut loader.tree)
            .map_err(|e| format!("frame {frame_no}: {e}"))?;
        loader.tick(frame_no);

        if args.log_every > 0 && frame_no % args.log_every == 0 {
            let p = nav.position();
            info!(
                frame = frame_no,
                x = p.point.x,
                y = p.point.y,
                z = p.point.z,
                view_extent = p.view_extent,
                yaw = p.orientation.x,
                pitch = p.orientation.y,
                queued = nav.state().height_queue.len(),
                "camera"
            );
            match nav.camera() {
                Ok(cam) => info!(
                    frame = frame_no,
                    eye_x = cam.eye.x,
                    eye_y = cam.eye.y,
                    eye_z = cam.eye.z,
                    distance = cam.objective_distance,
                    "eye"
                ),
                Err(err) => warn!(frame = frame_no, %err, "camera unavailable"),
            }
        }
    }

    let summary = ReplaySummary {
        frames: args.frames,
        position: nav.position().clone(),
        statistics: nav.statistics().clone(),
        tiles_loaded: loader.loaded(),
        tree_nodes: loader.tree.len(),
    };
    let json = serde_json::to_string_pretty(&summary).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{FramePreset, ReplayConfig};
    use crate::loader::SyntheticLoader;
    use crate::script::gestures_at;
    use navigation::{MotionProfile, Navigation};
    use terrain::TerrainTree;

    #[test]
    fn bundled_config_parses() {
        let config: ReplayConfig = serde_json::from_str(include_str!("../replay.json")).unwrap();
        assert_eq!(config.loader.max_lod, 14);
        assert_eq!(config.options.motion_profile, MotionProfile::Quick);
        assert_eq!(config.script.len(), 4);
        assert_eq!(config.position.view_extent, 50000.0);
    }

    #[test]
    fn preset_config_round_trips() {
        let config = ReplayConfig::preset(FramePreset::WebMercator);
        let json = serde_json::to_string(&config).unwrap();
        let back: ReplayConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.frame, config.frame);
        assert_eq!(back.script, config.script);
    }

    #[test]
    fn replay_resolves_terrain_under_the_camera() {
        let config: ReplayConfig = serde_json::from_str(include_str!("../replay.json")).unwrap();
        let mut loader = SyntheticLoader::new(config.loader.clone(), config.frame.clone()).unwrap();
        let mut nav = Navigation::new(config.options, config.frame, config.position).unwrap();
        for frame_no in 0..300 {
            for gesture in gestures_at(&config.script, frame_no) {
                gesture.apply(&mut nav).unwrap();
            }
            nav.update(1.0 / 60.0, &mut loader.tree).unwrap();
            loader.tick(frame_no);
        }
        let p = nav.position();
        assert!(p.point.is_finite());
        assert!(p.orientation.y >= 270.0 && p.orientation.y <= 350.0);
        assert!(nav.statistics().height_requests_resolved > 0);
        assert!(loader.loaded() > 1);
        assert!(loader.tree.root().is_some());
    }
}
