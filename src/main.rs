//! replay-preview: render a recorded session to a PNG at a chosen time.
//!
//! ```text
//! replay-preview <log.json> <time> <out.png> [--config cfg.json] [--size WxH] [--fps N]
//! ```
//!
//! Frames are replayed from 0 up to `time` so trails and motion state build
//! up as they would during playback. Set `RUST_LOG` for diagnostics.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use replay_compositor::config::ReplayConfig;
use replay_compositor::error::{OptionExt, ReplayError, ReplayResult};
use replay_compositor::events::load_event_log;
use replay_compositor::rendering::{FrameBuffer, RenderLoop, SharedProjectState, TickOutcome};

/// Command-line arguments for replay-preview
#[derive(Parser, Debug)]
#[command(name = "replay-preview")]
#[command(version, about = "Render a recorded cursor session to PNG", long_about = None)]
struct Args {
    /// Event log JSON file
    log: PathBuf,

    /// Playback time in seconds
    #[arg(value_parser = parse_time)]
    time: f64,

    /// Output PNG path
    out: PathBuf,

    /// Replay configuration JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Surface size as WxH
    #[arg(short, long, default_value = "1280x720", value_parser = parse_size)]
    size: SurfaceSize,

    /// Frames per second replayed up to `time`
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..=240))]
    fps: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SurfaceSize {
    width: u32,
    height: u32,
}

fn parse_time(value: &str) -> Result<f64, String> {
    value
        .parse::<f64>()
        .ok()
        .filter(|t| t.is_finite() && *t >= 0.0)
        .ok_or_else(|| format!("'{}' is not a non-negative number of seconds", value))
}

fn parse_size(value: &str) -> Result<SurfaceSize, String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("'{}' is not WxH", value))?;
    match (w.parse::<u32>(), h.parse::<u32>()) {
        (Ok(width), Ok(height)) if width > 0 && height > 0 => Ok(SurfaceSize { width, height }),
        _ => Err(format!("'{}' is not a non-zero WxH size", value)),
    }
}

/// Query times from 0 to `time` inclusive at `fps`, produced lazily.
fn frame_times(time: f64, fps: u32) -> impl Iterator<Item = f64> {
    let step = 1.0 / fps as f64;
    let count = (time * fps as f64).floor() as u64;
    let tail = (count as f64 * step < time).then_some(time);
    (0..=count)
        .map(move |i| (i as f64 * step).min(time))
        .chain(tail)
}

fn run(args: Args) -> ReplayResult<()> {
    let log = load_event_log(&args.log)?;
    let config = match &args.config {
        Some(path) => ReplayConfig::load(path)?,
        None => ReplayConfig::default(),
    };

    let state = Arc::new(SharedProjectState::new(config));
    state.load_recording(log);
    // Allow rendering past the last event (effects still running)
    state.clock().set_duration(None);

    let SurfaceSize { width, height } = args.size;
    let mut render_loop = RenderLoop::new(Arc::clone(&state), FrameBuffer::new(width, height));
    render_loop.start();

    let mut frames = 0u64;
    for time in frame_times(args.time, args.fps) {
        state.clock().seek(time);
        if render_loop.tick() != TickOutcome::Painted {
            return Err(ReplayError::RenderLoop(format!("Frame at {:.3}s was not painted", time)));
        }
        frames += 1;
    }
    render_loop.stop();

    let (_, frame) = render_loop.into_parts();
    let image = frame.into_image().context("Frame buffer has no image")?;
    image.save(&args.out)?;

    log::info!(
        "[PREVIEW] Rendered {} frames, wrote {}x{} frame at {:.3}s to {:?}",
        frames,
        width,
        height,
        args.time,
        args.out
    );
    Ok(())
}

fn main() {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(args) {
        eprintln!("replay-preview: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(list: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("replay-preview").chain(list.iter().copied()))
    }

    #[test]
    fn test_command_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_positional_and_defaults() {
        let args = parse(&["log.json", "1.5", "out.png"]).unwrap();
        assert_eq!(args.log, PathBuf::from("log.json"));
        assert_eq!(args.time, 1.5);
        assert_eq!(args.out, PathBuf::from("out.png"));
        assert_eq!(args.size, SurfaceSize { width: 1280, height: 720 });
        assert_eq!(args.fps, 60);
        assert!(args.config.is_none());
    }

    #[test]
    fn test_parse_options() {
        let args = parse(&[
            "--size", "640x360", "log.json", "2", "out.png", "--fps", "30", "--config", "cfg.json",
        ])
        .unwrap();
        assert_eq!(args.size, SurfaceSize { width: 640, height: 360 });
        assert_eq!(args.fps, 30);
        assert_eq!(args.config, Some(PathBuf::from("cfg.json")));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse(&["log.json", "1.0"]).is_err());
        assert!(parse(&["log.json", "NaN", "out.png"]).is_err());
        assert!(parse(&["log.json", "inf", "out.png"]).is_err());
        assert!(parse(&["a", "1", "b", "--fps", "0"]).is_err());
        assert!(parse(&["a", "1", "b", "--fps", "241"]).is_err());
        assert!(parse(&["a", "1", "b", "--size", "0x10"]).is_err());
        assert!(parse(&["a", "1", "b", "--size", "wide"]).is_err());
        assert!(parse(&["a", "1", "b", "--size"]).is_err());
        assert!(parse(&["a", "1", "b", "--bogus"]).is_err());
    }

    #[test]
    fn test_frame_times_end_at_requested_time() {
        let times: Vec<f64> = frame_times(0.55, 10).collect();
        assert_eq!(times.first(), Some(&0.0));
        assert_eq!(times.last(), Some(&0.55));
        assert_eq!(times.len(), 7);
        assert!(times.windows(2).all(|w| w[0] < w[1]));

        assert_eq!(frame_times(0.0, 60).collect::<Vec<_>>(), vec![0.0]);
    }

    #[test]
    fn test_frame_times_are_lazy_for_long_previews() {
        let mut times = frame_times(1e9, 60);
        assert_eq!(times.next(), Some(0.0));
        assert_eq!(times.next(), Some(1.0 / 60.0));
        let two_seconds = frame_times(1e9, 60).nth(120).unwrap();
        assert!((two_seconds - 2.0).abs() < 1e-9);
    }
}
