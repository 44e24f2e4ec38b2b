//! Render a sphereflake to disk.
//!
//! Usage: `sphereflake [lvl=6] [workers=2] [output=sphereflake.raw]`
//!
//! Writes raw 8-bit grayscale bytes, or a PNG when the output path ends in
//! `.png`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use flake_renderer::{render, Dispatch, ImageBuffer, RenderConfig, Scene};

const DEFAULT_LEVEL: u32 = 6;
const MIN_LEVEL: u32 = 2;
const DEFAULT_WORKERS: usize = 2;
const DEFAULT_OUTPUT: &str = "sphereflake.raw";

/// Image resolution (square)
const RESOLUTION: u32 = 1024;

/// Parsed command line
#[derive(Debug, PartialEq)]
struct Args {
    level: u32,
    workers: usize,
    output: PathBuf,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let level = match args.next() {
        Some(arg) => arg
            .parse::<u32>()
            .with_context(|| format!("Invalid level '{arg}'"))?,
        None => DEFAULT_LEVEL,
    };
    let workers = match args.next() {
        Some(arg) => arg
            .parse::<usize>()
            .with_context(|| format!("Invalid worker count '{arg}'"))?,
        None => DEFAULT_WORKERS,
    };
    let output = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    if level < MIN_LEVEL {
        log::warn!("Level {} too shallow, using {}", level, MIN_LEVEL);
    }
    if workers == 0 {
        log::warn!("Worker count 0 invalid, using 1");
    }

    Ok(Args {
        level: level.max(MIN_LEVEL),
        workers: workers.max(1),
        output,
    })
}

fn save_image(frame: &ImageBuffer, path: &Path) -> Result<()> {
    let is_png = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));

    if is_png {
        let gray = image::GrayImage::from_raw(frame.width, frame.height, frame.pixels.clone())
            .context("Image buffer does not match its dimensions")?;
        gray.save(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    } else {
        std::fs::write(path, frame.as_bytes())
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    log::info!(
        "Rendering level {} sphereflake with {} workers",
        args.level,
        args.workers
    );

    let start = Instant::now();
    let scene = Scene::build(args.level).context("Failed to build scene")?;
    log::info!("Scene built in {:?}", start.elapsed());

    let config = RenderConfig::default()
        .with_resolution(RESOLUTION, RESOLUTION)
        .with_dispatch(Dispatch::Fifo {
            workers: args.workers,
        });
    let frame = render(&scene, &config).context("Render failed")?;

    save_image(&frame, &args.output)?;
    log::info!("Saved to {}", args.output.display());

    Ok(())
}
