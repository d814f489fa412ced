use anyhow::{Context, Result, bail};
use clap::Parser;
use heat_tracker::core_modules::utils::image_helper::image_helper::{load_frame, save_frame, save_heatmap};
use heat_tracker::{BBox, ClassifierEnsemble, Detector, DetectorConfig};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Replays recorded classifier hits over a directory of frames and writes the
/// frames back out with the confirmed tracks drawn.
#[derive(Parser, Debug)]
#[command(name = "frame_tester", about = "Temporal tracking over a sequence of frames")]
struct Args {
    /// Directory of PNG/JPEG frames, processed in file-name order.
    #[arg(long, value_name = "DIR")]
    frames: PathBuf,
    /// JSON object mapping frame file names to lists of hot boxes `[[x0, y0], [x1, y1]]`.
    #[arg(long, value_name = "FILE")]
    detections: PathBuf,
    /// Where annotated frames are written.
    #[arg(long, value_name = "DIR")]
    output: PathBuf,
    /// Optional JSON detector configuration; missing keys take their defaults.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Also dump the thresholded heatmap of every frame into this directory.
    #[arg(long, value_name = "DIR")]
    heatmaps: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // --- 1. Argument Parsing & Setup ---
    let args = Args::parse();
    let frame_paths = list_frames(&args.frames)?;
    let Some(first) = frame_paths.first() else {
        bail!("no frames found in {}", args.frames.display());
    };

    let detections: HashMap<String, Vec<BBox>> = serde_json::from_str(
        &fs::read_to_string(&args.detections)
            .with_context(|| format!("reading {}", args.detections.display()))?,
    )
    .context("parsing detections")?;

    fs::create_dir_all(&args.output).with_context(|| format!("creating {}", args.output.display()))?;
    if let Some(dir) = &args.heatmaps {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    // --- 2. Detector Initialization ---
    let mut config = match &args.config {
        Some(path) => serde_json::from_str::<DetectorConfig>(
            &fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?,
        )
        .context("parsing config")?,
        None => DetectorConfig::default(),
    };
    let first_frame = load_frame(first).with_context(|| format!("loading {}", first.display()))?;
    (config.frame_width, config.frame_height) = first_frame.dimensions();

    let mut detector = Detector::new(config, ClassifierEnsemble::new())?;

    // --- 3. Main Processing Loop ---
    for path in &frame_paths {
        let name = file_name(path);
        let mut frame = load_frame(path).with_context(|| format!("loading {}", path.display()))?;
        if frame.dimensions() != first_frame.dimensions() {
            warn!(frame = %name, "frame size differs from the first frame, skipping");
            continue;
        }

        let hot = detections.get(&name).cloned().unwrap_or_default();
        let report = detector.track(hot);
        detector.annotate(&mut frame);

        info!(
            frame = %name,
            hot = report.hot_boxes,
            blobs = report.blobs.len(),
            spawned = report.association.spawned.len(),
            dropped = report.association.dropped.len(),
            confirmed = report.confirmed,
            "processed"
        );

        save_frame(args.output.join(&name), &frame)
            .with_context(|| format!("writing {}", name))?;
        if let Some(dir) = &args.heatmaps {
            save_heatmap(dir.join(&name), detector.heatmap())
                .with_context(|| format!("writing heatmap for {}", name))?;
        }
    }

    info!(
        frames = detector.frames_processed(),
        output = %args.output.display(),
        "processing complete"
    );
    Ok(())
}

fn list_frames(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut frames: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("listing {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            matches!(
                path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref(),
                Some("png" | "jpg" | "jpeg")
            )
        })
        .collect();
    frames.sort();
    Ok(frames)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
