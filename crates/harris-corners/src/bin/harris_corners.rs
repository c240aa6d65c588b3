//! harris-corners CLI: detect corners in an image, report their distances
//! from the origin and optionally save a marked copy.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use harris_corners::detect::{self, ImageDetectError};
use harris_corners::io::{DetectConfig, DetectReport};
use harris_corners::markers::{marked_image, DEFAULT_MARKER_COLOR, DEFAULT_MARKER_WIDTH};
use harris_corners::CornerMeasure;
use log::{info, warn};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "harris-corners")]
#[command(about = "Detect Harris/Noble corners in an image and measure their positions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect corners in an image.
    Detect(DetectArgs),

    /// Print a default JSON config.
    PrintConfig {
        /// Image path to put in the config.
        #[arg(long, default_value = "image.png")]
        image: String,
    },
}

#[derive(Debug, Clone, Args)]
struct DetectArgs {
    /// Path to the input image.
    #[arg(long, required_unless_present = "config")]
    image: Option<PathBuf>,

    /// JSON config; command-line options override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to write the JSON report.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Path to write the image with corner markers (PNG).
    #[arg(long)]
    marked: Option<PathBuf>,

    /// Corner measure: harris or noble.
    #[arg(long)]
    measure: Option<CornerMeasure>,

    /// Harris sensitivity.
    #[arg(long)]
    k: Option<f32>,

    /// Response threshold.
    #[arg(long)]
    threshold: Option<f32>,

    /// Gaussian sigma; 0 disables smoothing.
    #[arg(long)]
    sigma: Option<f64>,

    /// Gaussian kernel length (odd, >= 3).
    #[arg(long)]
    kernel_size: Option<usize>,

    /// Non-maximum suppression radius.
    #[arg(long)]
    suppression: Option<usize>,

    /// Log level: off, error, warn, info, debug or trace. In `tracing`
    /// builds `RUST_LOG` overrides it.
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Detect(args) => {
            init_logging(&args.log_level)?;
            run_detect(&args)
        }
        Commands::PrintConfig { image } => run_print_config(image),
    }
}

#[cfg(not(feature = "tracing"))]
fn init_logging(level: &str) -> CliResult<()> {
    harris_corners::core::init_from_str(level)?;
    Ok(())
}

/// With the `tracing` feature `--log-level` is the default filter and
/// `RUST_LOG`, when set, replaces it.
#[cfg(feature = "tracing")]
fn init_logging(level: &str) -> CliResult<()> {
    let level = harris_corners::core::parse_level(level)?;
    harris_corners::core::init_tracing(false, level);
    Ok(())
}

fn resolve_config(args: &DetectArgs) -> CliResult<DetectConfig> {
    let mut cfg = match &args.config {
        Some(path) => DetectConfig::load_json(path)?,
        None => DetectConfig::new(String::new()),
    };
    if let Some(image) = &args.image {
        cfg.image_path = image.to_string_lossy().into_owned();
    }
    if let Some(out) = &args.out {
        cfg.output_path = Some(out.to_string_lossy().into_owned());
    }
    if let Some(marked) = &args.marked {
        cfg.marked_path = Some(marked.to_string_lossy().into_owned());
    }

    let p = &mut cfg.params;
    if let Some(measure) = args.measure {
        p.measure = measure;
    }
    if let Some(k) = args.k {
        p.k = k;
    }
    if let Some(threshold) = args.threshold {
        p.threshold = threshold;
    }
    if let Some(sigma) = args.sigma {
        p.sigma = sigma;
    }
    if let Some(kernel_size) = args.kernel_size {
        p.kernel_size = kernel_size;
    }
    if let Some(suppression) = args.suppression {
        p.suppression = suppression;
    }

    if cfg.image_path.is_empty() {
        return Err("no image given: pass --image or set image_path in the config".into());
    }
    Ok(cfg)
}

fn run_detect(args: &DetectArgs) -> CliResult<()> {
    let cfg = resolve_config(args)?;
    let detector = cfg.build_detector()?;

    info!("loading image {}", cfg.image_path);
    let img = detect::open_image(&cfg.image_path)?;
    let mut report = DetectReport::new(&cfg, img.width() as usize, img.height() as usize);

    let result = detect::view_from_dynamic(&img)
        .map_err(ImageDetectError::from)
        .and_then(|view| Ok(detector.detect_with_trace(&view)?));

    let failure = match result {
        Ok(trace) => {
            info!(
                "{} corners in {:.3} ms",
                trace.corners.len(),
                trace.total_ms()
            );
            report.set_trace(trace);
            None
        }
        Err(err) => {
            warn!("detection failed: {err}");
            report.set_error(&err);
            Some(err)
        }
    };

    for (c, d) in report.corners.iter().zip(&report.distances_from_origin) {
        info!("corner ({}, {}): {:.3} px from the origin", c.x, c.y, d);
    }

    let out_path = cfg.output_path();
    report.write_json(&out_path)?;
    info!("report written to {}", out_path.display());

    if let Some(err) = failure {
        return Err(err.into());
    }

    if let Some(marked_path) = &cfg.marked_path {
        marked_image(
            &img,
            &report.corners,
            DEFAULT_MARKER_COLOR,
            DEFAULT_MARKER_WIDTH,
        )
        .save(marked_path)?;
        info!("marked image written to {marked_path}");
    }

    println!("{} corners -> {}", report.corners.len(), out_path.display());
    Ok(())
}

fn run_print_config(image: String) -> CliResult<()> {
    let cfg = DetectConfig::new(image);
    println!("{}", serde_json::to_string_pretty(&cfg)?);
    Ok(())
}
