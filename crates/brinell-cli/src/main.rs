//! brinell: CLI driver for the automatic measurement pipeline.
//!
//! Runs the full photograph-to-hardness pipeline on an image file with
//! a known pixel-per-millimetre scale and a selected test condition,
//! printing the detection, the converted diameter and the HBW reading.
//! Useful for:
//!
//! - Batch-processing indentation photographs from a calibrated rig
//! - Tuning detector parameters against problem images
//! - Emitting machine-readable reports (`--json`) for downstream tools
//!
//! Interactive calibration needs a pointer; it lives with the display
//! front end, not here. Set `RUST_LOG=debug` for per-stage logging.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin brinell -- --scale 101 --test hbw5-750 <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use brinell_pipeline::{PipelineConfig, PipelineError, TestCondition};
use clap::{Parser, ValueEnum};

/// Automatic Brinell hardness measurement from an indentation photograph.
///
/// Detects the indentation circle, converts its diameter through the
/// supplied calibration scale and reports the hardness number for the
/// chosen test condition.
#[derive(Parser)]
#[command(name = "brinell", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Calibration scale in pixels per millimetre.
    #[arg(long)]
    scale: f64,

    /// Brinell test condition (load / ball preset).
    #[arg(long, value_enum)]
    test: Test,

    /// CLAHE clip limit.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_CLAHE_CLIP_LIMIT)]
    clahe_clip: f32,

    /// CLAHE tile grid size (tiles per axis).
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_CLAHE_GRID)]
    clahe_grid: u32,

    /// Glare suppression structuring-element radius (0 disables).
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_GLARE_RADIUS)]
    glare_radius: u32,

    /// Adaptive threshold window size.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_THRESHOLD_WINDOW)]
    threshold_window: u32,

    /// Adaptive threshold offset below the local mean.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_THRESHOLD_OFFSET)]
    threshold_offset: f32,

    /// Hough accumulator vote threshold.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_HOUGH_VOTE_THRESHOLD)]
    vote_threshold: u32,

    /// Full pipeline config as a JSON string.
    ///
    /// When provided, all other pipeline parameter flags are ignored.
    /// The JSON must be a valid `PipelineConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,

    /// Output the measurement report as JSON instead of human-readable
    /// text.
    #[arg(long)]
    json: bool,
}

/// Test condition selection.
#[derive(Clone, Copy, ValueEnum)]
enum Test {
    /// 750 kgf load, 5 mm ball.
    Hbw5_750,
    /// 3000 kgf load, 10 mm ball.
    Hbw10_3000,
    /// 1000 kgf load, 10 mm ball.
    Hbw10_1000,
}

impl From<Test> for TestCondition {
    fn from(test: Test) -> Self {
        match test {
            Test::Hbw5_750 => Self::Hbw5_750,
            Test::Hbw10_3000 => Self::Hbw10_3000,
            Test::Hbw10_1000 => Self::Hbw10_1000,
        }
    }
}

/// Build a [`PipelineConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored. Otherwise, a config is
/// assembled from the individual flags.
fn config_from_cli(cli: &Cli) -> Result<PipelineConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(PipelineConfig {
        clahe_clip_limit: cli.clahe_clip,
        clahe_grid: cli.clahe_grid,
        glare_radius: cli.glare_radius,
        threshold_window: cli.threshold_window,
        threshold_offset: cli.threshold_offset,
        hough_vote_threshold: cli.vote_threshold,
        ..PipelineConfig::default()
    })
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let image_bytes = match std::fs::read(&cli.image_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    let start = Instant::now();
    let report = match brinell_pipeline::process(&image_bytes, &config, cli.scale, cli.test.into())
    {
        Ok(report) => report,
        Err(PipelineError::CircleNotFound) => {
            eprintln!(
                "No circle detected in {}; measure manually with a reference session.",
                cli.image_path.display(),
            );
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let elapsed = start.elapsed();

    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing report: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        let phase = match report.detection.phase {
            brinell_pipeline::DetectionPhase::Contour => "contour phase",
            brinell_pipeline::DetectionPhase::Hough => "hough fallback",
        };
        println!("Circle detected ({phase})");
        println!(
            "  Center: ({}, {})",
            report.detection.circle.center.x, report.detection.circle.center.y,
        );
        println!("  Radius: {} px", report.detection.circle.radius);
        println!("  Diameter: {:.2} px", report.diameter_px);
        println!();
        println!(
            "Indentation diameter = {:.2} mm  (scale {:.2} px/mm)",
            report.diameter_mm, report.px_per_mm,
        );
        println!(
            "{} = {}",
            report.hardness.condition.designation(),
            report.hardness.hbw,
        );
    }
    eprintln!("Processed in {elapsed:.2?}");

    ExitCode::SUCCESS
}
