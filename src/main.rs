use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use log::{error, info};

use bubble_char_rust_lib::pipeline::{run_acoustic_analysis, run_image_analysis};
use bubble_char_rust_lib::{Config, Result};

/// Command-line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about = "BubbleChar - Bubble size characterization from frames and sound")]
struct Args {
    /// Path to input frame or directory of frames
    #[clap(short, long)]
    input: Option<String>,

    /// Path to output directory
    #[clap(short, long)]
    output: Option<String>,

    /// Path to configuration file
    #[clap(short, long, default_value = "config.toml")]
    config: String,

    /// Which analysis branch to run
    #[clap(short, long, value_enum, default_value = "all")]
    mode: Mode,

    /// Pixel edge length in mm (overwrites config)
    #[clap(short = 's', long)]
    scale: Option<f64>,

    /// Enable debug mode (save normalized silhouettes with contour and centroid)
    #[clap(short, long)]
    debug: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Images,
    Acoustic,
    All,
}

fn run(args: Args) -> Result<()> {
    let mut config = Config::from_file(&args.config)?;

    if let Some(input) = args.input {
        config.input_path = input;
    }

    if let Some(output) = args.output {
        config.output_base_dir = output;
    }

    if let Some(scale) = args.scale {
        config.pixel_to_mm_scale = scale;
    }

    config.validate()?;

    let start_time = Instant::now();
    fs::create_dir_all(PathBuf::from(&config.output_base_dir))?;

    if matches!(args.mode, Mode::Images | Mode::All) {
        info!("Processing frames from {}", config.input_path);
        let batch = run_image_analysis(&config, args.debug)?;
        for failure in &batch.failures {
            error!("Frame {} was not analyzed: {}", failure.name, failure.error);
        }
        for (frame, err) in batch.descriptor_failures() {
            error!("Frame {} has a volume but no descriptor: {}", frame.name, err);
        }
    }

    if matches!(args.mode, Mode::Acoustic | Mode::All) {
        info!("Processing {} acoustic runs", config.acoustic_runs.len());
        let batch = run_acoustic_analysis(&config)?;
        for result in &batch.runs {
            match &result.acoustic_radius_mm {
                Ok(radius) => info!(
                    "{}: {:.1} Hz, radius {:.3} mm from {} events",
                    result.label,
                    result.spectrum.dominant_frequency,
                    radius,
                    result.spectrum.events_used()
                ),
                Err(err) => error!(
                    "{}: {:.1} Hz, no radius: {}",
                    result.label, result.spectrum.dominant_frequency, err
                ),
            }
        }
        for (label, err) in &batch.failures {
            error!("Acoustic run {} was not analyzed: {}", label, err);
        }
    }

    info!(
        "Processing completed in {:.2} seconds",
        start_time.elapsed().as_secs_f64()
    );

    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(err) = run(args) {
        error!("{}", err);
        std::process::exit(1);
    }
}
