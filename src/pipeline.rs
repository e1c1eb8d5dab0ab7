// src/pipeline.rs - Per-frame optical analysis and per-run acoustic analysis

use log::{debug, info, warn};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

use crate::acoustic_events::{extract_events, AcousticEvent};
use crate::config::{AcousticRunConfig, Config};
use crate::errors::{BubbleCharError, Result};
use crate::fourier_descriptor::{compute_descriptor_with_resolution, ShapeDescriptor};
use crate::image_io::{get_frame_files_in_dir, load_silhouette, save_image};
use crate::image_utils::{create_debug_image, mark_points};
use crate::morphology::trace_contour;
use crate::output::{
    write_acoustic_summary_csv, write_descriptor_csv, write_spectrum_csv, write_volumes_json,
    write_volumes_txt, AcousticSummaryRow,
};
use crate::point_analysis::{auto_canvas_size, calculate_centroid, normalize_silhouette, Centroid, NormalizedSilhouette};
use crate::shape_analysis::{estimate_volume, sphere_equivalent_radius};
use crate::signal_io::{load_waveform, Waveform};
use crate::silhouette::Silhouette;
use crate::spectral_analysis::RunSpectrum;

const CONTOUR_COLOR: [u8; 3] = [0, 200, 0];
const CENTROID_COLOR: [u8; 3] = [255, 0, 0];

/// Normalized canvas and Fourier descriptor of one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameShape {
    pub canvas_size: u32,
    pub descriptor: ShapeDescriptor,
}

/// Everything measured on one frame.
///
/// Volume and radius are always present. The shape branch runs on its own and
/// may fail without removing the frame from the volume aggregates.
#[derive(Debug)]
pub struct FrameAnalysis {
    pub index: usize,
    pub name: String,
    pub volume_mm3: f64,
    pub radius_mm: f64,
    pub centroid: Centroid,
    pub shape: Result<FrameShape>,
}

impl FrameAnalysis {
    pub fn descriptor(&self) -> Option<&ShapeDescriptor> {
        self.shape.as_ref().ok().map(|shape| &shape.descriptor)
    }
}

/// A frame that could not be analyzed; it contributes nothing to aggregates
#[derive(Debug)]
pub struct FrameFailure {
    /// Position in the analyzed sequence; `None` when the file could not be loaded
    pub index: Option<usize>,
    pub name: String,
    pub error: BubbleCharError,
}

/// Results of a frame sequence, successes in input order
#[derive(Debug, Default)]
pub struct ImageBatch {
    pub frames: Vec<FrameAnalysis>,
    pub failures: Vec<FrameFailure>,
}

impl ImageBatch {
    pub fn volumes(&self) -> Vec<f64> {
        self.frames.iter().map(|f| f.volume_mm3).collect()
    }

    pub fn radii(&self) -> Vec<f64> {
        self.frames.iter().map(|f| f.radius_mm).collect()
    }

    /// Descriptors of the frames whose shape branch succeeded
    pub fn descriptors(&self) -> Vec<(String, ShapeDescriptor)> {
        self.frames
            .iter()
            .filter_map(|f| f.descriptor().map(|d| (f.name.clone(), d.clone())))
            .collect()
    }

    /// Frames that have a volume but no descriptor
    pub fn descriptor_failures(&self) -> impl Iterator<Item = (&FrameAnalysis, &BubbleCharError)> + '_ {
        self.frames
            .iter()
            .filter_map(|f| f.shape.as_ref().err().map(|e| (f, e)))
    }
}

fn normalize_for_descriptor(silhouette: &Silhouette, config: &Config) -> Result<NormalizedSilhouette> {
    let canvas_size = match config.descriptor_canvas_size {
        Some(size) => size,
        None => auto_canvas_size(silhouette)?,
    };
    normalize_silhouette(silhouette, canvas_size)
}

/// Normalize a silhouette and compute its shape descriptor
pub fn describe_frame(silhouette: &Silhouette, config: &Config) -> Result<FrameShape> {
    let normalized = normalize_for_descriptor(silhouette, config)?;
    let descriptor = compute_descriptor_with_resolution(
        &normalized,
        config.descriptor_start_harmonic,
        config.descriptor_end_harmonic,
        config.descriptor_resample_points,
    )?;

    Ok(FrameShape {
        canvas_size: normalized.size(),
        descriptor,
    })
}

/// Analyze one silhouette: volume, sphere-equivalent radius, centroid and shape descriptor.
///
/// Fails only when the volume branch fails; a descriptor error is kept in `shape`.
pub fn process_frame(
    index: usize,
    name: &str,
    silhouette: &Silhouette,
    config: &Config,
) -> Result<FrameAnalysis> {
    let volume_mm3 = estimate_volume(silhouette, config.pixel_to_mm_scale)?;
    let radius_mm = sphere_equivalent_radius(volume_mm3);
    let centroid = calculate_centroid(silhouette)?;

    debug!(
        "Frame {} ({}): volume {:.2} mm³, radius {:.2} mm, centroid ({:.1}, {:.1})",
        index, name, volume_mm3, radius_mm, centroid.x, centroid.y
    );

    Ok(FrameAnalysis {
        index,
        name: name.to_string(),
        volume_mm3,
        radius_mm,
        centroid,
        shape: describe_frame(silhouette, config),
    })
}

/// Analyze an ordered list of frames. Frames are independent, so they run on the
/// rayon pool when `use_parallel` is set; results keep input order.
pub fn process_frames(frames: &[(String, Silhouette)], config: &Config) -> ImageBatch {
    let run = |(index, (name, silhouette)): (usize, &(String, Silhouette))| {
        (index, name.clone(), process_frame(index, name, silhouette, config))
    };

    let results: Vec<(usize, String, Result<FrameAnalysis>)> = if config.use_parallel {
        frames.par_iter().enumerate().map(run).collect()
    } else {
        frames.iter().enumerate().map(run).collect()
    };

    let mut batch = ImageBatch::default();
    for (index, name, result) in results {
        match result {
            Ok(analysis) => {
                if let Err(error) = &analysis.shape {
                    warn!("No descriptor for frame {} ({}): {}", index, name, error);
                }
                batch.frames.push(analysis);
            }
            Err(error) => {
                warn!("Skipping frame {} ({}): {}", index, name, error);
                batch.failures.push(FrameFailure { index: Some(index), name, error });
            }
        }
    }

    batch
}

fn write_frame_debug_image(name: &str, silhouette: &Silhouette, config: &Config, debug_dir: &Path) -> Result<()> {
    let normalized = normalize_for_descriptor(silhouette, config)?;
    let contour = trace_contour(normalized.as_silhouette());
    let center = normalized.center();

    let mut image = create_debug_image(normalized.as_silhouette(), &contour, CONTOUR_COLOR, 1);
    mark_points(&mut image, &[(center, center)], CENTROID_COLOR, 3);

    save_image(&image, debug_dir.join(format!("{}_normalized.png", name)))
}

/// Load every frame under `config.input_path`, analyze them and write
/// `volumes.txt`, `volumes_radii.json` and `descriptors.csv`
pub fn run_image_analysis(config: &Config, debug: bool) -> Result<ImageBatch> {
    let input_path = PathBuf::from(&config.input_path);
    let frame_paths = if input_path.is_file() {
        vec![input_path]
    } else if input_path.is_dir() {
        get_frame_files_in_dir(&input_path)?
    } else {
        return Err(BubbleCharError::InvalidPath(input_path));
    };

    info!("Found {} frames", frame_paths.len());

    let mut frames = Vec::with_capacity(frame_paths.len());
    let mut load_failures = Vec::new();
    for path in &frame_paths {
        match load_silhouette(path, config.binarize_threshold) {
            Ok(frame) => frames.push((frame.filename, frame.silhouette)),
            Err(error) => {
                warn!("Error loading {}: {}", path.display(), error);
                load_failures.push((path.display().to_string(), error));
            }
        }
    }

    let mut batch = process_frames(&frames, config);
    batch.failures.extend(
        load_failures
            .into_iter()
            .map(|(name, error)| FrameFailure { index: None, name, error }),
    );

    let output_dir = PathBuf::from(&config.output_base_dir);
    fs::create_dir_all(&output_dir)?;

    write_volumes_txt(&batch.volumes(), &output_dir)?;
    write_volumes_json(&batch.volumes(), &batch.radii(), &output_dir)?;
    write_descriptor_csv(&batch.descriptors(), &output_dir)?;

    if debug {
        let debug_dir = output_dir.join("debug");
        fs::create_dir_all(&debug_dir)?;

        for analysis in batch.frames.iter().filter(|f| f.shape.is_ok()) {
            let (name, silhouette) = &frames[analysis.index];
            write_frame_debug_image(name, silhouette, config, &debug_dir)?;
        }
    }

    info!(
        "Analyzed {} frames ({} skipped, {} without descriptor)",
        batch.frames.len(),
        batch.failures.len(),
        batch.descriptor_failures().count()
    );

    Ok(batch)
}

/// Outcome of one acoustic run
#[derive(Debug)]
pub struct AcousticRunResult {
    pub label: String,
    pub sample_rate: u32,
    pub spectrum: RunSpectrum,
    /// Radius for the dominant frequency; an error when it lies outside the model range
    pub acoustic_radius_mm: Result<f64>,
    /// Radius for each event's own peak, informational only
    pub event_radii_mm: Vec<Option<f64>>,
    /// Onsets whose event could not be extracted
    pub skipped: Vec<(usize, BubbleCharError)>,
}

impl AcousticRunResult {
    pub fn radius_mm(&self) -> Option<f64> {
        self.acoustic_radius_mm.as_ref().ok().copied()
    }

    pub fn summary_row(&self) -> AcousticSummaryRow {
        AcousticSummaryRow {
            label: self.label.clone(),
            events_used: self.spectrum.events_used(),
            events_skipped: self.skipped.len(),
            dominant_frequency_hz: self.spectrum.dominant_frequency,
            mean_event_frequency_hz: self.spectrum.mean_event_frequency,
            acoustic_radius_mm: self.radius_mm(),
        }
    }
}

/// Results of all configured acoustic runs
#[derive(Debug, Default)]
pub struct AcousticBatch {
    pub runs: Vec<AcousticRunResult>,
    pub failures: Vec<(String, BubbleCharError)>,
}

/// Filter the whole waveform once, cut one event per onset, average their spectra and
/// convert the dominant frequency into a radius.
///
/// Fails when no spectrum can be formed. A dominant frequency outside the model range
/// keeps the spectrum and reports the error in `acoustic_radius_mm`.
pub fn analyze_acoustic_run(
    label: &str,
    waveform: &Waveform,
    onsets: &[usize],
    event_length: usize,
    config: &Config,
) -> Result<AcousticRunResult> {
    let sample_rate = waveform.sample_rate as f64;
    let filter = config.highpass_filter(sample_rate)?;
    debug!(
        "Run {}: order {} high-pass at {:.0} Hz ({} sections, fs {:.0} Hz)",
        label,
        filter.order(),
        filter.cutoff_hz(),
        filter.section_count(),
        filter.sample_rate()
    );
    let filtered = filter.apply(&waveform.samples);

    let mut events: Vec<AcousticEvent> = Vec::with_capacity(onsets.len());
    let mut skipped = Vec::new();
    for (onset, result) in onsets.iter().zip(extract_events(&filtered, onsets, event_length)) {
        match result {
            Ok(event) => events.push(event),
            Err(error) => {
                warn!("Run {}: skipping event at sample {}: {}", label, onset, error);
                skipped.push((*onset, error));
            }
        }
    }

    let spectrum = config.spectral_estimator(sample_rate)?.dominant_frequency(&events)?;
    let model = config.radius_model()?;

    let acoustic_radius_mm = model.radius_from_frequency(spectrum.dominant_frequency);
    let event_radii_mm = spectrum
        .event_peaks
        .iter()
        .map(|&peak| model.radius_from_frequency(peak.abs()).ok())
        .collect();

    match &acoustic_radius_mm {
        Ok(radius) => info!(
            "Run {}: {} events, dominant {:.1} Hz -> radius {:.3} mm",
            label,
            spectrum.events_used(),
            spectrum.dominant_frequency,
            radius
        ),
        Err(error) => warn!(
            "Run {}: {} events, dominant {:.1} Hz has no radius: {}",
            label,
            spectrum.events_used(),
            spectrum.dominant_frequency,
            error
        ),
    }

    Ok(AcousticRunResult {
        label: label.to_string(),
        sample_rate: waveform.sample_rate,
        spectrum,
        acoustic_radius_mm,
        event_radii_mm,
        skipped,
    })
}

fn run_single(run: &AcousticRunConfig, config: &Config) -> Result<AcousticRunResult> {
    let waveform = load_waveform(&run.audio_path)?;
    debug!(
        "Loaded {} ({:.2} s at {} Hz)",
        run.audio_path,
        waveform.duration_secs(),
        waveform.sample_rate
    );

    let event_length = run.event_length.unwrap_or(config.event_length);
    analyze_acoustic_run(&run.label, &waveform, &run.onsets, event_length, config)
}

/// Analyze every configured acoustic run and write per-run spectra plus a summary
pub fn run_acoustic_analysis(config: &Config) -> Result<AcousticBatch> {
    let output_dir = PathBuf::from(&config.output_base_dir);
    fs::create_dir_all(&output_dir)?;

    let mut batch = AcousticBatch::default();
    for run in &config.acoustic_runs {
        match run_single(run, config) {
            Ok(result) => {
                write_spectrum_csv(&result.spectrum.averaged, &output_dir, &result.label)?;
                batch.runs.push(result);
            }
            Err(error) => {
                warn!("Acoustic run {} failed: {}", run.label, error);
                batch.failures.push((run.label.clone(), error));
            }
        }
    }

    let rows: Vec<AcousticSummaryRow> = batch.runs.iter().map(|r| r.summary_row()).collect();
    write_acoustic_summary_csv(&rows, &output_dir)?;

    Ok(batch)
}
