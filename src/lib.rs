// src/lib.rs - Library interface for BubbleChar

pub mod acoustic_events;
pub mod config;
pub mod errors;
pub mod filtering;
pub mod fourier_descriptor;
pub mod image_io;
pub mod image_utils;
pub mod morphology;
pub mod output;
pub mod pipeline;
pub mod point_analysis;
pub mod radius_model;
pub mod shape_analysis;
pub mod signal_io;
pub mod silhouette;
pub mod spectral_analysis;

// Re-export commonly used types and functions
pub use errors::{BubbleCharError, Result};
pub use config::{AcousticRunConfig, Config};
pub use silhouette::Silhouette;
pub use pipeline::{
    analyze_acoustic_run,
    describe_frame,
    process_frame,
    process_frames,
    run_acoustic_analysis,
    run_image_analysis,
    AcousticRunResult,
    FrameAnalysis,
    FrameShape,
    ImageBatch,
};
pub use image_io::{InputFrame, load_silhouette, save_image};
pub use signal_io::{Waveform, load_waveform};

// Optical branch
pub use shape_analysis::{
    calculate_bounding_box,
    estimate_volume,
    sphere_equivalent_radius,
    sphere_volume,
};
pub use point_analysis::{
    calculate_centroid,
    normalize_silhouette,
    Centroid,
    NormalizedSilhouette,
};
pub use morphology::{trace_contour, resample_contour};
pub use fourier_descriptor::{compute_descriptor, ShapeDescriptor};

// Acoustic branch
pub use filtering::HighPassFilter;
pub use acoustic_events::{extract_event, AcousticEvent};
pub use spectral_analysis::{magnitude_spectrum, RunSpectrum, SpectralPeakEstimator, Spectrum};
pub use radius_model::MinnaertModel;
