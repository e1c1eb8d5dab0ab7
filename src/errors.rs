use thiserror::Error;
use std::io;
use std::path::PathBuf;

/// Custom error types for bubble characterization
#[derive(Error, Debug)]
pub enum BubbleCharError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("WAV decoding error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid silhouette: {0}")]
    InvalidSilhouette(String),

    #[error("Silhouette has no foreground pixels")]
    EmptySilhouette,

    #[error("Contour has {points} boundary points, at least {required} are required")]
    DegenerateContour { points: usize, required: usize },

    #[error("Event at sample {onset} with length {length} exceeds waveform of {available} samples")]
    OutOfRange {
        onset: usize,
        length: usize,
        available: usize,
    },

    #[error("Event length mismatch: expected {expected} samples, found {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("Frequency {frequency:.1} Hz is outside the model range [{min:.1}, {max:.1}] Hz")]
    OutOfModelRange { frequency: f64, min: f64, max: f64 },

    #[error("No acoustic events to analyze")]
    EmptyRun,

    #[error("No spectrum bins inside the passband [{low:.1}, {high:.1}] Hz")]
    EmptyPassband { low: f64, high: f64 },

    #[error("Filter design error: {0}")]
    Filter(String),

    #[error("CSV output error: {0}")]
    CsvOutput(#[from] csv::Error),

    #[error("JSON output error: {0}")]
    JsonOutput(#[from] serde_json::Error),

    #[error("Invalid input path: {0}")]
    InvalidPath(PathBuf),
}

/// Type alias for Result with our custom error type
pub type Result<T> = std::result::Result<T, BubbleCharError>;
