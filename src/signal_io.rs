use std::path::Path;
use hound::{SampleFormat, WavReader};
use log::{debug, warn};

use crate::errors::{BubbleCharError, Result};

/// A mono recording: sample rate plus raw sample values
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub sample_rate: u32,
    pub samples: Vec<f64>,
}

impl Waveform {
    pub fn new(sample_rate: u32, samples: Vec<f64>) -> Self {
        Self { sample_rate, samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Load a WAV file. Integer samples keep their raw integer amplitude, float samples
/// are taken as stored. Only the first channel of multi-channel files is used.
pub fn load_waveform<P: AsRef<Path>>(path: P) -> Result<Waveform> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(BubbleCharError::InvalidPath(path.to_path_buf()));
    }

    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    if channels > 1 {
        warn!(
            "{} has {} channels, using channel 0 only",
            path.display(),
            channels
        );
    }

    let samples: Vec<f64> = match spec.sample_format {
        SampleFormat::Int => reader
            .samples::<i32>()
            .step_by(channels)
            .map(|s| s.map(|v| v as f64))
            .collect::<std::result::Result<_, _>>()?,
        SampleFormat::Float => reader
            .samples::<f32>()
            .step_by(channels)
            .map(|s| s.map(|v| v as f64))
            .collect::<std::result::Result<_, _>>()?,
    };

    debug!(
        "Loaded {}: {} samples at {} Hz ({}-bit {:?})",
        path.display(),
        samples.len(),
        spec.sample_rate,
        spec.bits_per_sample,
        spec.sample_format
    );

    Ok(Waveform::new(spec.sample_rate, samples))
}
