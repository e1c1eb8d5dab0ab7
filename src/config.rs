// src/config.rs - Experiment configuration: optics, filtering, spectral and model constants

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::errors::{BubbleCharError, Result};
use crate::filtering::HighPassFilter;
use crate::radius_model::MinnaertModel;
use crate::spectral_analysis::SpectralPeakEstimator;

/// Configuration for bubble characterization
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// Frame file or directory of binarized bubble frames
    pub input_path: String,
    pub output_base_dir: String,

    // Optical branch
    #[serde(default = "default_binarize_threshold")]
    pub binarize_threshold: u8,

    /// Physical edge length of one pixel in mm
    #[serde(default = "default_pixel_to_mm_scale")]
    pub pixel_to_mm_scale: f64,

    /// Square canvas for descriptor extraction; fitted per frame when absent
    #[serde(default)]
    pub descriptor_canvas_size: Option<u32>,

    #[serde(default = "default_descriptor_start_harmonic")]
    pub descriptor_start_harmonic: usize,

    #[serde(default = "default_descriptor_end_harmonic")]
    pub descriptor_end_harmonic: usize,

    #[serde(default = "default_descriptor_resample_points")]
    pub descriptor_resample_points: usize,

    #[serde(default = "default_parallel")]
    pub use_parallel: bool,

    // Acoustic branch
    #[serde(default = "default_highpass_order")]
    pub highpass_order: usize,

    #[serde(default = "default_highpass_cutoff_hz")]
    pub highpass_cutoff_hz: f64,

    #[serde(default = "default_passband_hz")]
    pub passband_hz: [f64; 2],

    /// Samples per acoustic event unless a run overrides it
    #[serde(default = "default_event_length")]
    pub event_length: usize,

    // Minnaert model constants
    #[serde(default = "default_polytropic_exponent")]
    pub polytropic_exponent: f64,

    #[serde(default = "default_ambient_pressure_pa")]
    pub ambient_pressure_pa: f64,

    #[serde(default = "default_liquid_density_kg_m3")]
    pub liquid_density_kg_m3: f64,

    #[serde(default = "default_model_frequency_range_hz")]
    pub model_frequency_range_hz: [f64; 2],

    #[serde(default)]
    pub acoustic_runs: Vec<AcousticRunConfig>,
}

/// One recording of a nozzle run with its bubble departure onsets
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AcousticRunConfig {
    pub label: String,
    pub audio_path: String,
    pub onsets: Vec<usize>,
    #[serde(default)]
    pub event_length: Option<usize>,
}

fn default_binarize_threshold() -> u8 {
    200
}

fn default_pixel_to_mm_scale() -> f64 {
    0.3846
}

fn default_descriptor_start_harmonic() -> usize {
    1
}

fn default_descriptor_end_harmonic() -> usize {
    10
}

fn default_descriptor_resample_points() -> usize {
    256
}

fn default_parallel() -> bool {
    true
}

fn default_highpass_order() -> usize {
    15
}

fn default_highpass_cutoff_hz() -> f64 {
    500.0
}

fn default_passband_hz() -> [f64; 2] {
    [500.0, 1300.0]
}

fn default_event_length() -> usize {
    2048
}

fn default_polytropic_exponent() -> f64 {
    1.4 // adiabatic air
}

fn default_ambient_pressure_pa() -> f64 {
    101_325.0
}

fn default_liquid_density_kg_m3() -> f64 {
    998.2 // water at 20 °C
}

fn default_model_frequency_range_hz() -> [f64; 2] {
    [200.0, 10_000.0]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: "./input".to_string(),
            output_base_dir: "./output".to_string(),
            binarize_threshold: default_binarize_threshold(),
            pixel_to_mm_scale: default_pixel_to_mm_scale(),
            descriptor_canvas_size: None,
            descriptor_start_harmonic: default_descriptor_start_harmonic(),
            descriptor_end_harmonic: default_descriptor_end_harmonic(),
            descriptor_resample_points: default_descriptor_resample_points(),
            use_parallel: default_parallel(),
            highpass_order: default_highpass_order(),
            highpass_cutoff_hz: default_highpass_cutoff_hz(),
            passband_hz: default_passband_hz(),
            event_length: default_event_length(),
            polytropic_exponent: default_polytropic_exponent(),
            ambient_pressure_pa: default_ambient_pressure_pa(),
            liquid_density_kg_m3: default_liquid_density_kg_m3(),
            model_frequency_range_hz: default_model_frequency_range_hz(),
            acoustic_runs: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            BubbleCharError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| {
            BubbleCharError::Config(format!("Failed to parse config file '{}': {}", path.display(), e))
        })?;

        Ok(config)
    }

    /// Validate numeric parameters
    pub fn validate(&self) -> Result<()> {
        if !(self.pixel_to_mm_scale.is_finite() && self.pixel_to_mm_scale > 0.0) {
            return Err(BubbleCharError::Config(
                "pixel_to_mm_scale must be > 0.0".to_string(),
            ));
        }

        if self.descriptor_canvas_size == Some(0) {
            return Err(BubbleCharError::Config(
                "descriptor_canvas_size must be > 0".to_string(),
            ));
        }

        if self.descriptor_end_harmonic == 0 {
            return Err(BubbleCharError::Config(
                "descriptor_end_harmonic must be > 0".to_string(),
            ));
        }

        if self.descriptor_start_harmonic > self.descriptor_end_harmonic {
            return Err(BubbleCharError::Config(
                "descriptor_start_harmonic must be <= descriptor_end_harmonic".to_string(),
            ));
        }

        if self.descriptor_resample_points < 2 * self.descriptor_end_harmonic + 1 {
            return Err(BubbleCharError::Config(format!(
                "descriptor_resample_points must be >= {} to resolve harmonic {}",
                2 * self.descriptor_end_harmonic + 1,
                self.descriptor_end_harmonic
            )));
        }

        if self.highpass_order == 0 {
            return Err(BubbleCharError::Config(
                "highpass_order must be > 0".to_string(),
            ));
        }

        if self.highpass_cutoff_hz <= 0.0 {
            return Err(BubbleCharError::Config(
                "highpass_cutoff_hz must be > 0.0".to_string(),
            ));
        }

        let [low, high] = self.passband_hz;
        if !(low >= 0.0 && low < high) {
            return Err(BubbleCharError::Config(
                "passband_hz must satisfy 0 <= low < high".to_string(),
            ));
        }

        if self.event_length == 0 {
            return Err(BubbleCharError::Config(
                "event_length must be > 0".to_string(),
            ));
        }

        for run in &self.acoustic_runs {
            if run.event_length == Some(0) {
                return Err(BubbleCharError::Config(format!(
                    "acoustic run '{}': event_length must be > 0",
                    run.label
                )));
            }
        }

        // Model constants are checked by the model constructor
        self.radius_model()?;

        Ok(())
    }

    /// Minnaert model from the configured physical constants
    pub fn radius_model(&self) -> Result<MinnaertModel> {
        let [min_hz, max_hz] = self.model_frequency_range_hz;
        MinnaertModel::new(
            self.polytropic_exponent,
            self.ambient_pressure_pa,
            self.liquid_density_kg_m3,
            min_hz,
            max_hz,
        )
    }

    /// High-pass filter for a recording at `sample_rate`
    pub fn highpass_filter(&self, sample_rate: f64) -> Result<HighPassFilter> {
        HighPassFilter::butterworth(self.highpass_order, self.highpass_cutoff_hz, sample_rate)
    }

    /// Spectral peak estimator for a recording at `sample_rate`
    pub fn spectral_estimator(&self, sample_rate: f64) -> Result<SpectralPeakEstimator> {
        let [low, high] = self.passband_hz;
        Ok(SpectralPeakEstimator::new(sample_rate, low, high)?.with_parallel(self.use_parallel))
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            BubbleCharError::Config(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, content)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn minimal_file_gets_defaults() {
        let config: Config = toml::from_str(
            r#"
            input_path = "frames"
            output_base_dir = "out"
            "#,
        )
        .unwrap();

        assert_eq!(config.binarize_threshold, 200);
        assert_eq!(config.pixel_to_mm_scale, 0.3846);
        assert_eq!(config.descriptor_start_harmonic, 1);
        assert_eq!(config.descriptor_end_harmonic, 10);
        assert_eq!(config.highpass_order, 15);
        assert_eq!(config.passband_hz, [500.0, 1300.0]);
        assert!(config.acoustic_runs.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn acoustic_runs_parse() {
        let config: Config = toml::from_str(
            r#"
            input_path = "frames"
            output_base_dir = "out"
            event_length = 4096

            [[acoustic_runs]]
            label = "nozzle_2.5mm"
            audio_path = "run1.wav"
            onsets = [1200, 9800, 20450]

            [[acoustic_runs]]
            label = "nozzle_3.0mm"
            audio_path = "run2.wav"
            onsets = [500]
            event_length = 1024
            "#,
        )
        .unwrap();

        assert_eq!(config.acoustic_runs.len(), 2);
        assert_eq!(config.acoustic_runs[0].onsets, vec![1200, 9800, 20450]);
        assert_eq!(config.acoustic_runs[0].event_length, None);
        assert_eq!(config.acoustic_runs[1].event_length, Some(1024));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut config = Config::default();
        config.descriptor_start_harmonic = 11;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.descriptor_resample_points = 20;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.passband_hz = [1300.0, 500.0];
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.liquid_density_kg_m3 = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.pixel_to_mm_scale = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.descriptor_canvas_size = Some(128);
        config.acoustic_runs.push(AcousticRunConfig {
            label: "run".to_string(),
            audio_path: "run.wav".to_string(),
            onsets: vec![10, 20],
            event_length: Some(512),
        });

        config.save_to_file(&path).unwrap();
        assert_eq!(Config::from_file(&path).unwrap(), config);
    }

    #[test]
    fn builds_pipeline_stages() {
        let config = Config::default();
        assert_eq!(config.highpass_filter(44_100.0).unwrap().order(), 15);
        assert_eq!(config.spectral_estimator(44_100.0).unwrap().passband(), (500.0, 1300.0));
        assert!(config.highpass_filter(800.0).is_err());
    }
}
