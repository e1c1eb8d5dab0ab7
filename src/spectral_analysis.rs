// src/spectral_analysis.rs - Averaged magnitude spectra and dominant frequency of a run

use log::debug;
use rayon::prelude::*;
use rustfft::{num_complex::Complex, FftPlanner};

use crate::acoustic_events::AcousticEvent;
use crate::errors::{BubbleCharError, Result};

/// Magnitude per frequency bin, in FFT bin order (non-negative frequencies first,
/// then the negative half)
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    frequencies: Vec<f64>,
    magnitudes: Vec<f64>,
}

impl Spectrum {
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn magnitudes(&self) -> &[f64] {
        &self.magnitudes
    }

    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }

    /// (frequency, magnitude) pairs
    pub fn bins(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.frequencies.iter().copied().zip(self.magnitudes.iter().copied())
    }

    /// Bins with frequency >= 0 in ascending order
    pub fn non_negative_bins(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.bins().filter(|&(f, _)| f >= 0.0)
    }

    /// Global maximum; the first bin wins ties
    pub fn peak(&self) -> Option<(f64, f64)> {
        Self::first_max(self.bins())
    }

    /// Maximum over non-negative bins with `low <= f <= high`
    pub fn peak_in_band(&self, low: f64, high: f64) -> Option<(f64, f64)> {
        Self::first_max(self.non_negative_bins().filter(|&(f, _)| f >= low && f <= high))
    }

    fn first_max(bins: impl Iterator<Item = (f64, f64)>) -> Option<(f64, f64)> {
        bins.fold(None, |best: Option<(f64, f64)>, (f, m)| match best {
            Some((_, best_m)) if best_m >= m => best,
            _ => Some((f, m)),
        })
    }
}

/// Frequency of each FFT bin for `n` samples at `sample_rate`
pub fn fft_frequencies(n: usize, sample_rate: f64) -> Vec<f64> {
    let positive = (n + 1) / 2;
    (0..n)
        .map(|i| {
            let k = if i < positive { i as f64 } else { i as f64 - n as f64 };
            k * sample_rate / n as f64
        })
        .collect()
}

/// Single-sided amplitude spectrum |FFT(x)| * 2 / N over all N bins
pub fn magnitude_spectrum(samples: &[f64], sample_rate: f64) -> Spectrum {
    let n = samples.len();
    if n == 0 {
        return Spectrum {
            frequencies: Vec::new(),
            magnitudes: Vec::new(),
        };
    }

    let mut buffer: Vec<Complex<f64>> = samples.iter().map(|&x| Complex::new(x, 0.0)).collect();

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buffer);

    let scale = 2.0 / n as f64;
    Spectrum {
        frequencies: fft_frequencies(n, sample_rate),
        magnitudes: buffer.iter().map(|c| c.norm() * scale).collect(),
    }
}

/// Spectral summary of all events of one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSpectrum {
    /// Bin-wise mean of the event spectra
    pub averaged: Spectrum,
    /// Peak frequency of the averaged spectrum inside the passband
    pub dominant_frequency: f64,
    pub dominant_magnitude: f64,
    /// Peak frequency of each event's own spectrum, informational only
    pub event_peaks: Vec<f64>,
    pub mean_event_frequency: f64,
}

impl RunSpectrum {
    pub fn events_used(&self) -> usize {
        self.event_peaks.len()
    }
}

/// Finds the dominant frequency of a run by averaging spectra first and peaking second
#[derive(Debug, Clone)]
pub struct SpectralPeakEstimator {
    sample_rate: f64,
    passband_low: f64,
    passband_high: f64,
    parallel: bool,
}

impl SpectralPeakEstimator {
    pub fn new(sample_rate: f64, passband_low: f64, passband_high: f64) -> Result<Self> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(BubbleCharError::Config(format!(
                "sample rate must be positive, got {}",
                sample_rate
            )));
        }

        if !(passband_low >= 0.0 && passband_low < passband_high) {
            return Err(BubbleCharError::Config(format!(
                "passband [{}, {}] Hz must satisfy 0 <= low < high",
                passband_low, passband_high
            )));
        }

        Ok(Self {
            sample_rate,
            passband_low,
            passband_high,
            parallel: false,
        })
    }

    /// Compute event spectra on the rayon pool
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn passband(&self) -> (f64, f64) {
        (self.passband_low, self.passband_high)
    }

    /// Average the event spectra bin by bin and locate the passband maximum.
    ///
    /// All events must have the same length; an empty run fails with `EmptyRun`.
    pub fn dominant_frequency(&self, events: &[AcousticEvent]) -> Result<RunSpectrum> {
        let expected = events.first().ok_or(BubbleCharError::EmptyRun)?.len();
        if let Some(event) = events.iter().find(|e| e.len() != expected) {
            return Err(BubbleCharError::LengthMismatch {
                expected,
                found: event.len(),
            });
        }

        let spectra: Vec<Spectrum> = if self.parallel {
            events
                .par_iter()
                .map(|e| magnitude_spectrum(e.samples(), self.sample_rate))
                .collect()
        } else {
            events
                .iter()
                .map(|e| magnitude_spectrum(e.samples(), self.sample_rate))
                .collect()
        };

        let event_peaks: Vec<f64> = spectra
            .iter()
            .zip(events)
            .map(|(spectrum, event)| {
                let (freq, _) = spectrum.peak().unwrap_or((0.0, 0.0));
                debug!("Event at sample {}: peak {:.1} Hz", event.onset(), freq);
                freq
            })
            .collect();
        let mean_event_frequency = event_peaks.iter().sum::<f64>() / event_peaks.len() as f64;

        let count = spectra.len() as f64;
        let mut averaged_magnitudes = vec![0.0; expected];
        for spectrum in &spectra {
            for (acc, m) in averaged_magnitudes.iter_mut().zip(spectrum.magnitudes()) {
                *acc += m;
            }
        }
        for acc in &mut averaged_magnitudes {
            *acc /= count;
        }

        let averaged = Spectrum {
            frequencies: fft_frequencies(expected, self.sample_rate),
            magnitudes: averaged_magnitudes,
        };

        let (dominant_frequency, dominant_magnitude) = averaged
            .peak_in_band(self.passband_low, self.passband_high)
            .ok_or(BubbleCharError::EmptyPassband {
                low: self.passband_low,
                high: self.passband_high,
            })?;

        debug!(
            "Run of {} events: dominant {:.1} Hz (magnitude {:.3}), mean event peak {:.1} Hz",
            events.len(),
            dominant_frequency,
            dominant_magnitude,
            mean_event_frequency
        );

        Ok(RunSpectrum {
            averaged,
            dominant_frequency,
            dominant_magnitude,
            event_peaks,
            mean_event_frequency,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acoustic_events::extract_event;
    use assert_approx_eq::assert_approx_eq;
    use std::f64::consts::PI;

    const FS: f64 = 44_100.0;

    fn tone(freq: f64, amplitude: f64, phase: f64, len: usize, fs: f64) -> Vec<f64> {
        (0..len)
            .map(|n| amplitude * (2.0 * PI * freq * n as f64 / fs + phase).sin())
            .collect()
    }

    fn event_from(samples: Vec<f64>) -> AcousticEvent {
        let len = samples.len();
        extract_event(&samples, 0, len).unwrap()
    }

    #[test]
    fn frequency_axis_matches_fft_layout() {
        assert_eq!(fft_frequencies(4, 8.0), vec![0.0, 2.0, -4.0, -2.0]);
        assert_eq!(fft_frequencies(5, 5.0), vec![0.0, 1.0, 2.0, -2.0, -1.0]);
    }

    #[test]
    fn amplitude_correction_recovers_sine_amplitude() {
        let spectrum = magnitude_spectrum(&tone(1000.0, 3.0, 0.0, 800, 8000.0), 8000.0);
        let (freq, magnitude) = spectrum.peak().unwrap();

        assert_approx_eq!(freq, 1000.0, 1e-9);
        assert_approx_eq!(magnitude, 3.0, 1e-9);
        assert_eq!(spectrum.len(), 800);
        // the mirror bin carries the same magnitude
        assert_approx_eq!(spectrum.magnitudes()[700], 3.0, 1e-9);
    }

    #[test]
    fn repeated_tone_is_found_within_one_bin() {
        let n = 2048;
        let f0 = 900.0;
        let events: Vec<AcousticEvent> = (0..5)
            .map(|i| event_from(tone(f0, 1.0, i as f64 * 0.7, n, FS)))
            .collect();

        let estimator = SpectralPeakEstimator::new(FS, 500.0, 1300.0).unwrap();
        let run = estimator.dominant_frequency(&events).unwrap();

        let bin_width = FS / n as f64;
        assert!((run.dominant_frequency - f0).abs() <= bin_width);
        assert_eq!(run.events_used(), 5);
        assert!((run.mean_event_frequency - f0).abs() <= bin_width);
    }

    #[test]
    fn passband_rejects_stronger_out_of_band_energy() {
        let n = 2048;
        let samples: Vec<f64> = tone(200.0, 10.0, 0.0, n, FS)
            .iter()
            .zip(tone(1000.0, 1.0, 0.3, n, FS))
            .map(|(a, b)| a + b)
            .collect();
        let events = vec![event_from(samples.clone()), event_from(samples)];

        let estimator = SpectralPeakEstimator::new(FS, 500.0, 1300.0).unwrap();
        let run = estimator.dominant_frequency(&events).unwrap();

        assert!((run.dominant_frequency - 1000.0).abs() <= FS / n as f64);
        // the per-event peaks are unrestricted
        assert!((run.event_peaks[0] - 200.0).abs() <= FS / n as f64);
    }

    #[test]
    fn averages_before_peaking() {
        let fs = 8000.0;
        let n = 800;
        let events = vec![
            event_from(tone(700.0, 1.0, 0.0, n, fs)),
            event_from(tone(1100.0, 3.0, 0.0, n, fs)),
        ];

        let estimator = SpectralPeakEstimator::new(fs, 500.0, 1300.0).unwrap();
        let run = estimator.dominant_frequency(&events).unwrap();

        assert_approx_eq!(run.dominant_frequency, 1100.0, 1e-9);
        assert_approx_eq!(run.dominant_magnitude, 1.5, 1e-9);
        assert_approx_eq!(run.mean_event_frequency, 900.0, 1e-9);
        assert_approx_eq!(run.averaged.magnitudes()[70], 0.5, 1e-9);
    }

    #[test]
    fn parallel_matches_sequential() {
        let events: Vec<AcousticEvent> = (0..8)
            .map(|i| event_from(tone(800.0 + 10.0 * i as f64, 1.0, 0.1, 1024, FS)))
            .collect();

        let sequential = SpectralPeakEstimator::new(FS, 500.0, 1300.0).unwrap();
        let parallel = sequential.clone().with_parallel(true);

        assert_eq!(
            sequential.dominant_frequency(&events).unwrap(),
            parallel.dominant_frequency(&events).unwrap()
        );
    }

    #[test]
    fn run_preconditions() {
        let estimator = SpectralPeakEstimator::new(FS, 500.0, 1300.0).unwrap();
        assert!(matches!(estimator.dominant_frequency(&[]), Err(BubbleCharError::EmptyRun)));

        let mixed = vec![event_from(vec![0.0; 64]), event_from(vec![0.0; 32])];
        assert!(matches!(
            estimator.dominant_frequency(&mixed),
            Err(BubbleCharError::LengthMismatch { expected: 64, found: 32 })
        ));

        let narrow = SpectralPeakEstimator::new(FS, 10.0, 15.0).unwrap();
        let coarse = vec![event_from(tone(1000.0, 1.0, 0.0, 64, FS))];
        assert!(matches!(
            narrow.dominant_frequency(&coarse),
            Err(BubbleCharError::EmptyPassband { .. })
        ));

        assert!(SpectralPeakEstimator::new(FS, 1300.0, 500.0).is_err());
        assert!(SpectralPeakEstimator::new(0.0, 500.0, 1300.0).is_err());
    }
}
