// src/filtering.rs - Butterworth high-pass applied once to a whole waveform

use log::debug;
use std::f64::consts::PI;

use crate::errors::{BubbleCharError, Result};

/// Normalized coefficients of one second-order section (a0 = 1)
#[derive(Debug, Clone, Copy, PartialEq)]
struct SosSection {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl SosSection {
    /// Second-order high-pass section (bilinear transform, prewarped at `freq`)
    fn highpass(freq: f64, q: f64, sample_rate: f64) -> Self {
        let omega = 2.0 * PI * freq / sample_rate;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();
        let alpha = sin_omega / (2.0 * q);

        let b0 = (1.0 + cos_omega) / 2.0;
        let b1 = -(1.0 + cos_omega);
        let b2 = (1.0 + cos_omega) / 2.0;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_omega;
        let a2 = 1.0 - alpha;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// First-order high-pass section stored as a degenerate biquad
    fn first_order_highpass(freq: f64, sample_rate: f64) -> Self {
        let k = (PI * freq / sample_rate).tan();
        let norm = 1.0 / (1.0 + k);

        Self {
            b0: norm,
            b1: -norm,
            b2: 0.0,
            a1: (k - 1.0) * norm,
            a2: 0.0,
        }
    }

    /// Run the section over a signal in place (transposed direct form II, zero state)
    fn process_in_place(&self, signal: &mut [f64]) {
        let mut z1 = 0.0;
        let mut z2 = 0.0;

        for sample in signal.iter_mut() {
            let input = *sample;
            let output = self.b0 * input + z1;
            z1 = self.b1 * input - self.a1 * output + z2;
            z2 = self.b2 * input - self.a2 * output;
            *sample = output;
        }
    }
}

/// Butterworth high-pass filter realised as cascaded second-order sections
#[derive(Debug, Clone)]
pub struct HighPassFilter {
    sections: Vec<SosSection>,
    order: usize,
    cutoff_hz: f64,
    sample_rate: f64,
}

impl HighPassFilter {
    /// Design an `order`-pole Butterworth high-pass with -3 dB at `cutoff_hz`.
    ///
    /// Each conjugate pole pair becomes one biquad with
    /// Q = 1 / (2 sin((2k - 1)π / 2N)); odd orders add one first-order section.
    pub fn butterworth(order: usize, cutoff_hz: f64, sample_rate: f64) -> Result<Self> {
        if order == 0 {
            return Err(BubbleCharError::Filter("filter order must be > 0".to_string()));
        }

        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(BubbleCharError::Filter(format!(
                "sample rate must be positive, got {}",
                sample_rate
            )));
        }

        let nyquist = sample_rate / 2.0;
        if !(cutoff_hz > 0.0 && cutoff_hz < nyquist) {
            return Err(BubbleCharError::Filter(format!(
                "cutoff {} Hz must lie in (0, {}) Hz",
                cutoff_hz, nyquist
            )));
        }

        let mut sections = Vec::with_capacity(order / 2 + order % 2);
        for k in 1..=order / 2 {
            let angle = (2 * k - 1) as f64 * PI / (2 * order) as f64;
            let q = 1.0 / (2.0 * angle.sin());
            sections.push(SosSection::highpass(cutoff_hz, q, sample_rate));
        }
        if order % 2 == 1 {
            sections.push(SosSection::first_order_highpass(cutoff_hz, sample_rate));
        }

        debug!(
            "Designed order-{} Butterworth high-pass at {} Hz ({} sections, fs = {} Hz)",
            order,
            cutoff_hz,
            sections.len(),
            sample_rate
        );

        Ok(Self {
            sections,
            order,
            cutoff_hz,
            sample_rate,
        })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn cutoff_hz(&self) -> f64 {
        self.cutoff_hz
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Filter a whole waveform causally, starting from rest
    pub fn apply(&self, signal: &[f64]) -> Vec<f64> {
        let mut output = signal.to_vec();
        for section in &self.sections {
            section.process_in_place(&mut output);
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    const FS: f64 = 44_100.0;

    fn tone(freq: f64, len: usize) -> Vec<f64> {
        (0..len)
            .map(|n| (2.0 * PI * freq * n as f64 / FS).sin())
            .collect()
    }

    /// Steady-state gain: RMS of the second half relative to a unit sine
    fn gain(filter: &HighPassFilter, freq: f64) -> f64 {
        let output = filter.apply(&tone(freq, FS as usize));
        let tail = &output[output.len() / 2..];
        let rms = (tail.iter().map(|v| v * v).sum::<f64>() / tail.len() as f64).sqrt();
        rms / 0.5f64.sqrt()
    }

    #[test]
    fn section_layout_follows_order() {
        assert_eq!(HighPassFilter::butterworth(15, 500.0, FS).unwrap().section_count(), 8);
        assert_eq!(HighPassFilter::butterworth(4, 500.0, FS).unwrap().section_count(), 2);
        assert_eq!(HighPassFilter::butterworth(1, 500.0, FS).unwrap().section_count(), 1);
    }

    #[test]
    fn order_fifteen_response() {
        let filter = HighPassFilter::butterworth(15, 500.0, FS).unwrap();

        assert!(gain(&filter, 100.0) < 1e-6);
        assert!(gain(&filter, 300.0) < 1e-3);
        assert_approx_eq!(gain(&filter, 500.0), 0.5f64.sqrt(), 1e-3);
        assert_approx_eq!(gain(&filter, 2000.0), 1.0, 1e-3);
    }

    #[test]
    fn removes_dc_offset() {
        let filter = HighPassFilter::butterworth(3, 500.0, FS).unwrap();
        let output = filter.apply(&vec![1.0; 20_000]);
        assert!(output[19_999].abs() < 1e-6);
    }

    #[test]
    fn output_length_matches_input() {
        let filter = HighPassFilter::butterworth(2, 1000.0, FS).unwrap();
        assert_eq!(filter.apply(&tone(3000.0, 1234)).len(), 1234);
        assert!(filter.apply(&[]).is_empty());
    }

    #[test]
    fn invalid_designs_are_rejected() {
        assert!(matches!(HighPassFilter::butterworth(0, 500.0, FS), Err(BubbleCharError::Filter(_))));
        assert!(matches!(HighPassFilter::butterworth(4, 0.0, FS), Err(BubbleCharError::Filter(_))));
        assert!(matches!(HighPassFilter::butterworth(4, 22_050.0, FS), Err(BubbleCharError::Filter(_))));
        assert!(matches!(HighPassFilter::butterworth(4, 500.0, 0.0), Err(BubbleCharError::Filter(_))));
    }
}
