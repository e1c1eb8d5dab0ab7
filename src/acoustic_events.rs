// src/acoustic_events.rs - Fixed-length windows anchored at bubble departure onsets

use crate::errors::{BubbleCharError, Result};

/// One bubble departure: `samples` of the filtered waveform starting at `onset`
#[derive(Debug, Clone, PartialEq)]
pub struct AcousticEvent {
    onset: usize,
    samples: Vec<f64>,
}

impl AcousticEvent {
    pub fn onset(&self) -> usize {
        self.onset
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Slice `waveform[onset_sample .. onset_sample + length]`.
///
/// The waveform is expected to be high-pass filtered already (see
/// `filtering::HighPassFilter`); extraction itself does no filtering.
pub fn extract_event(waveform: &[f64], onset_sample: usize, length: usize) -> Result<AcousticEvent> {
    let out_of_range = || BubbleCharError::OutOfRange {
        onset: onset_sample,
        length,
        available: waveform.len(),
    };

    let end = onset_sample.checked_add(length).ok_or_else(out_of_range)?;
    let samples = waveform.get(onset_sample..end).ok_or_else(out_of_range)?;

    Ok(AcousticEvent {
        onset: onset_sample,
        samples: samples.to_vec(),
    })
}

/// Extract one event per onset. Each onset succeeds or fails on its own so a single
/// bad onset does not discard the rest of the run.
pub fn extract_events(waveform: &[f64], onsets: &[usize], length: usize) -> Vec<Result<AcousticEvent>> {
    onsets
        .iter()
        .map(|&onset| extract_event(waveform, onset, length))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize) -> Vec<f64> {
        (0..len).map(|i| i as f64).collect()
    }

    #[test]
    fn returns_exactly_length_samples() {
        let waveform = ramp(100);
        let event = extract_event(&waveform, 10, 25).unwrap();

        assert_eq!(event.onset(), 10);
        assert_eq!(event.len(), 25);
        assert_eq!(event.samples()[0], 10.0);
        assert_eq!(event.samples()[24], 34.0);
    }

    #[test]
    fn event_may_end_at_waveform_end() {
        let waveform = ramp(100);
        let event = extract_event(&waveform, 60, 40).unwrap();
        assert_eq!(event.samples().last(), Some(&99.0));
    }

    #[test]
    fn overrun_is_out_of_range() {
        let waveform = ramp(100);
        let result = extract_event(&waveform, 61, 40);

        assert!(matches!(
            result,
            Err(BubbleCharError::OutOfRange { onset: 61, length: 40, available: 100 })
        ));
        assert!(matches!(
            extract_event(&waveform, usize::MAX, 2),
            Err(BubbleCharError::OutOfRange { .. })
        ));
        assert!(matches!(
            extract_event(&waveform, 200, 0),
            Err(BubbleCharError::OutOfRange { .. })
        ));
    }

    #[test]
    fn batch_keeps_failures_per_onset() {
        let waveform = ramp(50);
        let events = extract_events(&waveform, &[0, 45, 20], 10);

        assert_eq!(events.len(), 3);
        assert!(events[0].is_ok());
        assert!(events[1].is_err());
        assert_eq!(events[2].as_ref().unwrap().onset(), 20);
    }
}
