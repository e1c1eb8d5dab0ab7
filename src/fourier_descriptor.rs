// src/fourier_descriptor.rs - Contour Fourier descriptor of a normalized bubble silhouette

use log::debug;
use rustfft::{num_complex::Complex, FftPlanner};

use crate::errors::{BubbleCharError, Result};
use crate::morphology::{resample_contour, trace_contour};
use crate::point_analysis::{calculate_centroid, NormalizedSilhouette};

/// Number of arc-length samples taken along the contour when none is configured
pub const DEFAULT_RESAMPLE_POINTS: usize = 256;

/// Magnitudes of contour harmonics `start_harmonic..=end_harmonic`, each divided by
/// the DC magnitude. Invariant to translation, rotation and scale of the bubble.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeDescriptor {
    start_harmonic: usize,
    values: Vec<f64>,
}

impl ShapeDescriptor {
    pub fn start_harmonic(&self) -> usize {
        self.start_harmonic
    }

    pub fn end_harmonic(&self) -> usize {
        self.start_harmonic + self.values.len() - 1
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Normalized magnitude of one harmonic, if it is part of the descriptor
    pub fn harmonic(&self, harmonic: usize) -> Option<f64> {
        harmonic
            .checked_sub(self.start_harmonic)
            .and_then(|i| self.values.get(i).copied())
    }

    /// Euclidean distance between two descriptors over the same harmonic range
    pub fn distance(&self, other: &ShapeDescriptor) -> Result<f64> {
        if self.start_harmonic != other.start_harmonic || self.len() != other.len() {
            return Err(BubbleCharError::LengthMismatch {
                expected: self.len(),
                found: other.len(),
            });
        }

        Ok(self
            .values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt())
    }
}

/// Centroid-distance signature: distance from the region centroid to each
/// arc-length sample of the outer contour
fn extract_centroid_distance_signature(
    normalized: &NormalizedSilhouette,
    resample_points: usize,
    required_points: usize,
) -> Result<Vec<f64>> {
    let silhouette = normalized.as_silhouette();
    let centroid = calculate_centroid(silhouette)?;

    let contour = trace_contour(silhouette);
    if contour.len() < required_points {
        return Err(BubbleCharError::DegenerateContour {
            points: contour.len(),
            required: required_points,
        });
    }

    let resampled = resample_contour(&contour, resample_points);
    if resampled.len() != resample_points {
        return Err(BubbleCharError::DegenerateContour {
            points: contour.len(),
            required: required_points,
        });
    }

    debug!(
        "Contour of {} boundary points resampled to {}",
        contour.len(),
        resample_points
    );

    Ok(resampled
        .iter()
        .map(|&(x, y)| {
            let dx = x - centroid.x;
            let dy = y - centroid.y;
            (dx * dx + dy * dy).sqrt()
        })
        .collect())
}

/// Compute the descriptor with the default contour sampling density
pub fn compute_descriptor(
    normalized: &NormalizedSilhouette,
    start_harmonic: usize,
    end_harmonic: usize,
) -> Result<ShapeDescriptor> {
    compute_descriptor_with_resolution(normalized, start_harmonic, end_harmonic, DEFAULT_RESAMPLE_POINTS)
}

/// Compute the Fourier shape descriptor of a normalized silhouette.
///
/// The outer boundary is traced, resampled uniformly in arc length and turned into
/// a centroid-distance signal. Its DFT magnitudes are insensitive to where tracing
/// starts (rotation) and to translation; dividing by the DC term removes scale.
///
/// Fails with `DegenerateContour` when the boundary has fewer than
/// `2 * end_harmonic + 1` points.
pub fn compute_descriptor_with_resolution(
    normalized: &NormalizedSilhouette,
    start_harmonic: usize,
    end_harmonic: usize,
    resample_points: usize,
) -> Result<ShapeDescriptor> {
    if start_harmonic > end_harmonic {
        return Err(BubbleCharError::Config(format!(
            "start harmonic {} is greater than end harmonic {}",
            start_harmonic, end_harmonic
        )));
    }

    let required_points = 2 * end_harmonic + 1;
    if resample_points < required_points {
        return Err(BubbleCharError::Config(format!(
            "{} contour samples cannot resolve harmonic {} (need at least {})",
            resample_points, end_harmonic, required_points
        )));
    }

    let signature = extract_centroid_distance_signature(normalized, resample_points, required_points)?;

    let mut spectrum: Vec<Complex<f64>> = signature
        .iter()
        .map(|&d| Complex::new(d, 0.0))
        .collect();

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(spectrum.len());
    fft.process(&mut spectrum);

    let dc = spectrum[0].norm();
    if dc <= f64::EPSILON {
        return Err(BubbleCharError::DegenerateContour {
            points: signature.len(),
            required: required_points,
        });
    }

    let values = (start_harmonic..=end_harmonic)
        .map(|k| spectrum[k].norm() / dc)
        .collect();

    Ok(ShapeDescriptor {
        start_harmonic,
        values,
    })
}
