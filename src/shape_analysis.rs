// src/shape_analysis.rs - Area, extent and solid-of-revolution volume of a silhouette

use log::{debug, warn};
use std::f64::consts::PI;

use crate::errors::{BubbleCharError, Result};
use crate::silhouette::Silhouette;

/// Inclusive pixel bounds of the foreground
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl BoundingBox {
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    /// True when the box touches any edge of a `width` x `height` frame
    pub fn touches_frame(&self, width: u32, height: u32) -> bool {
        self.min_x == 0 || self.min_y == 0 || self.max_x + 1 >= width || self.max_y + 1 >= height
    }
}

/// Calculate the bounding box of foreground pixels, `None` for an empty silhouette
pub fn calculate_bounding_box(silhouette: &Silhouette) -> Option<BoundingBox> {
    let mut bbox: Option<BoundingBox> = None;

    for (x, y) in silhouette.foreground_pixels() {
        bbox = Some(match bbox {
            None => BoundingBox { min_x: x, min_y: y, max_x: x, max_y: y },
            Some(b) => BoundingBox {
                min_x: b.min_x.min(x),
                min_y: b.min_y.min(y),
                max_x: b.max_x.max(x),
                max_y: b.max_y.max(y),
            },
        });
    }

    bbox
}

/// Cross-sectional width of every row in pixels.
/// Width is the span from the leftmost to the rightmost foreground pixel; empty rows are 0.
pub fn row_widths(silhouette: &Silhouette) -> Vec<u32> {
    let (width, height) = silhouette.dimensions();
    let mut widths = Vec::with_capacity(height as usize);

    for y in 0..height {
        let left = (0..width).find(|&x| silhouette.is_foreground(x, y));
        let right = (0..width).rev().find(|&x| silhouette.is_foreground(x, y));

        let row_width = match (left, right) {
            (Some(l), Some(r)) => r - l + 1,
            _ => 0,
        };
        widths.push(row_width);
    }

    widths
}

/// Estimate the bubble volume in mm³ from its silhouette.
///
/// The bubble is taken to be a solid of revolution about its vertical axis, so every
/// row contributes a disk of diameter equal to the row width and thickness of one
/// pixel. `pixel_to_mm_scale` is the physical edge length of a (square) pixel in mm.
///
/// The bubble must be imaged upright and entirely inside the frame. A clipped
/// silhouette is still measured (and logged), which underestimates the volume.
pub fn estimate_volume(silhouette: &Silhouette, pixel_to_mm_scale: f64) -> Result<f64> {
    if !(pixel_to_mm_scale.is_finite() && pixel_to_mm_scale > 0.0) {
        return Err(BubbleCharError::Config(format!(
            "pixel_to_mm_scale must be a positive number, got {}",
            pixel_to_mm_scale
        )));
    }

    let bbox = calculate_bounding_box(silhouette).ok_or_else(|| {
        BubbleCharError::InvalidSilhouette("frame contains no foreground pixels".to_string())
    })?;

    let (width, height) = silhouette.dimensions();
    if bbox.touches_frame(width, height) {
        warn!(
            "Silhouette touches the frame border ({}x{} frame); volume may be underestimated",
            width, height
        );
    }

    let row_height = pixel_to_mm_scale;
    let volume: f64 = row_widths(silhouette)
        .iter()
        .filter(|&&w| w > 0)
        .map(|&w| {
            let row_radius = w as f64 * pixel_to_mm_scale / 2.0;
            PI * row_radius * row_radius * row_height
        })
        .sum();

    debug!(
        "Volume from {} rows (bbox {}x{} px): {:.4} mm³",
        bbox.height(),
        bbox.width(),
        bbox.height(),
        volume
    );

    Ok(volume)
}

/// Radius of the sphere with the given volume: R = (3V / 4π)^(1/3)
pub fn sphere_equivalent_radius(volume: f64) -> f64 {
    ((3.0 * volume) / (4.0 * PI)).cbrt()
}

/// Volume of a sphere of the given radius
pub fn sphere_volume(radius: f64) -> f64 {
    4.0 / 3.0 * PI * radius.powi(3)
}
