use log::debug;

use crate::errors::{BubbleCharError, Result};
use crate::shape_analysis::calculate_bounding_box;
use crate::silhouette::Silhouette;

/// Centroid of a silhouette from its first-order moments, in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Centroid {
    pub x: f64,
    pub y: f64,
}

impl Centroid {
    /// Nearest pixel to the centroid
    pub fn to_pixel(&self) -> (i64, i64) {
        (self.x.round() as i64, self.y.round() as i64)
    }
}

/// A square silhouette whose centroid sits on the canvas centre pixel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSilhouette {
    silhouette: Silhouette,
}

impl NormalizedSilhouette {
    /// Edge length of the square canvas
    pub fn size(&self) -> u32 {
        self.silhouette.width()
    }

    /// Index of the centre pixel along either axis
    pub fn center(&self) -> u32 {
        self.size() / 2
    }

    pub fn as_silhouette(&self) -> &Silhouette {
        &self.silhouette
    }

    pub fn into_silhouette(self) -> Silhouette {
        self.silhouette
    }
}

/// Calculate the centroid (cX, cY) from area and first moments of the foreground
pub fn calculate_centroid(silhouette: &Silhouette) -> Result<Centroid> {
    let mut area = 0u64;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;

    for (x, y) in silhouette.foreground_pixels() {
        area += 1;
        sum_x += x as f64;
        sum_y += y as f64;
    }

    if area == 0 {
        return Err(BubbleCharError::EmptySilhouette);
    }

    Ok(Centroid {
        x: sum_x / area as f64,
        y: sum_y / area as f64,
    })
}

/// Smallest odd square canvas that holds the foreground once its centroid is centred
pub fn auto_canvas_size(silhouette: &Silhouette) -> Result<u32> {
    let centroid = calculate_centroid(silhouette)?;
    let bbox = calculate_bounding_box(silhouette).ok_or(BubbleCharError::EmptySilhouette)?;
    let (cx, cy) = centroid.to_pixel();

    let half = [
        cx - bbox.min_x as i64,
        bbox.max_x as i64 - cx,
        cy - bbox.min_y as i64,
        bbox.max_y as i64 - cy,
    ]
    .into_iter()
    .max()
    .unwrap_or(0)
    .max(0);

    Ok((2 * half + 1) as u32)
}

/// Crop the foreground and place it on a `target_size` square canvas so that the
/// centroid lands on the centre pixel. Pixels outside the source are background.
///
/// Normalizing an already normalized silhouette with the same size returns it unchanged.
pub fn normalize_silhouette(silhouette: &Silhouette, target_size: u32) -> Result<NormalizedSilhouette> {
    if target_size == 0 {
        return Err(BubbleCharError::Config(
            "normalization target size must be > 0".to_string(),
        ));
    }

    let centroid = calculate_centroid(silhouette)?;
    let bbox = calculate_bounding_box(silhouette).ok_or(BubbleCharError::EmptySilhouette)?;

    let (cx, cy) = centroid.to_pixel();
    let center = (target_size / 2) as i64;
    let offset_x = center - cx;
    let offset_y = center - cy;

    let fits = bbox.min_x as i64 + offset_x >= 0
        && bbox.min_y as i64 + offset_y >= 0
        && bbox.max_x as i64 + offset_x < target_size as i64
        && bbox.max_y as i64 + offset_y < target_size as i64;

    if !fits {
        return Err(BubbleCharError::InvalidSilhouette(format!(
            "foreground ({}x{} px around centroid ({:.1}, {:.1})) does not fit a {}x{} canvas",
            bbox.width(),
            bbox.height(),
            centroid.x,
            centroid.y,
            target_size,
            target_size
        )));
    }

    let mut normalized = Silhouette::new(target_size, target_size);
    for y in bbox.min_y..=bbox.max_y {
        for x in bbox.min_x..=bbox.max_x {
            if silhouette.is_foreground(x, y) {
                normalized.set_foreground(
                    (x as i64 + offset_x) as u32,
                    (y as i64 + offset_y) as u32,
                );
            }
        }
    }

    debug!(
        "Normalized silhouette: centroid ({:.2}, {:.2}) -> centre {} of {}x{} canvas",
        centroid.x, centroid.y, center, target_size, target_size
    );

    Ok(NormalizedSilhouette { silhouette: normalized })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_utils::test_shapes::{disc, ellipse, rectangle};
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn centroid_of_rectangle() {
        let silhouette = rectangle(20, 20, 2, 4, 7, 9);
        let centroid = calculate_centroid(&silhouette).unwrap();

        assert_approx_eq!(centroid.x, 4.5, 1e-12);
        assert_approx_eq!(centroid.y, 6.5, 1e-12);
    }

    #[test]
    fn centroid_of_empty_silhouette_fails() {
        let result = calculate_centroid(&Silhouette::new(8, 8));
        assert!(matches!(result, Err(BubbleCharError::EmptySilhouette)));
    }

    #[test]
    fn normalized_centroid_is_canvas_centre() {
        let silhouette = ellipse(120, 90, 80.4, 30.7, 18.0, 9.0, 0.4);
        let normalized = normalize_silhouette(&silhouette, 64).unwrap();

        assert_eq!(normalized.size(), 64);
        assert_eq!(normalized.as_silhouette().area(), silhouette.area());

        let centroid = calculate_centroid(normalized.as_silhouette()).unwrap();
        assert_eq!(centroid.to_pixel(), (32, 32));
    }

    #[test]
    fn normalize_is_idempotent() {
        let silhouette = disc(70, 50, 21.3, 30.6, 11.5);
        let once = normalize_silhouette(&silhouette, 41).unwrap();
        let twice = normalize_silhouette(once.as_silhouette(), 41).unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn translated_copies_normalize_identically() {
        let a = rectangle(40, 40, 3, 5, 12, 9);
        let b = rectangle(60, 50, 30, 20, 39, 24);

        let na = normalize_silhouette(&a, 21).unwrap();
        let nb = normalize_silhouette(&b, 21).unwrap();
        assert_eq!(na, nb);
    }

    #[test]
    fn canvas_too_small_is_rejected() {
        let silhouette = disc(60, 60, 30.0, 30.0, 12.0);
        let result = normalize_silhouette(&silhouette, 16);
        assert!(matches!(result, Err(BubbleCharError::InvalidSilhouette(_))));
    }

    #[test]
    fn auto_canvas_fits_tightly() {
        let silhouette = rectangle(50, 50, 10, 10, 20, 14);
        let size = auto_canvas_size(&silhouette).unwrap();

        // centroid (15, 12): widest reach is 5 px horizontally
        assert_eq!(size, 11);
        assert!(normalize_silhouette(&silhouette, size).is_ok());
        assert!(normalize_silhouette(&silhouette, size - 2).is_err());
    }
}
