// src/silhouette.rs - Binary bubble silhouette raster

use image::{GrayImage, Luma};
use imageproc::contrast::threshold;

use crate::image_utils::in_bounds;

/// Pixel value used for bubble (foreground) pixels
pub const FOREGROUND: u8 = 255;

/// Pixel value used for background pixels
pub const BACKGROUND: u8 = 0;

/// A binary raster of a single bubble: foreground is the bubble, background is 0.
///
/// Processing assumes exactly one foreground connected component per frame.
/// That is not checked here; thresholding upstream is expected to guarantee it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Silhouette {
    mask: GrayImage,
}

impl Silhouette {
    /// Create an all-background silhouette
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            mask: GrayImage::new(width, height),
        }
    }

    /// Build a silhouette from an existing mask. Any non-zero pixel is foreground.
    pub fn from_mask(mask: &GrayImage) -> Self {
        let (width, height) = mask.dimensions();
        Self::from_fn(width, height, |x, y| mask.get_pixel(x, y)[0] > BACKGROUND)
    }

    /// Binarize a grayscale frame: pixels brighter than `threshold_value` become foreground
    pub fn from_gray(gray: &GrayImage, threshold_value: u8) -> Self {
        Self {
            mask: threshold(gray, threshold_value),
        }
    }

    /// Build a silhouette by evaluating a predicate at every pixel
    pub fn from_fn<F>(width: u32, height: u32, is_foreground: F) -> Self
    where
        F: Fn(u32, u32) -> bool,
    {
        let mask = GrayImage::from_fn(width, height, |x, y| {
            if is_foreground(x, y) {
                Luma([FOREGROUND])
            } else {
                Luma([BACKGROUND])
            }
        });
        Self { mask }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.mask.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.mask.height()
    }

    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        self.mask.dimensions()
    }

    /// Check whether the pixel at (x, y) belongs to the bubble
    #[inline]
    pub fn is_foreground(&self, x: u32, y: u32) -> bool {
        self.mask.get_pixel(x, y)[0] > BACKGROUND
    }

    /// Signed variant of `is_foreground`; anything outside the frame is background
    #[inline]
    pub fn is_foreground_at(&self, x: i64, y: i64) -> bool {
        in_bounds(x, y, self.width(), self.height()) && self.is_foreground(x as u32, y as u32)
    }

    pub(crate) fn set_foreground(&mut self, x: u32, y: u32) {
        self.mask.put_pixel(x, y, Luma([FOREGROUND]));
    }

    /// Number of foreground pixels
    pub fn area(&self) -> u64 {
        self.mask.pixels().filter(|p| p[0] > BACKGROUND).count() as u64
    }

    pub fn is_empty(&self) -> bool {
        !self.mask.pixels().any(|p| p[0] > BACKGROUND)
    }

    /// Iterate over the coordinates of all foreground pixels in raster order
    pub fn foreground_pixels(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.mask
            .enumerate_pixels()
            .filter(|(_, _, p)| p[0] > BACKGROUND)
            .map(|(x, y, _)| (x, y))
    }

    /// Borrow the underlying 0/255 mask
    pub fn as_image(&self) -> &GrayImage {
        &self.mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_gray_uses_strict_threshold() {
        let gray = GrayImage::from_fn(3, 1, |x, _| Luma([[199u8, 200, 201][x as usize]]));
        let silhouette = Silhouette::from_gray(&gray, 200);

        assert!(!silhouette.is_foreground(0, 0));
        assert!(!silhouette.is_foreground(1, 0));
        assert!(silhouette.is_foreground(2, 0));
        assert_eq!(silhouette.area(), 1);
    }

    #[test]
    fn from_mask_treats_any_nonzero_as_foreground() {
        let mask = GrayImage::from_fn(4, 4, |x, y| Luma([if x == y { 7 } else { 0 }]));
        let silhouette = Silhouette::from_mask(&mask);

        assert_eq!(silhouette.area(), 4);
        assert_eq!(silhouette.as_image().get_pixel(2, 2)[0], FOREGROUND);
    }

    #[test]
    fn out_of_frame_is_background() {
        let silhouette = Silhouette::from_fn(2, 2, |_, _| true);

        assert!(silhouette.is_foreground_at(1, 1));
        assert!(!silhouette.is_foreground_at(-1, 0));
        assert!(!silhouette.is_foreground_at(0, 2));
    }

    #[test]
    fn empty_silhouette() {
        let silhouette = Silhouette::new(5, 5);
        assert!(silhouette.is_empty());
        assert_eq!(silhouette.foreground_pixels().count(), 0);
    }
}
