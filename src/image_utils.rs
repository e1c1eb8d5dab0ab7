use image::{Rgba, RgbaImage};

use crate::silhouette::Silhouette;

/// Check if a point is inside the image bounds
#[inline]
pub fn in_bounds(x: i64, y: i64, width: u32, height: u32) -> bool {
    x >= 0 && y >= 0 && (x as u64) < width as u64 && (y as u64) < height as u64
}

/// Render a silhouette as an opaque RGBA image (white bubble on black)
pub fn silhouette_to_rgba(silhouette: &Silhouette) -> RgbaImage {
    let (width, height) = silhouette.dimensions();
    RgbaImage::from_fn(width, height, |x, y| {
        if silhouette.is_foreground(x, y) {
            Rgba([255, 255, 255, 255])
        } else {
            Rgba([0, 0, 0, 255])
        }
    })
}

/// Create a debug image with specified points marked in color
pub fn create_debug_image(
    silhouette: &Silhouette,
    points: &[(u32, u32)],
    color: [u8; 3],
    point_size: u32,
) -> RgbaImage {
    let mut debug_image = silhouette_to_rgba(silhouette);
    mark_points(&mut debug_image, points, color, point_size);
    debug_image
}

/// Paint square markers of `point_size` pixels centred on each point
pub fn mark_points(image: &mut RgbaImage, points: &[(u32, u32)], color: [u8; 3], point_size: u32) {
    let (width, height) = image.dimensions();
    let radius = point_size / 2;

    for &(x, y) in points {
        for dy in 0..point_size {
            for dx in 0..point_size {
                let px = x.saturating_sub(radius).saturating_add(dx);
                let py = y.saturating_sub(radius).saturating_add(dy);

                if px < width && py < height {
                    image.put_pixel(px, py, Rgba([color[0], color[1], color[2], 255]));
                }
            }
        }
    }
}

/// Synthetic rasters shared by the unit tests
#[cfg(test)]
pub(crate) mod test_shapes {
    use crate::silhouette::Silhouette;

    /// Filled disc: pixel centres within `radius` of (cx, cy)
    pub fn disc(width: u32, height: u32, cx: f64, cy: f64, radius: f64) -> Silhouette {
        Silhouette::from_fn(width, height, |x, y| {
            let dx = x as f64 - cx;
            let dy = y as f64 - cy;
            dx * dx + dy * dy <= radius * radius
        })
    }

    /// Filled ellipse with semi-axes `a`, `b`, rotated by `theta` radians
    pub fn ellipse(
        width: u32,
        height: u32,
        cx: f64,
        cy: f64,
        a: f64,
        b: f64,
        theta: f64,
    ) -> Silhouette {
        let (sin_t, cos_t) = theta.sin_cos();
        Silhouette::from_fn(width, height, |x, y| {
            let dx = x as f64 - cx;
            let dy = y as f64 - cy;
            let u = dx * cos_t + dy * sin_t;
            let v = -dx * sin_t + dy * cos_t;
            (u / a).powi(2) + (v / b).powi(2) <= 1.0
        })
    }

    /// Axis-aligned filled rectangle, inclusive bounds
    pub fn rectangle(width: u32, height: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> Silhouette {
        Silhouette::from_fn(width, height, |x, y| x >= x0 && x <= x1 && y >= y0 && y <= y1)
    }
}
