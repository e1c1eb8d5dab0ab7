use log::warn;

use crate::silhouette::Silhouette;

/// Direction vectors for Moore-Neighbor contour tracing, clockwise with y pointing down
static MOORE_NEIGHBORHOOD: [(i64, i64); 8] = [
    (1, 0),   // right
    (1, 1),   // down-right
    (0, 1),   // down
    (-1, 1),  // down-left
    (-1, 0),  // left
    (-1, -1), // up-left
    (0, -1),  // up
    (1, -1),  // up-right
];

/// Index into `MOORE_NEIGHBORHOOD` of a unit offset
fn direction_index(dx: i64, dy: i64) -> Option<usize> {
    MOORE_NEIGHBORHOOD.iter().position(|&d| d == (dx, dy))
}

/// Trace the outer boundary of the foreground as an ordered, closed sequence of pixels.
///
/// Tracing starts at the first foreground pixel in raster order and walks clockwise
/// until it is about to repeat its first step. Returns an empty vector for an empty
/// silhouette and a single point for an isolated pixel.
pub fn trace_contour(silhouette: &Silhouette) -> Vec<(u32, u32)> {
    let (width, height) = silhouette.dimensions();

    let start = match silhouette.foreground_pixels().next() {
        Some((x, y)) => (x as i64, y as i64),
        None => return Vec::new(),
    };

    let mut contour = vec![(start.0 as u32, start.1 as u32)];
    let mut current = start;
    // The pixel left of the raster-scan start is always background
    let mut backtrack = 4usize;
    let mut first_step: Option<(i64, i64)> = None;

    let max_steps = 4 * (width as usize) * (height as usize) + 8;
    let mut closed = false;

    for _ in 0..max_steps {
        let mut next = None;

        for i in 1..=8 {
            let idx = (backtrack + i) % 8;
            let (dx, dy) = MOORE_NEIGHBORHOOD[idx];
            let candidate = (current.0 + dx, current.1 + dy);

            if silhouette.is_foreground_at(candidate.0, candidate.1) {
                // The previously examined neighbour is background and adjacent to the candidate
                let (pdx, pdy) = MOORE_NEIGHBORHOOD[(backtrack + i - 1) % 8];
                let previous = (current.0 + pdx, current.1 + pdy);
                backtrack = direction_index(previous.0 - candidate.0, previous.1 - candidate.1)
                    .unwrap_or(4);
                next = Some(candidate);
                break;
            }
        }

        let next = match next {
            Some(point) => point,
            None => {
                closed = true; // isolated pixel
                break;
            }
        };

        match first_step {
            None => first_step = Some(next),
            Some(step) if current == start && next == step => {
                closed = true;
                break;
            }
            Some(_) => {}
        }

        current = next;
        if current != start {
            contour.push((current.0 as u32, current.1 as u32));
        }
    }

    if !closed {
        warn!("Contour tracing hit its step limit ({}), boundary may be incomplete", max_steps);
    }

    contour
}

/// Calculate the perimeter of a closed contour
pub fn calculate_perimeter(contour_points: &[(u32, u32)]) -> f64 {
    if contour_points.len() < 2 {
        return 0.0;
    }

    let n = contour_points.len();
    (0..n)
        .map(|i| {
            let (x1, y1) = contour_points[i];
            let (x2, y2) = contour_points[(i + 1) % n]; // Wrap around to first point
            let dx = x2 as f64 - x1 as f64;
            let dy = y2 as f64 - y1 as f64;
            (dx * dx + dy * dy).sqrt()
        })
        .sum()
}

/// Resample a closed contour to `points` positions equally spaced in arc length,
/// starting at the first contour point
pub fn resample_contour(contour: &[(u32, u32)], points: usize) -> Vec<(f64, f64)> {
    if contour.len() < 2 || points == 0 {
        return Vec::new();
    }

    let perimeter = calculate_perimeter(contour);
    if perimeter <= 0.0 {
        return Vec::new();
    }

    let n = contour.len();
    let vertex = |i: usize| {
        let (x, y) = contour[i % n];
        (x as f64, y as f64)
    };

    let step = perimeter / points as f64;
    let mut resampled = Vec::with_capacity(points);
    let mut segment = 0usize;
    let mut travelled = 0.0;

    for k in 0..points {
        let target = k as f64 * step;

        loop {
            let (x1, y1) = vertex(segment);
            let (x2, y2) = vertex(segment + 1);
            let length = ((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt();

            if travelled + length >= target || segment + 1 >= n {
                let t = if length > 0.0 {
                    ((target - travelled) / length).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                resampled.push((x1 + t * (x2 - x1), y1 + t * (y2 - y1)));
                break;
            }

            travelled += length;
            segment += 1;
        }
    }

    resampled
}
