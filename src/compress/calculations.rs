//! Pure dimension math for compression.
//!
//! All functions here are pure and testable without any I/O or images.

/// Scale `(width, height)` so the longer edge is at most `max_edge`,
/// preserving aspect ratio. Never upscales; never returns a zero edge.
///
/// ```
/// # use gallery_ingest::compress::fit_within;
/// assert_eq!(fit_within((4000, 3000), 1920), (1920, 1440));
/// assert_eq!(fit_within((800, 600), 1920), (800, 600));
/// ```
pub fn fit_within(dims: (u32, u32), max_edge: u32) -> (u32, u32) {
    let (w, h) = dims;
    let longer = w.max(h);
    if longer <= max_edge || longer == 0 {
        return dims;
    }
    let scale = max_edge as f64 / longer as f64;
    scale_dims(dims, scale)
}

/// Shrink dimensions by `factor` (0 < factor < 1) for another encoding pass.
///
/// Returns `None` once an edge would drop below one pixel or the result stops
/// getting smaller, which ends the retry loop.
pub fn shrink(dims: (u32, u32), factor: f64) -> Option<(u32, u32)> {
    let next = scale_dims(dims, factor);
    if next == dims || dims.0 <= 1 || dims.1 <= 1 {
        None
    } else {
        Some(next)
    }
}

fn scale_dims((w, h): (u32, u32), scale: f64) -> (u32, u32) {
    let sw = ((w as f64 * scale).round() as u32).max(1);
    let sh = ((h as f64 * scale).round() as u32).max(1);
    (sw, sh)
}
