//! Frame similarity by grayscale histogram correlation.
//!
//! Pure functions: no I/O, no logging. Decode failures belong to the frame
//! store; callers score only frames that loaded.

mod histogram;

use image::DynamicImage;

pub use histogram::{Histogram, HISTOGRAM_BINS};

/// Similarity of two frames in `[-1.0, 1.0]`.
///
/// Symmetric, deterministic, and exactly 1.0 for a frame compared with
/// itself.
pub fn score(frame_a: &DynamicImage, frame_b: &DynamicImage) -> f64 {
    Histogram::from_image(frame_a).correlation(&Histogram::from_image(frame_b))
}
