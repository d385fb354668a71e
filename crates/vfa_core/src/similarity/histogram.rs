//! Grayscale intensity histograms.

use image::DynamicImage;

/// Number of intensity bins.
pub const HISTOGRAM_BINS: usize = 256;

/// L2-normalised 256-bin histogram of 8-bit luma values.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    bins: [f64; HISTOGRAM_BINS],
}

impl Histogram {
    /// Build the histogram of a frame.
    ///
    /// The frame is converted to single-channel 8-bit luma first.
    pub fn from_image(image: &DynamicImage) -> Self {
        let luma = image.to_luma8();
        let mut counts = [0u64; HISTOGRAM_BINS];
        for pixel in luma.pixels() {
            counts[pixel[0] as usize] += 1;
        }
        Self::from_counts(&counts)
    }

    /// Build a histogram from raw bin counts.
    pub fn from_counts(counts: &[u64; HISTOGRAM_BINS]) -> Self {
        let mut bins = [0.0; HISTOGRAM_BINS];
        for (bin, &count) in bins.iter_mut().zip(counts.iter()) {
            *bin = count as f64;
        }

        let norm = bins.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for bin in bins.iter_mut() {
                *bin /= norm;
            }
        }

        Self { bins }
    }

    /// Normalised bin values.
    pub fn bins(&self) -> &[f64; HISTOGRAM_BINS] {
        &self.bins
    }

    /// Pearson correlation with another histogram, in `[-1.0, 1.0]`.
    ///
    /// 1.0 means identical distributions, -1.0 inverse, 0.0 uncorrelated.
    /// Flat histograms have zero variance; they score 1.0.
    pub fn correlation(&self, other: &Histogram) -> f64 {
        let n = HISTOGRAM_BINS as f64;
        let (mut s1, mut s2, mut s11, mut s22, mut s12) = (0.0, 0.0, 0.0, 0.0, 0.0);

        for (&a, &b) in self.bins.iter().zip(other.bins.iter()) {
            s1 += a;
            s2 += b;
            s11 += a * a;
            s22 += b * b;
            s12 += a * b;
        }

        let num = s12 - s1 * s2 / n;
        let denom = (s11 - s1 * s1 / n) * (s22 - s2 * s2 / n);

        if denom.abs() <= f64::EPSILON {
            return 1.0;
        }
        (num / denom.sqrt()).clamp(-1.0, 1.0)
    }
}
