//! VFA Core - frame alignment engine for Video Frame Align
//!
//! Aligns an original frame sequence with a recorded capture of the same
//! content. The crate has no UI dependencies and is driven either through
//! the [`orchestrator`] pipeline or by calling the components directly:
//!
//! ```text
//! FrameStore ─► KeyframeDetector ─► KeyframeMatcher ─► editable list ─► SegmentRefiner ─► AlignmentReport
//! ```

pub mod artifacts;
pub mod config;
pub mod detection;
pub mod error;
pub mod frames;
pub mod logging;
pub mod matching;
pub mod models;
pub mod orchestrator;
pub mod refinement;
pub mod similarity;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
pub(crate) mod test_support;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }
}
