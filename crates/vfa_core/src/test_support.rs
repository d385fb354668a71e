//! Synthetic frame fixtures shared by unit tests.

use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, Rgb, RgbImage};

use crate::artifacts::ArtifactPaths;
use crate::config::Settings;
use crate::frames::MemoryFrameStore;
use crate::logging::RunLoggerBuilder;
use crate::models::{FrameId, Sequence};
use crate::orchestrator::Context;

/// 32x32 frame filled with one gray level.
pub fn solid_frame(level: u8) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(32, 32, |_, _| Rgb([level, level, level])))
}

/// 32x32 frame split into two gray levels (left/right halves).
pub fn split_frame(left: u8, right: u8) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(32, 32, |x, _| {
        let v = if x < 16 { left } else { right };
        Rgb([v, v, v])
    }))
}

/// Write frames into `dir` as `frame_NNNNNN.png`.
pub fn write_frames(dir: &Path, frames: &[DynamicImage]) {
    for (i, frame) in frames.iter().enumerate() {
        frame
            .save(dir.join(FrameId::new(i).file_name()))
            .expect("write test frame");
    }
}

/// Pipeline context over the given in-memory sequences.
///
/// Artifacts go to `dir/output`, the run log to `dir/logs`.
pub fn context_with(
    dir: &Path,
    original: MemoryFrameStore,
    recorded: MemoryFrameStore,
) -> Context {
    let mut settings = Settings::default();
    settings.paths.output_folder = dir.join("output").to_string_lossy().into_owned();
    settings.paths.logs_folder = dir.join("logs").to_string_lossy().into_owned();
    let logger = RunLoggerBuilder::new("test", dir.join("logs"))
        .build()
        .expect("create test logger");
    let artifacts = ArtifactPaths::new(dir.join("output"));
    Context::new(
        settings,
        "test",
        Arc::new(original),
        Arc::new(recorded),
        artifacts,
        Arc::new(logger),
    )
}

/// Pipeline context over two sequences of identical solid frames.
pub fn memory_context(dir: &Path, original_len: usize, recorded_len: usize) -> Context {
    context_with(
        dir,
        MemoryFrameStore::new(Sequence::Original, vec![solid_frame(90); original_len]),
        MemoryFrameStore::new(Sequence::Recorded, vec![solid_frame(90); recorded_len]),
    )
}
