//! Directory-backed frame store.
//!
//! Frame images are produced by an external extraction tool at a fixed
//! sampling rate. Opening validates the numbering up front; decoding is
//! deferred to [`FrameStore::load`].

use std::fs;
use std::path::{Path, PathBuf};

use image::DynamicImage;

use super::FrameStore;
use crate::error::{AlignError, AlignResult, FrameError};
use crate::models::{FrameId, Sequence, FRAME_EXTENSION};

/// Frames stored as `frame_NNNNNN.png` files in one directory.
#[derive(Debug, Clone)]
pub struct DirFrameStore {
    dir: PathBuf,
    sequence: Sequence,
    len: usize,
}

impl DirFrameStore {
    /// Open a frame directory.
    ///
    /// Fails with `MalformedInput` if a PNG file does not follow the naming
    /// convention, or if the indices are not dense and zero-based. Files
    /// with any other extension, including `.PNG`, are ignored.
    pub fn open(dir: impl AsRef<Path>, sequence: Sequence) -> AlignResult<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(AlignError::MissingInput(dir.to_path_buf()));
        }

        let entries = fs::read_dir(dir).map_err(|e| AlignError::io(dir, e))?;

        let mut indices = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| AlignError::io(dir, e))?;
            let path = entry.path();
            if !path.is_file() || !has_frame_extension(&path) {
                continue;
            }

            let name = entry.file_name();
            let name = name.to_string_lossy();
            let id = FrameId::parse_file_name(&name).map_err(|_| {
                AlignError::malformed(
                    dir.display().to_string(),
                    format!("'{}' does not follow the frame_NNNNNN.png convention", name),
                )
            })?;
            indices.push(id.index());
        }

        indices.sort_unstable();
        for (expected, &actual) in indices.iter().enumerate() {
            if actual != expected {
                let message = if actual < expected {
                    format!("frame index {} appears more than once", actual)
                } else {
                    format!("frame numbering has a gap: {} is missing", FrameId::new(expected).file_name())
                };
                return Err(AlignError::malformed(dir.display().to_string(), message));
            }
        }

        tracing::info!(
            "[FrameStore] Opened {} frames: {} images in {}",
            sequence,
            indices.len(),
            dir.display()
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            sequence,
            len: indices.len(),
        })
    }

    /// Directory holding the frames.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a frame file.
    pub fn frame_path(&self, id: FrameId) -> PathBuf {
        self.dir.join(id.file_name())
    }
}

fn has_frame_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext == FRAME_EXTENSION)
        .unwrap_or(false)
}

impl FrameStore for DirFrameStore {
    fn sequence(&self) -> Sequence {
        self.sequence
    }

    fn sequence_len(&self) -> usize {
        self.len
    }

    fn load(&self, id: FrameId) -> Result<DynamicImage, FrameError> {
        if !self.contains(id) {
            return Err(FrameError::OutOfRange(id));
        }
        let path = self.frame_path(id);
        image::open(&path).map_err(|e| FrameError::decode(path.display().to_string(), e.to_string()))
    }

    fn describe(&self, id: FrameId) -> String {
        self.frame_path(id).display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{solid_frame, write_frames};
    use tempfile::tempdir;

    #[test]
    fn opens_dense_directory() {
        let dir = tempdir().unwrap();
        write_frames(dir.path(), &[solid_frame(10), solid_frame(20), solid_frame(30)]);
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let store = DirFrameStore::open(dir.path(), Sequence::Original).unwrap();
        assert_eq!(store.sequence_len(), 3);
        assert_eq!(store.sequence(), Sequence::Original);

        let frame = store.load(FrameId::new(1)).unwrap();
        assert_eq!(frame.to_luma8().get_pixel(0, 0)[0], 20);
    }

    #[test]
    fn upper_case_extension_is_ignored() {
        let dir = tempdir().unwrap();
        write_frames(dir.path(), &[solid_frame(10), solid_frame(20)]);
        fs::write(dir.path().join("frame_000002.PNG"), b"not a frame").unwrap();

        let store = DirFrameStore::open(dir.path(), Sequence::Recorded).unwrap();
        assert_eq!(store.sequence_len(), 2);
    }

    #[test]
    fn missing_directory_is_reported() {
        let dir = tempdir().unwrap();
        let err = DirFrameStore::open(dir.path().join("nope"), Sequence::Recorded).unwrap_err();
        assert!(matches!(err, AlignError::MissingInput(_)));
    }

    #[test]
    fn rejects_bad_names() {
        let dir = tempdir().unwrap();
        write_frames(dir.path(), &[solid_frame(10)]);
        solid_frame(10).save(dir.path().join("frame_1.png")).unwrap();

        let err = DirFrameStore::open(dir.path(), Sequence::Original).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn rejects_numbering_gap() {
        let dir = tempdir().unwrap();
        solid_frame(10).save(dir.path().join("frame_000000.png")).unwrap();
        solid_frame(10).save(dir.path().join("frame_000002.png")).unwrap();

        let err = DirFrameStore::open(dir.path(), Sequence::Original).unwrap_err();
        assert!(err.to_string().contains("frame_000001.png"));
    }

    #[test]
    fn corrupt_file_is_a_decode_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("frame_000000.png"), b"not a png").unwrap();

        let store = DirFrameStore::open(dir.path(), Sequence::Recorded).unwrap();
        let err = store.load(FrameId::new(0)).unwrap_err();
        assert!(matches!(err, FrameError::Decode { .. }));

        let err = store.load(FrameId::new(5)).unwrap_err();
        assert!(matches!(err, FrameError::OutOfRange(_)));
    }
}
