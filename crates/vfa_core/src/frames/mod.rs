//! Read-only access to a sequence of numbered frame images.
//!
//! Two backends:
//! - [`DirFrameStore`]: a directory of `frame_NNNNNN.png` files, decoded lazily
//! - [`MemoryFrameStore`]: frames held in memory
//!
//! # Usage
//!
//! ```ignore
//! use vfa_core::frames::{DirFrameStore, FrameStore};
//! use vfa_core::models::{FrameId, Sequence};
//!
//! let store = DirFrameStore::open("frames/original_frames", Sequence::Original)?;
//! let frame = store.load(FrameId::new(0))?;
//! ```

mod dir_store;
mod memory_store;

use image::DynamicImage;

pub use dir_store::DirFrameStore;
pub use memory_store::MemoryFrameStore;

use crate::error::FrameError;
use crate::models::{FrameId, Sequence};

/// Trait for frame stores.
///
/// Stores are immutable once opened, so they can be shared across worker
/// threads without locking.
pub trait FrameStore: Send + Sync {
    /// Which sequence this store holds.
    fn sequence(&self) -> Sequence;

    /// Number of frames; valid ids are `0..sequence_len()`.
    fn sequence_len(&self) -> usize;

    /// Decode a frame.
    fn load(&self, id: FrameId) -> Result<DynamicImage, FrameError>;

    /// Human-readable location of a frame for log lines.
    fn describe(&self, id: FrameId) -> String {
        format!("{} {}", self.sequence(), id.file_name())
    }

    /// Whether the id lies inside the sequence.
    fn contains(&self, id: FrameId) -> bool {
        id.index() < self.sequence_len()
    }

    /// Whether the store holds no frames.
    fn is_empty(&self) -> bool {
        self.sequence_len() == 0
    }

    /// All frame ids in ascending order.
    fn frame_ids(&self) -> Box<dyn Iterator<Item = FrameId> + '_> {
        Box::new((0..self.sequence_len()).map(FrameId::new))
    }
}
