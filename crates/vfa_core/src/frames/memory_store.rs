//! In-memory frame store.

use image::DynamicImage;

use super::FrameStore;
use crate::error::FrameError;
use crate::models::{FrameId, Sequence};

/// Frames held in memory.
///
/// A slot may be left empty to stand in for a frame that exists but cannot
/// be decoded.
#[derive(Debug, Clone)]
pub struct MemoryFrameStore {
    sequence: Sequence,
    frames: Vec<Option<DynamicImage>>,
}

impl MemoryFrameStore {
    /// Create a store from decoded frames.
    pub fn new(sequence: Sequence, frames: Vec<DynamicImage>) -> Self {
        Self {
            sequence,
            frames: frames.into_iter().map(Some).collect(),
        }
    }

    /// Create a store where `None` slots fail to decode.
    pub fn with_slots(sequence: Sequence, frames: Vec<Option<DynamicImage>>) -> Self {
        Self { sequence, frames }
    }

    /// Append a frame, returning its id.
    pub fn push(&mut self, frame: DynamicImage) -> FrameId {
        self.frames.push(Some(frame));
        FrameId::new(self.frames.len() - 1)
    }
}

impl FrameStore for MemoryFrameStore {
    fn sequence(&self) -> Sequence {
        self.sequence
    }

    fn sequence_len(&self) -> usize {
        self.frames.len()
    }

    fn load(&self, id: FrameId) -> Result<DynamicImage, FrameError> {
        match self.frames.get(id.index()) {
            Some(Some(frame)) => Ok(frame.clone()),
            Some(None) => Err(FrameError::decode(self.describe(id), "frame data unavailable")),
            None => Err(FrameError::OutOfRange(id)),
        }
    }
}
