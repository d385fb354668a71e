//! Frame index newtype and the frame file naming convention.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AlignError, AlignResult};

/// Prefix of every frame file name.
pub const FRAME_PREFIX: &str = "frame_";

/// Extension of every frame file name.
pub const FRAME_EXTENSION: &str = "png";

/// Minimum number of digits in a frame file name.
pub const FRAME_INDEX_DIGITS: usize = 6;

/// Identifies a frame by its 0-based position within one sequence.
///
/// Indices are dense within a sequence. Serializes as a plain number;
/// use [`FrameId::file_name`] / [`FrameId::parse_file_name`] for the
/// on-disk `frame_000042.png` form.
///
/// # Examples
///
/// ```
/// use vfa_core::models::FrameId;
///
/// let id = FrameId::new(42);
/// assert_eq!(id.file_name(), "frame_000042.png");
/// assert_eq!(FrameId::parse_file_name("frame_000042.png").unwrap(), id);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct FrameId(usize);

impl FrameId {
    /// Create a frame id from a 0-based index.
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the underlying 0-based index.
    pub const fn index(&self) -> usize {
        self.0
    }

    /// Canonical file name, e.g. `frame_000042.png`.
    pub fn file_name(&self) -> String {
        format!(
            "{}{:0width$}.{}",
            FRAME_PREFIX,
            self.0,
            FRAME_EXTENSION,
            width = FRAME_INDEX_DIGITS
        )
    }

    /// Signed distance `other - self` in frames.
    pub fn offset_to(&self, other: FrameId) -> i64 {
        other.0 as i64 - self.0 as i64
    }

    /// Absolute distance between two frames.
    pub fn distance(&self, other: FrameId) -> usize {
        self.0.abs_diff(other.0)
    }

    /// Parse a canonical frame file name.
    ///
    /// Only the exact canonical form is accepted: `frame_1.png` and
    /// `frame_0000001.png` are rejected because they would not round-trip.
    pub fn parse_file_name(name: &str) -> AlignResult<Self> {
        let malformed = |reason: &str| {
            AlignError::malformed(
                "frame name",
                format!("'{}' {} (expected {}NNNNNN.{})", name, reason, FRAME_PREFIX, FRAME_EXTENSION),
            )
        };

        let stem = name
            .strip_prefix(FRAME_PREFIX)
            .ok_or_else(|| malformed("has no frame prefix"))?;
        let digits = stem
            .strip_suffix(&format!(".{}", FRAME_EXTENSION))
            .ok_or_else(|| malformed("has the wrong extension"))?;

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed("has a non-numeric index"));
        }

        let index: usize = digits
            .parse()
            .map_err(|_| malformed("has an index that does not fit"))?;
        let id = Self(index);

        if id.file_name() != name {
            return Err(malformed("is not zero-padded to six digits"));
        }
        Ok(id)
    }
}

/// Parse a canonical frame file name into its id.
pub fn parse_frame_name(name: &str) -> AlignResult<FrameId> {
    FrameId::parse_file_name(name)
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<usize> for FrameId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

/// Which of the two aligned sequences a frame belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sequence {
    /// The source content.
    Original,
    /// The re-captured playback.
    Recorded,
}

impl Sequence {
    /// Short label used in log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Sequence::Original => "original",
            Sequence::Recorded => "recorded",
        }
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_is_zero_padded() {
        assert_eq!(FrameId::new(0).file_name(), "frame_000000.png");
        assert_eq!(FrameId::new(123).file_name(), "frame_000123.png");
        assert_eq!(FrameId::new(1_234_567).file_name(), "frame_1234567.png");
    }

    #[test]
    fn parses_canonical_names() {
        assert_eq!(FrameId::parse_file_name("frame_000007.png").unwrap().index(), 7);
        assert_eq!(
            FrameId::parse_file_name("frame_1234567.png").unwrap().index(),
            1_234_567
        );
    }

    #[test]
    fn rejects_non_canonical_names() {
        for bad in [
            "frame_7.png",
            "frame_0000007.png",
            "frame_00000a.png",
            "frame_000007.jpg",
            "img_000007.png",
            "frame_.png",
            "frame_+00007.png",
        ] {
            let err = FrameId::parse_file_name(bad).unwrap_err();
            assert!(err.is_malformed(), "{} should be malformed", bad);
        }
    }

    #[test]
    fn offsets_are_signed() {
        let a = FrameId::new(500);
        assert_eq!(a.offset_to(FrameId::new(480)), -20);
        assert_eq!(a.offset_to(FrameId::new(530)), 30);
        assert_eq!(a.distance(FrameId::new(480)), 20);
    }

    #[test]
    fn serializes_as_number() {
        let json = serde_json::to_string(&FrameId::new(12)).unwrap();
        assert_eq!(json, "12");
    }
}
