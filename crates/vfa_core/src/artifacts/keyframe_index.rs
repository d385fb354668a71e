//! `keyframes.json`: detected keyframes of both sequences.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{read_text, source_name, write_text};
use crate::error::{AlignError, AlignResult};
use crate::frames::FrameStore;
use crate::models::{parse_frame_name, FrameId};

/// On-disk layout: frame file names plus their counts.
#[derive(Debug, Serialize, Deserialize)]
struct KeyframeIndexFile {
    original_keyframes: Vec<String>,
    recorded_keyframes: Vec<String>,
    original_keyframe_count: usize,
    recorded_keyframe_count: usize,
}

/// Keyframes of the original and recorded sequences, ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyframeIndex {
    pub original: Vec<FrameId>,
    pub recorded: Vec<FrameId>,
}

impl KeyframeIndex {
    pub fn new(original: Vec<FrameId>, recorded: Vec<FrameId>) -> Self {
        Self { original, recorded }
    }

    /// Serialize to the JSON layout.
    pub fn to_json(&self) -> AlignResult<String> {
        let file = KeyframeIndexFile {
            original_keyframes: self.original.iter().map(FrameId::file_name).collect(),
            recorded_keyframes: self.recorded.iter().map(FrameId::file_name).collect(),
            original_keyframe_count: self.original.len(),
            recorded_keyframe_count: self.recorded.len(),
        };
        serde_json::to_string_pretty(&file).map_err(|e| AlignError::json("keyframes", e))
    }

    /// Parse and validate the JSON layout.
    ///
    /// Every name must be canonical, each list strictly increasing, and the
    /// counts must agree with the lists.
    pub fn from_json(source: &str, content: &str) -> AlignResult<Self> {
        let file: KeyframeIndexFile = serde_json::from_str(content)
            .map_err(|e| AlignError::malformed(source, e.to_string()))?;

        let original = parse_list(source, "original_keyframes", &file.original_keyframes)?;
        let recorded = parse_list(source, "recorded_keyframes", &file.recorded_keyframes)?;

        if file.original_keyframe_count != original.len() {
            return Err(AlignError::malformed(
                source,
                format!(
                    "original_keyframe_count is {} but {} keyframes are listed",
                    file.original_keyframe_count,
                    original.len()
                ),
            ));
        }
        if file.recorded_keyframe_count != recorded.len() {
            return Err(AlignError::malformed(
                source,
                format!(
                    "recorded_keyframe_count is {} but {} keyframes are listed",
                    file.recorded_keyframe_count,
                    recorded.len()
                ),
            ));
        }

        Ok(Self { original, recorded })
    }

    pub fn save(&self, path: &Path) -> AlignResult<()> {
        write_text(path, &self.to_json()?)
    }

    pub fn load(path: &Path) -> AlignResult<Self> {
        let content = read_text(path)?;
        Self::from_json(&source_name(path), &content)
    }

    /// Check that every keyframe exists in its store.
    pub fn validate_against(
        &self,
        original_store: &dyn FrameStore,
        recorded_store: &dyn FrameStore,
    ) -> AlignResult<()> {
        for (ids, store) in [(&self.original, original_store), (&self.recorded, recorded_store)] {
            if let Some(id) = ids.iter().find(|id| !store.contains(**id)) {
                return Err(AlignError::malformed(
                    "keyframes",
                    format!(
                        "{} keyframe {} is beyond the {} available frames",
                        store.sequence(),
                        id.file_name(),
                        store.sequence_len()
                    ),
                ));
            }
        }
        Ok(())
    }
}

fn parse_list(source: &str, field: &str, names: &[String]) -> AlignResult<Vec<FrameId>> {
    let mut ids: Vec<FrameId> = Vec::with_capacity(names.len());
    for name in names {
        let id = parse_frame_name(name)
            .map_err(|e| AlignError::malformed(source, format!("{}: {}", field, e)))?;
        if let Some(&previous) = ids.last() {
            if id <= previous {
                return Err(AlignError::malformed(
                    source,
                    format!("{}: {} does not follow {}", field, name, previous.file_name()),
                ));
            }
        }
        ids.push(id);
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::MemoryFrameStore;
    use crate::models::Sequence;
    use crate::test_support::solid_frame;
    use tempfile::tempdir;

    fn ids(raw: &[usize]) -> Vec<FrameId> {
        raw.iter().copied().map(FrameId::new).collect()
    }

    #[test]
    fn json_uses_file_names_and_counts() {
        let index = KeyframeIndex::new(ids(&[5, 40]), ids(&[7]));
        let json = index.to_json().unwrap();
        assert!(json.contains("\"original_keyframes\""));
        assert!(json.contains("\"frame_000040.png\""));
        assert!(json.contains("\"recorded_keyframe_count\": 1"));
    }

    #[test]
    fn save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("keyframes.json");
        let index = KeyframeIndex::new(ids(&[1, 2, 300]), Vec::new());
        index.save(&path).unwrap();
        assert_eq!(KeyframeIndex::load(&path).unwrap(), index);
    }

    #[test]
    fn rejects_count_mismatch() {
        let json = r#"{
            "original_keyframes": ["frame_000001.png"],
            "recorded_keyframes": [],
            "original_keyframe_count": 2,
            "recorded_keyframe_count": 0
        }"#;
        let err = KeyframeIndex::from_json("keyframes.json", json).unwrap_err();
        assert!(err.is_malformed());
        assert!(err.to_string().contains("original_keyframe_count"));
    }

    #[test]
    fn rejects_bad_names_and_order() {
        let bad_name = r#"{"original_keyframes": ["frame_1.png"], "recorded_keyframes": [],
            "original_keyframe_count": 1, "recorded_keyframe_count": 0}"#;
        assert!(KeyframeIndex::from_json("k", bad_name).unwrap_err().is_malformed());

        let unordered = r#"{"original_keyframes": ["frame_000009.png", "frame_000003.png"],
            "recorded_keyframes": [], "original_keyframe_count": 2, "recorded_keyframe_count": 0}"#;
        assert!(KeyframeIndex::from_json("k", unordered).unwrap_err().is_malformed());

        assert!(KeyframeIndex::from_json("k", "{}").unwrap_err().is_malformed());
    }

    #[test]
    fn validate_against_store_bounds() {
        let original = MemoryFrameStore::new(Sequence::Original, vec![solid_frame(0); 10]);
        let recorded = MemoryFrameStore::new(Sequence::Recorded, vec![solid_frame(0); 5]);

        assert!(KeyframeIndex::new(ids(&[9]), ids(&[4]))
            .validate_against(&original, &recorded)
            .is_ok());
        let err = KeyframeIndex::new(ids(&[9]), ids(&[5]))
            .validate_against(&original, &recorded)
            .unwrap_err();
        assert!(err.to_string().contains("frame_000005.png"));
    }
}
