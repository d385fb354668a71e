//! Keyframe match audit: `keyframe_matches.json` and `best_matches.csv`.

use std::fmt::Write as _;
use std::path::Path;

use super::{read_text, source_name, write_text};
use crate::error::{AlignError, AlignResult};
use crate::models::{FrameId, KeyframeMatch};

/// Header of the keyframe match table.
pub const BEST_MATCHES_HEADER: &str = "Original Frame,Matched Frame(s),Similarity Score,Frame Difference";

/// Write every match, including tie lists, as JSON.
pub fn write_keyframe_matches(path: &Path, matches: &[KeyframeMatch]) -> AlignResult<()> {
    let json = serde_json::to_string_pretty(matches).map_err(|e| AlignError::json(path, e))?;
    write_text(path, &json)
}

/// Read the JSON audit back.
pub fn read_keyframe_matches(path: &Path) -> AlignResult<Vec<KeyframeMatch>> {
    let content = read_text(path)?;
    serde_json::from_str(&content).map_err(|e| AlignError::malformed(source_name(path), e.to_string()))
}

/// Render the keyframe match table.
///
/// Rejected rows show `None` and `N/A`; tied candidates are joined by `; `.
pub fn render_best_matches(matches: &[KeyframeMatch]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", BEST_MATCHES_HEADER);
    for m in matches {
        let recorded = if m.is_accepted() {
            m.ties
                .iter()
                .map(FrameId::file_name)
                .collect::<Vec<_>>()
                .join("; ")
        } else {
            "None".to_string()
        };
        let _ = writeln!(
            out,
            "{},{},{:?},{}",
            m.original.file_name(),
            recorded,
            m.score,
            m.frame_offset_label()
        );
    }
    out
}

pub fn write_best_matches(path: &Path, matches: &[KeyframeMatch]) -> AlignResult<()> {
    write_text(path, &render_best_matches(matches))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> Vec<KeyframeMatch> {
        vec![
            KeyframeMatch::accepted(
                FrameId::new(10),
                FrameId::new(12),
                1.0,
                vec![FrameId::new(12), FrameId::new(15)],
            ),
            KeyframeMatch::rejected(FrameId::new(50), 0.25),
        ]
    }

    #[test]
    fn table_lists_ties_and_rejections() {
        let table = render_best_matches(&sample());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], BEST_MATCHES_HEADER);
        assert_eq!(lines[1], "frame_000010.png,frame_000012.png; frame_000015.png,1.0,2");
        assert_eq!(lines[2], "frame_000050.png,None,0.25,N/A");
    }

    #[test]
    fn audit_json_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("keyframe_matches.json");
        write_keyframe_matches(&path, &sample()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"frame_offset\": null"));
        assert_eq!(read_keyframe_matches(&path).unwrap(), sample());
    }
}
