//! `editable_matches.csv`: the canonical keyframe correspondence list.
//!
//! Two columns, `Original Frame,Matched Frame`; the matched column is empty
//! for rejected keyframes. The file may be edited by hand before
//! refinement, so reading is strict and fails on the first bad row.

use std::fmt::Write as _;
use std::path::Path;

use super::{read_text, source_name, write_text};
use crate::error::{AlignError, AlignResult};
use crate::frames::FrameStore;
use crate::models::{parse_frame_name, CorrespondenceEntry, FrameId};

/// Header of the editable list.
pub const EDITABLE_HEADER: [&str; 2] = ["Original Frame", "Matched Frame"];

/// Render entries as CSV.
pub fn render_editable(entries: &[CorrespondenceEntry]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", EDITABLE_HEADER.join(","));
    for entry in entries {
        let recorded = entry.recorded.map(|r| r.file_name()).unwrap_or_default();
        let _ = writeln!(out, "{},{}", entry.original.file_name(), recorded);
    }
    out
}

pub fn write_editable(path: &Path, entries: &[CorrespondenceEntry]) -> AlignResult<()> {
    write_text(path, &render_editable(entries))
}

/// Read and validate the editable list against both stores.
pub fn read_editable(
    path: &Path,
    original_store: &dyn FrameStore,
    recorded_store: &dyn FrameStore,
) -> AlignResult<Vec<CorrespondenceEntry>> {
    let content = read_text(path)?;
    let entries = parse_editable(&source_name(path), &content, original_store, recorded_store)?;
    tracing::info!(
        "Loaded {} correspondence entries ({} matched) from {}",
        entries.len(),
        entries.iter().filter(|e| e.recorded.is_some()).count(),
        path.display()
    );
    Ok(entries)
}

/// Parse editable CSV content.
///
/// Rows must have exactly two columns, canonical frame names, strictly
/// increasing original frames, and ids that exist in their stores. Blank
/// lines are ignored.
pub fn parse_editable(
    source: &str,
    content: &str,
    original_store: &dyn FrameStore,
    recorded_store: &dyn FrameStore,
) -> AlignResult<Vec<CorrespondenceEntry>> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| !line.trim().is_empty());

    let Some((_, header)) = lines.next() else {
        return Err(AlignError::malformed(source, "file is empty"));
    };
    if split_row(header) != EDITABLE_HEADER {
        return Err(AlignError::malformed(
            source,
            format!("expected header '{}', found '{}'", EDITABLE_HEADER.join(","), header),
        ));
    }

    let mut entries: Vec<CorrespondenceEntry> = Vec::new();
    for (line_no, line) in lines {
        let fields = split_row(line);
        let row_error = |message: String| AlignError::malformed(source, format!("line {}: {}", line_no, message));

        if fields.len() != 2 {
            return Err(row_error(format!("expected 2 columns, found {}", fields.len())));
        }

        let original = parse_frame_name(fields[0]).map_err(|e| row_error(e.to_string()))?;
        let recorded = if fields[1].is_empty() {
            None
        } else {
            Some(parse_frame_name(fields[1]).map_err(|e| row_error(e.to_string()))?)
        };

        if let Some(previous) = entries.last() {
            if original <= previous.original {
                return Err(row_error(format!(
                    "{} does not follow {}",
                    original.file_name(),
                    previous.original.file_name()
                )));
            }
        }
        check_exists(original, original_store).map_err(row_error)?;
        if let Some(recorded) = recorded {
            check_exists(recorded, recorded_store).map_err(row_error)?;
        }

        entries.push(CorrespondenceEntry::new(original, recorded));
    }

    Ok(entries)
}

/// Split a row on commas, trimming whitespace and surrounding quotes.
fn split_row(line: &str) -> Vec<&str> {
    line.split(',')
        .map(|field| {
            let field = field.trim();
            field
                .strip_prefix('"')
                .and_then(|f| f.strip_suffix('"'))
                .unwrap_or(field)
        })
        .collect()
}

fn check_exists(id: FrameId, store: &dyn FrameStore) -> Result<(), String> {
    if store.contains(id) {
        Ok(())
    } else {
        Err(format!(
            "{} does not exist in the {} sequence ({} frames)",
            id.file_name(),
            store.sequence(),
            store.sequence_len()
        ))
    }
}
