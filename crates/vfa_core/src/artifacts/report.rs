//! Alignment report: `compare_results.csv` and `alignment_report.json`.

use std::fmt::Write as _;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{read_text, source_name, write_text, ArtifactPaths};
use crate::error::{AlignError, AlignResult};
use crate::models::{
    AlignmentReport, CoverageGap, FrameCorrespondence, FrameId, ReportSummary, SegmentSummary,
};

/// Header of the per-frame comparison table.
pub const REPORT_HEADER: &str = "Original Frame,Matched Frame,Similarity Score,Difference to 1.0";

/// JSON form of the report with its summary statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub summary: ReportSummary,
    pub rows: Vec<FrameCorrespondence>,
    pub segments: Vec<SegmentSummary>,
    pub gaps: Vec<CoverageGap>,
}

impl From<&AlignmentReport> for ReportDocument {
    fn from(report: &AlignmentReport) -> Self {
        Self {
            summary: report.summary(),
            rows: report.rows.clone(),
            segments: report.segments.clone(),
            gaps: report.gaps.clone(),
        }
    }
}

impl From<ReportDocument> for AlignmentReport {
    fn from(doc: ReportDocument) -> Self {
        Self {
            rows: doc.rows,
            segments: doc.segments,
            gaps: doc.gaps,
        }
    }
}

/// Render the per-frame table; unmatched rows leave the matched column empty.
pub fn render_report_csv(report: &AlignmentReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", REPORT_HEADER);
    for row in &report.rows {
        let matched = row.matched.as_ref().map(FrameId::file_name).unwrap_or_default();
        let _ = writeln!(
            out,
            "{},{},{:?},{:?}",
            row.original.file_name(),
            matched,
            row.score,
            row.difference
        );
    }
    out
}

/// Write both report files into the output folder.
pub fn write_report(paths: &ArtifactPaths, report: &AlignmentReport) -> AlignResult<()> {
    write_text(&paths.compare_results(), &render_report_csv(report))?;

    let json_path = paths.report_json();
    let json = serde_json::to_string_pretty(&ReportDocument::from(report))
        .map_err(|e| AlignError::json(&json_path, e))?;
    write_text(&json_path, &json)
}

/// Read a report back from its JSON form.
pub fn read_report_json(path: &Path) -> AlignResult<AlignmentReport> {
    let content = read_text(path)?;
    let doc: ReportDocument = serde_json::from_str(&content)
        .map_err(|e| AlignError::malformed(source_name(path), e.to_string()))?;
    Ok(doc.into())
}
