//! Full alignment runs over PNG frame directories.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, Rgb, RgbImage};
use tempfile::{tempdir, TempDir};

use vfa_core::artifacts::{read_report_json, KeyframeIndex};
use vfa_core::config::Settings;
use vfa_core::logging::RunLoggerBuilder;
use vfa_core::models::{FrameId, GapReason};
use vfa_core::orchestrator::{create_standard_pipeline, Context, PipelineStep, RefineStep, RunState};

fn solid(level: u8) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(24, 24, |_, _| Rgb([level, level, level])))
}

/// Write `(level, count)` scenes as consecutive canonical frames.
fn write_scenes(dir: &Path, scenes: &[(u8, usize)]) {
    fs::create_dir_all(dir).unwrap();
    let frames = scenes.iter().flat_map(|&(level, n)| std::iter::repeat(level).take(n));
    for (i, level) in frames.enumerate() {
        solid(level).save(dir.join(FrameId::new(i).file_name())).unwrap();
    }
}

struct Fixture {
    _dir: TempDir,
    ctx: Context,
}

fn fixture(original: &[(u8, usize)], recorded: &[(u8, usize)]) -> Fixture {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_scenes(&root.join("original"), original);
    write_scenes(&root.join("recorded"), recorded);

    let mut settings = Settings::default();
    settings.paths.original_frames = root.join("original").to_string_lossy().into_owned();
    settings.paths.recorded_frames = root.join("recorded").to_string_lossy().into_owned();
    settings.paths.output_folder = root.join("output").to_string_lossy().into_owned();
    settings.refinement.workers = 2;

    let logger = RunLoggerBuilder::new("e2e", root.join("logs")).build().unwrap();
    let ctx = Context::from_settings(settings, "e2e", Arc::new(logger)).unwrap();
    Fixture { _dir: dir, ctx }
}

#[test]
fn single_keyframe_leaves_everything_uncovered() {
    let scenes = [(30, 40), (200, 60)];
    let f = fixture(&scenes, &scenes);
    let mut state = RunState::new("single");

    let result = create_standard_pipeline().run(&f.ctx, &mut state).unwrap();
    assert!(result.all_completed());

    let index = KeyframeIndex::load(&f.ctx.artifacts.keyframes()).unwrap();
    assert_eq!(index.original, vec![FrameId::new(40)]);
    assert_eq!(index.recorded, vec![FrameId::new(40)]);

    let matching = state.matching.as_ref().unwrap();
    assert_eq!(matching.accepted, 1);
    assert_eq!(matching.matches[0].score, 1.0);

    let report = read_report_json(&f.ctx.artifacts.report_json()).unwrap();
    assert!(report.rows.is_empty());
    assert_eq!(report.summary().uncovered_frames, 100);
    let reasons: Vec<GapReason> = report.gaps.iter().map(|g| g.reason).collect();
    assert_eq!(
        reasons,
        vec![GapReason::BeforeFirstKeyframe, GapReason::AfterLastKeyframe]
    );

    let csv = fs::read_to_string(f.ctx.artifacts.compare_results()).unwrap();
    assert_eq!(csv.lines().count(), 1);
}

#[test]
fn offset_capture_is_aligned_frame_by_frame() {
    let original = [(30, 20), (120, 20), (220, 20)];
    let recorded = [(0, 5), (30, 20), (120, 20), (220, 20)];
    let f = fixture(&original, &recorded);
    let mut state = RunState::new("offset");

    create_standard_pipeline().run(&f.ctx, &mut state).unwrap();

    let matching = state.matching.as_ref().unwrap();
    let offsets: Vec<Option<i64>> = matching.matches.iter().map(|m| m.frame_offset).collect();
    assert_eq!(offsets, vec![Some(5), Some(5)]);

    let report = read_report_json(&f.ctx.artifacts.report_json()).unwrap();
    assert_eq!(report.rows.len(), 21);
    assert!(report.is_sorted());
    for row in &report.rows {
        assert_eq!(row.matched, Some(FrameId::new(row.original.index() + 5)));
        assert_eq!(row.score, 1.0);
    }
    assert_eq!(report.segments.len(), 1);
    assert_eq!(report.segments[0].ratio, 0.0);

    let csv = fs::read_to_string(f.ctx.artifacts.compare_results()).unwrap();
    assert!(csv.contains("frame_000030.png,frame_000035.png,1.0,0.0"));
    let best = fs::read_to_string(f.ctx.artifacts.best_matches()).unwrap();
    assert!(best.contains("frame_000020.png,frame_000025.png"));
}

#[test]
fn hand_edited_list_drives_refinement() {
    let original = [(30, 20), (120, 20), (220, 20)];
    let recorded = [(0, 5), (30, 20), (120, 20), (220, 20)];
    let f = fixture(&original, &recorded);
    create_standard_pipeline()
        .run(&f.ctx, &mut RunState::new("first"))
        .unwrap();

    // Reject the second keyframe pair by clearing its matched column
    fs::write(
        f.ctx.artifacts.editable_matches(),
        "Original Frame,Matched Frame\nframe_000020.png,frame_000025.png\nframe_000040.png,\n",
    )
    .unwrap();

    let mut state = RunState::new("edited");
    let step = RefineStep::new();
    step.validate_input(&f.ctx, &state).unwrap();
    step.execute(&f.ctx, &mut state).unwrap();

    let report = read_report_json(&f.ctx.artifacts.report_json()).unwrap();
    assert!(report.rows.is_empty());
    let gaps: Vec<(usize, usize, GapReason)> = report
        .gaps
        .iter()
        .map(|g| (g.start.index(), g.end.index(), g.reason))
        .collect();
    assert_eq!(
        gaps,
        vec![
            (0, 19, GapReason::BeforeFirstKeyframe),
            (20, 40, GapReason::RejectedEndpoint),
            (41, 59, GapReason::AfterLastKeyframe),
        ]
    );
}

#[test]
fn missing_frame_directory_fails_setup() {
    let dir = tempdir().unwrap();
    let mut settings = Settings::default();
    settings.paths.original_frames = dir.path().join("absent").to_string_lossy().into_owned();
    let logger = RunLoggerBuilder::new("e2e", dir.path().join("logs")).build().unwrap();

    assert!(Context::from_settings(settings, "e2e", Arc::new(logger)).is_err());
}
