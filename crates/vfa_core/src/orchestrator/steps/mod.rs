//! Pipeline step implementations.
//!
//! Each step is one stage of an alignment run and can also be run on its
//! own from the artifacts of the previous stage:
//!
//! - `DetectStep` - scene-change keyframes -> `keyframes.json`
//! - `MatchStep` - keyframe pairs -> `keyframe_matches.json`, `editable_matches.csv`
//! - `RefineStep` - per-frame correspondence -> `compare_results.csv`

mod detect;
mod match_keyframes;
mod refine;

pub use detect::DetectStep;
pub use match_keyframes::MatchStep;
pub use refine::RefineStep;
