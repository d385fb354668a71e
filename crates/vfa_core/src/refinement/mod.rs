//! Per-frame refinement inside matched keyframe segments.
//!
//! Between two consecutive accepted keyframe pairs, every original frame is
//! mapped proportionally onto the recorded range and compared with the few
//! recorded frames around that implied index. Frames are independent tasks
//! run by a [`TaskExecutor`]; results are sorted by original index so the
//! report does not depend on completion order.

mod executor;
mod refiner;
mod task;

pub use executor::{run_isolated, RayonExecutor, SequentialExecutor, TaskExecutor, TaskFn};
pub use refiner::{RefinementConfig, RefinementOutcome, SegmentRefiner};
pub use task::{candidate_order, implied_index, refine_frame, FrameTask};
