//! Worker pools for refinement tasks.
//!
//! An executor fans a batch of [`FrameTask`]s out over a task function and
//! returns one result per task. Each task runs under `catch_unwind`, so a
//! panic costs only its own frame.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use super::task::FrameTask;
use crate::error::TaskError;
use crate::models::FrameCorrespondence;

/// Function applied to every task.
pub type TaskFn<'a> = dyn Fn(&FrameTask) -> FrameCorrespondence + Sync + 'a;

/// Trait for task execution substrates.
///
/// Results may be returned in any order; callers sort them.
pub trait TaskExecutor: Send + Sync {
    /// Get the name of this executor.
    fn name(&self) -> &'static str;

    /// Number of tasks that may run at once.
    fn parallelism(&self) -> usize;

    /// Run every task.
    fn execute(
        &self,
        tasks: &[FrameTask],
        work: &TaskFn<'_>,
    ) -> Vec<Result<FrameCorrespondence, TaskError>>;
}

/// Run one task, converting a panic into [`TaskError::WorkerPanic`].
pub fn run_isolated(
    task: &FrameTask,
    work: &TaskFn<'_>,
) -> Result<FrameCorrespondence, TaskError> {
    panic::catch_unwind(AssertUnwindSafe(|| work(task))).map_err(|payload| {
        TaskError::WorkerPanic {
            frame: task.original,
            message: panic_message(payload.as_ref()),
        }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Runs tasks on a dedicated rayon thread pool.
pub struct RayonExecutor {
    pool: ThreadPool,
}

impl RayonExecutor {
    /// Build a pool with `workers` threads (0 = one per available CPU).
    pub fn new(workers: usize) -> Result<Self, TaskError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("vfa-refine-{}", i))
            .build()?;
        tracing::debug!("Refinement pool started with {} threads", pool.current_num_threads());
        Ok(Self { pool })
    }
}

impl TaskExecutor for RayonExecutor {
    fn name(&self) -> &'static str {
        "rayon"
    }

    fn parallelism(&self) -> usize {
        self.pool.current_num_threads()
    }

    fn execute(
        &self,
        tasks: &[FrameTask],
        work: &TaskFn<'_>,
    ) -> Vec<Result<FrameCorrespondence, TaskError>> {
        self.pool
            .install(|| tasks.par_iter().map(|task| run_isolated(task, work)).collect())
    }
}

/// Runs tasks one after another on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialExecutor;

impl TaskExecutor for SequentialExecutor {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn parallelism(&self) -> usize {
        1
    }

    fn execute(
        &self,
        tasks: &[FrameTask],
        work: &TaskFn<'_>,
    ) -> Vec<Result<FrameCorrespondence, TaskError>> {
        tasks.iter().map(|task| run_isolated(task, work)).collect()
    }
}
