use crate::common::IO_THREAD_PREFIX;
use crate::errors::{ErrorKind, OpsError, OpsResult};
use crate::IO_EXECUTOR;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A unit of blocking work handed to a [`BackgroundExecutor`].
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs blocking units of work off the calling thread.
///
/// Deferred operations are scheduled through this trait. Implementations
/// must not run the task on the caller's thread and must run every accepted
/// task exactly once.
pub trait BackgroundExecutor: Send + Sync {
    /// Accepts `task` for execution. An error means the task was rejected and
    /// will never run.
    fn execute(&self, task: Task) -> OpsResult<()>;
}

/// Unbounded executor for blocking IO: every task gets its own named thread.
#[derive(Default)]
pub struct IoExecutor {
    spawned: AtomicUsize,
}

impl IoExecutor {
    pub fn new() -> Self {
        IoExecutor {
            spawned: AtomicUsize::new(0),
        }
    }

    /// Number of tasks this executor has started so far.
    pub fn spawned(&self) -> usize {
        self.spawned.load(Ordering::Relaxed)
    }
}

impl BackgroundExecutor for IoExecutor {
    fn execute(&self, task: Task) -> OpsResult<()> {
        let n = self.spawned.fetch_add(1, Ordering::Relaxed);
        std::thread::Builder::new()
            .name(format!("{}-{}", IO_THREAD_PREFIX, n))
            .spawn(task)
            .map(|_| ())
            .map_err(|e| {
                log::error!("Failed to spawn background IO thread: {}", e);
                OpsError::new(
                    &format!("Failed to spawn background IO thread: {}", e),
                    ErrorKind::IOError,
                )
            })
    }
}

/// Returns the process-wide executor shared by every store that was not
/// configured with its own.
#[inline]
pub fn io_executor() -> Arc<dyn BackgroundExecutor> {
    IO_EXECUTOR.clone()
}
