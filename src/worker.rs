use crate::error::ConfigError;
use log::debug;
use std::any::Any;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread;

/// Threads shared by every command of a session.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
}

impl WorkerPool {
    /// A pool of `worker_count` threads, or as many as the machine offers.
    pub fn new(worker_count: Option<usize>) -> Result<Self, ConfigError> {
        let size = worker_count
            .filter(|count| *count > 0)
            .or_else(|| thread::available_parallelism().ok().map(usize::from))
            .unwrap_or(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(size)
            .thread_name(|index| format!("novella-worker-{index}"))
            .build()
            .map_err(|err| ConfigError::WorkerPool {
                message: err.to_string(),
            })?;
        debug!("Created worker pool with {} thread(s)", size);
        Ok(WorkerPool { pool })
    }

    pub fn size(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Runs `task` on some worker. A panic inside the task comes back as a [`TaskFailure`]
    /// from [`Pending::wait`].
    pub fn submit<T, F>(&self, task: F) -> Pending<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (sender, receiver) = mpsc::sync_channel(1);
        self.pool.spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(task)).map_err(|payload| TaskFailure {
                message: panic_message(payload.as_ref()),
            });
            // The receiver may be gone already, nobody is left to tell.
            let _ = sender.send(outcome);
        });
        Pending { receiver }
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool").field("size", &self.size()).finish()
    }
}

/// Result of a submitted task, to be waited for.
#[derive(Debug)]
pub struct Pending<T> {
    receiver: mpsc::Receiver<Result<T, TaskFailure>>,
}

impl<T> Pending<T> {
    pub fn wait(self) -> Result<T, TaskFailure> {
        self.receiver.recv().unwrap_or_else(|_| {
            Err(TaskFailure {
                message: "task ended without a result".to_string(),
            })
        })
    }
}

/// A task that panicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    pub message: String,
}

impl Display for TaskFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
