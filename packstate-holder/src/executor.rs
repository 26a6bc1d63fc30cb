//! Executors for deferred listener dispatch.

use crate::listener::panic_message;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// A unit of deferred work.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Something that runs jobs off the committing thread.
pub trait Executor: Send + Sync + 'static {
    /// Submits a job.
    ///
    /// An `Err` means the job was refused. `Ok` means it was handed over,
    /// not that it will run; see the [`Handle`] impl.
    fn execute(&self, job: Job) -> anyhow::Result<()>;
}

/// Runs each job on the runtime's blocking pool.
///
/// Jobs may run concurrently and in any order. Submission always succeeds:
/// tokio cannot tell the caller that its runtime has shut down, so a job
/// submitted afterwards is discarded and a warning is logged instead.
impl Executor for Handle {
    fn execute(&self, job: Job) -> anyhow::Result<()> {
        let pending = Pending(Some(job));
        drop(self.spawn_blocking(move || pending.run()));
        Ok(())
    }
}

/// A job that warns if it is dropped without running.
struct Pending(Option<Job>);

impl Pending {
    fn run(mut self) {
        if let Some(job) = self.0.take() {
            job();
        }
    }
}

impl Drop for Pending {
    fn drop(&mut self) {
        if self.0.is_some() {
            warn!("Runtime shut down before a listener job ran; job discarded");
        }
    }
}

/// Runs jobs one at a time, in submission order, on a dedicated thread.
///
/// A panicking job is logged and the worker moves on to the next one. The
/// worker exits once the executor is dropped and the queue has drained.
pub struct SerialExecutor {
    sender: mpsc::UnboundedSender<Job>,
}

impl SerialExecutor {
    /// Starts the worker thread.
    pub fn new(name: impl Into<String>) -> io::Result<Self> {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();
        let name = name.into();
        thread::Builder::new().name(name.clone()).spawn(move || {
            while let Some(job) = receiver.blocking_recv() {
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
                    warn!("Job on {} panicked: {}", name, panic_message(payload.as_ref()));
                }
            }
            debug!("Serial executor {} stopped", name);
        })?;
        Ok(Self { sender })
    }
}

impl Executor for SerialExecutor {
    fn execute(&self, job: Job) -> anyhow::Result<()> {
        self.sender
            .send(job)
            .map_err(|_| anyhow::anyhow!("serial executor worker has stopped"))
    }
}
