//! Stream-ordered submission of conversion calls
//!
//! A [`Stream`] is an ordering token backed by one dispatcher thread. Work submitted to the
//! same stream runs in submission order; work on different streams runs concurrently with
//! no ordering between them. `submit` returns as soon as the work is enqueued, and results
//! are only observable through the explicit synchronization points [`Pending::wait`] and
//! [`Stream::synchronize`].
//!
//! ```ignore
//! let stream = Stream::new("ingest")?;
//! let ctx = ConvertContext::default();
//! let pending = stream.submit(move || to_integers(&input, &DataType::Int64, &ctx));
//! // ... enqueue more work ...
//! let column = pending.wait()?;
//! ```

use crate::{ConvertError, Result};
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Ordering token for asynchronous conversion work
#[derive(Debug)]
pub struct Stream {
    name: Arc<str>,
    sender: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl Stream {
    /// Start a stream with its own dispatcher thread
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name: Arc<str> = Arc::from(name.into());
        let (sender, receiver) = mpsc::channel::<Job>();

        let worker = thread::Builder::new()
            .name(format!("textconv-stream-{}", name))
            .spawn(move || {
                for job in receiver {
                    job();
                }
            })
            .map_err(|e| {
                ConvertError::execution(format!("failed to start stream {:?}: {}", name, e))
            })?;

        tracing::debug!(stream = %name, "started stream");
        Ok(Self {
            name,
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Enqueue `task` behind everything already submitted to this stream
    ///
    /// A task that panics resolves its [`Pending`] to an `Execution` error; the stream keeps
    /// running later work.
    pub fn submit<T, F>(&self, task: F) -> Pending<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let (result_tx, result_rx) = mpsc::sync_channel(1);
        let name = Arc::clone(&self.name);
        let job: Job = Box::new(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(task)).unwrap_or_else(|_| {
                tracing::debug!(stream = %name, "stream task panicked");
                Err(ConvertError::execution(format!(
                    "task on stream {:?} panicked",
                    name
                )))
            });
            // The caller may have dropped its Pending
            let _ = result_tx.send(outcome);
        });

        if let Some(sender) = &self.sender {
            // On failure the job (and its result sender) is dropped and `wait` reports it
            let _ = sender.send(job);
        }
        tracing::trace!(stream = %self.name, "submitted task");

        Pending {
            stream: Arc::clone(&self.name),
            receiver: result_rx,
        }
    }

    /// Block until every task submitted so far has finished
    pub fn synchronize(&self) -> Result<()> {
        self.submit(|| Ok(())).wait()
    }
}

impl Drop for Stream {
    fn drop(&mut self) {
        // Closing the channel lets the dispatcher drain queued work and exit
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::debug!(stream = %self.name, "stream dispatcher exited abnormally");
            }
        }
    }
}

/// Result of a submitted task, available once its stream has reached it
#[derive(Debug)]
pub struct Pending<T> {
    stream: Arc<str>,
    receiver: Receiver<Result<T>>,
}

impl<T> Pending<T> {
    /// Block until the task has run and return its result
    pub fn wait(self) -> Result<T> {
        self.receiver.recv().map_err(|_| self.disconnected())?
    }

    /// Return the result if the task has already run, without blocking
    ///
    /// A result is handed out once; later calls report the stream as disconnected.
    pub fn try_wait(&mut self) -> Option<Result<T>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(self.disconnected())),
        }
    }

    fn disconnected(&self) -> ConvertError {
        ConvertError::execution(format!(
            "stream {:?} dropped the task before it produced a result",
            self.stream
        ))
    }
}
