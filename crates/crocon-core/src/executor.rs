//! Single-threaded executor for native calls.
//!
//! The native execution context is only valid on the OS thread that created
//! it, so every call goes through one dedicated worker thread. The worker owns
//! the [`EngineHandle`] for its entire life and drains a FIFO job queue, one
//! job at a time.
//!
//! ```text
//! caller ──submit──▶ job queue ──▶ worker thread ──▶ native engine
//!   ▲                                   │
//!   └──────── private reply channel ◀───┘
//! ```
//!
//! Shutdown is signalled on a separate channel that the worker polls before
//! the queue, so jobs still queued when shutdown arrives are answered with
//! [`ConverterError::Closed`] instead of being run.

use std::sync::Arc;
use std::sync::mpsc as std_mpsc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crocon_common::{ConverterError, ExecutorConfig};

use crate::engine::{EngineHandle, NativeRuntime, NativeSession};
use crate::types::DataKind;

/// Reply delivered to the submitting caller.
pub type JobReply = Result<String, ConverterError>;

/// A unit of work for the worker thread.
struct Job {
    id: u64,
    kind: DataKind,
    request: Arc<str>,
    reply_tx: oneshot::Sender<JobReply>,
}

/// Handle to the worker thread.
pub struct Executor {
    job_tx: mpsc::UnboundedSender<Job>,
    shutdown_tx: Mutex<Option<oneshot::Sender<()>>>,
    thread: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
    job_seq: AtomicU64,
}

impl Executor {
    /// Start the worker thread and create the native execution context on it.
    ///
    /// Blocks until the context is ready or has failed to initialize.
    ///
    /// # Errors
    ///
    /// Returns [`ConverterError::Initialization`] if the thread cannot be
    /// spawned or the runtime fails to create its context.
    pub fn spawn<R: NativeRuntime>(
        runtime: R,
        config: &ExecutorConfig,
    ) -> Result<Self, ConverterError> {
        let (job_tx, job_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        // Plain std channel so startup can also be awaited from inside an async context.
        let (ready_tx, ready_rx) = std_mpsc::sync_channel(1);

        let thread = thread::Builder::new()
            .name(config.thread_name.clone())
            .stack_size(config.stack_size_bytes())
            .spawn(move || worker_main(runtime, job_rx, shutdown_rx, ready_tx))
            .map_err(|e| {
                ConverterError::initialization(format!("Failed to spawn executor thread: {e}"))
            })?;

        let startup = ready_rx.recv().unwrap_or_else(|_| {
            Err(ConverterError::initialization(
                "Executor thread exited during startup",
            ))
        });
        if let Err(e) = startup {
            if thread.join().is_err() {
                error!("Executor thread panicked during startup");
            }
            return Err(e);
        }

        info!(
            thread_name = %config.thread_name,
            stack_size_mb = config.stack_size_mb,
            "Executor started"
        );

        Ok(Self {
            job_tx,
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            thread: Mutex::new(Some(thread)),
            closed: AtomicBool::new(false),
            job_seq: AtomicU64::new(0),
        })
    }

    /// Queue a native call and return the channel its reply will arrive on.
    ///
    /// # Errors
    ///
    /// Returns [`ConverterError::Closed`] without touching the queue once
    /// shutdown has begun.
    pub fn submit(
        &self,
        kind: DataKind,
        request: Arc<str>,
    ) -> Result<oneshot::Receiver<JobReply>, ConverterError> {
        if self.is_closed() {
            return Err(ConverterError::Closed);
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        let job = Job {
            id: self.job_seq.fetch_add(1, Ordering::Relaxed),
            kind,
            request,
            reply_tx,
        };
        self.job_tx.send(job).map_err(|_| ConverterError::Closed)?;
        Ok(reply_rx)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Stop the worker and tear down the native context on its thread.
    ///
    /// Blocks until the worker has exited. Idempotent; concurrent callers all
    /// return only after teardown has finished.
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::Release);

        let mut thread = self.thread.lock();
        let Some(handle) = thread.take() else {
            return;
        };
        if let Some(shutdown_tx) = self.shutdown_tx.lock().take() {
            let _ = shutdown_tx.send(());
        }
        if handle.join().is_err() {
            error!("Executor thread panicked");
        }
        info!("Executor stopped");
    }
}

impl Drop for Executor {
    fn drop(&mut self) {
        if self.thread.get_mut().is_some() {
            warn!("Executor dropped without close, shutting down");
            self.shutdown();
        }
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("closed", &self.is_closed())
            .field("submitted", &self.job_seq.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Body of the worker thread.
fn worker_main<R: NativeRuntime>(
    runtime: R,
    mut job_rx: mpsc::UnboundedReceiver<Job>,
    mut shutdown_rx: oneshot::Receiver<()>,
    ready_tx: std_mpsc::SyncSender<Result<(), ConverterError>>,
) {
    // Current-thread runtime: the event loop never leaves this OS thread.
    let rt = match tokio::runtime::Builder::new_current_thread().build() {
        Ok(rt) => rt,
        Err(e) => {
            let _ = ready_tx.send(Err(ConverterError::initialization(format!(
                "Failed to build executor event loop: {e}"
            ))));
            return;
        }
    };

    let mut engine = match EngineHandle::open(runtime) {
        Ok(engine) => engine,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };
    let _ = ready_tx.send(Ok(()));

    rt.block_on(async {
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown_rx => break,
                job = job_rx.recv() => match job {
                    Some(job) => run_job(&mut engine, job),
                    None => break,
                },
            }
        }
    });

    job_rx.close();
    let mut abandoned = 0usize;
    while let Ok(job) = job_rx.try_recv() {
        let _ = job.reply_tx.send(Err(ConverterError::Closed));
        abandoned += 1;
    }
    if abandoned > 0 {
        warn!(abandoned, "Queued jobs rejected at shutdown");
    }

    engine.close();
    debug!(calls = engine.calls(), "Executor thread exiting");
}

fn run_job<S: NativeSession>(engine: &mut EngineHandle<S>, job: Job) {
    let start = Instant::now();
    let result = engine.invoke(job.kind, &job.request);
    let elapsed = start.elapsed();

    match &result {
        Ok(reply) => debug!(
            job_id = job.id,
            kind = %job.kind,
            duration_us = elapsed.as_micros(),
            reply_len = reply.len(),
            "Job completed"
        ),
        Err(e) => warn!(
            job_id = job.id,
            kind = %job.kind,
            duration_us = elapsed.as_micros(),
            error = %e,
            "Job failed"
        ),
    }

    if job.reply_tx.send(result).is_err() {
        debug!(job_id = job.id, "Caller stopped waiting before reply");
    }
}
