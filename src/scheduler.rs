//! Render job scheduler: at most one render in flight per content key.
//!
//! A single coordinating thread owns the in-flight table and decides admission. Submissions
//! for a key that is already rendering join its waiter list; when the render finishes, every
//! waiter receives the same outcome. Renders run on a dedicated rayon pool.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

use smallvec::{SmallVec, smallvec};

use crate::foundation::core::ContentKey;
use crate::foundation::error::{MediaError, MediaResult};
use crate::model::frame::FrameSpec;

/// Work executed once per admitted key.
pub trait RenderJob: Send + Sync + 'static {
    /// Produce and publish the artifact for `key`.
    fn run(&self, key: &ContentKey, spec: &FrameSpec) -> MediaResult<()>;
}

type Outcome = Result<(), Arc<MediaError>>;

enum Message {
    Submit {
        key: ContentKey,
        spec: Arc<FrameSpec>,
        reply: Sender<Outcome>,
    },
    Done {
        key: ContentKey,
        outcome: Outcome,
    },
    Shutdown,
}

/// Completion handle for one submission.
#[must_use = "a ticket does nothing unless waited on"]
pub struct RenderTicket {
    key: ContentKey,
    rx: Receiver<Outcome>,
}

impl RenderTicket {
    /// Key this ticket waits for.
    pub fn key(&self) -> &ContentKey {
        &self.key
    }

    /// Block until the render for this key finishes.
    pub fn wait(self) -> MediaResult<()> {
        match self.rx.recv() {
            Ok(outcome) => outcome.map_err(MediaError::Shared),
            Err(_) => Err(MediaError::render(format!(
                "scheduler stopped before {} finished",
                self.key
            ))),
        }
    }

    /// Wait at most `timeout`; `None` means the render is still running.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<MediaResult<()>> {
        match self.rx.recv_timeout(timeout) {
            Ok(outcome) => Some(outcome.map_err(MediaError::Shared)),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(MediaError::render(format!(
                "scheduler stopped before {} finished",
                self.key
            )))),
        }
    }

    /// Stop waiting. The render itself keeps going and still publishes its artifact.
    pub fn cancel(self) {
        tracing::debug!(key = %self.key, "render wait cancelled");
    }
}

/// Deduplicating front door to a pool of render workers.
pub struct Scheduler {
    tx: Sender<Message>,
    coordinator: Option<JoinHandle<()>>,
}

impl Scheduler {
    /// Start the coordinating thread and a worker pool of `threads` (rayon default when `None`).
    pub fn start(job: Arc<dyn RenderJob>, threads: Option<usize>) -> MediaResult<Self> {
        let pool = build_thread_pool(threads)?;
        let (tx, rx) = mpsc::channel();
        let done = tx.clone();
        let coordinator = std::thread::Builder::new()
            .name("framesmith-scheduler".to_string())
            .spawn(move || coordinate(rx, done, pool, job))
            .map_err(|e| MediaError::render(format!("failed to start scheduler thread: {e}")))?;
        Ok(Self {
            tx,
            coordinator: Some(coordinator),
        })
    }

    /// Queue a render for `key`, joining an in-flight render of the same key if there is one.
    pub fn submit(&self, key: ContentKey, spec: FrameSpec) -> MediaResult<RenderTicket> {
        let (reply, rx) = mpsc::channel();
        self.tx
            .send(Message::Submit {
                key: key.clone(),
                spec: Arc::new(spec),
                reply,
            })
            .map_err(|_| MediaError::render("scheduler is not running"))?;
        Ok(RenderTicket { key, rx })
    }

    /// Submit and block until the render for `key` has finished.
    pub fn render(&self, key: ContentKey, spec: FrameSpec) -> MediaResult<()> {
        self.submit(key, spec)?.wait()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        let _ = self.tx.send(Message::Shutdown);
        if let Some(handle) = self.coordinator.take()
            && handle.join().is_err()
        {
            tracing::error!("scheduler thread panicked");
        }
    }
}

fn build_thread_pool(threads: Option<usize>) -> MediaResult<rayon::ThreadPool> {
    if threads == Some(0) {
        return Err(MediaError::validation(
            "worker_threads must be >= 1 when set",
        ));
    }
    let mut builder =
        rayon::ThreadPoolBuilder::new().thread_name(|i| format!("framesmith-render-{i}"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| MediaError::render(format!("failed to build rayon thread pool: {e}")))
}

fn coordinate(
    rx: Receiver<Message>,
    done: Sender<Message>,
    pool: rayon::ThreadPool,
    job: Arc<dyn RenderJob>,
) {
    let mut in_flight: HashMap<ContentKey, SmallVec<[Sender<Outcome>; 1]>> = HashMap::new();
    let mut stopping = false;

    while let Ok(msg) = rx.recv() {
        match msg {
            Message::Submit { key, spec, reply } => {
                if let Some(waiters) = in_flight.get_mut(&key) {
                    waiters.push(reply);
                    tracing::debug!(%key, waiters = waiters.len(), "joined in-flight render");
                    continue;
                }
                tracing::debug!(%key, in_flight = in_flight.len() + 1, "render admitted");
                in_flight.insert(key.clone(), smallvec![reply]);

                let job = job.clone();
                let done = done.clone();
                pool.spawn(move || {
                    let outcome = run_guarded(job.as_ref(), &key, &spec);
                    let _ = done.send(Message::Done { key, outcome });
                });
            }
            Message::Done { key, outcome } => {
                if let Err(e) = &outcome {
                    tracing::warn!(%key, error = %e, "render failed");
                }
                for waiter in in_flight.remove(&key).unwrap_or_default() {
                    let _ = waiter.send(outcome.clone());
                }
                if stopping && in_flight.is_empty() {
                    break;
                }
            }
            Message::Shutdown => {
                if in_flight.is_empty() {
                    break;
                }
                stopping = true;
            }
        }
    }
    tracing::debug!("scheduler stopped");
}

fn run_guarded(job: &dyn RenderJob, key: &ContentKey, spec: &FrameSpec) -> Outcome {
    match catch_unwind(AssertUnwindSafe(|| job.run(key, spec))) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(Arc::new(e)),
        Err(panic) => {
            let msg = panic
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(Arc::new(MediaError::render(format!(
                "render of {key} panicked: {msg}"
            ))))
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/scheduler.rs"]
mod tests;
