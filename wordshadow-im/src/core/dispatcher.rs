//! Serialized task dispatcher
//!
//! A single named worker thread owns some state and runs submitted tasks
//! against it one at a time, in submission order. Callers get a
//! [`PendingQuery`] back immediately and decide for themselves how long to
//! wait for it; giving up never cancels the task.

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, warn};

/// What a task is for. Used in logs only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    StartInput,
    FinishInput,
    Typing,
    ExplicitPick,
    Snapshot,
    Release,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    #[error("task did not finish within {0:?}")]
    TimedOut(Duration),
    #[error("dispatcher worker is gone")]
    WorkerGone,
}

type Job<S> = Box<dyn FnOnce(&mut S) + Send>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Single-writer FIFO executor over state `S`.
pub struct SerializedDispatcher<S> {
    tx: Mutex<Option<mpsc::Sender<Job<S>>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    next_id: AtomicU64,
}

impl<S: Send + 'static> SerializedDispatcher<S> {
    /// Move `state` onto a new worker thread called `name`.
    pub fn spawn(name: &str, state: S) -> io::Result<Self> {
        let (tx, rx) = mpsc::channel::<Job<S>>();
        let worker = thread::Builder::new().name(name.into()).spawn(move || {
            let mut state = state;
            for job in rx {
                job(&mut state);
            }
            debug!("dispatcher queue closed, worker exiting");
        })?;

        Ok(Self {
            tx: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
            next_id: AtomicU64::new(0),
        })
    }

    /// Queue `task` behind everything submitted so far.
    ///
    /// An error returned by the task, or a panic inside it, is logged and
    /// resolves the query with `T::default()`.
    pub fn submit<T, F>(&self, kind: TaskKind, task: F) -> PendingQuery<T>
    where
        T: Default + Send + 'static,
        F: FnOnce(&mut S) -> anyhow::Result<T> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let (result_tx, result_rx) = mpsc::sync_channel(1);

        let job: Job<S> = Box::new(move |state: &mut S| {
            let started = Instant::now();
            let value = match panic::catch_unwind(AssertUnwindSafe(|| task(state))) {
                Ok(Ok(value)) => value,
                Ok(Err(e)) => {
                    warn!(id, ?kind, "task failed: {:#}", e);
                    T::default()
                }
                Err(payload) => {
                    error!(id, ?kind, "task panicked: {}", panic_message(payload.as_ref()));
                    T::default()
                }
            };
            debug!(id, ?kind, elapsed_us = started.elapsed().as_micros() as u64, "task done");
            if result_tx.send(value).is_err() {
                debug!(id, ?kind, "caller no longer waiting");
            }
        });

        let queued = match lock(&self.tx).as_ref() {
            Some(tx) => tx.send(job).is_ok(),
            None => false,
        };
        if !queued {
            warn!(id, ?kind, "task submitted after shutdown");
        }

        PendingQuery {
            id,
            kind,
            rx: result_rx,
        }
    }
}

impl<S> SerializedDispatcher<S> {
    /// Close the queue, let queued tasks finish, and join the worker.
    pub fn shutdown(&self) {
        drop(lock(&self.tx).take());
        if let Some(worker) = lock(&self.worker).take()
            && worker.join().is_err()
        {
            error!("dispatcher worker panicked");
        }
    }

    pub fn is_shut_down(&self) -> bool {
        lock(&self.tx).is_none()
    }
}

impl<S> Drop for SerializedDispatcher<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// The eventual result of one submitted task.
#[derive(Debug)]
pub struct PendingQuery<T> {
    id: u64,
    kind: TaskKind,
    rx: mpsc::Receiver<T>,
}

impl<T> PendingQuery<T> {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Block the calling thread for at most `timeout`.
    pub fn wait(self, timeout: Duration) -> Result<T, DispatchError> {
        match self.rx.recv_timeout(timeout) {
            Ok(value) => Ok(value),
            Err(RecvTimeoutError::Timeout) => Err(DispatchError::TimedOut(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(DispatchError::WorkerGone),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
