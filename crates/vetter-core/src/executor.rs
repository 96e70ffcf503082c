//! Where remote calls run.
//!
//! The session and cache live on one thread. Remote calls are handed to an
//! [`Executor`] and report back through an [`Inbox`], which the owning thread
//! drains on its own schedule. Production uses [`ThreadExecutor`]; tests use
//! [`InlineExecutor`], which runs the job immediately but still delivers the
//! result through the inbox, so "pending" stays observable until drained.
//!
//! A job the executor refuses still produces a completion: [`Inbox::dispatch`]
//! takes a fallback that turns the scheduling error into a result, so the
//! owner never waits on work that will not run.

use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

pub type Job = Box<dyn FnOnce() + Send + 'static>;

pub trait Executor: Send + Sync {
    /// Schedule `job`. On error the job has been dropped without running.
    fn execute(&self, job: Job) -> io::Result<()>;
}

/// Runs every job on a fresh named OS thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadExecutor;

impl Executor for ThreadExecutor {
    fn execute(&self, job: Job) -> io::Result<()> {
        std::thread::Builder::new()
            .name("vetter-remote".to_string())
            .spawn(job)
            .map(drop)
    }
}

/// Runs every job synchronously on the caller's thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn execute(&self, job: Job) -> io::Result<()> {
        job();
        Ok(())
    }
}

/// Completion channel with an outstanding-job count.
///
/// `outstanding` is only touched by the owning thread: incremented when a job
/// is dispatched, decremented when its completion is received.
pub struct Inbox<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
    outstanding: usize,
}

impl<T: Send + 'static> Inbox<T> {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx,
            outstanding: 0,
        }
    }

    /// Run `work` on `executor` and route its result back to this inbox.
    ///
    /// If the executor refuses the job, `refused` builds the completion
    /// instead, so every dispatch yields exactly one result.
    pub fn dispatch<F, R>(&mut self, executor: &dyn Executor, work: F, refused: R)
    where
        F: FnOnce() -> T + Send + 'static,
        R: FnOnce(io::Error) -> T,
    {
        let tx = self.tx.clone();
        self.outstanding += 1;
        let scheduled = executor.execute(Box::new(move || {
            // The receiver only disappears when the owner is dropped.
            let _ = tx.send(work());
        }));
        if let Err(err) = scheduled {
            tracing::error!("failed to schedule remote call: {err}");
            let _ = self.tx.send(refused(err));
        }
    }

    /// Number of dispatched jobs whose result has not been received yet.
    #[must_use]
    pub const fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Take every completion that is already available.
    pub fn drain(&mut self) -> Vec<T> {
        let mut out = Vec::new();
        while let Ok(value) = self.rx.try_recv() {
            out.push(value);
        }
        self.outstanding = self.outstanding.saturating_sub(out.len());
        out
    }

    /// Wait up to `timeout` for the next completion.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<T> {
        match self.rx.recv_timeout(timeout) {
            Ok(value) => {
                self.outstanding = self.outstanding.saturating_sub(1);
                Some(value)
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Block until every outstanding job has completed or `timeout` elapses.
    pub fn wait_all(&mut self, timeout: Duration) -> Vec<T> {
        let deadline = Instant::now() + timeout;
        let mut out = self.drain();
        while self.outstanding > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match self.recv_timeout(remaining) {
                Some(value) => out.push(value),
                None => break,
            }
        }
        out
    }
}

impl<T: Send + 'static> Default for Inbox<T> {
    fn default() -> Self {
        Self::new()
    }
}
