//! Background drain thread.

use crate::drain::{DrainContext, DrainSummary, Drainer};
use crate::error::{Error, Result};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;
use thread_priority::ThreadPriority;

/// Commands sent to the drain thread.
#[derive(Debug)]
pub enum DrainCommand {
    /// Drain now, optionally replying with the summary.
    Drain(Option<Sender<DrainSummary>>),
    Shutdown,
}

/// Cloneable handle for requesting drains without owning the thread.
#[derive(Debug, Clone)]
pub struct DrainHandle {
    command_tx: Sender<DrainCommand>,
    worker: Option<ThreadId>,
}

impl DrainHandle {
    /// Run one drain cycle on the worker and wait for it to finish.
    ///
    /// Returns `None` if the worker shut down before replying, or when
    /// called from the worker itself (a listener cannot wait on its own
    /// drain cycle).
    pub fn drain_now(&self) -> Option<DrainSummary> {
        if self.worker == Some(thread::current().id()) {
            return None;
        }
        let (reply_tx, reply_rx) = bounded(1);
        self.command_tx
            .send(DrainCommand::Drain(Some(reply_tx)))
            .ok()?;
        reply_rx.recv().ok()
    }
}

/// Worker thread that drains the pending queues every `interval`.
pub struct DrainThread {
    command_tx: Sender<DrainCommand>,
    thread_handle: Option<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl DrainThread {
    pub fn spawn(ctx: Arc<DrainContext>, interval: Duration, slots: usize) -> Result<Self> {
        let (tx, rx) = bounded(16);
        let shutdown = Arc::new(AtomicBool::new(false));
        let thread_shutdown = Arc::clone(&shutdown);

        let handle = thread::Builder::new()
            .name("dropwatch-drain".into())
            .spawn(move || {
                let _ = thread_priority::set_current_thread_priority(ThreadPriority::Min);
                drain_loop(rx, ctx, interval, Drainer::new(slots), thread_shutdown);
            })
            .map_err(Error::WorkerSpawn)?;

        Ok(Self {
            command_tx: tx,
            thread_handle: Some(handle),
            shutdown,
        })
    }

    pub fn handle(&self) -> DrainHandle {
        DrainHandle {
            command_tx: self.command_tx.clone(),
            worker: self.thread_handle.as_ref().map(|h| h.thread().id()),
        }
    }

    pub fn is_running(&self) -> bool {
        self.thread_handle.is_some()
    }

    /// Stop the thread and wait for the cycle in progress to finish.
    ///
    /// Called from the worker itself (a listener releasing the last
    /// reference to its logger), the thread is detached instead and exits
    /// once the current cycle returns.
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        let _ = self.command_tx.try_send(DrainCommand::Shutdown);

        if let Some(handle) = self.thread_handle.take() {
            if handle.thread().id() == thread::current().id() {
                tracing::debug!("Drain worker stopped from its own thread, detaching");
                return;
            }
            if handle.join().is_err() {
                tracing::warn!("Drain worker panicked");
            }
        }
    }
}

impl Drop for DrainThread {
    fn drop(&mut self) {
        self.stop();
    }
}

fn drain_loop(
    rx: Receiver<DrainCommand>,
    ctx: Arc<DrainContext>,
    interval: Duration,
    mut drainer: Drainer,
    shutdown: Arc<AtomicBool>,
) {
    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        match rx.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {
                drainer.drain_window(&ctx);
            }
            Ok(DrainCommand::Drain(reply)) => {
                let summary = drainer.drain_window(&ctx);
                if let Some(reply) = reply {
                    let _ = reply.send(summary);
                }
            }
            Ok(DrainCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}
