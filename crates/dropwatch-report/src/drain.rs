//! One drain cycle: swap, merge, render, write, notify.

use crate::listener::{ListenerSet, LoggerEvent};
use crate::log_file::LogFile;
use dropwatch_core::{Capture, ComponentNames, FailureKind, Message, QueueSet, ERROR_CEILING};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

/// Outcome of one drain cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainSummary {
    /// Entries taken from the pending queues.
    pub drained: usize,
    /// Failures and performance warnings among them.
    pub errors: usize,
    /// Cumulative error count of the session after this cycle.
    pub error_total: usize,
    /// Bytes appended to the log file.
    pub bytes_written: usize,
}

/// Status flags the drain worker updates for monitoring code.
#[derive(Debug)]
pub struct SessionStatus {
    currently_failing: AtomicBool,
    last_error: AtomicU8,
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self {
            currently_failing: AtomicBool::new(false),
            last_error: AtomicU8::new(FailureKind::Empty.as_u8()),
        }
    }
}

impl SessionStatus {
    pub fn reset(&self) {
        self.currently_failing.store(false, Ordering::Relaxed);
        self.last_error
            .store(FailureKind::Empty.as_u8(), Ordering::Relaxed);
    }

    pub fn is_currently_failing(&self) -> bool {
        self.currently_failing.load(Ordering::Relaxed)
    }

    pub fn set_currently_failing(&self, failing: bool) {
        self.currently_failing.store(failing, Ordering::Relaxed);
    }

    pub fn last_error(&self) -> FailureKind {
        FailureKind::try_from(self.last_error.load(Ordering::Relaxed)).unwrap_or_default()
    }

    fn record_error(&self, kind: FailureKind) {
        self.last_error.store(kind.as_u8(), Ordering::Relaxed);
        self.currently_failing.store(true, Ordering::Relaxed);
    }
}

/// Everything a drain cycle reads from or writes to.
pub struct DrainContext {
    pub capture: Arc<Capture>,
    pub names: Arc<dyn ComponentNames>,
    pub listeners: ListenerSet,
    pub status: SessionStatus,
    pub log_file: Mutex<Option<LogFile>>,
}

impl DrainContext {
    pub fn new(capture: Arc<Capture>, names: Arc<dyn ComponentNames>) -> Self {
        Self {
            capture,
            names,
            listeners: ListenerSet::new(),
            status: SessionStatus::default(),
            log_file: Mutex::new(None),
        }
    }
}

/// Render `messages` into `out`, attaching the captured call context after
/// the first priority inversion that finds one.
pub fn render_window(
    messages: &[Message],
    names: &dyn ComponentNames,
    capture: &Capture,
    out: &mut String,
) {
    for message in messages {
        message.render(names, out);

        if message.wants_backtrace() {
            if let Some(context) = capture.take_inversion_context() {
                out.push_str("#### Stack back trace\n\n```\n");
                out.push_str(&context);
                if !context.ends_with('\n') {
                    out.push('\n');
                }
                out.push_str("```\n\n");
            }
        }
    }
}

/// Reusable buffers for drain cycles.
///
/// The spare queue set is what gets swapped into the pending queues, so it
/// keeps the same reserved capacity the render thread relies on.
pub struct Drainer {
    spare: QueueSet,
    merged: Vec<Message>,
    text: String,
}

impl Drainer {
    pub fn new(slots: usize) -> Self {
        Self {
            spare: QueueSet::with_capacity(slots),
            merged: Vec::with_capacity(slots),
            text: String::with_capacity(16 * 1024),
        }
    }

    /// Run one drain cycle against `ctx`.
    pub fn drain_window(&mut self, ctx: &DrainContext) -> DrainSummary {
        ctx.capture.pending().swap_out(&mut self.spare);
        let errors = self.spare.error_count();
        self.spare.merge_sorted_into(&mut self.merged);

        if self.merged.is_empty() {
            ctx.status.set_currently_failing(false);
            return DrainSummary {
                error_total: ctx.capture.error_count(),
                ..Default::default()
            };
        }

        self.text.clear();
        render_window(&self.merged, ctx.names.as_ref(), &ctx.capture, &mut self.text);

        let mut bytes_written = 0;
        if let Some(file) = ctx.log_file.lock().as_mut() {
            match file.append(&self.text) {
                Ok(()) => bytes_written = self.text.len(),
                Err(e) => tracing::warn!(
                    "Failed to write {} log entries to {}: {}",
                    self.merged.len(),
                    file.path().display(),
                    e
                ),
            }
        }

        let mut error_total = ctx.capture.error_count();
        if errors > 0 {
            ctx.listeners.notify(LoggerEvent::ErrorDetected);

            error_total = ctx.capture.add_drained_errors(errors);
            if let Some(kind) = self
                .merged
                .iter()
                .rev()
                .filter(|m| m.is_error())
                .find_map(Message::failure_kind)
            {
                ctx.status.record_error(kind);
            }

            if error_total >= ERROR_CEILING && error_total - errors < ERROR_CEILING {
                tracing::warn!(
                    "Error ceiling of {} reached, capture is now inactive",
                    ERROR_CEILING
                );
            }
        }

        let summary = DrainSummary {
            drained: self.merged.len(),
            errors,
            error_total,
            bytes_written,
        };
        tracing::debug!(
            "Drained {} entries ({} errors, {} bytes)",
            summary.drained,
            summary.errors,
            summary.bytes_written
        );

        self.merged.clear();
        summary
    }
}
