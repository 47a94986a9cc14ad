//! Observer protocol for session state and detected errors.

use parking_lot::Mutex;
use std::sync::{Arc, Weak};

/// Callbacks run on the thread that changed the session (start/stop) or on
/// the drain worker (errors). All default to no-ops.
pub trait LoggerListener: Send + Sync {
    fn log_started(&self) {}

    fn log_ended(&self) {}

    /// At most once per drain window that contained failures or warnings.
    fn error_detected(&self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggerEvent {
    Started,
    Ended,
    ErrorDetected,
}

/// Weakly held listeners; dropped listeners are pruned on the next notify.
#[derive(Default)]
pub struct ListenerSet {
    listeners: Mutex<Vec<Weak<dyn LoggerListener>>>,
}

impl core::fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ListenerSet")
            .field("len", &self.len())
            .finish()
    }
}

/// Data pointer only: vtable pointers of the same object may differ.
fn same_listener(weak: &Weak<dyn LoggerListener>, listener: &Arc<dyn LoggerListener>) -> bool {
    Weak::as_ptr(weak) as *const () == Arc::as_ptr(listener) as *const ()
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener`; registering the same listener twice is a no-op.
    pub fn add(&self, listener: &Arc<dyn LoggerListener>) {
        let mut listeners = self.listeners.lock();
        if listeners.iter().any(|w| same_listener(w, listener)) {
            return;
        }
        listeners.push(Arc::downgrade(listener));
    }

    pub fn remove(&self, listener: &Arc<dyn LoggerListener>) {
        self.listeners.lock().retain(|w| !same_listener(w, listener));
    }

    /// Live listeners.
    pub fn len(&self) -> usize {
        self.listeners
            .lock()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `event` to every live listener.
    ///
    /// Callbacks run after the registry lock is released, so a listener may
    /// add or remove listeners from inside its callback.
    pub fn notify(&self, event: LoggerEvent) {
        let live: Vec<Arc<dyn LoggerListener>> = {
            let mut listeners = self.listeners.lock();
            listeners.retain(|w| w.strong_count() > 0);
            listeners.iter().filter_map(Weak::upgrade).collect()
        };

        for listener in live {
            match event {
                LoggerEvent::Started => listener.log_started(),
                LoggerEvent::Ended => listener.log_ended(),
                LoggerEvent::ErrorDetected => listener.error_detected(),
            }
        }
    }
}
