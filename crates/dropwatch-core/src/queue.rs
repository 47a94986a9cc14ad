//! Pending entry queues shared between the render thread and the drain worker.
//!
//! Two locks: one for every kind except free text, one for free text only.
//! The sequence index is taken while holding the lock the entry is pushed
//! under, and reset while holding both, so indices within one drain window
//! are unique and increasing.
//!
//! The drain worker swaps the pending vectors with its own pre-reserved ones,
//! so steady-state pushes never reallocate.

use crate::attribution::Identifier;
use crate::message::{Message, MessageKind};
use core::sync::atomic::{AtomicU32, Ordering};
use parking_lot::Mutex;

/// Default reserved slots per entry kind.
pub const MESSAGE_SLOTS: usize = 512;

/// Reserved slots for audio setting changes (rare by nature).
pub const AUDIO_CHANGE_SLOTS: usize = 16;

/// Which pending collection an entry goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Failure,
    Event,
    PerformanceWarning,
    AudioSettingChange,
    ParameterChange,
    Text,
}

/// One set of per-kind vectors.
#[derive(Debug, Default)]
pub struct QueueSet {
    pub warnings: Vec<Message>,
    pub events: Vec<Message>,
    pub failures: Vec<Message>,
    pub text: Vec<Message>,
    pub audio_changes: Vec<Message>,
    pub parameter_changes: Vec<Message>,
}

impl QueueSet {
    pub fn with_capacity(slots: usize) -> Self {
        Self {
            warnings: Vec::with_capacity(slots),
            events: Vec::with_capacity(slots),
            failures: Vec::with_capacity(slots),
            text: Vec::with_capacity(slots),
            audio_changes: Vec::with_capacity(AUDIO_CHANGE_SLOTS),
            parameter_changes: Vec::with_capacity(slots),
        }
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
            + self.events.len()
            + self.failures.len()
            + self.text.len()
            + self.audio_changes.len()
            + self.parameter_changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of entries counting towards the error ceiling.
    pub fn error_count(&self) -> usize {
        self.failures.len() + self.warnings.len()
    }

    /// Move every entry into `out`, ordered by sequence index.
    ///
    /// Entries are appended kind by kind (warnings, events, failures, text,
    /// audio changes, parameter changes) and then stable-sorted, so that
    /// order breaks ties. The vectors keep their capacity.
    pub fn merge_sorted_into(&mut self, out: &mut Vec<Message>) {
        out.clear();
        out.reserve(self.len());
        out.append(&mut self.warnings);
        out.append(&mut self.events);
        out.append(&mut self.failures);
        out.append(&mut self.text);
        out.append(&mut self.audio_changes);
        out.append(&mut self.parameter_changes);
        out.sort_by_key(Message::sequence);
    }

    pub fn clear(&mut self) {
        self.warnings.clear();
        self.events.clear();
        self.failures.clear();
        self.text.clear();
        self.audio_changes.clear();
        self.parameter_changes.clear();
    }

    fn slot_mut(&mut self, slot: Slot) -> &mut Vec<Message> {
        match slot {
            Slot::Failure => &mut self.failures,
            Slot::Event => &mut self.events,
            Slot::PerformanceWarning => &mut self.warnings,
            Slot::AudioSettingChange => &mut self.audio_changes,
            Slot::ParameterChange => &mut self.parameter_changes,
            Slot::Text => &mut self.text,
        }
    }
}

/// Pending entries of the current drain window.
#[derive(Debug)]
pub struct PendingQueues {
    sequence: AtomicU32,
    /// Everything but free text. `main.text` stays empty.
    main: Mutex<QueueSet>,
    text: Mutex<Vec<Message>>,
    slots: usize,
}

impl Default for PendingQueues {
    fn default() -> Self {
        Self::new(MESSAGE_SLOTS)
    }
}

impl PendingQueues {
    pub fn new(slots: usize) -> Self {
        let mut main = QueueSet::with_capacity(slots);
        main.text = Vec::new();

        Self {
            sequence: AtomicU32::new(0),
            main: Mutex::new(main),
            text: Mutex::new(Vec::with_capacity(slots)),
            slots,
        }
    }

    /// Reserved slots per kind.
    pub fn slots(&self) -> usize {
        self.slots
    }

    /// A drain-side buffer matching this queue's reservations.
    pub fn spare_set(&self) -> QueueSet {
        QueueSet::with_capacity(self.slots)
    }

    #[inline]
    fn next_sequence(&self) -> u32 {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }

    /// Append one entry built from its sequence index.
    #[inline]
    pub fn push_with<F>(&self, slot: Slot, build: F)
    where
        F: FnOnce(u32) -> Message,
    {
        if slot == Slot::Text {
            let mut text = self.text.lock();
            let message = build(self.next_sequence());
            text.push(message);
        } else {
            let mut main = self.main.lock();
            let message = build(self.next_sequence());
            main.slot_mut(slot).push(message);
        }
    }

    /// Append several entries under one lock acquisition.
    pub fn push_many<I, F>(&self, slot: Slot, items: I, mut build: F)
    where
        I: IntoIterator,
        F: FnMut(u32, I::Item) -> Message,
    {
        debug_assert!(slot != Slot::Text);
        let mut main = self.main.lock();
        for item in items {
            let message = build(self.next_sequence(), item);
            main.slot_mut(slot).push(message);
        }
    }

    /// Append a parameter change, replacing the most recently queued one if
    /// it targets the same identifier.
    pub fn push_parameter_change<F>(&self, id: &Identifier, build: F)
    where
        F: FnOnce(u32) -> Message,
    {
        let mut main = self.main.lock();
        let replaces_last = main
            .parameter_changes
            .last()
            .map(|last| {
                matches!(last.kind, MessageKind::ParameterChange { .. })
                    && last.header.id.as_ref() == Some(id)
            })
            .unwrap_or(false);

        if replaces_last {
            main.parameter_changes.pop();
        }

        let message = build(self.next_sequence());
        main.parameter_changes.push(message);
    }

    /// Exchange the pending entries with `spare` and restart the sequence.
    ///
    /// `spare` must be empty; it comes back holding the drained window.
    /// Lock hold time is the pointer swap.
    pub fn swap_out(&self, spare: &mut QueueSet) {
        debug_assert!(spare.is_empty());

        let mut main = self.main.lock();
        let mut text = self.text.lock();

        core::mem::swap(&mut main.warnings, &mut spare.warnings);
        core::mem::swap(&mut main.events, &mut spare.events);
        core::mem::swap(&mut main.failures, &mut spare.failures);
        core::mem::swap(&mut main.audio_changes, &mut spare.audio_changes);
        core::mem::swap(&mut main.parameter_changes, &mut spare.parameter_changes);
        core::mem::swap(&mut *text, &mut spare.text);

        self.sequence.store(0, Ordering::Relaxed);
    }

    /// Drop everything pending and restart the sequence.
    pub fn discard(&self) {
        let mut main = self.main.lock();
        let mut text = self.text.lock();
        main.clear();
        text.clear();
        self.sequence.store(0, Ordering::Relaxed);
    }

    /// Entries pending across all kinds.
    pub fn len(&self) -> usize {
        let main = self.main.lock().len();
        main + self.text.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries pending in one collection.
    pub fn len_of(&self, slot: Slot) -> usize {
        if slot == Slot::Text {
            self.text.lock().len()
        } else {
            self.main.lock().slot_mut(slot).len()
        }
    }
}
