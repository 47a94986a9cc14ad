//! Render-thread capture API.
//!
//! Every entry point starts with one activity check and returns immediately
//! when logging is off or the error ceiling was reached. Past that check the
//! work is scalar atomics, one append under a short lock, or one
//! non-blocking lock probe. No I/O and no formatting happen here.

use crate::attribution::{ComponentId, Identifier};
use crate::event::HostEvent;
use crate::message::{Message, MessageHeader, MessageKind, ParameterValue, PerformanceSample};
use crate::queue::{PendingQueues, Slot, MESSAGE_SLOTS};
use crate::taxonomy::{FailureKind, Location};
use arc_swap::ArcSwapOption;
use atomic_float::AtomicF64;
use core::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Samples whose magnitude exceeds this are treated as broken output.
pub const CLIP_THRESHOLD: f32 = 32.0;

/// Cumulative failures + performance warnings after which capture goes inert.
pub const ERROR_CEILING: usize = 200;

const UNSET_SAMPLE_RATE: f64 = -1.0;
const UNSET_BLOCK_SIZE: i64 = -1;

/// Active voice count of the owning engine, queried on the calling thread.
pub trait VoiceCounter: Send + Sync {
    fn active_voice_count(&self) -> usize;
}

impl VoiceCounter for AtomicUsize {
    fn active_voice_count(&self) -> usize {
        self.load(Ordering::Relaxed)
    }
}

/// A scripted control whose value changes may be logged.
pub trait ScriptedControl {
    fn name(&self) -> &Identifier;

    /// Script processor that owns the control.
    fn owner(&self) -> ComponentId;

    /// Only controls of the front (user-facing) interface script are logged.
    fn is_on_front_interface(&self) -> bool;
}

/// Non-blocking acquisition attempt used for priority inversion detection.
///
/// Returns `true` if the lock was free. The lock is released again before
/// returning.
pub trait LockProbe {
    fn probe(&self) -> bool;
}

impl<T: ?Sized> LockProbe for parking_lot::Mutex<T> {
    #[inline]
    fn probe(&self) -> bool {
        self.try_lock().is_some()
    }
}

/// Probes the write side: any holder, reader or writer, counts as busy. Wrap
/// the lock in [`ReadProbe`] when the render thread only reads.
impl<T: ?Sized> LockProbe for parking_lot::RwLock<T> {
    #[inline]
    fn probe(&self) -> bool {
        self.try_write().is_some()
    }
}

/// Read-side probe for an `RwLock` the render thread only reads from. Busy
/// only while a writer holds the lock.
pub struct ReadProbe<'a, T: ?Sized>(pub &'a parking_lot::RwLock<T>);

impl<T: ?Sized> LockProbe for ReadProbe<'_, T> {
    #[inline]
    fn probe(&self) -> bool {
        self.0.try_read().is_some()
    }
}

impl<T: ?Sized> LockProbe for parking_lot::ReentrantMutex<T> {
    #[inline]
    fn probe(&self) -> bool {
        self.try_lock().is_some()
    }
}

impl<T: ?Sized> LockProbe for std::sync::Mutex<T> {
    #[inline]
    fn probe(&self) -> bool {
        // A poisoned lock is still free.
        !matches!(self.try_lock(), Err(std::sync::TryLockError::WouldBlock))
    }
}

/// Spin flag: `true` while held.
impl LockProbe for AtomicBool {
    #[inline]
    fn probe(&self) -> bool {
        if self
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            self.store(false, Ordering::Release);
            true
        } else {
            false
        }
    }
}

/// NaN compares false against everything, so it lands here too.
#[inline]
#[allow(clippy::neg_cmp_op_on_partial_ord)]
fn is_out_of_range(sample: f32) -> bool {
    !(sample.abs() <= CLIP_THRESHOLD)
}

/// Callback index and timestamp taken before entering a queue lock.
#[derive(Clone, Copy)]
struct Stamp {
    callback_index: u64,
    timestamp: f64,
}

impl Stamp {
    #[inline]
    fn header(
        self,
        sequence: u32,
        owner: Option<ComponentId>,
        id: Option<Identifier>,
        location: Location,
    ) -> MessageHeader {
        MessageHeader {
            sequence,
            callback_index: self.callback_index,
            timestamp: self.timestamp,
            owner,
            id,
            location,
        }
    }
}

/// Capture state shared between the render thread and the drain worker.
pub struct Capture {
    logging: AtomicBool,
    error_count: AtomicUsize,
    callback_index: AtomicU64,
    epoch: Instant,
    /// Seconds since `epoch` at session start.
    session_origin: AtomicF64,
    last_sample_rate: AtomicF64,
    last_block_size: AtomicI64,
    /// Location of the first faulty buffer in the current callback.
    error_location: AtomicU8,
    warning_level: AtomicU8,
    queues: PendingQueues,
    voices: Arc<dyn VoiceCounter>,
    /// Latest context published by a non-real-time lock holder.
    call_context: ArcSwapOption<String>,
    /// Context snapshotted by the last failed callback lock probe.
    inversion_context: ArcSwapOption<String>,
}

impl core::fmt::Debug for Capture {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Capture")
            .field("logging", &self.is_logging())
            .field("error_count", &self.error_count())
            .field("callback_index", &self.callback_index())
            .field("pending", &self.queues.len())
            .finish()
    }
}

impl Capture {
    pub fn new(voices: Arc<dyn VoiceCounter>) -> Self {
        Self::with_slots(MESSAGE_SLOTS, voices)
    }

    /// Create with `slots` reserved entries per kind.
    pub fn with_slots(slots: usize, voices: Arc<dyn VoiceCounter>) -> Self {
        Self {
            logging: AtomicBool::new(false),
            error_count: AtomicUsize::new(0),
            callback_index: AtomicU64::new(0),
            epoch: Instant::now(),
            session_origin: AtomicF64::new(0.0),
            last_sample_rate: AtomicF64::new(UNSET_SAMPLE_RATE),
            last_block_size: AtomicI64::new(UNSET_BLOCK_SIZE),
            error_location: AtomicU8::new(Location::Empty.as_u8()),
            warning_level: AtomicU8::new(0),
            queues: PendingQueues::new(slots),
            voices,
            call_context: ArcSwapOption::empty(),
            inversion_context: ArcSwapOption::empty(),
        }
    }

    // Session control (non-real-time)

    /// Reset per-session state and enable capture.
    ///
    /// Stale entries from a previous session are discarded, and the stored
    /// sample rate and block size go back to a sentinel so the first
    /// callback reports both.
    pub fn begin_session(&self) {
        self.logging.store(false, Ordering::Release);
        self.queues.discard();
        self.callback_index.store(0, Ordering::Relaxed);
        self.error_count.store(0, Ordering::Relaxed);
        self.last_sample_rate.store(UNSET_SAMPLE_RATE, Ordering::Relaxed);
        self.last_block_size.store(UNSET_BLOCK_SIZE, Ordering::Relaxed);
        self.error_location
            .store(Location::Empty.as_u8(), Ordering::Relaxed);
        self.session_origin
            .store(self.epoch.elapsed().as_secs_f64(), Ordering::Relaxed);
        self.inversion_context.store(None);
        self.logging.store(true, Ordering::Release);
    }

    /// Disable capture and drop whatever is still queued.
    pub fn end_session(&self) {
        self.logging.store(false, Ordering::Release);
        self.queues.discard();
    }

    /// Whether a session was started and not stopped, ignoring the ceiling.
    pub fn is_session_open(&self) -> bool {
        self.logging.load(Ordering::Acquire)
    }

    /// Whether capture calls currently record anything.
    #[inline]
    pub fn is_logging(&self) -> bool {
        self.logging.load(Ordering::Acquire)
            && self.error_count.load(Ordering::Relaxed) < ERROR_CEILING
    }

    // Drain-side accessors

    pub fn pending(&self) -> &PendingQueues {
        &self.queues
    }

    /// Add drained failures/warnings to the cumulative count; returns the
    /// new total.
    pub fn add_drained_errors(&self, count: usize) -> usize {
        self.error_count.fetch_add(count, Ordering::Relaxed) + count
    }

    pub fn error_count(&self) -> usize {
        self.error_count.load(Ordering::Relaxed)
    }

    pub fn callback_index(&self) -> u64 {
        self.callback_index.load(Ordering::Relaxed)
    }

    /// Take the context snapshotted by the last failed callback lock probe.
    pub fn take_inversion_context(&self) -> Option<Arc<String>> {
        self.inversion_context.swap(None)
    }

    /// Seconds since the current session started.
    #[inline]
    pub fn timestamp(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64() - self.session_origin.load(Ordering::Relaxed)
    }

    #[inline]
    fn stamp(&self) -> Stamp {
        Stamp {
            callback_index: self.callback_index.load(Ordering::Relaxed),
            timestamp: self.timestamp(),
        }
    }

    // Call context (non-real-time side)

    /// Publish what the current lock holder is doing. Call this from
    /// non-real-time code right after acquiring a lock the render thread
    /// also needs.
    pub fn publish_call_context(&self, context: impl Into<String>) {
        self.call_context.store(Some(Arc::new(context.into())));
    }

    /// Publish the calling thread's backtrace as call context.
    pub fn capture_call_context(&self) {
        let backtrace = std::backtrace::Backtrace::force_capture();
        self.publish_call_context(backtrace.to_string());
    }

    pub fn clear_call_context(&self) {
        self.call_context.store(None);
    }

    // Render-thread checks

    /// Once per render block: advance the callback counter and report
    /// sample rate / block size changes.
    pub fn check_audio_callback_properties(&self, sample_rate: f64, block_size: usize) {
        if !self.is_logging() {
            return;
        }

        self.callback_index.fetch_add(1, Ordering::Relaxed);
        self.error_location
            .store(Location::Empty.as_u8(), Ordering::Relaxed);

        let last_rate = self.last_sample_rate.load(Ordering::Relaxed);
        if sample_rate != last_rate {
            self.push_audio_change(FailureKind::SampleRateChange, last_rate, sample_rate);
            self.last_sample_rate.store(sample_rate, Ordering::Relaxed);
        }

        let block_size = block_size as i64;
        let last_block = self.last_block_size.load(Ordering::Relaxed);
        if block_size != last_block {
            self.push_audio_change(
                FailureKind::BufferSizeChange,
                last_block as f64,
                block_size as f64,
            );
            self.last_block_size.store(block_size, Ordering::Relaxed);
        }
    }

    /// Scan one channel buffer for samples beyond [`CLIP_THRESHOLD`].
    ///
    /// Returns `true` if the buffer is clean. Otherwise records one click
    /// (single faulty sample) or burst failure carrying the most extreme
    /// value, marks `location` as this callback's latest faulty location and
    /// returns `false`. NaN samples count as faulty.
    pub fn check_sample_data(
        &self,
        owner: Option<ComponentId>,
        location: Location,
        is_left_channel: bool,
        data: &[f32],
        id: Option<&Identifier>,
    ) -> bool {
        if !self.is_logging() {
            return true;
        }

        let mut faulty = 0usize;
        let mut extreme: Option<f32> = None;

        for &sample in data {
            if is_out_of_range(sample) {
                faulty += 1;
                extreme = match extreme {
                    None => Some(sample),
                    Some(e) if e.is_nan() || sample.abs() > e.abs() => Some(sample),
                    keep => keep,
                };
            }
        }

        let Some(extreme) = extreme else {
            return true;
        };

        self.error_location
            .store(location.as_u8(), Ordering::Relaxed);

        let kind = FailureKind::for_excursion(is_left_channel, faulty);
        self.push_failure(owner, location, kind, extreme as f64, id.cloned());
        false
    }

    /// Most recent location in the current callback that reported a faulty
    /// buffer, or `Location::Empty`. Each faulty buffer overwrites it, so a
    /// downstream stage sees the nearest upstream report and can skip
    /// reporting the same glitch again.
    pub fn location_for_error_in_current_callback(&self) -> Location {
        Location::try_from(self.error_location.load(Ordering::Relaxed)).unwrap_or_default()
    }

    /// Record an assertion failure iff `condition` is false.
    pub fn check_assertion(
        &self,
        owner: Option<ComponentId>,
        location: Location,
        condition: bool,
        extra: f64,
    ) {
        if !self.is_logging() || condition {
            return;
        }
        self.push_failure(owner, location, FailureKind::Assertion, extra, None);
    }

    /// Probe the engine's callback lock before rendering a block.
    ///
    /// If it is held, records a priority inversion at the main render
    /// callback and keeps the most recently published call context for the
    /// report. Never waits.
    pub fn check_priority_inversion<L: LockProbe + ?Sized>(&self, lock: &L) {
        if !self.is_logging() || lock.probe() {
            return;
        }

        if let Some(context) = self.call_context.load_full() {
            self.inversion_context.store(Some(context));
        }

        // Probed before this block's properties check bumps the counter.
        let stamp = Stamp {
            callback_index: self.callback_index().saturating_sub(1),
            timestamp: self.timestamp(),
        };
        self.queues.push_with(Slot::Failure, |sequence| {
            Message::new(
                stamp.header(sequence, None, None, Location::MainRenderCallback),
                MessageKind::Failure {
                    kind: FailureKind::PriorityInversion,
                    extra: 0.0,
                },
            )
        });
    }

    /// Probe any other lock the render thread needs at `location`.
    pub fn check_priority_inversion_at<L: LockProbe + ?Sized>(
        &self,
        lock: &L,
        location: Location,
        owner: Option<ComponentId>,
        id: Option<&Identifier>,
    ) {
        if !self.is_logging() || lock.probe() {
            return;
        }
        self.push_failure(
            owner,
            location,
            FailureKind::PriorityInversion,
            0.0,
            id.cloned(),
        );
    }

    /// Record every non-aftertouch event of this block.
    pub fn log_events(&self, events: &[HostEvent]) {
        if !self.is_logging() {
            return;
        }

        let stamp = self.stamp();
        self.queues.push_many(
            Slot::Event,
            events.iter().filter(|e| !e.is_aftertouch()),
            |sequence, event| {
                Message::new(
                    stamp.header(sequence, None, None, Location::MainRenderCallback),
                    MessageKind::Event { event: *event },
                )
            },
        );
    }

    /// Record a free-text note.
    pub fn log_message(&self, text: impl Into<String>) {
        if !self.is_logging() {
            return;
        }

        let text = text.into();
        let stamp = self.stamp();
        self.queues.push_with(Slot::Text, |sequence| {
            Message::new(
                stamp.header(sequence, None, None, Location::Empty),
                MessageKind::StringMessage { text },
            )
        });
    }

    /// Record a CPU overrun together with the engine's current voice count.
    pub fn log_performance_warning(&self, sample: &PerformanceSample) {
        if !self.is_logging() {
            return;
        }

        let voice_count = self.voices.active_voice_count();
        let sample = *sample;
        let stamp = self.stamp();
        self.queues.push_with(Slot::PerformanceWarning, |sequence| {
            Message::new(
                stamp.header(sequence, sample.owner, None, sample.location),
                MessageKind::PerformanceWarning {
                    sample,
                    voice_count,
                },
            )
        });
    }

    /// Record a front-interface control change, replacing a still-queued
    /// change of the same control.
    pub fn log_parameter_change(
        &self,
        control: &dyn ScriptedControl,
        value: impl Into<ParameterValue>,
    ) {
        if !self.is_logging() || !control.is_on_front_interface() {
            return;
        }

        let id = control.name().clone();
        let owner = control.owner();
        let value = value.into();
        let stamp = self.stamp();
        self.queues.push_parameter_change(&id, |sequence| {
            Message::new(
                stamp.header(sequence, Some(owner), Some(id.clone()), Location::Empty),
                MessageKind::ParameterChange { value },
            )
        });
    }

    /// A streaming voice ran out of preloaded data.
    pub fn log_streaming_failure(&self, voice_uptime: f64) {
        if !self.is_logging() {
            return;
        }
        self.push_failure(
            None,
            Location::SampleRendering,
            FailureKind::StreamingFailure,
            voice_uptime,
            None,
        );
    }

    /// Record a failure of a kind without a dedicated check (sample loading
    /// errors, locked audio thread, discontinuities).
    pub fn log_failure(
        &self,
        owner: Option<ComponentId>,
        location: Location,
        kind: FailureKind,
        extra: f64,
        id: Option<&Identifier>,
    ) {
        if !self.is_logging() {
            return;
        }
        self.push_failure(owner, location, kind, extra, id.cloned());
    }

    /// Store the performance warning level and note the change in the log.
    pub fn set_performance_warning_level(&self, level: u8) {
        self.warning_level.store(level, Ordering::Relaxed);
        self.log_message(format!("New Warning level selected: {}", level));
    }

    pub fn performance_warning_level(&self) -> u8 {
        self.warning_level.load(Ordering::Relaxed)
    }

    #[inline]
    fn push_failure(
        &self,
        owner: Option<ComponentId>,
        location: Location,
        kind: FailureKind,
        extra: f64,
        id: Option<Identifier>,
    ) {
        let stamp = self.stamp();
        self.queues.push_with(Slot::Failure, |sequence| {
            Message::new(
                stamp.header(sequence, owner, id, location),
                MessageKind::Failure { kind, extra },
            )
        });
    }

    #[inline]
    fn push_audio_change(&self, kind: FailureKind, old_value: f64, new_value: f64) {
        let stamp = self.stamp();
        self.queues.push_with(Slot::AudioSettingChange, |sequence| {
            Message::new(
                stamp.header(sequence, None, None, Location::MainRenderCallback),
                MessageKind::AudioSettingChange {
                    kind,
                    old_value,
                    new_value,
                },
            )
        });
    }
}
