//! Render-thread side of the dropwatch diagnostic logger.
//!
//! # Primary API
//!
//! - [`Capture`]: Checks and log calls made from the audio callback
//! - [`Location`] / [`FailureKind`]: Closed taxonomy of where and what went wrong
//! - [`Message`]: One report entry, rendered to Markdown on the drain worker
//! - [`PendingQueues`]: Per-kind collections swapped out once per drain window
//! - [`ComponentRegistry`]: Resolves component handles to names at report time
//!
//! # Feature-gated APIs
//!
//! - `"glitch-injection"`: [`glitch::inject_glitches`] to corrupt test buffers
//!
//! # Example
//!
//! ```ignore
//! use dropwatch_core::{Capture, Location};
//!
//! let capture = Capture::new(voice_counter);
//! capture.begin_session();
//!
//! // Inside the audio callback
//! capture.check_priority_inversion(&callback_lock);
//! capture.check_audio_callback_properties(sample_rate, block_size);
//! capture.check_sample_data(None, Location::MainRenderCallback, true, left, None);
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod taxonomy;
pub use taxonomy::{failure_name, location_name, FailureKind, Location, UNKNOWN_FAILURE, UNKNOWN_LOCATION};

pub mod attribution;
pub use attribution::{ComponentId, ComponentNames, ComponentRegistry, Identifier, UNKNOWN_COMPONENT};

pub mod event;
pub use event::{note_name, HostEvent};

pub mod message;
pub use message::{Message, MessageHeader, MessageKind, ParameterValue, PerformanceSample};

pub mod queue;
pub use queue::{PendingQueues, QueueSet, Slot, AUDIO_CHANGE_SLOTS, MESSAGE_SLOTS};

pub mod capture;
pub use capture::{
    Capture, LockProbe, ReadProbe, ScriptedControl, VoiceCounter, CLIP_THRESHOLD, ERROR_CEILING,
};

#[cfg(feature = "glitch-injection")]
pub mod glitch;

/// Re-export of the MIDI message types used by [`HostEvent`].
pub use midi_msg::{Channel, ChannelVoiceMsg, ControlChange};
