//! # Dropwatch - Real-time Audio Diagnostic Logger
//!
//! Detects anomalies in an audio engine's signal path and writes a
//! Markdown report without blocking the render thread.
//!
//! ## Architecture
//!
//! - **dropwatch-core** - Render-thread capture API (taxonomy, entries, pending queues)
//! - **dropwatch-report** - Drain worker, log file, session lifecycle, listeners
//!
//! ## Quick Start
//!
//! ```ignore
//! use dropwatch::prelude::*;
//!
//! let logger = DebugLogger::builder()
//!     .product("MySampler", "1.2.0")
//!     .build();
//! let capture = logger.capture().clone();
//! logger.start()?;
//!
//! // Audio callback
//! capture.check_priority_inversion(&callback_lock);
//! capture.check_audio_callback_properties(48000.0, 512);
//! capture.check_sample_data(None, Location::MainRenderCallback, true, left, None);
//! ```
//!
//! ## Feature Flags
//!
//! - `glitch-injection` - [`glitch`] junk generator for exercising the detector

/// Re-export of dropwatch-core for direct access
pub use dropwatch_core as core;

/// Re-export of dropwatch-report for direct access
pub use dropwatch_report as report;

pub mod error;
pub use error::{Error, Result};

pub use dropwatch_core::{
    // Taxonomy
    failure_name,
    location_name,
    FailureKind,
    Location,

    // Attribution
    ComponentId,
    ComponentNames,
    ComponentRegistry,
    Identifier,

    // Entries
    HostEvent,
    Message,
    MessageKind,
    ParameterValue,
    PerformanceSample,

    // Capture
    Capture,
    LockProbe,
    ReadProbe,
    ScriptedControl,
    VoiceCounter,
    CLIP_THRESHOLD,
    ERROR_CEILING,
};

pub use dropwatch_report::{
    DebugLogger, DebugLoggerBuilder, DrainSummary, HostContext, LoggerConfig, LoggerListener,
    LoggerState,
};

#[cfg(feature = "glitch-injection")]
pub use dropwatch_core::glitch;

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::{DebugLogger, DebugLoggerBuilder, LoggerConfig, LoggerListener, LoggerState};

    pub use crate::{Capture, FailureKind, Location};

    pub use crate::{ComponentId, ComponentRegistry, Identifier};

    pub use crate::{HostEvent, PerformanceSample, ScriptedControl, VoiceCounter};
}
