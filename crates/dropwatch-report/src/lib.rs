//! Background side of the dropwatch diagnostic logger.
//!
//! # Primary API
//!
//! - [`DebugLogger`] / [`DebugLoggerBuilder`]: Session lifecycle (start/stop/toggle/flush)
//! - [`LoggerConfig`]: Product info, log folder, drain interval, host context
//! - [`LoggerListener`]: Started/ended/error notifications
//! - [`Drainer`] / [`DrainThread`]: Periodic swap, render and write cycle
//!
//! The render-thread API lives in `dropwatch-core` and is reached through
//! [`DebugLogger::capture`].

pub mod error;
pub use error::{Error, Result};

pub mod config;
pub use config::{default_log_folder, HostContext, LoggerConfig};

pub mod environment;
pub use environment::SystemSpecs;

pub mod log_file;
pub use log_file::LogFile;

pub mod listener;
pub use listener::{ListenerSet, LoggerEvent, LoggerListener};

pub mod drain;
pub use drain::{render_window, DrainContext, DrainSummary, Drainer, SessionStatus};

pub mod worker;
pub use worker::{DrainCommand, DrainHandle, DrainThread};

pub mod session;
pub use session::{DebugLogger, DebugLoggerBuilder, LoggerState};
