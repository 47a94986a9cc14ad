//! Integration test modules for dropwatch
//!
//! - capture: Sample checks, callback properties, lock probes, events
//! - session: Lifecycle, log files, listeners, status reporting
//! - drain: Ordering within a window, coalescing, error ceiling

pub mod capture;
pub mod drain;
