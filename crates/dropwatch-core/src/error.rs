//! Error types for dropwatch-core.

use thiserror::Error;

/// Error type for dropwatch-core operations.
///
/// Capture calls never fail; these only surface from explicit conversions of
/// raw taxonomy values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Unknown location: {0}")]
    UnknownLocation(u8),

    #[error("Unknown failure kind: {0}")]
    UnknownFailureKind(u8),
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;
