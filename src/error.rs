//! Error types for Storage Monitor (stormon)

use std::fmt;
use std::io;
use thiserror::Error;

/// Result type alias for stormon operations
pub type Result<T> = std::result::Result<T, Error>;

/// Why a device path could not be opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnavailableReason {
    /// No device answers at the path
    NotFound,
    /// The device exists but the caller may not open it
    AccessDenied,
    /// Any other open failure (malformed path, sharing violation, ...)
    Other,
}

impl UnavailableReason {
    /// Classify an open error by its I/O kind
    pub fn from_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound,
            io::ErrorKind::PermissionDenied => Self::AccessDenied,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => f.write_str("not found"),
            Self::AccessDenied => f.write_str("access denied"),
            Self::Other => f.write_str("open failed"),
        }
    }
}

/// Main error type for storage queries
#[derive(Error, Debug)]
pub enum Error {
    /// Opening the device failed (absent, permission denied or malformed path)
    #[error("Device unavailable: {path} ({reason})")]
    DeviceUnavailable {
        path: String,
        reason: UnavailableReason,
    },

    /// The driver or device rejected the control query
    #[error("Query not supported: {control}")]
    QueryUnsupported { control: &'static str },

    /// A supported control query returned an error
    #[error("Query failed: {control}: {detail}")]
    QueryFailed {
        control: &'static str,
        detail: String,
    },

    /// Feature not available on this platform
    #[error("Not supported: {0}")]
    NotSupported(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn query_failed(control: &'static str, detail: impl Into<String>) -> Self {
        Error::QueryFailed {
            control,
            detail: detail.into(),
        }
    }

    /// True when the error means the device could not be opened at all
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::DeviceUnavailable { .. })
    }

    /// True when the control query was rejected as unsupported
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::QueryUnsupported { .. })
    }
}
