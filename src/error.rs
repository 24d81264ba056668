//! # Error Module
//!
//! This module provides the error types for `serial_device`.
//! It uses the `thiserror` crate for ergonomic error handling.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias for `serial_device` operations.
pub type Result<T> = std::result::Result<T, SerialDeviceError>;

/// Main error type for acquiring a serial device.
#[derive(Debug, Error)]
pub enum SerialDeviceError {
    /// The device could not be made readable and writable.
    ///
    /// The concrete reason (helper spawn, exit status, post-check) is logged
    /// when it happens and is not carried here.
    #[error("Permission denied for serial device '{}'", path.display())]
    Permission { path: PathBuf },

    /// The native configure-and-open sequence failed.
    #[error("Failed to open serial device '{}': {cause}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        cause: OpenCause,
    },
}

/// Why a native open failed.
#[derive(Debug, Error)]
pub enum OpenCause {
    /// The native layer produced no handle.
    #[error("native layer returned no handle")]
    NoHandle,
    /// The OS refused the open or the line configuration.
    #[error("OS rejected open: {0}")]
    Rejected(#[source] io::Error),
}

impl SerialDeviceError {
    /// Creates a new permission error.
    #[must_use]
    pub fn permission(path: impl AsRef<Path>) -> Self {
        Self::Permission {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Creates an open error for a native layer that returned nothing.
    #[must_use]
    pub fn no_handle(path: impl AsRef<Path>) -> Self {
        Self::Open {
            path: path.as_ref().to_path_buf(),
            cause: OpenCause::NoHandle,
        }
    }

    /// Creates an open error for an OS-level rejection.
    #[must_use]
    pub fn rejected(path: impl AsRef<Path>, err: io::Error) -> Self {
        Self::Open {
            path: path.as_ref().to_path_buf(),
            cause: OpenCause::Rejected(err),
        }
    }

    /// Whether this is a permission failure.
    pub fn is_permission(&self) -> bool {
        matches!(self, Self::Permission { .. })
    }

    /// Whether this is an open failure, whatever its cause.
    pub fn is_open_error(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    /// The open failure cause, if any.
    pub fn open_cause(&self) -> Option<&OpenCause> {
        match self {
            Self::Open { cause, .. } => Some(cause),
            Self::Permission { .. } => None,
        }
    }
}
