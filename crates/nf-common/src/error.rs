//! Error types for the node features engine.
//!
//! Every failure the engine can surface maps onto this enum with:
//! - A stable error code for machine parsing
//! - A category for grouping
//! - A recoverability hint
//!
//! Malformed individual cpuinfo lines never reach this type; they are
//! skipped where they occur. Only failures that abort a whole call
//! (reading the source file, growing a line buffer, enumerating the PCI
//! bus, loading configuration) are represented here.
//!
//! Errors serialize to structured JSON for `--format json` output:
//! ```json
//! {
//!   "code": 20,
//!   "category": "io",
//!   "message": "failed to read /proc/cpuinfo: permission denied",
//!   "recoverable": true
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for node features operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration file errors.
    Config,
    /// Source file and stream errors.
    Io,
    /// Resource exhaustion while buffering input.
    Resource,
    /// PCI bus enumeration errors.
    Pci,
    /// Bugs.
    Internal,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Io => write!(f, "io"),
            ErrorCategory::Resource => write!(f, "resource"),
            ErrorCategory::Pci => write!(f, "pci"),
            ErrorCategory::Internal => write!(f, "internal"),
        }
    }
}

/// Unified error type for the node features engine.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // I/O errors (20-29)
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Resource errors (30-39)
    #[error("out of memory growing line buffer to {requested} bytes")]
    OutOfMemory { requested: usize },

    // PCI errors (40-49)
    #[error("PCI enumeration failed: {0}")]
    PciEnumeration(String),

    #[error("PCI detection not compiled in")]
    PciUnavailable,

    // Internal (50-59)
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: I/O errors
    /// - 30-39: Resource errors
    /// - 40-49: PCI errors
    /// - 50-59: Internal errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidConfig(_) => 11,
            Error::Open { .. } => 20,
            Error::Read { .. } => 21,
            Error::Io(_) => 22,
            Error::Json(_) => 23,
            Error::OutOfMemory { .. } => 30,
            Error::PciEnumeration(_) => 40,
            Error::PciUnavailable => 41,
            Error::Internal(_) => 50,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::InvalidConfig(_) => ErrorCategory::Config,
            Error::Open { .. } | Error::Read { .. } | Error::Io(_) | Error::Json(_) => {
                ErrorCategory::Io
            }
            Error::OutOfMemory { .. } => ErrorCategory::Resource,
            Error::PciEnumeration(_) | Error::PciUnavailable => ErrorCategory::Pci,
            Error::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Returns whether this error is potentially recoverable.
    ///
    /// None of these conditions terminate a host; "recoverable" here means a
    /// later call may succeed without operator intervention.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_) | Error::InvalidConfig(_) => false,
            Error::Open { .. } | Error::Read { .. } | Error::Io(_) => true,
            Error::Json(_) => false,
            Error::OutOfMemory { .. } => true,
            Error::PciEnumeration(_) => true,
            Error::PciUnavailable => false,
            Error::Internal(_) => false,
        }
    }

    /// Structured form used by JSON output.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "code": self.code(),
            "category": self.category(),
            "message": self.to_string(),
            "recoverable": self.is_recoverable(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_grouped_by_category() {
        let open = Error::Open {
            path: PathBuf::from("/proc/cpuinfo"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(open.code(), 20);
        assert_eq!(open.category(), ErrorCategory::Io);

        let oom = Error::OutOfMemory { requested: 256 };
        assert_eq!(oom.code(), 30);
        assert_eq!(oom.category(), ErrorCategory::Resource);

        assert_eq!(Error::PciUnavailable.category(), ErrorCategory::Pci);
        assert_eq!(Error::Config("x".into()).category(), ErrorCategory::Config);
    }

    #[test]
    fn test_error_display() {
        let err = Error::OutOfMemory { requested: 1024 };
        assert_eq!(
            err.to_string(),
            "out of memory growing line buffer to 1024 bytes"
        );
        let err = Error::PciEnumeration("no such directory".into());
        assert!(err.to_string().contains("no such directory"));
    }

    #[test]
    fn test_error_json_shape() {
        let err = Error::Read {
            path: PathBuf::from("/proc/cpuinfo"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        let json = err.to_json();
        assert_eq!(json["code"], 21);
        assert_eq!(json["category"], "io");
        assert_eq!(json["recoverable"], true);
        assert!(json["message"]
            .as_str()
            .unwrap()
            .starts_with("failed to read /proc/cpuinfo"));
    }

    #[test]
    fn test_category_display() {
        assert_eq!(ErrorCategory::Resource.to_string(), "resource");
        assert_eq!(ErrorCategory::Pci.to_string(), "pci");
    }
}
