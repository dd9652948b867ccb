//! Exit codes for the `nf-cpuinfo` CLI.
//!
//! Exit code ranges:
//! - 0-9: Operational outcomes (parse outcome from code, not output)
//! - 10-19: User/environment errors (recoverable by user action)
//! - 20-29: Internal and I/O errors

use nf_common::{Error, ErrorCategory};

/// Stable exit codes for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Clean = 0,

    /// Some inputs could not be processed; the rest were.
    PartialFail = 1,

    /// A yes/no query answered no (`owned` on a foreign token).
    Negative = 2,

    /// Invalid arguments.
    ArgsError = 10,

    /// Configuration file missing, unreadable or invalid.
    ConfigError = 11,

    /// Internal error (bug - please report).
    InternalError = 20,

    /// I/O error.
    IoError = 21,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Codes 0-9 describe an outcome, not a failure.
    pub fn is_operational(self) -> bool {
        (self as i32) < 10
    }

    pub fn is_user_error(self) -> bool {
        (10..20).contains(&(self as i32))
    }

    pub fn is_error(self) -> bool {
        (self as i32) >= 10
    }

    /// Name for JSON output.
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::PartialFail => "ERR_PARTIAL",
            ExitCode::Negative => "OK_NEGATIVE",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }

    /// Exit code for an engine error that ended the command.
    pub fn for_error(err: &Error) -> ExitCode {
        if let Error::PciUnavailable = err {
            return ExitCode::ArgsError;
        }
        match err.category() {
            ErrorCategory::Config => ExitCode::ConfigError,
            ErrorCategory::Io | ErrorCategory::Resource | ErrorCategory::Pci => ExitCode::IoError,
            ErrorCategory::Internal => ExitCode::InternalError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
