//! Configuration validation errors and semantic validation.

use thiserror::Error;

use crate::settings::EngineConfig;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Largest chunk the line reader may be asked to allocate.
pub const MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::InvalidValue { .. } => 62,
            ValidationError::VersionMismatch { .. } => 63,
        }
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Validate engine configuration semantically.
pub fn validate_config(config: &EngineConfig) -> ValidationResult<()> {
    // Only the major version has to agree.
    let expected_major = crate::CONFIG_SCHEMA_VERSION.split('.').next();
    let actual_major = config.schema_version.split('.').next();
    if expected_major != actual_major {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    if config.chunk_size == 0 {
        return Err(invalid("chunk_size", "must be nonzero"));
    }
    if config.chunk_size > MAX_CHUNK_SIZE {
        return Err(invalid(
            "chunk_size",
            format!("{} exceeds the {} byte limit", config.chunk_size, MAX_CHUNK_SIZE),
        ));
    }

    if config.cpuinfo_path.as_os_str().is_empty() {
        return Err(invalid("cpuinfo_path", "must not be empty"));
    }

    let pci = &config.pci;
    if pci.device_class > 0xFF_FFFF {
        return Err(invalid(
            "pci.device_class",
            format!("{:#x} does not fit in 24 bits", pci.device_class),
        ));
    }
    if pci.device_class_mask > 0xFF_FFFF {
        return Err(invalid(
            "pci.device_class_mask",
            format!("{:#x} does not fit in 24 bits", pci.device_class_mask),
        ));
    }
    if pci.device_class_mask == 0 {
        return Err(invalid("pci.device_class_mask", "must be nonzero"));
    }

    Ok(())
}
