//! Engine settings loaded from `cpuinfo_features.json`.
//!
//! Every field has a default, so an empty JSON object is a valid config.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::validate::ValidationError;

/// Default processor-information file.
pub const DEFAULT_CPUINFO_PATH: &str = "/proc/cpuinfo";

/// Default chunk size for the line reader.
pub const DEFAULT_CHUNK_SIZE: usize = 128;

/// Display controllers (PCI base class 0x03).
pub const DEFAULT_PCI_DEVICE_CLASS: u32 = 0x03_0000;

/// Compare only the base-class byte.
pub const DEFAULT_PCI_DEVICE_CLASS_MASK: u32 = 0xFF_0000;

/// Where Linux exposes enumerated PCI functions.
pub const DEFAULT_PCI_SYSFS_ROOT: &str = "/sys/bus/pci/devices";

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Schema version of the file.
    pub schema_version: String,

    /// cpuinfo-formatted file to extract features from.
    pub cpuinfo_path: PathBuf,

    /// Read the source in chunks of this many bytes.
    pub chunk_size: usize,

    /// PCI device matching.
    pub pci: PciSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            cpuinfo_path: PathBuf::from(DEFAULT_CPUINFO_PATH),
            chunk_size: DEFAULT_CHUNK_SIZE,
            pci: PciSettings::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }
}

/// PCI matching settings.
///
/// Only consulted when the engine is built with PCI detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PciSettings {
    /// Whether to enumerate the PCI bus at all.
    pub enabled: bool,

    /// 24-bit device class to match.
    pub device_class: u32,

    /// Bits of `device_class` that must match.
    pub device_class_mask: u32,

    /// Directory of PCI function entries.
    pub sysfs_root: PathBuf,
}

impl Default for PciSettings {
    fn default() -> Self {
        PciSettings {
            enabled: true,
            device_class: DEFAULT_PCI_DEVICE_CLASS,
            device_class_mask: DEFAULT_PCI_DEVICE_CLASS_MASK,
            sysfs_root: PathBuf::from(DEFAULT_PCI_SYSFS_ROOT),
        }
    }
}
