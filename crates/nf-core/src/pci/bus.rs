//! PCI bus enumeration.
//!
//! [`SysfsPciBus`] walks `/sys/bus/pci/devices`, where each function is a
//! directory named by its address holding `vendor`, `device` and `class`
//! attributes as hex text (`0x10de`).

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::trace;

use super::PciError;

/// One enumerated PCI function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PciDevice {
    /// Bus address, e.g. `0000:3b:00.0`.
    pub address: String,
    pub vendor_id: u16,
    pub device_id: u16,
    /// 24-bit class code (base class, subclass, prog-if).
    pub class: u32,
}

impl PciDevice {
    /// True when `class` agrees with this device on every bit of `mask`.
    pub fn class_matches(&self, class: u32, mask: u32) -> bool {
        (self.class & mask) == (class & mask)
    }
}

/// Source of PCI devices.
pub trait PciBus {
    /// Devices whose class matches `class` under `mask`.
    ///
    /// Fails as a whole; no partial list is returned.
    fn devices(&self, class: u32, mask: u32) -> Result<Vec<PciDevice>, PciError>;
}

/// Linux sysfs enumeration.
#[derive(Debug, Clone)]
pub struct SysfsPciBus {
    root: PathBuf,
}

impl SysfsPciBus {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        SysfsPciBus { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_device(dir: &Path, address: String) -> Result<PciDevice, PciError> {
        let vendor_id = read_hex_attr(dir, "vendor")?;
        let device_id = read_hex_attr(dir, "device")?;
        let class = read_hex_attr(dir, "class")?;
        Ok(PciDevice {
            address,
            vendor_id: narrow(dir, "vendor", vendor_id)?,
            device_id: narrow(dir, "device", device_id)?,
            class,
        })
    }
}

impl PciBus for SysfsPciBus {
    fn devices(&self, class: u32, mask: u32) -> Result<Vec<PciDevice>, PciError> {
        let io_err = |source| PciError::Io {
            path: self.root.clone(),
            source,
        };

        let mut found = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            let address = entry.file_name().to_string_lossy().into_owned();
            let device = Self::read_device(&entry.path(), address)?;
            if device.class_matches(class, mask) {
                trace!(
                    address = %device.address,
                    vendor = device.vendor_id,
                    device = device.device_id,
                    "PCI device matches class"
                );
                found.push(device);
            }
        }
        found.sort_by(|a, b| a.address.cmp(&b.address));
        Ok(found)
    }
}

fn read_hex_attr(dir: &Path, attr: &str) -> Result<u32, PciError> {
    let path = dir.join(attr);
    let text = fs::read_to_string(&path).map_err(|source| PciError::Io {
        path: path.clone(),
        source,
    })?;
    parse_hex(&text).ok_or_else(|| PciError::Parse {
        path,
        value: text.trim().to_string(),
    })
}

fn narrow(dir: &Path, attr: &str, value: u32) -> Result<u16, PciError> {
    u16::try_from(value).map_err(|_| PciError::Parse {
        path: dir.join(attr),
        value: format!("0x{:x}", value),
    })
}

/// Parse sysfs hex text, with or without a `0x` prefix.
pub(crate) fn parse_hex(text: &str) -> Option<u32> {
    let text = text.trim();
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u32::from_str_radix(digits, 16).ok()
}

/// Fixed device list, filtered by class like a real bus.
#[derive(Debug, Clone, Default)]
pub struct StaticPciBus {
    devices: Vec<PciDevice>,
}

impl StaticPciBus {
    pub fn new(devices: Vec<PciDevice>) -> Self {
        StaticPciBus { devices }
    }
}

impl PciBus for StaticPciBus {
    fn devices(&self, class: u32, mask: u32) -> Result<Vec<PciDevice>, PciError> {
        Ok(self
            .devices
            .iter()
            .filter(|d| d.class_matches(class, mask))
            .cloned()
            .collect())
    }
}
