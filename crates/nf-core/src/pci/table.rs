//! Static vendor/device table mapping PCI IDs to feature strings.

use std::fmt::Write as _;

/// One recognized device of a vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PciDeviceEntry {
    pub device_id: u16,
    /// Full feature string, e.g. `PCI::GPU::A100`.
    pub feature: &'static str,
}

/// A vendor and its recognized devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PciVendorEntry {
    pub vendor_id: u16,
    pub devices: &'static [PciDeviceEntry],
}

const NVIDIA_DEVICES: &[PciDeviceEntry] = &[
    PciDeviceEntry {
        device_id: 0x15f7,
        feature: "PCI::GPU::P100",
    },
    PciDeviceEntry {
        device_id: 0x1db5,
        feature: "PCI::GPU::V100",
    },
    PciDeviceEntry {
        device_id: 0x1db6,
        feature: "PCI::GPU::V100",
    },
    PciDeviceEntry {
        device_id: 0x1eb8,
        feature: "PCI::GPU::T4",
    },
    PciDeviceEntry {
        device_id: 0x20b5,
        feature: "PCI::GPU::A100",
    },
    PciDeviceEntry {
        device_id: 0x2235,
        feature: "PCI::GPU::A40",
    },
];

const AMD_DEVICES: &[PciDeviceEntry] = &[
    PciDeviceEntry {
        device_id: 0x66a1,
        feature: "PCI::GPU::MI50",
    },
    PciDeviceEntry {
        device_id: 0x738c,
        feature: "PCI::GPU::MI100",
    },
];

const BUILTIN_VENDORS: &[PciVendorEntry] = &[
    PciVendorEntry {
        vendor_id: 0x10de,
        devices: NVIDIA_DEVICES,
    },
    PciVendorEntry {
        vendor_id: 0x1002,
        devices: AMD_DEVICES,
    },
];

/// Read-only vendor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PciVendorTable {
    vendors: &'static [PciVendorEntry],
}

impl Default for PciVendorTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PciVendorTable {
    /// The compiled-in GPU table.
    pub const fn builtin() -> Self {
        PciVendorTable {
            vendors: BUILTIN_VENDORS,
        }
    }

    /// Use a caller-provided table.
    pub const fn new(vendors: &'static [PciVendorEntry]) -> Self {
        PciVendorTable { vendors }
    }

    pub fn vendors(&self) -> &'static [PciVendorEntry] {
        self.vendors
    }

    pub fn vendor(&self, vendor_id: u16) -> Option<&'static PciVendorEntry> {
        self.vendors.iter().find(|v| v.vendor_id == vendor_id)
    }

    /// Table entries for `vendor_id` that carry `device_id`, in table order.
    pub fn candidates(
        &self,
        vendor_id: u16,
        device_id: u16,
    ) -> impl Iterator<Item = &'static PciDeviceEntry> {
        self.vendor(vendor_id)
            .map(|v| v.devices)
            .unwrap_or(&[])
            .iter()
            .filter(move |d| d.device_id == device_id)
    }

    /// Human-readable listing: one line per vendor, then one per device.
    ///
    /// ```text
    /// 0x10DE
    /// 0x10DE 0x15F7 PCI::GPU::P100
    /// ```
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for vendor in self.vendors {
            let _ = writeln!(out, "0x{:04X}", vendor.vendor_id);
            for device in vendor.devices {
                let _ = writeln!(
                    out,
                    "0x{:04X} 0x{:04X} {}",
                    vendor.vendor_id, device.device_id, device.feature
                );
            }
        }
        out
    }
}
