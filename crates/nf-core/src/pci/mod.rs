//! PCI device detection, built with the `pci` cargo feature.
//!
//! Recognized accelerators contribute `PCI::` features ahead of the
//! cpuinfo-derived ones.

pub mod bus;
pub mod matcher;
pub mod table;

use std::path::PathBuf;

use thiserror::Error;

pub use bus::{PciBus, PciDevice, StaticPciBus, SysfsPciBus};
pub use matcher::PciDeviceMatcher;
pub use table::{PciDeviceEntry, PciVendorEntry, PciVendorTable};

/// PCI enumeration failures.
#[derive(Debug, Error)]
pub enum PciError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed PCI attribute {path}: {value:?}")]
    Parse { path: PathBuf, value: String },
}

impl From<PciError> for nf_common::Error {
    fn from(err: PciError) -> Self {
        nf_common::Error::PciEnumeration(err.to_string())
    }
}
