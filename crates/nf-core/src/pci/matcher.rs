//! Match enumerated PCI devices against the vendor table.

use nf_config::PciSettings;
use tracing::debug;

use super::bus::PciBus;
use super::table::PciVendorTable;
use super::PciError;
use crate::features::append_list;
use crate::logging::event_names;

/// Turns the devices on a bus into `PCI::` feature strings.
#[derive(Debug, Clone, Copy)]
pub struct PciDeviceMatcher {
    table: PciVendorTable,
    device_class: u32,
    device_class_mask: u32,
}

impl PciDeviceMatcher {
    pub fn new(table: PciVendorTable, device_class: u32, device_class_mask: u32) -> Self {
        PciDeviceMatcher {
            table,
            device_class,
            device_class_mask,
        }
    }

    /// Built-in table with the configured class filter.
    pub fn from_settings(settings: &PciSettings) -> Self {
        Self::new(
            PciVendorTable::builtin(),
            settings.device_class,
            settings.device_class_mask,
        )
    }

    pub fn table(&self) -> &PciVendorTable {
        &self.table
    }

    /// Comma-joined features for every recognized device on `bus`.
    ///
    /// A feature already contained in the accumulated list is not added
    /// again. The check is substring containment, so a feature name that
    /// occurs inside an earlier one is treated as present. Returns `None`
    /// when nothing matched.
    pub fn match_devices(&self, bus: &dyn PciBus) -> Result<Option<String>, PciError> {
        let devices = bus.devices(self.device_class, self.device_class_mask)?;

        let mut result = String::new();
        for device in &devices {
            for entry in self.table.candidates(device.vendor_id, device.device_id) {
                if result.contains(entry.feature) {
                    continue;
                }
                append_list(&mut result, entry.feature);
                break;
            }
        }

        debug!(
            event = event_names::PCI_MATCHED,
            devices = devices.len(),
            features = %result,
            "matched PCI devices"
        );
        Ok(if result.is_empty() { None } else { Some(result) })
    }
}
