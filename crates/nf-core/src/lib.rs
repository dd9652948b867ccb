//! cpuinfo node features engine.
//!
//! Extracts hardware capabilities from `/proc/cpuinfo` (and, with the
//! `pci` feature, the PCI bus), renders them as `TYPE::VALUE` feature
//! strings and reconciles them into host-owned feature lists:
//! - `cpuinfo`: line reader, field registry, value normalizers
//! - `features`: feature-string codec and list reconciliation
//! - `plugin`: cached, thread-safe host plugin object
//! - `logging` and `exit_codes` for the `nf-cpuinfo` binary

pub mod cpuinfo;
pub mod exit_codes;
pub mod features;
pub mod logging;
pub mod plugin;

#[cfg(feature = "pci")]
pub mod pci;

pub use cpuinfo::{CpuFeatureExtractor, CpuFeatures, IsaFlags, IsaToken};
pub use features::{is_owned, job_xlate, render, reorder, xlate};
pub use plugin::{CpuinfoPlugin, FeatureCache, NodeFeaturesPlugin};
