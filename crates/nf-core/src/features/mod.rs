//! Feature strings and feature-list reconciliation.

pub mod codec;
pub mod reconcile;

pub use codec::{is_owned, parse_feature, render, FeatureKind, PCI_DETECTION};
pub use reconcile::{append_list, append_optional, job_xlate, reorder, xlate};
