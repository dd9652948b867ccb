//! `TYPE::VALUE` feature strings: ownership and rendering.

use crate::cpuinfo::CpuFeatures;

/// Whether PCI-prefixed features are produced and recognized.
pub const PCI_DETECTION: bool = cfg!(feature = "pci");

/// Kinds of feature strings this engine emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    Vendor,
    Model,
    Cache,
    Isa,
    Pci,
}

impl FeatureKind {
    /// Every kind, in render order of the cpuinfo record.
    pub const ALL: [FeatureKind; 5] = [
        FeatureKind::Vendor,
        FeatureKind::Model,
        FeatureKind::Cache,
        FeatureKind::Isa,
        FeatureKind::Pci,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            FeatureKind::Vendor => "VENDOR::",
            FeatureKind::Model => "MODEL::",
            FeatureKind::Cache => "CACHE::",
            FeatureKind::Isa => "ISA::",
            FeatureKind::Pci => "PCI::",
        }
    }

    /// Whether this build claims the kind as its own.
    pub fn is_enabled(self) -> bool {
        self != FeatureKind::Pci || PCI_DETECTION
    }

    /// Format `value` as a feature string of this kind.
    pub fn feature(self, value: impl std::fmt::Display) -> String {
        format!("{}{}", self.prefix(), value)
    }
}

/// Split an owned feature string into its kind and value.
pub fn parse_feature(token: &str) -> Option<(FeatureKind, &str)> {
    FeatureKind::ALL
        .into_iter()
        .filter(|kind| kind.is_enabled())
        .find_map(|kind| token.strip_prefix(kind.prefix()).map(|value| (kind, value)))
}

/// True iff `token` starts with one of this engine's prefixes.
pub fn is_owned(token: &str) -> bool {
    parse_feature(token).is_some()
}

/// Render a record as a comma-joined feature list.
///
/// `pci_extra` is an already-joined list placed in front. Returns `None`
/// when nothing would be emitted.
pub fn render(features: &CpuFeatures, pci_extra: Option<&str>) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();

    if let Some(pci) = pci_extra.filter(|p| !p.is_empty()) {
        parts.push(pci.to_string());
    }
    // An empty value is an absent field, never a bare `VENDOR::`.
    if let Some(vendor) = features.vendor_id().filter(|v| !v.is_empty()) {
        parts.push(FeatureKind::Vendor.feature(vendor));
    }
    if let Some(model) = features.model_name().filter(|m| !m.is_empty()) {
        parts.push(FeatureKind::Model.feature(model));
        // Cache size is only reported alongside a model name.
        parts.push(FeatureKind::Cache.feature(format!("{}KB", features.cache_kb())));
    }
    parts.extend(
        features
            .isa_flags()
            .tokens()
            .map(|token| FeatureKind::Isa.feature(token)),
    );

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(","))
    }
}
