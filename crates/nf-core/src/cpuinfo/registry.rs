//! Keyword to decoder dispatch for cpuinfo fields.
//!
//! Each registration pairs a field keyword with a [`Decoder`] variant that
//! names both the normalization to run and the record field it writes.

use thiserror::Error;

use super::cache_size::parse_cache_size;
use super::extract::CpuFeatures;
use super::isa::IsaFlags;
use super::model_name::normalize_model_name;

/// Text fields copied verbatim into [`CpuFeatures`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    VendorId,
}

/// How a field value is decoded, and where it lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoder {
    /// Copy the raw value, replacing any previous one.
    CopyText(TextField),
    /// Parse a size with unit into `cache_kb`.
    CacheSize,
    /// Reduce a verbose model string to a compact token.
    ModelName,
    /// Rebuild the ISA bitmap from a `flags` line.
    IsaFlags,
}

/// A decoder rejected its value. The record field is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unrecognized cache size: {0:?}")]
    CacheSize(String),

    #[error("no model token in: {0:?}")]
    ModelName(String),
}

impl Decoder {
    /// Decode `value` into `features`.
    pub fn apply(self, value: &str, features: &mut CpuFeatures) -> Result<(), DecodeError> {
        match self {
            Decoder::CopyText(TextField::VendorId) => {
                features.set_vendor_id(value.to_string());
            }
            Decoder::CacheSize => {
                let kb = parse_cache_size(value)
                    .ok_or_else(|| DecodeError::CacheSize(value.to_string()))?;
                features.set_cache_kb(kb);
            }
            Decoder::ModelName => {
                let model = normalize_model_name(value)
                    .ok_or_else(|| DecodeError::ModelName(value.to_string()))?;
                features.set_model_name(model);
            }
            Decoder::IsaFlags => {
                features.set_isa_flags(IsaFlags::from_flags_line(value));
            }
        }
        Ok(())
    }
}

/// One keyword registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldParser {
    pub keyword: &'static str,
    pub decoder: Decoder,
}

const CPUINFO_FIELDS: &[FieldParser] = &[
    FieldParser {
        keyword: "cache size",
        decoder: Decoder::CacheSize,
    },
    FieldParser {
        keyword: "flags",
        decoder: Decoder::IsaFlags,
    },
    FieldParser {
        keyword: "model name",
        decoder: Decoder::ModelName,
    },
    FieldParser {
        keyword: "vendor_id",
        decoder: Decoder::CopyText(TextField::VendorId),
    },
];

/// Static, ordered set of field registrations.
#[derive(Debug, Clone, Copy)]
pub struct FieldParserRegistry {
    fields: &'static [FieldParser],
}

impl FieldParserRegistry {
    /// The registrations for `/proc/cpuinfo`.
    pub const fn cpuinfo() -> Self {
        FieldParserRegistry {
            fields: CPUINFO_FIELDS,
        }
    }

    /// Find the decoder for `keyword`.
    ///
    /// Matching is case-insensitive and whole-keyword: neither a prefix nor
    /// an extension of a registered keyword matches.
    pub fn lookup(&self, keyword: &str) -> Option<Decoder> {
        self.fields
            .iter()
            .find(|f| f.keyword.eq_ignore_ascii_case(keyword))
            .map(|f| f.decoder)
    }

    /// Registrations in order.
    pub fn fields(&self) -> &'static [FieldParser] {
        self.fields
    }
}

impl Default for FieldParserRegistry {
    fn default() -> Self {
        Self::cpuinfo()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_exact_case_insensitive() {
        let registry = FieldParserRegistry::cpuinfo();
        assert_eq!(registry.lookup("flags"), Some(Decoder::IsaFlags));
        assert_eq!(registry.lookup("FLAGS"), Some(Decoder::IsaFlags));
        assert_eq!(registry.lookup("Model Name"), Some(Decoder::ModelName));
        assert_eq!(
            registry.lookup("vendor_id"),
            Some(Decoder::CopyText(TextField::VendorId))
        );
        assert_eq!(registry.lookup("cache size"), Some(Decoder::CacheSize));
    }

    #[test]
    fn test_lookup_rejects_prefix_and_superset() {
        let registry = FieldParserRegistry::cpuinfo();
        assert_eq!(registry.lookup("flag"), None);
        assert_eq!(registry.lookup("flagsx"), None);
        assert_eq!(registry.lookup("model"), None);
        assert_eq!(registry.lookup("cache size extra"), None);
        assert_eq!(registry.lookup(""), None);
        // "bugs" and "vmx flags" are real cpuinfo keys that must not match.
        assert_eq!(registry.lookup("vmx flags"), None);
    }

    #[test]
    fn test_apply_failures_leave_field() {
        let mut features = CpuFeatures::default();
        Decoder::CacheSize.apply("512 K", &mut features).unwrap();
        assert_eq!(features.cache_kb(), 512);

        let err = Decoder::CacheSize.apply("huge", &mut features).unwrap_err();
        assert_eq!(err, DecodeError::CacheSize("huge".to_string()));
        assert_eq!(features.cache_kb(), 512);

        Decoder::ModelName
            .apply("AMD EPYC 7502 32-Core Processor", &mut features)
            .unwrap();
        assert!(Decoder::ModelName.apply("Processor", &mut features).is_err());
        assert_eq!(features.model_name(), Some("EPYC_7502"));
    }

    #[test]
    fn test_copy_text_replaces() {
        let mut features = CpuFeatures::default();
        let decoder = Decoder::CopyText(TextField::VendorId);
        decoder.apply("GenuineIntel", &mut features).unwrap();
        decoder.apply("AuthenticAMD", &mut features).unwrap();
        assert_eq!(features.vendor_id(), Some("AuthenticAMD"));
    }
}
