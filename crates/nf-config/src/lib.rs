//! Node features engine configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for `cpuinfo_features.json`
//! - Config resolution (CLI → env → XDG → system → defaults)
//! - Semantic validation

pub mod resolve;
pub mod settings;
pub mod validate;

pub use resolve::{resolve_config, ConfigSource, ResolvedPath};
pub use settings::{EngineConfig, PciSettings};
pub use validate::{validate_config, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";

/// Load the engine configuration using the standard resolution order.
///
/// Returns the built-in defaults (with [`ConfigSource::BuiltinDefault`]) when
/// no config file is found anywhere.
pub fn load_config(
    cli_path: Option<&std::path::Path>,
) -> ValidationResult<(EngineConfig, ResolvedPath)> {
    let resolved = resolve_config(cli_path);
    let config = match resolved.path {
        Some(ref path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    validate_config(&config)?;
    Ok((config, resolved))
}
