//! Event vocabulary shared by the library and the CLI.

use serde::{Deserialize, Serialize};

/// Log levels as they appear in JSONL output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

/// Where in the pipeline an event originates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Configuration and plugin lifecycle.
    Init,
    /// Reading and parsing cpuinfo.
    Extract,
    /// PCI bus enumeration and matching.
    Pci,
    /// Rendering feature strings.
    Render,
    /// Feature-list set operations.
    Reconcile,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Extract => "extract",
            Stage::Pci => "pci",
            Stage::Render => "render",
            Stage::Reconcile => "reconcile",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names, recorded in the `event` field.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    // Plugin lifecycle
    pub const PLUGIN_INIT: &str = "plugin.init";
    pub const PLUGIN_FINI: &str = "plugin.fini";
    pub const CACHE_INVALIDATED: &str = "cache.invalidated";

    // Extraction
    pub const EXTRACT_STARTED: &str = "extract.started";
    pub const EXTRACT_FINISHED: &str = "extract.finished";
    pub const EXTRACT_FAILED: &str = "extract.failed";

    // PCI
    pub const PCI_MATCHED: &str = "pci.matched";
    pub const PCI_FAILED: &str = "pci.failed";

    // Host calls
    pub const NODE_STATE: &str = "node.state";
    pub const RECONCILE_XLATE: &str = "reconcile.xlate";
    pub const RECONCILE_JOB_XLATE: &str = "reconcile.job_xlate";

    // Config
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";
    pub const CONFIG_ERROR: &str = "config.error";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_display_matches_serde() {
        for stage in [
            Stage::Init,
            Stage::Extract,
            Stage::Pci,
            Stage::Render,
            Stage::Reconcile,
        ] {
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(json, format!("\"{}\"", stage));
        }
    }

    #[test]
    fn test_level_from_tracing() {
        assert_eq!(Level::from(tracing::Level::DEBUG), Level::Debug);
        assert_eq!(Level::from(tracing::Level::WARN), Level::Warn);
        assert_eq!(serde_json::to_string(&Level::Warn).unwrap(), "\"warn\"");
    }

    #[test]
    fn test_event_names_are_dotted() {
        for name in [
            event_names::EXTRACT_STARTED,
            event_names::EXTRACT_FAILED,
            event_names::CACHE_INVALIDATED,
            event_names::PCI_FAILED,
            event_names::RECONCILE_XLATE,
        ] {
            assert!(name.contains('.'), "{name}");
        }
    }
}
