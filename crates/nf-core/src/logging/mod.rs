//! Structured logging for the engine and the `nf-cpuinfo` CLI.
//!
//! Two output modes, both on stderr:
//! - Human-readable console output for interactive use
//! - JSONL for collection by the host's log pipeline
//!
//! Library code only emits `tracing` events with an `event` field drawn
//! from [`event_names`]; installing a subscriber is left to the binary (or
//! the host) through [`init_logging`].
//!
//! ```ignore
//! use nf_core::logging::{init_logging, generate_run_id, LogConfig, Stage};
//!
//! init_logging(&LogConfig::from_env(None, None));
//! let span = tracing::info_span!("run", run_id = %generate_run_id(), stage = %Stage::Init);
//! let _guard = span.enter();
//! ```

pub mod config;
pub mod events;
pub mod layer;

pub use config::{LogConfig, LogFormat, LogLevel};
pub use events::{event_names, Level, Stage};
pub use layer::JsonlLayer;

use std::io::IsTerminal;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::fmt;

/// Install the global subscriber.
///
/// The level is the one [`LogConfig::from_env`] resolved; `RUST_LOG` only
/// counts through it. A second call is ignored.
pub fn init_logging(config: &LogConfig) {
    let filter = config.env_filter();

    let _ = match config.format {
        LogFormat::Human => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(std::io::stderr().is_terminal());

            if config.timestamps {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer)
                    .try_init()
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer.without_time())
                    .try_init()
            }
        }
        LogFormat::Jsonl => tracing_subscriber::registry()
            .with(filter)
            .with(JsonlLayer::stderr())
            .try_init(),
    };
}

/// Unique ID for one CLI invocation or plugin instance.
pub fn generate_run_id() -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("run-{}", &uuid[..12])
}
