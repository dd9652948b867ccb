//! Node features common types and errors.
//!
//! This crate provides foundational types shared by the cpuinfo engine:
//! - The unified error type and its categories
//! - Output format specifications for the CLI

pub mod error;
pub mod output;

pub use error::{Error, ErrorCategory, Result};
pub use output::OutputFormat;
