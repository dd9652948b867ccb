//! cpuinfo parsing: line reader, field registry, value normalizers.

pub mod cache_size;
pub mod extract;
pub mod isa;
pub mod model_name;
pub mod reader;
pub mod registry;

pub use cache_size::parse_cache_size;
pub use extract::{CpuFeatureExtractor, CpuFeatures, LineError};
pub use isa::{IsaFlags, IsaToken};
pub use model_name::normalize_model_name;
pub use reader::{LineReader, Lines, ReaderError};
pub use registry::{DecodeError, Decoder, FieldParser, FieldParserRegistry, TextField};
