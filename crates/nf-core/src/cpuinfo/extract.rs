//! Extraction of a [`CpuFeatures`] record from cpuinfo-formatted text.
//!
//! Only the first record (up to the first blank line) is consumed. Lines
//! that cannot be attributed to a known field are skipped; they never fail
//! the extraction. Only I/O and allocation failures do.

use std::io::Read;
use std::path::Path;

use nf_common::{Error, Result};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, trace};

use super::isa::IsaFlags;
use super::reader::{is_c_space, LineReader, ReaderError, MIN_CHUNK_SIZE};
use super::registry::{DecodeError, FieldParserRegistry};

/// Hardware facts gathered from one cpuinfo record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CpuFeatures {
    vendor_id: Option<String>,
    model_name: Option<String>,
    cache_kb: u32,
    isa_flags: IsaFlags,
}

impl CpuFeatures {
    pub fn vendor_id(&self) -> Option<&str> {
        self.vendor_id.as_deref()
    }

    pub fn model_name(&self) -> Option<&str> {
        self.model_name.as_deref()
    }

    /// Cache size in kilobytes; 0 means unknown.
    pub fn cache_kb(&self) -> u32 {
        self.cache_kb
    }

    pub fn isa_flags(&self) -> IsaFlags {
        self.isa_flags
    }

    /// True when no field was populated.
    pub fn is_empty(&self) -> bool {
        self.vendor_id.is_none()
            && self.model_name.is_none()
            && self.cache_kb == 0
            && self.isa_flags.is_empty()
    }

    /// Clear every field at once.
    pub fn reset(&mut self) {
        *self = CpuFeatures::default();
    }

    pub(crate) fn set_vendor_id(&mut self, vendor_id: String) {
        self.vendor_id = Some(vendor_id);
    }

    pub(crate) fn set_model_name(&mut self, model_name: String) {
        self.model_name = Some(model_name);
    }

    pub(crate) fn set_cache_kb(&mut self, cache_kb: u32) {
        self.cache_kb = cache_kb;
    }

    pub(crate) fn set_isa_flags(&mut self, flags: IsaFlags) {
        self.isa_flags = flags;
    }
}

/// Why a single line contributed nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    #[error("blank line ends the record")]
    Blank,

    #[error("no ':' separator")]
    NoColon,

    #[error("unknown keyword {0:?}")]
    UnknownKeyword(String),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Outcome of feeding lines to the extractor.
enum Flow {
    Continue,
    EndOfRecord,
}

/// Drives the field registry over the lines of one cpuinfo record.
#[derive(Debug, Clone)]
pub struct CpuFeatureExtractor {
    registry: FieldParserRegistry,
    chunk_size: usize,
}

impl Default for CpuFeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuFeatureExtractor {
    pub fn new() -> Self {
        CpuFeatureExtractor {
            registry: FieldParserRegistry::cpuinfo(),
            chunk_size: MIN_CHUNK_SIZE,
        }
    }

    /// Read sources in chunks of `chunk_size` bytes (at least 128).
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Extract features from the file at `path`.
    pub fn extract_file(&self, path: &Path) -> Result<CpuFeatures> {
        let reader = LineReader::open(path, self.chunk_size).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;
        self.drive(reader).map_err(|e| match e {
            ReaderError::Io(source) => Error::Read {
                path: path.to_path_buf(),
                source,
            },
            ReaderError::OutOfMemory { requested } => Error::OutOfMemory { requested },
        })
    }

    /// Extract features from any byte stream.
    pub fn extract_reader<R: Read>(&self, stream: R) -> Result<CpuFeatures> {
        self.drive(LineReader::with_chunk_size(stream, self.chunk_size))
            .map_err(Error::from)
    }

    /// Extract features from already-split lines.
    pub fn extract_lines<I, S>(&self, lines: I) -> CpuFeatures
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut features = CpuFeatures::default();
        for line in lines {
            let line = line.as_ref().trim_matches(is_c_space_char);
            if let Flow::EndOfRecord = self.feed(line, &mut features) {
                break;
            }
        }
        features
    }

    /// Apply one trimmed line to `features`.
    pub fn parse_line(
        &self,
        line: &str,
        features: &mut CpuFeatures,
    ) -> std::result::Result<(), LineError> {
        if line.is_empty() {
            return Err(LineError::Blank);
        }
        let (key, value) = line.split_once(':').ok_or(LineError::NoColon)?;
        let key = key.trim_end_matches(is_c_space_char);
        let value = value.trim_start_matches(is_c_space_char);

        let decoder = self
            .registry
            .lookup(key)
            .ok_or_else(|| LineError::UnknownKeyword(key.to_string()))?;
        decoder.apply(value, features)?;
        Ok(())
    }

    fn drive<R: Read>(
        &self,
        mut reader: LineReader<R>,
    ) -> std::result::Result<CpuFeatures, ReaderError> {
        let mut features = CpuFeatures::default();
        while let Some(line) = reader.next_line() {
            if let Flow::EndOfRecord = self.feed(line, &mut features) {
                break;
            }
        }
        match reader.take_error() {
            Some(err) => Err(err),
            None => Ok(features),
        }
    }

    fn feed(&self, line: &str, features: &mut CpuFeatures) -> Flow {
        match self.parse_line(line, features) {
            Ok(()) => Flow::Continue,
            Err(LineError::Blank) => {
                debug!("end of first cpuinfo record");
                Flow::EndOfRecord
            }
            Err(err) => {
                trace!(line, error = %err, "skipping cpuinfo line");
                Flow::Continue
            }
        }
    }
}

fn is_c_space_char(c: char) -> bool {
    c.is_ascii() && is_c_space(c as u8)
}

impl From<ReaderError> for Error {
    fn from(err: ReaderError) -> Self {
        match err {
            ReaderError::Io(e) => Error::Io(e),
            ReaderError::OutOfMemory { requested } => Error::OutOfMemory { requested },
        }
    }
}
