//! Chunked line reader for cpuinfo-formatted streams.
//!
//! The reader pulls fixed-size chunks from the underlying stream and copies
//! bytes into a growable line buffer until a terminator is seen. Lines end
//! on `'\n'` or on an embedded NUL byte, so binary or truncated input can
//! never stall the reader. Each returned line is trimmed of leading and
//! trailing whitespace.
//!
//! The line buffer starts at [`INITIAL_LINE_CAPACITY`] bytes and doubles
//! whenever a line outgrows it. A failed growth aborts the current line and
//! is reported through [`LineReader::error`] once the sequence ends.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use thiserror::Error;

/// Smallest chunk the reader will pull from the stream.
pub const MIN_CHUNK_SIZE: usize = 128;

/// Line buffer capacity after the first allocation.
pub const INITIAL_LINE_CAPACITY: usize = 128;

/// Errors that end a line sequence early.
#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("stream read failed: {0}")]
    Io(#[from] io::Error),

    #[error("out of memory growing line buffer to {requested} bytes")]
    OutOfMemory { requested: usize },
}

/// Whitespace as the C locale's `isspace` sees it.
pub(crate) fn is_c_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r')
}

/// Streaming line reader over any [`Read`] source.
///
/// Not an [`Iterator`]: [`next_line`](LineReader::next_line) lends the
/// internal buffer. Use [`into_lines`](LineReader::into_lines) for owned
/// lines.
#[derive(Debug)]
pub struct LineReader<R> {
    stream: R,
    error: Option<ReaderError>,
    finished: bool,

    line: Vec<u8>,
    capacity: usize,
    max_capacity: usize,

    chunk: Box<[u8]>,
    pos: usize,
    end: usize,
}

impl LineReader<File> {
    /// Open `path` for reading with the given chunk size.
    pub fn open(path: &Path, chunk_size: usize) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::with_chunk_size(file, chunk_size))
    }
}

impl<R: Read> LineReader<R> {
    /// Create a reader with the minimum chunk size.
    pub fn new(stream: R) -> Self {
        Self::with_chunk_size(stream, MIN_CHUNK_SIZE)
    }

    /// Create a reader; chunk sizes below [`MIN_CHUNK_SIZE`] are raised to it.
    pub fn with_chunk_size(stream: R, chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(MIN_CHUNK_SIZE);
        LineReader {
            stream,
            error: None,
            finished: false,
            line: Vec::new(),
            capacity: 0,
            max_capacity: usize::MAX,
            chunk: vec![0u8; chunk_size].into_boxed_slice(),
            pos: 0,
            end: 0,
        }
    }

    /// Refuse to grow the line buffer past `limit` bytes.
    ///
    /// A line that would need more is treated as an allocation failure.
    pub fn with_max_line_capacity(mut self, limit: usize) -> Self {
        self.max_capacity = limit;
        self
    }

    /// Chunk size in effect.
    pub fn chunk_size(&self) -> usize {
        self.chunk.len()
    }

    /// The error that ended the sequence, if any.
    ///
    /// A clean end of stream leaves this `None`.
    pub fn error(&self) -> Option<&ReaderError> {
        self.error.as_ref()
    }

    /// Take ownership of the error that ended the sequence.
    pub fn take_error(&mut self) -> Option<ReaderError> {
        self.error.take()
    }

    /// Read the next trimmed line.
    ///
    /// Returns `None` at end of stream or after an error; check
    /// [`error`](LineReader::error) to tell the two apart.
    pub fn next_line(&mut self) -> Option<&str> {
        if self.finished {
            return None;
        }
        self.line.clear();

        loop {
            if self.pos < self.end {
                let pending = &self.chunk[self.pos..self.end];
                let (take, terminated) = match pending.iter().position(|&b| b == b'\n' || b == 0)
                {
                    Some(idx) => (idx, true),
                    None => (pending.len(), false),
                };

                if let Err(e) = self.grow_to(self.line.len() + take) {
                    return self.fail(e);
                }
                self.line
                    .extend_from_slice(&self.chunk[self.pos..self.pos + take]);
                self.pos += take;

                if terminated {
                    // Skip the terminator itself.
                    self.pos += 1;
                    return self.finish_line();
                }
            }

            match self.fill() {
                Ok(0) => {
                    self.finished = true;
                    if self.line.is_empty() {
                        return None;
                    }
                    return self.finish_line();
                }
                Ok(n) => {
                    self.pos = 0;
                    self.end = n;
                }
                Err(e) => return self.fail(ReaderError::Io(e)),
            }
        }
    }

    /// Convert into an iterator of owned lines.
    pub fn into_lines(self) -> Lines<R> {
        Lines { reader: self }
    }

    fn fill(&mut self) -> io::Result<usize> {
        loop {
            match self.stream.read(&mut self.chunk) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                other => return other,
            }
        }
    }

    fn fail(&mut self, err: ReaderError) -> Option<&str> {
        self.error = Some(err);
        self.finished = true;
        self.line.clear();
        None
    }

    /// Grow the tracked capacity by doubling until `needed` fits.
    fn grow_to(&mut self, needed: usize) -> Result<(), ReaderError> {
        if needed <= self.capacity {
            return Ok(());
        }
        let mut new_capacity = self.capacity;
        while new_capacity < needed {
            new_capacity = if new_capacity == 0 {
                INITIAL_LINE_CAPACITY
            } else {
                new_capacity
                    .checked_mul(2)
                    .ok_or(ReaderError::OutOfMemory { requested: usize::MAX })?
            };
        }
        if new_capacity > self.max_capacity {
            return Err(ReaderError::OutOfMemory {
                requested: new_capacity,
            });
        }
        self.line
            .try_reserve_exact(new_capacity - self.line.len())
            .map_err(|_| ReaderError::OutOfMemory {
                requested: new_capacity,
            })?;
        self.capacity = new_capacity;
        Ok(())
    }

    fn finish_line(&mut self) -> Option<&str> {
        trim_in_place(&mut self.line);

        if std::str::from_utf8(&self.line).is_err() {
            let repaired = String::from_utf8_lossy(&self.line).into_owned();
            self.line.clear();
            if let Err(e) = self.grow_to(repaired.len()) {
                return self.fail(e);
            }
            self.line.extend_from_slice(repaired.as_bytes());
        }

        std::str::from_utf8(&self.line).ok()
    }
}

/// Strip leading and trailing C whitespace without reallocating.
fn trim_in_place(line: &mut Vec<u8>) {
    while line.last().is_some_and(|&b| is_c_space(b)) {
        line.pop();
    }
    let lead = line.iter().take_while(|&&b| is_c_space(b)).count();
    if lead > 0 {
        line.drain(..lead);
    }
}

/// Owned-line iterator over a [`LineReader`].
#[derive(Debug)]
pub struct Lines<R> {
    reader: LineReader<R>,
}

impl<R: Read> Lines<R> {
    /// The error that ended iteration, if any.
    pub fn error(&self) -> Option<&ReaderError> {
        self.reader.error()
    }

    /// Recover the reader (and its error state).
    pub fn into_inner(self) -> LineReader<R> {
        self.reader
    }
}

impl<R: Read> Iterator for Lines<R> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.reader.next_line().map(str::to_owned)
    }
}
