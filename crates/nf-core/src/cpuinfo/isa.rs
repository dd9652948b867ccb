//! Instruction-set extension tokens and the flag bitmap built from them.
//!
//! The token order is load-bearing: it is both the bit index and the order
//! in which `ISA::` features are rendered. New tokens go at the end.

use serde::{Serialize, Serializer};

bitflags::bitflags! {
    /// ISA extensions found on a cpuinfo `flags` line.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct IsaFlags: u32 {
        /// SSE
        const SSE = 1 << 0;
        /// SSE2
        const SSE2 = 1 << 1;
        /// SSSE3
        const SSSE3 = 1 << 2;
        /// SSE4.1
        const SSE4_1 = 1 << 3;
        /// SSE4.2
        const SSE4_2 = 1 << 4;
        /// AVX
        const AVX = 1 << 5;
        /// AVX2
        const AVX2 = 1 << 6;
        /// AVX512 Foundation
        const AVX512F = 1 << 7;
        /// AVX512 Double and Quad words
        const AVX512DQ = 1 << 8;
        /// AVX512 Conflict Detection
        const AVX512CD = 1 << 9;
        /// AVX512 Byte and Word
        const AVX512BW = 1 << 10;
        /// AVX512 Vector Length
        const AVX512VL = 1 << 11;
        /// AVX512 Vector Neural Network Instructions
        const AVX512_VNNI = 1 << 12;
    }
}

/// One named ISA extension, in bit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IsaToken {
    Sse,
    Sse2,
    Ssse3,
    Sse4_1,
    Sse4_2,
    Avx,
    Avx2,
    Avx512f,
    Avx512dq,
    Avx512cd,
    Avx512bw,
    Avx512vl,
    Avx512Vnni,
}

impl IsaToken {
    /// Every token, in bit (and render) order.
    pub const ALL: [IsaToken; 13] = [
        IsaToken::Sse,
        IsaToken::Sse2,
        IsaToken::Ssse3,
        IsaToken::Sse4_1,
        IsaToken::Sse4_2,
        IsaToken::Avx,
        IsaToken::Avx2,
        IsaToken::Avx512f,
        IsaToken::Avx512dq,
        IsaToken::Avx512cd,
        IsaToken::Avx512bw,
        IsaToken::Avx512vl,
        IsaToken::Avx512Vnni,
    ];

    /// Spelling on the cpuinfo `flags` line and in `ISA::` features.
    pub fn name(self) -> &'static str {
        match self {
            IsaToken::Sse => "sse",
            IsaToken::Sse2 => "sse2",
            IsaToken::Ssse3 => "ssse3",
            IsaToken::Sse4_1 => "sse4_1",
            IsaToken::Sse4_2 => "sse4_2",
            IsaToken::Avx => "avx",
            IsaToken::Avx2 => "avx2",
            IsaToken::Avx512f => "avx512f",
            IsaToken::Avx512dq => "avx512dq",
            IsaToken::Avx512cd => "avx512cd",
            IsaToken::Avx512bw => "avx512bw",
            IsaToken::Avx512vl => "avx512vl",
            IsaToken::Avx512Vnni => "avx512_vnni",
        }
    }

    /// Bit index of this token.
    pub fn bit(self) -> u32 {
        self as u32
    }

    /// Single-bit flag for this token.
    pub fn flag(self) -> IsaFlags {
        IsaFlags::from_bits_truncate(1 << self.bit())
    }

    /// Look up a token by its exact spelling.
    pub fn from_name(name: &str) -> Option<IsaToken> {
        IsaToken::ALL.into_iter().find(|t| t.name() == name)
    }
}

impl std::fmt::Display for IsaToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl Default for IsaFlags {
    fn default() -> Self {
        IsaFlags::empty()
    }
}

impl IsaFlags {
    /// Build the bitmap from a cpuinfo `flags` value.
    ///
    /// Only whole whitespace-delimited tokens count: `sse4_2xyz` does not
    /// set [`IsaFlags::SSE4_2`]. The result never depends on prior state.
    pub fn from_flags_line(text: &str) -> IsaFlags {
        let mut flags = IsaFlags::empty();
        for word in text.split_ascii_whitespace() {
            if let Some(token) = IsaToken::from_name(word) {
                flags |= token.flag();
            }
        }
        flags
    }

    /// Tokens present in this bitmap, in render order.
    pub fn tokens(self) -> impl Iterator<Item = IsaToken> {
        IsaToken::ALL
            .into_iter()
            .filter(move |t| self.contains(t.flag()))
    }
}

impl Serialize for IsaFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.tokens().map(IsaToken::name))
    }
}
