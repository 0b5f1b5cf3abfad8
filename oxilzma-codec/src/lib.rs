//! # OxiLZMA Codec
//!
//! Pure Rust LZMA compression and decompression.
//!
//! The crate works on raw LZMA streams (range-coded data with no header) and
//! on LZMA-alone framed streams (`.lzma` files, see [`framed`]).
//!
//! ## Example
//!
//! ```rust
//! use oxilzma_codec::{EncoderConfig, LzmaLevel, compress, decompress};
//!
//! let data = b"Hello, World! Hello, World!";
//! let config = EncoderConfig::from_level(LzmaLevel::DEFAULT);
//! let compressed = compress(&config, data)?;
//! let restored = decompress(&config.properties, &compressed, Some(data.len() as u64))?;
//! assert_eq!(restored, data);
//! # Ok::<(), oxilzma_core::LzmaError>(())
//! ```
//!
//! ## Stream structure
//!
//! A raw stream is a sequence of range-coded symbols:
//! 1. Literal: one byte, coded against the previous byte (and, after a match,
//!    against the byte at the last distance)
//! 2. Match: new distance plus length
//! 3. Rep match: one of the four most recent distances plus length
//! 4. Short rep: one byte from the most recent distance
//!
//! An optional end marker (a match with distance `0xFFFFFFFF`) terminates
//! streams whose length is not known in advance.
//!
//! The algorithm uses:
//! - LZ77-style back-references into a sliding window
//! - Range coding for entropy encoding
//! - Context-dependent adaptive probability models

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bit_tree;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod framed;
pub mod match_finder;
pub mod model;
pub mod range_coder;

// Re-exports
pub use config::{EncoderConfig, MatchStrategy};
pub use decoder::{LzmaDecoder, decompress};
pub use encoder::{LzmaEncoder, compress};
pub use framed::{
    FramedHeader, HEADER_SIZE, compress_framed, compress_framed_to, decompress_framed,
    decompress_framed_to,
};
pub use match_finder::{Decision, MatchFinder};
pub use model::{LzmaModel, Properties, State};
pub use range_coder::{RangeDecoder, RangeEncoder};

/// LZMA compression level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LzmaLevel(u8);

impl LzmaLevel {
    /// Fastest compression (level 0).
    pub const FAST: Self = Self(0);
    /// Default compression (level 6).
    pub const DEFAULT: Self = Self(6);
    /// Best compression (level 9).
    pub const BEST: Self = Self(9);

    /// Create a new compression level, clamped to 9.
    pub fn new(level: u8) -> Self {
        Self(level.min(9))
    }

    /// Get the level value.
    pub fn level(&self) -> u8 {
        self.0
    }

    /// Get the dictionary size for this level.
    pub fn dict_size(&self) -> u32 {
        match self.0 {
            0 => 1 << 16, // 64 KB
            1 => 1 << 18, // 256 KB
            2 => 1 << 19, // 512 KB
            3 => 1 << 20, // 1 MB
            4 => 1 << 21, // 2 MB
            5 => 1 << 22, // 4 MB
            6 => 1 << 23, // 8 MB
            7 => 1 << 24, // 16 MB
            8 => 1 << 25, // 32 MB
            _ => 1 << 26, // 64 MB
        }
    }
}

impl Default for LzmaLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Compress to a framed stream at `level`.
pub fn compress_bytes(data: &[u8], level: LzmaLevel) -> oxilzma_core::Result<Vec<u8>> {
    compress_framed(&EncoderConfig::from_level(level), data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level() {
        assert_eq!(LzmaLevel::FAST.level(), 0);
        assert_eq!(LzmaLevel::DEFAULT.level(), 6);
        assert_eq!(LzmaLevel::BEST.level(), 9);
        assert_eq!(LzmaLevel::default(), LzmaLevel::DEFAULT);
    }

    #[test]
    fn test_level_clamp() {
        assert_eq!(LzmaLevel::new(100).level(), 9);
    }

    #[test]
    fn test_dict_size() {
        assert_eq!(LzmaLevel::FAST.dict_size(), 1 << 16);
        assert_eq!(LzmaLevel::DEFAULT.dict_size(), 1 << 23);
        assert_eq!(LzmaLevel::BEST.dict_size(), 1 << 26);
    }

    #[test]
    fn test_compress_bytes() {
        let data = b"level one level one level one";
        let framed = compress_bytes(data, LzmaLevel::new(1)).unwrap();
        assert_eq!(decompress_framed(&framed).unwrap(), data);
    }
}
