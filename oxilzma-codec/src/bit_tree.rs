//! Bit-tree coding of multi-bit symbols.
//!
//! A `k`-bit symbol is coded as `k` binary decisions through an implicit
//! binary tree of [`BitModel`]s. Node `m` starts at 1 and becomes
//! `(m << 1) | bit` after each decision, so a tree needs `2^k` models (slot 0
//! is unused).
//!
//! The free functions operate on a model slice whose node 1 is `models[1]`.
//! The distance coder's interleaved "special" table passes a sub-slice that
//! starts at the right offset, so owned trees and offset tables share one
//! implementation.

use crate::range_coder::{BitModel, RangeDecoder, RangeEncoder, reset_models};
use oxilzma_core::error::Result;
use std::io::Read;

/// Encode `symbol` MSB first.
#[inline]
pub fn encode(models: &mut [BitModel], rc: &mut RangeEncoder, num_bits: u32, symbol: u32) {
    let mut m = 1usize;
    for i in (0..num_bits).rev() {
        let bit = (symbol >> i) & 1;
        rc.encode_bit(&mut models[m], bit);
        m = (m << 1) | bit as usize;
    }
}

/// Decode a symbol MSB first.
#[inline]
pub fn decode<R: Read>(
    models: &mut [BitModel],
    rc: &mut RangeDecoder<R>,
    num_bits: u32,
) -> Result<u32> {
    let mut m = 1usize;
    for _ in 0..num_bits {
        m = (m << 1) | rc.decode_bit(&mut models[m])? as usize;
    }
    Ok((m - (1 << num_bits)) as u32)
}

/// Encode `symbol` LSB first.
#[inline]
pub fn reverse_encode(models: &mut [BitModel], rc: &mut RangeEncoder, num_bits: u32, symbol: u32) {
    let mut m = 1usize;
    let mut symbol = symbol;
    for _ in 0..num_bits {
        let bit = symbol & 1;
        symbol >>= 1;
        rc.encode_bit(&mut models[m], bit);
        m = (m << 1) | bit as usize;
    }
}

/// Decode a symbol LSB first.
#[inline]
pub fn reverse_decode<R: Read>(
    models: &mut [BitModel],
    rc: &mut RangeDecoder<R>,
    num_bits: u32,
) -> Result<u32> {
    let mut m = 1usize;
    let mut symbol = 0u32;
    for i in 0..num_bits {
        let bit = rc.decode_bit(&mut models[m])?;
        m = (m << 1) | bit as usize;
        symbol |= bit << i;
    }
    Ok(symbol)
}

/// Owned bit tree over `NUM_SYMBOLS = 2^k` models.
#[derive(Debug, Clone)]
pub struct BitTree<const NUM_SYMBOLS: usize> {
    models: [BitModel; NUM_SYMBOLS],
}

impl<const NUM_SYMBOLS: usize> BitTree<NUM_SYMBOLS> {
    /// Bits per symbol.
    pub const BITS: u32 = NUM_SYMBOLS.trailing_zeros();

    /// New tree with every model at 50%.
    pub const fn new() -> Self {
        Self {
            models: [BitModel::new(); NUM_SYMBOLS],
        }
    }

    /// Reset every model.
    pub fn reset(&mut self) {
        reset_models(&mut self.models);
    }

    /// Encode `symbol` MSB first.
    #[inline]
    pub fn encode(&mut self, rc: &mut RangeEncoder, symbol: u32) {
        encode(&mut self.models, rc, Self::BITS, symbol);
    }

    /// Decode a symbol MSB first.
    #[inline]
    pub fn decode<R: Read>(&mut self, rc: &mut RangeDecoder<R>) -> Result<u32> {
        decode(&mut self.models, rc, Self::BITS)
    }

    /// Encode `symbol` LSB first.
    #[inline]
    pub fn reverse_encode(&mut self, rc: &mut RangeEncoder, symbol: u32) {
        reverse_encode(&mut self.models, rc, Self::BITS, symbol);
    }

    /// Decode a symbol LSB first.
    #[inline]
    pub fn reverse_decode<R: Read>(&mut self, rc: &mut RangeDecoder<R>) -> Result<u32> {
        reverse_decode(&mut self.models, rc, Self::BITS)
    }
}

impl<const NUM_SYMBOLS: usize> Default for BitTree<NUM_SYMBOLS> {
    fn default() -> Self {
        Self::new()
    }
}
