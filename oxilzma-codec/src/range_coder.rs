//! Range coder for LZMA compression.
//!
//! The range coder is a binary arithmetic coder. LZMA uses a variant with:
//! - 32-bit range tracking
//! - Normalization when range drops below 2^24
//! - 11-bit adaptive probabilities (1024 = 50%), adapted with shift 5
//! - Byte-wise carry propagation through a one-byte cache plus a run counter
//!
//! The encoder accumulates output in memory; callers move it to their sink
//! with [`RangeEncoder::drain_to`] between symbols, so the per-bit calls
//! stay infallible.

use log::trace;
use oxilzma_core::buffer::InBuffer;
use oxilzma_core::error::{LzmaError, Result};
use std::io::{Read, Write};

/// Number of bits in probability model.
pub const PROB_BITS: u32 = 11;

/// Initial probability (50%).
pub const PROB_INIT: u16 = 1 << (PROB_BITS - 1);

/// Probability scale.
pub const PROB_MAX: u16 = 1 << PROB_BITS;

/// Number of bits to shift for probability update.
pub const MOVE_BITS: u32 = 5;

/// Top value for range normalization.
const TOP_VALUE: u32 = 1 << 24;

/// Adaptive probability that the next bit is 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitModel {
    prob: u16,
}

impl BitModel {
    /// New model at 50%.
    pub const fn new() -> Self {
        Self { prob: PROB_INIT }
    }

    /// Return to 50%.
    #[inline]
    pub fn reset(&mut self) {
        self.prob = PROB_INIT;
    }

    /// Current probability of a 0 bit, scaled by 2048.
    #[inline]
    pub fn probability(self) -> u16 {
        self.prob
    }

    #[inline(always)]
    fn bound(self, range: u32) -> u32 {
        (range >> PROB_BITS) * self.prob as u32
    }

    #[inline(always)]
    fn update(&mut self, bit: u32) {
        if bit == 0 {
            self.prob += (PROB_MAX - self.prob) >> MOVE_BITS;
        } else {
            self.prob -= self.prob >> MOVE_BITS;
        }
    }
}

impl Default for BitModel {
    fn default() -> Self {
        Self::new()
    }
}

/// Reset every model in a bank.
pub fn reset_models(models: &mut [BitModel]) {
    models.fill(BitModel::new());
}

/// Range decoder for LZMA decompression.
#[derive(Debug)]
pub struct RangeDecoder<R> {
    input: InBuffer<R>,
    range: u32,
    code: u32,
}

impl<R: Read> RangeDecoder<R> {
    /// Create a range decoder and read the 5 initial bytes.
    ///
    /// The first byte is always zero in a valid stream.
    pub fn new(reader: R) -> Result<Self> {
        let mut input = InBuffer::new(reader);

        if input.read_byte()? != 0x00 {
            return Err(LzmaError::data_error(0, "invalid range coder start byte"));
        }

        let mut code = 0u32;
        for _ in 0..4 {
            code = (code << 8) | input.read_byte()? as u32;
        }

        Ok(Self {
            input,
            range: 0xFFFF_FFFF,
            code,
        })
    }

    #[inline(always)]
    fn normalize(&mut self) -> Result<()> {
        if self.range < TOP_VALUE {
            self.range <<= 8;
            self.code = (self.code << 8) | self.input.read_byte()? as u32;
        }
        Ok(())
    }

    /// Decode a single bit with an adaptive model.
    #[inline]
    pub fn decode_bit(&mut self, model: &mut BitModel) -> Result<u32> {
        let bound = model.bound(self.range);

        let bit = if self.code < bound {
            self.range = bound;
            0
        } else {
            self.range -= bound;
            self.code -= bound;
            1
        };
        model.update(bit);

        self.normalize()?;
        Ok(bit)
    }

    /// Decode `count` bits with fixed 50% probability, MSB first.
    pub fn decode_direct_bits(&mut self, count: u32) -> Result<u32> {
        let mut result = 0u32;
        for _ in 0..count {
            self.range >>= 1;
            let bit = if self.code >= self.range {
                self.code -= self.range;
                1
            } else {
                0
            };
            result = (result << 1) | bit;
            self.normalize()?;
        }
        Ok(result)
    }

    /// Compressed bytes consumed so far.
    pub fn processed(&self) -> u64 {
        self.input.processed()
    }

    /// Whether the decoder stopped on a clean boundary.
    ///
    /// An encoder's final flush leaves `code == 0`.
    pub fn is_finished_ok(&self) -> bool {
        self.code == 0
    }
}

/// Range encoder for LZMA compression.
#[derive(Debug)]
pub struct RangeEncoder {
    /// Bytes not yet drained to a sink.
    buffer: Vec<u8>,
    /// Current range.
    range: u32,
    /// Low value; bit 32 holds a pending carry.
    low: u64,
    /// Byte held back until its carry is known.
    cache: u8,
    /// Cached byte plus the run of 0xFF bytes behind it.
    cache_size: u64,
    /// Bytes drained so far.
    drained: u64,
}

impl RangeEncoder {
    /// Create a new range encoder.
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            range: 0xFFFF_FFFF,
            low: 0,
            cache: 0,
            cache_size: 1,
            drained: 0,
        }
    }

    /// Return to the initial state, discarding pending output.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.range = 0xFFFF_FFFF;
        self.low = 0;
        self.cache = 0;
        self.cache_size = 1;
        self.drained = 0;
    }

    /// Emit the top byte of `low`, resolving carries.
    fn shift_low(&mut self) {
        if (self.low as u32) < 0xFF00_0000 || (self.low >> 32) != 0 {
            let carry = (self.low >> 32) as u8;
            let mut byte = self.cache;
            loop {
                self.buffer.push(byte.wrapping_add(carry));
                byte = 0xFF;
                self.cache_size -= 1;
                if self.cache_size == 0 {
                    break;
                }
            }
            self.cache = (self.low >> 24) as u8;
        }
        self.cache_size += 1;
        self.low = ((self.low as u32) << 8) as u64;
    }

    #[inline(always)]
    fn normalize(&mut self) {
        while self.range < TOP_VALUE {
            self.range <<= 8;
            self.shift_low();
        }
    }

    /// Encode a single bit with an adaptive model.
    #[inline]
    pub fn encode_bit(&mut self, model: &mut BitModel, bit: u32) {
        let bound = model.bound(self.range);

        if bit == 0 {
            self.range = bound;
        } else {
            self.low += bound as u64;
            self.range -= bound;
        }
        model.update(bit);

        self.normalize();
    }

    /// Encode the low `count` bits of `value` with fixed probability, MSB first.
    pub fn encode_direct_bits(&mut self, value: u32, count: u32) {
        for i in (0..count).rev() {
            self.range >>= 1;
            if (value >> i) & 1 != 0 {
                self.low += self.range as u64;
            }
            self.normalize();
        }
    }

    /// Flush the coder state. Call once after the last symbol.
    pub fn finish(&mut self) {
        for _ in 0..5 {
            self.shift_low();
        }
        trace!("range encoder finished, {} bytes total", self.total_out());
    }

    /// Move pending output to `sink`.
    pub fn drain_to<W: Write>(&mut self, sink: &mut W) -> Result<()> {
        if !self.buffer.is_empty() {
            sink.write_all(&self.buffer)?;
            self.drained += self.buffer.len() as u64;
            self.buffer.clear();
        }
        Ok(())
    }

    /// Output bytes produced so far, drained or pending.
    ///
    /// Bytes still held in the carry cache are not counted.
    pub fn total_out(&self) -> u64 {
        self.drained + self.buffer.len() as u64
    }

    /// Bytes waiting to be drained.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Take the pending output.
    pub fn take_output(&mut self) -> Vec<u8> {
        self.drained += self.buffer.len() as u64;
        std::mem::take(&mut self.buffer)
    }
}

impl Default for RangeEncoder {
    fn default() -> Self {
        Self::new()
    }
}
