//! LZMA probability models and the state machine.
//!
//! LZMA uses context-dependent probability models for:
//! - Literal coding (context = previous byte high bits + position low bits)
//! - Match length coding (per position state)
//! - Distance coding (slot, reverse-coded middle bits, alignment bits)
//! - Symbol kind decisions, selected by a 12-state history classifier
//!
//! Every bank is a flat array indexed by a computed context. Encoder and
//! decoder use the same banks through mirrored `encode` / `decode` methods,
//! which keeps both sides in lockstep.

use crate::bit_tree::{self, BitTree};
use crate::range_coder::{BitModel, RangeDecoder, RangeEncoder, reset_models};
use oxilzma_core::error::{LzmaError, Result};
use std::io::Read;

/// Default number of literal context bits.
pub const LC_DEFAULT: u32 = 3;
/// Default number of literal position bits.
pub const LP_DEFAULT: u32 = 0;
/// Default number of position bits.
pub const PB_DEFAULT: u32 = 2;

/// Largest accepted `lc`.
pub const LC_MAX: u32 = 8;
/// Largest accepted `lp`.
pub const LP_MAX: u32 = 8;
/// Largest `lp` the property byte can carry.
pub const LP_MAX_SERIALIZED: u32 = 4;
/// Largest accepted `pb`.
pub const PB_MAX: u32 = 4;

/// Serialized size of [`Properties`].
pub const PROPERTIES_SIZE: usize = 5;

/// Maximum number of position states.
pub const POS_STATES_MAX: usize = 1 << PB_MAX;

/// Number of states in the LZMA state machine.
pub const NUM_STATES: usize = 12;

/// Number of bits for low length coding.
pub const LEN_LOW_BITS: u32 = 3;
/// Number of bits for mid length coding.
pub const LEN_MID_BITS: u32 = 3;
/// Number of bits for high length coding.
pub const LEN_HIGH_BITS: u32 = 8;

/// Number of low length symbols.
pub const LEN_LOW_SYMBOLS: usize = 1 << LEN_LOW_BITS;
/// Number of mid length symbols.
pub const LEN_MID_SYMBOLS: usize = 1 << LEN_MID_BITS;
/// Number of high length symbols.
pub const LEN_HIGH_SYMBOLS: usize = 1 << LEN_HIGH_BITS;

/// Minimum match length.
pub const MATCH_LEN_MIN: usize = 2;
/// Maximum match length.
pub const MATCH_LEN_MAX: usize = MATCH_LEN_MIN + LEN_LOW_SYMBOLS + LEN_MID_SYMBOLS + LEN_HIGH_SYMBOLS - 1;

/// Number of length states selecting a distance slot tree.
pub const LEN_TO_DIST_STATES: usize = 4;

/// Number of distance slots.
pub const DIST_SLOTS: usize = 64;
/// First slot carrying extra distance bits.
pub const START_POS_MODEL_INDEX: u32 = 4;
/// First slot coding its middle bits directly.
pub const END_POS_MODEL_INDEX: u32 = 14;
/// Distances covered by slots below [`END_POS_MODEL_INDEX`].
pub const FULL_DISTANCES: usize = 1 << (END_POS_MODEL_INDEX >> 1);

/// Number of alignment bits for distance encoding.
pub const DIST_ALIGN_BITS: u32 = 4;
/// Size of alignment table.
pub const DIST_ALIGN_SIZE: usize = 1 << DIST_ALIGN_BITS;

/// Distance that marks the end of a stream.
pub const END_MARKER_DISTANCE: u32 = 0xFFFF_FFFF;

/// Size of the reverse-coded distance table, plus one unused leading cell.
const SPECIAL_SIZE: usize = FULL_DISTANCES - END_POS_MODEL_INDEX as usize + 1;

/// Models per literal context.
const LITERAL_CODER_SIZE: usize = 0x300;

/// LZMA state machine state.
///
/// States below 7 follow a literal; 7..=11 follow a match, long rep or
/// short rep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct State(u8);

impl State {
    /// Initial state.
    pub const fn new() -> Self {
        Self(0)
    }

    /// Get state value.
    #[inline]
    pub fn value(self) -> usize {
        self.0 as usize
    }

    /// Check if the last symbol was a literal.
    #[inline]
    pub fn is_char_state(self) -> bool {
        self.0 < 7
    }

    /// Update state after literal.
    #[inline]
    pub fn update_char(&mut self) {
        self.0 = if self.0 < 4 {
            0
        } else if self.0 < 10 {
            self.0 - 3
        } else {
            self.0 - 6
        };
    }

    /// Update state after match.
    #[inline]
    pub fn update_match(&mut self) {
        self.0 = if self.0 < 7 { 7 } else { 10 };
    }

    /// Update state after long rep.
    #[inline]
    pub fn update_rep(&mut self) {
        self.0 = if self.0 < 7 { 8 } else { 11 };
    }

    /// Update state after short rep.
    #[inline]
    pub fn update_short_rep(&mut self) {
        self.0 = if self.0 < 7 { 9 } else { 11 };
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

/// Stream properties: literal context bits, literal position bits, position
/// bits and dictionary size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Properties {
    /// Literal context bits (0..=8).
    pub lc: u32,
    /// Literal position bits (0..=8; 0..=4 when serialized).
    pub lp: u32,
    /// Position bits (0..=4).
    pub pb: u32,
    /// Dictionary size in bytes.
    pub dictionary_size: u32,
}

impl Properties {
    /// Create validated properties.
    pub fn new(lc: u32, lp: u32, pb: u32, dictionary_size: u32) -> Result<Self> {
        let props = Self {
            lc,
            lp,
            pb,
            dictionary_size,
        };
        props.validate()?;
        Ok(props)
    }

    /// Check every field against its range.
    pub fn validate(&self) -> Result<()> {
        if self.lc > LC_MAX {
            return Err(LzmaError::invalid_parameter(format!(
                "lc = {} (max {LC_MAX})",
                self.lc
            )));
        }
        if self.lp > LP_MAX {
            return Err(LzmaError::invalid_parameter(format!(
                "lp = {} (max {LP_MAX})",
                self.lp
            )));
        }
        if self.pb > PB_MAX {
            return Err(LzmaError::invalid_parameter(format!(
                "pb = {} (max {PB_MAX})",
                self.pb
            )));
        }
        Ok(())
    }

    /// Parse the 5-byte properties header.
    ///
    /// Trailing bytes are ignored.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < PROPERTIES_SIZE {
            return Err(LzmaError::invalid_parameter(format!(
                "properties need {PROPERTIES_SIZE} bytes, got {}",
                bytes.len()
            )));
        }

        let d = bytes[0] as u32;
        let lc = d % 9;
        let lp = (d / 9) % 5;
        let pb = d / 45;
        let dictionary_size = u32::from_le_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]);

        Self::new(lc, lp, pb, dictionary_size)
    }

    /// Encode the property byte.
    pub fn properties_byte(&self) -> Result<u8> {
        self.validate()?;
        if self.lp > LP_MAX_SERIALIZED {
            return Err(LzmaError::invalid_parameter(format!(
                "lp = {} cannot be stored in a properties header (max {LP_MAX_SERIALIZED})",
                self.lp
            )));
        }
        Ok(((self.pb * 5 + self.lp) * 9 + self.lc) as u8)
    }

    /// Serialize as the 5-byte properties header.
    pub fn to_bytes(&self) -> Result<[u8; PROPERTIES_SIZE]> {
        let d = self.properties_byte()?;
        let [d0, d1, d2, d3] = self.dictionary_size.to_le_bytes();
        Ok([d, d0, d1, d2, d3])
    }

    /// Number of literal contexts.
    pub fn num_lit_states(&self) -> usize {
        1 << (self.lc + self.lp)
    }

    /// Number of position states.
    pub fn num_pos_states(&self) -> usize {
        1 << self.pb
    }

    /// Mask selecting the position state from a stream position.
    #[inline]
    pub fn pos_mask(&self) -> u32 {
        self.num_pos_states() as u32 - 1
    }

    /// Back-reference limit derived from the dictionary size.
    pub fn dictionary_size_check(&self) -> u32 {
        self.dictionary_size.max(1)
    }
}

impl Default for Properties {
    fn default() -> Self {
        Self {
            lc: LC_DEFAULT,
            lp: LP_DEFAULT,
            pb: PB_DEFAULT,
            dictionary_size: 1 << 23,
        }
    }
}

/// Length coder (match lengths or rep lengths).
#[derive(Debug, Clone)]
pub struct LengthCoder {
    choice: BitModel,
    choice2: BitModel,
    low: [BitTree<LEN_LOW_SYMBOLS>; POS_STATES_MAX],
    mid: [BitTree<LEN_MID_SYMBOLS>; POS_STATES_MAX],
    high: BitTree<LEN_HIGH_SYMBOLS>,
}

impl LengthCoder {
    /// Create a new length coder.
    pub fn new() -> Self {
        Self {
            choice: BitModel::new(),
            choice2: BitModel::new(),
            low: [const { BitTree::new() }; POS_STATES_MAX],
            mid: [const { BitTree::new() }; POS_STATES_MAX],
            high: BitTree::new(),
        }
    }

    /// Reset the models.
    pub fn reset(&mut self) {
        self.choice.reset();
        self.choice2.reset();
        self.low.iter_mut().for_each(BitTree::reset);
        self.mid.iter_mut().for_each(BitTree::reset);
        self.high.reset();
    }

    /// Encode a match length (`MATCH_LEN_MIN..=MATCH_LEN_MAX`).
    pub fn encode(&mut self, rc: &mut RangeEncoder, len: usize, pos_state: usize) {
        let symbol = (len - MATCH_LEN_MIN) as u32;
        if symbol < LEN_LOW_SYMBOLS as u32 {
            rc.encode_bit(&mut self.choice, 0);
            self.low[pos_state].encode(rc, symbol);
        } else if symbol < (LEN_LOW_SYMBOLS + LEN_MID_SYMBOLS) as u32 {
            rc.encode_bit(&mut self.choice, 1);
            rc.encode_bit(&mut self.choice2, 0);
            self.mid[pos_state].encode(rc, symbol - LEN_LOW_SYMBOLS as u32);
        } else {
            rc.encode_bit(&mut self.choice, 1);
            rc.encode_bit(&mut self.choice2, 1);
            self.high
                .encode(rc, symbol - (LEN_LOW_SYMBOLS + LEN_MID_SYMBOLS) as u32);
        }
    }

    /// Decode a match length.
    pub fn decode<R: Read>(&mut self, rc: &mut RangeDecoder<R>, pos_state: usize) -> Result<usize> {
        let symbol = if rc.decode_bit(&mut self.choice)? == 0 {
            self.low[pos_state].decode(rc)? as usize
        } else if rc.decode_bit(&mut self.choice2)? == 0 {
            LEN_LOW_SYMBOLS + self.mid[pos_state].decode(rc)? as usize
        } else {
            LEN_LOW_SYMBOLS + LEN_MID_SYMBOLS + self.high.decode(rc)? as usize
        };
        Ok(symbol + MATCH_LEN_MIN)
    }
}

impl Default for LengthCoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Literal coder: 0x300 models per literal context.
///
/// Models `1..0x100` form the plain byte tree. Models `0x100..0x300` are the
/// two match-biased trees used while decoded bits agree with the match byte.
#[derive(Debug, Clone)]
pub struct LiteralCoder {
    models: Vec<BitModel>,
    lc: u32,
    lp: u32,
}

impl LiteralCoder {
    /// Create a literal coder with one context per `lc` / `lp` combination
    /// of `props`.
    pub fn new(props: &Properties) -> Self {
        Self {
            models: vec![BitModel::new(); LITERAL_CODER_SIZE * props.num_lit_states()],
            lc: props.lc,
            lp: props.lp,
        }
    }

    /// Whether this coder was built for `lc` / `lp`.
    pub fn has_shape(&self, lc: u32, lp: u32) -> bool {
        self.lc == lc && self.lp == lp
    }

    /// Reset the models.
    pub fn reset(&mut self) {
        reset_models(&mut self.models);
    }

    /// Models of the context selected by `pos` and `prev_byte`.
    #[inline]
    fn context(&mut self, pos: u64, prev_byte: u8) -> &mut [BitModel] {
        let lp_mask = (1u64 << self.lp) - 1;
        let index = (((pos & lp_mask) as usize) << self.lc) + ((prev_byte as usize) >> (8 - self.lc));
        let start = index * LITERAL_CODER_SIZE;
        &mut self.models[start..start + LITERAL_CODER_SIZE]
    }

    /// Decode a literal with the plain byte tree.
    pub fn decode_normal<R: Read>(
        &mut self,
        rc: &mut RangeDecoder<R>,
        pos: u64,
        prev_byte: u8,
    ) -> Result<u8> {
        let models = self.context(pos, prev_byte);
        let mut symbol = 1usize;
        while symbol < 0x100 {
            symbol = (symbol << 1) | rc.decode_bit(&mut models[symbol])? as usize;
        }
        Ok(symbol as u8)
    }

    /// Decode a literal biased by the byte at rep0.
    pub fn decode_with_match_byte<R: Read>(
        &mut self,
        rc: &mut RangeDecoder<R>,
        pos: u64,
        prev_byte: u8,
        match_byte: u8,
    ) -> Result<u8> {
        let models = self.context(pos, prev_byte);
        let mut symbol = 1usize;
        let mut match_byte = match_byte as usize;

        while symbol < 0x100 {
            let match_bit = (match_byte >> 7) & 1;
            match_byte <<= 1;
            let bit = rc.decode_bit(&mut models[0x100 + (match_bit << 8) + symbol])? as usize;
            symbol = (symbol << 1) | bit;
            if match_bit != bit {
                while symbol < 0x100 {
                    symbol = (symbol << 1) | rc.decode_bit(&mut models[symbol])? as usize;
                }
                break;
            }
        }
        Ok(symbol as u8)
    }

    /// Encode a literal with the plain byte tree.
    pub fn encode_normal(&mut self, rc: &mut RangeEncoder, pos: u64, prev_byte: u8, byte: u8) {
        let models = self.context(pos, prev_byte);
        let mut symbol = 1usize;
        for i in (0..8).rev() {
            let bit = ((byte >> i) & 1) as u32;
            rc.encode_bit(&mut models[symbol], bit);
            symbol = (symbol << 1) | bit as usize;
        }
    }

    /// Encode a literal biased by the byte at rep0.
    pub fn encode_with_match_byte(
        &mut self,
        rc: &mut RangeEncoder,
        pos: u64,
        prev_byte: u8,
        match_byte: u8,
        byte: u8,
    ) {
        let models = self.context(pos, prev_byte);
        let mut symbol = 1usize;
        let mut same = true;
        for i in (0..8).rev() {
            let bit = ((byte >> i) & 1) as u32;
            let mut index = symbol;
            if same {
                let match_bit = ((match_byte >> i) & 1) as u32;
                index += 0x100 + ((match_bit as usize) << 8);
                same = match_bit == bit;
            }
            rc.encode_bit(&mut models[index], bit);
            symbol = (symbol << 1) | bit as usize;
        }
    }
}

/// Map a match length to the distance slot tree that codes its distance.
#[inline]
pub fn len_to_dist_state(len: usize) -> usize {
    (len - MATCH_LEN_MIN).min(LEN_TO_DIST_STATES - 1)
}

/// Distance slot of a (zero-based) distance.
#[inline]
pub fn dist_slot(distance: u32) -> u32 {
    if distance < START_POS_MODEL_INDEX {
        return distance;
    }
    let bits = 32 - distance.leading_zeros();
    ((bits - 1) << 1) | ((distance >> (bits - 2)) & 1)
}

/// Distance coder.
#[derive(Debug, Clone)]
pub struct DistanceCoder {
    slot: [BitTree<DIST_SLOTS>; LEN_TO_DIST_STATES],
    special: [BitModel; SPECIAL_SIZE],
    align: BitTree<DIST_ALIGN_SIZE>,
}

impl DistanceCoder {
    /// Create a new distance coder.
    pub fn new() -> Self {
        Self {
            slot: [const { BitTree::new() }; LEN_TO_DIST_STATES],
            special: [BitModel::new(); SPECIAL_SIZE],
            align: BitTree::new(),
        }
    }

    /// Reset the models.
    pub fn reset(&mut self) {
        self.slot.iter_mut().for_each(BitTree::reset);
        reset_models(&mut self.special);
        self.align.reset();
    }

    /// Encode a zero-based distance for a match of length `len`.
    pub fn encode(&mut self, rc: &mut RangeEncoder, distance: u32, len: usize) {
        let slot = dist_slot(distance);
        self.slot[len_to_dist_state(len)].encode(rc, slot);

        if slot >= START_POS_MODEL_INDEX {
            let num_direct_bits = (slot >> 1) - 1;
            let base = (2 | (slot & 1)) << num_direct_bits;
            let reduced = distance - base;

            if slot < END_POS_MODEL_INDEX {
                bit_tree::reverse_encode(
                    &mut self.special[(base - slot) as usize..],
                    rc,
                    num_direct_bits,
                    reduced,
                );
            } else {
                rc.encode_direct_bits(reduced >> DIST_ALIGN_BITS, num_direct_bits - DIST_ALIGN_BITS);
                self.align
                    .reverse_encode(rc, reduced & (DIST_ALIGN_SIZE as u32 - 1));
            }
        }
    }

    /// Decode a zero-based distance for a match of length `len`.
    pub fn decode<R: Read>(&mut self, rc: &mut RangeDecoder<R>, len: usize) -> Result<u32> {
        let slot = self.slot[len_to_dist_state(len)].decode(rc)?;
        if slot < START_POS_MODEL_INDEX {
            return Ok(slot);
        }

        let num_direct_bits = (slot >> 1) - 1;
        let mut distance = (2 | (slot & 1)) << num_direct_bits;

        if slot < END_POS_MODEL_INDEX {
            distance += bit_tree::reverse_decode(
                &mut self.special[(distance - slot) as usize..],
                rc,
                num_direct_bits,
            )?;
        } else {
            distance +=
                rc.decode_direct_bits(num_direct_bits - DIST_ALIGN_BITS)? << DIST_ALIGN_BITS;
            distance += self.align.reverse_decode(rc)?;
        }
        Ok(distance)
    }
}

impl Default for DistanceCoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Complete LZMA model containing all probability tables.
#[derive(Debug, Clone)]
pub struct LzmaModel {
    /// Is-match probabilities, indexed by `state << 4 | pos_state`.
    pub is_match: [BitModel; NUM_STATES * POS_STATES_MAX],
    /// Is-rep probabilities.
    pub is_rep: [BitModel; NUM_STATES],
    /// Is-rep-g0 probabilities.
    pub is_rep_g0: [BitModel; NUM_STATES],
    /// Is-rep-g1 probabilities.
    pub is_rep_g1: [BitModel; NUM_STATES],
    /// Is-rep-g2 probabilities.
    pub is_rep_g2: [BitModel; NUM_STATES],
    /// Is-rep0-long probabilities, indexed like `is_match`.
    pub is_rep0_long: [BitModel; NUM_STATES * POS_STATES_MAX],

    /// Match length coder.
    pub match_len: LengthCoder,
    /// Rep match length coder.
    pub rep_len: LengthCoder,

    /// Literal coder.
    pub literal: LiteralCoder,

    /// Distance coder.
    pub distance: DistanceCoder,
}

impl LzmaModel {
    /// Create a model shaped for `props`.
    pub fn new(props: &Properties) -> Self {
        Self {
            is_match: [BitModel::new(); NUM_STATES * POS_STATES_MAX],
            is_rep: [BitModel::new(); NUM_STATES],
            is_rep_g0: [BitModel::new(); NUM_STATES],
            is_rep_g1: [BitModel::new(); NUM_STATES],
            is_rep_g2: [BitModel::new(); NUM_STATES],
            is_rep0_long: [BitModel::new(); NUM_STATES * POS_STATES_MAX],
            match_len: LengthCoder::new(),
            rep_len: LengthCoder::new(),
            literal: LiteralCoder::new(props),
            distance: DistanceCoder::new(),
        }
    }

    /// Adapt to `props`: the literal bank is rebuilt only when `lc` or `lp`
    /// changed, everything is reset.
    pub fn reshape(&mut self, props: &Properties) {
        if self.literal.has_shape(props.lc, props.lp) {
            self.reset();
        } else {
            self.literal = LiteralCoder::new(props);
            self.reset_non_literal();
        }
    }

    /// Reset all probabilities to initial values.
    pub fn reset(&mut self) {
        self.literal.reset();
        self.reset_non_literal();
    }

    fn reset_non_literal(&mut self) {
        reset_models(&mut self.is_match);
        reset_models(&mut self.is_rep);
        reset_models(&mut self.is_rep_g0);
        reset_models(&mut self.is_rep_g1);
        reset_models(&mut self.is_rep_g2);
        reset_models(&mut self.is_rep0_long);
        self.match_len.reset();
        self.rep_len.reset();
        self.distance.reset();
    }
}

/// Index into the `state x pos_state` banks.
#[inline]
pub fn state_index(state: State, pos_state: usize) -> usize {
    (state.value() << PB_MAX) + pos_state
}
