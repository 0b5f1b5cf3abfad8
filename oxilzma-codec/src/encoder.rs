//! LZMA compression.
//!
//! [`LzmaEncoder`] asks its [`MatchFinder`] for one [`Decision`] at a time
//! and range-codes it with the same model calls the decoder mirrors. The
//! output is a raw stream: no properties header, no length.
//!
//! ## Training and solid mode
//!
//! [`LzmaEncoder::train`] makes the tail of a dictionary reachable by
//! back-references, exactly like [`crate::LzmaDecoder::train`] on the other
//! side. Once trained, the encoder stays solid: each pass appends its input to
//! that history, matching a solid decoder fed the same streams in order.
//! History is only reachable by back-references: the first symbol of a pass
//! is always a literal with a zero previous byte.

use crate::config::EncoderConfig;
use crate::match_finder::{self, Decision, MatchFinder, SearchContext};
use crate::model::{
    END_MARKER_DISTANCE, LzmaModel, MATCH_LEN_MAX, MATCH_LEN_MIN, PROPERTIES_SIZE, Properties,
    State, state_index,
};
use crate::range_coder::RangeEncoder;
use log::{debug, trace};
use oxilzma_core::error::{LzmaError, Result};
use oxilzma_core::window::MIN_WINDOW_SIZE;
use std::borrow::Cow;
use std::io::Write;

/// Pending output size that triggers a drain to the sink.
const DRAIN_THRESHOLD: usize = 1 << 16;

/// Largest buffer (history plus input) one pass can index.
const MAX_PASS_SIZE: usize = u32::MAX as usize - 1;

/// Per-pass coder state.
#[derive(Debug, Clone, Copy)]
struct PassState {
    state: State,
    reps: [u32; 4],
}

impl PassState {
    fn new() -> Self {
        Self {
            state: State::new(),
            reps: [0; 4],
        }
    }
}

/// LZMA encoder.
pub struct LzmaEncoder {
    /// Configuration.
    config: EncoderConfig,
    /// Range encoder.
    rc: RangeEncoder,
    /// Probability model.
    model: LzmaModel,
    /// Match finder built from the configured strategy.
    finder: Box<dyn MatchFinder>,
    /// Bytes reachable before the next pass (solid mode only).
    history: Vec<u8>,
    /// Chain passes onto each other's history.
    solid: bool,
}

impl LzmaEncoder {
    /// Create an encoder for `config`.
    pub fn new(config: EncoderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            rc: RangeEncoder::new(),
            model: LzmaModel::new(&config.properties),
            finder: match_finder::create(config.strategy, config.chain_depth, config.nice_len),
            history: Vec::new(),
            solid: false,
        })
    }

    /// Configuration in use.
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Stream properties.
    pub fn properties(&self) -> &Properties {
        &self.config.properties
    }

    /// The 5-byte properties header for streams from this encoder.
    pub fn properties_bytes(&self) -> Result<[u8; PROPERTIES_SIZE]> {
        self.config.properties.to_bytes()
    }

    /// Window size the decoder will allocate for these properties.
    fn window_size(&self) -> usize {
        (self.config.properties.dictionary_size.max(1) as usize).max(MIN_WINDOW_SIZE)
    }

    /// Make the tail of `dictionary` reachable by the next pass and switch to
    /// solid mode.
    ///
    /// Returns the number of bytes kept, which matches what a decoder trained
    /// with the same dictionary keeps.
    pub fn train(&mut self, dictionary: &[u8]) -> usize {
        let size = dictionary.len().min(self.window_size());
        self.history.clear();
        self.history
            .extend_from_slice(&dictionary[dictionary.len() - size..]);
        self.solid = true;
        trace!("trained encoder with {size} of {} bytes", dictionary.len());
        size
    }

    /// Keep (or stop keeping) history between passes.
    ///
    /// Leaving solid mode drops the history.
    pub fn set_solid(&mut self, solid: bool) {
        self.solid = solid;
        if !solid {
            self.history.clear();
        }
    }

    /// Whether passes chain onto each other's history.
    pub fn is_solid(&self) -> bool {
        self.solid
    }

    /// Compress `input` as one raw stream into `writer`.
    ///
    /// Returns the number of compressed bytes written.
    pub fn encode<W: Write>(&mut self, input: &[u8], writer: &mut W) -> Result<u64> {
        let (data, start) = self.pass_buffer(input)?;
        debug!(
            "encoding {} bytes ({} history) with {} strategy, dict={}",
            input.len(),
            start,
            self.config.strategy,
            self.config.properties.dictionary_size
        );

        self.begin_pass();
        self.finder.reset();
        self.finder.advance(&data, start);

        let dictionary_size_check = self.config.properties.dictionary_size_check();
        let mut pass = PassState::new();
        let mut pos = start;

        while pos < data.len() {
            let ctx = SearchContext {
                data: &data,
                pos,
                reps: pass.reps,
                dictionary_size_check,
            };
            let decision = if pos == start {
                Decision::Literal
            } else {
                self.finder.find(&ctx)
            };
            self.emit(&mut pass, &data, start, pos, decision);
            pos += decision.consumed();
            self.finder.advance(&data, pos);

            if self.rc.pending() >= DRAIN_THRESHOLD {
                self.rc.drain_to(writer)?;
            }
        }

        let written = self.end_pass(&mut pass, data.len() - start, writer)?;
        if self.solid {
            self.keep_history(&data);
        }

        debug!("encoded {} bytes into {} bytes", input.len(), written);
        Ok(written)
    }

    /// Code an explicit decision sequence as one raw stream.
    ///
    /// `data` is the output the decisions describe; it supplies literal bytes
    /// and literal contexts. Distances are not checked against the history,
    /// so this can produce streams a decoder rejects. Solid history is
    /// neither used nor extended.
    pub fn encode_decisions<W: Write>(
        &mut self,
        data: &[u8],
        decisions: &[Decision],
        writer: &mut W,
    ) -> Result<u64> {
        for decision in decisions {
            match *decision {
                Decision::Rep { index, len } if index > 3 || !(MATCH_LEN_MIN..=MATCH_LEN_MAX).contains(&len) => {
                    return Err(LzmaError::invalid_parameter(format!(
                        "rep index {index} / length {len} out of range"
                    )));
                }
                Decision::Match { len, .. } if !(MATCH_LEN_MIN..=MATCH_LEN_MAX).contains(&len) => {
                    return Err(LzmaError::invalid_parameter(format!(
                        "match length {len} out of range"
                    )));
                }
                _ => {}
            }
        }

        self.begin_pass();
        let mut pass = PassState::new();
        let mut pos = 0;
        for &decision in decisions {
            self.emit(&mut pass, data, 0, pos, decision);
            pos += decision.consumed();
            if self.rc.pending() >= DRAIN_THRESHOLD {
                self.rc.drain_to(writer)?;
            }
        }
        self.end_pass(&mut pass, pos, writer)
    }

    /// History followed by `input`, and the index where `input` starts.
    fn pass_buffer<'a>(&self, input: &'a [u8]) -> Result<(Cow<'a, [u8]>, usize)> {
        let history: &[u8] = if self.solid { &self.history } else { &[] };
        let total = history.len() + input.len();
        if total > MAX_PASS_SIZE {
            return Err(LzmaError::invalid_parameter(format!(
                "{total} bytes exceed the {MAX_PASS_SIZE} byte limit of one pass"
            )));
        }

        if history.is_empty() {
            return Ok((Cow::Borrowed(input), 0));
        }
        let mut data = Vec::with_capacity(total);
        data.extend_from_slice(history);
        data.extend_from_slice(input);
        Ok((Cow::Owned(data), history.len()))
    }

    fn keep_history(&mut self, data: &[u8]) {
        let size = data.len().min(self.window_size());
        self.history.clear();
        self.history.extend_from_slice(&data[data.len() - size..]);
    }

    fn begin_pass(&mut self) {
        self.rc.reset();
        self.model.reset();
    }

    /// Write the end marker if configured, flush the coder and drain it.
    fn end_pass<W: Write>(
        &mut self,
        pass: &mut PassState,
        coded_len: usize,
        writer: &mut W,
    ) -> Result<u64> {
        if self.config.end_marker {
            self.emit_match(pass, coded_len as u64, END_MARKER_DISTANCE, MATCH_LEN_MIN);
        }
        self.rc.finish();
        self.rc.drain_to(writer)?;
        Ok(self.rc.total_out())
    }

    /// Code one decision at `pos` (an index into `data`; coding started at
    /// `start`).
    fn emit(
        &mut self,
        pass: &mut PassState,
        data: &[u8],
        start: usize,
        pos: usize,
        decision: Decision,
    ) {
        let position = (pos - start) as u64;

        match decision {
            Decision::Literal => self.emit_literal(pass, data, pos, position),
            Decision::ShortRep => {
                let (s, idx, _) = self.contexts(pass, position);
                let rc = &mut self.rc;
                let model = &mut self.model;
                rc.encode_bit(&mut model.is_match[idx], 1);
                rc.encode_bit(&mut model.is_rep[s], 1);
                rc.encode_bit(&mut model.is_rep_g0[s], 0);
                rc.encode_bit(&mut model.is_rep0_long[idx], 0);
                pass.state.update_short_rep();
            }
            Decision::Rep { index, len } => self.emit_rep(pass, position, index, len),
            Decision::Match { distance, len } => self.emit_match(pass, position, distance, len),
        }
    }

    /// State index, `state x pos_state` index and position state.
    #[inline]
    fn contexts(&self, pass: &PassState, position: u64) -> (usize, usize, usize) {
        let pos_state = (position as u32 & self.config.properties.pos_mask()) as usize;
        (
            pass.state.value(),
            state_index(pass.state, pos_state),
            pos_state,
        )
    }

    fn emit_literal(&mut self, pass: &mut PassState, data: &[u8], pos: usize, position: u64) {
        let (_, idx, _) = self.contexts(pass, position);
        let byte = data.get(pos).copied().unwrap_or(0);
        let prev_byte = match position {
            0 => 0,
            _ => data.get(pos - 1).copied().unwrap_or(0),
        };

        self.rc.encode_bit(&mut self.model.is_match[idx], 0);
        if pass.state.is_char_state() {
            self.model
                .literal
                .encode_normal(&mut self.rc, position, prev_byte, byte);
        } else {
            let match_byte = pos
                .checked_sub(pass.reps[0] as usize + 1)
                .and_then(|p| data.get(p))
                .copied()
                .unwrap_or(0);
            self.model.literal.encode_with_match_byte(
                &mut self.rc,
                position,
                prev_byte,
                match_byte,
                byte,
            );
        }
        pass.state.update_char();
    }

    fn emit_rep(&mut self, pass: &mut PassState, position: u64, index: usize, len: usize) {
        let (s, idx, pos_state) = self.contexts(pass, position);
        let rc = &mut self.rc;
        let model = &mut self.model;

        rc.encode_bit(&mut model.is_match[idx], 1);
        rc.encode_bit(&mut model.is_rep[s], 1);
        if index == 0 {
            rc.encode_bit(&mut model.is_rep_g0[s], 0);
            rc.encode_bit(&mut model.is_rep0_long[idx], 1);
        } else {
            rc.encode_bit(&mut model.is_rep_g0[s], 1);
            if index == 1 {
                rc.encode_bit(&mut model.is_rep_g1[s], 0);
            } else {
                rc.encode_bit(&mut model.is_rep_g1[s], 1);
                rc.encode_bit(&mut model.is_rep_g2[s], (index == 3) as u32);
            }

            let distance = pass.reps[index];
            pass.reps.copy_within(0..index, 1);
            pass.reps[0] = distance;
        }

        model.rep_len.encode(rc, len, pos_state);
        pass.state.update_rep();
    }

    fn emit_match(&mut self, pass: &mut PassState, position: u64, distance: u32, len: usize) {
        let (s, idx, pos_state) = self.contexts(pass, position);
        let rc = &mut self.rc;
        let model = &mut self.model;

        rc.encode_bit(&mut model.is_match[idx], 1);
        rc.encode_bit(&mut model.is_rep[s], 0);
        model.match_len.encode(rc, len, pos_state);
        model.distance.encode(rc, distance, len);

        pass.reps.copy_within(0..3, 1);
        pass.reps[0] = distance;
        pass.state.update_match();
    }
}

/// Compress `data` as a raw stream (no header).
pub fn compress(config: &EncoderConfig, data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = LzmaEncoder::new(*config)?;
    let mut output = Vec::with_capacity(data.len() / 2 + 16);
    encoder.encode(data, &mut output)?;
    Ok(output)
}
