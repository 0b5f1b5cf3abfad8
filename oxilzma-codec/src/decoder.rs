//! LZMA decompression.
//!
//! [`LzmaDecoder`] owns the model banks and the output window; each call to
//! [`LzmaDecoder::decode`] runs one pass over a raw range-coded stream. The
//! window allocation and models are reused across passes.
//!
//! A pass stops when the requested output length has been produced or, when
//! no length is given, at the end marker. Any distance that reaches outside
//! the produced (or trained) history is reported as corrupt input.
//!
//! Every pass opens with a literal coded against a zero previous byte, even
//! after training or in solid mode; history only widens the reach of later
//! back-references.

use crate::model::{END_MARKER_DISTANCE, LzmaModel, Properties, State, state_index};
use crate::range_coder::RangeDecoder;
use log::debug;
use oxilzma_core::error::{LzmaError, Result};
use oxilzma_core::window::OutWindow;
use std::io::{Cursor, Read, Write};

/// LZMA decoder.
#[derive(Debug)]
pub struct LzmaDecoder {
    /// Stream properties.
    props: Properties,
    /// Probability model.
    model: LzmaModel,
    /// Output window.
    window: OutWindow,
    /// Keep the window contents between passes.
    solid: bool,
}

impl LzmaDecoder {
    /// Create a decoder for `props`.
    pub fn new(props: Properties) -> Result<Self> {
        props.validate()?;
        Ok(Self {
            props,
            model: LzmaModel::new(&props),
            window: OutWindow::with_dictionary_size(props.dictionary_size),
            solid: false,
        })
    }

    /// Create a decoder from the 5-byte properties header.
    pub fn from_properties_bytes(bytes: &[u8]) -> Result<Self> {
        Self::new(Properties::from_bytes(bytes)?)
    }

    /// Switch to new properties.
    ///
    /// The window is reallocated only if its size changes, the literal bank
    /// only if `lc` or `lp` change.
    pub fn set_properties(&mut self, props: Properties) -> Result<()> {
        props.validate()?;
        if props.dictionary_size != self.props.dictionary_size {
            self.window.create(props.dictionary_size);
        }
        self.model.reshape(&props);
        self.props = props;
        Ok(())
    }

    /// Parse and apply a 5-byte properties header.
    pub fn set_properties_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.set_properties(Properties::from_bytes(bytes)?)
    }

    /// Current properties.
    pub fn properties(&self) -> &Properties {
        &self.props
    }

    /// Seed the window with the tail of `dictionary` and switch to solid
    /// mode, so the next pass may reference it.
    ///
    /// Returns the number of bytes kept.
    pub fn train(&mut self, dictionary: &[u8]) -> usize {
        self.solid = true;
        self.window.train(dictionary)
    }

    /// Keep (or stop keeping) window contents between passes.
    pub fn set_solid(&mut self, solid: bool) {
        self.solid = solid;
    }

    /// Whether passes chain onto each other's history.
    pub fn is_solid(&self) -> bool {
        self.solid
    }

    /// Decode one stream from `reader` into `writer`.
    ///
    /// `out_len` is the expected uncompressed size; `None` decodes until the
    /// end marker. Returns the number of bytes produced.
    pub fn decode<R: Read, W: Write>(
        &mut self,
        reader: R,
        writer: &mut W,
        out_len: Option<u64>,
    ) -> Result<u64> {
        debug!(
            "decoding lc={} lp={} pb={} dict={} out_len={:?} solid={}",
            self.props.lc,
            self.props.lp,
            self.props.pb,
            self.props.dictionary_size,
            out_len,
            self.solid
        );

        if out_len == Some(0) {
            self.window.init(self.solid);
            return Ok(0);
        }

        let mut rc = RangeDecoder::new(reader)?;
        self.window.init(self.solid);
        self.model.reset();

        let produced = self.decode_symbols(&mut rc, writer, out_len)?;
        self.window.flush(writer)?;

        debug!(
            "decoded {} bytes from {} compressed bytes",
            produced,
            rc.processed()
        );
        Ok(produced)
    }

    fn decode_symbols<R: Read, W: Write>(
        &mut self,
        rc: &mut RangeDecoder<R>,
        writer: &mut W,
        out_len: Option<u64>,
    ) -> Result<u64> {
        let pos_mask = self.props.pos_mask();
        let model = &mut self.model;
        let window = &mut self.window;

        let mut state = State::new();
        let mut reps = [0u32; 4];
        let mut pos = 0u64;

        loop {
            if out_len.is_some_and(|n| pos >= n) {
                return Ok(pos);
            }

            let pos_state = (pos as u32 & pos_mask) as usize;
            let idx = state_index(state, pos_state);
            let s = state.value();

            if rc.decode_bit(&mut model.is_match[idx])? == 0 {
                // Trained or solid history never feeds the first literal's
                // context.
                let prev_byte = if pos == 0 { 0 } else { window.get_byte(0) };
                let byte = if state.is_char_state() {
                    model.literal.decode_normal(rc, pos, prev_byte)?
                } else {
                    let match_byte = window.get_byte(reps[0]);
                    model
                        .literal
                        .decode_with_match_byte(rc, pos, prev_byte, match_byte)?
                };
                window.put_byte(byte, writer)?;
                state.update_char();
                pos += 1;
                continue;
            }

            // A pass opens with a literal. The only other first symbol is the
            // end marker of an empty stream of unknown length.
            if pos == 0 && out_len.is_some() {
                return Err(LzmaError::data_error(0, "stream does not start with a literal"));
            }

            let len;
            if rc.decode_bit(&mut model.is_rep[s])? == 1 {
                if pos == 0 {
                    return Err(LzmaError::data_error(0, "repeat match before any output"));
                }
                if rc.decode_bit(&mut model.is_rep_g0[s])? == 0 {
                    if rc.decode_bit(&mut model.is_rep0_long[idx])? == 0 {
                        if !window.is_distance_valid(reps[0]) {
                            return Err(invalid_distance(window, pos, reps[0]));
                        }
                        let byte = window.get_byte(reps[0]);
                        window.put_byte(byte, writer)?;
                        state.update_short_rep();
                        pos += 1;
                        continue;
                    }
                } else {
                    let distance;
                    if rc.decode_bit(&mut model.is_rep_g1[s])? == 0 {
                        distance = reps[1];
                    } else {
                        if rc.decode_bit(&mut model.is_rep_g2[s])? == 0 {
                            distance = reps[2];
                        } else {
                            distance = reps[3];
                            reps[3] = reps[2];
                        }
                        reps[2] = reps[1];
                    }
                    reps[1] = reps[0];
                    reps[0] = distance;
                }
                len = model.rep_len.decode(rc, pos_state)?;
                state.update_rep();
            } else {
                reps[3] = reps[2];
                reps[2] = reps[1];
                reps[1] = reps[0];
                len = model.match_len.decode(rc, pos_state)?;
                state.update_match();
                reps[0] = model.distance.decode(rc, len)?;

                if reps[0] == END_MARKER_DISTANCE {
                    if let Some(n) = out_len {
                        return Err(LzmaError::data_error(
                            pos,
                            format!("end marker before expected length {n}"),
                        ));
                    }
                    debug!("end marker at {pos}");
                    return Ok(pos);
                }
                if pos == 0 {
                    return Err(LzmaError::data_error(0, "match before any output"));
                }
            }

            if !window.is_distance_valid(reps[0]) {
                return Err(invalid_distance(window, pos, reps[0]));
            }
            if let Some(n) = out_len {
                if pos + len as u64 > n {
                    return Err(LzmaError::data_error(
                        pos,
                        format!("match of length {len} overruns expected length {n}"),
                    ));
                }
            }

            window.copy_block(reps[0], len, writer)?;
            pos += len as u64;
        }
    }
}

fn invalid_distance(window: &OutWindow, pos: u64, distance: u32) -> LzmaError {
    let limit = window
        .history()
        .min(window.dictionary_size_check() as u64);
    LzmaError::invalid_distance(pos, distance, limit)
}

/// Decompress a raw stream (no header) to a Vec.
///
/// `out_len` is the expected uncompressed size; `None` decodes until the end
/// marker.
pub fn decompress(props: &Properties, data: &[u8], out_len: Option<u64>) -> Result<Vec<u8>> {
    let mut decoder = LzmaDecoder::new(*props)?;
    let capacity = out_len.map_or(data.len().saturating_mul(4), |n| n.min(1 << 30) as usize);
    let mut output = Vec::with_capacity(capacity);
    decoder.decode(Cursor::new(data), &mut output, out_len)?;
    Ok(output)
}
