//! Sliding output window for LZMA decompression.
//!
//! The window is a circular buffer holding the most recently produced bytes.
//! Literals and back-reference copies are written into it and reach the
//! caller's sink in contiguous runs: whenever the write position wraps, and on
//! an explicit [`OutWindow::flush`].
//!
//! Distances follow the LZMA convention: distance `0` names the byte written
//! last, distance `d` the byte `d + 1` positions back.
//!
//! # Solid mode and training
//!
//! [`OutWindow::init`] with `solid = true` keeps the previous contents so a new
//! stream may reference bytes produced by the one before it.
//! [`OutWindow::train`] seeds the window from an external dictionary without
//! emitting it to any sink.

use std::io::Write;

use log::trace;

use crate::error::Result;

/// Smallest window ever allocated.
pub const MIN_WINDOW_SIZE: usize = 1 << 12;

/// Circular output window with history tracking.
#[derive(Debug, Clone, Default)]
pub struct OutWindow {
    /// Backing storage; its length is the window size.
    buffer: Vec<u8>,
    /// Next write position.
    pos: usize,
    /// Start of the bytes not yet handed to the sink.
    stream_pos: usize,
    /// Back-references must stay below this (`max(dictionary_size, 1)`).
    dictionary_size_check: u32,
    /// Bytes seeded by the last [`OutWindow::train`].
    train_size: usize,
    /// Bytes a back-reference may currently reach: trained plus produced.
    history: u64,
}

impl OutWindow {
    /// Create an empty window; call [`OutWindow::create`] before use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a window sized for `dictionary_size`.
    pub fn with_dictionary_size(dictionary_size: u32) -> Self {
        let mut window = Self::new();
        window.create(dictionary_size);
        window
    }

    /// Size the window for `dictionary_size`.
    ///
    /// The buffer holds `max(dictionary_size, 1, 4096)` bytes and is only
    /// reallocated when that size changes. Positions and history are reset.
    pub fn create(&mut self, dictionary_size: u32) {
        let dictionary_size_check = dictionary_size.max(1);
        let window_size = (dictionary_size_check as usize).max(MIN_WINDOW_SIZE);

        if self.buffer.len() != window_size {
            trace!("allocating {window_size} byte output window");
            self.buffer = vec![0; window_size];
        }

        self.dictionary_size_check = dictionary_size_check;
        self.pos = 0;
        self.stream_pos = 0;
        self.train_size = 0;
        self.history = 0;
    }

    /// Prepare for a new pass.
    ///
    /// Unless `solid` is set, positions, trained data and history are
    /// discarded. A solid window keeps everything written so far.
    pub fn init(&mut self, solid: bool) {
        if !solid {
            self.pos = 0;
            self.stream_pos = 0;
            self.train_size = 0;
            self.history = 0;
        }
    }

    /// Seed the window with the tail of `source`.
    ///
    /// At most one window of data is kept. The seeded bytes become reachable
    /// by back-references but are never written to a sink. Returns the number
    /// of bytes taken.
    pub fn train(&mut self, source: &[u8]) -> usize {
        let window_size = self.buffer.len();
        let size = source.len().min(window_size);
        let tail = &source[source.len() - size..];

        self.buffer[..size].copy_from_slice(tail);
        self.pos = if size == window_size { 0 } else { size };
        self.stream_pos = self.pos;
        self.train_size = size;
        self.history = size as u64;

        trace!("trained window with {size} of {} bytes", source.len());
        size
    }

    /// Write a single byte.
    #[inline]
    pub fn put_byte<W: Write>(&mut self, byte: u8, sink: &mut W) -> Result<()> {
        self.buffer[self.pos] = byte;
        self.pos += 1;
        self.history += 1;
        if self.pos >= self.buffer.len() {
            self.flush(sink)?;
        }
        Ok(())
    }

    /// Copy `len` bytes starting `distance + 1` bytes back.
    ///
    /// The source may overlap the destination (`len > distance + 1`), which
    /// repeats the referenced run. The caller validates `distance` first with
    /// [`OutWindow::is_distance_valid`].
    pub fn copy_block<W: Write>(&mut self, distance: u32, len: usize, sink: &mut W) -> Result<()> {
        let window_size = self.buffer.len();
        let mut src = self.back_index(distance);

        for _ in 0..len {
            self.buffer[self.pos] = self.buffer[src];
            self.pos += 1;
            src += 1;
            if src >= window_size {
                src = 0;
            }
            if self.pos >= window_size {
                self.flush(sink)?;
            }
        }

        self.history += len as u64;
        Ok(())
    }

    /// Byte `distance + 1` positions back (`0` is the last byte written).
    #[inline]
    pub fn get_byte(&self, distance: u32) -> u8 {
        self.buffer[self.back_index(distance)]
    }

    /// Hand every pending byte to `sink`.
    pub fn flush<W: Write>(&mut self, sink: &mut W) -> Result<()> {
        if self.pos == self.stream_pos {
            return Ok(());
        }
        sink.write_all(&self.buffer[self.stream_pos..self.pos])?;
        if self.pos >= self.buffer.len() {
            self.pos = 0;
        }
        self.stream_pos = self.pos;
        Ok(())
    }

    /// Whether a back-reference at `distance` reaches real data.
    ///
    /// Valid distances are below both the history length and the dictionary
    /// size limit.
    #[inline]
    pub fn is_distance_valid(&self, distance: u32) -> bool {
        (distance as u64) < self.history && distance < self.dictionary_size_check
    }

    /// Bytes currently reachable by back-references.
    #[inline]
    pub fn history(&self) -> u64 {
        self.history
    }

    /// Bytes seeded by the last training call.
    pub fn train_size(&self) -> usize {
        self.train_size
    }

    /// Allocated window size in bytes.
    pub fn window_size(&self) -> usize {
        self.buffer.len()
    }

    /// Back-reference limit derived from the dictionary size.
    pub fn dictionary_size_check(&self) -> u32 {
        self.dictionary_size_check
    }

    /// Bytes written but not yet handed to a sink.
    pub fn pending(&self) -> usize {
        self.pos - self.stream_pos
    }

    #[inline]
    fn back_index(&self, distance: u32) -> usize {
        let window_size = self.buffer.len();
        let back = distance as usize % window_size + 1;
        if back <= self.pos {
            self.pos - back
        } else {
            self.pos + window_size - back
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_sizes() {
        let window = OutWindow::with_dictionary_size(0);
        assert_eq!(window.window_size(), MIN_WINDOW_SIZE);
        assert_eq!(window.dictionary_size_check(), 1);

        let window = OutWindow::with_dictionary_size(1 << 16);
        assert_eq!(window.window_size(), 1 << 16);
        assert_eq!(window.dictionary_size_check(), 1 << 16);
    }

    #[test]
    fn test_put_and_get() {
        let mut window = OutWindow::with_dictionary_size(4096);
        let mut out = Vec::new();

        for &b in b"Hello" {
            window.put_byte(b, &mut out).unwrap();
        }

        assert_eq!(window.get_byte(0), b'o');
        assert_eq!(window.get_byte(4), b'H');
        assert_eq!(window.history(), 5);
        assert!(out.is_empty());

        window.flush(&mut out).unwrap();
        assert_eq!(out, b"Hello");
        assert_eq!(window.pending(), 0);
    }

    #[test]
    fn test_copy_overlap() {
        let mut window = OutWindow::with_dictionary_size(4096);
        let mut out = Vec::new();

        window.put_byte(b'A', &mut out).unwrap();
        window.put_byte(b'B', &mut out).unwrap();
        window.copy_block(1, 6, &mut out).unwrap();
        window.flush(&mut out).unwrap();

        assert_eq!(out, b"ABABABAB");
        assert_eq!(window.history(), 8);
    }

    #[test]
    fn test_flush_on_wrap() {
        let mut window = OutWindow::with_dictionary_size(4096);
        let mut out = Vec::new();

        for i in 0..5000u32 {
            window.put_byte((i % 251) as u8, &mut out).unwrap();
        }
        assert_eq!(out.len(), 4096);

        window.copy_block(4095, 100, &mut out).unwrap();
        window.flush(&mut out).unwrap();

        assert_eq!(out.len(), 5100);
        for i in 0..100 {
            assert_eq!(out[5000 + i], out[5000 + i - 4096]);
        }
    }

    #[test]
    fn test_distance_validity() {
        let mut window = OutWindow::with_dictionary_size(8);
        let mut out = Vec::new();

        assert!(!window.is_distance_valid(0));
        for b in 0..20u8 {
            window.put_byte(b, &mut out).unwrap();
        }
        assert!(window.is_distance_valid(0));
        assert!(window.is_distance_valid(7));
        assert!(!window.is_distance_valid(8));
        assert!(!window.is_distance_valid(u32::MAX));
    }

    #[test]
    fn test_train_and_init() {
        let mut window = OutWindow::with_dictionary_size(4096);
        let mut out = Vec::new();

        let dictionary: Vec<u8> = (0..5000u32).map(|i| i as u8).collect();
        assert_eq!(window.train(&dictionary), 4096);
        assert_eq!(window.history(), 4096);
        assert_eq!(window.get_byte(0), dictionary[4999]);
        assert_eq!(window.get_byte(4095), dictionary[5000 - 4096]);

        window.init(true);
        assert_eq!(window.history(), 4096);
        window.flush(&mut out).unwrap();
        assert!(out.is_empty());

        window.init(false);
        assert_eq!(window.history(), 0);
        assert_eq!(window.train_size(), 0);
    }

    #[test]
    fn test_short_train() {
        let mut window = OutWindow::with_dictionary_size(4096);
        let mut out = Vec::new();

        window.train(b"abc");
        window.copy_block(2, 3, &mut out).unwrap();
        window.flush(&mut out).unwrap();
        assert_eq!(out, b"abc");
    }

    #[test]
    fn test_create_keeps_allocation() {
        let mut window = OutWindow::with_dictionary_size(100);
        let mut out = Vec::new();
        window.put_byte(1, &mut out).unwrap();

        window.create(200);
        assert_eq!(window.window_size(), MIN_WINDOW_SIZE);
        assert_eq!(window.dictionary_size_check(), 200);
        assert_eq!(window.history(), 0);
    }
}
