//! Buffered byte source for the range decoder.
//!
//! The range decoder pulls one byte at a time. [`InBuffer`] batches reads from
//! the underlying [`Read`] and turns end of input into a
//! [`LzmaError::DataError`], since a well-formed stream never runs dry before
//! the decoder is done with it.

use std::io::{ErrorKind, Read};

use crate::error::{LzmaError, Result};

/// Default read chunk size.
pub const DEFAULT_CAPACITY: usize = 1 << 16;

/// Buffered reader handing out single bytes.
#[derive(Debug)]
pub struct InBuffer<R> {
    inner: R,
    buf: Box<[u8]>,
    pos: usize,
    limit: usize,
    processed: u64,
}

impl<R: Read> InBuffer<R> {
    /// Wrap a reader with the default chunk size.
    pub fn new(inner: R) -> Self {
        Self::with_capacity(DEFAULT_CAPACITY, inner)
    }

    /// Wrap a reader with a specific chunk size.
    pub fn with_capacity(capacity: usize, inner: R) -> Self {
        Self {
            inner,
            buf: vec![0; capacity.max(1)].into_boxed_slice(),
            pos: 0,
            limit: 0,
            processed: 0,
        }
    }

    /// Read the next byte.
    ///
    /// Fails with a data error once the underlying reader is exhausted.
    #[inline]
    pub fn read_byte(&mut self) -> Result<u8> {
        if self.pos >= self.limit && !self.fill()? {
            return Err(LzmaError::truncated(self.processed));
        }
        let byte = self.buf[self.pos];
        self.pos += 1;
        self.processed += 1;
        Ok(byte)
    }

    /// Number of bytes handed out so far.
    pub fn processed(&self) -> u64 {
        self.processed
    }

    fn fill(&mut self) -> Result<bool> {
        loop {
            match self.inner.read(&mut self.buf) {
                Ok(0) => return Ok(false),
                Ok(n) => {
                    self.pos = 0;
                    self.limit = n;
                    return Ok(true);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}
