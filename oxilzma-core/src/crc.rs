//! CRC-32 (ISO 3309) checksum.
//!
//! Optional integrity check over raw buffers. It plays no part in the LZMA
//! stream itself; containers and tools use it to verify decoded output.
//!
//! Buffers of 16 bytes or more go through a "slicing-by-8" loop that consumes
//! 8 bytes per step using 8 pre-computed tables. Shorter buffers use the
//! classic byte-at-a-time table.

use crate::error::{LzmaError, Result};

/// Reflected CRC-32 polynomial.
pub const CRC32_POLY: u32 = 0xEDB8_8320;

/// CRC-32 lookup table (polynomial 0xEDB88320, reflected).
const CRC32_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0usize;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ CRC32_POLY;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

/// CRC-32 slicing-by-8 lookup tables.
const CRC32_TABLE_SLICE: [[u32; 256]; 8] = {
    let mut tables = [[0u32; 256]; 8];
    tables[0] = CRC32_TABLE;

    let mut t = 1;
    while t < 8 {
        let mut i = 0usize;
        while i < 256 {
            let prev = tables[t - 1][i];
            tables[t][i] = tables[0][(prev & 0xFF) as usize] ^ (prev >> 8);
            i += 1;
        }
        t += 1;
    }

    tables
};

/// Threshold above which the slicing-by-8 path is used.
const SLICE_THRESHOLD: usize = 16;

/// CRC-32 calculator (ISO 3309).
///
/// - Polynomial: 0x04C11DB7 (reflected: 0xEDB88320)
/// - Initial value: 0xFFFFFFFF
/// - Final XOR: 0xFFFFFFFF
///
/// # Example
///
/// ```
/// use oxilzma_core::crc::Crc32;
///
/// let mut crc = Crc32::new();
/// crc.update(b"1234");
/// crc.update(b"56789");
/// assert_eq!(crc.finalize(), 0xCBF43926);
/// ```
#[derive(Debug, Clone)]
pub struct Crc32 {
    crc: u32,
}

impl Crc32 {
    /// Create a new CRC-32 calculator.
    pub fn new() -> Self {
        Self { crc: 0xFFFF_FFFF }
    }

    /// Reset the CRC to its initial state.
    pub fn reset(&mut self) {
        self.crc = 0xFFFF_FFFF;
    }

    /// Update the CRC with a single byte.
    #[inline]
    pub fn update_byte(&mut self, byte: u8) {
        self.crc = CRC32_TABLE[((self.crc ^ byte as u32) & 0xFF) as usize] ^ (self.crc >> 8);
    }

    /// Update the CRC with more data.
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        if data.len() >= SLICE_THRESHOLD {
            crc32_slice8(&mut self.crc, data);
        } else {
            crc32_sw(&mut self.crc, data);
        }
    }

    /// Get the current CRC value (without finalizing).
    #[inline(always)]
    pub fn value(&self) -> u32 {
        self.crc ^ 0xFFFF_FFFF
    }

    /// Finalize and return the CRC value.
    #[inline(always)]
    pub fn finalize(self) -> u32 {
        self.crc ^ 0xFFFF_FFFF
    }

    /// Compute CRC-32 for a slice in one call.
    #[inline]
    pub fn compute(data: &[u8]) -> u32 {
        let mut crc = Self::new();
        crc.update(data);
        crc.finalize()
    }

    /// Check `data` against an expected digest.
    pub fn verify(data: &[u8], expected: u32) -> bool {
        Self::compute(data) == expected
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

impl std::io::Write for Crc32 {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Compute the CRC-32 of `length` bytes of `buffer` starting at `offset`.
///
/// Fails with [`LzmaError::BufferTooSmall`] when the range does not fit.
pub fn crc32(buffer: &[u8], offset: usize, length: usize) -> Result<u32> {
    let end = offset
        .checked_add(length)
        .ok_or_else(|| LzmaError::buffer_too_small(usize::MAX, buffer.len()))?;
    let slice = buffer
        .get(offset..end)
        .ok_or_else(|| LzmaError::buffer_too_small(end, buffer.len()))?;
    Ok(Crc32::compute(slice))
}

/// Byte-at-a-time CRC-32 for short inputs.
#[inline]
fn crc32_sw(crc: &mut u32, data: &[u8]) {
    for &byte in data {
        let index = ((*crc ^ byte as u32) & 0xFF) as usize;
        *crc = CRC32_TABLE[index] ^ (*crc >> 8);
    }
}

/// Slicing-by-8 CRC-32: 8 input bytes per table round.
#[inline]
fn crc32_slice8(crc: &mut u32, data: &[u8]) {
    let mut c = *crc;
    let mut chunks = data.chunks_exact(8);

    for bytes in &mut chunks {
        let crc_xor = c ^ u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);

        c = CRC32_TABLE_SLICE[7][(crc_xor & 0xFF) as usize]
            ^ CRC32_TABLE_SLICE[6][((crc_xor >> 8) & 0xFF) as usize]
            ^ CRC32_TABLE_SLICE[5][((crc_xor >> 16) & 0xFF) as usize]
            ^ CRC32_TABLE_SLICE[4][(crc_xor >> 24) as usize]
            ^ CRC32_TABLE_SLICE[3][bytes[4] as usize]
            ^ CRC32_TABLE_SLICE[2][bytes[5] as usize]
            ^ CRC32_TABLE_SLICE[1][bytes[6] as usize]
            ^ CRC32_TABLE_SLICE[0][bytes[7] as usize];
    }

    crc32_sw(&mut c, chunks.remainder());
    *crc = c;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_empty() {
        assert_eq!(Crc32::compute(b""), 0x00000000);
    }

    #[test]
    fn test_crc32_check() {
        assert_eq!(Crc32::compute(b"123456789"), 0xCBF43926);
    }

    #[test]
    fn test_crc32_hello_world() {
        assert_eq!(Crc32::compute(b"Hello, World!"), 0xEC4AC3D0);
    }

    #[test]
    fn test_crc32_incremental() {
        let mut crc = Crc32::new();
        crc.update(b"Hello");
        crc.update(b", ");
        crc.update(b"World!");
        assert_eq!(crc.finalize(), 0xEC4AC3D0);
    }

    #[test]
    fn test_crc32_update_byte() {
        let mut crc = Crc32::new();
        for &b in b"123456789" {
            crc.update_byte(b);
        }
        assert_eq!(crc.value(), 0xCBF43926);
    }

    #[test]
    fn test_slice8_matches_bytewise() {
        for size in [1, 7, 8, 15, 16, 17, 31, 32, 63, 64, 1000] {
            let data: Vec<u8> = (0..size).map(|i| (i * 31 + 7) as u8).collect();

            let mut fast = 0xFFFF_FFFFu32;
            crc32_slice8(&mut fast, &data);
            let mut slow = 0xFFFF_FFFFu32;
            crc32_sw(&mut slow, &data);

            assert_eq!(fast, slow, "size {size}");
        }
    }

    #[test]
    fn test_crc32_offset_length() {
        let buffer = b"xx123456789yy";
        assert_eq!(crc32(buffer, 2, 9).unwrap(), 0xCBF43926);
        assert_eq!(crc32(buffer, 0, 0).unwrap(), 0);
        assert!(matches!(
            crc32(buffer, 10, 9),
            Err(LzmaError::BufferTooSmall { needed: 19, .. })
        ));
        assert!(crc32(buffer, usize::MAX, 2).is_err());
    }

    #[test]
    fn test_crc32_as_writer() {
        use std::io::Write;

        let mut crc = Crc32::new();
        crc.write_all(b"123456789").unwrap();
        assert_eq!(crc.value(), 0xCBF43926);
        assert!(Crc32::verify(b"123456789", 0xCBF43926));
    }

    #[test]
    fn test_crc32_table_correctness() {
        assert_eq!(CRC32_TABLE[0], 0);
        assert_eq!(CRC32_TABLE[1], 0x77073096);
        assert_eq!(CRC32_TABLE[255], 0x2D02EF8D);
    }
}
