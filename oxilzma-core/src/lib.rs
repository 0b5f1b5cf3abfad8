//! # OxiLZMA Core
//!
//! Building blocks shared by the OxiLZMA codec and its tools:
//!
//! - [`window`]: Sliding output window with solid mode and training
//! - [`buffer`]: Buffered byte source for the range decoder
//! - [`crc`]: CRC-32 checksum
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ CLI (oxilzma-cli)                                       │
//! │     compress / decompress / info / test / crc           │
//! ├─────────────────────────────────────────────────────────┤
//! │ Codec (oxilzma-codec)                                   │
//! │     range coder, bit trees, models, encoder, decoder    │
//! ├─────────────────────────────────────────────────────────┤
//! │ Core (this crate)                                       │
//! │     OutWindow, InBuffer, CRC-32, LzmaError              │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use oxilzma_core::crc::Crc32;
//! use oxilzma_core::window::OutWindow;
//!
//! let mut window = OutWindow::with_dictionary_size(1 << 16);
//! let mut out = Vec::new();
//!
//! window.put_byte(b'a', &mut out).unwrap();
//! window.put_byte(b'b', &mut out).unwrap();
//! window.copy_block(1, 4, &mut out).unwrap();
//! window.flush(&mut out).unwrap();
//!
//! assert_eq!(out, b"ababab");
//! assert_eq!(Crc32::compute(b"Hello, World!"), 0xEC4AC3D0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod buffer;
pub mod crc;
pub mod error;
pub mod window;

// Re-exports for convenience
pub use buffer::InBuffer;
pub use crc::{Crc32, crc32};
pub use error::{LzmaError, Result};
pub use window::OutWindow;
