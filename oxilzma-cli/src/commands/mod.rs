//! Command implementations for OxiLZMA CLI.

pub mod compress;
pub mod crc;
pub mod decompress;
pub mod info;

pub use compress::{CompressOptions, cmd_compress};
pub use crc::cmd_crc;
pub use decompress::{DecompressOptions, cmd_decompress};
pub use info::cmd_info;
pub use test::cmd_test;
