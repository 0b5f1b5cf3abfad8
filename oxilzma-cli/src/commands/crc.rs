//! CRC command implementation.

use crate::utils::{CliResult, for_each_file};
use oxilzma_core::Crc32;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

pub fn cmd_crc(files: &[PathBuf], progress: bool) -> CliResult<()> {
    for_each_file(files, progress, crc_file)
}

fn crc_file(path: &Path) -> CliResult<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut crc = Crc32::new();
    io::copy(&mut reader, &mut crc)?;
    Ok(format!("{:08x}  {}", crc.finalize(), path.display()))
}
