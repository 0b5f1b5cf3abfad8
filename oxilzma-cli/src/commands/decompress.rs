//! Decompress command implementation.

use crate::utils::{CliResult, check_output, copy_mtime, decompressed_path, for_each_file};
use oxilzma_codec::decompress_framed_to;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Options for the decompress command.
pub struct DecompressOptions {
    pub force: bool,
    pub keep: bool,
    pub progress: bool,
}

pub fn cmd_decompress(files: &[PathBuf], options: &DecompressOptions) -> CliResult<()> {
    for_each_file(files, options.progress, |path| decompress_file(path, options))
}

fn decompress_file(path: &Path, options: &DecompressOptions) -> CliResult<String> {
    let output = decompressed_path(path)?;
    check_output(&output, options.force)?;

    let data = fs::read(path)?;
    let produced = match write_decompressed(&data, &output) {
        Ok(n) => n,
        Err(e) => {
            let _ = fs::remove_file(&output);
            return Err(e);
        }
    };
    copy_mtime(path, &output)?;

    if !options.keep {
        fs::remove_file(path)?;
    }

    Ok(format!(
        "{} -> {} ({} bytes)",
        path.display(),
        output.display(),
        produced
    ))
}

fn write_decompressed(data: &[u8], output: &Path) -> CliResult<u64> {
    let mut writer = BufWriter::new(File::create(output)?);
    let produced = decompress_framed_to(data, &mut writer)?;
    writer.flush()?;
    Ok(produced)
}
