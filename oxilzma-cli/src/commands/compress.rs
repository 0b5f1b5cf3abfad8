//! Compress command implementation.

use crate::utils::{
    CliResult, check_output, compressed_path, copy_mtime, for_each_file, space_savings,
};
use log::debug;
use oxilzma_codec::{EncoderConfig, compress_framed};
use std::fs;
use std::path::{Path, PathBuf};

/// Options for the compress command.
pub struct CompressOptions {
    pub config: EncoderConfig,
    pub force: bool,
    pub keep: bool,
    pub progress: bool,
}

pub fn cmd_compress(files: &[PathBuf], options: &CompressOptions) -> CliResult<()> {
    options.config.validate()?;
    // The framed header must be able to hold the properties.
    options.config.properties.to_bytes()?;

    debug!("compressing {} files with {:?}", files.len(), options.config);
    for_each_file(files, options.progress, |path| compress_file(path, options))
}

fn compress_file(path: &Path, options: &CompressOptions) -> CliResult<String> {
    let output = compressed_path(path);
    check_output(&output, options.force)?;

    let data = fs::read(path)?;
    let framed = compress_framed(&options.config, &data)?;
    fs::write(&output, &framed)?;
    copy_mtime(path, &output)?;

    if !options.keep {
        fs::remove_file(path)?;
    }

    Ok(format!(
        "{} -> {} ({} -> {} bytes, {:.1}% saved)",
        path.display(),
        output.display(),
        data.len(),
        framed.len(),
        space_savings(data.len() as u64, framed.len() as u64)
    ))
}
