//! Utility functions for the CLI.

use filetime::FileTime;
use indicatif::{ProgressBar, ProgressStyle};
use log::{Level, LevelFilter, Log, Metadata, Record};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Error type shared by every command; `Send + Sync` so per-file work can run
/// on the rayon pool.
pub type CliError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias for command functions.
pub type CliResult<T> = Result<T, CliError>;

/// Extension of framed LZMA files.
pub const LZMA_EXTENSION: &str = "lzma";

/// Create a progress bar with standard styling.
pub fn create_progress_bar(len: u64, enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    match ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        Ok(style) => pb.set_style(style.progress_chars("█▓▒░ ")),
        Err(e) => log::warn!("progress bar style: {e}"),
    }
    pb
}

/// Run `f` on every file in parallel, printing each line it returns in input
/// order.
///
/// Fails when any file failed; the others are still processed.
pub fn for_each_file<F>(files: &[PathBuf], progress: bool, f: F) -> CliResult<()>
where
    F: Fn(&Path) -> CliResult<String> + Sync,
{
    let pb = create_progress_bar(files.len() as u64, progress);

    let results: Vec<CliResult<String>> = files
        .par_iter()
        .map(|path| {
            let result = f(path);
            pb.inc(1);
            result
        })
        .collect();
    pb.finish_and_clear();

    let mut failed = 0usize;
    for (path, result) in files.iter().zip(results) {
        match result {
            Ok(line) => println!("{line}"),
            Err(e) => {
                failed += 1;
                eprintln!("{}: {}", path.display(), e);
            }
        }
    }

    if failed > 0 {
        return Err(format!("{failed} of {} files failed", files.len()).into());
    }
    Ok(())
}

/// `file` with `.lzma` appended.
pub fn compressed_path(file: &Path) -> PathBuf {
    let mut name = file.as_os_str().to_owned();
    name.push(".");
    name.push(LZMA_EXTENSION);
    PathBuf::from(name)
}

/// `file` without its `.lzma` extension.
pub fn decompressed_path(file: &Path) -> CliResult<PathBuf> {
    match file.extension() {
        Some(ext) if ext.eq_ignore_ascii_case(LZMA_EXTENSION) => Ok(file.with_extension("")),
        _ => Err(format!("unknown suffix, expected .{LZMA_EXTENSION}").into()),
    }
}

/// Refuse to overwrite `output` unless `force` is set.
pub fn check_output(output: &Path, force: bool) -> CliResult<()> {
    if output.exists() && !force {
        return Err(format!("{} already exists (use --force)", output.display()).into());
    }
    Ok(())
}

/// Copy the modification time of `from` onto `to`.
pub fn copy_mtime(from: &Path, to: &Path) -> CliResult<()> {
    let metadata = fs::metadata(from)?;
    filetime::set_file_mtime(to, FileTime::from_last_modification_time(&metadata))?;
    Ok(())
}

/// Parse a byte size with an optional `K`, `M` or `G` suffix (powers of two).
pub fn parse_size(s: &str) -> Result<u32, String> {
    let s = s.trim();
    let (digits, shift) = match s.char_indices().last() {
        Some((i, 'k' | 'K')) => (&s[..i], 10),
        Some((i, 'm' | 'M')) => (&s[..i], 20),
        Some((i, 'g' | 'G')) => (&s[..i], 30),
        _ => (s, 0),
    };

    let value: u64 = digits
        .parse()
        .map_err(|_| format!("invalid size '{s}'"))?;
    value
        .checked_shl(shift)
        .filter(|&v| v >> shift == value)
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| format!("size '{s}' does not fit in 32 bits"))
}

/// Compression ratio as a percentage saved.
pub fn space_savings(original: u64, compressed: u64) -> f64 {
    if original == 0 {
        0.0
    } else {
        (1.0 - compressed as f64 / original as f64) * 100.0
    }
}

/// Logger writing `level: target: message` lines to stderr.
struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            let level = match record.level() {
                Level::Error => "error",
                Level::Warn => "warning",
                Level::Info => "info",
                Level::Debug => "debug",
                Level::Trace => "trace",
            };
            eprintln!("{level}: {}: {}", record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

/// Install the stderr logger; each `--verbose` raises the level by one.
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
