//! Info command implementation.

use crate::utils::{CliResult, space_savings};
use oxilzma_codec::FramedHeader;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// JSON output for `info --json`.
#[derive(Debug, Serialize)]
struct InfoJson {
    file: String,
    lc: u32,
    lp: u32,
    pb: u32,
    dictionary_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    uncompressed_size: Option<u64>,
    compressed_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    space_savings: Option<f64>,
}

pub fn cmd_info(file: &Path, json: bool) -> CliResult<()> {
    println!("{}", render_info(file, json)?);
    Ok(())
}

fn render_info(file: &Path, json: bool) -> CliResult<String> {
    let compressed_size = std::fs::metadata(file)?.len();
    let mut reader = BufReader::new(File::open(file)?);
    let header = FramedHeader::read_from(&mut reader)?;
    let props = header.properties;

    if json {
        let info = InfoJson {
            file: file.display().to_string(),
            lc: props.lc,
            lp: props.lp,
            pb: props.pb,
            dictionary_size: props.dictionary_size,
            uncompressed_size: header.uncompressed_size,
            compressed_size,
            space_savings: header
                .uncompressed_size
                .map(|n| space_savings(n, compressed_size)),
        };
        return Ok(serde_json::to_string_pretty(&info)?);
    }

    let mut out = String::new();
    writeln!(out, "LZMA Stream Information")?;
    writeln!(out, "=======================")?;
    writeln!(out, "File: {}", file.display())?;
    writeln!(out, "Compressed size: {} bytes", compressed_size)?;
    writeln!(out)?;
    writeln!(out, "Properties:")?;
    writeln!(out, "  Literal context bits (lc): {}", props.lc)?;
    writeln!(out, "  Literal position bits (lp): {}", props.lp)?;
    writeln!(out, "  Position bits (pb): {}", props.pb)?;
    writeln!(out, "  Dictionary size: {} bytes", props.dictionary_size)?;
    match header.uncompressed_size {
        Some(n) => {
            write!(out, "  Uncompressed size: {} bytes", n)?;
            if n > 0 {
                write!(
                    out,
                    "\n  Space savings: {:.1}%",
                    space_savings(n, compressed_size)
                )?;
            }
        }
        None => write!(out, "  Uncompressed size: unknown (end marker)")?,
    }

    Ok(out)
}
