//! OxiLZMA CLI
//!
//! Compress, decompress and inspect `.lzma` files with a Pure Rust LZMA codec.

mod commands;
mod utils;

use clap::{Parser, Subcommand};
use commands::{
    CompressOptions, DecompressOptions, cmd_compress, cmd_crc, cmd_decompress, cmd_info, cmd_test,
};
use oxilzma_codec::{EncoderConfig, LzmaLevel, MatchStrategy};
use std::io::IsTerminal;
use std::path::PathBuf;
use utils::{CliResult, init_logging, parse_size};

#[derive(Parser)]
#[command(name = "oxilzma")]
#[command(author, version, about = "Pure Rust LZMA compressor")]
#[command(long_about = "
OxiLZMA compresses files into the .lzma (LZMA-alone) format and back.

Examples:
  oxilzma compress file.txt
  oxilzma compress -l 9 --dict-size 64M big.bin
  oxilzma decompress file.txt.lzma
  oxilzma info --json file.txt.lzma
  oxilzma test *.lzma
  oxilzma crc file.txt
")]
struct Cli {
    /// Log more (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Hide the progress bar
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress files to <file>.lzma
    #[command(alias = "c")]
    Compress {
        /// Files to compress
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Compression level (0-9)
        #[arg(short, long, default_value_t = 6, value_parser = clap::value_parser!(u8).range(0..=9))]
        level: u8,

        /// Literal context bits (0-8)
        #[arg(long)]
        lc: Option<u32>,

        /// Literal position bits (0-4)
        #[arg(long)]
        lp: Option<u32>,

        /// Position bits (0-4)
        #[arg(long)]
        pb: Option<u32>,

        /// Dictionary size in bytes (K, M and G suffixes allowed)
        #[arg(long, value_parser = parse_size)]
        dict_size: Option<u32>,

        /// Match finder strategy (literal, greedy, lazy)
        #[arg(long)]
        strategy: Option<MatchStrategy>,

        /// Terminate the stream with an end marker
        #[arg(long)]
        end_marker: bool,

        /// Overwrite existing output files
        #[arg(short, long)]
        force: bool,

        /// Keep input files
        #[arg(short, long)]
        keep: bool,
    },

    /// Decompress <file>.lzma files
    #[command(alias = "d")]
    Decompress {
        /// Files to decompress
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Overwrite existing output files
        #[arg(short, long)]
        force: bool,

        /// Keep input files
        #[arg(short, long)]
        keep: bool,
    },

    /// Show the header of an .lzma file
    #[command(alias = "i")]
    Info {
        /// File to inspect
        file: PathBuf,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,
    },

    /// Decode .lzma files and report the CRC-32 of their contents
    #[command(alias = "t")]
    Test {
        /// Files to test
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Print the CRC-32 of files
    Crc {
        /// Files to checksum
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let progress = !cli.quiet && std::io::stderr().is_terminal();

    match cli.command {
        Commands::Compress {
            files,
            level,
            lc,
            lp,
            pb,
            dict_size,
            strategy,
            end_marker,
            force,
            keep,
        } => {
            let mut config = EncoderConfig::from_level(LzmaLevel::new(level));
            if let Some(lc) = lc {
                config.properties.lc = lc;
            }
            if let Some(lp) = lp {
                config.properties.lp = lp;
            }
            if let Some(pb) = pb {
                config.properties.pb = pb;
            }
            if let Some(size) = dict_size {
                config = config.with_dictionary_size(size);
            }
            if let Some(strategy) = strategy {
                config = config.with_strategy(strategy);
            }
            let options = CompressOptions {
                config: config.with_end_marker(end_marker),
                force,
                keep,
                progress,
            };
            cmd_compress(&files, &options)
        }
        Commands::Decompress { files, force, keep } => {
            let options = DecompressOptions {
                force,
                keep,
                progress,
            };
            cmd_decompress(&files, &options)
        }
        Commands::Info { file, json } => cmd_info(&file, json),
        Commands::Test { files } => cmd_test(&files, progress),
        Commands::Crc { files } => cmd_crc(&files, progress),
    }
}
