//! Argument parsing for the `blpk` command line front-end.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "blpk", version, about = "Chunked, checksummed, appendable container format.")]
pub struct Cli {
    /// Increase verbosity (-v debug, -vv trace). Mutually exclusive with --debug.
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true, conflicts_with = "debug")]
    pub verbose: u8,

    /// Shorthand for maximum verbosity with extra diagnostic context.
    #[arg(short = 'd', long = "debug", global = true)]
    pub debug: bool,

    /// Overwrite the output file if it already exists.
    #[arg(short = 'f', long = "force", global = true)]
    pub force: bool,

    /// Number of threads passed to the block codec for intra-chunk
    /// (de)compression [default: number of cores].
    #[arg(short = 'n', long = "nthreads", global = true)]
    pub nthreads: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compress a file into a blpk container.
    #[command(alias = "c")]
    Compress {
        input: PathBuf,
        output: Option<PathBuf>,
        #[command(flatten)]
        opts: CompressArgs,
    },

    /// Decompress a blpk container back to raw bytes.
    #[command(alias = "d")]
    Decompress {
        input: PathBuf,
        output: Option<PathBuf>,
        /// Skip the requirement that `input` end in `.blp`.
        #[arg(short = 'e', long = "no-check-extension")]
        no_check_extension: bool,
    },

    /// Append new data onto an existing blpk container in place.
    #[command(alias = "a")]
    Append {
        orig: PathBuf,
        new: PathBuf,
        #[command(flatten)]
        opts: AppendArgs,
        /// Skip the requirement that `orig` end in `.blp`.
        #[arg(short = 'e', long = "no-check-extension")]
        no_check_extension: bool,
    },

    /// Print the parsed headers (and metadata, if present) of a container.
    #[command(alias = "i")]
    Info { file: PathBuf },
}

/// Compression knobs shared by `compress` and `append` (newly appended
/// chunks reuse these settings; they need not match the original file's).
#[derive(clap::Args, Debug, Clone)]
pub struct CompressArgs {
    /// Declared element width in bytes, used by shuffle.
    #[arg(long, default_value_t = 8)]
    pub typesize: u8,

    /// Compression level (0-9).
    #[arg(long, default_value_t = 7)]
    pub clevel: u8,

    /// Disable byte-shuffle preconditioning (enabled by default).
    #[arg(long = "no-shuffle", action = ArgAction::SetFalse, default_value_t = true)]
    pub shuffle: bool,

    /// Block codec: blosclz, lz4, lz4hc, snappy or zlib.
    #[arg(long, default_value = "blosclz")]
    pub codec: String,

    /// Nominal uncompressed chunk size, e.g. `1048576`, `64KiB`, or `max`.
    #[arg(long = "chunk-size", default_value = "1048576")]
    pub chunk_size: String,

    /// Checksum: none, adler32, crc32, md5, sha1, sha224, sha256, sha384, sha512.
    #[arg(long, default_value = "adler32")]
    pub checksum: String,

    /// Disable the offsets table (forbids random access and append).
    #[arg(long = "no-offsets", action = ArgAction::SetFalse, default_value_t = true)]
    pub offsets: bool,

    /// User metadata as a literal JSON string, or `@path` to read from a file.
    #[arg(short = 'm', long)]
    pub metadata: Option<String>,
}

/// Compression knobs for `append`: reused for newly appended chunks, but
/// without `chunk_size`/`offsets` which are fixed by the original file.
#[derive(clap::Args, Debug, Clone)]
pub struct AppendArgs {
    /// Declared element width in bytes, used by shuffle.
    #[arg(long, default_value_t = 8)]
    pub typesize: u8,

    /// Compression level (0-9).
    #[arg(long, default_value_t = 7)]
    pub clevel: u8,

    /// Disable byte-shuffle preconditioning (enabled by default).
    #[arg(long = "no-shuffle", action = ArgAction::SetFalse, default_value_t = true)]
    pub shuffle: bool,

    /// Block codec: blosclz, lz4, lz4hc, snappy or zlib.
    #[arg(long, default_value = "blosclz")]
    pub codec: String,

    /// Checksum: none, adler32, crc32, md5, sha1, sha224, sha256, sha384, sha512.
    #[arg(long, default_value = "adler32")]
    pub checksum: String,

    /// Replace the container's metadata, as a literal JSON string or
    /// `@path` to read from a file. Must fit within the reserved slack.
    #[arg(short = 'm', long)]
    pub metadata: Option<String>,
}
