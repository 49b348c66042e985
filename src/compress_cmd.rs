//! `compress` subcommand: drive [`blpkc::compress_stream`] over real files.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use blpkc::{CompressConfig, CHUNK_SIZE_MAX};
use log::info;

use crate::cli::CompressArgs;
use crate::config;
use crate::error::Result;

pub struct Args {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub opts: CompressArgs,
    pub force: bool,
    pub nthreads: usize,
}

pub fn run(args: &Args) -> Result<()> {
    config::require_input_exists(&args.input)?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| config::default_compress_output(&args.input));
    config::check_output_allowed(&output, args.force)?;

    let config = CompressConfig {
        typesize: args.opts.typesize,
        clevel: args.opts.clevel as i32,
        shuffle: args.opts.shuffle,
        codec: config::parse_codec(&args.opts.codec)?,
        chunk_size: config::parse_chunk_size(&args.opts.chunk_size)?.unwrap_or(CHUNK_SIZE_MAX),
        checksum: config::parse_checksum(&args.opts.checksum)?,
        offsets: args.opts.offsets,
        metadata: args
            .opts
            .metadata
            .as_deref()
            .map(config::read_metadata)
            .transpose()?,
        nthreads: args.nthreads,
    };

    let source = File::open(&args.input)?;
    let sink = File::create(&output)?;
    let mut sink = BufWriter::new(sink);
    let stats = blpkc::compress_stream(source, &mut sink, &config)?;
    sink.flush()?;

    info!(
        "compressed {} -> {} ({} bytes -> {} bytes, {} chunks)",
        args.input.display(),
        output.display(),
        stats.source_size,
        stats.compressed_size,
        stats.nchunks,
    );
    Ok(())
}
