//! `decompress` subcommand: drive [`blpkc::decompress_stream`] over real files.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use blpkc::DecompressOptions;
use log::info;

use crate::config;
use crate::error::Result;

pub struct Args {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub no_check_extension: bool,
    pub force: bool,
    pub nthreads: usize,
}

pub fn run(args: &Args) -> Result<()> {
    config::require_input_exists(&args.input)?;
    config::check_extension(&args.input, !args.no_check_extension)?;

    let output = match &args.output {
        Some(path) => path.clone(),
        None => config::default_decompress_output(&args.input)?,
    };
    config::check_output_allowed(&output, args.force)?;

    let options = DecompressOptions {
        check_extension: !args.no_check_extension,
        nthreads: args.nthreads,
    };

    let source = File::open(&args.input)?;
    let sink = File::create(&output)?;
    let mut sink = BufWriter::new(sink);
    let metadata = blpkc::decompress_stream(source, &mut sink, &options)?;
    sink.flush()?;

    info!("decompressed {} -> {}", args.input.display(), output.display());
    if let Some(value) = metadata {
        info!("metadata: {}", value);
    }
    Ok(())
}
