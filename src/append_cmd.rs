//! `append` subcommand: drive [`blpkc::append_stream`] over an existing file,
//! opened read-write in place (spec.md §4.I — no backup, no rollback).

use std::fs::OpenOptions;
use std::path::PathBuf;

use blpkc::AppendConfig;
use log::info;

use crate::cli::AppendArgs;
use crate::config;
use crate::error::Result;

pub struct Args {
    pub orig: PathBuf,
    pub new: PathBuf,
    pub opts: AppendArgs,
    pub no_check_extension: bool,
    pub nthreads: usize,
}

pub fn run(args: &Args) -> Result<()> {
    config::require_input_exists(&args.orig)?;
    config::check_extension(&args.orig, !args.no_check_extension)?;
    config::require_input_exists(&args.new)?;

    let config = AppendConfig {
        typesize: args.opts.typesize,
        clevel: args.opts.clevel as i32,
        shuffle: args.opts.shuffle,
        codec: config::parse_codec(&args.opts.codec)?,
        checksum: config::parse_checksum(&args.opts.checksum)?,
        metadata: args
            .opts
            .metadata
            .as_deref()
            .map(config::read_metadata)
            .transpose()?,
        nthreads: args.nthreads,
    };

    let file = OpenOptions::new().read(true).write(true).open(&args.orig)?;
    let source = std::fs::File::open(&args.new)?;
    let stats = blpkc::append_stream(file, source, &config)?;

    info!(
        "appended {} onto {} ({} chunks total)",
        args.new.display(),
        args.orig.display(),
        stats.nchunks,
    );
    Ok(())
}
