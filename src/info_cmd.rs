//! `info` subcommand: parse headers (and metadata, if present) without
//! decoding any chunk.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use crate::config;
use crate::error::Result;

const MAX_OFFSETS_SHOWN: usize = 8;

pub struct Args {
    pub file: PathBuf,
}

pub fn run(args: &Args) -> Result<()> {
    config::require_input_exists(&args.file)?;

    let source = BufReader::new(File::open(&args.file)?);
    let parsed = blpkc::info(source)?;
    let header = &parsed.header;

    println!("file:            {}", args.file.display());
    println!("format_version:  {}", header.format_version);
    println!("checksum:        {}", header.checksum);
    println!("typesize:        {}", header.typesize);
    if header.chunk_size == blpkc::header::CHUNK_SIZE_SENTINEL {
        println!("chunk_size:      variable");
    } else {
        println!("chunk_size:      {}", header.chunk_size);
    }
    println!("last_chunk:      {}", header.last_chunk);
    println!("nchunks:         {}", header.nchunks);
    println!("max_app_chunks:  {}", header.max_app_chunks);
    println!("offsets:         {}", header.has_offsets());
    println!("metadata:        {}", header.has_metadata());

    if let Some(meta_header) = &parsed.meta_header {
        let meta_codec = blpkc::Algorithm::from_id(meta_header.meta_codec_id)
            .map(|a| a.name())
            .unwrap_or("unknown");
        println!();
        println!("meta_codec:      {}", meta_codec);
        println!("meta_checksum:   {}", meta_header.meta_checksum);
        println!("meta_size:       {}", meta_header.meta_size);
        println!("meta_comp_size:  {}", meta_header.meta_comp_size);
        println!("max_meta_size:   {}", meta_header.max_meta_size);
    }
    if let Some(value) = &parsed.metadata {
        println!("metadata value:  {}", value);
    }

    if let Some(offsets) = &parsed.offsets {
        println!();
        let shown = offsets.len().min(MAX_OFFSETS_SHOWN);
        for i in 0..shown {
            println!("offsets[{i}]:       {}", offsets.get(i).unwrap());
        }
        if offsets.len() > shown {
            println!("... ({} more)", offsets.len() - shown);
        }
    }

    Ok(())
}
