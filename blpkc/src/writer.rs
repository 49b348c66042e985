//! Writer pipeline: turns a byte stream into a finalized container file.

use std::io::{Read, Seek, SeekFrom, Write};

use crate::chunk::{self, ChunkCodecParams};
use crate::checksum::Checksum;
use crate::codec::Algorithm;
use crate::error::{Error, Result};
use crate::header::{Header, Options, HEADER_SIZE};
use crate::metadata::{self, MetaCodecParams};
use crate::offsets::OffsetsTable;
use log::{debug, trace};

/// Nominal chunk size meaning "pick the largest sensible value".
pub const CHUNK_SIZE_MAX: u32 = 0;

const DEFAULT_CHUNK_SIZE: u32 = 1 << 20;
const CODEC_CHUNK_LIMIT: u32 = 256 << 20;

/// Configuration accepted by [`compress_stream`].
#[derive(Debug, Clone)]
pub struct CompressConfig {
    pub typesize: u8,
    pub clevel: i32,
    pub shuffle: bool,
    pub codec: Algorithm,
    pub chunk_size: u32,
    pub checksum: Checksum,
    pub offsets: bool,
    pub metadata: Option<serde_json::Value>,
    pub nthreads: usize,
}

impl Default for CompressConfig {
    fn default() -> Self {
        CompressConfig {
            typesize: 8,
            clevel: 7,
            shuffle: true,
            codec: Algorithm::BloscLZ,
            chunk_size: DEFAULT_CHUNK_SIZE,
            checksum: Checksum::Adler32,
            offsets: true,
            metadata: None,
            nthreads: 1,
        }
    }
}

impl CompressConfig {
    /// Validate configuration-only invariants, before any I/O happens.
    pub fn validate(&self) -> Result<()> {
        if self.typesize == 0 {
            return Err(Error::TypesizeInvalid);
        }
        if self.chunk_size != CHUNK_SIZE_MAX
            && (self.chunk_size == 0 || self.chunk_size > CODEC_CHUNK_LIMIT)
        {
            return Err(Error::ChunkSizeOutOfRange);
        }
        if self.nthreads == 0 || self.nthreads > 256 {
            return Err(Error::NthreadsOutOfRange);
        }
        Ok(())
    }
}

/// Summary of a finished compress or append run.
#[derive(Debug, Clone, Default)]
pub struct Stats {
    pub source_size: u64,
    pub compressed_size: u64,
    pub nchunks: i64,
}

/// Resolve the nominal `chunk_size` to use, given the already-validated
/// config and the input's actual length. `CHUNK_SIZE_MAX` picks the largest
/// value that is both within the codec's per-call limit and no larger than
/// the input itself, so a "max" request on a small input does not pad out
/// to `CODEC_CHUNK_LIMIT`.
fn resolve_chunk_size(config: &CompressConfig, input_len: u64) -> u32 {
    if config.chunk_size == CHUNK_SIZE_MAX {
        input_len.min(CODEC_CHUNK_LIMIT as u64).max(1) as u32
    } else {
        config.chunk_size
    }
}

/// Read the whole of `source` into memory and compress it into `sink`,
/// producing a finalized, self-contained container.
pub fn compress_stream<R: Read, W: Write + Seek>(
    mut source: R,
    mut sink: W,
    config: &CompressConfig,
) -> Result<Stats> {
    config.validate()?;

    let mut input = Vec::new();
    source.read_to_end(&mut input)?;
    let input_len = input.len() as u64;

    let chunk_size = resolve_chunk_size(config, input_len);

    let nchunks = if input.is_empty() {
        0
    } else {
        input_len.div_ceil(chunk_size as u64).max(1) as i64
    };
    let last_chunk = if nchunks == 0 {
        0
    } else {
        (input_len - (nchunks as u64 - 1) * chunk_size as u64) as u32
    };

    let max_app_chunks = if config.offsets { 10 * nchunks } else { 0 };
    debug!(
        "compress_stream: {} bytes, chunk_size={}, nchunks={}, max_app_chunks={}",
        input_len, chunk_size, nchunks, max_app_chunks
    );

    let mut options = Options::default();
    if config.offsets {
        options.insert(Options::OFFSETS);
    }
    let encoded_meta = match &config.metadata {
        Some(value) => {
            options.insert(Options::METADATA);
            Some(metadata::encode(value, &MetaCodecParams::default())?)
        }
        None => None,
    };

    let header = Header {
        format_version: crate::header::FORMAT_VERSION,
        options,
        checksum: config.checksum,
        typesize: config.typesize,
        chunk_size: if nchunks == 0 {
            crate::header::CHUNK_SIZE_SENTINEL
        } else {
            chunk_size
        },
        last_chunk,
        nchunks,
        max_app_chunks,
    };
    sink.write_all(&header.to_bytes())?;

    if let Some(meta) = &encoded_meta {
        sink.write_all(&meta.header.to_bytes())?;
        sink.write_all(&meta.region)?;
    }

    let offsets_count = (nchunks + max_app_chunks) as usize;
    let offsets_region_start = sink.stream_position()?;
    let mut offsets = OffsetsTable::new(nchunks as usize, max_app_chunks as usize);
    if config.offsets {
        sink.write_all(&offsets.serialize())?;
    }
    debug_assert_eq!(offsets.len(), offsets_count);

    let params = ChunkCodecParams {
        algorithm: config.codec,
        level: config.clevel,
        shuffle: config.shuffle,
        typesize: config.typesize,
        nthreads: config.nthreads,
        checksum: config.checksum,
    };

    let mut compressed_size: u64 = HEADER_SIZE as u64;
    let mut remaining = &input[..];
    for i in 0..nchunks as usize {
        let take = if i + 1 == nchunks as usize {
            last_chunk as usize
        } else {
            chunk_size as usize
        };
        let (chunk_data, rest) = remaining.split_at(take);
        remaining = rest;

        let pos = sink.stream_position()?;
        if config.offsets {
            offsets.set(i, pos);
        }
        let record = chunk::encode(chunk_data, &params);
        trace!("chunk {i}: {} bytes -> {} byte record", chunk_data.len(), record.len());
        sink.write_all(&record)?;
        compressed_size += record.len() as u64;
    }

    if config.offsets {
        sink.seek(SeekFrom::Start(offsets_region_start))?;
        sink.write_all(&offsets.serialize())?;
        sink.seek(SeekFrom::End(0))?;
    }

    Ok(Stats {
        source_size: input_len,
        compressed_size,
        nchunks,
    })
}
