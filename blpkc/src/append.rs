//! Append pipeline: extend a finalized container in place, bounded by the
//! reserved `max_app_chunks` capacity.

use std::io::{Read, Seek, SeekFrom, Write};

use crate::chunk::{self, ChunkCodecParams};
use crate::checksum::Checksum;
use crate::codec::Algorithm;
use crate::error::{Error, Result};
use crate::header::{Header, MetaHeader, HEADER_SIZE, META_HEADER_SIZE};
use crate::metadata::{self, MetaCodecParams};
use crate::offsets::OffsetsTable;
use crate::reader::peek_record_len;
use crate::writer::Stats;
use log::debug;

/// Configuration accepted by [`append_stream`]. The compression settings
/// are reused for newly appended chunks; they need not match the chunks
/// already in the file.
#[derive(Debug, Clone)]
pub struct AppendConfig {
    pub typesize: u8,
    pub clevel: i32,
    pub shuffle: bool,
    pub codec: Algorithm,
    pub checksum: Checksum,
    pub metadata: Option<serde_json::Value>,
    pub nthreads: usize,
}

impl Default for AppendConfig {
    fn default() -> Self {
        AppendConfig {
            typesize: 8,
            clevel: 7,
            shuffle: true,
            codec: Algorithm::BloscLZ,
            checksum: Checksum::Adler32,
            metadata: None,
            nthreads: 1,
        }
    }
}

/// Append the bytes read from `source` onto the end of the logical payload
/// stored in `file`, reusing the capacity reserved by the original
/// `compress_stream` call.
pub fn append_stream<F: Read + Write + Seek, R: Read>(
    mut file: F,
    mut source: R,
    config: &AppendConfig,
) -> Result<Stats> {
    file.seek(SeekFrom::Start(0))?;
    let mut header_buf = [0u8; HEADER_SIZE];
    file.read_exact(&mut header_buf)?;
    let mut header = Header::from_bytes(&header_buf)?;

    if !header.has_offsets() {
        return Err(Error::OffsetsDisabled);
    }
    if header.max_app_chunks == 0 {
        return Err(Error::AppendCapacityExceeded {
            old_nchunks: header.nchunks,
            max_app_chunks: 0,
        });
    }

    let meta_header_pos = file.stream_position()?;
    let meta_header = if header.has_metadata() {
        let mut buf = [0u8; META_HEADER_SIZE];
        file.read_exact(&mut buf)?;
        Some((MetaHeader::from_bytes(&buf)?, meta_header_pos))
    } else {
        None
    };
    if let Some((mh, _)) = &meta_header {
        file.seek(SeekFrom::Current(mh.max_meta_size as i64))?;
    }

    let offsets_region_start = file.stream_position()?;
    let offsets_count = (header.nchunks + header.max_app_chunks) as usize;
    let mut offsets_buf = vec![0u8; OffsetsTable::byte_len(offsets_count)];
    file.read_exact(&mut offsets_buf)?;
    let mut offsets = OffsetsTable::parse(&offsets_buf, offsets_count)?;

    let old_nchunks = header.nchunks;
    let chunk_size = header.chunk_size;
    if chunk_size == crate::header::CHUNK_SIZE_SENTINEL {
        return Err(Error::MalformedHeader(
            "cannot append to a file with no fixed chunk size",
        ));
    }

    // Read and decompress the last chunk, which becomes the accumulator.
    let mut accumulator = Vec::new();
    if old_nchunks > 0 {
        let last_index = (old_nchunks - 1) as usize;
        let last_offset = offsets
            .get(last_index)
            .filter(|o| *o >= 0)
            .ok_or(Error::TruncatedFile)?;
        file.seek(SeekFrom::Start(last_offset as u64))?;
        let (record, _) = peek_record_len(&mut file, header.checksum)?;
        accumulator = chunk::decode(&record, header.checksum, config.nthreads.max(1), last_index)?;
        file.seek(SeekFrom::Start(last_offset as u64))?;
    } else {
        file.seek(SeekFrom::End(0))?;
    }

    let params = ChunkCodecParams {
        algorithm: config.codec,
        level: config.clevel,
        shuffle: config.shuffle,
        typesize: config.typesize,
        nthreads: config.nthreads,
        checksum: config.checksum,
    };

    let mut new_input = Vec::new();
    source.read_to_end(&mut new_input)?;
    let source_size = new_input.len() as u64;

    let write_pos_of_last = if old_nchunks > 0 {
        offsets.get((old_nchunks - 1) as usize).unwrap() as u64
    } else {
        file.stream_position()?
    };
    file.seek(SeekFrom::Start(write_pos_of_last))?;

    accumulator.extend_from_slice(&new_input);

    let mut new_nchunks = old_nchunks.max(0);
    let mut last_chunk_len = 0u32;
    let mut cursor = 0usize;
    let mut chunk_index = if old_nchunks > 0 { old_nchunks - 1 } else { 0 };

    while !accumulator.is_empty() {
        let take = (chunk_size as usize).min(accumulator.len() - cursor);
        let data = &accumulator[cursor..cursor + take];
        cursor += take;

        if chunk_index >= old_nchunks + header.max_app_chunks {
            return Err(Error::AppendCapacityExceeded {
                old_nchunks,
                max_app_chunks: header.max_app_chunks,
            });
        }

        let pos = file.stream_position()?;
        offsets.set(chunk_index as usize, pos);
        let record = chunk::encode(data, &params);
        file.write_all(&record)?;

        last_chunk_len = take as u32;
        new_nchunks = chunk_index + 1;
        chunk_index += 1;

        if cursor >= accumulator.len() {
            break;
        }
    }

    if new_nchunks > old_nchunks + header.max_app_chunks {
        return Err(Error::AppendCapacityExceeded {
            old_nchunks,
            max_app_chunks: header.max_app_chunks,
        });
    }
    debug!("append_stream: old_nchunks={old_nchunks}, new_nchunks={new_nchunks}, source_size={source_size}");

    file.set_len(file.stream_position()?)?;

    if let Some(new_meta) = &config.metadata {
        let (old_meta_header, pos) = meta_header.ok_or(Error::MetaTooLarge {
            needed: 0,
            max: 0,
        })?;
        let reuse_params = MetaCodecParams {
            algorithm: Algorithm::from_id(old_meta_header.meta_codec_id)
                .ok_or_else(|| Error::UnknownCodec(format!("meta_codec_id {}", old_meta_header.meta_codec_id)))?,
            level: old_meta_header.meta_level as i32,
            checksum: old_meta_header.meta_checksum,
        };
        let encoded = metadata::encode(new_meta, &reuse_params)?;
        let needed = encoded.header.meta_comp_size + encoded.header.meta_checksum.digest_size() as u32;
        if needed > old_meta_header.max_meta_size {
            return Err(Error::MetaTooLarge {
                needed,
                max: old_meta_header.max_meta_size,
            });
        }
        let mut padded_header = encoded.header;
        padded_header.max_meta_size = old_meta_header.max_meta_size;
        let mut region = encoded.region;
        region.resize(old_meta_header.max_meta_size as usize, 0);

        file.seek(SeekFrom::Start(pos))?;
        file.write_all(&padded_header.to_bytes())?;
        file.write_all(&region)?;
    }

    header.nchunks = new_nchunks;
    header.last_chunk = last_chunk_len;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(&header.to_bytes())?;

    file.seek(SeekFrom::Start(offsets_region_start))?;
    file.write_all(&offsets.serialize())?;

    Ok(Stats {
        source_size,
        compressed_size: file.stream_position()?,
        nchunks: new_nchunks,
    })
}
