//! Reader pipeline: sequential and random-access decompression of a
//! finalized container file.

use std::io::{Read, Seek, SeekFrom, Write};

use crate::chunk;
use crate::codec::{FRAME_CBYTES_OFFSET, FRAME_HEADER_SIZE};
use crate::error::{Error, Result};
use crate::header::{Header, MetaHeader, HEADER_SIZE, META_HEADER_SIZE};
use crate::metadata;
use crate::offsets::OffsetsTable;
use log::{debug, trace};

/// Options accepted by [`decompress_stream`].
#[derive(Debug, Clone)]
pub struct DecompressOptions {
    /// Accepted for API symmetry with the CLI layer; the core never looks
    /// at file names, so this is a no-op here.
    pub check_extension: bool,
    pub nthreads: usize,
}

impl Default for DecompressOptions {
    fn default() -> Self {
        DecompressOptions {
            check_extension: true,
            nthreads: 1,
        }
    }
}

/// Parsed headers of a container, without any chunk data decoded. Returned
/// by [`info`].
#[derive(Debug, Clone)]
pub struct Info {
    pub header: Header,
    pub meta_header: Option<MetaHeader>,
    pub metadata: Option<serde_json::Value>,
    pub offsets: Option<OffsetsTable>,
}

/// Parse just the headers (and offsets, if present) of a container.
pub fn info<R: Read>(mut source: R) -> Result<Info> {
    let mut header_buf = [0u8; HEADER_SIZE];
    source.read_exact(&mut header_buf)?;
    let header = Header::from_bytes(&header_buf)?;

    let mut meta_header = None;
    let mut metadata_value = None;
    if header.has_metadata() {
        let mut buf = [0u8; META_HEADER_SIZE];
        source.read_exact(&mut buf)?;
        let mh = MetaHeader::from_bytes(&buf)?;
        metadata_value = Some(read_metadata(&mut source, &mh)?);
        meta_header = Some(mh);
    }

    let offsets = if header.has_offsets() {
        let count = (header.nchunks + header.max_app_chunks) as usize;
        let mut buf = vec![0u8; OffsetsTable::byte_len(count)];
        source.read_exact(&mut buf)?;
        Some(OffsetsTable::parse(&buf, count)?)
    } else {
        None
    };

    Ok(Info {
        header,
        meta_header,
        metadata: metadata_value,
        offsets,
    })
}

/// Decode the metadata blob from a source already positioned at the start
/// of the metadata header, returning the parsed value and leaving the
/// source positioned right after the metadata region.
fn read_metadata<R: Read>(source: &mut R, meta_header: &MetaHeader) -> Result<serde_json::Value> {
    let mut region = vec![0u8; meta_header.max_meta_size as usize];
    source.read_exact(&mut region)?;
    metadata::decode(meta_header, &region)
}

/// Read the length of a chunk record starting at the current source
/// position without fully decoding it, by peeking the frame header.
pub(crate) fn peek_record_len<R: Read>(source: &mut R, checksum: crate::checksum::Checksum) -> Result<(Vec<u8>, usize)> {
    let mut frame_header = [0u8; FRAME_HEADER_SIZE];
    source.read_exact(&mut frame_header)?;
    let cbytes = u32::from_le_bytes(
        frame_header[FRAME_CBYTES_OFFSET..FRAME_CBYTES_OFFSET + 4]
            .try_into()
            .unwrap(),
    ) as usize;
    let mut rest = vec![0u8; cbytes - frame_header.len() + checksum.digest_size()];
    source.read_exact(&mut rest)?;
    let mut record = frame_header.to_vec();
    record.extend_from_slice(&rest);
    Ok((record, cbytes))
}

/// Decompress a whole container from `source` into `sink`, validating every
/// chunk checksum along the way. Returns the parsed metadata value, if any.
pub fn decompress_stream<R: Read, W: Write>(
    mut source: R,
    mut sink: W,
    options: &DecompressOptions,
) -> Result<Option<serde_json::Value>> {
    let mut header_buf = [0u8; HEADER_SIZE];
    source.read_exact(&mut header_buf)?;
    let header = Header::from_bytes(&header_buf)?;

    let meta_value = if header.has_metadata() {
        let mut buf = [0u8; META_HEADER_SIZE];
        source.read_exact(&mut buf)?;
        let meta_header = MetaHeader::from_bytes(&buf)?;
        Some(read_metadata(&mut source, &meta_header)?)
    } else {
        None
    };

    if header.has_offsets() {
        let count = (header.nchunks + header.max_app_chunks) as usize;
        let mut buf = vec![0u8; OffsetsTable::byte_len(count)];
        source.read_exact(&mut buf)?;
        // Offsets aren't needed for sequential reading; chunks are visited
        // in order regardless of whether the table is present.
    }

    debug!("decompress_stream: nchunks={}, checksum={}", header.nchunks, header.checksum);
    let nthreads = options.nthreads.max(1);
    let mut total_decoded: u64 = 0;
    for i in 0..header.nchunks as usize {
        let (record, _) = peek_record_len(&mut source, header.checksum)?;
        let decoded = chunk::decode(&record, header.checksum, nthreads, i)?;
        trace!("chunk {i}: {} byte record -> {} bytes", record.len(), decoded.len());
        total_decoded += decoded.len() as u64;
        sink.write_all(&decoded)?;
    }

    if header.chunk_size != crate::header::CHUNK_SIZE_SENTINEL && header.nchunks > 0 {
        let expected =
            (header.nchunks as u64 - 1) * header.chunk_size as u64 + header.last_chunk as u64;
        if expected != total_decoded {
            return Err(Error::MalformedHeader(
                "decoded length does not match header's declared total",
            ));
        }
    }

    Ok(meta_value)
}

/// Random-access decompression of a single chunk. Requires an offsets table.
pub fn read_chunk<R: Read + Seek>(
    mut source: R,
    info: &Info,
    index: usize,
    nthreads: usize,
) -> Result<Vec<u8>> {
    let offsets = info.offsets.as_ref().ok_or(Error::OffsetsDisabled)?;
    let offset = offsets.get(index).ok_or(Error::TruncatedFile)?;
    if offset < 0 {
        return Err(Error::TruncatedFile);
    }
    source.seek(SeekFrom::Start(offset as u64))?;
    let (record, _) = peek_record_len(&mut source, info.header.checksum)?;
    chunk::decode(&record, info.header.checksum, nthreads.max(1), index)
}
