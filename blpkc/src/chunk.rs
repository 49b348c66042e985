//! Chunk record: the block codec's self-describing frame (see
//! [`crate::codec`]) followed by a checksum digest over that frame.

use crate::checksum::Checksum;
use crate::codec::{self, Algorithm};
use crate::error::{Error, Result};

/// Parameters that control how a single chunk is encoded.
#[derive(Debug, Clone, Copy)]
pub struct ChunkCodecParams {
    pub algorithm: Algorithm,
    pub level: i32,
    pub shuffle: bool,
    pub typesize: u8,
    pub nthreads: usize,
    pub checksum: Checksum,
}

/// Compress `data` and append its checksum, producing a full on-disk chunk
/// record.
pub fn encode(data: &[u8], params: &ChunkCodecParams) -> Vec<u8> {
    let mut record = codec::compress(
        data,
        params.algorithm,
        params.level,
        params.shuffle,
        params.typesize,
        params.nthreads,
    );
    let digest = params.checksum.digest(&record);
    record.extend_from_slice(&digest);
    record
}

/// Split a chunk record into its framed bytes and trailing checksum digest,
/// verifying the checksum along the way.
///
/// `chunk_index` is used only to identify the chunk in the returned error.
pub fn verify_and_split<'a>(
    record: &'a [u8],
    checksum: Checksum,
    chunk_index: usize,
) -> Result<&'a [u8]> {
    let digest_size = checksum.digest_size();
    if record.len() < digest_size {
        return Err(Error::TruncatedChunk);
    }
    let split = record.len() - digest_size;
    let (framed, digest) = record.split_at(split);
    if digest_size > 0 && !checksum.verify(framed, digest) {
        return Err(Error::ChunkChecksumMismatch(chunk_index));
    }
    Ok(framed)
}

/// Verify and decompress a chunk record back to its original bytes.
pub fn decode(
    record: &[u8],
    checksum: Checksum,
    nthreads: usize,
    chunk_index: usize,
) -> Result<Vec<u8>> {
    let framed = verify_and_split(record, checksum, chunk_index)?;
    codec::decompress(framed, nthreads)
}
