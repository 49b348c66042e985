//! Block codec adapter: compresses and decompresses whole chunks, each
//! split into independently (de)compressible blocks so that a chunk can be
//! processed by more than one thread.
//!
//! Frame layout produced by [`compress`]:
//!
//! ```text
//! [ algo_id    : 1 B ]
//! [ flags      : 1 B ]   bit0 = shuffle applied
//! [ typesize   : 1 B ]
//! [ reserved   : 1 B ]   zero
//! [ nbytes     : 4 B LE ]  uncompressed length of the whole chunk
//! [ blocksize  : 4 B LE ]  uncompressed size of each block (last one may be shorter)
//! [ cbytes     : 4 B LE ]  total length of this frame, header included
//! [ block_sizes: 4*nblocks B LE ]  on-disk size of each block, marker byte included
//! [ block_0 .. block_{nblocks-1} ]
//! ```
//!
//! Each block is itself `[marker: 1 B][payload]`: marker `0` means payload is
//! stored raw (the algorithm did not shrink this block), marker `1` means
//! payload is the algorithm's compressed output.

pub mod blosclz;
pub mod shuffle;

use std::thread;

use crate::error::{Error, Result};

pub const FRAME_HEADER_SIZE: usize = 16;
/// Byte offset of the `cbytes` field within a frame header, exposed so the
/// reader can peek a record's total length before reading the rest of it.
pub const FRAME_CBYTES_OFFSET: usize = 12;
const MAX_BLOCK_SIZE: usize = 4 << 20;
const SHUFFLE_FLAG: u8 = 0b0000_0001;

/// A block compression algorithm. The variant's position is not the wire
/// id directly; see [`Algorithm::id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    BloscLZ,
    Lz4,
    Lz4Hc,
    Snappy,
    Zlib,
}

pub const TABLE: &[Algorithm] = &[
    Algorithm::BloscLZ,
    Algorithm::Lz4,
    Algorithm::Lz4Hc,
    Algorithm::Snappy,
    Algorithm::Zlib,
];

impl Algorithm {
    pub fn id(self) -> u8 {
        TABLE.iter().position(|a| *a == self).expect("in TABLE") as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        TABLE.get(id as usize).copied()
    }

    pub fn from_name(name: &str) -> Option<Self> {
        TABLE.iter().copied().find(|a| a.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Algorithm::BloscLZ => "blosclz",
            Algorithm::Lz4 => "lz4",
            Algorithm::Lz4Hc => "lz4hc",
            Algorithm::Snappy => "snappy",
            Algorithm::Zlib => "zlib",
        }
    }
}

impl Default for Algorithm {
    fn default() -> Self {
        Algorithm::BloscLZ
    }
}

/// Compress one block's worth of bytes with `algorithm`. Returns the
/// compressed bytes, or `None` if compression did not shrink the block (the
/// caller then stores it raw).
fn compress_block(algorithm: Algorithm, level: i32, block: &[u8]) -> Option<Vec<u8>> {
    match algorithm {
        Algorithm::BloscLZ => {
            let mut out = vec![0u8; block.len() + 64];
            let n = blosclz::compress(level, block, &mut out);
            if n == 0 || n >= block.len() {
                None
            } else {
                out.truncate(n);
                Some(out)
            }
        }
        Algorithm::Lz4 | Algorithm::Lz4Hc => {
            let out = lz4_flex::block::compress(block);
            if out.len() >= block.len() {
                None
            } else {
                Some(out)
            }
        }
        Algorithm::Snappy => {
            let mut encoder = snap::raw::Encoder::new();
            let out = encoder
                .compress_vec(block)
                .expect("snap in-memory compression never fails");
            if out.len() >= block.len() {
                None
            } else {
                Some(out)
            }
        }
        Algorithm::Zlib => {
            use flate2::write::ZlibEncoder;
            use flate2::Compression;
            use std::io::Write;
            let clevel = Compression::new((level.clamp(0, 9)) as u32);
            let mut encoder = ZlibEncoder::new(Vec::new(), clevel);
            encoder
                .write_all(block)
                .expect("in-memory writer never fails");
            let out = encoder.finish().expect("in-memory writer never fails");
            if out.len() >= block.len() {
                None
            } else {
                Some(out)
            }
        }
    }
}

fn decompress_block(algorithm: Algorithm, payload: &[u8], uncompressed_len: usize) -> Result<Vec<u8>> {
    match algorithm {
        Algorithm::BloscLZ => {
            let mut out = vec![0u8; uncompressed_len];
            let n = blosclz::decompress(payload, &mut out);
            if n != uncompressed_len {
                return Err(Error::Decode("blosclz block size mismatch".into()));
            }
            Ok(out)
        }
        Algorithm::Lz4 | Algorithm::Lz4Hc => lz4_flex::block::decompress(payload, uncompressed_len)
            .map_err(|e| Error::Decode(format!("lz4: {}", e))),
        Algorithm::Snappy => {
            let mut decoder = snap::raw::Decoder::new();
            decoder
                .decompress_vec(payload)
                .map_err(|e| Error::Decode(format!("snappy: {}", e)))
        }
        Algorithm::Zlib => {
            use flate2::read::ZlibDecoder;
            use std::io::Read;
            let mut decoder = ZlibDecoder::new(payload);
            let mut out = Vec::with_capacity(uncompressed_len);
            decoder
                .read_to_end(&mut out)
                .map_err(|e| Error::Decode(format!("zlib: {}", e)))?;
            Ok(out)
        }
    }
}

/// Compress `data` as a single block, with a leading marker byte (`0` raw,
/// `1` compressed). Used by the metadata region, which has its own header
/// carrying `meta_size`/`meta_comp_size` and does not need the chunk frame's
/// block-size table.
pub fn compress_single(data: &[u8], algorithm: Algorithm, level: i32) -> Vec<u8> {
    match compress_block(algorithm, level, data) {
        Some(payload) => {
            let mut out = Vec::with_capacity(payload.len() + 1);
            out.push(1);
            out.extend_from_slice(&payload);
            out
        }
        None => {
            let mut out = Vec::with_capacity(data.len() + 1);
            out.push(0);
            out.extend_from_slice(data);
            out
        }
    }
}

/// Inverse of [`compress_single`].
pub fn decompress_single(data: &[u8], algorithm: Algorithm, uncompressed_len: usize) -> Result<Vec<u8>> {
    if data.is_empty() {
        return Err(Error::Decode("empty single-block payload".into()));
    }
    let marker = data[0];
    let body = &data[1..];
    match marker {
        0 => Ok(body.to_vec()),
        1 => decompress_block(algorithm, body, uncompressed_len),
        m => Err(Error::Decode(format!("unknown block marker {}", m))),
    }
}

/// Pick a block size so that `nthreads` blocks can run concurrently over a
/// chunk of `nbytes`, aligned to `typesize` and capped at [`MAX_BLOCK_SIZE`].
fn choose_blocksize(nbytes: usize, typesize: usize, nthreads: usize) -> usize {
    if nbytes == 0 {
        return typesize.max(1);
    }
    let nthreads = nthreads.max(1);
    let raw = nbytes.div_ceil(nthreads);
    let typesize = typesize.max(1);
    let aligned = raw.div_ceil(typesize) * typesize;
    aligned.clamp(typesize, MAX_BLOCK_SIZE)
}

/// Compress `buf` into a self-describing frame.
pub fn compress(
    buf: &[u8],
    algorithm: Algorithm,
    level: i32,
    shuffle: bool,
    typesize: u8,
    nthreads: usize,
) -> Vec<u8> {
    let typesize_usize = typesize.max(1) as usize;
    let shuffled;
    let data: &[u8] = if shuffle && buf.len() >= typesize_usize {
        let mut out = vec![0u8; buf.len()];
        shuffle::shuffle(typesize_usize, buf, &mut out);
        shuffled = out;
        &shuffled
    } else {
        buf
    };

    let blocksize = choose_blocksize(data.len(), typesize_usize, nthreads);
    let blocks: Vec<&[u8]> = data.chunks(blocksize.max(1)).collect();
    let nblocks = blocks.len().max(1);

    let compressed_blocks: Vec<Vec<u8>> = thread::scope(|scope| {
        let handles: Vec<_> = blocks
            .iter()
            .map(|block| {
                scope.spawn(move || match compress_block(algorithm, level, block) {
                    Some(payload) => {
                        let mut framed = Vec::with_capacity(payload.len() + 1);
                        framed.push(1);
                        framed.extend_from_slice(&payload);
                        framed
                    }
                    None => {
                        let mut framed = Vec::with_capacity(block.len() + 1);
                        framed.push(0);
                        framed.extend_from_slice(block);
                        framed
                    }
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("block compression thread panicked"))
            .collect()
    });

    let mut frame = Vec::with_capacity(FRAME_HEADER_SIZE + nblocks * 4 + data.len());
    frame.push(algorithm.id());
    frame.push(if shuffle { SHUFFLE_FLAG } else { 0 });
    frame.push(typesize);
    frame.push(0);
    frame.extend_from_slice(&(data.len() as u32).to_le_bytes());
    frame.extend_from_slice(&(blocksize as u32).to_le_bytes());
    frame.extend_from_slice(&[0u8; 4]); // cbytes, patched below
    for b in &compressed_blocks {
        frame.extend_from_slice(&(b.len() as u32).to_le_bytes());
    }
    for b in &compressed_blocks {
        frame.extend_from_slice(b);
    }

    let total = frame.len() as u32;
    frame[12..16].copy_from_slice(&total.to_le_bytes());
    frame
}

/// Decompress a frame produced by [`compress`].
pub fn decompress(frame: &[u8], nthreads: usize) -> Result<Vec<u8>> {
    if frame.len() < FRAME_HEADER_SIZE {
        return Err(Error::Decode("frame shorter than its own header".into()));
    }
    let algo_id = frame[0];
    let flags = frame[1];
    let typesize = frame[2];
    let nbytes = u32::from_le_bytes(frame[4..8].try_into().unwrap()) as usize;
    let blocksize = u32::from_le_bytes(frame[8..12].try_into().unwrap()) as usize;
    let cbytes = u32::from_le_bytes(frame[12..16].try_into().unwrap()) as usize;
    if cbytes != frame.len() {
        return Err(Error::Decode("frame cbytes does not match its length".into()));
    }

    let algorithm = Algorithm::from_id(algo_id)
        .ok_or_else(|| Error::Decode(format!("unknown block algorithm id {}", algo_id)))?;

    let nblocks = if nbytes == 0 {
        1
    } else {
        nbytes.div_ceil(blocksize.max(1))
    };

    let sizes_start = FRAME_HEADER_SIZE;
    let sizes_end = sizes_start + nblocks * 4;
    if frame.len() < sizes_end {
        return Err(Error::Decode("frame truncated in block size table".into()));
    }
    let mut block_sizes = Vec::with_capacity(nblocks);
    for i in 0..nblocks {
        let off = sizes_start + i * 4;
        block_sizes.push(u32::from_le_bytes(frame[off..off + 4].try_into().unwrap()) as usize);
    }

    let mut block_offsets = Vec::with_capacity(nblocks);
    let mut cursor = sizes_end;
    for size in &block_sizes {
        block_offsets.push(cursor);
        cursor += size;
    }
    if cursor != frame.len() {
        return Err(Error::Decode("frame truncated in block payloads".into()));
    }

    let block_uncompressed_len = |i: usize| -> usize {
        if i + 1 == nblocks {
            nbytes - blocksize * (nblocks - 1)
        } else {
            blocksize
        }
    };

    let decompressed_blocks: Vec<Result<Vec<u8>>> = thread::scope(|scope| {
        let _ = nthreads;
        let handles: Vec<_> = (0..nblocks)
            .map(|i| {
                let start = block_offsets[i];
                let size = block_sizes[i];
                let payload = &frame[start..start + size];
                let uncompressed_len = block_uncompressed_len(i);
                scope.spawn(move || {
                    if payload.is_empty() {
                        return Err(Error::Decode("empty block payload".into()));
                    }
                    let marker = payload[0];
                    let body = &payload[1..];
                    match marker {
                        0 => Ok(body.to_vec()),
                        1 => decompress_block(algorithm, body, uncompressed_len),
                        m => Err(Error::Decode(format!("unknown block marker {}", m))),
                    }
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("block decompression thread panicked"))
            .collect()
    });

    let mut data = Vec::with_capacity(nbytes);
    for block in decompressed_blocks {
        data.extend(block?);
    }
    if data.len() != nbytes {
        return Err(Error::Decode("decompressed length does not match nbytes".into()));
    }

    if flags & SHUFFLE_FLAG != 0 {
        let typesize_usize = typesize.max(1) as usize;
        let mut out = vec![0u8; data.len()];
        shuffle::unshuffle(typesize_usize, &data, &mut out);
        Ok(out)
    } else {
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_each_algorithm() {
        let data = b"the quick brown fox jumps over the lazy dog ".repeat(200);
        for algorithm in TABLE {
            let frame = compress(&data, *algorithm, 6, false, 1, 2);
            let out = decompress(&frame, 2).unwrap();
            assert_eq!(out, data, "algorithm {:?} round trip", algorithm);
        }
    }

    #[test]
    fn round_trip_with_shuffle_and_typesize() {
        let data: Vec<u8> = (0..4000u32).flat_map(|i| i.to_le_bytes()).collect();
        let frame = compress(&data, Algorithm::Zlib, 6, true, 4, 4);
        let out = decompress(&frame, 4).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn round_trip_empty_buffer() {
        let frame = compress(&[], Algorithm::Lz4, 1, false, 1, 1);
        let out = decompress(&frame, 1).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn round_trip_incompressible_data() {
        let data: Vec<u8> = (0..5000u32).map(|i| (i.wrapping_mul(2654435761) >> 16) as u8).collect();
        let frame = compress(&data, Algorithm::BloscLZ, 9, false, 1, 3);
        let out = decompress(&frame, 3).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn algorithm_ids_are_stable() {
        for (i, a) in TABLE.iter().enumerate() {
            assert_eq!(a.id(), i as u8);
            assert_eq!(Algorithm::from_id(i as u8), Some(*a));
        }
    }

    #[test]
    fn decompress_rejects_bad_cbytes() {
        let mut frame = compress(b"hello world hello world hello world", Algorithm::Lz4, 1, false, 1, 1);
        let last = frame.len() - 1;
        frame[last] ^= 0xFF;
        // corrupt the final payload byte without touching the header; cbytes
        // still matches frame length so this exercises the decoder, not the
        // length check.
        let _ = decompress(&frame, 1);
    }
}
