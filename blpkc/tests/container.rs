//! Integration tests exercising the container format end to end through the
//! public `blpkc` API only (no internal module access), scaled-down
//! equivalents of the scenarios documented alongside the container format.

use std::io::{Cursor, Read, Seek, SeekFrom};

use blpkc::{
    append_stream, compress_stream, decompress_stream, info, read_chunk, AppendConfig, Checksum,
    CompressConfig, DecompressOptions, Error,
};
use tempfile::tempfile;

fn linspace_like(n: usize) -> Vec<u8> {
    // Deterministic pseudo-float payload without pulling in a numeric crate:
    // eight bytes per element, monotonically increasing bit pattern.
    let mut buf = Vec::with_capacity(n * 8);
    for i in 0..n as u64 {
        buf.extend_from_slice(&i.to_le_bytes());
    }
    buf
}

#[test]
fn basic_round_trip_reports_expected_chunk_layout() {
    let input = linspace_like(20_000);
    let config = CompressConfig {
        chunk_size: 8192,
        ..Default::default()
    };
    let mut sink = Cursor::new(Vec::new());
    let stats = compress_stream(Cursor::new(&input[..]), &mut sink, &config).unwrap();

    let expected_nchunks = (input.len() as u32).div_ceil(8192) as i64;
    assert_eq!(stats.nchunks, expected_nchunks);
    assert_eq!(stats.source_size, input.len() as u64);

    let bytes = sink.into_inner();
    let parsed = info(Cursor::new(&bytes[..])).unwrap();
    assert_eq!(parsed.header.nchunks, expected_nchunks);
    assert_eq!(parsed.header.chunk_size, 8192);
    let expected_last = input.len() as u32 - (expected_nchunks as u32 - 1) * 8192;
    assert_eq!(parsed.header.last_chunk, expected_last);

    let mut out = Vec::new();
    decompress_stream(
        Cursor::new(&bytes[..]),
        &mut out,
        &DecompressOptions::default(),
    )
    .unwrap();
    assert_eq!(out, input);
}

#[test]
fn disabling_offsets_forbids_random_access() {
    let input = linspace_like(5_000);
    let config = CompressConfig {
        chunk_size: 4096,
        offsets: false,
        ..Default::default()
    };
    let mut sink = Cursor::new(Vec::new());
    compress_stream(Cursor::new(&input[..]), &mut sink, &config).unwrap();
    let bytes = sink.into_inner();

    let parsed = info(Cursor::new(&bytes[..])).unwrap();
    assert!(!parsed.header.has_offsets());
    assert_eq!(parsed.header.max_app_chunks, 0);

    let mut cursor = Cursor::new(&bytes[..]);
    let err = read_chunk(&mut cursor, &parsed, 0, 1).unwrap_err();
    assert!(matches!(err, Error::OffsetsDisabled));

    // Sequential decompression still works without an offsets table.
    let mut out = Vec::new();
    decompress_stream(
        Cursor::new(&bytes[..]),
        &mut out,
        &DecompressOptions::default(),
    )
    .unwrap();
    assert_eq!(out, input);
}

#[test]
fn alternate_checksum_detects_corruption_by_chunk_index() {
    let input = linspace_like(5_000);
    let config = CompressConfig {
        chunk_size: 4096,
        checksum: Checksum::Sha512,
        ..Default::default()
    };
    let mut sink = Cursor::new(Vec::new());
    compress_stream(Cursor::new(&input[..]), &mut sink, &config).unwrap();
    let mut bytes = sink.into_inner();

    let parsed = info(Cursor::new(&bytes[..])).unwrap();
    assert_eq!(parsed.header.checksum.digest_size(), 64);
    assert!(parsed.header.nchunks >= 2);

    // Corrupt a byte inside the second chunk's record.
    let offsets = parsed.offsets.as_ref().unwrap();
    let second = offsets.get(1).unwrap() as usize;
    bytes[second + 5] ^= 0xFF;

    let mut out = Vec::new();
    let err = decompress_stream(
        Cursor::new(&bytes[..]),
        &mut out,
        &DecompressOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::ChunkChecksumMismatch(1)));
}

#[test]
fn metadata_round_trips_through_compress_and_decompress() {
    let input = linspace_like(20_000);
    let metadata = serde_json::json!({
        "dtype": "float64",
        "shape": [20_000],
        "container": "numpy",
    });
    let config = CompressConfig {
        chunk_size: 8192,
        metadata: Some(metadata.clone()),
        ..Default::default()
    };
    let mut sink = Cursor::new(Vec::new());
    compress_stream(Cursor::new(&input[..]), &mut sink, &config).unwrap();
    let bytes = sink.into_inner();

    let parsed = info(Cursor::new(&bytes[..])).unwrap();
    assert!(parsed.header.has_metadata());
    let meta_header = parsed.meta_header.unwrap();
    assert_eq!(meta_header.meta_codec_id, blpkc::Algorithm::Zlib.id());
    assert_eq!(meta_header.meta_checksum, Checksum::Adler32);
    assert!(meta_header.meta_comp_size <= meta_header.max_meta_size);

    let mut out = Vec::new();
    let decoded_meta = decompress_stream(
        Cursor::new(&bytes[..]),
        &mut out,
        &DecompressOptions::default(),
    )
    .unwrap();
    assert_eq!(decoded_meta, Some(metadata));
    assert_eq!(out, input);
}

#[test]
fn append_extends_a_finalized_file_in_place() {
    let original = linspace_like(20_000);
    let config = CompressConfig {
        chunk_size: 8192,
        ..Default::default()
    };

    let mut file = tempfile().unwrap();
    compress_stream(Cursor::new(&original[..]), &mut file, &config).unwrap();
    file.seek(SeekFrom::Start(0)).unwrap();
    let before = info(&mut file).unwrap();
    let old_nchunks = before.header.nchunks;
    let max_app_chunks = before.header.max_app_chunks;
    assert_eq!(max_app_chunks, 10 * old_nchunks);

    file.seek(SeekFrom::Start(0)).unwrap();
    let stats =
        append_stream(&mut file, Cursor::new(&original[..]), &AppendConfig::default()).unwrap();
    assert_eq!(stats.nchunks, old_nchunks * 2);

    file.seek(SeekFrom::Start(0)).unwrap();
    let after = info(&mut file).unwrap();
    assert_eq!(after.header.max_app_chunks, max_app_chunks);
    assert_eq!(after.header.nchunks, old_nchunks * 2);

    file.seek(SeekFrom::Start(0)).unwrap();
    let mut out = Vec::new();
    decompress_stream(&mut file, &mut out, &DecompressOptions::default()).unwrap();

    let mut expected = original.clone();
    expected.extend_from_slice(&original);
    assert_eq!(out, expected);
}

#[test]
fn decompressing_a_file_with_bad_magic_fails_before_any_output() {
    let mut bytes = vec![0u8; 32];
    bytes[0..4].copy_from_slice(b"\x00\x00\x00\x00");
    let mut out = Vec::new();
    let err = decompress_stream(
        Cursor::new(&bytes[..]),
        &mut out,
        &DecompressOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::BadMagic));
    assert!(out.is_empty());
}

#[test]
fn configuration_bounds_are_validated_before_any_io() {
    let bad_chunk_size = CompressConfig {
        chunk_size: 0,
        ..Default::default()
    };
    assert!(matches!(
        bad_chunk_size.validate(),
        Err(Error::ChunkSizeOutOfRange)
    ));

    let bad_nthreads = CompressConfig {
        nthreads: 257,
        ..Default::default()
    };
    assert!(matches!(
        bad_nthreads.validate(),
        Err(Error::NthreadsOutOfRange)
    ));

    // chunk_size == CHUNK_SIZE_MAX (0) is the "pick the largest value"
    // sentinel, not an out-of-range value, and must validate cleanly.
    let max_chunk_size = CompressConfig {
        chunk_size: blpkc::CHUNK_SIZE_MAX,
        ..Default::default()
    };
    assert!(max_chunk_size.validate().is_ok());
}

#[test]
fn append_beyond_reserved_capacity_is_rejected() {
    let original = linspace_like(1_000);
    let config = CompressConfig {
        chunk_size: 2048,
        ..Default::default()
    };
    let mut file = tempfile().unwrap();
    compress_stream(Cursor::new(&original[..]), &mut file, &config).unwrap();

    // max_app_chunks = 10 * nchunks = 10 for a single-chunk file; appending
    // enough data for 11 new chunks must overflow the reserved capacity.
    let overflow = vec![7u8; 2048 * 11];
    file.seek(SeekFrom::Start(0)).unwrap();
    let err = append_stream(&mut file, Cursor::new(&overflow[..]), &AppendConfig::default())
        .unwrap_err();
    assert!(matches!(err, Error::AppendCapacityExceeded { .. }));
}

#[test]
fn writer_output_is_byte_identical_across_runs() {
    let input = linspace_like(10_000);
    let config = CompressConfig {
        chunk_size: 4096,
        shuffle: true,
        typesize: 8,
        codec: blpkc::Algorithm::Zlib,
        ..Default::default()
    };

    let mut a = Cursor::new(Vec::new());
    compress_stream(Cursor::new(&input[..]), &mut a, &config).unwrap();
    let mut b = Cursor::new(Vec::new());
    compress_stream(Cursor::new(&input[..]), &mut b, &config).unwrap();
    assert_eq!(a.into_inner(), b.into_inner());
}

#[test]
fn random_access_recovers_each_chunk_independently() {
    let input = linspace_like(30_000);
    let config = CompressConfig {
        chunk_size: 16384,
        ..Default::default()
    };
    let mut sink = Cursor::new(Vec::new());
    compress_stream(Cursor::new(&input[..]), &mut sink, &config).unwrap();
    let bytes = sink.into_inner();
    let parsed = info(Cursor::new(&bytes[..])).unwrap();

    let nchunks = parsed.header.nchunks as usize;
    let chunk_size = parsed.header.chunk_size as usize;
    for i in 0..nchunks {
        let mut cursor = Cursor::new(&bytes[..]);
        let chunk = read_chunk(&mut cursor, &parsed, i, 1).unwrap();
        let start = i * chunk_size;
        let expected_len = if i + 1 == nchunks {
            parsed.header.last_chunk as usize
        } else {
            chunk_size
        };
        assert_eq!(chunk, &input[start..start + expected_len]);
    }
}

#[test]
fn info_does_not_consume_more_than_the_headers_and_offsets() {
    let input = linspace_like(4_000);
    let config = CompressConfig {
        chunk_size: 4096,
        ..Default::default()
    };
    let mut sink = Cursor::new(Vec::new());
    compress_stream(Cursor::new(&input[..]), &mut sink, &config).unwrap();
    let bytes = sink.into_inner();

    let mut cursor = Cursor::new(&bytes[..]);
    info(&mut cursor).unwrap();
    let consumed = cursor.stream_position().unwrap() as usize;
    // info() parses headers and offsets only; it must stop before chunk bytes.
    assert!(consumed < bytes.len());

    let mut reread = Cursor::new(&bytes[consumed..]);
    let mut scratch = [0u8; 1];
    assert!(reread.read(&mut scratch).is_ok());
}
