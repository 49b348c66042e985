//! Core library for the `blpk` chunked, checksummed, appendable container
//! format: a bloscpack-style layout of independently compressed chunks with
//! random-access offsets, integrity checksums and optional JSON metadata.

pub mod append;
pub mod checksum;
pub mod chunk;
pub mod codec;
pub mod error;
pub mod header;
pub mod metadata;
pub mod offsets;
pub mod reader;
pub mod writer;

pub use append::{append_stream, AppendConfig};
pub use checksum::Checksum;
pub use codec::Algorithm;
pub use error::{Error, Result};
pub use header::{Header, MetaHeader};
pub use offsets::OffsetsTable;
pub use reader::{decompress_stream, info, read_chunk, DecompressOptions, Info};
pub use writer::{compress_stream, CompressConfig, Stats, CHUNK_SIZE_MAX};
