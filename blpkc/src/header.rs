//! Container header structures.
//!
//! | Offset | Size | Field          |
//! |--------|------|----------------|
//! |      0 |    4 | magic (`blpk`) |
//! |      4 |    1 | format_version |
//! |      5 |    1 | options        |
//! |      6 |    1 | checksum_id    |
//! |      7 |    1 | typesize       |
//! |      8 |    4 | chunk_size     |
//! |     12 |    4 | last_chunk     |
//! |     16 |    8 | nchunks        |
//! |     24 |    8 | max_app_chunks |

use crate::checksum::Checksum;
use crate::error::{Error, Result};

/// Container magic, first four bytes of every bloscpack-style file.
pub const MAGIC: &[u8; 4] = b"blpk";

/// The only format version this crate knows how to read or write.
pub const FORMAT_VERSION: u8 = 3;

/// Size in bytes of the fixed bloscpack header.
pub const HEADER_SIZE: usize = 32;

/// Size in bytes of the fixed metadata header.
pub const META_HEADER_SIZE: usize = 32;

/// `chunk_size` value meaning "variable / not applicable".
pub const CHUNK_SIZE_SENTINEL: u32 = 0xFFFF_FFFF;

/// Minimal bitflags shim for the header's two named bits.
macro_rules! bitflags_lite {
    (
        $(#[$meta:meta])*
        pub struct $name:ident: $ty:ty {
            $(const $flag:ident = $value:expr;)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub struct $name(pub $ty);

        impl $name {
            $(pub const $flag: $name = $name($value);)*

            pub fn contains(self, other: $name) -> bool {
                self.0 & other.0 == other.0
            }

            pub fn insert(&mut self, other: $name) {
                self.0 |= other.0;
            }

            pub fn bits(self) -> $ty {
                self.0
            }

            pub fn from_bits(bits: $ty) -> Self {
                $name(bits)
            }
        }

        impl std::ops::BitOr for $name {
            type Output = $name;
            fn bitor(self, rhs: $name) -> $name {
                $name(self.0 | rhs.0)
            }
        }
    };
}

bitflags_lite! {
    /// Bits of the header's `options` byte.
    pub struct Options: u8 {
        const OFFSETS = 0b0000_0001;
        const METADATA = 0b0000_0010;
    }
}

/// The 32-byte bloscpack-style header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub format_version: u8,
    pub options: Options,
    pub checksum: Checksum,
    pub typesize: u8,
    pub chunk_size: u32,
    pub last_chunk: u32,
    pub nchunks: i64,
    pub max_app_chunks: i64,
}

impl Header {
    pub fn has_offsets(&self) -> bool {
        self.options.contains(Options::OFFSETS)
    }

    pub fn has_metadata(&self) -> bool {
        self.options.contains(Options::METADATA)
    }

    /// Encode to exactly [`HEADER_SIZE`] bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(MAGIC);
        buf[4] = self.format_version;
        buf[5] = self.options.bits();
        buf[6] = self.checksum.id();
        buf[7] = self.typesize;
        buf[8..12].copy_from_slice(&self.chunk_size.to_le_bytes());
        buf[12..16].copy_from_slice(&self.last_chunk.to_le_bytes());
        buf[16..24].copy_from_slice(&self.nchunks.to_le_bytes());
        buf[24..32].copy_from_slice(&self.max_app_chunks.to_le_bytes());
        buf
    }

    /// Decode from exactly [`HEADER_SIZE`] bytes.
    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(Error::TruncatedFile);
        }
        if &buf[0..4] != MAGIC {
            return Err(Error::BadMagic);
        }
        let format_version = buf[4];
        if format_version != FORMAT_VERSION {
            return Err(Error::UnsupportedVersion(format_version));
        }
        let options = Options::from_bits(buf[5]);
        let checksum_id = buf[6];
        let checksum = Checksum::from_id(checksum_id)
            .ok_or(Error::MalformedHeader("unknown checksum_id in header"))?;
        let typesize = buf[7];
        let chunk_size = u32::from_le_bytes(buf[8..12].try_into().unwrap());
        let last_chunk = u32::from_le_bytes(buf[12..16].try_into().unwrap());
        let nchunks = i64::from_le_bytes(buf[16..24].try_into().unwrap());
        let max_app_chunks = i64::from_le_bytes(buf[24..32].try_into().unwrap());

        if nchunks < 0 {
            return Err(Error::MalformedHeader("nchunks is unknown in a finalized file"));
        }
        if !options.contains(Options::OFFSETS) && max_app_chunks != 0 {
            return Err(Error::MalformedHeader(
                "max_app_chunks must be zero when offsets are disabled",
            ));
        }
        if chunk_size != CHUNK_SIZE_SENTINEL && last_chunk > chunk_size {
            return Err(Error::MalformedHeader("last_chunk exceeds chunk_size"));
        }

        Ok(Header {
            format_version,
            options,
            checksum,
            typesize,
            chunk_size,
            last_chunk,
            nchunks,
            max_app_chunks,
        })
    }
}

/// The 32-byte metadata header, present only when the metadata option bit is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaHeader {
    pub magic_format: [u8; 8],
    pub meta_checksum: Checksum,
    pub meta_codec_id: u8,
    pub meta_level: u8,
    pub meta_size: u32,
    pub meta_comp_size: u32,
    pub max_meta_size: u32,
    pub user_codec: [u8; 8],
}

/// Built-in metadata format tag, left-padded with NUL to fill the field.
pub const META_FORMAT_JSON: &[u8; 8] = b"JSON\0\0\0\0";

impl MetaHeader {
    pub fn to_bytes(&self) -> [u8; META_HEADER_SIZE] {
        let mut buf = [0u8; META_HEADER_SIZE];
        buf[0..8].copy_from_slice(&self.magic_format);
        buf[8] = 0; // meta_options, reserved
        buf[9] = self.meta_checksum.id();
        buf[10] = self.meta_codec_id;
        buf[11] = self.meta_level;
        buf[12..16].copy_from_slice(&self.meta_size.to_le_bytes());
        buf[16..20].copy_from_slice(&self.meta_comp_size.to_le_bytes());
        buf[20..24].copy_from_slice(&self.max_meta_size.to_le_bytes());
        buf[24..32].copy_from_slice(&self.user_codec);
        buf
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        if buf.len() < META_HEADER_SIZE {
            return Err(Error::TruncatedFile);
        }
        let mut magic_format = [0u8; 8];
        magic_format.copy_from_slice(&buf[0..8]);
        let meta_checksum = Checksum::from_id(buf[9])
            .ok_or(Error::MalformedHeader("unknown meta_checksum_id"))?;
        let meta_codec_id = buf[10];
        let meta_level = buf[11];
        let meta_size = u32::from_le_bytes(buf[12..16].try_into().unwrap());
        let meta_comp_size = u32::from_le_bytes(buf[16..20].try_into().unwrap());
        let max_meta_size = u32::from_le_bytes(buf[20..24].try_into().unwrap());
        let mut user_codec = [0u8; 8];
        user_codec.copy_from_slice(&buf[24..32]);

        if meta_comp_size > max_meta_size {
            return Err(Error::MalformedHeader("meta_comp_size exceeds max_meta_size"));
        }

        Ok(MetaHeader {
            magic_format,
            meta_checksum,
            meta_codec_id,
            meta_level,
            meta_size,
            meta_comp_size,
            max_meta_size,
            user_codec,
        })
    }
}
