//! Checksum registry.
//!
//! | Offset | Size | Field        |
//! |--------|------|--------------|
//! |      - |    - | name -> (id, digest size, compute fn) |
//!
//! IDs are assigned in table order and are part of the wire format; never
//! reorder this table.

use std::fmt;

use crc32fast::Hasher as Crc32Hasher;
use md5::{Digest as _, Md5};
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512};

/// A checksum algorithm recognized by the container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checksum {
    None,
    Adler32,
    Crc32,
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

pub const TABLE: &[Checksum] = &[
    Checksum::None,
    Checksum::Adler32,
    Checksum::Crc32,
    Checksum::Md5,
    Checksum::Sha1,
    Checksum::Sha224,
    Checksum::Sha256,
    Checksum::Sha384,
    Checksum::Sha512,
];

impl Checksum {
    /// Registry id, as stored in the bloscpack header's `checksum_id` field.
    pub fn id(self) -> u8 {
        TABLE.iter().position(|c| *c == self).expect("in TABLE") as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        TABLE.get(id as usize).copied()
    }

    pub fn from_name(name: &str) -> Option<Self> {
        TABLE.iter().copied().find(|c| c.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Checksum::None => "none",
            Checksum::Adler32 => "adler32",
            Checksum::Crc32 => "crc32",
            Checksum::Md5 => "md5",
            Checksum::Sha1 => "sha1",
            Checksum::Sha224 => "sha224",
            Checksum::Sha256 => "sha256",
            Checksum::Sha384 => "sha384",
            Checksum::Sha512 => "sha512",
        }
    }

    /// Digest size in bytes, 0 for `none`.
    pub fn digest_size(self) -> usize {
        match self {
            Checksum::None => 0,
            Checksum::Adler32 => 4,
            Checksum::Crc32 => 4,
            Checksum::Md5 => 16,
            Checksum::Sha1 => 20,
            Checksum::Sha224 => 28,
            Checksum::Sha256 => 32,
            Checksum::Sha384 => 48,
            Checksum::Sha512 => 64,
        }
    }

    /// Compute the digest of `data`, as a `digest_size()`-byte vector.
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            Checksum::None => Vec::new(),
            Checksum::Adler32 => adler32::adler32(data)
                .expect("in-memory reader never fails")
                .to_be_bytes()
                .to_vec(),
            Checksum::Crc32 => {
                let mut hasher = Crc32Hasher::new();
                hasher.update(data);
                hasher.finalize().to_be_bytes().to_vec()
            }
            Checksum::Md5 => Md5::digest(data).to_vec(),
            Checksum::Sha1 => Sha1::digest(data).to_vec(),
            Checksum::Sha224 => Sha224::digest(data).to_vec(),
            Checksum::Sha256 => Sha256::digest(data).to_vec(),
            Checksum::Sha384 => Sha384::digest(data).to_vec(),
            Checksum::Sha512 => Sha512::digest(data).to_vec(),
        }
    }

    /// Verify `data` against a previously computed `digest`.
    pub fn verify(self, data: &[u8], digest: &[u8]) -> bool {
        self.digest(data) == digest
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Default for Checksum {
    fn default() -> Self {
        Checksum::Adler32
    }
}
