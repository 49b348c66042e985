//! Offsets table: `nchunks + max_app_chunks` signed 64-bit little-endian
//! byte offsets, one per chunk record slot. Unused trailing slots (reserved
//! for future appends) hold `-1`.

use crate::error::{Error, Result};

pub const UNUSED: i64 = -1;

/// In-memory view of the offsets table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetsTable {
    entries: Vec<i64>,
}

impl OffsetsTable {
    /// A table for `used` chunks and `reserved` unused append slots, all
    /// entries initialized to [`UNUSED`].
    pub fn new(used: usize, reserved: usize) -> Self {
        OffsetsTable {
            entries: vec![UNUSED; used + reserved],
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<i64> {
        self.entries.get(index).copied()
    }

    pub fn set(&mut self, index: usize, offset: u64) {
        self.entries[index] = offset as i64;
    }

    pub fn push(&mut self, offset: u64) {
        self.entries.push(offset as i64);
    }

    /// Number of entries holding a real offset rather than [`UNUSED`].
    pub fn used_len(&self) -> usize {
        self.entries.iter().filter(|e| **e != UNUSED).count()
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.entries.len() * 8);
        for e in &self.entries {
            buf.extend_from_slice(&e.to_le_bytes());
        }
        buf
    }

    pub fn parse(buf: &[u8], count: usize) -> Result<Self> {
        if buf.len() < count * 8 {
            return Err(Error::TruncatedFile);
        }
        let mut entries = Vec::with_capacity(count);
        for i in 0..count {
            let off = i * 8;
            entries.push(i64::from_le_bytes(buf[off..off + 8].try_into().unwrap()));
        }
        Ok(OffsetsTable { entries })
    }

    pub fn byte_len(count: usize) -> usize {
        count * 8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_table_is_all_unused() {
        let t = OffsetsTable::new(2, 3);
        assert_eq!(t.len(), 5);
        assert_eq!(t.used_len(), 0);
        for i in 0..5 {
            assert_eq!(t.get(i), Some(UNUSED));
        }
    }

    #[test]
    fn set_and_round_trip() {
        let mut t = OffsetsTable::new(2, 2);
        t.set(0, 32);
        t.set(1, 128);
        assert_eq!(t.used_len(), 2);
        let bytes = t.serialize();
        assert_eq!(bytes.len(), OffsetsTable::byte_len(4));
        let parsed = OffsetsTable::parse(&bytes, 4).unwrap();
        assert_eq!(parsed, t);
        assert_eq!(parsed.get(2), Some(UNUSED));
        assert_eq!(parsed.get(3), Some(UNUSED));
    }

    #[test]
    fn push_grows_table() {
        let mut t = OffsetsTable::new(0, 0);
        t.push(10);
        t.push(20);
        assert_eq!(t.len(), 2);
        assert_eq!(t.get(0), Some(10));
        assert_eq!(t.get(1), Some(20));
    }

    #[test]
    fn parse_rejects_truncated_buffer() {
        let buf = vec![0u8; 7];
        assert!(matches!(
            OffsetsTable::parse(&buf, 1),
            Err(Error::TruncatedFile)
        ));
    }
}
