//! Metadata region: an optional compressed, checksummed JSON blob with its
//! own 32-byte header and reserved slack for later in-place growth.

use crate::checksum::Checksum;
use crate::codec::{self, Algorithm};
use crate::error::{Error, Result};
use crate::header::{MetaHeader, META_FORMAT_JSON};

/// Metadata codec and checksum defaults, applied unless the caller
/// overrides them.
#[derive(Debug, Clone, Copy)]
pub struct MetaCodecParams {
    pub algorithm: Algorithm,
    pub level: i32,
    pub checksum: Checksum,
}

impl Default for MetaCodecParams {
    fn default() -> Self {
        MetaCodecParams {
            algorithm: Algorithm::Zlib,
            level: 6,
            checksum: Checksum::Adler32,
        }
    }
}

/// `max_meta_size` with 10% slack for later growth, rounded up to a
/// multiple of 8, large enough to also hold the trailing checksum digest.
fn reserved_size(meta_comp_size: u32, digest_size: usize) -> u32 {
    let slack = ((meta_comp_size as f64) * 1.1).ceil() as u32;
    let base = meta_comp_size.max(slack);
    let needed = base.max(meta_comp_size + digest_size as u32);
    needed.div_ceil(8) * 8
}

/// An encoded metadata region, ready to be written after the bloscpack
/// header: the 32-byte metadata header followed by `max_meta_size` bytes of
/// blob, checksum and zero padding.
pub struct EncodedMetadata {
    pub header: MetaHeader,
    pub region: Vec<u8>,
}

/// Encode `value` into a metadata region using `params`.
pub fn encode(value: &serde_json::Value, params: &MetaCodecParams) -> Result<EncodedMetadata> {
    let json = serde_json::to_vec(value).map_err(|e| Error::Decode(format!("metadata encode: {e}")))?;
    let compressed = codec::compress_single(&json, params.algorithm, params.level);
    let digest = params.checksum.digest(&compressed);
    let max_meta_size = reserved_size(compressed.len() as u32, digest.len());

    let header = MetaHeader {
        magic_format: *META_FORMAT_JSON,
        meta_checksum: params.checksum,
        meta_codec_id: params.algorithm.id(),
        meta_level: params.level as u8,
        meta_size: json.len() as u32,
        meta_comp_size: compressed.len() as u32,
        max_meta_size,
        user_codec: [0u8; 8],
    };

    let mut region = Vec::with_capacity(max_meta_size as usize);
    region.extend_from_slice(&compressed);
    region.extend_from_slice(&digest);
    region.resize(max_meta_size as usize, 0);

    Ok(EncodedMetadata { header, region })
}

/// Decode a metadata region back into its JSON value, given the header that
/// precedes it and the `max_meta_size` bytes that follow.
pub fn decode(header: &MetaHeader, region: &[u8]) -> Result<serde_json::Value> {
    if (region.len() as u32) < header.max_meta_size {
        return Err(Error::TruncatedFile);
    }
    let comp_size = header.meta_comp_size as usize;
    let digest_size = header.meta_checksum.digest_size();
    if region.len() < comp_size + digest_size {
        return Err(Error::MalformedHeader("metadata region too small for its own header"));
    }
    let compressed = &region[..comp_size];
    let digest = &region[comp_size..comp_size + digest_size];
    if digest_size > 0 && !header.meta_checksum.verify(compressed, digest) {
        return Err(Error::MetaChecksumMismatch);
    }

    let algorithm = Algorithm::from_id(header.meta_codec_id)
        .ok_or_else(|| Error::UnknownCodec(format!("meta_codec_id {}", header.meta_codec_id)))?;
    let json = codec::decompress_single(compressed, algorithm, header.meta_size as usize)?;
    serde_json::from_slice(&json).map_err(|e| Error::Decode(format!("metadata decode: {e}")))
}
