/// Errors produced by the reader, writer and append pipelines.
pub enum Error {
    BadMagic,
    UnsupportedVersion(u8),
    MalformedHeader(&'static str),
    TruncatedChunk,
    TruncatedFile,

    ChunkChecksumMismatch(usize),
    MetaChecksumMismatch,

    UnknownCodec(String),
    UnknownChecksum(String),
    ChunkSizeOutOfRange,
    TypesizeInvalid,
    NthreadsOutOfRange,

    AppendCapacityExceeded { old_nchunks: i64, max_app_chunks: i64 },
    MetaTooLarge { needed: u32, max: u32 },
    OffsetsDisabled,

    Decode(String),

    IO(std::io::Error),
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::IO(e)
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::BadMagic => write!(f, "BadMagic"),
            Error::UnsupportedVersion(v) => write!(f, "UnsupportedVersion({})", v),
            Error::MalformedHeader(reason) => write!(f, "MalformedHeader({})", reason),
            Error::TruncatedChunk => write!(f, "TruncatedChunk"),
            Error::TruncatedFile => write!(f, "TruncatedFile"),
            Error::ChunkChecksumMismatch(i) => write!(f, "ChunkChecksumMismatch({})", i),
            Error::MetaChecksumMismatch => write!(f, "MetaChecksumMismatch"),
            Error::UnknownCodec(name) => write!(f, "UnknownCodec({:?})", name),
            Error::UnknownChecksum(name) => write!(f, "UnknownChecksum({:?})", name),
            Error::ChunkSizeOutOfRange => write!(f, "ChunkSizeOutOfRange"),
            Error::TypesizeInvalid => write!(f, "TypesizeInvalid"),
            Error::NthreadsOutOfRange => write!(f, "NthreadsOutOfRange"),
            Error::AppendCapacityExceeded {
                old_nchunks,
                max_app_chunks,
            } => write!(
                f,
                "AppendCapacityExceeded {{ old_nchunks: {}, max_app_chunks: {} }}",
                old_nchunks, max_app_chunks
            ),
            Error::MetaTooLarge { needed, max } => {
                write!(f, "MetaTooLarge {{ needed: {}, max: {} }}", needed, max)
            }
            Error::OffsetsDisabled => write!(f, "OffsetsDisabled"),
            Error::Decode(msg) => write!(f, "Decode({:?})", msg),
            Error::IO(e) => write!(f, "IO({:?})", e),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::BadMagic => write!(f, "not a blpk container (bad magic)"),
            Error::UnsupportedVersion(v) => write!(f, "unsupported format version {}", v),
            Error::MalformedHeader(reason) => write!(f, "malformed header: {}", reason),
            Error::TruncatedChunk => write!(f, "truncated chunk record"),
            Error::TruncatedFile => write!(f, "truncated file"),
            Error::ChunkChecksumMismatch(i) => write!(f, "checksum mismatch at chunk {}", i),
            Error::MetaChecksumMismatch => write!(f, "metadata checksum mismatch"),
            Error::UnknownCodec(name) => write!(f, "unknown codec: {}", name),
            Error::UnknownChecksum(name) => write!(f, "unknown checksum: {}", name),
            Error::ChunkSizeOutOfRange => write!(f, "chunk size out of range"),
            Error::TypesizeInvalid => write!(f, "typesize must be in 1..=255"),
            Error::NthreadsOutOfRange => write!(f, "nthreads must be in 1..=256"),
            Error::AppendCapacityExceeded {
                old_nchunks,
                max_app_chunks,
            } => write!(
                f,
                "append would exceed reserved capacity ({} existing chunks, {} reserved slots)",
                old_nchunks, max_app_chunks
            ),
            Error::MetaTooLarge { needed, max } => write!(
                f,
                "new metadata needs {} bytes but only {} are reserved",
                needed, max
            ),
            Error::OffsetsDisabled => write!(f, "random access requires an offsets table"),
            Error::Decode(msg) => write!(f, "decode error: {}", msg),
            Error::IO(e) => write!(f, "i/o error: {}", e),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
