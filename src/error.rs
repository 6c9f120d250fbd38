//! Error types for the extraction pipeline.

use thiserror::Error;

use crate::refpack::CodecError;

/// Errors surfaced by the chunk reader, the demuxer and the extractor.
///
/// Every variant that comes from archive data carries the byte offset where
/// the problem was found: stream offsets for the reader, offsets inside the
/// reassembled file for the demuxer. Errors confined to one logical file
/// also carry its index.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// A chunk failed to decompress.
    #[error("failed to decompress chunk at stream offset {offset:#x} (file {file})")]
    Codec {
        file: usize,
        offset: u64,
        #[source]
        source: CodecError,
    },

    /// A chunk header declares more payload than the source holds.
    #[error(
        "truncated chunk payload at stream offset {offset:#x}: header declares {declared} bytes, {available} available"
    )]
    TruncatedChunkPayload {
        offset: u64,
        declared: u32,
        available: u64,
    },

    /// A sub-resource record declares more bytes than its file holds.
    #[error(
        "truncated record at offset {offset:#x} of file {file}: record declares {declared} bytes, {available} available"
    )]
    TruncatedRecord {
        file: usize,
        offset: usize,
        declared: u32,
        available: usize,
    },

    /// A record's declared size does not even cover its own header.
    #[error(
        "record at offset {offset:#x} of file {file} declares {declared} bytes, smaller than its header"
    )]
    UndersizedRecord {
        file: usize,
        offset: usize,
        declared: u32,
    },

    /// Header magic matched neither sentinel. The reader treats this as the
    /// end of the stream and never returns it to callers.
    #[error("unrecognized chunk framing {magic:02x?}")]
    UnrecognizedFraming { magic: [u8; 4] },

    /// Reading from the source or writing output failed.
    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

impl ExtractError {
    /// Index of the logical file the error is confined to.
    ///
    /// `Some` means the reader can go on with the next file; errors without
    /// a file stop the run.
    pub fn file(&self) -> Option<usize> {
        match self {
            ExtractError::Codec { file, .. }
            | ExtractError::TruncatedRecord { file, .. }
            | ExtractError::UndersizedRecord { file, .. } => Some(*file),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;
