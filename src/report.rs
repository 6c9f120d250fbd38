//! Structured progress events and the sinks that consume them.
//!
//! The pipeline never prints. It hands [`Event`]s to an injected
//! [`Reporter`]; the binary plugs in [`LogReporter`] to route them through
//! the `log` facade, tests collect them.

use log::{debug, info, warn};
use std::fmt;
use std::path::PathBuf;

use crate::stream::{ChunkKind, ResourceType};

/// Something the pipeline did or noticed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A framed chunk was read and decompressed.
    ChunkDecoded {
        file: usize,
        offset: u64,
        kind: ChunkKind,
        compressed_size: u32,
        decompressed_size: usize,
    },
    /// An end marker completed a logical file.
    FileAssembled {
        file: usize,
        chunks: usize,
        size: usize,
    },
    /// Framing stopped before the end of the source.
    TrailingData {
        offset: u64,
        magic: [u8; 4],
        remaining: u64,
    },
    /// A reassembled logical file was written out.
    FileWritten { file: usize, path: PathBuf },
    /// One demultiplexed sub-resource was written out.
    ResourceWritten {
        file: usize,
        resource_id: u32,
        resource_type: ResourceType,
        size: usize,
        path: PathBuf,
    },
    /// A logical file was abandoned after an error.
    FileSkipped { file: usize, reason: String },
    /// The stream was fully processed.
    Finished { files: usize, resources: usize },
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::ChunkDecoded {
                file,
                offset,
                kind,
                compressed_size,
                decompressed_size,
            } => {
                let tag = match kind {
                    ChunkKind::Chunk => "chunk",
                    ChunkKind::End => "end chunk",
                };
                write!(
                    f,
                    "file {}: {} at {:#x}: {} bytes compressed, {} bytes decompressed",
                    file, tag, offset, compressed_size, decompressed_size
                )
            }
            Event::FileAssembled { file, chunks, size } => write!(
                f,
                "file {}: assembled from {} chunk(s), {} KB",
                file,
                chunks,
                size / 1000
            ),
            Event::TrailingData {
                offset,
                magic,
                remaining,
            } => write!(
                f,
                "framing ends at {:#x} (magic {:02x?}), ignoring {} trailing byte(s)",
                offset, magic, remaining
            ),
            Event::FileWritten { file, path } => {
                write!(f, "file {}: wrote \"{}\"", file, path.display())
            }
            Event::ResourceWritten {
                file,
                resource_id,
                resource_type,
                size,
                path,
            } => write!(
                f,
                "file {}: resource {} (type {}, {} bytes) -> \"{}\"",
                file,
                resource_id,
                resource_type.as_u8(),
                size,
                path.display()
            ),
            Event::FileSkipped { file, reason } => {
                write!(f, "file {}: skipped: {}", file, reason)
            }
            Event::Finished { files, resources } => write!(
                f,
                "all done: {} file(s), {} resource(s)",
                files, resources
            ),
        }
    }
}

/// Receiver for pipeline events.
pub trait Reporter: Send + Sync {
    fn report(&self, event: &Event);
}

/// Forwards events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, event: &Event) {
        match event {
            Event::ChunkDecoded { .. } | Event::ResourceWritten { .. } => debug!("{}", event),
            Event::TrailingData { .. } | Event::FileSkipped { .. } => warn!("{}", event),
            Event::FileAssembled { .. } | Event::FileWritten { .. } | Event::Finished { .. } => {
                info!("{}", event)
            }
        }
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&self, _event: &Event) {}
}
