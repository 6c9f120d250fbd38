//! Chunk reader and logical-file reassembler.
//!
//! The archive is a flat run of framed chunks:
//!
//! ```text
//! [magic:4][compressed_size:u32 LE][compressed payload ...]
//! ```
//!
//! `CBXS` chunks are decompressed and appended to the file being assembled;
//! a `CEND` chunk contributes its own payload and then completes the file.
//! Framing stops at the end of the source or at the first header whose magic
//! is neither sentinel; whatever follows is ignored.

use std::sync::Arc;

use crate::error::{ExtractError, Result};
use crate::io::ReadAt;
use crate::refpack;
use crate::report::{Event, Reporter};

use super::structures::ChunkHeader;

/// One fully reassembled archive member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalFile {
    /// Position of the file in the archive, counting from zero.
    pub index: usize,
    /// Stream offset of the file's first chunk header.
    pub offset: u64,
    /// Number of chunks the file was assembled from.
    pub chunks: usize,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitingHeader,
    /// Skipping the remaining chunks of a file that failed to decode.
    Resync,
    StreamEnded,
}

/// Sequential reader yielding one [`LogicalFile`] per end marker.
///
/// ## Example
///
/// ```ignore
/// let mut reader = StreamReader::new(source, reporter);
/// while let Some(file) = reader.next_file().await? {
///     println!("file {}: {} bytes", file.index, file.data.len());
/// }
/// ```
pub struct StreamReader<R: ReadAt> {
    reader: Arc<R>,
    reporter: Arc<dyn Reporter>,
    size: u64,
    /// Offset of the next chunk header
    offset: u64,
    state: State,
    /// Index the next completed (or abandoned) file will get
    next_index: usize,
    emitted: usize,
    pending: Vec<u8>,
    pending_offset: u64,
    pending_chunks: usize,
}

impl<R: ReadAt> StreamReader<R> {
    pub fn new(reader: Arc<R>, reporter: Arc<dyn Reporter>) -> Self {
        let size = reader.size();
        Self {
            reader,
            reporter,
            size,
            offset: 0,
            state: State::AwaitingHeader,
            next_index: 0,
            emitted: 0,
            pending: Vec::new(),
            pending_offset: 0,
            pending_chunks: 0,
        }
    }

    /// Number of logical files returned so far.
    pub fn files_emitted(&self) -> usize {
        self.emitted
    }

    /// Stream offset of the next chunk header.
    pub fn position(&self) -> u64 {
        self.offset
    }

    /// Read chunks until the next end marker and return the assembled file.
    ///
    /// Returns `Ok(None)` once framing ends. After a decompression error or
    /// a failed source read the partially assembled file is dropped; calling
    /// again skips the rest of that file and continues with the next one. A
    /// truncated payload ends the stream.
    pub async fn next_file(&mut self) -> Result<Option<LogicalFile>> {
        loop {
            if self.state == State::StreamEnded {
                return Ok(None);
            }

            let header_offset = self.offset;
            let Some(header) = self.read_header().await? else {
                self.end_stream();
                return Ok(None);
            };

            let payload_offset = header_offset + ChunkHeader::SIZE as u64;
            let available = self.size - payload_offset;
            if header.compressed_size as u64 > available {
                self.end_stream();
                return Err(ExtractError::TruncatedChunkPayload {
                    offset: header_offset,
                    declared: header.compressed_size,
                    available,
                });
            }
            self.offset = payload_offset + header.compressed_size as u64;

            if self.state == State::Resync {
                if header.is_end() {
                    self.next_index += 1;
                    self.state = State::AwaitingHeader;
                }
                continue;
            }

            let decoded = self.decode_chunk(header, header_offset).await?;

            if self.pending_chunks == 0 {
                self.pending_offset = header_offset;
            }
            self.pending.extend_from_slice(&decoded);
            self.pending_chunks += 1;

            if header.is_end() {
                return Ok(Some(self.flush()));
            }
        }
    }

    async fn read_header(&mut self) -> Result<Option<ChunkHeader>> {
        let remaining = self.size.saturating_sub(self.offset);
        if remaining == 0 {
            return Ok(None);
        }

        let len = remaining.min(ChunkHeader::SIZE as u64) as usize;
        let mut buf = [0u8; ChunkHeader::SIZE];
        if let Err(e) = self.reader.read_exact_at(self.offset, &mut buf[..len]).await {
            // The offset is unchanged, but the chunks read so far can no
            // longer be completed.
            if self.pending_chunks > 0 {
                self.abandon_file(false);
            }
            return Err(e
                .context(format!("reading chunk header at offset {:#x}", self.offset))
                .into());
        }

        match ChunkHeader::from_bytes(&buf[..len]) {
            Ok(header) => Ok(Some(header)),
            Err(ExtractError::UnrecognizedFraming { magic }) => {
                self.reporter.report(&Event::TrailingData {
                    offset: self.offset,
                    magic,
                    remaining,
                });
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn decode_chunk(&mut self, header: ChunkHeader, header_offset: u64) -> Result<Vec<u8>> {
        let size = header.compressed_size as usize;
        if size == 0 {
            return Ok(Vec::new());
        }

        let mut compressed = vec![0u8; size];
        let payload_offset = header_offset + ChunkHeader::SIZE as u64;
        if let Err(e) = self.reader.read_exact_at(payload_offset, &mut compressed).await {
            self.abandon_file(header.is_end());
            return Err(e
                .context(format!("reading chunk payload at offset {:#x}", payload_offset))
                .into());
        }

        match refpack::decompress(&compressed) {
            Ok(decoded) => {
                self.reporter.report(&Event::ChunkDecoded {
                    file: self.next_index,
                    offset: header_offset,
                    kind: header.kind,
                    compressed_size: header.compressed_size,
                    decompressed_size: decoded.len(),
                });
                Ok(decoded)
            }
            Err(source) => {
                let file = self.next_index;
                self.abandon_file(header.is_end());
                Err(ExtractError::Codec {
                    file,
                    offset: header_offset,
                    source,
                })
            }
        }
    }

    fn flush(&mut self) -> LogicalFile {
        let file = LogicalFile {
            index: self.next_index,
            offset: self.pending_offset,
            chunks: self.pending_chunks,
            data: std::mem::take(&mut self.pending),
        };
        self.pending_chunks = 0;
        self.next_index += 1;
        self.emitted += 1;

        self.reporter.report(&Event::FileAssembled {
            file: file.index,
            chunks: file.chunks,
            size: file.data.len(),
        });
        file
    }

    /// Drop the file being assembled after a failed chunk. If the failed
    /// chunk was not its end marker, the rest of the file is skipped.
    fn abandon_file(&mut self, at_end_marker: bool) {
        self.discard_pending();
        if at_end_marker {
            self.next_index += 1;
        } else {
            self.state = State::Resync;
        }
    }

    fn discard_pending(&mut self) {
        self.pending.clear();
        self.pending_chunks = 0;
    }

    fn end_stream(&mut self) {
        if self.pending_chunks > 0 {
            self.reporter.report(&Event::FileSkipped {
                file: self.next_index,
                reason: format!(
                    "stream ended after {} chunk(s) without an end marker",
                    self.pending_chunks
                ),
            });
        }
        self.discard_pending();
        self.state = State::StreamEnded;
    }
}
