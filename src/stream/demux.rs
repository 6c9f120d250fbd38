//! Sub-resource demultiplexer.
//!
//! A reassembled logical file packs typed resources back to back, each
//! behind an 8-byte [`RecordHeader`]. The list ends at a record tagged
//! [`ResourceType::End`] or when less than a full header is left.

use crate::error::{ExtractError, Result};

use super::structures::{RecordHeader, RecordSizeMode, ResourceType};

/// One record split out of a logical file. The payload borrows from the
/// file buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubResource<'a> {
    /// Offset of the record header inside the logical file.
    pub offset: usize,
    pub resource_type: ResourceType,
    pub resource_id: u32,
    pub payload: &'a [u8],
}

/// Lazy iterator over the records of one logical file.
///
/// Yields at most one error, after which it is exhausted.
pub struct Demuxer<'a> {
    /// Index of the logical file, for error reports.
    file: usize,
    data: &'a [u8],
    pos: usize,
    mode: RecordSizeMode,
    done: bool,
}

impl<'a> Demuxer<'a> {
    pub fn new(file: usize, data: &'a [u8], mode: RecordSizeMode) -> Self {
        Self {
            file,
            data,
            pos: 0,
            mode,
            done: false,
        }
    }

    /// Offset of the next record header.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn read_record(&mut self) -> Result<Option<SubResource<'a>>> {
        let offset = self.pos;
        let Some(header) = RecordHeader::from_bytes(&self.data[offset..]) else {
            return Ok(None);
        };
        if header.resource_type == ResourceType::End {
            return Ok(None);
        }

        let payload_len =
            header
                .payload_len(self.mode)
                .ok_or(ExtractError::UndersizedRecord {
                    file: self.file,
                    offset,
                    declared: header.declared_size,
                })?;

        let start = offset + RecordHeader::SIZE;
        let available = self.data.len() - start;
        if payload_len > available {
            return Err(ExtractError::TruncatedRecord {
                file: self.file,
                offset,
                declared: header.declared_size,
                available,
            });
        }

        self.pos = start + payload_len;
        Ok(Some(SubResource {
            offset,
            resource_type: header.resource_type,
            resource_id: header.resource_id,
            payload: &self.data[start..self.pos],
        }))
    }
}

impl<'a> Iterator for Demuxer<'a> {
    type Item = Result<SubResource<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl std::iter::FusedIterator for Demuxer<'_> {}
