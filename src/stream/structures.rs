use byteorder::{ByteOrder, LittleEndian};

use crate::error::{ExtractError, Result};

/// Kind of a framed chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    /// `CBXS`: a chunk in the middle of a logical file.
    Chunk,
    /// `CEND`: the last chunk of a logical file.
    End,
}

impl ChunkKind {
    pub const CHUNK_MAGIC: &'static [u8; 4] = b"CBXS";
    pub const END_MAGIC: &'static [u8; 4] = b"CEND";

    pub fn from_magic(magic: [u8; 4]) -> Option<Self> {
        match &magic {
            Self::CHUNK_MAGIC => Some(ChunkKind::Chunk),
            Self::END_MAGIC => Some(ChunkKind::End),
            _ => None,
        }
    }

    pub fn magic(&self) -> &'static [u8; 4] {
        match self {
            ChunkKind::Chunk => Self::CHUNK_MAGIC,
            ChunkKind::End => Self::END_MAGIC,
        }
    }
}

/// Chunk framing header - 8 bytes
///
/// 4-byte magic followed by the little-endian compressed payload size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub kind: ChunkKind,
    pub compressed_size: u32,
}

impl ChunkHeader {
    pub const SIZE: usize = 8;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut magic = [0u8; 4];
        let n = data.len().min(4);
        magic[..n].copy_from_slice(&data[..n]);

        let kind = ChunkKind::from_magic(magic);
        match kind {
            Some(kind) if data.len() >= Self::SIZE => Ok(Self {
                kind,
                compressed_size: LittleEndian::read_u32(&data[4..8]),
            }),
            _ => Err(ExtractError::UnrecognizedFraming { magic }),
        }
    }

    pub fn is_end(&self) -> bool {
        self.kind == ChunkKind::End
    }
}

/// Type tag of an interleaved sub-resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    WorldMdr,
    /// Regular shapes.
    Shape,
    /// Shapes holding lightmaps.
    Lightmap,
    /// Audio bank shipped inside world data.
    AudioBank,
    /// Terminates the record list.
    End,
    Other(u8),
}

impl ResourceType {
    pub fn from_u8(value: u8) -> Self {
        match value {
            2 => ResourceType::WorldMdr,
            9 => ResourceType::Shape,
            10 => ResourceType::Lightmap,
            20 => ResourceType::AudioBank,
            22 => ResourceType::End,
            _ => ResourceType::Other(value),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            ResourceType::WorldMdr => 2,
            ResourceType::Shape => 9,
            ResourceType::Lightmap => 10,
            ResourceType::AudioBank => 20,
            ResourceType::End => 22,
            ResourceType::Other(v) => *v,
        }
    }
}

/// How a record's declared size is measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecordSizeMode {
    /// The size counts payload bytes only.
    #[default]
    Payload,
    /// The size counts the whole record, 8-byte header included.
    Record,
}

/// Interleaved record header - 8 bytes
///
/// 1-byte type tag, 24-bit little-endian size, 32-bit little-endian
/// resource id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub resource_type: ResourceType,
    pub declared_size: u32,
    pub resource_id: u32,
}

impl RecordHeader {
    pub const SIZE: usize = 8;

    /// Parse a header from the first [`Self::SIZE`] bytes of `data`.
    ///
    /// Returns `None` if fewer bytes are available.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < Self::SIZE {
            return None;
        }

        Some(Self {
            resource_type: ResourceType::from_u8(data[0]),
            declared_size: LittleEndian::read_u24(&data[1..4]),
            resource_id: LittleEndian::read_u32(&data[4..8]),
        })
    }

    /// Number of payload bytes following the header, or `None` when a
    /// whole-record size is smaller than the header itself.
    pub fn payload_len(&self, mode: RecordSizeMode) -> Option<usize> {
        let declared = self.declared_size as usize;
        match mode {
            RecordSizeMode::Payload => Some(declared),
            RecordSizeMode::Record => declared.checked_sub(Self::SIZE),
        }
    }
}
