use crate::err::{DeserializationError, DeserializationResult};
use crate::manifest_parser::ReadSeek;
use crate::utils::ReadExt;

use log::trace;

/// Size of the fixed `type, header_size, chunk_size` prefix shared by every chunk.
pub const CHUNK_HEADER_SIZE: u16 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkType {
    Null,
    StringPool,
    Table,
    Xml,
    XmlStartNamespace,
    XmlEndNamespace,
    XmlStartElement,
    XmlEndElement,
    XmlCdata,
    XmlResourceMap,
    TablePackage,
    TableType,
    TableTypeSpec,
    Unknown(u16),
}

impl ChunkType {
    pub fn from_u16(value: u16) -> ChunkType {
        match value {
            0x0000 => ChunkType::Null,
            0x0001 => ChunkType::StringPool,
            0x0002 => ChunkType::Table,
            0x0003 => ChunkType::Xml,
            0x0100 => ChunkType::XmlStartNamespace,
            0x0101 => ChunkType::XmlEndNamespace,
            0x0102 => ChunkType::XmlStartElement,
            0x0103 => ChunkType::XmlEndElement,
            0x0104 => ChunkType::XmlCdata,
            0x0180 => ChunkType::XmlResourceMap,
            0x0200 => ChunkType::TablePackage,
            0x0201 => ChunkType::TableType,
            0x0202 => ChunkType::TableTypeSpec,
            other => ChunkType::Unknown(other),
        }
    }

    pub fn as_u16(self) -> u16 {
        match self {
            ChunkType::Null => 0x0000,
            ChunkType::StringPool => 0x0001,
            ChunkType::Table => 0x0002,
            ChunkType::Xml => 0x0003,
            ChunkType::XmlStartNamespace => 0x0100,
            ChunkType::XmlEndNamespace => 0x0101,
            ChunkType::XmlStartElement => 0x0102,
            ChunkType::XmlEndElement => 0x0103,
            ChunkType::XmlCdata => 0x0104,
            ChunkType::XmlResourceMap => 0x0180,
            ChunkType::TablePackage => 0x0200,
            ChunkType::TableType => 0x0201,
            ChunkType::TableTypeSpec => 0x0202,
            ChunkType::Unknown(other) => other,
        }
    }
}

/// The 8 byte header every chunk in the document starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub chunk_type: ChunkType,
    pub header_size: u16,
    /// Total size of the chunk, including this header and everything nested in it.
    pub chunk_size: u32,
    /// Stream position of the first byte of the header.
    pub offset: u64,
}

impl ChunkHeader {
    pub fn from_stream<T: ReadSeek>(stream: &mut T) -> DeserializationResult<ChunkHeader> {
        let offset = stream.tell()?;

        let chunk_type = ChunkType::from_u16(stream.try_u16_named("chunk type")?);
        let header_size = stream.try_u16_named("chunk header size")?;
        let chunk_size = stream.try_u32_named("chunk size")?;

        if header_size < CHUNK_HEADER_SIZE || chunk_size < u32::from(header_size) {
            return Err(DeserializationError::MalformedChunk {
                offset,
                header_size,
                chunk_size,
            });
        }

        trace!(
            "Offset {}: {:?} chunk (header size {}, chunk size {})",
            offset, chunk_type, header_size, chunk_size
        );

        Ok(ChunkHeader {
            chunk_type,
            header_size,
            chunk_size,
            offset,
        })
    }

    /// Reads the root header, which must be an XML document chunk.
    pub fn root_from_stream<T: ReadSeek>(stream: &mut T) -> DeserializationResult<ChunkHeader> {
        let header = ChunkHeader::from_stream(stream)?;

        if header.chunk_type != ChunkType::Xml {
            return Err(DeserializationError::UnsupportedRootType {
                found: header.chunk_type.as_u16(),
            });
        }

        Ok(header)
    }

    /// Stream position one past the last byte of this chunk.
    pub fn end_offset(&self) -> u64 {
        self.offset + u64::from(self.chunk_size)
    }

    /// Seeks past this chunk (and any chunks nested inside of it).
    pub fn skip_to_end<T: ReadSeek>(&self, stream: &mut T) -> DeserializationResult<()> {
        stream.try_seek_abs_named(self.end_offset(), "chunk end")?;
        Ok(())
    }
}
