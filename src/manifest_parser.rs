use std::fs::{File, OpenOptions};
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use log::{debug, info, warn};

use crate::chunk_header::{ChunkHeader, ChunkType};
use crate::err::{DeserializationResult, ManifestError, Result};
use crate::resource_map::ResourceMap;
use crate::string_pool::StringPool;
use crate::xml_element::{FieldMatch, NamespaceScope, find_field_in_element};

/// Name of the attribute holding the version counter of an application manifest.
pub const VERSION_CODE: &str = "versionCode";

// Inspired by https://github.com/mitsuhiko/unbox/src/formats/cab.rs
pub trait ReadSeek: Read + Seek {
    fn tell(&mut self) -> io::Result<u64> {
        self.stream_position()
    }
}

impl<T: Read + Seek> ReadSeek for T {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserSettings {
    field_name: String,
}

impl Default for ParserSettings {
    fn default() -> Self {
        ParserSettings {
            field_name: VERSION_CODE.to_owned(),
        }
    }
}

impl ParserSettings {
    pub fn new() -> Self {
        ParserSettings::default()
    }

    /// Sets the attribute name to look for. Matching is exact and case sensitive.
    pub fn field_name(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = field_name.into();
        self
    }

    pub fn get_field_name(&self) -> &str {
        &self.field_name
    }
}

/// State accumulated while walking one document.
///
/// A fresh context is built for every scan, so one parser (or one process) can handle any
/// number of documents.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanContext {
    pub string_pool: StringPool,
    pub resource_map: Option<ResourceMap>,
    pub namespace: Option<NamespaceScope>,
    /// Number of element-start chunks seen before the current one.
    pub element_index: usize,
}

/// Outcome of a full pass over a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scan {
    pub context: ScanContext,
    pub field: Option<FieldMatch>,
}

pub struct ManifestParser<T: ReadSeek> {
    data: T,
    config: ParserSettings,
}

impl ManifestParser<File> {
    /// Opens a manifest for inspection only.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|source| ManifestError::FailedToOpenFile {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(ManifestParser::from_read_seek(f))
    }

    /// Opens a manifest for reading and in-place updates.
    pub fn from_path_for_update(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let f = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| ManifestError::FailedToOpenFile {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(ManifestParser::from_read_seek(f))
    }
}

impl ManifestParser<Cursor<Vec<u8>>> {
    pub fn from_buffer(buffer: Vec<u8>) -> Self {
        ManifestParser::from_read_seek(Cursor::new(buffer))
    }
}

impl<T: ReadSeek> ManifestParser<T> {
    pub fn from_read_seek(data: T) -> Self {
        ManifestParser {
            data,
            config: ParserSettings::default(),
        }
    }

    pub fn with_configuration(mut self, configuration: ParserSettings) -> Self {
        self.config = configuration;
        self
    }

    pub fn config(&self) -> &ParserSettings {
        &self.config
    }

    /// Walks the document from its first byte and returns the target field, if present.
    pub fn find_field(&mut self) -> Result<Option<FieldMatch>> {
        Ok(self.scan()?.field)
    }

    /// Walks the document from its first byte, returning the match and everything decoded on
    /// the way to it.
    pub fn scan(&mut self) -> Result<Scan> {
        self.data.seek(SeekFrom::Start(0))?;

        let mut context = ScanContext::default();
        let field = walk(&mut self.data, &mut context, &self.config.field_name)?;

        match &field {
            Some(m) => info!(
                "Found `{}` = {} (0x{:X}) at offset {}",
                m.name, m.value, m.value, m.offset
            ),
            None => info!("`{}` was not found", self.config.field_name),
        }

        Ok(Scan { context, field })
    }

    pub fn get_ref(&self) -> &T {
        &self.data
    }

    pub(crate) fn get_mut(&mut self) -> &mut T {
        &mut self.data
    }

    pub fn into_inner(self) -> T {
        self.data
    }
}

/// Drives the chunk sequence: root, string pool, resource map, namespace start, then elements
/// until the namespace end.
///
/// Every chunk is skipped using its declared size, so children never need to be descended into.
fn walk<T: ReadSeek>(
    stream: &mut T,
    ctx: &mut ScanContext,
    field: &str,
) -> DeserializationResult<Option<FieldMatch>> {
    let root = ChunkHeader::root_from_stream(stream)?;
    debug!("Document size {}", root.chunk_size);

    let mut chunk = ChunkHeader::from_stream(stream)?;

    if chunk.chunk_type == ChunkType::StringPool {
        ctx.string_pool = StringPool::from_stream(stream, &chunk)?;
        chunk = ChunkHeader::from_stream(stream)?;
    }

    // Optional
    if chunk.chunk_type == ChunkType::XmlResourceMap {
        ctx.resource_map = Some(ResourceMap::from_stream(stream, &chunk)?);
        chunk = ChunkHeader::from_stream(stream)?;
    }

    if chunk.chunk_type == ChunkType::XmlStartNamespace {
        let scope = NamespaceScope::from_stream(stream)?;
        debug!(
            "Namespace {:?} = {:?}",
            ctx.string_pool.get(scope.prefix_index),
            ctx.string_pool.get(scope.uri_index)
        );
        ctx.namespace = Some(scope);
        ctx.element_index = 0;

        chunk.skip_to_end(stream)?;
        chunk = ChunkHeader::from_stream(stream)?;
    }

    while chunk.chunk_type != ChunkType::XmlEndNamespace {
        match chunk.chunk_type {
            ChunkType::XmlStartElement => {
                if let Some(found) = find_field_in_element(stream, ctx, field)? {
                    return Ok(Some(found));
                }
                ctx.element_index += 1;
            }
            ChunkType::XmlEndElement | ChunkType::XmlCdata => {}
            other => warn!(
                "Offset {}: unexpected {:?} chunk inside the element stream, skipping",
                chunk.offset, other
            ),
        }

        chunk.skip_to_end(stream)?;
        chunk = ChunkHeader::from_stream(stream)?;
    }

    Ok(None)
}
