use log::debug;

use crate::chunk_header::ChunkHeader;
use crate::err::DeserializationResult;
use crate::manifest_parser::ReadSeek;
use crate::utils::ReadExt;

/// Resource identifiers of attribute names, index-aligned with the string pool.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResourceMap(Vec<u32>);

impl ResourceMap {
    pub fn from_stream<T: ReadSeek>(
        stream: &mut T,
        chunk: &ChunkHeader,
    ) -> DeserializationResult<ResourceMap> {
        let count = (chunk.chunk_size - u32::from(chunk.header_size)) / 4;
        debug!("Resource map: {} ids", count);

        let ids = stream.try_u32_vec_named(count as usize, "resource id")?;
        chunk.skip_to_end(stream)?;

        Ok(ResourceMap(ids))
    }

    /// Resource id of the pool entry at `index`, if it has one.
    pub fn get(&self, index: i32) -> Option<u32> {
        let index = usize::try_from(index).ok()?;
        self.0.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
