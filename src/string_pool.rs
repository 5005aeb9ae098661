use bitflags::bitflags;
use log::{debug, trace};

use crate::chunk_header::ChunkHeader;
use crate::err::DeserializationResult;
use crate::manifest_parser::ReadSeek;
use crate::utils::ReadExt;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StringPoolFlags: u32 {
        const SORTED = 0x0000_0001;
        const UTF8 = 0x0000_0100;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringPoolHeader {
    pub string_count: u32,
    pub style_count: u32,
    pub flags: StringPoolFlags,
    /// Offset of the string data, relative to the start of the chunk.
    pub strings_start: u32,
    /// Offset of the style data, relative to the start of the chunk. 0 if there are no styles.
    pub styles_start: u32,
}

impl StringPoolHeader {
    pub fn from_stream<T: ReadSeek>(stream: &mut T) -> DeserializationResult<StringPoolHeader> {
        let string_count = stream.try_u32_named("string count")?;
        let style_count = stream.try_u32_named("style count")?;
        let flags = StringPoolFlags::from_bits_retain(stream.try_u32_named("string pool flags")?);
        let strings_start = stream.try_u32_named("strings start")?;
        let styles_start = stream.try_u32_named("styles start")?;

        Ok(StringPoolHeader {
            string_count,
            style_count,
            flags,
            strings_start,
            styles_start,
        })
    }
}

/// The decoded string table of a document.
///
/// Element and attribute names reference entries by index; `-1` means "no string".
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StringPool {
    strings: Vec<String>,
    offsets: Vec<u32>,
}

impl StringPool {
    /// Decodes a string pool chunk. `chunk` must already have been read from `stream`.
    ///
    /// Always leaves the stream at the end of the chunk, since pools are allowed to carry
    /// trailing padding after the last string.
    pub fn from_stream<T: ReadSeek>(
        stream: &mut T,
        chunk: &ChunkHeader,
    ) -> DeserializationResult<StringPool> {
        let header = StringPoolHeader::from_stream(stream)?;
        debug!(
            "String pool: {} strings, {} styles, flags {:?}",
            header.string_count, header.style_count, header.flags
        );

        let count = header.string_count as usize;
        let offsets = stream.try_u32_vec_named(count, "string offsets")?;

        // Styles are not modeled.
        if header.style_count > 0 {
            stream.try_skip_named(i64::from(header.style_count) * 4, "style offsets")?;
        }

        let mut strings = Vec::with_capacity(offsets.len());
        for i in 0..count {
            let encoded_len = entry_len(&header, chunk, &offsets, i);

            let s = if encoded_len > 0 {
                read_entry(stream, encoded_len as usize)?
            } else {
                String::new()
            };

            trace!("\tstring {}: {:?}", i, s);
            strings.push(s);
        }

        chunk.skip_to_end(stream)?;

        Ok(StringPool { strings, offsets })
    }

    /// Looks up a string by its (signed) pool index.
    pub fn get(&self, index: i32) -> Option<&str> {
        let index = usize::try_from(index).ok()?;
        self.strings.get(index).map(String::as_str)
    }

    /// Offset of the entry's data, relative to the start of the string data.
    pub fn offset_of(&self, index: i32) -> Option<u32> {
        let index = usize::try_from(index).ok()?;
        self.offsets.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.strings.iter().map(String::as_str)
    }
}

/// Number of bytes occupied by entry `i`, derived from its neighbour's offset.
///
/// The last entry has no neighbour, so its end is either the style data or the end of the
/// chunk. May be zero or negative for degenerate pools.
fn entry_len(header: &StringPoolHeader, chunk: &ChunkHeader, offsets: &[u32], i: usize) -> i64 {
    let start = i64::from(offsets[i]);

    if i + 1 < offsets.len() {
        i64::from(offsets[i + 1]) - start
    } else if header.styles_start == 0 {
        i64::from(chunk.chunk_size)
            - start
            - i64::from(chunk.header_size)
            - 4 * i64::from(header.string_count)
    } else {
        i64::from(header.styles_start) - start
    }
}

fn read_entry<T: ReadSeek>(stream: &mut T, encoded_len: usize) -> DeserializationResult<String> {
    let prefix = stream.try_bytes_named(2, "string length")?;
    let char_count = decoded_len(prefix[0], prefix[1]);

    let buf = stream.try_bytes_named(encoded_len.saturating_sub(2), "string data")?;
    Ok(decode_chars(&buf, char_count))
}

/// Interprets the 2 byte length prefix of a pool entry.
///
/// A repeated byte (`20 20`) is the 8-bit form found in non-manifest pools, where both bytes
/// carry the same length. Anything else is read as `b0 + 256 * b1`.
pub fn decoded_len(b0: u8, b1: u8) -> usize {
    if b0 == b1 {
        usize::from(b0)
    } else {
        usize::from(b0) + 256 * usize::from(b1)
    }
}

/// Collects the non-zero bytes of `buf` until `char_count` of them have been taken.
///
/// Zero bytes are padding, UTF-16 high bytes or terminators and are dropped.
pub fn decode_chars(buf: &[u8], char_count: usize) -> String {
    let bytes: Vec<u8> = buf
        .iter()
        .copied()
        .filter(|&b| b != 0x00)
        .take(char_count)
        .collect();

    String::from_utf8_lossy(&bytes).into_owned()
}
