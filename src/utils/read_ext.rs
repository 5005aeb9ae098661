use std::io::{self, Read, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};
use log::trace;

use crate::err::{DeserializationError, DeserializationResult};
use crate::manifest_parser::ReadSeek;
use crate::utils::hexdump::dump_stream;

/// How many bytes before a failed read are included in the trace hexdump.
const HEXDUMP_LOOKBEHIND: u64 = 32;

/// Upper bound on what is allocated up front for a table or buffer of declared length. The
/// rest only grows as data is actually read, so a bogus count ends in `Truncated`.
const PREALLOC_LIMIT: usize = 4096;

/// Named little-endian reads over any seekable stream.
///
/// Every read reports the stream offset it started at, so a short read surfaces as
/// `DeserializationError::Truncated` pointing at the field that could not be read.
pub(crate) trait ReadExt: ReadSeek + Sized {
    #[inline]
    fn try_seek_abs_named(&mut self, offset: u64, name: &'static str) -> DeserializationResult<u64> {
        self.seek(SeekFrom::Start(offset)).map_err(|e| {
            trace!("failed to seek to {} ({}) for {}", offset, e, name);
            DeserializationError::Io(e)
        })
    }

    #[inline]
    fn try_skip_named(&mut self, n: i64, name: &'static str) -> DeserializationResult<u64> {
        self.seek(SeekFrom::Current(n)).map_err(|e| {
            trace!("failed to skip {} bytes ({}) for {}", n, e, name);
            DeserializationError::Io(e)
        })
    }

    #[inline]
    fn try_u8_named(&mut self, name: &'static str) -> DeserializationResult<u8> {
        let offset = self.tell()?;
        self.read_u8().map_err(|e| read_failed(self, name, offset, e))
    }

    #[inline]
    fn try_u16_named(&mut self, name: &'static str) -> DeserializationResult<u16> {
        let offset = self.tell()?;
        self.read_u16::<LittleEndian>()
            .map_err(|e| read_failed(self, name, offset, e))
    }

    #[inline]
    fn try_i32_named(&mut self, name: &'static str) -> DeserializationResult<i32> {
        let offset = self.tell()?;
        self.read_i32::<LittleEndian>()
            .map_err(|e| read_failed(self, name, offset, e))
    }

    #[inline]
    fn try_u32_named(&mut self, name: &'static str) -> DeserializationResult<u32> {
        let offset = self.tell()?;
        self.read_u32::<LittleEndian>()
            .map_err(|e| read_failed(self, name, offset, e))
    }

    /// Reads a table of `count` consecutive `u32` values.
    fn try_u32_vec_named(&mut self, count: usize, name: &'static str) -> DeserializationResult<Vec<u32>> {
        let offset = self.tell()?;
        let mut out = Vec::with_capacity(count.min(PREALLOC_LIMIT));
        for _ in 0..count {
            let value = self
                .read_u32::<LittleEndian>()
                .map_err(|e| read_failed(self, name, offset, e))?;
            out.push(value);
        }
        Ok(out)
    }

    /// Reads exactly `len` raw bytes.
    fn try_bytes_named(&mut self, len: usize, name: &'static str) -> DeserializationResult<Vec<u8>> {
        let offset = self.tell()?;
        let mut out = Vec::with_capacity(len.min(PREALLOC_LIMIT));
        let read = self.by_ref().take(len as u64).read_to_end(&mut out);

        match read {
            Ok(n) if n == len => Ok(out),
            Ok(_) => Err(read_failed(
                self,
                name,
                offset,
                io::Error::from(io::ErrorKind::UnexpectedEof),
            )),
            Err(e) => Err(read_failed(self, name, offset, e)),
        }
    }
}

impl<T: ReadSeek> ReadExt for T {}

fn read_failed<T: ReadSeek>(
    stream: &mut T,
    what: &'static str,
    offset: u64,
    source: io::Error,
) -> DeserializationError {
    if source.kind() != io::ErrorKind::UnexpectedEof {
        return DeserializationError::Io(source);
    }

    if log::log_enabled!(log::Level::Trace) {
        let start = offset.saturating_sub(HEXDUMP_LOOKBEHIND);
        match dump_stream(stream, start, HEXDUMP_LOOKBEHIND as usize + 16) {
            Ok(dump) => trace!("truncated read of {} at offset {}:\n{}", what, offset, dump),
            Err(e) => trace!("failed to capture hexdump: {}", e),
        }
    }

    DeserializationError::Truncated {
        what,
        offset,
        source,
    }
}
