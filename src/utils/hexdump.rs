use std::fmt::Write as _;
use std::io::{self, Read, SeekFrom};

use crate::manifest_parser::ReadSeek;

/// Formats `data` in canonical hex display: the offset in hexadecimal, sixteen space-separated
/// two column bytes, then the same bytes as printable characters enclosed in `|`.
pub fn hexdump(data: &[u8], offset: u64) -> String {
    let mut out = String::new();

    for (line_no, line) in data.chunks(16).enumerate() {
        let address = offset + (line_no as u64) * 16;
        let _ = write!(out, "{:08x}:", address);

        for b in line {
            let _ = write!(out, " {:02x}", b);
        }
        for _ in line.len()..16 {
            out.push_str("   ");
        }

        out.push_str("  |");
        for &b in line {
            // replace all control chars with dots
            let c = b as char;
            out.push(if c.is_ascii_graphic() || c == ' ' { c } else { '.' });
        }
        out.push_str("|\n");
    }

    out
}

/// Dumps up to `len` bytes starting at `start`, restoring the stream position afterwards.
pub(crate) fn dump_stream<T: ReadSeek>(stream: &mut T, start: u64, len: usize) -> io::Result<String> {
    let restore = stream.tell()?;

    stream.seek(SeekFrom::Start(start))?;
    let mut data = Vec::with_capacity(len);
    stream.by_ref().take(len as u64).read_to_end(&mut data)?;

    stream.seek(SeekFrom::Start(restore))?;
    Ok(hexdump(&data, start))
}
