use std::io::{SeekFrom, Write};

use byteorder::{LittleEndian, WriteBytesExt};
use log::{debug, info};
use serde::Serialize;

use crate::err::{ManifestError, Result};
use crate::manifest_parser::{ManifestParser, ReadSeek};
use crate::xml_element::FieldMatch;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchOutcome {
    /// The field as it was located before the write.
    pub previous: FieldMatch,
    pub increment: i32,
    /// Value read back by a full re-decode after the write.
    pub verified: u32,
}

/// Overwrites the 4 bytes at `offset` with `value`, little-endian.
pub fn write_field_value<T: Write + ReadSeek>(stream: &mut T, offset: u64, value: u32) -> Result<()> {
    stream.seek(SeekFrom::Start(offset))?;
    stream.write_u32::<LittleEndian>(value)?;
    stream.flush()?;
    Ok(())
}

impl<T: ReadSeek + Write> ManifestParser<T> {
    /// Locates the configured field, adds `increment` to it in place and verifies the result.
    pub fn patch_field(&mut self, increment: i32) -> Result<PatchOutcome> {
        let field = self
            .find_field()?
            .ok_or_else(|| ManifestError::FieldNotFound {
                field: self.config().get_field_name().to_owned(),
            })?;

        self.apply_increment(&field, increment)
    }

    /// Writes `field.value + increment` over a previously located field, then decodes the whole
    /// document again to check the new value reads back.
    ///
    /// A failed verification leaves the written bytes in place.
    pub fn apply_increment(&mut self, field: &FieldMatch, increment: i32) -> Result<PatchOutcome> {
        let expected = field.value.wrapping_add_signed(increment);

        if increment != 0 {
            debug!(
                "Writing {} over {} at offset {}",
                expected, field.value, field.offset
            );
            write_field_value(self.get_mut(), field.offset, expected)?;
        }

        match self.find_field()? {
            Some(found) if found.value == expected => {
                info!("Verified `{}` = {}", found.name, found.value);
                Ok(PatchOutcome {
                    previous: field.clone(),
                    increment,
                    verified: found.value,
                })
            }
            other => Err(ManifestError::VerificationMismatch {
                expected,
                found: other.map(|m| m.value),
            }),
        }
    }
}
