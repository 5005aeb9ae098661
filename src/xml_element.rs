use log::{debug, trace};
use serde::Serialize;

use crate::err::DeserializationResult;
use crate::manifest_parser::{ReadSeek, ScanContext};
use crate::utils::ReadExt;

/// Raw value marking an attribute without a string reference.
pub const NO_STRING: i32 = -1;

/// Body of a namespace-start chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamespaceScope {
    pub line_number: i32,
    pub prefix_index: i32,
    pub uri_index: i32,
}

impl NamespaceScope {
    pub fn from_stream<T: ReadSeek>(stream: &mut T) -> DeserializationResult<NamespaceScope> {
        let line_number = stream.try_i32_named("namespace line number")?;
        let _comment = stream.try_i32_named("namespace comment")?;
        let prefix_index = stream.try_i32_named("namespace prefix")?;
        let uri_index = stream.try_i32_named("namespace uri")?;

        Ok(NamespaceScope {
            line_number,
            prefix_index,
            uri_index,
        })
    }
}

/// Fixed part of an element-start chunk, describing its attribute list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementHeader {
    pub line_number: i32,
    pub namespace_index: i32,
    pub name_index: i32,
    pub attribute_start: u16,
    pub attribute_size: u16,
    pub attribute_count: u16,
}

impl ElementHeader {
    pub fn from_stream<T: ReadSeek>(stream: &mut T) -> DeserializationResult<ElementHeader> {
        let line_number = stream.try_i32_named("element line number")?;
        let _comment = stream.try_i32_named("element comment")?;
        let namespace_index = stream.try_i32_named("element namespace")?;
        let name_index = stream.try_i32_named("element name")?;
        let attribute_start = stream.try_u16_named("attribute start")?;
        let attribute_size = stream.try_u16_named("attribute size")?;
        let attribute_count = stream.try_u16_named("attribute count")?;

        // id, class and style attribute indices
        stream.try_skip_named(6, "element id/class/style")?;

        Ok(ElementHeader {
            line_number,
            namespace_index,
            name_index,
            attribute_start,
            attribute_size,
            attribute_count,
        })
    }
}

/// An inline value. Only the raw payload is read, `data_type` is kept as the encoded tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypedValue {
    pub size: u16,
    pub data_type: u8,
    pub data: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeValue {
    /// Index of the value in the string pool.
    StringRef(i32),
    Typed(TypedValue),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute {
    pub namespace_index: i32,
    pub name_index: i32,
    pub value: AttributeValue,
    /// Stream position of the 4 byte data field of this attribute.
    pub data_offset: u64,
}

impl Attribute {
    pub fn from_stream<T: ReadSeek>(stream: &mut T) -> DeserializationResult<Attribute> {
        let namespace_index = stream.try_i32_named("attribute namespace")?;
        let name_index = stream.try_i32_named("attribute name")?;
        let raw_value = stream.try_i32_named("attribute raw value")?;

        if raw_value != NO_STRING {
            let data_offset = stream.tell()? + 4;
            // the raw value already is the string index, the typed value carries nothing new
            stream.try_skip_named(8, "attribute typed value")?;

            return Ok(Attribute {
                namespace_index,
                name_index,
                value: AttributeValue::StringRef(raw_value),
                data_offset,
            });
        }

        let size = stream.try_u16_named("typed value size")?;
        let _res0 = stream.try_u8_named("typed value reserved")?;
        let data_type = stream.try_u8_named("typed value data type")?;
        let data_offset = stream.tell()?;
        let data = stream.try_u32_named("typed value data")?;

        Ok(Attribute {
            namespace_index,
            name_index,
            value: AttributeValue::Typed(TypedValue {
                size,
                data_type,
                data,
            }),
            data_offset,
        })
    }
}

/// A located target field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldMatch {
    pub name: String,
    pub value: u32,
    /// Stream position of the field's 4 byte little-endian payload.
    pub offset: u64,
    /// Zero based position of the owning element among all element-start chunks.
    pub element_index: usize,
    pub line_number: i32,
}

/// Decodes an element-start chunk body and looks for an inline attribute named `field`.
///
/// Attributes are only ever matched by their decoded name in the string pool. Returns at the
/// first match, leaving the stream right after the matched payload.
pub fn find_field_in_element<T: ReadSeek>(
    stream: &mut T,
    ctx: &ScanContext,
    field: &str,
) -> DeserializationResult<Option<FieldMatch>> {
    let element = ElementHeader::from_stream(stream)?;

    debug!(
        "[XML Node {}] Name: {} Attr count: {}",
        ctx.element_index,
        ctx.string_pool.get(element.name_index).unwrap_or("-1"),
        element.attribute_count
    );

    for i in 0..element.attribute_count {
        let attribute = Attribute::from_stream(stream)?;
        let name = ctx.string_pool.get(attribute.name_index);
        trace!("\tattribute {} {:?}: {:?}", i, name, attribute.value);

        let AttributeValue::Typed(typed) = attribute.value else {
            continue;
        };

        if name == Some(field) {
            return Ok(Some(FieldMatch {
                name: field.to_owned(),
                value: typed.data,
                offset: attribute.data_offset,
                element_index: ctx.element_index,
                line_number: element.line_number,
            }));
        }
    }

    Ok(None)
}
