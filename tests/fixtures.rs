#![allow(dead_code)]
use std::io::Write;
use std::sync::Once;

use tempfile::NamedTempFile;

static LOGGER_INIT: Once = Once::new();

// Rust runs the tests concurrently, so unless we synchronize logging access
// it will crash when attempting to run `cargo test` with some logging facilities.
pub fn ensure_env_logger_initialized() {
    LOGGER_INIT.call_once(|| {
        let mut builder = env_logger::Builder::from_default_env();
        builder
            .format(|buf, record| writeln!(buf, "[{}] - {}", record.level(), record.args()))
            .is_test(true)
            .init();
    });
}

pub const TYPE_INT_DEC: u8 = 0x10;
pub const TYPE_STRING: u8 = 0x03;

pub enum Attr {
    Typed { name: i32, data_type: u8, data: u32 },
    Str { name: i32, value: i32 },
}

pub enum Node {
    Element { name: i32, attributes: Vec<Attr> },
    EndElement { name: i32 },
    /// A chunk written as-is into the element stream.
    Raw(Vec<u8>),
}

/// Synthesizes compiled manifests.
#[derive(Default)]
pub struct ManifestBuilder {
    strings: Vec<String>,
    utf8_length_prefix: bool,
    resource_ids: Option<Vec<u32>>,
    namespace: Option<(i32, i32)>,
    nodes: Vec<Node>,
}

impl ManifestBuilder {
    pub fn new() -> Self {
        ManifestBuilder::default()
    }

    pub fn strings(mut self, strings: &[&str]) -> Self {
        self.strings = strings.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Encode every string with the repeated-byte 8-bit length prefix.
    pub fn utf8_length_prefix(mut self) -> Self {
        self.utf8_length_prefix = true;
        self
    }

    pub fn resource_ids(mut self, ids: &[u32]) -> Self {
        self.resource_ids = Some(ids.to_vec());
        self
    }

    pub fn namespace(mut self, prefix: i32, uri: i32) -> Self {
        self.namespace = Some((prefix, uri));
        self
    }

    pub fn element(mut self, name: i32, attributes: Vec<Attr>) -> Self {
        self.nodes.push(Node::Element { name, attributes });
        self
    }

    pub fn end_element(mut self, name: i32) -> Self {
        self.nodes.push(Node::EndElement { name });
        self
    }

    pub fn raw_chunk(mut self, chunk: Vec<u8>) -> Self {
        self.nodes.push(Node::Raw(chunk));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut body = Vec::new();

        if !self.strings.is_empty() {
            body.extend(self.string_pool());
        }

        if let Some(ids) = &self.resource_ids {
            let data: Vec<u8> = ids.iter().flat_map(|id| id.to_le_bytes()).collect();
            body.extend(chunk(0x0180, 8, &data));
        }

        let (prefix, uri) = self.namespace.unwrap_or((-1, -1));
        if self.namespace.is_some() {
            body.extend(chunk(0x0100, 16, &ints(&[1, -1, prefix, uri])));
        }

        for (line, node) in self.nodes.iter().enumerate() {
            let line = line as i32 + 2;
            match node {
                Node::Element { name, attributes } => {
                    body.extend(element_chunk(line, *name, attributes));
                }
                Node::EndElement { name } => {
                    body.extend(chunk(0x0103, 16, &ints(&[line, -1, -1, *name])));
                }
                Node::Raw(raw) => body.extend_from_slice(raw),
            }
        }

        body.extend(chunk(0x0101, 16, &ints(&[1, -1, prefix, uri])));

        chunk(0x0003, 8, &body)
    }

    /// Builds the manifest and writes it to a temporary file.
    pub fn write_temp(&self) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(&self.build()).unwrap();
        f.flush().unwrap();
        f
    }

    fn string_pool(&self) -> Vec<u8> {
        let mut data = Vec::new();
        let mut offsets = Vec::new();

        for s in &self.strings {
            offsets.push(data.len() as u32);
            if self.utf8_length_prefix {
                data.extend_from_slice(&[s.len() as u8, s.len() as u8]);
                data.extend_from_slice(s.as_bytes());
                data.push(0);
            } else {
                data.extend_from_slice(&(s.len() as u16).to_le_bytes());
                for c in s.encode_utf16() {
                    data.extend_from_slice(&c.to_le_bytes());
                }
                data.extend_from_slice(&[0, 0]);
            }
        }
        while data.len() % 4 != 0 {
            data.push(0);
        }

        let count = self.strings.len() as u32;
        let strings_start = 28 + 4 * count;
        let flags: u32 = if self.utf8_length_prefix { 0x100 } else { 0 };

        let mut header = Vec::new();
        header.extend_from_slice(&count.to_le_bytes());
        header.extend_from_slice(&0_u32.to_le_bytes());
        header.extend_from_slice(&flags.to_le_bytes());
        header.extend_from_slice(&strings_start.to_le_bytes());
        header.extend_from_slice(&0_u32.to_le_bytes());
        for o in offsets {
            header.extend_from_slice(&o.to_le_bytes());
        }
        header.extend_from_slice(&data);

        chunk(0x0001, 28, &header)
    }
}

pub fn ints(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// A chunk with an 8 byte header followed by `body`.
pub fn chunk(chunk_type: u16, header_size: u16, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + body.len());
    out.extend_from_slice(&chunk_type.to_le_bytes());
    out.extend_from_slice(&header_size.to_le_bytes());
    out.extend_from_slice(&(8 + body.len() as u32).to_le_bytes());
    out.extend_from_slice(body);
    out
}

pub fn element_chunk(line: i32, name: i32, attributes: &[Attr]) -> Vec<u8> {
    let mut body = ints(&[line, -1, -1, name]);
    for v in [20_u16, 20, attributes.len() as u16, 0, 0, 0] {
        body.extend_from_slice(&v.to_le_bytes());
    }

    for attr in attributes {
        match attr {
            Attr::Typed {
                name,
                data_type,
                data,
            } => {
                body.extend(ints(&[-1, *name, -1]));
                body.extend_from_slice(&8_u16.to_le_bytes());
                body.push(0);
                body.push(*data_type);
                body.extend_from_slice(&data.to_le_bytes());
            }
            Attr::Str { name, value } => {
                body.extend(ints(&[-1, *name, *value]));
                body.extend_from_slice(&8_u16.to_le_bytes());
                body.push(0);
                body.push(TYPE_STRING);
                body.extend_from_slice(&value.to_le_bytes());
            }
        }
    }

    chunk(0x0102, 16, &body)
}

pub const ANDROID_NS: &str = "http://schemas.android.com/apk/res/android";

/// `android`, the namespace URI, `versionCode` (index 2), `versionName`, `manifest`, `package`,
/// `1.0`, `application`, `label`.
pub fn manifest_strings() -> Vec<&'static str> {
    vec![
        "android",
        ANDROID_NS,
        "versionCode",
        "versionName",
        "manifest",
        "package",
        "1.0",
        "application",
        "label",
    ]
}

/// A typical manifest: `<manifest versionCode=.. versionName="1.0" package="1.0">` with an
/// `<application>` child.
pub fn typical_manifest(version_code: u32) -> ManifestBuilder {
    ManifestBuilder::new()
        .strings(&manifest_strings())
        .resource_ids(&[0x0101_021B, 0x0101_021C])
        .namespace(0, 1)
        .element(
            4,
            vec![
                Attr::Typed {
                    name: 2,
                    data_type: TYPE_INT_DEC,
                    data: version_code,
                },
                Attr::Str { name: 3, value: 6 },
                Attr::Str { name: 5, value: 6 },
            ],
        )
        .element(7, vec![Attr::Str { name: 8, value: 6 }])
        .end_element(7)
        .end_element(4)
}

pub fn read_u32_at(bytes: &[u8], offset: u64) -> u32 {
    let offset = offset as usize;
    u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
}
