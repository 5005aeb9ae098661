#![deny(unused_must_use)]
#![forbid(unsafe_code)]
//! Locates (and optionally bumps) the version counter of a compiled, binary XML application
//! manifest.
//!
//! The document is a sequence of self-sized chunks: an XML root, a string pool, an optional
//! resource map, a namespace scope and the element chunks inside it. The target attribute is
//! found by its decoded name and reported together with the offset of its 4 byte payload, which
//! can then be rewritten in place.
//!
//! ```no_run
//! use aminc::ManifestParser;
//!
//! let mut parser = ManifestParser::from_path_for_update("AndroidManifest.xml").unwrap();
//! if let Some(field) = parser.find_field().unwrap() {
//!     println!("versionCode {} at offset {}", field.value, field.offset);
//!     parser.patch_field(1).unwrap();
//! }
//! ```

pub mod chunk_header;
pub mod err;
pub mod manifest_parser;
pub mod patch;
pub mod resource_map;
pub mod string_pool;
pub mod utils;
pub mod xml_element;

pub use chunk_header::{ChunkHeader, ChunkType};
pub use manifest_parser::{ManifestParser, ParserSettings, Scan, ScanContext, VERSION_CODE};
pub use patch::PatchOutcome;
pub use string_pool::StringPool;
pub use xml_element::FieldMatch;

// For tests, we only initialize logging once.
#[cfg(test)]
use std::sync::Once;

#[cfg(test)]
static LOGGER_INIT: Once = Once::new();

// Rust runs the tests concurrently, so unless we synchronize logging access
// it will crash when attempting to run `cargo test` with some logging facilities.
#[cfg(test)]
pub fn ensure_env_logger_initialized() {
    use std::io::Write;

    LOGGER_INIT.call_once(|| {
        let mut builder = env_logger::Builder::from_default_env();
        builder
            .format(|buf, record| writeln!(buf, "[{}] - {}", record.level(), record.args()))
            .is_test(true)
            .init();
    });
}
