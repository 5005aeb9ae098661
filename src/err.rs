use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type DeserializationResult<T> = std::result::Result<T, DeserializationError>;
pub type Result<T> = std::result::Result<T, ManifestError>;

/// Errors raised while decoding the binary XML chunk stream.
#[derive(Debug, Error)]
pub enum DeserializationError {
    #[error("Offset {offset}: stream ended while trying to read {what}")]
    Truncated {
        what: &'static str,
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error(
        "Offset {offset}: malformed chunk, header size is {header_size} but chunk size is {chunk_size}"
    )]
    MalformedChunk {
        offset: u64,
        header_size: u16,
        chunk_size: u32,
    },

    #[error("Invalid resource type ({found}), must be RES_XML_TYPE (3) for a compiled manifest")]
    UnsupportedRootType { found: u16 },

    #[error("An I/O error has occurred")]
    Io(#[from] io::Error),
}

/// Errors surfaced by the high level locate / patch API.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to decode manifest: {0}")]
    Deserialization(#[from] DeserializationError),

    #[error("Field `{field}` was not found in the manifest")]
    FieldNotFound { field: String },

    #[error("Patched value did not read back, expected {expected} but found {found:?}")]
    VerificationMismatch { expected: u32, found: Option<u32> },

    #[error("Failed to open file {}: {source}", path.display())]
    FailedToOpenFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl From<io::Error> for ManifestError {
    fn from(err: io::Error) -> Self {
        ManifestError::Deserialization(DeserializationError::Io(err))
    }
}

impl DeserializationError {
    pub fn is_truncated(&self) -> bool {
        matches!(self, DeserializationError::Truncated { .. })
    }
}
