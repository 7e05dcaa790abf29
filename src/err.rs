use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppInfoError>;
pub type DeserializationResult<T> = std::result::Result<T, DeserializationError>;

/// Errors which abort opening (or scanning) a whole container.
#[derive(Debug, Error)]
pub enum AppInfoError {
    #[error("Invalid appinfo header magic, expected `075644`, found `{magic:06X}`")]
    InvalidMagic { magic: u32 },

    #[error("Unsupported appinfo version {version}, expected 39..=41")]
    UnsupportedVersion { version: u8 },

    #[error("String table offset {offset} is outside of the file (length {len})")]
    InvalidStringTableOffset { offset: i64, len: u64 },

    #[error("Failed to open file {}: {source}", path.display())]
    FailedToOpenFile { source: io::Error, path: PathBuf },

    #[error("Failed to deserialize app {app_id}, caused by:\n\t {source}")]
    FailedToDeserializeApp {
        app_id: u32,
        #[source]
        source: DeserializationError,
    },

    #[error(transparent)]
    Deserialization(#[from] DeserializationError),

    #[error("App {app_id} is of type {app_type}, not a soundtrack")]
    NotASoundtrack { app_id: u32, app_type: String },
}

impl From<io::Error> for AppInfoError {
    fn from(err: io::Error) -> Self {
        AppInfoError::Deserialization(DeserializationError::Io(err))
    }
}

/// Errors raised while decoding binary or text data.
#[derive(Debug, Error)]
pub enum DeserializationError {
    #[error("Offset {offset}: An I/O error has occurred while trying to read {t} ({token_name}): {source}")]
    FailedToReadToken {
        t: &'static str,
        token_name: &'static str,
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("Offset {offset}: Failed to decode UTF-8 string, caused by: {source}")]
    InvalidUtf8 {
        offset: u64,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("Offset {offset}: Tried to read an invalid byte `{value:#04x}` as a key-value node type")]
    UnknownNodeType { value: u8, offset: u64 },

    #[error("Offset {offset}: Node type `{name}` is not supported")]
    UnsupportedNodeType { name: &'static str, offset: u64 },

    #[error("Offset {offset}: String table index {index} is out of range (table has {len} entries)")]
    StringTableIndexOutOfRange { index: u32, len: usize, offset: u64 },

    #[error("Offset {offset}: Document contains no nodes")]
    EmptyDocument { offset: u64 },

    #[error("Offset {offset}: Maximum nesting depth of {max} exceeded")]
    MaxDepthExceeded { max: usize, offset: u64 },

    #[error("Invalid text key-values: {message}")]
    InvalidText { message: String },

    #[error("An I/O error has occurred: {0}")]
    Io(#[from] io::Error),
}

impl DeserializationError {
    /// True when the underlying stream ran out of bytes.
    pub fn is_eof(&self) -> bool {
        match self {
            DeserializationError::FailedToReadToken { source, .. } | DeserializationError::Io(source) => {
                source.kind() == io::ErrorKind::UnexpectedEof
            }
            _ => false,
        }
    }
}

/// Raised when a present tree node cannot be converted to the requested scalar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    #[error("`{name}` is an object and cannot be read as a scalar")]
    NotAScalar { name: String },

    #[error("`{name}` has value `{value}` which is not a valid {target}")]
    Unparsable {
        name: String,
        value: String,
        target: &'static str,
    },
}

/// Raised when the library descriptor cannot be read at all.
///
/// Individually malformed libraries never produce this, they are skipped.
#[derive(Debug, Error)]
pub enum LibraryFoldersError {
    #[error("Failed to open file {}: {source}", path.display())]
    FailedToOpenFile { source: io::Error, path: PathBuf },

    #[error("Failed to parse library descriptor: {0}")]
    Deserialization(#[from] DeserializationError),
}
