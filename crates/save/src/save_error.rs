// ---------------------------------------------------------------------------
// SaveError: error types for writing and reading run output
// ---------------------------------------------------------------------------

use std::fmt;

/// Errors that can occur while exporting or reading snapshots and summaries.
#[derive(Debug)]
pub enum SaveError {
    /// I/O error (directory not writable, disk full, file not found, etc.)
    Io(std::io::Error),
    /// JSON or bitcode encoding failed.
    Encode(String),
    /// Bitcode decoding or decompression failed.
    Decode(String),
    /// The bytes do not start with the snapshot magic.
    BadMagic,
    /// Fewer bytes than a header needs.
    Truncated { len: usize, needed: usize },
    /// Snapshot header format is newer than this build supports.
    VersionMismatch { expected_max: u32, found: u32 },
    /// Payload checksum does not match the header.
    ChecksumMismatch { expected: u32, computed: u32 },
    /// A required resource was missing from the ECS world.
    MissingResource(String),
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveError::Io(e) => write!(f, "I/O error: {e}"),
            SaveError::Encode(msg) => write!(f, "Encoding error: {msg}"),
            SaveError::Decode(msg) => write!(f, "Decoding error: {msg}"),
            SaveError::BadMagic => write!(f, "Not a snapshot file: missing FTRS magic bytes"),
            SaveError::Truncated { len, needed } => {
                write!(f, "Snapshot is truncated: {len} bytes, need at least {needed}")
            }
            SaveError::VersionMismatch {
                expected_max,
                found,
            } => write!(
                f,
                "Version mismatch: snapshot is v{found}, but this build only supports up to v{expected_max}"
            ),
            SaveError::ChecksumMismatch { expected, computed } => write!(
                f,
                "Snapshot is corrupted: checksum mismatch (expected {expected:#010X}, got {computed:#010X})"
            ),
            SaveError::MissingResource(name) => {
                write!(f, "Missing required resource: {name}")
            }
        }
    }
}

impl std::error::Error for SaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SaveError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SaveError {
    fn from(e: std::io::Error) -> Self {
        SaveError::Io(e)
    }
}

impl From<bitcode::Error> for SaveError {
    fn from(e: bitcode::Error) -> Self {
        SaveError::Decode(e.to_string())
    }
}

impl From<serde_json::Error> for SaveError {
    fn from(e: serde_json::Error) -> Self {
        SaveError::Encode(e.to_string())
    }
}
