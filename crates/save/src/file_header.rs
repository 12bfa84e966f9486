// ---------------------------------------------------------------------------
// file_header – Snapshot header with magic bytes, version, and checksum
// ---------------------------------------------------------------------------
//
// Header format (32 bytes, fixed-size, little-endian):
//   [0..4]   Magic bytes: "FTRS" (0x46545253)
//   [4..8]   Format version (u32)
//   [8..12]  Flags (u32: bit 0 = lz4 compressed)
//   [12..20] Timestamp (Unix epoch, u64)
//   [20..24] Step the snapshot was taken after (u32)
//   [24..28] Uncompressed payload size (u32)
//   [28..32] xxHash32 checksum of the payload (everything after the header)
//
// On write: encode -> compress -> prepend header (checksum of stored bytes)
// On read: check magic -> check version -> validate checksum -> strip header

use xxhash_rust::xxh32::xxh32;

use crate::save_error::SaveError;

/// Magic bytes identifying a snapshot file.
pub const MAGIC: [u8; 4] = *b"FTRS";

/// Size of the file header in bytes.
pub const HEADER_SIZE: usize = 32;

/// Current header layout version.
pub const HEADER_FORMAT_VERSION: u32 = 1;

/// Payload is lz4 block-compressed with a prepended size.
pub const FLAG_COMPRESSED: u32 = 1;

/// Seed for xxHash32 checksum.
const XXHASH_SEED: u32 = 0;

/// Parsed file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub format_version: u32,
    pub flags: u32,
    pub timestamp: u64,
    pub step: u32,
    pub uncompressed_size: u32,
    pub checksum: u32,
}

impl FileHeader {
    /// Create a header for a stored `payload` that decodes to
    /// `uncompressed_size` bytes.
    pub fn new(payload: &[u8], step: u32, uncompressed_size: usize, flags: u32) -> Self {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Self {
            format_version: HEADER_FORMAT_VERSION,
            flags,
            timestamp,
            step,
            uncompressed_size: uncompressed_size as u32,
            checksum: xxh32(payload, XXHASH_SEED),
        }
    }

    pub fn is_compressed(&self) -> bool {
        self.flags & FLAG_COMPRESSED != 0
    }
}

/// Prepend `header` to `payload`.
pub fn wrap_with_header(header: &FileHeader, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&header.format_version.to_le_bytes());
    out.extend_from_slice(&header.flags.to_le_bytes());
    out.extend_from_slice(&header.timestamp.to_le_bytes());
    out.extend_from_slice(&header.step.to_le_bytes());
    out.extend_from_slice(&header.uncompressed_size.to_le_bytes());
    out.extend_from_slice(&header.checksum.to_le_bytes());
    out.extend_from_slice(payload);
    out
}

fn le_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Parse and validate the header, returning it with the payload bytes.
///
/// # Errors
///
/// Returns an error if:
/// - The magic bytes are missing
/// - The buffer is shorter than a header
/// - The header format version is from a newer build
/// - The checksum does not match (data corruption)
pub fn unwrap_header(bytes: &[u8]) -> Result<(FileHeader, &[u8]), SaveError> {
    if bytes.len() < MAGIC.len() || bytes[..4] != MAGIC {
        return Err(SaveError::BadMagic);
    }
    if bytes.len() < HEADER_SIZE {
        return Err(SaveError::Truncated {
            len: bytes.len(),
            needed: HEADER_SIZE,
        });
    }

    let format_version = le_u32(bytes, 4);
    if format_version > HEADER_FORMAT_VERSION {
        return Err(SaveError::VersionMismatch {
            expected_max: HEADER_FORMAT_VERSION,
            found: format_version,
        });
    }
    let mut timestamp = [0u8; 8];
    timestamp.copy_from_slice(&bytes[12..20]);

    let header = FileHeader {
        format_version,
        flags: le_u32(bytes, 8),
        timestamp: u64::from_le_bytes(timestamp),
        step: le_u32(bytes, 20),
        uncompressed_size: le_u32(bytes, 24),
        checksum: le_u32(bytes, 28),
    };

    let payload = &bytes[HEADER_SIZE..];
    let computed = xxh32(payload, XXHASH_SEED);
    if computed != header.checksum {
        return Err(SaveError::ChecksumMismatch {
            expected: header.checksum,
            computed,
        });
    }
    Ok((header, payload))
}
