//! Developed-layer snapshots: bitcode-encoded, lz4-compressed and wrapped
//! in a checksummed `FTRS` header.

use std::path::Path;

use simulation::landscape::Landscape;
use simulation::storage::GridStorage;

use crate::atomic_write::atomic_write;
use crate::file_header::{unwrap_header, wrap_with_header, FileHeader, FLAG_COMPRESSED};
use crate::save_error::SaveError;

/// The developed layer after a step. Values follow the run encoding: `-1`
/// undeveloped, `0` developed before the run, `n` converted at step `n`,
/// and `i32::MIN` outside the study area.
#[derive(Debug, Clone, PartialEq, bitcode::Encode, bitcode::Decode)]
pub struct DevelopedSnapshot {
    pub rows: u32,
    pub cols: u32,
    pub step: u32,
    pub year: Option<i32>,
    pub values: Vec<i32>,
}

impl DevelopedSnapshot {
    pub fn from_landscape(land: &Landscape, step: u32, year: Option<i32>) -> Self {
        let dims = land.developed.dims();
        Self {
            rows: dims.rows as u32,
            cols: dims.cols as u32,
            step,
            year,
            values: land.developed.values().to_vec(),
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Option<i32> {
        if row >= self.rows as usize || col >= self.cols as usize {
            return None;
        }
        let v = self.values[row * self.cols as usize + col];
        (v != i32::MIN).then_some(v)
    }

    /// Cells converted at `step` (1-based).
    pub fn count_converted_at(&self, step: u32) -> usize {
        self.values.iter().filter(|&&v| v == step as i32).count()
    }
}

pub fn encode_snapshot(snapshot: &DevelopedSnapshot) -> Vec<u8> {
    let raw = bitcode::encode(snapshot);
    let compressed = lz4_flex::compress_prepend_size(&raw);
    let header = FileHeader::new(&compressed, snapshot.step, raw.len(), FLAG_COMPRESSED);
    wrap_with_header(&header, &compressed)
}

pub fn decode_snapshot(bytes: &[u8]) -> Result<DevelopedSnapshot, SaveError> {
    let (header, payload) = unwrap_header(bytes)?;
    let raw = if header.is_compressed() {
        lz4_flex::decompress_size_prepended(payload)
            .map_err(|e| SaveError::Decode(format!("lz4: {e}")))?
    } else {
        payload.to_vec()
    };
    if raw.len() != header.uncompressed_size as usize {
        return Err(SaveError::Decode(format!(
            "payload is {} bytes, header says {}",
            raw.len(),
            header.uncompressed_size
        )));
    }

    let snapshot: DevelopedSnapshot = bitcode::decode(&raw)?;
    let expected = snapshot.rows as usize * snapshot.cols as usize;
    if snapshot.values.len() != expected {
        return Err(SaveError::Decode(format!(
            "snapshot has {} values for a {}x{} grid",
            snapshot.values.len(),
            snapshot.rows,
            snapshot.cols
        )));
    }
    Ok(snapshot)
}

pub fn write_snapshot(path: &Path, snapshot: &DevelopedSnapshot) -> Result<(), SaveError> {
    atomic_write(path, &encode_snapshot(snapshot))?;
    Ok(())
}

pub fn read_snapshot(path: &Path) -> Result<DevelopedSnapshot, SaveError> {
    let bytes = std::fs::read(path)?;
    decode_snapshot(&bytes)
}
