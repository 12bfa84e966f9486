//! Run output: developed-layer snapshots in a checksummed binary format,
//! plus the JSON summary and color table written at the end of a run.

mod atomic_write;
pub mod file_header;
pub mod save_error;
pub mod snapshot;
mod snapshot_plugin;
pub mod summary;

pub use save_error::SaveError;
pub use snapshot::{decode_snapshot, encode_snapshot, read_snapshot, DevelopedSnapshot};
pub use snapshot_plugin::{
    series_file_name, ExportLog, SnapshotConfig, SnapshotPlugin, COLORS_FILE, FINAL_SNAPSHOT,
    SUMMARY_FILE,
};
