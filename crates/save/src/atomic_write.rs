//! Atomic file write using the write-rename pattern.
//!
//! Snapshots and summaries are written to `{path}.tmp`, synced, then renamed
//! over the final path, so readers polling the output directory never see a
//! half-written file.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Write `data` to `{path}.tmp`, sync it, then rename it over `path`.
/// Missing parent directories are created. A crash before the rename leaves
/// any previous file at `path` untouched.
pub fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = tmp_path_for(path);
    let mut file = File::create(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    fs::rename(&tmp_path, path)
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
