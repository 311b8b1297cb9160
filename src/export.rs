//! Writing rendered tag reports to their destination.
//!
//! - `save_taglist` writes the report file all-or-nothing: the text goes to a
//!   sibling temporary file that is renamed over the destination.
//! - `write_taglist` writes to any `io::Write`.
//! - `ensure_parent_dir` creates the destination directory beforehand.
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::debug;

use crate::report::{ReportParameters, render_report};
use crate::tagmap::TagMapping;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to create output directory {}: {source}", .path.display())]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// Create the parent directory of `path` (and its ancestors) if missing.
pub fn ensure_parent_dir<P: AsRef<Path>>(path: P) -> Result<(), ExportError> {
    let Some(parent) = path.as_ref().parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    fs::create_dir_all(parent).map_err(|source| ExportError::CreateDir {
        path: parent.to_path_buf(),
        source,
    })
}

pub fn write_taglist<W: Write>(
    tags: &TagMapping,
    params: &ReportParameters,
    mut out: W,
) -> io::Result<()> {
    out.write_all(render_report(tags, params).as_bytes())?;
    out.flush()
}

pub fn save_taglist<P: AsRef<Path>>(
    tags: &TagMapping,
    params: &ReportParameters,
    path: P,
) -> Result<(), ExportError> {
    let path = path.as_ref();
    let body = render_report(tags, params);
    let tmp = temp_path(path);
    let res = write_all_synced(&tmp, body.as_bytes()).and_then(|_| fs::rename(&tmp, path));
    if let Err(source) = res {
        let _ = fs::remove_file(&tmp);
        return Err(ExportError::Write {
            path: path.to_path_buf(),
            source,
        });
    }
    debug!("wrote {} bytes to {}", body.len(), path.display());
    Ok(())
}

fn write_all_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut f = File::create(path)?;
    f.write_all(bytes)?;
    f.sync_all()
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
