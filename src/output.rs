use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppError;
use crate::models::posting::JobPosting;

/// Write postings as a pretty-printed JSON array, replacing any previous
/// file. The data goes to a sibling temp file first and is renamed into
/// place, so a failed write never leaves a truncated output behind.
pub fn write_postings(path: &Path, postings: &[JobPosting]) -> Result<(), AppError> {
    let json = serde_json::to_vec_pretty(postings)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| io_error(parent, source))?;
    }

    let tmp = temp_path(path);
    fs::write(&tmp, json).map_err(|source| {
        let _ = fs::remove_file(&tmp);
        io_error(&tmp, source)
    })?;
    fs::rename(&tmp, path).map_err(|source| {
        let _ = fs::remove_file(&tmp);
        io_error(path, source)
    })?;

    tracing::debug!(path = %path.display(), count = postings.len(), "Wrote postings");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

fn io_error(path: &Path, source: std::io::Error) -> AppError {
    AppError::Io {
        path: path.to_path_buf(),
        source,
    }
}
