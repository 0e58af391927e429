//! Recording destination allocation.

use crate::error::Result as CoreResult;

use std::path::{Path, PathBuf};

use chrono::Local;

/// Container format for recorded sessions.
const RECORDING_CONTAINER: &str = "mp4";

/// Second-granularity local timestamp used in artifact file names.
pub(crate) fn local_stamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Allocate a destination path for a new recording session.
///
/// Creates the recordings directory on demand and returns
/// `recording_<YYYYMMDD_HHMMSS>.mp4` inside it, stamped with local time.
/// Uniqueness is second-granularity only: two calls within the same
/// wall-clock second return the same path. Known limitation, kept rather
/// than silently disambiguated.
///
/// # Errors
///
/// Returns an IO error when the directory cannot be created.
#[track_caller]
pub fn allocate_output_path(dir: &Path) -> CoreResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    Ok(dir.join(format!(
        "recording_{}.{RECORDING_CONTAINER}",
        local_stamp()
    )))
}
